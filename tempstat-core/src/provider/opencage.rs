use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::{config::DEFAULT_GEOCODER_URL, error::FetchError, model::Coordinates};

use super::{Geocoder, truncate_body};

const SERVICE: &str = "geocoding";

/// Forward geocoding through the OpenCage API.
#[derive(Debug, Clone)]
pub struct OpenCageGeocoder {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenCageGeocoder {
    pub fn new(api_key: String, http: Client) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_GEOCODER_URL.to_string(),
            http,
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.to_string();
        self
    }
}

#[derive(Debug, Deserialize)]
struct OcGeometry {
    lat: f64,
    lng: f64,
}

#[derive(Debug, Deserialize)]
struct OcResult {
    geometry: OcGeometry,
    formatted: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OcResponse {
    results: Vec<OcResult>,
}

#[async_trait]
impl Geocoder for OpenCageGeocoder {
    async fn resolve(&self, city: &str) -> Result<Coordinates, FetchError> {
        tracing::debug!(city, "geocoding");

        let res = self
            .http
            .get(&self.base_url)
            .query(&[("q", city), ("key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| FetchError::unavailable(SERVICE, e.to_string()))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|e| FetchError::unavailable(SERVICE, e.to_string()))?;

        if !status.is_success() {
            tracing::warn!(%status, "geocoding service returned an error");
            return Err(FetchError::unavailable(
                SERVICE,
                format!("status {}: {}", status, truncate_body(&body)),
            ));
        }

        let parsed: OcResponse = serde_json::from_str(&body).map_err(|e| {
            FetchError::unavailable(SERVICE, format!("unexpected response body: {e}"))
        })?;

        // Candidates are not ranked or offered to the user; the first one wins.
        let first = parsed
            .results
            .into_iter()
            .next()
            .ok_or_else(|| FetchError::LocationNotFound {
                city: city.to_string(),
            })?;

        let coords = Coordinates {
            latitude: first.geometry.lat,
            longitude: first.geometry.lng,
        };
        tracing::info!(
            city,
            resolved = first.formatted.as_deref().unwrap_or(city),
            %coords,
            "geocoded"
        );

        Ok(coords)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn geocoder(server: &MockServer) -> OpenCageGeocoder {
        OpenCageGeocoder::new("test_key".to_string(), Client::new())
            .with_base_url(&format!("{}/geocode/v1/json", server.uri()))
    }

    #[tokio::test]
    async fn resolves_first_result() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/geocode/v1/json"))
            .and(query_param("q", "Paris"))
            .and(query_param("key", "test_key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "results": [
                    {"formatted": "Paris, France", "geometry": {"lat": 48.8566, "lng": 2.3522}},
                    {"formatted": "Paris, Texas", "geometry": {"lat": 33.6609, "lng": -95.5555}}
                ]
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let coords = geocoder(&mock_server).resolve("Paris").await.unwrap();
        assert_eq!(coords.latitude, 48.8566);
        assert_eq!(coords.longitude, 2.3522);
    }

    #[tokio::test]
    async fn empty_results_is_not_found() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/geocode/v1/json"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "results": [] })),
            )
            .mount(&mock_server)
            .await;

        let err = geocoder(&mock_server).resolve("Atlantis").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::LocationNotFound);
        assert!(err.to_string().contains("Atlantis"));
    }

    #[tokio::test]
    async fn error_status_is_unavailable() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/geocode/v1/json"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid key"))
            .mount(&mock_server)
            .await;

        let err = geocoder(&mock_server).resolve("Paris").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ServiceUnavailable);
        assert!(err.to_string().contains("401"));
    }

    #[tokio::test]
    async fn schema_mismatch_is_unavailable() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/geocode/v1/json"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "status": "ok" })),
            )
            .mount(&mock_server)
            .await;

        let err = geocoder(&mock_server).resolve("Paris").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ServiceUnavailable);
    }
}
