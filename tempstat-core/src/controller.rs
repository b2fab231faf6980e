//! Orchestration of a single fetch and the session's current chart.

use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::{
    Config,
    chart::{Chart, ChartRenderer, PlottersRenderer},
    error::{ErrorKind, FetchError},
    model::{Coordinates, Query, SummaryStats, WeatherSeries},
    provider::{self, Geocoder, WeatherSource},
    report::{ExportedFiles, ReportExporter},
    stats,
};

/// Where a fetch currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Validating,
    Geocoding,
    FetchingWeather,
    Summarizing,
    Exporting,
    Rendering,
    Failed(ErrorKind),
}

/// Everything a successful fetch hands to the presentation layer.
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub query: Query,
    pub coordinates: Coordinates,
    pub series: WeatherSeries,
    pub stats: SummaryStats,
    pub files: ExportedFiles,
}

impl FetchOutcome {
    pub fn result_text(&self) -> String {
        crate::report::result_text(&self.query, &self.series, &self.stats)
    }
}

/// Runs validate → geocode → fetch → summarize → export → render.
///
/// `fetch` borrows the controller mutably, so only one fetch can be in
/// flight at a time.
#[derive(Debug)]
pub struct Controller {
    geocoder: Box<dyn Geocoder>,
    weather: Box<dyn WeatherSource>,
    exporter: ReportExporter,
    renderer: Box<dyn ChartRenderer>,
    phase: Phase,
    transitions: Vec<Phase>,
    chart: Option<Chart>,
}

impl Controller {
    pub fn new(
        geocoder: Box<dyn Geocoder>,
        weather: Box<dyn WeatherSource>,
        exporter: ReportExporter,
    ) -> Self {
        Self {
            geocoder,
            weather,
            exporter,
            renderer: Box::new(PlottersRenderer),
            phase: Phase::Idle,
            transitions: Vec::new(),
            chart: None,
        }
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let http = provider::http_client(config)?;
        let geocoder = provider::geocoder_from_config(config, http.clone())
            .context("Cannot set up the geocoding service")?;
        let weather = provider::weather_source_from_config(config, http);

        Ok(Self::new(
            geocoder,
            weather,
            ReportExporter::from_config(&config.output),
        ))
    }

    pub fn with_renderer(mut self, renderer: Box<dyn ChartRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Phases entered by the most recent fetch, in order.
    pub fn last_transitions(&self) -> &[Phase] {
        &self.transitions
    }

    pub fn chart(&self) -> Option<&Chart> {
        self.chart.as_ref()
    }

    /// Run one fetch from raw user input. Any error aborts the remaining
    /// steps; files already written stay on disk and the previous chart is
    /// kept.
    pub async fn fetch(
        &mut self,
        city: &str,
        start: &str,
        end: &str,
    ) -> Result<FetchOutcome, FetchError> {
        self.transitions.clear();

        let result = self.run(city, start, end).await;
        if let Err(err) = &result {
            tracing::warn!(kind = ?err.kind(), error = %err, "fetch failed");
            self.enter(Phase::Failed(err.kind()));
        }
        self.enter(Phase::Idle);

        result
    }

    async fn run(&mut self, city: &str, start: &str, end: &str) -> Result<FetchOutcome, FetchError> {
        self.enter(Phase::Validating);
        let query = Query::parse(city, start, end)?;

        self.enter(Phase::Geocoding);
        let coordinates = self.geocoder.resolve(&query.city).await?;

        self.enter(Phase::FetchingWeather);
        let series = self
            .weather
            .fetch_daily(coordinates, query.start_date, query.end_date)
            .await?;

        self.enter(Phase::Summarizing);
        let stats = stats::summarize(&series);

        self.enter(Phase::Exporting);
        let files = self.exporter.export(&query, &series, &stats)?;

        self.enter(Phase::Rendering);
        self.chart = Some(self.renderer.render(&series, &query.city)?);

        tracing::info!(
            city = %query.city,
            days = series.len(),
            trend = %stats.trend,
            "fetch complete"
        );

        Ok(FetchOutcome {
            query,
            coordinates,
            series,
            stats,
            files,
        })
    }

    /// Save the current chart. Fails with `NoChart` before the first
    /// successful fetch.
    pub fn save_chart(&self, path: &Path) -> Result<PathBuf, FetchError> {
        self.chart
            .as_ref()
            .ok_or(FetchError::NoChart)?
            .save_image(path)
    }

    fn enter(&mut self, phase: Phase) {
        tracing::debug!(from = ?self.phase, to = ?phase, "phase");
        self.phase = phase;
        self.transitions.push(phase);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Trend;
    use std::fs;
    use crate::provider::{opencage::OpenCageGeocoder, openmeteo::OpenMeteoClient};
    use crate::report::load_csv;
    use reqwest::Client;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct Harness {
        server: MockServer,
        dir: tempfile::TempDir,
        controller: Controller,
    }

    impl Harness {
        async fn start() -> Self {
            let server = MockServer::start().await;
            let dir = tempfile::tempdir().unwrap();

            let geocoder = OpenCageGeocoder::new("test_key".to_string(), Client::new())
                .with_base_url(&format!("{}/geocode/v1/json", server.uri()));
            let weather = OpenMeteoClient::new(Client::new())
                .with_base_url(&format!("{}/v1/forecast", server.uri()));
            let out = dir.path().join("out");
            fs::create_dir(&out).unwrap();
            let exporter = ReportExporter::new(
                out.join("weather_data_summary.csv"),
                out.join("weather_summary.txt"),
            );

            let controller = Controller::new(Box::new(geocoder), Box::new(weather), exporter)
                .with_renderer(Box::new(BlankRenderer));
            Self {
                server,
                dir,
                controller,
            }
        }

        fn out_dir(&self) -> PathBuf {
            self.dir.path().join("out")
        }

        fn csv_path(&self) -> PathBuf {
            self.out_dir().join("weather_data_summary.csv")
        }

        fn summary_path(&self) -> PathBuf {
            self.out_dir().join("weather_summary.txt")
        }

        async fn mock_geocode(&self, results: serde_json::Value, expected_calls: u64) {
            Mock::given(method("GET"))
                .and(path("/geocode/v1/json"))
                .respond_with(
                    ResponseTemplate::new(200)
                        .set_body_json(serde_json::json!({ "results": results })),
                )
                .expect(expected_calls)
                .mount(&self.server)
                .await;
        }

        async fn mock_weather(&self, template: ResponseTemplate, expected_calls: u64) {
            Mock::given(method("GET"))
                .and(path("/v1/forecast"))
                .respond_with(template)
                .expect(expected_calls)
                .mount(&self.server)
                .await;
        }
    }

    /// Draws nothing, so tests do not depend on system fonts.
    #[derive(Debug)]
    struct BlankRenderer;

    impl ChartRenderer for BlankRenderer {
        fn render(&self, series: &WeatherSeries, city: &str) -> Result<Chart, FetchError> {
            Ok(Chart::blank(series, city))
        }
    }

    #[derive(Debug)]
    struct BrokenRenderer;

    impl ChartRenderer for BrokenRenderer {
        fn render(&self, _: &WeatherSeries, _: &str) -> Result<Chart, FetchError> {
            Err(FetchError::RenderFailed("font not found".to_string()))
        }
    }

    fn paris_results() -> serde_json::Value {
        serde_json::json!([{ "formatted": "Paris, France", "geometry": { "lat": 48.8566, "lng": 2.3522 } }])
    }

    fn paris_weather() -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "daily": {
                "time": ["2024-01-01", "2024-01-02", "2024-01-03"],
                "temperature_2m_max": [10.0, 12.0, 8.0],
                "temperature_2m_min": [2.0, 4.0, 1.0]
            }
        }))
    }

    #[tokio::test]
    async fn paris_end_to_end() {
        let mut h = Harness::start().await;
        h.mock_geocode(paris_results(), 1).await;
        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .and(query_param("latitude", "48.8566"))
            .and(query_param("longitude", "2.3522"))
            .respond_with(paris_weather())
            .expect(1)
            .mount(&h.server)
            .await;

        let outcome = h
            .controller
            .fetch("Paris", "2024-01-01", "2024-01-03")
            .await
            .unwrap();

        let avgs: Vec<f64> = outcome.series.iter().map(|r| r.avg_temp).collect();
        assert_eq!(avgs, vec![6.0, 8.0, 4.5]);
        assert!((outcome.stats.average - 6.1667).abs() < 1e-3);
        assert_eq!(outcome.stats.max, 12.0);
        assert_eq!(outcome.stats.min, 1.0);
        assert!((outcome.stats.std_dev - 1.7559).abs() < 1e-3);
        assert_eq!(outcome.stats.trend, Trend::Decreasing);

        assert_eq!(load_csv(&h.csv_path()).unwrap(), outcome.series.records());
        let summary = std::fs::read_to_string(h.summary_path()).unwrap();
        assert!(summary.contains("Weather Summary for Paris"));

        assert_eq!(h.controller.phase(), Phase::Idle);
        assert_eq!(
            h.controller.last_transitions(),
            &[
                Phase::Validating,
                Phase::Geocoding,
                Phase::FetchingWeather,
                Phase::Summarizing,
                Phase::Exporting,
                Phase::Rendering,
                Phase::Idle,
            ]
        );
        let chart = h.controller.chart().expect("chart after successful fetch");
        assert_eq!(chart.title(), "Temperature Trends: Paris");
    }

    #[tokio::test]
    async fn invalid_date_makes_no_request() {
        let mut h = Harness::start().await;
        h.mock_geocode(paris_results(), 0).await;
        h.mock_weather(paris_weather(), 0).await;

        let err = h
            .controller
            .fetch("Paris", "2024/01/01", "2024-01-03")
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InvalidDate);
        assert_eq!(
            h.controller.last_transitions(),
            &[
                Phase::Validating,
                Phase::Failed(ErrorKind::InvalidDate),
                Phase::Idle
            ]
        );
        assert!(h.server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_city_skips_weather_and_files() {
        let mut h = Harness::start().await;
        h.mock_geocode(serde_json::json!([]), 1).await;
        h.mock_weather(paris_weather(), 0).await;

        let err = h
            .controller
            .fetch("Nowhereville", "2024-01-01", "2024-01-03")
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::LocationNotFound);
        assert_eq!(h.controller.phase(), Phase::Idle);
        assert!(!h.csv_path().exists());
        assert!(!h.summary_path().exists());
        assert!(h.controller.chart().is_none());
    }

    #[tokio::test]
    async fn weather_outage_writes_nothing() {
        let mut h = Harness::start().await;
        h.mock_geocode(paris_results(), 1).await;
        h.mock_weather(ResponseTemplate::new(503), 1).await;

        let err = h
            .controller
            .fetch("Paris", "2024-01-01", "2024-01-03")
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ServiceUnavailable);
        assert!(
            h.controller
                .last_transitions()
                .contains(&Phase::Failed(ErrorKind::ServiceUnavailable))
        );
        assert!(!h.csv_path().exists());
    }

    #[tokio::test]
    async fn failed_fetch_keeps_previous_chart() {
        let mut h = Harness::start().await;
        h.mock_geocode(paris_results(), 1).await;
        h.mock_weather(paris_weather(), 1).await;

        h.controller
            .fetch("Paris", "2024-01-01", "2024-01-03")
            .await
            .unwrap();

        let err = h
            .controller
            .fetch("Paris", "2024-01-03", "2024-01-01")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidDate);

        assert!(h.controller.chart().is_some());
    }

    #[tokio::test]
    async fn export_failure_skips_render_and_keeps_chart() {
        let mut h = Harness::start().await;
        h.mock_geocode(paris_results(), 2).await;
        h.mock_weather(paris_weather(), 2).await;

        h.controller
            .fetch("Paris", "2024-01-01", "2024-01-03")
            .await
            .unwrap();

        fs::remove_dir_all(h.out_dir()).unwrap();
        let err = h
            .controller
            .fetch("Lyon", "2024-01-01", "2024-01-03")
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::IoError);
        assert!(
            h.controller
                .last_transitions()
                .ends_with(&[Phase::Exporting, Phase::Failed(ErrorKind::IoError), Phase::Idle])
        );
        assert!(!h.controller.last_transitions().contains(&Phase::Rendering));
        let chart = h.controller.chart().expect("previous chart kept");
        assert_eq!(chart.title(), "Temperature Trends: Paris");
    }

    #[tokio::test]
    async fn render_failure_leaves_exported_files() {
        let mut h = Harness::start().await;
        h.controller = h.controller.with_renderer(Box::new(BrokenRenderer));
        h.mock_geocode(paris_results(), 1).await;
        h.mock_weather(paris_weather(), 1).await;

        let err = h
            .controller
            .fetch("Paris", "2024-01-01", "2024-01-03")
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::RenderFailed);
        assert!(
            h.controller
                .last_transitions()
                .ends_with(&[Phase::Rendering, Phase::Failed(ErrorKind::RenderFailed), Phase::Idle])
        );
        assert_eq!(load_csv(&h.csv_path()).unwrap().len(), 3);
        assert!(h.summary_path().exists());
        assert!(h.controller.chart().is_none());
    }

    #[tokio::test]
    async fn saved_chart_is_the_rendered_one() {
        let mut h = Harness::start().await;
        h.mock_geocode(paris_results(), 1).await;
        h.mock_weather(paris_weather(), 1).await;

        h.controller
            .fetch("Paris", "2024-01-01", "2024-01-03")
            .await
            .unwrap();

        let saved = h
            .controller
            .save_chart(&h.dir.path().join("paris.svg"))
            .unwrap();
        let text = fs::read_to_string(saved).unwrap();
        assert!(text.contains("Temperature Trends: Paris"));
    }

    #[test]
    fn save_chart_before_fetch_is_no_chart() {
        let controller = Controller::new(
            Box::new(OpenCageGeocoder::new("k".into(), Client::new())),
            Box::new(OpenMeteoClient::new(Client::new())),
            ReportExporter::new("a.csv", "b.txt"),
        );

        let err = controller.save_chart(Path::new("chart.png")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NoChart);
    }
}
