//! Prompt loop standing in for the input form, fetch button and
//! "save chart" button.

use std::{fmt, path::PathBuf};

use anyhow::Context;
use chrono::{Duration, Local};
use inquire::{InquireError, Select, Text};
use tempstat_core::{Controller, model::DATE_FORMAT};

use crate::cli::{describe, print_outcome};

const DEFAULT_CHART_PATH: &str = "weather_chart.png";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Fetch,
    SaveChart,
    Quit,
}

impl Action {
    const ALL: [Action; 3] = [Action::Fetch, Action::SaveChart, Action::Quit];
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Action::Fetch => "Fetch weather & summary",
            Action::SaveChart => "Save chart as image",
            Action::Quit => "Quit",
        })
    }
}

/// Last entered values, offered as defaults on the next prompt.
#[derive(Debug, Clone)]
struct Form {
    city: String,
    start: String,
    end: String,
}

impl Default for Form {
    fn default() -> Self {
        let today = Local::now().date_naive();
        Self {
            city: String::new(),
            start: (today - Duration::days(7)).format(DATE_FORMAT).to_string(),
            end: today.format(DATE_FORMAT).to_string(),
        }
    }
}

/// Run until the user quits or presses Esc/Ctrl-C. Fetch errors are shown
/// and the loop continues.
pub async fn run(mut controller: Controller) -> anyhow::Result<()> {
    let mut form = Form::default();

    loop {
        let action = match Select::new("What next?", Action::ALL.to_vec()).prompt() {
            Ok(action) => action,
            Err(err) if is_cancel(&err) => return Ok(()),
            Err(err) => return Err(err).context("Failed to read menu choice"),
        };

        match action {
            Action::Fetch => {
                match prompt_form(&form) {
                    Ok(next) => form = next,
                    Err(err) if is_cancel(&err) => continue,
                    Err(err) => return Err(err).context("Failed to read query"),
                }

                match controller.fetch(&form.city, &form.start, &form.end).await {
                    Ok(outcome) => print_outcome(&outcome),
                    Err(err) => eprintln!("{}", describe(err)),
                }
            }
            Action::SaveChart => {
                if controller.chart().is_none() {
                    eprintln!("No Chart: please fetch weather data first.");
                    continue;
                }

                let path = match Text::new("Save chart as:")
                    .with_default(DEFAULT_CHART_PATH)
                    .with_help_message(".png or .svg; no extension means .png")
                    .prompt()
                {
                    Ok(path) => PathBuf::from(path.trim()),
                    Err(err) if is_cancel(&err) => continue,
                    Err(err) => return Err(err).context("Failed to read chart path"),
                };

                match controller.save_chart(&path) {
                    Ok(saved) => println!("Chart saved to: {}", saved.display()),
                    Err(err) => eprintln!("{}", describe(err)),
                }
            }
            Action::Quit => return Ok(()),
        }
    }
}

fn prompt_form(previous: &Form) -> Result<Form, InquireError> {
    let city = Text::new("City name:")
        .with_default(&previous.city)
        .prompt()?;
    let start = Text::new("Start date (YYYY-MM-DD):")
        .with_default(&previous.start)
        .prompt()?;
    let end = Text::new("End date (YYYY-MM-DD):")
        .with_default(&previous.end)
        .prompt()?;

    Ok(Form { city, start, end })
}

fn is_cancel(err: &InquireError) -> bool {
    matches!(
        err,
        InquireError::OperationCanceled | InquireError::OperationInterrupted
    )
}
