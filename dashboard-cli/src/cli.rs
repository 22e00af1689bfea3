use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use inquire::{Confirm, Password, PasswordDisplayMode, Select, Text};
use weather_dashboard_core::{
    CalendarPolicy, Config, FetchController, Location, RequestState, WeatherProvider,
    provider_from_config,
};

use crate::render::{Theme, render};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather-dashboard", version, about = "Current weather and forecast")]
pub struct Cli {
    /// Display mode for the dashboard header.
    #[arg(long, global = true, value_enum, default_value_t = Theme::Light)]
    pub theme: Theme,

    /// Group forecast days by "utc" or by the "location"'s own clock.
    #[arg(long, global = true)]
    pub calendar: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store API key, default location and calendar policy.
    Configure,

    /// Show the dashboard once for a location.
    Show {
        /// Location name; defaults to the configured one.
        location: Option<String>,
    },

    /// Interactive dashboard: search, refresh and retry.
    Watch {
        /// Starting location; defaults to the configured one.
        location: Option<String>,
    },
}

impl Cli {
    pub async fn run(self) -> Result<ExitCode> {
        if let Command::Configure = self.command {
            configure()?;
            return Ok(ExitCode::SUCCESS);
        }

        let config = Config::load_with_env()?;
        let calendar = match self.calendar.as_deref() {
            Some(value) => CalendarPolicy::try_from(value)?,
            None => config.calendar,
        };
        let controller = FetchController::new(
            provider_from_config(&config)?,
            config.default_location()?,
        );
        let view = View { calendar, theme: self.theme };

        match self.command {
            Command::Configure => Ok(ExitCode::SUCCESS),
            Command::Show { location } => show(&controller, view, location).await,
            Command::Watch { location } => {
                watch(&controller, view, location).await?;
                Ok(ExitCode::SUCCESS)
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct View {
    calendar: CalendarPolicy,
    theme: Theme,
}

impl View {
    fn print(&self, state: &RequestState) -> Result<()> {
        println!("{}", render(state, self.calendar, self.theme)?);
        Ok(())
    }
}

fn start_location<P: WeatherProvider>(
    controller: &FetchController<P>,
    location: Option<String>,
) -> Result<Location> {
    match location {
        Some(name) => Location::new(name).context("Location name must not be empty"),
        None => Ok(controller.default_location().clone()),
    }
}

async fn show<P: WeatherProvider>(
    controller: &FetchController<P>,
    view: View,
    location: Option<String>,
) -> Result<ExitCode> {
    let location = start_location(controller, location)?;
    view.print(&RequestState::Loading)?;
    controller.fetch(location).await;

    // The failure text is already on screen; only the exit status is left.
    let state = controller.state();
    view.print(&state)?;
    Ok(exit_code(&state))
}

fn exit_code(state: &RequestState) -> ExitCode {
    match state {
        RequestState::Failure { .. } => ExitCode::FAILURE,
        _ => ExitCode::SUCCESS,
    }
}

async fn watch<P: WeatherProvider>(
    controller: &FetchController<P>,
    view: View,
    location: Option<String>,
) -> Result<()> {
    let location = start_location(controller, location)?;
    tracing::debug!(%location, "watch started");
    view.print(&RequestState::Loading)?;
    controller.fetch(location).await;

    loop {
        let state = controller.state();
        view.print(&state)?;

        if let RequestState::Failure { .. } = state {
            let again = Confirm::new("Try again?").with_default(true).prompt()?;
            if !again {
                return Ok(());
            }
            tracing::debug!(default = %controller.default_location(), "retrying after failure");
            view.print(&RequestState::Loading)?;
            controller.retry().await;
            continue;
        }

        let input = Text::new("Location:")
            .with_initial_value(controller.location().as_str())
            .with_help_message("Enter to refresh, :q to quit")
            .prompt()?;

        if input.trim() == ":q" {
            tracing::debug!("watch stopped by user");
            return Ok(());
        }

        view.print(&RequestState::Loading)?;
        match Location::new(input) {
            Ok(next) if next == controller.location() => {
                tracing::debug!(location = %next, "refreshing");
                controller.refresh().await;
            }
            Ok(next) => {
                tracing::debug!(location = %next, "searching new location");
                controller.fetch(next).await;
            }
            Err(_) => {
                tracing::debug!("empty input, refreshing");
                controller.refresh().await;
            }
        }
    }
}

fn configure() -> Result<()> {
    let mut config = Config::load()?;

    let api_key = Password::new("OpenWeather API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .with_help_message("Leave empty to keep the current key")
        .prompt()?;
    if !api_key.trim().is_empty() {
        config.set_api_key(api_key.trim().to_string());
    }

    let default_location = Text::new("Default location:")
        .with_default(&config.default_location)
        .prompt()?;
    if Location::new(default_location.as_str()).is_ok() {
        config.default_location = default_location;
    }

    let policies = vec![CalendarPolicy::Utc, CalendarPolicy::LocationLocal];
    let start = policies.iter().position(|p| *p == config.calendar).unwrap_or(0);
    config.calendar = Select::new("Group forecast days by:", policies)
        .with_starting_cursor(start)
        .prompt()?;

    config.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use weather_dashboard_core::error::FAILURE_MESSAGE;

    #[test]
    fn only_failure_exits_nonzero() {
        let failure = RequestState::Failure { message: FAILURE_MESSAGE.into() };

        assert_eq!(exit_code(&failure), ExitCode::FAILURE);
        assert_eq!(exit_code(&RequestState::Loading), ExitCode::SUCCESS);
        assert_eq!(exit_code(&RequestState::Idle), ExitCode::SUCCESS);
    }
}
