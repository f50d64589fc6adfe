// # parcel-tracker - command-line front end
//
// A thin integration layer: it reads the environment, installs logging,
// registers providers and hands each command to `parcel_core::ParcelTracker`.
// Tracking logic lives in parcel-core; carrier endpoints and aggregators live
// in the provider crates.
//
// ## Configuration
//
// All configuration is done via environment variables:
//
// ### Store
// - `PARCEL_STORE_TYPE`: `file` (default) or `memory`
// - `PARCEL_STORE_PATH`: store file (default `~/.parcel-tracker/parcels.json`)
//
// ### Providers
// - `TRACKTRY_API_KEY`: enables Tracktry
// - `SEVENTEEN_TRACK_API_KEY` (or `17TRACK_API_KEY`): enables 17TRACK
//
// ### Check cycle
// - `PARCEL_MAX_CONCURRENT_CHECKS`: parcels resolved at once (default 4)
// - `PARCEL_CALL_TIMEOUT_SECS`: per-provider call timeout (default 30)
// - `PARCEL_DETECTION_MODE`: `latest` (default) or `all-unseen`
//
// ### Notification
// - `PARCEL_NOTIFY_COMMAND`: command the message is appended to
//   (default `openclaw message send --message`)
//
// ### Logging
// - `PARCEL_LOG_LEVEL`: trace, debug, info, warn (default), error. Logs go
//   to stderr; stdout carries only command output.
//
// ## Example
//
// ```bash
// export TRACKTRY_API_KEY=your_key
// parcel-tracker add 6A12345678901 --alias "running shoes"
// parcel-tracker check --notify
// ```

mod cli;
mod config;

use anyhow::Result;
use clap::Parser;
use parcel_core::{
    CommandNotifier, Notifier, ParcelTracker, ProviderRegistry, TrackingNumber, fallback_lines,
    format_message, open_store,
};
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::FmtSubscriber;

use crate::cli::{Cli, Command};
use crate::config::CliConfig;

/// Exit codes
///
/// - 0: Command succeeded
/// - 1: Command failed (unknown parcel, duplicate, notifier failure, I/O)
/// - 2: Configuration or startup error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TrackerExitCode {
    Success = 0,
    Failure = 1,
    ConfigError = 2,
}

impl From<TrackerExitCode> for ExitCode {
    fn from(code: TrackerExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match CliConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return TrackerExitCode::ConfigError.into();
        }
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.log_level)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return TrackerExitCode::ConfigError.into();
    }

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return TrackerExitCode::ConfigError.into();
        }
    };

    let code = rt.block_on(async {
        match run(cli.command, config).await {
            Ok(code) => code,
            Err(e) => {
                error!("{:#}", e);
                TrackerExitCode::Failure
            }
        }
    });

    code.into()
}

/// Build a registry with every provider crate compiled in
fn registry() -> ProviderRegistry {
    let registry = ProviderRegistry::new();

    #[cfg(feature = "carriers")]
    {
        tracing::debug!("Registering carrier providers");
        parcel_provider_carriers::register(&registry);
    }

    #[cfg(feature = "aggregators")]
    {
        tracing::debug!("Registering aggregator providers");
        parcel_provider_aggregators::register(&registry);
    }

    registry
}

async fn run(command: Command, config: CliConfig) -> Result<TrackerExitCode> {
    let resolver = registry().build_resolver(&config.tracker)?;
    let store = open_store(&config.tracker.store).await?;
    let tracker = ParcelTracker::new(store, resolver, &config.tracker.engine);

    match command {
        Command::Add {
            tracking_number,
            alias,
            destination,
        } => match tracker.add(&tracking_number, alias, destination).await {
            Ok(parcel) => println!("{}", cli::added_line(&parcel)),
            Err(e) => return data_error(e),
        },

        Command::Remove { tracking_number } => match tracker.remove(&tracking_number).await {
            Ok(number) => println!("Removed {}", number),
            Err(e) => return data_error(e),
        },

        Command::List => print_lines(&cli::list_lines(&tracker.list().await?)),

        Command::Check { notify } => {
            let report = tracker.check().await?;
            print_lines(&cli::update_lines(&report.updates));

            if notify && let Some(message) = format_message(&report.updates) {
                let delivered = match CommandNotifier::new(&config.tracker.notifier) {
                    Ok(notifier) => notifier.send(&message).await,
                    Err(e) => Err(e),
                };
                match delivered {
                    Ok(()) => println!("Sent {} notification(s)", report.updates.len()),
                    Err(e) => {
                        error!(error = %e, "notification failed");
                        println!("Notification failed, printing to stdout:");
                        print_lines(&fallback_lines(&report.updates));
                        return Ok(TrackerExitCode::Failure);
                    }
                }
            }
        }

        Command::Detect { tracking_number } => match tracker.detect(&tracking_number) {
            Ok(carrier) => print_lines(&cli::detect_lines(carrier)),
            Err(e) => return data_error(e),
        },

        Command::Track { tracking_number } => match tracker.track(&tracking_number).await {
            Ok(Some(result)) => println!("{}", serde_json::to_string_pretty(&result)?),
            Ok(None) => {
                println!("Could not track parcel");
                return Ok(TrackerExitCode::Failure);
            }
            Err(e) => return data_error(e),
        },

        Command::History { tracking_number } => match tracker.history(&tracking_number).await {
            Ok(entries) => {
                let number = TrackingNumber::parse(&tracking_number)?;
                print_lines(&cli::history_lines(number.as_str(), &entries));
            }
            Err(e) => return data_error(e),
        },
    }

    Ok(TrackerExitCode::Success)
}

/// Data errors are printed as plain command output; anything else propagates
fn data_error(e: parcel_core::Error) -> Result<TrackerExitCode> {
    if e.is_data_error() {
        println!("{}", e);
        Ok(TrackerExitCode::Failure)
    } else {
        Err(e.into())
    }
}

fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parcel_core::{Error, MemoryParcelStore, TrackingResolver};
    use std::sync::Arc;
    use std::time::Duration;

    fn tracker() -> ParcelTracker {
        ParcelTracker::new(
            Arc::new(MemoryParcelStore::new()),
            TrackingResolver::new(Duration::from_secs(1)),
            &parcel_core::EngineConfig::default(),
        )
    }

    #[tokio::test]
    async fn malformed_numbers_are_data_errors_for_every_command() {
        let tracker = tracker();
        let detect = tracker.detect("12/34").unwrap_err();
        let track = tracker.track("12/34").await.unwrap_err();
        let history = tracker.history("12/34").await.unwrap_err();

        for err in [detect, track, history] {
            assert!(err.is_data_error(), "{}", err);
            assert_eq!(data_error(err).unwrap(), TrackerExitCode::Failure);
        }
    }

    #[test]
    fn infrastructure_errors_propagate() {
        assert!(data_error(Error::state_store("disk full")).is_err());
        assert_eq!(
            data_error(Error::not_found("Parcel QQ1 not found")).unwrap(),
            TrackerExitCode::Failure
        );
    }
}
