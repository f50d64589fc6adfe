//! Command-line interface and output rendering
//!
//! Rendering functions return lines instead of printing so the exact CLI
//! output can be tested.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `add` | Start tracking a parcel |
//! | `remove` | Stop tracking a parcel |
//! | `list` | Show tracked parcels |
//! | `check` | Poll every parcel and report new events |
//! | `detect` | Guess the carrier from the number's shape |
//! | `track` | One-off lookup, printed as JSON |
//! | `history` | Archived events of a tracked parcel |

use clap::{Parser, Subcommand};
use parcel_core::{Carrier, HistoryEntry, Parcel, Update, carrier_display_name};

const STATUS_WIDTH: usize = 28;

/// Multi-carrier parcel tracker
#[derive(Debug, Parser)]
#[command(
    name = "parcel-tracker",
    version,
    about = "Track parcels across carriers and get notified of new events"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Add a parcel to track
    Add {
        tracking_number: String,
        /// Free-text label shown next to the number
        #[arg(long)]
        alias: Option<String>,
        /// Free-text destination note
        #[arg(long)]
        destination: Option<String>,
    },
    /// Remove a parcel
    Remove { tracking_number: String },
    /// List all tracked parcels
    List,
    /// Check every parcel for updates
    Check {
        /// Send the updates through the notifier command
        #[arg(long)]
        notify: bool,
    },
    /// Detect the carrier from a tracking number
    Detect { tracking_number: String },
    /// Look a parcel up once and print the result as JSON
    Track { tracking_number: String },
    /// Show archived events of a tracked parcel
    History { tracking_number: String },
}

pub fn added_line(parcel: &Parcel) -> String {
    let name = parcel
        .carrier_hint
        .map(|c| c.display_name().to_string())
        .unwrap_or_else(|| "Unknown".to_string());
    format!("Added {} ({})", parcel.tracking_number, name)
}

pub fn detect_lines(carrier: Option<Carrier>) -> Vec<String> {
    match carrier {
        Some(carrier) => vec![format!(
            "Detected carrier: {} ({})",
            carrier.display_name(),
            carrier.code()
        )],
        None => vec![
            "Could not detect carrier from tracking number pattern".to_string(),
            "Will try universal tracking APIs when checking".to_string(),
        ],
    }
}

/// The parcel table
pub fn list_lines(parcels: &[Parcel]) -> Vec<String> {
    if parcels.is_empty() {
        return vec!["No parcels being tracked".to_string()];
    }

    let mut lines = vec![
        format!("{:<20} {:<20} {:<30} {}", "Tracking #", "Carrier", "Status", "Last Update"),
        "-".repeat(90),
    ];
    for parcel in parcels {
        let code = parcel
            .last_carrier
            .as_deref()
            .or(parcel.carrier_hint.map(Carrier::code));
        let status: String = parcel
            .status
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or("Pending")
            .chars()
            .take(STATUS_WIDTH)
            .collect();
        lines.push(format!(
            "{:<20} {:<20} {:<30} {}",
            parcel.tracking_number.as_str(),
            carrier_display_name(code),
            status,
            parcel.last_update.as_deref().unwrap_or("Never")
        ));
    }
    lines
}

/// Human-readable report of a check cycle
pub fn update_lines(updates: &[Update]) -> Vec<String> {
    if updates.is_empty() {
        return vec!["No new updates".to_string()];
    }

    let mut lines = vec![format!("Found {} update(s):", updates.len())];
    for update in updates {
        let alias = update
            .alias
            .as_deref()
            .map(|a| format!(" [{}]", a))
            .unwrap_or_default();
        let event = &update.event;
        lines.push(String::new());
        lines.push(format!(
            "📦 {}{} ({})",
            update.tracking_number,
            alias,
            carrier_display_name(update.carrier.as_deref())
        ));
        lines.push(format!("   Status: {}", update.status));
        lines.push(format!("   Event: {}", event.description));
        lines.push(format!("   Location: {}", or_na(&event.location)));
        lines.push(format!("   Time: {}", or_na(&event.timestamp)));
    }
    lines
}

pub fn history_lines(number: &str, entries: &[HistoryEntry]) -> Vec<String> {
    if entries.is_empty() {
        return vec![format!("No archived events for {}", number)];
    }

    let mut lines = vec![format!("History for {} ({} event(s)):", number, entries.len())];
    for entry in entries {
        let event = &entry.event;
        let mut line = format!("  {}  {}", or_na(&event.timestamp), event.status);
        if !event.location.is_empty() {
            line.push_str(&format!(" @ {}", event.location));
        }
        if !event.description.is_empty() && event.description != event.status {
            line.push_str(&format!(" - {}", event.description));
        }
        lines.push(line);
    }
    lines
}

fn or_na(value: &str) -> &str {
    if value.is_empty() { "N/A" } else { value }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use clap::CommandFactory;
    use parcel_core::{Event, PENDING_STATUS, TrackingNumber};

    fn parcel(number: &str, carrier: Option<Carrier>) -> Parcel {
        Parcel::new(TrackingNumber::parse(number).unwrap(), carrier, None, None)
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_add_with_options() {
        let cli = Cli::try_parse_from([
            "parcel-tracker", "add", "6A12345678901", "--alias", "shoes", "--destination", "Lyon",
        ])
        .unwrap();
        match cli.command {
            Command::Add { tracking_number, alias, destination } => {
                assert_eq!(tracking_number, "6A12345678901");
                assert_eq!(alias.as_deref(), Some("shoes"));
                assert_eq!(destination.as_deref(), Some("Lyon"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn parses_check_notify_flag() {
        let cli = Cli::try_parse_from(["parcel-tracker", "check", "--notify"]).unwrap();
        assert!(matches!(cli.command, Command::Check { notify: true }));
        assert!(Cli::try_parse_from(["parcel-tracker", "remove"]).is_err());
    }

    #[test]
    fn added_line_names_carrier_or_unknown() {
        assert_eq!(
            added_line(&parcel("1Z999AA10123456784", Some(Carrier::Ups))),
            "Added 1Z999AA10123456784 (UPS)"
        );
        assert_eq!(added_line(&parcel("QQ1", None)), "Added QQ1 (Unknown)");
    }

    #[test]
    fn detect_output() {
        assert_eq!(
            detect_lines(Some(Carrier::Colissimo)),
            ["Detected carrier: La Poste / Colissimo (colissimo)"]
        );
        assert_eq!(detect_lines(None).len(), 2);
    }

    #[test]
    fn list_renders_table() {
        let mut tracked = parcel("1Z999AA10123456784", Some(Carrier::Ups));
        tracked.status = Some("Out for delivery, expected before end of day".into());
        tracked.last_update = Some("2024-03-02 08:00".into());
        let pending = parcel("QQ1", None);

        let lines = list_lines(&[tracked, pending]);
        assert_eq!(lines[0], format!("{:<20} {:<20} {:<30} Last Update", "Tracking #", "Carrier", "Status"));
        assert_eq!(lines[1].len(), 90);
        assert_eq!(
            lines[2],
            format!(
                "{:<20} {:<20} {:<30} 2024-03-02 08:00",
                "1Z999AA10123456784", "UPS", "Out for delivery, expected b"
            )
        );
        assert!(lines[3].starts_with("QQ1"));
        assert!(lines[3].contains("Unknown"));
        assert!(lines[3].contains(PENDING_STATUS));
        assert!(lines[3].ends_with("Never"));
    }

    #[test]
    fn empty_list_message() {
        assert_eq!(list_lines(&[]), ["No parcels being tracked"]);
    }

    #[test]
    fn update_report() {
        let update = Update {
            tracking_number: TrackingNumber::parse("6A12345678901").unwrap(),
            alias: Some("shoes".into()),
            carrier: Some("colissimo".into()),
            status: "Livré".into(),
            event: Event::new("2024-03-02", "Livré", "", "Votre colis est livré"),
        };
        let lines = update_lines(&[update]);
        assert_eq!(
            lines,
            [
                "Found 1 update(s):",
                "",
                "📦 6A12345678901 [shoes] (La Poste / Colissimo)",
                "   Status: Livré",
                "   Event: Votre colis est livré",
                "   Location: N/A",
                "   Time: 2024-03-02",
            ]
        );
        assert_eq!(update_lines(&[]), ["No new updates"]);
    }

    #[test]
    fn history_report() {
        let entry = HistoryEntry {
            tracking_number: TrackingNumber::parse("QQ1").unwrap(),
            event: Event::new("2024-03-01", "Accepted", "Paris", "Accepted"),
            recorded_at: Utc::now(),
        };
        assert_eq!(
            history_lines("QQ1", &[entry]),
            ["History for QQ1 (1 event(s)):", "  2024-03-01  Accepted @ Paris"]
        );
        assert_eq!(history_lines("QQ1", &[]), ["No archived events for QQ1"]);
    }
}
