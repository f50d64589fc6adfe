//! Notification formatting and delivery
//!
//! One message goes out per check cycle: the detailed form for a single
//! update, a consolidated summary for several. When delivery fails the
//! caller prints [`fallback_lines`] instead.

pub mod command;

pub use command::CommandNotifier;

use crate::carrier::carrier_display_name;
use crate::detector::Update;

/// `" [alias]"`, or nothing
fn alias_suffix(update: &Update) -> String {
    match update.alias.as_deref() {
        Some(alias) if !alias.is_empty() => format!(" [{}]", alias),
        _ => String::new(),
    }
}

fn summary_line(update: &Update) -> String {
    format!(
        "{}{} ({}): {}",
        update.tracking_number,
        alias_suffix(update),
        carrier_display_name(update.carrier.as_deref()),
        update.status
    )
}

/// Format the message for one check cycle, or `None` if nothing changed
pub fn format_message(updates: &[Update]) -> Option<String> {
    match updates {
        [] => None,
        [update] => {
            let mut lines = vec![
                "📦 Parcel Update".to_string(),
                String::new(),
                format!("{}{}", update.tracking_number, alias_suffix(update)),
                format!("Carrier: {}", carrier_display_name(update.carrier.as_deref())),
                format!("Status: {}", update.status),
            ];
            let event = &update.event;
            if !event.description.is_empty() {
                lines.push(format!("Event: {}", event.description));
            }
            if !event.location.is_empty() {
                lines.push(format!("Location: {}", event.location));
            }
            if !event.timestamp.is_empty() {
                lines.push(format!("Time: {}", event.timestamp));
            }
            Some(lines.join("\n"))
        }
        many => {
            let mut lines = vec![format!("📦 {} Parcel Updates", many.len()), String::new()];
            lines.extend(many.iter().map(|u| format!("• {}", summary_line(u))));
            Some(lines.join("\n"))
        }
    }
}

/// One stdout line per update, used when delivery fails
pub fn fallback_lines(updates: &[Update]) -> Vec<String> {
    updates
        .iter()
        .map(|u| format!("📦 {}", summary_line(u)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::carrier::TrackingNumber;
    use crate::traits::Event;

    fn update(number: &str, alias: Option<&str>, carrier: Option<&str>, event: Event) -> Update {
        Update {
            tracking_number: TrackingNumber::parse(number).unwrap(),
            alias: alias.map(String::from),
            carrier: carrier.map(String::from),
            status: "In transit".to_string(),
            event,
        }
    }

    #[test]
    fn no_updates_no_message() {
        assert!(format_message(&[]).is_none());
        assert!(fallback_lines(&[]).is_empty());
    }

    #[test]
    fn single_update_is_detailed() {
        let u = update(
            "1Z999AA10123456784",
            Some("Laptop"),
            Some("ups"),
            Event::new("2024-03-01 10:00", "In transit", "Lyon", "Departed facility"),
        );
        assert_eq!(
            format_message(&[u]).unwrap(),
            "📦 Parcel Update\n\n\
             1Z999AA10123456784 [Laptop]\n\
             Carrier: UPS\n\
             Status: In transit\n\
             Event: Departed facility\n\
             Location: Lyon\n\
             Time: 2024-03-01 10:00"
        );
    }

    #[test]
    fn single_update_skips_empty_event_fields() {
        let u = update("AB123456789FR", None, None, Event::new("", "In transit", "", ""));
        assert_eq!(
            format_message(&[u]).unwrap(),
            "📦 Parcel Update\n\nAB123456789FR\nCarrier: Unknown\nStatus: In transit"
        );
    }

    #[test]
    fn several_updates_are_summarized() {
        let updates = [
            update("1Z999AA10123456784", Some("Laptop"), Some("ups"), Event::default()),
            update("LP00123456789012", None, Some("yunexpress"), Event::default()),
        ];
        assert_eq!(
            format_message(&updates).unwrap(),
            "📦 2 Parcel Updates\n\n\
             • 1Z999AA10123456784 [Laptop] (UPS): In transit\n\
             • LP00123456789012 (YUNEXPRESS): In transit"
        );
    }

    #[test]
    fn fallback_has_one_line_per_update() {
        let updates = [
            update("1Z999AA10123456784", None, Some("ups"), Event::default()),
            update("AB123456789FR", Some("Books"), None, Event::default()),
        ];
        assert_eq!(
            fallback_lines(&updates),
            [
                "📦 1Z999AA10123456784 (UPS): In transit",
                "📦 AB123456789FR [Books] (Unknown): In transit",
            ]
        );
    }
}
