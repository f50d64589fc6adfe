//! Carrier identification from tracking-number shape
//!
//! The rule table is ordered data: carriers are tried in declaration order,
//! rules within a carrier in declaration order, and the first carrier with a
//! matching rule wins. Overlapping shapes (a 12-digit number is valid for
//! several carriers) are resolved by position in [`CARRIER_RULES`] alone.
//!
//! ```rust
//! use parcel_core::carrier::{Carrier, detect_carrier};
//!
//! assert_eq!(detect_carrier("1Z999AA10123456784"), Some(Carrier::Ups));
//! assert_eq!(detect_carrier("not a parcel"), None);
//! ```

use crate::error::{Error, Result};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

/// Known carriers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Carrier {
    Colissimo,
    Chronopost,
    Ups,
    Fedex,
    Usps,
    Dhl,
    RoyalMail,
    Dpd,
    Gls,
    Evri,
    MondialRelay,
    InPost,
    Amazon,
    Cainiao,
    Yanwen,
    Sunyou,
    #[serde(rename = "4px")]
    FourPx,
}

impl Carrier {
    /// Every known carrier, in rule-table order
    pub const ALL: [Carrier; 17] = [
        Carrier::Colissimo,
        Carrier::Chronopost,
        Carrier::Ups,
        Carrier::Fedex,
        Carrier::Usps,
        Carrier::Dhl,
        Carrier::RoyalMail,
        Carrier::Dpd,
        Carrier::Gls,
        Carrier::Evri,
        Carrier::MondialRelay,
        Carrier::InPost,
        Carrier::Amazon,
        Carrier::Cainiao,
        Carrier::Yanwen,
        Carrier::Sunyou,
        Carrier::FourPx,
    ];

    /// Stable lowercase code, used for storage and provider hints
    pub fn code(self) -> &'static str {
        match self {
            Carrier::Colissimo => "colissimo",
            Carrier::Chronopost => "chronopost",
            Carrier::Ups => "ups",
            Carrier::Fedex => "fedex",
            Carrier::Usps => "usps",
            Carrier::Dhl => "dhl",
            Carrier::RoyalMail => "royalmail",
            Carrier::Dpd => "dpd",
            Carrier::Gls => "gls",
            Carrier::Evri => "evri",
            Carrier::MondialRelay => "mondialrelay",
            Carrier::InPost => "inpost",
            Carrier::Amazon => "amazon",
            Carrier::Cainiao => "cainiao",
            Carrier::Yanwen => "yanwen",
            Carrier::Sunyou => "sunyou",
            Carrier::FourPx => "4px",
        }
    }

    /// Human-readable name
    pub fn display_name(self) -> &'static str {
        match self {
            Carrier::Colissimo => "La Poste / Colissimo",
            Carrier::Chronopost => "Chronopost",
            Carrier::Ups => "UPS",
            Carrier::Fedex => "FedEx",
            Carrier::Usps => "USPS",
            Carrier::Dhl => "DHL",
            Carrier::RoyalMail => "Royal Mail",
            Carrier::Dpd => "DPD",
            Carrier::Gls => "GLS",
            Carrier::Evri => "Evri",
            Carrier::MondialRelay => "Mondial Relay",
            Carrier::InPost => "InPost",
            Carrier::Amazon => "Amazon Logistics",
            Carrier::Cainiao => "Cainiao / AliExpress",
            Carrier::Yanwen => "Yanwen",
            Carrier::Sunyou => "Sunyou",
            Carrier::FourPx => "4PX",
        }
    }
}

impl fmt::Display for Carrier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Carrier {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let code = s.trim().to_ascii_lowercase();
        Carrier::ALL
            .into_iter()
            .find(|c| c.code() == code)
            .ok_or_else(|| Error::invalid_input(format!("Unknown carrier code: {}", s)))
    }
}

/// Render a carrier code for humans.
///
/// Known codes map to their display name, unknown provider-reported codes
/// are uppercased, and an absent carrier is `"Unknown"`.
pub fn carrier_display_name(code: Option<&str>) -> String {
    match code {
        None | Some("") => "Unknown".to_string(),
        Some(code) => match code.parse::<Carrier>() {
            Ok(carrier) => carrier.display_name().to_string(),
            Err(_) => code.to_uppercase(),
        },
    }
}

/// Ordered carrier shape rules. First carrier with any matching rule wins.
///
/// USPS sits ahead of DHL so the 22-digit `9x` USPS shape is not swallowed
/// by DHL's generic 20-25 digit rule.
pub const CARRIER_RULES: &[(Carrier, &[&str])] = &[
    (
        Carrier::Colissimo,
        &[r"^\d{11,15}$", r"^[A-Z]{2}\d{9}[A-Z]{2}$", r"^6P\d{9}$"],
    ),
    (Carrier::Chronopost, &[r"^\d{13}$", r"^XX\d{9}[A-Z]{2}$"]),
    (Carrier::Ups, &[r"^1Z[A-Z0-9]{16}$", r"^\d{12}$", r"^T\d{10}$"]),
    (
        Carrier::Fedex,
        &[r"^\d{12}$", r"^\d{15}$", r"^\d{20}$", r"^\d{34}$"],
    ),
    (
        Carrier::Usps,
        &[
            r"^(92|93|94|95)\d{20}$",
            r"^\d{20,22}$",
            r"^[A-Z]{2}\d{9}[A-Z]{2}$",
            r"^EA\d{9}[A-Z]{2}$",
        ],
    ),
    (
        Carrier::Dhl,
        &[r"^\d{10}$", r"^\d{11}$", r"^JJD\d{15,25}$", r"^\d{20,25}$"],
    ),
    (Carrier::RoyalMail, &[r"^[A-Z]{2}\d{9}GB$", r"^\d{13}$"]),
    (Carrier::Dpd, &[r"^\d{14}$", r"^\d{18}$"]),
    (Carrier::Gls, &[r"^\d{11,12}$", r"^\d{20}$"]),
    (Carrier::Evri, &[r"^\d{16}$"]),
    (Carrier::MondialRelay, &[r"^\d{8}$"]),
    (Carrier::InPost, &[r"^\d{24}$"]),
    (Carrier::Amazon, &[r"^TBA\d{12}$", r"^TBC\d{12}$", r"^TBM\d{12}$"]),
    (
        Carrier::Cainiao,
        &[r"^CN[A-Z]{2}\d{9,15}[A-Z]{2}$", r"^LP\d{14}$", r"^\d{14}$"],
    ),
    (Carrier::Yanwen, &[r"^\d{12,14}$", r"^YT\d{16}$", r"^UF\d{14}$"]),
    (Carrier::Sunyou, &[r"^SY\d{10,14}$", r"^\d{11}Y$"]),
    (Carrier::FourPx, &[r"^\d{12,15}$", r"^LX\d{12}CN$"]),
];

/// Uppercase and strip spaces and hyphens.
pub fn normalize(raw: &str) -> String {
    raw.chars()
        .filter(|c| *c != ' ' && *c != '-')
        .flat_map(char::to_uppercase)
        .collect()
}

/// A normalized tracking number
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TrackingNumber(String);

impl TrackingNumber {
    /// Normalize and validate a raw tracking number.
    ///
    /// Fails if nothing is left after normalization or if anything other
    /// than ASCII letters and digits remains.
    pub fn parse(raw: &str) -> Result<Self> {
        let normalized = normalize(raw.trim());
        if normalized.is_empty() {
            return Err(Error::invalid_input("Tracking number cannot be empty"));
        }
        if !normalized.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(Error::invalid_input(format!(
                "Tracking number may only contain letters and digits: {}",
                raw
            )));
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrackingNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TrackingNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for TrackingNumber {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for TrackingNumber {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<TrackingNumber> for String {
    fn from(value: TrackingNumber) -> Self {
        value.0
    }
}

/// Compiled, ordered carrier rule set
#[derive(Debug, Clone)]
pub struct CarrierMatcher {
    rules: Vec<(Carrier, Vec<Regex>)>,
}

static BUILTIN_MATCHER: LazyLock<CarrierMatcher> = LazyLock::new(|| {
    CarrierMatcher::from_rules(CARRIER_RULES).expect("built-in carrier rules compile")
});

impl CarrierMatcher {
    /// Compile a rule table, preserving its order.
    ///
    /// Patterns are compiled without Unicode classes, so `\d` is `[0-9]`.
    pub fn from_rules(rules: &[(Carrier, &[&str])]) -> Result<Self> {
        let compiled = rules
            .iter()
            .map(|(carrier, patterns)| {
                let regexes = patterns
                    .iter()
                    .map(|pattern| {
                        RegexBuilder::new(pattern)
                            .unicode(false)
                            .build()
                            .map_err(|e| {
                                Error::config(format!(
                                    "Invalid rule {} for {}: {}",
                                    pattern, carrier, e
                                ))
                            })
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok((*carrier, regexes))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { rules: compiled })
    }

    /// The matcher compiled from [`CARRIER_RULES`]
    pub fn builtin() -> &'static CarrierMatcher {
        &BUILTIN_MATCHER
    }

    /// First carrier whose rule set accepts the normalized input
    pub fn match_carrier(&self, raw: &str) -> Option<Carrier> {
        let normalized = normalize(raw);
        self.rules
            .iter()
            .find(|(_, regexes)| regexes.iter().any(|re| re.is_match(&normalized)))
            .map(|(carrier, _)| *carrier)
    }

    /// Every carrier with at least one satisfied rule, in table order.
    ///
    /// Diagnostic only; `match_carrier` returns the first of these.
    pub fn candidates(&self, raw: &str) -> Vec<Carrier> {
        let normalized = normalize(raw);
        self.rules
            .iter()
            .filter(|(_, regexes)| regexes.iter().any(|re| re.is_match(&normalized)))
            .map(|(carrier, _)| *carrier)
            .collect()
    }
}

/// Match against the built-in rule table
pub fn detect_carrier(raw: &str) -> Option<Carrier> {
    CarrierMatcher::builtin().match_carrier(raw)
}
