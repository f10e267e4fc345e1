//! Versionable business rules behind the SSN and card validators.
//!
//! SSN issuance exclusions and issuer BIN ranges change independently of
//! the pipeline, so they live in a serde table that can be replaced from a
//! JSON file (`PII_RULES_PATH`) without touching the validator code.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::RulesError;

/// Version tag of the built-in table.
pub const BUILTIN_RULES_VERSION: &str = "builtin-2024.1";

/// Inclusive numeric range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberRange {
    pub start: u32,
    pub end: u32,
}

impl NumberRange {
    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    pub const fn single(value: u32) -> Self {
        Self::new(value, value)
    }

    pub fn contains(&self, value: u32) -> bool {
        (self.start..=self.end).contains(&value)
    }
}

/// Number blocks the issuing authority never assigns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SsnRules {
    pub excluded_areas: Vec<NumberRange>,
    pub excluded_groups: Vec<NumberRange>,
    pub excluded_serials: Vec<NumberRange>,
}

impl SsnRules {
    pub fn allows(&self, area: u32, group: u32, serial: u32) -> bool {
        !self.excluded_areas.iter().any(|r| r.contains(area))
            && !self.excluded_groups.iter().any(|r| r.contains(group))
            && !self.excluded_serials.iter().any(|r| r.contains(serial))
    }
}

impl Default for SsnRules {
    fn default() -> Self {
        Self {
            excluded_areas: vec![
                NumberRange::single(0),
                NumberRange::single(666),
                NumberRange::new(900, 999),
            ],
            excluded_groups: vec![NumberRange::single(0)],
            excluded_serials: vec![NumberRange::single(0)],
        }
    }
}

/// Leading digits of a card number: the first `width` digits, read as a
/// number, must fall in `range`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuerPrefix {
    pub width: usize,
    #[serde(flatten)]
    pub range: NumberRange,
}

impl IssuerPrefix {
    pub const fn new(width: usize, start: u32, end: u32) -> Self {
        Self {
            width,
            range: NumberRange::new(start, end),
        }
    }

    pub fn matches(&self, digits: &str) -> bool {
        digits
            .get(..self.width)
            .and_then(|head| head.parse::<u32>().ok())
            .is_some_and(|head| self.range.contains(head))
    }
}

/// One issuer numbering pattern: accepted lengths plus accepted prefixes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardIssuer {
    pub name: String,
    pub lengths: Vec<usize>,
    pub prefixes: Vec<IssuerPrefix>,
}

impl CardIssuer {
    fn new(name: &str, lengths: &[usize], prefixes: &[IssuerPrefix]) -> Self {
        Self {
            name: name.to_string(),
            lengths: lengths.to_vec(),
            prefixes: prefixes.to_vec(),
        }
    }

    /// `digits` must already be stripped of separators.
    pub fn matches(&self, digits: &str) -> bool {
        self.lengths.contains(&digits.len()) && self.prefixes.iter().any(|p| p.matches(digits))
    }
}

/// The complete rule table consulted by the validators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationRules {
    pub version: String,
    pub ssn: SsnRules,
    pub card_issuers: Vec<CardIssuer>,
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self {
            version: BUILTIN_RULES_VERSION.to_string(),
            ssn: SsnRules::default(),
            card_issuers: vec![
                CardIssuer::new("Visa", &[13, 16], &[IssuerPrefix::new(1, 4, 4)]),
                CardIssuer::new(
                    "Mastercard",
                    &[16],
                    &[IssuerPrefix::new(2, 51, 55), IssuerPrefix::new(4, 2221, 2720)],
                ),
                CardIssuer::new(
                    "American Express",
                    &[15],
                    &[IssuerPrefix::new(2, 34, 34), IssuerPrefix::new(2, 37, 37)],
                ),
                CardIssuer::new(
                    "Discover",
                    &[16],
                    &[
                        IssuerPrefix::new(4, 6011, 6011),
                        IssuerPrefix::new(3, 644, 649),
                        IssuerPrefix::new(2, 65, 65),
                    ],
                ),
                CardIssuer::new(
                    "Diners Club",
                    &[14],
                    &[
                        IssuerPrefix::new(3, 300, 305),
                        IssuerPrefix::new(2, 36, 36),
                        IssuerPrefix::new(2, 38, 38),
                    ],
                ),
                CardIssuer::new("JCB", &[16], &[IssuerPrefix::new(4, 3528, 3589)]),
                CardIssuer::new(
                    "JCB (15-digit)",
                    &[15],
                    &[IssuerPrefix::new(4, 2131, 2131), IssuerPrefix::new(4, 1800, 1800)],
                ),
            ],
        }
    }
}

impl ValidationRules {
    /// Load a rule table from a JSON file.
    pub fn load(path: &Path) -> Result<Self, RulesError> {
        let raw = std::fs::read_to_string(path)?;
        let rules = Self::from_json(&raw)?;
        tracing::info!(
            path = %path.display(),
            version = %rules.version,
            issuers = rules.card_issuers.len(),
            "Loaded validation rule table"
        );
        Ok(rules)
    }

    pub fn from_json(raw: &str) -> Result<Self, RulesError> {
        let rules: Self = serde_json::from_str(raw)?;
        rules.check()?;
        Ok(rules)
    }

    /// The first issuer whose pattern matches the stripped card digits.
    pub fn issuer_for(&self, digits: &str) -> Option<&CardIssuer> {
        self.card_issuers.iter().find(|issuer| issuer.matches(digits))
    }

    fn check(&self) -> Result<(), RulesError> {
        if self.card_issuers.is_empty() {
            return Err(RulesError::Invalid("rule table has no card issuers".into()));
        }

        let ssn_ranges = self
            .ssn
            .excluded_areas
            .iter()
            .chain(&self.ssn.excluded_groups)
            .chain(&self.ssn.excluded_serials);
        for range in ssn_ranges {
            if range.start > range.end {
                return Err(RulesError::Invalid(format!(
                    "SSN range {}..={} is reversed",
                    range.start, range.end
                )));
            }
        }

        for issuer in &self.card_issuers {
            if issuer.lengths.is_empty() || issuer.prefixes.is_empty() {
                return Err(RulesError::Invalid(format!(
                    "issuer '{}' needs at least one length and one prefix",
                    issuer.name
                )));
            }
            for prefix in &issuer.prefixes {
                if prefix.width == 0 || prefix.range.start > prefix.range.end {
                    return Err(RulesError::Invalid(format!(
                        "issuer '{}' has an invalid prefix {}..={} (width {})",
                        issuer.name, prefix.range.start, prefix.range.end, prefix.width
                    )));
                }
            }
        }

        Ok(())
    }
}
