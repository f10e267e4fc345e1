//! PII value validation: one pure predicate per category, backed by a
//! replaceable rule table for the SSN and card checks.

pub mod rules;
pub mod validators;

pub use rules::*;
pub use validators::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RulesError {
    #[error("Cannot read rule table: {0}")]
    Io(#[from] std::io::Error),

    #[error("Rule table is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Rule table rejected: {0}")]
    Invalid(String),
}
