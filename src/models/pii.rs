use std::num::NonZeroU32;

use serde::Serialize;

use super::enums::PiiCategory;

/// A finding proposed by the extraction capability, not yet verified.
///
/// Built only at the capability boundary from tool-call arguments
/// (see [`PiiCandidate::from_tool_arguments`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PiiCandidate {
    pub value: String,
    pub category: PiiCategory,
    /// 1-based page or segment index within the source document.
    pub location: NonZeroU32,
}

/// Why a structured proposal does not honor the candidate schema.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CandidateSchemaError {
    #[error("proposal arguments are not a JSON object")]
    NotAnObject,

    #[error("proposal is missing required field '{0}'")]
    MissingField(&'static str),

    #[error("field '{field}' has the wrong type: expected {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },

    #[error("category '{0}' is not a known PII category")]
    UnknownCategory(String),

    #[error("location {0} is not a 1-based page number")]
    InvalidLocation(String),
}

impl PiiCandidate {
    pub fn new(value: impl Into<String>, category: PiiCategory, location: NonZeroU32) -> Self {
        Self {
            value: value.into(),
            category,
            location,
        }
    }

    /// Parse the arguments of one `record_pii` tool call.
    ///
    /// Accepts `{ "value", "type", "page" }` (the tool schema) and the
    /// long-form aliases `category` / `location`. Arguments encoded as a JSON
    /// string are decoded first, since some providers deliver them that way.
    pub fn from_tool_arguments(arguments: &serde_json::Value) -> Result<Self, CandidateSchemaError> {
        let decoded;
        let arguments = match arguments {
            serde_json::Value::String(raw) => {
                decoded = serde_json::from_str::<serde_json::Value>(raw)
                    .map_err(|_| CandidateSchemaError::NotAnObject)?;
                &decoded
            }
            other => other,
        };

        let object = arguments
            .as_object()
            .ok_or(CandidateSchemaError::NotAnObject)?;

        let value = match object.get("value") {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(serde_json::Value::Null) | None => {
                return Err(CandidateSchemaError::MissingField("value"))
            }
            Some(_) => {
                return Err(CandidateSchemaError::WrongType {
                    field: "value",
                    expected: "string",
                })
            }
        };

        let category = match object.get("type").or_else(|| object.get("category")) {
            Some(serde_json::Value::String(tag)) => tag
                .parse::<PiiCategory>()
                .map_err(|e| CandidateSchemaError::UnknownCategory(e.value))?,
            Some(serde_json::Value::Null) | None => {
                return Err(CandidateSchemaError::MissingField("type"))
            }
            Some(_) => {
                return Err(CandidateSchemaError::WrongType {
                    field: "type",
                    expected: "string",
                })
            }
        };

        let location = match object.get("page").or_else(|| object.get("location")) {
            Some(serde_json::Value::Null) | None => {
                return Err(CandidateSchemaError::MissingField("page"))
            }
            Some(raw) => parse_location(raw)?,
        };

        Ok(Self {
            value,
            category,
            location,
        })
    }
}

/// Page numbers arrive as integers, whole floats (`1.0`) or numeric strings.
fn parse_location(raw: &serde_json::Value) -> Result<NonZeroU32, CandidateSchemaError> {
    let invalid = || CandidateSchemaError::InvalidLocation(raw.to_string());

    let number = match raw {
        serde_json::Value::Number(n) => match n.as_u64() {
            Some(whole) => whole,
            None => {
                let float = n.as_f64().ok_or_else(invalid)?;
                if float.fract() != 0.0 || float < 1.0 || float > u32::MAX as f64 {
                    return Err(invalid());
                }
                float as u64
            }
        },
        serde_json::Value::String(s) => s.trim().parse::<u64>().map_err(|_| invalid())?,
        _ => {
            return Err(CandidateSchemaError::WrongType {
                field: "page",
                expected: "integer",
            })
        }
    };

    u32::try_from(number)
        .ok()
        .and_then(NonZeroU32::new)
        .ok_or_else(invalid)
}

/// A candidate that passed its category's structural validator.
///
/// Only the candidate filter can build one. Passing validation means the
/// value is well-formed for its category; it does not prove the model's
/// claim was contextually right (a valid-looking card number printed as a
/// sample is still reported).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct PiiRecord {
    value: String,
    #[serde(rename = "type")]
    category: PiiCategory,
    #[serde(rename = "page")]
    location: NonZeroU32,
}

impl PiiRecord {
    pub(crate) fn accepted(candidate: PiiCandidate) -> Self {
        Self {
            value: candidate.value,
            category: candidate.category,
            location: candidate.location,
        }
    }

    /// The value exactly as located in the source (separators preserved).
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn category(&self) -> PiiCategory {
        self.category
    }

    pub fn location(&self) -> NonZeroU32 {
        self.location
    }
}

/// Accepted records for one source document, in candidate-emission order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ExtractionResult {
    records: Vec<PiiRecord>,
}

impl ExtractionResult {
    pub(crate) fn from_records(records: Vec<PiiRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[PiiRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PiiRecord> {
        self.records.iter()
    }
}

impl IntoIterator for ExtractionResult {
    type Item = PiiRecord;
    type IntoIter = std::vec::IntoIter<PiiRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl<'a> IntoIterator for &'a ExtractionResult {
    type Item = &'a PiiRecord;
    type IntoIter = std::slice::Iter<'a, PiiRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn page(n: u32) -> NonZeroU32 {
        NonZeroU32::new(n).unwrap()
    }

    #[test]
    fn parses_tool_schema_arguments() {
        let candidate = PiiCandidate::from_tool_arguments(&json!({
            "value": "test@test.com",
            "type": "EMAIL",
            "page": 1
        }))
        .unwrap();
        assert_eq!(candidate, PiiCandidate::new("test@test.com", PiiCategory::Email, page(1)));
    }

    #[test]
    fn parses_long_form_aliases() {
        let candidate = PiiCandidate::from_tool_arguments(&json!({
            "value": "Jane Doe",
            "category": "NAME",
            "location": 3
        }))
        .unwrap();
        assert_eq!(candidate.category, PiiCategory::Name);
        assert_eq!(candidate.location.get(), 3);
    }

    #[test]
    fn parses_string_encoded_arguments() {
        let raw = json!(r#"{"value":"123-45-6789","type":"SOCIAL_SECURITY","page":2}"#);
        let candidate = PiiCandidate::from_tool_arguments(&raw).unwrap();
        assert_eq!(candidate.category, PiiCategory::SocialSecurity);
        assert_eq!(candidate.location.get(), 2);
    }

    #[test]
    fn accepts_whole_float_and_numeric_string_pages() {
        let a = PiiCandidate::from_tool_arguments(&json!({"value": "x", "type": "NAME", "page": 2.0})).unwrap();
        let b = PiiCandidate::from_tool_arguments(&json!({"value": "x", "type": "NAME", "page": "4"})).unwrap();
        assert_eq!(a.location.get(), 2);
        assert_eq!(b.location.get(), 4);
    }

    #[test]
    fn empty_value_is_still_schema_valid() {
        let candidate = PiiCandidate::from_tool_arguments(&json!({"value": "", "type": "PHONE", "page": 1})).unwrap();
        assert!(candidate.value.is_empty());
    }

    #[test]
    fn missing_fields_are_schema_errors() {
        assert_eq!(
            PiiCandidate::from_tool_arguments(&json!({"type": "EMAIL", "page": 1})),
            Err(CandidateSchemaError::MissingField("value"))
        );
        assert_eq!(
            PiiCandidate::from_tool_arguments(&json!({"value": "a@b.co", "page": 1})),
            Err(CandidateSchemaError::MissingField("type"))
        );
        assert_eq!(
            PiiCandidate::from_tool_arguments(&json!({"value": "a@b.co", "type": "EMAIL"})),
            Err(CandidateSchemaError::MissingField("page"))
        );
    }

    #[test]
    fn unknown_category_is_schema_error() {
        assert_eq!(
            PiiCandidate::from_tool_arguments(&json!({"value": "X1", "type": "PASSPORT", "page": 1})),
            Err(CandidateSchemaError::UnknownCategory("PASSPORT".into()))
        );
    }

    #[test]
    fn zero_negative_and_fractional_pages_are_rejected() {
        for bad in [json!(0), json!(-1), json!(1.5), json!("first")] {
            let result = PiiCandidate::from_tool_arguments(&json!({"value": "x", "type": "NAME", "page": bad}));
            assert!(
                matches!(result, Err(CandidateSchemaError::InvalidLocation(_))),
                "page {bad} should be rejected"
            );
        }
    }

    #[test]
    fn non_object_arguments_are_rejected() {
        assert_eq!(
            PiiCandidate::from_tool_arguments(&json!(["EMAIL"])),
            Err(CandidateSchemaError::NotAnObject)
        );
        assert_eq!(
            PiiCandidate::from_tool_arguments(&json!("not json")),
            Err(CandidateSchemaError::NotAnObject)
        );
    }

    #[test]
    fn wrong_value_type_is_rejected() {
        assert_eq!(
            PiiCandidate::from_tool_arguments(&json!({"value": 5551234, "type": "PHONE", "page": 1})),
            Err(CandidateSchemaError::WrongType { field: "value", expected: "string" })
        );
    }

    #[test]
    fn record_serializes_with_wire_field_names() {
        let record = PiiRecord::accepted(PiiCandidate::new("a@b.co", PiiCategory::Email, page(2)));
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json, json!({"value": "a@b.co", "type": "EMAIL", "page": 2}));
    }

    #[test]
    fn result_serializes_as_array() {
        let result = ExtractionResult::from_records(vec![PiiRecord::accepted(PiiCandidate::new(
            "Jane Doe",
            PiiCategory::Name,
            page(1),
        ))]);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json, json!([{"value": "Jane Doe", "type": "NAME", "page": 1}]));
    }
}
