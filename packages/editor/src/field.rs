//! Field identity and save-time field validation.

use crate::blank::is_blank;
use crate::document::Document;
use crate::schema::{validate_with, RuleRegistry, Violation};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Which persisted field a document belongs to
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldKey {
    pub record_id: String,
    pub version: String,
    /// Field name, e.g. `introduction` or `scientific_theory`
    pub field: String,
}

impl FieldKey {
    pub fn new(
        record_id: impl Into<String>,
        version: impl Into<String>,
        field: impl Into<String>,
    ) -> Self {
        Self {
            record_id: record_id.into(),
            version: version.into(),
            field: field.into(),
        }
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}/{}", self.record_id, self.version, self.field)
    }
}

/// Why a field cannot be submitted
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FieldError {
    #[error("{field} is required")]
    Required { field: String },

    #[error("{field} has {} schema violation(s)", .violations.len())]
    Invalid {
        field: String,
        violations: Vec<Violation>,
    },
}

/// Gate a field for submission: blank required fields first, then schema
/// violations
pub fn check_field(
    key: &FieldKey,
    document: &Document,
    required: bool,
    registry: &RuleRegistry,
) -> Result<(), FieldError> {
    if required && is_blank(document) {
        return Err(FieldError::Required {
            field: key.field.clone(),
        });
    }

    let violations = validate_with(document, registry);
    if violations.is_empty() {
        Ok(())
    } else {
        Err(FieldError::Invalid {
            field: key.field.clone(),
            violations,
        })
    }
}
