//! Structural validation reports.
//!
//! Checks never fail by raising: they collect every [`Issue`] found into a
//! [`ValidationReport`], and "is this valid" is a query on the report.
//! Callers that need a hard failure convert with [`ValidationReport::into_result`].

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use std::collections::BTreeSet;
use std::fmt;

use crate::error::ValidationError;
use crate::metadata::parse_metadata;
use crate::schema::{parse_schema, SchemaDefinition};

/// Failure class tags carried by issues.
pub mod failure_class {
    pub const UNKNOWN_META_SCHEMA: &str = "unknown_meta_schema";
    pub const MISSING_FIELD: &str = "missing_field";
    pub const UNEXPECTED_FIELD: &str = "unexpected_field";
    pub const WRONG_TYPE: &str = "wrong_type";
    pub const INVALID_VALUE: &str = "invalid_value";
    pub const UNDECLARED_REQUIRED: &str = "undeclared_required";
}

/// A single problem found while checking a document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Issue {
    pub failure_class: String,
    /// Dotted path to the offending field (`$` for the document itself).
    pub path: String,
    pub message: String,
}

/// The outcome of a structural check.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationReport {
    pub issues: Vec<Issue>,
}

impl ValidationReport {
    /// Build a report with issues in a stable order.
    pub fn from_issues(mut issues: Vec<Issue>) -> Self {
        issues.sort_by(|a, b| {
            (&a.path, &a.failure_class, &a.message).cmp(&(&b.path, &b.failure_class, &b.message))
        });
        Self { issues }
    }

    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }

    /// Distinct failure classes present.
    pub fn failure_classes(&self) -> BTreeSet<&str> {
        self.issues.iter().map(|i| i.failure_class.as_str()).collect()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.issues.iter().any(|i| i.failure_class == class)
    }

    /// The unrecognized meta-schema URI, if that is one of the issues.
    pub fn unknown_meta_schema(&self) -> Option<String> {
        self.issues
            .iter()
            .find(|i| i.failure_class == failure_class::UNKNOWN_META_SCHEMA)
            .map(|i| i.message.clone())
    }

    pub fn into_result(self) -> Result<(), ValidationError> {
        if self.is_valid() {
            return Ok(());
        }
        match self.unknown_meta_schema() {
            Some(uri) => Err(ValidationError::UnknownMetaSchema(uri)),
            None => Err(ValidationError::Structural(self)),
        }
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.issues.is_empty() {
            return f.write_str("no issues");
        }
        write!(f, "{} issue(s)", self.issues.len())?;
        for issue in &self.issues {
            write!(f, "; {}: {} ({})", issue.path, issue.message, issue.failure_class)?;
        }
        Ok(())
    }
}

pub(crate) fn push_issue(
    issues: &mut Vec<Issue>,
    failure_class: &str,
    path: &str,
    message: impl Into<String>,
) {
    issues.push(Issue {
        failure_class: failure_class.to_string(),
        path: path.to_string(),
        message: message.into(),
    });
}

/// Check a schema document against the meta-schema it declares.
pub fn check_schema(document: &Json) -> ValidationReport {
    let mut issues = Vec::new();
    parse_schema(document, &mut issues);
    ValidationReport::from_issues(issues)
}

/// Whether a schema document is structurally valid.
pub fn is_valid_schema(document: &Json) -> bool {
    check_schema(document).is_valid()
}

/// Check a metadata document against the metadata meta-schema.
pub fn check_metadata(document: &Json) -> ValidationReport {
    let mut issues = Vec::new();
    parse_metadata(document, &mut issues);
    ValidationReport::from_issues(issues)
}

/// Check entry content against a schema.
pub fn check_content(schema: &SchemaDefinition, content: &Json) -> ValidationReport {
    schema.verify_content(content)
}
