//! Localized metadata wrapping an anchored schema.
//!
//! Metadata is checked against its own, narrower meta-schema: a `title` is
//! required, every localized object carries a `default` entry, and every
//! localized value is a string.

use serde_json::{Map, Value as Json};
use std::collections::BTreeMap;

use crate::canonical::{canonicalize, CanonicalBytes};
use crate::crypto::Digest;
use crate::error::ValidationError;
use crate::identifier::content_digest;
use crate::schema::{join, SCHEMA_FIELD};
use crate::uri::{EntityKind, Uri};
use crate::validation::{failure_class, push_issue, Issue, ValidationReport};

/// Well-known URI of the metadata meta-schema, version 1.
pub const METADATA_SCHEMA_V1: &str = "https://anchor-kernel.dev/draft-01/metadata#";

/// Locale key every localized text must carry.
pub const DEFAULT_LOCALE: &str = "default";

const METADATA_KEYS: &[&str] = &[SCHEMA_FIELD, "schema", "title", "description"];

/// Text keyed by locale, with a mandatory `default` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalizedText(BTreeMap<String, String>);

impl LocalizedText {
    pub fn new(default: impl Into<String>) -> Self {
        let mut map = BTreeMap::new();
        map.insert(DEFAULT_LOCALE.to_string(), default.into());
        Self(map)
    }

    pub fn with(mut self, locale: impl Into<String>, text: impl Into<String>) -> Self {
        self.0.insert(locale.into(), text.into());
        self
    }

    pub fn default_text(&self) -> &str {
        self.0.get(DEFAULT_LOCALE).map(String::as_str).unwrap_or_default()
    }

    /// Text for `locale`, falling back to the default.
    pub fn get(&self, locale: &str) -> &str {
        self.0
            .get(locale)
            .map(String::as_str)
            .unwrap_or_else(|| self.default_text())
    }

    pub fn locales(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    fn to_json(&self) -> Json {
        Json::Object(
            self.0
                .iter()
                .map(|(k, v)| (k.clone(), Json::from(v.clone())))
                .collect(),
        )
    }

    fn parse(value: &Json, path: &str, issues: &mut Vec<Issue>) -> Option<Self> {
        let Some(obj) = value.as_object() else {
            push_issue(issues, failure_class::WRONG_TYPE, path, "localized text must be an object");
            return None;
        };
        let before = issues.len();
        if !obj.contains_key(DEFAULT_LOCALE) {
            push_issue(issues, failure_class::MISSING_FIELD, &join(path, DEFAULT_LOCALE), "a default locale entry is required");
        }
        let mut map = BTreeMap::new();
        for (locale, text) in obj {
            if !is_locale(locale) {
                push_issue(issues, failure_class::INVALID_VALUE, &join(path, locale), "not a locale tag");
            }
            match text.as_str() {
                Some(t) => {
                    map.insert(locale.clone(), t.to_string());
                }
                None => push_issue(issues, failure_class::WRONG_TYPE, &join(path, locale), "must be a string"),
            }
        }
        (issues.len() == before).then_some(Self(map))
    }
}

/// Metadata attached to a schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataRecord {
    pub schema: Uri,
    pub title: LocalizedText,
    pub description: Option<LocalizedText>,
}

impl MetadataRecord {
    pub fn new(schema: Uri, title: LocalizedText) -> Self {
        Self {
            schema,
            title,
            description: None,
        }
    }

    pub fn with_description(mut self, description: LocalizedText) -> Self {
        self.description = Some(description);
        self
    }

    pub fn to_document(&self) -> Json {
        let mut out = Map::new();
        out.insert(SCHEMA_FIELD.into(), Json::from(METADATA_SCHEMA_V1));
        out.insert("schema".into(), Json::from(self.schema.to_string()));
        out.insert("title".into(), self.title.to_json());
        if let Some(description) = &self.description {
            out.insert("description".into(), description.to_json());
        }
        Json::Object(out)
    }

    /// Parse and check a metadata document.
    pub fn from_document(document: &Json) -> Result<Self, ValidationError> {
        let mut issues = Vec::new();
        let record = parse_metadata(document, &mut issues);
        ValidationReport::from_issues(issues).into_result()?;
        record.ok_or_else(|| ValidationError::Structural(ValidationReport::default()))
    }

    pub fn canonical(&self) -> Result<CanonicalBytes, ValidationError> {
        Ok(canonicalize(&self.to_document())?)
    }

    /// Integrity digest of the metadata content.
    pub fn digest(&self) -> Result<Digest, ValidationError> {
        Ok(content_digest(&self.canonical()?))
    }
}

pub(crate) fn parse_metadata(document: &Json, issues: &mut Vec<Issue>) -> Option<MetadataRecord> {
    let Some(obj) = document.as_object() else {
        push_issue(issues, failure_class::WRONG_TYPE, "$", "metadata must be an object");
        return None;
    };
    let before = issues.len();

    match obj.get(SCHEMA_FIELD).and_then(Json::as_str) {
        Some(METADATA_SCHEMA_V1) => {}
        Some(other) => push_issue(issues, failure_class::UNKNOWN_META_SCHEMA, SCHEMA_FIELD, other),
        None => push_issue(issues, failure_class::MISSING_FIELD, SCHEMA_FIELD, "meta-schema declaration is required"),
    }

    for key in obj.keys() {
        if !METADATA_KEYS.contains(&key.as_str()) {
            push_issue(issues, failure_class::UNEXPECTED_FIELD, key, "field is not allowed here");
        }
    }

    let schema = match obj.get("schema").and_then(Json::as_str) {
        Some(s) => match Uri::parse_kind(s, EntityKind::Schema) {
            Ok(uri) => Some(uri),
            Err(e) => {
                push_issue(issues, failure_class::INVALID_VALUE, "schema", e.to_string());
                None
            }
        },
        None => {
            push_issue(issues, failure_class::MISSING_FIELD, "schema", "target schema uri is required");
            None
        }
    };

    let title = match obj.get("title") {
        Some(value) => LocalizedText::parse(value, "title", issues),
        None => {
            push_issue(issues, failure_class::MISSING_FIELD, "title", "title is required");
            None
        }
    };
    let description = obj
        .get("description")
        .and_then(|value| LocalizedText::parse(value, "description", issues));

    if issues.len() > before {
        return None;
    }
    Some(MetadataRecord {
        schema: schema?,
        title: title?,
        description,
    })
}

// `default`, or a BCP 47 style tag such as `en`, `pt-BR`.
fn is_locale(tag: &str) -> bool {
    if tag == DEFAULT_LOCALE {
        return true;
    }
    let mut parts = tag.split('-');
    let primary_ok = parts
        .next()
        .map_or(false, |p| (2..=3).contains(&p.len()) && p.bytes().all(|b| b.is_ascii_lowercase()));
    primary_ok && parts.all(|p| (1..=8).contains(&p.len()) && p.bytes().all(|b| b.is_ascii_alphanumeric()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uri::NetworkScope;
    use crate::validation::check_metadata;
    use serde_json::json;

    fn schema_uri() -> Uri {
        Uri::from_id(EntityKind::Schema, NetworkScope::default(), [3; 32])
    }

    #[test]
    fn test_metadata_roundtrip() {
        let record = MetadataRecord::new(
            schema_uri(),
            LocalizedText::new("Person").with("fr", "Personne"),
        )
        .with_description(LocalizedText::new("A human being"));

        let doc = record.to_document();
        assert!(check_metadata(&doc).is_valid());
        assert_eq!(MetadataRecord::from_document(&doc).unwrap(), record);
    }

    #[test]
    fn test_default_locale_required() {
        let doc = json!({
            "$schema": METADATA_SCHEMA_V1,
            "schema": schema_uri().to_string(),
            "title": {"en": "Person"}
        });
        let report = check_metadata(&doc);
        assert!(report.issues.iter().any(|i| i.path == "title.default"));
    }

    #[test]
    fn test_localized_values_must_be_strings() {
        let doc = json!({
            "$schema": METADATA_SCHEMA_V1,
            "schema": schema_uri().to_string(),
            "title": {"default": "Person", "de": 7}
        });
        assert!(MetadataRecord::from_document(&doc).is_err());
    }

    #[test]
    fn test_schema_target_must_be_schema_uri() {
        let entry = Uri::from_id(EntityKind::Entry, NetworkScope::default(), [3; 32]);
        let doc = json!({
            "$schema": METADATA_SCHEMA_V1,
            "schema": entry.to_string(),
            "title": {"default": "Person"}
        });
        assert!(!check_metadata(&doc).is_valid());
    }

    #[test]
    fn test_locale_fallback() {
        let title = LocalizedText::new("Colour").with("en-US", "Color");
        assert_eq!(title.get("en-US"), "Color");
        assert_eq!(title.get("de"), "Colour");
    }

    #[test]
    fn test_locale_tags() {
        assert!(is_locale("default"));
        assert!(is_locale("pt-BR"));
        assert!(!is_locale("PT"));
        assert!(!is_locale("english-language"));
    }
}
