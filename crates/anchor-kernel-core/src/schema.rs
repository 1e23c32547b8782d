//! Schema definitions and the v1 meta-schema.
//!
//! A schema document is a JSON object describing a closed-world record shape:
//!
//! ```json
//! {
//!   "$schema": "https://anchor-kernel.dev/draft-01/schema#",
//!   "$id": "schema:anchor:...",
//!   "title": "Person",
//!   "type": "object",
//!   "properties": {
//!     "name": { "type": "string" },
//!     "age": { "type": "integer" }
//!   },
//!   "required": ["name", "age"],
//!   "additionalProperties": false
//! }
//! ```
//!
//! Property definitions are parsed into [`PropertyType`], a tagged variant
//! matched exhaustively by the content checker.

use chrono::{NaiveDate, NaiveTime};
use serde_json::{json, Map, Value as Json};
use std::collections::BTreeMap;
use url::Url;

use crate::canonical::ID_FIELD;
use crate::error::ValidationError;
use crate::uri::{EntityKind, Uri};
use crate::validation::{failure_class, push_issue, Issue, ValidationReport};

/// Well-known URI of the schema meta-schema, version 1.
pub const META_SCHEMA_V1: &str = "https://anchor-kernel.dev/draft-01/schema#";

/// Field a document uses to declare its meta-schema.
pub const SCHEMA_FIELD: &str = "$schema";

const SCHEMA_KEYS: &[&str] = &[
    SCHEMA_FIELD,
    ID_FIELD,
    "title",
    "description",
    "type",
    "properties",
    "required",
    "additionalProperties",
];

/// Meta-schema versions this validator recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetaSchemaVersion {
    V1,
}

impl MetaSchemaVersion {
    pub fn from_uri(uri: &str) -> Option<Self> {
        match uri {
            META_SCHEMA_V1 => Some(MetaSchemaVersion::V1),
            _ => None,
        }
    }

    pub fn uri(self) -> &'static str {
        match self {
            MetaSchemaVersion::V1 => META_SCHEMA_V1,
        }
    }
}

/// Format constraint on a string property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StringFormat {
    Date,
    Time,
    Uri,
    Email,
}

impl StringFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            StringFormat::Date => "date",
            StringFormat::Time => "time",
            StringFormat::Uri => "uri",
            StringFormat::Email => "email",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "date" => Some(StringFormat::Date),
            "time" => Some(StringFormat::Time),
            "uri" => Some(StringFormat::Uri),
            "email" => Some(StringFormat::Email),
            _ => None,
        }
    }

    fn matches(self, s: &str) -> bool {
        match self {
            StringFormat::Date => is_date(s),
            StringFormat::Time => is_time(s),
            StringFormat::Uri => is_uri(s),
            StringFormat::Email => is_email(s),
        }
    }
}

/// The type of a single property.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyType {
    String {
        format: Option<StringFormat>,
        allowed: Option<Vec<String>>,
    },
    Integer,
    Number,
    Boolean,
    Array {
        items: Box<PropertyType>,
    },
    Object {
        properties: BTreeMap<String, PropertyType>,
        required: Vec<String>,
    },
    /// A value that must name an entry; `schema` is the schema that entry's
    /// registry is bound to.
    Reference {
        schema: Uri,
    },
}

impl PropertyType {
    /// Plain string.
    pub fn string() -> Self {
        PropertyType::String {
            format: None,
            allowed: None,
        }
    }

    /// String constrained by a format.
    pub fn formatted(format: StringFormat) -> Self {
        PropertyType::String {
            format: Some(format),
            allowed: None,
        }
    }

    pub fn array(items: PropertyType) -> Self {
        PropertyType::Array {
            items: Box::new(items),
        }
    }

    /// The `type` tag of this variant.
    pub fn tag(&self) -> &'static str {
        match self {
            PropertyType::String { .. } => "string",
            PropertyType::Integer => "integer",
            PropertyType::Number => "number",
            PropertyType::Boolean => "boolean",
            PropertyType::Array { .. } => "array",
            PropertyType::Object { .. } => "object",
            PropertyType::Reference { .. } => "reference",
        }
    }

    pub fn to_json(&self) -> Json {
        let mut out = Map::new();
        out.insert("type".into(), Json::from(self.tag()));
        match self {
            PropertyType::String { format, allowed } => {
                if let Some(format) = format {
                    out.insert("format".into(), Json::from(format.as_str()));
                }
                if let Some(allowed) = allowed {
                    out.insert("enum".into(), json!(allowed));
                }
            }
            PropertyType::Integer | PropertyType::Number | PropertyType::Boolean => {}
            PropertyType::Array { items } => {
                out.insert("items".into(), items.to_json());
            }
            PropertyType::Object {
                properties,
                required,
            } => {
                out.insert("properties".into(), properties_to_json(properties));
                if !required.is_empty() {
                    out.insert("required".into(), json!(required));
                }
            }
            PropertyType::Reference { schema } => {
                out.insert("$ref".into(), Json::from(schema.to_string()));
            }
        }
        Json::Object(out)
    }

    /// Parse a property definition, recording every problem found.
    pub(crate) fn parse(value: &Json, path: &str, issues: &mut Vec<Issue>) -> Option<Self> {
        let Some(obj) = value.as_object() else {
            push_issue(issues, failure_class::WRONG_TYPE, path, "property definition must be an object");
            return None;
        };
        let Some(tag) = obj.get("type").and_then(Json::as_str) else {
            push_issue(issues, failure_class::MISSING_FIELD, &join(path, "type"), "property type is required");
            return None;
        };

        let allowed: &[&str] = match tag {
            "string" => &["type", "description", "format", "enum"],
            "integer" | "number" | "boolean" => &["type", "description"],
            "array" => &["type", "description", "items"],
            "object" => &["type", "description", "properties", "required", "additionalProperties"],
            "reference" => &["type", "description", "$ref"],
            other => {
                push_issue(
                    issues,
                    failure_class::INVALID_VALUE,
                    &join(path, "type"),
                    format!("unknown property type {other:?}"),
                );
                return None;
            }
        };
        let before = issues.len();
        reject_unknown_keys(obj, allowed, path, issues);
        if let Some(description) = obj.get("description") {
            if !description.is_string() {
                push_issue(issues, failure_class::WRONG_TYPE, &join(path, "description"), "must be a string");
            }
        }

        let parsed = match tag {
            "string" => parse_string(obj, path, issues),
            "integer" => Some(PropertyType::Integer),
            "number" => Some(PropertyType::Number),
            "boolean" => Some(PropertyType::Boolean),
            "array" => match obj.get("items") {
                Some(items) => PropertyType::parse(items, &join(path, "items"), issues)
                    .map(PropertyType::array),
                None => {
                    push_issue(issues, failure_class::MISSING_FIELD, &join(path, "items"), "array items are required");
                    None
                }
            },
            "object" => parse_object_body(obj, path, issues)
                .map(|(properties, required)| PropertyType::Object { properties, required }),
            _ => match obj.get("$ref").and_then(Json::as_str) {
                Some(target) => match Uri::parse_kind(target, EntityKind::Schema) {
                    Ok(schema) => Some(PropertyType::Reference { schema }),
                    Err(e) => {
                        push_issue(issues, failure_class::INVALID_VALUE, &join(path, "$ref"), e.to_string());
                        None
                    }
                },
                None => {
                    push_issue(issues, failure_class::MISSING_FIELD, &join(path, "$ref"), "reference target is required");
                    None
                }
            },
        };

        if issues.len() > before {
            None
        } else {
            parsed
        }
    }

    /// Check a content value against this type.
    fn check_value(&self, value: &Json, path: &str, issues: &mut Vec<Issue>) {
        match self {
            PropertyType::String { format, allowed } => {
                let Some(s) = value.as_str() else {
                    push_issue(issues, failure_class::WRONG_TYPE, path, "expected a string");
                    return;
                };
                if let Some(format) = format {
                    if !format.matches(s) {
                        push_issue(
                            issues,
                            failure_class::INVALID_VALUE,
                            path,
                            format!("{s:?} is not a valid {}", format.as_str()),
                        );
                    }
                }
                if let Some(allowed) = allowed {
                    if !allowed.iter().any(|a| a == s) {
                        push_issue(issues, failure_class::INVALID_VALUE, path, format!("{s:?} is not an allowed value"));
                    }
                }
            }
            PropertyType::Integer => {
                if !(value.is_i64() || value.is_u64()) {
                    push_issue(issues, failure_class::WRONG_TYPE, path, "expected an integer");
                }
            }
            PropertyType::Number => {
                if !value.is_number() {
                    push_issue(issues, failure_class::WRONG_TYPE, path, "expected a number");
                }
            }
            PropertyType::Boolean => {
                if !value.is_boolean() {
                    push_issue(issues, failure_class::WRONG_TYPE, path, "expected a boolean");
                }
            }
            PropertyType::Array { items } => {
                let Some(values) = value.as_array() else {
                    push_issue(issues, failure_class::WRONG_TYPE, path, "expected an array");
                    return;
                };
                for (i, item) in values.iter().enumerate() {
                    items.check_value(item, &format!("{path}[{i}]"), issues);
                }
            }
            PropertyType::Object {
                properties,
                required,
            } => match value.as_object() {
                Some(obj) => check_object(properties, required, obj, path, issues),
                None => push_issue(issues, failure_class::WRONG_TYPE, path, "expected an object"),
            },
            PropertyType::Reference { .. } => match value
                .as_str()
                .map(|s| Uri::parse_kind(s, EntityKind::Entry))
            {
                Some(Ok(_)) => {}
                Some(Err(e)) => push_issue(issues, failure_class::INVALID_VALUE, path, e.to_string()),
                None => push_issue(issues, failure_class::WRONG_TYPE, path, "expected a uri string"),
            },
        }
    }
}

/// A parsed, structurally valid schema.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaDefinition {
    pub meta: MetaSchemaVersion,
    pub title: String,
    pub description: Option<String>,
    pub properties: BTreeMap<String, PropertyType>,
    pub required: Vec<String>,
}

impl SchemaDefinition {
    /// Parse a schema document.
    ///
    /// An unrecognized `$schema` is reported as [`ValidationError::UnknownMetaSchema`];
    /// every other problem as [`ValidationError::Structural`].
    pub fn from_document(document: &Json) -> Result<Self, ValidationError> {
        let mut issues = Vec::new();
        let definition = parse_schema(document, &mut issues);
        ValidationReport::from_issues(issues).into_result()?;
        definition.ok_or_else(|| ValidationError::Structural(ValidationReport::default()))
    }

    /// Render as a schema document without `$id`.
    pub fn to_document(&self) -> Json {
        let mut out = Map::new();
        out.insert(SCHEMA_FIELD.into(), Json::from(self.meta.uri()));
        out.insert("title".into(), Json::from(self.title.clone()));
        if let Some(description) = &self.description {
            out.insert("description".into(), Json::from(description.clone()));
        }
        out.insert("type".into(), Json::from("object"));
        out.insert("properties".into(), properties_to_json(&self.properties));
        if !self.required.is_empty() {
            out.insert("required".into(), json!(self.required));
        }
        out.insert("additionalProperties".into(), Json::Bool(false));
        Json::Object(out)
    }

    /// Check an entry's content against this schema.
    pub fn verify_content(&self, content: &Json) -> ValidationReport {
        let mut issues = Vec::new();
        match content.as_object() {
            Some(obj) => check_object(&self.properties, &self.required, obj, "", &mut issues),
            None => push_issue(&mut issues, failure_class::WRONG_TYPE, "$", "content must be an object"),
        }
        ValidationReport::from_issues(issues)
    }
}

/// Incremental builder for [`SchemaDefinition`].
#[derive(Debug, Clone)]
pub struct SchemaBuilder {
    title: String,
    description: Option<String>,
    properties: BTreeMap<String, PropertyType>,
    required: Vec<String>,
}

impl SchemaBuilder {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            properties: BTreeMap::new(),
            required: Vec::new(),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn property(mut self, name: impl Into<String>, ty: PropertyType) -> Self {
        self.properties.insert(name.into(), ty);
        self
    }

    pub fn required<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required.extend(names.into_iter().map(Into::into));
        self
    }

    /// Finish the schema, round-tripping it through the meta-schema check.
    pub fn build(self) -> Result<SchemaDefinition, ValidationError> {
        let definition = SchemaDefinition {
            meta: MetaSchemaVersion::V1,
            title: self.title,
            description: self.description,
            properties: self.properties,
            required: self.required,
        };
        SchemaDefinition::from_document(&definition.to_document())
    }
}

/// Parse a whole schema document. Returns `None` if any issue was recorded.
pub(crate) fn parse_schema(document: &Json, issues: &mut Vec<Issue>) -> Option<SchemaDefinition> {
    let Some(obj) = document.as_object() else {
        push_issue(issues, failure_class::WRONG_TYPE, "$", "schema must be an object");
        return None;
    };
    let before = issues.len();

    let meta = match obj.get(SCHEMA_FIELD) {
        Some(Json::String(uri)) => {
            let meta = MetaSchemaVersion::from_uri(uri);
            if meta.is_none() {
                push_issue(issues, failure_class::UNKNOWN_META_SCHEMA, SCHEMA_FIELD, uri.clone());
            }
            meta
        }
        Some(_) => {
            push_issue(issues, failure_class::WRONG_TYPE, SCHEMA_FIELD, "must be a string");
            None
        }
        None => {
            push_issue(issues, failure_class::MISSING_FIELD, SCHEMA_FIELD, "meta-schema declaration is required");
            None
        }
    };

    reject_unknown_keys(obj, SCHEMA_KEYS, "", issues);

    if let Some(id) = obj.get(ID_FIELD) {
        if !id.is_string() {
            push_issue(issues, failure_class::WRONG_TYPE, ID_FIELD, "must be a string");
        }
    }

    let title = match obj.get("title") {
        Some(Json::String(t)) if !t.trim().is_empty() => Some(t.clone()),
        Some(Json::String(_)) => {
            push_issue(issues, failure_class::INVALID_VALUE, "title", "must not be empty");
            None
        }
        Some(_) => {
            push_issue(issues, failure_class::WRONG_TYPE, "title", "must be a string");
            None
        }
        None => {
            push_issue(issues, failure_class::MISSING_FIELD, "title", "title is required");
            None
        }
    };

    let description = match obj.get("description") {
        None => None,
        Some(Json::String(d)) => Some(d.clone()),
        Some(_) => {
            push_issue(issues, failure_class::WRONG_TYPE, "description", "must be a string");
            None
        }
    };

    match obj.get("type") {
        Some(Json::String(t)) if t == "object" => {}
        Some(_) => push_issue(issues, failure_class::INVALID_VALUE, "type", "schema type must be \"object\""),
        None => push_issue(issues, failure_class::MISSING_FIELD, "type", "type is required"),
    }

    if !obj.contains_key("properties") {
        push_issue(issues, failure_class::MISSING_FIELD, "properties", "properties are required");
    }
    let body = parse_object_body(obj, "", issues);

    if issues.len() > before {
        return None;
    }
    let (properties, required) = body?;
    Some(SchemaDefinition {
        meta: meta?,
        title: title?,
        description,
        properties,
        required,
    })
}

fn parse_string(obj: &Map<String, Json>, path: &str, issues: &mut Vec<Issue>) -> Option<PropertyType> {
    let format = match obj.get("format") {
        None => None,
        Some(Json::String(f)) => match StringFormat::parse(f) {
            Some(format) => Some(format),
            None => {
                push_issue(issues, failure_class::INVALID_VALUE, &join(path, "format"), format!("unknown format {f:?}"));
                return None;
            }
        },
        Some(_) => {
            push_issue(issues, failure_class::WRONG_TYPE, &join(path, "format"), "must be a string");
            return None;
        }
    };

    let allowed = match obj.get("enum") {
        None => None,
        Some(Json::Array(values)) if !values.is_empty() => {
            let strings: Option<Vec<String>> =
                values.iter().map(|v| v.as_str().map(str::to_string)).collect();
            match strings {
                Some(strings) => Some(strings),
                None => {
                    push_issue(issues, failure_class::WRONG_TYPE, &join(path, "enum"), "enum values must be strings");
                    return None;
                }
            }
        }
        Some(_) => {
            push_issue(issues, failure_class::INVALID_VALUE, &join(path, "enum"), "must be a non-empty array");
            return None;
        }
    };

    Some(PropertyType::String { format, allowed })
}

/// Parse `properties`, `required` and `additionalProperties` of an object shape.
fn parse_object_body(
    obj: &Map<String, Json>,
    path: &str,
    issues: &mut Vec<Issue>,
) -> Option<(BTreeMap<String, PropertyType>, Vec<String>)> {
    let before = issues.len();
    let mut properties = BTreeMap::new();

    match obj.get("properties") {
        None => {}
        Some(Json::Object(defs)) => {
            let base = join(path, "properties");
            for (name, def) in defs {
                if let Some(ty) = PropertyType::parse(def, &join(&base, name), issues) {
                    properties.insert(name.clone(), ty);
                }
            }
        }
        Some(_) => push_issue(issues, failure_class::WRONG_TYPE, &join(path, "properties"), "must be an object"),
    }

    let mut required = Vec::new();
    match obj.get("required") {
        None => {}
        Some(Json::Array(names)) => {
            for (i, name) in names.iter().enumerate() {
                let at = format!("{}[{i}]", join(path, "required"));
                match name.as_str() {
                    Some(n) if obj
                        .get("properties")
                        .and_then(Json::as_object)
                        .map_or(false, |defs| defs.contains_key(n)) =>
                    {
                        if required.iter().any(|r| r == n) {
                            push_issue(issues, failure_class::INVALID_VALUE, &at, format!("{n:?} listed twice"));
                        } else {
                            required.push(n.to_string());
                        }
                    }
                    Some(n) => push_issue(
                        issues,
                        failure_class::UNDECLARED_REQUIRED,
                        &at,
                        format!("{n:?} is not a declared property"),
                    ),
                    None => push_issue(issues, failure_class::WRONG_TYPE, &at, "must be a string"),
                }
            }
        }
        Some(_) => push_issue(issues, failure_class::WRONG_TYPE, &join(path, "required"), "must be an array"),
    }

    match obj.get("additionalProperties") {
        None | Some(Json::Bool(false)) => {}
        Some(_) => push_issue(
            issues,
            failure_class::INVALID_VALUE,
            &join(path, "additionalProperties"),
            "records are closed-world; additionalProperties must be false",
        ),
    }

    if issues.len() > before {
        None
    } else {
        Some((properties, required))
    }
}

fn check_object(
    properties: &BTreeMap<String, PropertyType>,
    required: &[String],
    obj: &Map<String, Json>,
    path: &str,
    issues: &mut Vec<Issue>,
) {
    for name in required {
        if !obj.contains_key(name) {
            push_issue(issues, failure_class::MISSING_FIELD, &join(path, name), "required property is missing");
        }
    }
    for (name, value) in obj {
        match properties.get(name) {
            Some(ty) => ty.check_value(value, &join(path, name), issues),
            None => push_issue(issues, failure_class::UNEXPECTED_FIELD, &join(path, name), "property is not declared"),
        }
    }
}

fn reject_unknown_keys(obj: &Map<String, Json>, allowed: &[&str], path: &str, issues: &mut Vec<Issue>) {
    for key in obj.keys() {
        if !allowed.contains(&key.as_str()) {
            push_issue(issues, failure_class::UNEXPECTED_FIELD, &join(path, key), "field is not allowed here");
        }
    }
}

fn properties_to_json(properties: &BTreeMap<String, PropertyType>) -> Json {
    Json::Object(
        properties
            .iter()
            .map(|(name, ty)| (name.clone(), ty.to_json()))
            .collect(),
    )
}

pub(crate) fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

// YYYY-MM-DD, a real calendar date. chrono accepts unpadded fields, so the
// width is pinned first.
fn is_date(s: &str) -> bool {
    s.len() == 10 && NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
}

// HH:MM:SS
fn is_time(s: &str) -> bool {
    s.len() == 8 && NaiveTime::parse_from_str(s, "%H:%M:%S").is_ok()
}

// Absolute URI with a scheme. Anchor URIs parse as opaque paths.
fn is_uri(s: &str) -> bool {
    Url::parse(s).is_ok()
}

fn is_email(s: &str) -> bool {
    let Some((local, domain)) = s.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !s.chars().any(char::is_whitespace)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person() -> SchemaDefinition {
        SchemaBuilder::new("Person")
            .property("name", PropertyType::string())
            .property("age", PropertyType::Integer)
            .required(["name", "age"])
            .build()
            .unwrap()
    }

    #[test]
    fn test_builder_document_shape() {
        let doc = person().to_document();
        assert_eq!(doc["$schema"], META_SCHEMA_V1);
        assert_eq!(doc["type"], "object");
        assert_eq!(doc["additionalProperties"], false);
        assert_eq!(doc["properties"]["age"]["type"], "integer");
        assert_eq!(doc["required"], json!(["name", "age"]));
    }

    #[test]
    fn test_document_roundtrip() {
        let schema = person();
        let parsed = SchemaDefinition::from_document(&schema.to_document()).unwrap();
        assert_eq!(parsed, schema);
    }

    #[test]
    fn test_unknown_meta_schema() {
        let mut doc = person().to_document();
        doc["$schema"] = json!("https://example.com/draft-99/schema#");
        assert!(matches!(
            SchemaDefinition::from_document(&doc),
            Err(ValidationError::UnknownMetaSchema(_))
        ));
    }

    #[test]
    fn test_required_must_be_declared() {
        let result = SchemaBuilder::new("Broken")
            .property("name", PropertyType::string())
            .required(["name", "email"])
            .build();
        match result {
            Err(ValidationError::Structural(report)) => {
                assert!(report.has_class(failure_class::UNDECLARED_REQUIRED));
            }
            other => panic!("expected structural error, got {other:?}"),
        }
    }

    #[test]
    fn test_closed_world_rejects_extra_keys() {
        let mut doc = person().to_document();
        doc["version"] = json!(2);
        assert!(matches!(
            SchemaDefinition::from_document(&doc),
            Err(ValidationError::Structural(_))
        ));

        let mut doc = person().to_document();
        doc["additionalProperties"] = json!(true);
        assert!(SchemaDefinition::from_document(&doc).is_err());
    }

    #[test]
    fn test_nested_property_types() {
        let schema = SchemaBuilder::new("Order")
            .property("placed", PropertyType::formatted(StringFormat::Date))
            .property("lines", PropertyType::array(PropertyType::Object {
                properties: BTreeMap::from([
                    ("sku".to_string(), PropertyType::string()),
                    ("qty".to_string(), PropertyType::Integer),
                ]),
                required: vec!["sku".into()],
            }))
            .property("status", PropertyType::String {
                format: None,
                allowed: Some(vec!["open".into(), "closed".into()]),
            })
            .build()
            .unwrap();

        let ok = json!({
            "placed": "2024-03-01",
            "lines": [{"sku": "a-1", "qty": 2}, {"sku": "b-2"}],
            "status": "open"
        });
        assert!(schema.verify_content(&ok).is_valid());

        let bad = json!({
            "placed": "2024-13-01",
            "lines": [{"qty": 2}],
            "status": "pending",
            "note": "x"
        });
        let report = schema.verify_content(&bad);
        assert!(!report.is_valid());
        let paths: Vec<&str> = report.issues.iter().map(|i| i.path.as_str()).collect();
        assert!(paths.contains(&"placed"));
        assert!(paths.contains(&"lines[0].sku"));
        assert!(paths.contains(&"status"));
        assert!(paths.contains(&"note"));
    }

    #[test]
    fn test_unknown_property_type() {
        let mut doc = person().to_document();
        doc["properties"]["age"] = json!({"type": "decimal"});
        assert!(SchemaDefinition::from_document(&doc).is_err());
    }

    #[test]
    fn test_verify_content_types() {
        let schema = person();
        assert!(schema.verify_content(&json!({"name": "Ada", "age": 36})).is_valid());
        assert!(!schema.verify_content(&json!({"name": "Ada", "age": 36.5})).is_valid());
        assert!(!schema.verify_content(&json!({"name": "Ada"})).is_valid());
        assert!(!schema.verify_content(&json!(["Ada", 36])).is_valid());
    }

    #[test]
    fn test_impossible_date_is_rejected() {
        let schema = SchemaBuilder::new("Event")
            .property("d", PropertyType::formatted(StringFormat::Date))
            .required(["d"])
            .build()
            .unwrap();
        assert!(schema.verify_content(&json!({"d": "2024-02-29"})).is_valid());
        assert!(schema.verify_content(&json!({"d": "2023-02-30"})).into_result().is_err());

        let report = schema.verify_content(&json!({"d": "2023-02-29"}));
        assert!(report.has_class(failure_class::INVALID_VALUE));
    }

    #[test]
    fn test_reference_kinds() {
        let scope = crate::uri::NetworkScope::default();
        let target = Uri::from_id(EntityKind::Schema, scope.clone(), [1; 32]);
        let schema = SchemaBuilder::new("Link")
            .property("to", PropertyType::Reference { schema: target.clone() })
            .required(["to"])
            .build()
            .unwrap();

        let entry = Uri::from_id(EntityKind::Entry, scope.clone(), [2; 32]);
        assert!(schema.verify_content(&json!({"to": entry.to_string()})).is_valid());

        let registry = Uri::from_id(EntityKind::Registry, scope.clone(), [2; 32]);
        assert!(!schema.verify_content(&json!({"to": registry.to_string()})).is_valid());
        assert!(!schema.verify_content(&json!({"to": 7})).is_valid());

        // `$ref` must name a schema
        let mut doc = schema.to_document();
        doc["properties"]["to"]["$ref"] = json!(registry.to_string());
        assert!(SchemaDefinition::from_document(&doc).is_err());
        doc["properties"]["to"]["$ref"] = json!(target.to_string());
        assert!(SchemaDefinition::from_document(&doc).is_ok());
    }

    #[test]
    fn test_string_formats() {
        assert!(is_date("2024-02-29"));
        assert!(!is_date("2023-02-29"));
        assert!(!is_date("2023-02-30"));
        assert!(!is_date("2023-04-31"));
        assert!(!is_date("2024-2-29"));
        assert!(!is_date("2024-02-29T00:00:00"));
        assert!(is_time("23:59:59"));
        assert!(!is_time("24:00:00"));
        assert!(!is_time("12:60:00"));
        assert!(!is_time("7:05:00"));
        assert!(is_uri("https://example.com/a"));
        assert!(is_uri("entry:anchor:abc"));
        assert!(!is_uri("no scheme"));
        assert!(!is_uri("https://exa mple.com"));
        assert!(!is_uri(""));
        assert!(is_email("a@b.io"));
        assert!(!is_email("a@b"));
        assert!(!is_email("@b.io"));
    }
}
