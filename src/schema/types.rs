//! BigQuery schema representation.
//!
//! Mirrors the JSON accepted by `bq mk --schema`: a `{"fields": [...]}` object
//! or a bare array of fields.

use std::fs::File;
use std::io::{BufReader, Write};
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// BigQuery field mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum BqMode {
    #[default]
    Nullable,
    Required,
    Repeated,
}

impl BqMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            BqMode::Nullable => "NULLABLE",
            BqMode::Required => "REQUIRED",
            BqMode::Repeated => "REPEATED",
        }
    }
}

/// A single field of a BigQuery schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BqSchemaField {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default)]
    pub mode: BqMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<BqSchemaField>>,
}

impl BqSchemaField {
    pub fn new(name: impl Into<String>, field_type: impl Into<String>, mode: BqMode) -> Self {
        Self {
            name: name.into(),
            field_type: field_type.into(),
            mode,
            description: None,
            fields: None,
        }
    }

    /// Create a RECORD field with nested fields.
    pub fn record(name: impl Into<String>, mode: BqMode, fields: Vec<BqSchemaField>) -> Self {
        Self {
            name: name.into(),
            field_type: "RECORD".to_string(),
            mode,
            description: None,
            fields: Some(fields),
        }
    }
}

#[derive(Serialize)]
struct SchemaDocument<'a> {
    fields: &'a [BqSchemaField],
}

/// Parse a schema from JSON text.
pub fn parse_schema(json: &serde_json::Value) -> Result<Vec<BqSchemaField>> {
    let fields = match json {
        serde_json::Value::Array(_) => json,
        serde_json::Value::Object(obj) => obj.get("fields").ok_or_else(|| {
            Error::SchemaFile("Expected 'fields' array in schema object".to_string())
        })?,
        _ => {
            return Err(Error::SchemaFile(
                "Schema must be an array or object with 'fields'".to_string(),
            ))
        }
    };

    let fields: Vec<BqSchemaField> = serde_json::from_value(fields.clone())
        .map_err(|e| Error::SchemaFile(e.to_string()))?;
    for field in &fields {
        check_record(field)?;
    }
    Ok(fields)
}

fn check_record(field: &BqSchemaField) -> Result<()> {
    match (&field.fields, field.field_type.to_uppercase().as_str()) {
        (None, "RECORD" | "STRUCT") => Err(Error::SchemaFile(format!(
            "RECORD field '{}' must have 'fields'",
            field.name
        ))),
        (Some(nested), _) => nested.iter().try_for_each(check_record),
        _ => Ok(()),
    }
}

/// Read a schema file holding `{"fields": [...]}` or a bare array.
pub fn read_schema_file(path: &Path) -> Result<Vec<BqSchemaField>> {
    let file = File::open(path).map_err(|e| {
        Error::SchemaFile(format!("Cannot open schema file '{}': {}", path.display(), e))
    })?;
    let json: serde_json::Value = serde_json::from_reader(BufReader::new(file)).map_err(|e| {
        Error::SchemaFile(format!("Cannot parse schema file '{}': {}", path.display(), e))
    })?;
    parse_schema(&json)
}

/// Write `{"fields": [...]}` with four-space indentation.
pub fn write_schema_json<W: Write>(fields: &[BqSchemaField], writer: &mut W) -> Result<()> {
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut *writer, formatter);
    SchemaDocument { fields }.serialize(&mut serializer)?;
    writeln!(writer)?;
    Ok(())
}

/// Summarise a schema's column types as percent/type pairs, e.g.
/// `50_STRING_50_NUMERIC`.
///
/// Types appear in the order they are first seen; percents are rounded to
/// whole numbers.
pub fn summarize_column_types(fields: &[BqSchemaField]) -> String {
    if fields.is_empty() {
        return String::new();
    }

    let mut counts: IndexMap<&str, usize> = IndexMap::new();
    for field in fields {
        *counts.entry(field.field_type.as_str()).or_insert(0) += 1;
    }

    let total = fields.len() as f64;
    counts
        .iter()
        .map(|(field_type, count)| {
            format!("{:.0}_{}", *count as f64 / total * 100.0, field_type)
        })
        .collect::<Vec<_>>()
        .join("_")
}

/// A column type mix split into percent/type pairs.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnMix {
    pub parts: Vec<(f64, String)>,
}

impl ColumnMix {
    /// Parse a spec such as `10_STRING_90_NUMERIC`.
    pub fn parse(spec: &str) -> Result<Self> {
        let tokens: Vec<&str> = spec.split('_').collect();
        if tokens.len() % 2 != 0 {
            return Err(Error::SchemaFile(format!(
                "Invalid column type: {}. Expected percent/type pairs.",
                spec
            )));
        }

        let parts = tokens
            .chunks(2)
            .map(|pair| {
                let percent: f64 = pair[0].parse().map_err(|_| {
                    Error::SchemaFile(format!(
                        "Invalid column type: {}. '{}' is not a percent.",
                        spec, pair[0]
                    ))
                })?;
                Ok((percent, pair[1].to_string()))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { parts })
    }

    pub fn total_percent(&self) -> f64 {
        self.parts.iter().map(|(percent, _)| percent).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_parse_schema_object_and_array() {
        let object = json!({"fields": [{"name": "a", "type": "STRING", "mode": "REQUIRED"}]});
        let array = json!([{"name": "a", "type": "STRING", "mode": "REQUIRED"}]);
        assert_eq!(parse_schema(&object).unwrap(), parse_schema(&array).unwrap());
    }

    #[test]
    fn test_parse_schema_defaults_mode_and_keeps_description() {
        let schema = json!([{"name": "a", "type": "INTEGER", "description": "count"}]);
        let fields = parse_schema(&schema).unwrap();
        assert_eq!(fields[0].mode, BqMode::Nullable);
        assert_eq!(fields[0].description.as_deref(), Some("count"));
    }

    #[test]
    fn test_parse_schema_nested_record() {
        let schema = json!({"fields": [{
            "name": "job", "type": "RECORD", "mode": "NULLABLE",
            "fields": [{"name": "id", "type": "STRING", "mode": "NULLABLE"}]
        }]});
        let fields = parse_schema(&schema).unwrap();
        let nested = fields[0].fields.as_ref().unwrap();
        assert_eq!(nested[0].name, "id");
    }

    #[test]
    fn test_parse_schema_record_without_fields() {
        let schema = json!([{"name": "job", "type": "RECORD"}]);
        assert!(parse_schema(&schema).is_err());
        assert!(parse_schema(&json!("fields")).is_err());
        assert!(parse_schema(&json!({"columns": []})).is_err());
    }

    #[test]
    fn test_write_schema_json_uses_four_spaces() {
        let fields = vec![BqSchemaField::new("string1", "STRING", BqMode::Required)];
        let mut out = Vec::new();
        write_schema_json(&fields, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("{\n    \"fields\": [\n        {\n"));
        assert!(text.contains("\"name\": \"string1\""));
        assert!(!text.contains("description"));
    }

    #[test]
    fn test_summarize_column_types() {
        let mut fields = Vec::new();
        for i in 1..=5 {
            fields.push(BqSchemaField::new(format!("string{}", i), "STRING", BqMode::Required));
        }
        for i in 1..=5 {
            fields.push(BqSchemaField::new(format!("numeric{}", i), "NUMERIC", BqMode::Required));
        }
        assert_eq!(summarize_column_types(&fields), "50_STRING_50_NUMERIC");
        assert_eq!(summarize_column_types(&fields[..5]), "100_STRING");
        assert_eq!(summarize_column_types(&[]), "");
    }

    #[test]
    fn test_column_mix() {
        let mix = ColumnMix::parse("10_STRING_90_NUMERIC").unwrap();
        assert_eq!(
            mix.parts,
            vec![(10.0, "STRING".to_string()), (90.0, "NUMERIC".to_string())]
        );
        assert_eq!(mix.total_percent(), 100.0);
        assert!(ColumnMix::parse("10_STRING_90").is_err());
        assert!(ColumnMix::parse("ten_STRING").is_err());
    }
}
