use crate::{
    error::{ConvertError, Result},
    model::MakeDocument,
};
use jsonschema::Draft;
use serde_json::Value;
use std::{fs, path::Path};

const EMBEDDED_SCHEMA: &str = include_str!("../schemas/make.export.schema.json");

/// Load a Make.com export from a JSON string.
pub fn load_make_from_str(json: &str) -> Result<MakeDocument> {
    let value: Value = serde_json::from_str(json)
        .map_err(|e| ConvertError::InvalidSource(format!("not valid JSON: {e}")))?;
    document_from_value(value)
}

/// Load a Make.com export from a file path.
pub fn load_make_from_path(path: &Path) -> Result<MakeDocument> {
    let content = fs::read_to_string(path).map_err(|e| {
        ConvertError::InvalidSource(format!("failed to read {}: {e}", path.display()))
    })?;
    load_make_from_str(&content)
}

/// Accept an already-parsed JSON value as a Make.com export.
///
/// Rejects anything that is not an object at the top level, then validates
/// the loose export schema before deserializing.
pub fn document_from_value(value: Value) -> Result<MakeDocument> {
    if !value.is_object() {
        return Err(ConvertError::InvalidSource(
            "expected a JSON object at the top level".to_string(),
        ));
    }
    validate_schema(&value)?;
    serde_json::from_value(value).map_err(|e| ConvertError::InvalidSource(e.to_string()))
}

fn validate_schema(doc: &Value) -> Result<()> {
    let schema: Value = serde_json::from_str(EMBEDDED_SCHEMA)
        .map_err(|e| ConvertError::Internal(format!("embedded schema parse: {e}")))?;
    let validator = jsonschema::options()
        .with_draft(Draft::Draft202012)
        .build(&schema)
        .map_err(|e| ConvertError::Internal(format!("embedded schema compile: {e}")))?;
    let messages: Vec<String> = validator
        .iter_errors(doc)
        .map(|e| {
            let pointer = e.instance_path().to_string();
            let pointer = if pointer.is_empty() {
                "/".to_string()
            } else {
                pointer
            };
            format!("{pointer}: {e}")
        })
        .collect();
    if messages.is_empty() {
        Ok(())
    } else {
        Err(ConvertError::InvalidSource(messages.join("\n")))
    }
}
