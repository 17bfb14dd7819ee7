//! Declaration manifest loading
//!
//! The source-discovery step hands over the exported declaration tree as a
//! YAML (or JSON) document:
//!
//! ```yaml
//! httpsAction:
//!   trigger:
//!     kind: http
//! nested:
//!   dbAction:
//!     trigger:
//!       kind: event
//!       eventType: providers/database/ref.write
//!       regions: [us-east1]
//! ```
//!
//! A mapping whose only key is `trigger` (holding a mapping with `kind`) is a
//! function; any other mapping is a group. Scalar values are skipped.

use super::{DeclarationNode, TriggerDescriptor};
use crate::error::{FnshipError, Result};
use indexmap::IndexMap;
use serde_yaml::{Mapping, Value};
use std::path::Path;

const TRIGGER_KEY: &str = "trigger";

/// Read and parse a declaration manifest from disk
pub fn load_manifest(path: &Path) -> Result<DeclarationNode> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        FnshipError::Manifest(format!("Failed to read {}: {}", path.display(), e))
    })?;
    tracing::debug!("Loaded declaration manifest from {}", path.display());
    parse_manifest(&contents)
}

/// Parse a declaration manifest
///
/// # Errors
///
/// Returns [`FnshipError::Manifest`] if the document is not a mapping, a key
/// is not a string, or a trigger descriptor is malformed.
pub fn parse_manifest(contents: &str) -> Result<DeclarationNode> {
    if contents.trim().is_empty() {
        return Ok(DeclarationNode::empty());
    }
    let value: Value = serde_yaml::from_str(contents)?;
    match value {
        Value::Mapping(mapping) => to_group(mapping, ""),
        Value::Null => Ok(DeclarationNode::empty()),
        _ => Err(FnshipError::Manifest(
            "manifest root must be a mapping of declarations".to_string(),
        )
        .into()),
    }
}

fn to_group(mapping: Mapping, path: &str) -> Result<DeclarationNode> {
    let mut children = IndexMap::new();
    for (key, value) in mapping {
        let key = match key {
            Value::String(key) => key,
            other => {
                return Err(FnshipError::Manifest(format!(
                    "declaration keys must be strings, found {:?} under '{}'",
                    other, path
                ))
                .into())
            }
        };
        let child_path = if path.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", path, key)
        };

        match value {
            Value::Mapping(inner) if is_function(&inner) => {
                children.insert(key, to_function(inner, &child_path)?);
            }
            Value::Mapping(inner) => {
                children.insert(key, to_group(inner, &child_path)?);
            }
            _ => tracing::debug!("Skipping non-declaration export '{}'", child_path),
        }
    }
    Ok(DeclarationNode::Group(children))
}

fn is_function(mapping: &Mapping) -> bool {
    if mapping.len() != 1 {
        return false;
    }
    matches!(
        mapping.get(TRIGGER_KEY),
        Some(Value::Mapping(descriptor)) if descriptor.contains_key("kind")
    )
}

fn to_function(mut mapping: Mapping, path: &str) -> Result<DeclarationNode> {
    let descriptor = mapping.remove(TRIGGER_KEY).unwrap_or(Value::Null);
    let descriptor: TriggerDescriptor = serde_yaml::from_value(descriptor).map_err(|e| {
        FnshipError::Manifest(format!("invalid trigger for '{}': {}", path, e))
    })?;
    Ok(DeclarationNode::Function(descriptor))
}
