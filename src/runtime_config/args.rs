//! Parsing of `config set` and `config unset` arguments

use super::{is_reserved, tree};
use crate::error::{FnshipError, Result};
use serde_json::Value;

/// A dotted config key split into namespace and in-namespace path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigKey {
    /// First dotted segment
    pub namespace: String,
    /// Remaining segments joined with `/`; empty for a bare namespace
    pub path: String,
}

impl ConfigKey {
    /// Split `ns.a.b` into namespace `ns` and path `a/b`
    pub fn parse(dotted: &str) -> Result<Self> {
        let mut segments = dotted.split('.');
        let namespace = segments.next().unwrap_or_default();
        if namespace.is_empty() {
            return Err(FnshipError::InvalidArgument(format!(
                "'{}' does not name a config namespace",
                dotted
            ))
            .into());
        }
        let path = segments.collect::<Vec<_>>().join("/");
        Ok(Self {
            namespace: namespace.to_string(),
            path,
        })
    }

    /// True when the key names a whole namespace
    pub fn is_namespace(&self) -> bool {
        self.path.is_empty()
    }

    /// Path segments inside the namespace
    pub fn segments(&self) -> Vec<&str> {
        if self.path.is_empty() {
            Vec::new()
        } else {
            self.path.split('/').collect()
        }
    }

    fn ensure_writable(&self) -> Result<()> {
        if is_reserved(&self.namespace) {
            return Err(FnshipError::FilterConflict(format!(
                "Cannot set to reserved config namespace {}",
                self.namespace
            ))
            .into());
        }
        Ok(())
    }
}

/// One parsed `key=value` token
#[derive(Debug, Clone, PartialEq)]
pub struct SetArg {
    /// Target namespace
    pub namespace: String,
    /// Slash-joined path inside the namespace
    pub path: String,
    /// Value to write, possibly a subtree
    pub value: Value,
}

/// Parse `key=value` tokens
///
/// The key is split on dots: the first segment is the namespace, the rest
/// form the path. A value wrapped in one matching pair of quotes is kept as
/// the literal interior. Otherwise JSON objects and arrays become structure
/// and everything else stays the raw string, so `123` and `null` are
/// written as strings.
///
/// # Examples
///
/// ```
/// use fnship::runtime_config::args::parse_set_args;
/// use serde_json::json;
///
/// let args = parse_set_args(&["app.db.host=localhost".to_string()]).unwrap();
/// assert_eq!(args[0].namespace, "app");
/// assert_eq!(args[0].path, "db/host");
/// assert_eq!(args[0].value, json!("localhost"));
/// ```
pub fn parse_set_args(tokens: &[String]) -> Result<Vec<SetArg>> {
    tokens.iter().map(|token| parse_set_arg(token)).collect()
}

fn parse_set_arg(token: &str) -> Result<SetArg> {
    let Some((key, raw)) = token.split_once('=') else {
        return Err(FnshipError::InvalidArgument(format!(
            "Invalid argument {}, must be in key=val format",
            token
        ))
        .into());
    };

    if key.chars().any(char::is_uppercase) {
        return Err(FnshipError::InvalidArgument(format!(
            "Invalid config name {}, cannot use upper case.",
            key
        ))
        .into());
    }

    let key = ConfigKey::parse(key)?;
    key.ensure_writable()?;

    let value = parse_value(raw);
    if key.is_namespace() && !value.is_object() {
        return Err(FnshipError::InvalidArgument(format!(
            "Cannot set a value directly on config namespace {}",
            key.namespace
        ))
        .into());
    }
    if tree::flatten(&key.path, &value).is_empty() {
        return Err(FnshipError::InvalidArgument(format!(
            "Invalid argument {}, value has nothing to set",
            token
        ))
        .into());
    }

    Ok(SetArg {
        namespace: key.namespace,
        path: key.path,
        value,
    })
}

fn parse_value(raw: &str) -> Value {
    if let Some(inner) = strip_matching_quotes(raw) {
        return Value::String(inner.to_string());
    }
    match serde_json::from_str::<Value>(raw) {
        Ok(value @ (Value::Object(_) | Value::Array(_))) => value,
        _ => Value::String(raw.to_string()),
    }
}

fn strip_matching_quotes(raw: &str) -> Option<&str> {
    let first = raw.chars().next()?;
    if raw.len() < 2 || !(first == '"' || first == '\'') || !raw.ends_with(first) {
        return None;
    }
    Some(&raw[1..raw.len() - 1])
}

/// Parse the dotted keys given to `config unset`
pub fn parse_unset_args(keys: &[String]) -> Result<Vec<ConfigKey>> {
    keys.iter()
        .map(|key| {
            let key = ConfigKey::parse(key)?;
            key.ensure_writable()?;
            Ok(key)
        })
        .collect()
}
