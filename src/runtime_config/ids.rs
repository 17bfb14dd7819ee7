//! Runtime config resource names
//!
//! Configs are addressed as `projects/<project>/configs/<config>` and their
//! variables as `projects/<project>/configs/<config>/variables/<a/b/c>`.

use crate::error::{FnshipError, Result};

/// Identifiers decoded from a variable resource name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableIds {
    /// Project id
    pub project: String,
    /// Config (namespace) id
    pub config: String,
    /// Slash-joined variable path inside the config
    pub variable: String,
}

/// `projects/<project>/configs/<config>`
pub fn config_name(project: &str, config: &str) -> String {
    format!("projects/{}/configs/{}", project, config)
}

/// `projects/<project>/configs/<config>/variables/<path>`
pub fn variable_name(project: &str, config: &str, path: &str) -> String {
    format!("projects/{}/configs/{}/variables/{}", project, config, path)
}

/// Decode `projects/<p>/configs/<c>` into `(project, config)`
pub fn config_name_to_ids(name: &str) -> Result<(String, String)> {
    let parts: Vec<&str> = name.split('/').collect();
    match parts.as_slice() {
        ["projects", project, "configs", config] if !project.is_empty() && !config.is_empty() => {
            Ok((project.to_string(), config.to_string()))
        }
        _ => Err(FnshipError::InvalidArgument(format!(
            "'{}' is not a runtime config resource name",
            name
        ))
        .into()),
    }
}

/// Decode a variable resource name
///
/// # Examples
///
/// ```
/// use fnship::runtime_config::ids::variable_name_to_ids;
///
/// let ids = variable_name_to_ids("projects/p/configs/app/variables/db/host").unwrap();
/// assert_eq!(ids.config, "app");
/// assert_eq!(ids.variable, "db/host");
/// ```
pub fn variable_name_to_ids(name: &str) -> Result<VariableIds> {
    let mut parts = name.splitn(6, '/');
    let ids = match (
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
    ) {
        (Some("projects"), Some(project), Some("configs"), Some(config), Some("variables"), Some(variable))
            if !project.is_empty() && !config.is_empty() && !variable.is_empty() =>
        {
            VariableIds {
                project: project.to_string(),
                config: config.to_string(),
                variable: variable.to_string(),
            }
        }
        _ => {
            return Err(FnshipError::InvalidArgument(format!(
                "'{}' is not a runtime config variable name",
                name
            ))
            .into())
        }
    };
    Ok(ids)
}
