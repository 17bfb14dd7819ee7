//! Remote API abstractions
//!
//! fnship talks to two remote services: the runtime config service, which
//! stores namespaces ("configs") of text variables, and the functions
//! service, which holds the deployed inventory. Both are modelled as async
//! traits so the deploy pipeline and config store can run against the real
//! HTTP clients in [`http`] or the in-process fakes in [`memory`].
//!
//! Implementations map an HTTP 404 to
//! [`FnshipError::NotFound`](crate::error::FnshipError::NotFound) and any
//! other failure status to
//! [`FnshipError::Remote`](crate::error::FnshipError::Remote).

use crate::deploy::names::FunctionName;
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod http;
pub mod memory;

pub use http::{HttpFunctions, HttpRuntimeConfig};
pub use memory::{MemoryFunctions, MemoryRuntimeConfig};

/// A runtime config variable as stored remotely
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variable {
    /// `projects/<project>/configs/<config>/variables/<path>`
    pub name: String,
    /// Stored text (JSON for values written by fnship)
    #[serde(default)]
    pub text: String,
}

/// Runtime config service operations
#[async_trait]
pub trait RuntimeConfigApi: Send + Sync {
    /// Names of every config in the project, `projects/<p>/configs/<id>`
    async fn list_configs(&self, project: &str) -> Result<Vec<String>>;

    /// Every variable (with text) under a config resource name
    async fn list_variables(&self, config_name: &str) -> Result<Vec<Variable>>;

    /// A single variable by resource name
    async fn get_variable(&self, variable_name: &str) -> Result<Variable>;

    /// Create or overwrite one variable, creating its config if needed
    async fn set_variable(&self, project: &str, config: &str, path: &str, text: &str)
        -> Result<()>;

    /// Delete a variable and everything below it
    async fn delete_variable(&self, variable_name: &str) -> Result<()>;

    /// Delete a whole config and all of its variables
    async fn delete_config(&self, project: &str, config: &str) -> Result<()>;
}

/// A deployed (or to-be-deployed) function
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudFunction {
    /// Fully-qualified resource name
    pub name: FunctionName,

    /// Dotted source entry point
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_point: Option<String>,

    /// Deployment status reported by the platform
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    /// Runtime identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime: Option<String>,

    /// Location of the packaged source archive
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_archive_url: Option<String>,

    /// Present on HTTPS functions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub https_trigger: Option<serde_json::Value>,

    /// Present on event-driven functions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_trigger: Option<serde_json::Value>,

    /// Resource labels
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub labels: serde_json::Map<String, serde_json::Value>,
}

impl CloudFunction {
    /// A bare function record with only its name set
    pub fn named(name: FunctionName) -> Self {
        Self {
            name,
            entry_point: None,
            status: None,
            runtime: None,
            source_archive_url: None,
            https_trigger: None,
            event_trigger: None,
            labels: serde_json::Map::new(),
        }
    }
}

/// Functions service operations
#[async_trait]
pub trait FunctionsApi: Send + Sync {
    /// Every function deployed in the project, across all regions
    async fn list_functions(&self, project: &str) -> Result<Vec<CloudFunction>>;

    /// Create a new function
    async fn create_function(&self, function: &CloudFunction) -> Result<()>;

    /// Replace an existing function's definition
    async fn update_function(&self, function: &CloudFunction) -> Result<()>;

    /// Delete a function
    async fn delete_function(&self, name: &FunctionName) -> Result<()>;
}
