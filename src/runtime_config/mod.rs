//! Hierarchical runtime configuration
//!
//! The remote service stores a two-level hierarchy: a project owns configs
//! (one per namespace, the first segment of a dotted key) and each config
//! owns variables addressed by a slash-joined path. Only leaves are stored.
//! [`ConfigStore`] reconstructs nested values on read and flattens them on
//! write.
//!
//! Writes fan out to one remote call per leaf and are not transactional. A
//! failure partway through leaves the namespace with a mix of old and new
//! values.
//!
//! # Examples
//!
//! ```
//! use fnship::remote::MemoryRuntimeConfig;
//! use fnship::runtime_config::ConfigStore;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = ConfigStore::new(Arc::new(MemoryRuntimeConfig::new()));
//!     store.set_variables_recursive("demo", "app", "a/b/c", &json!(5)).await?;
//!
//!     let app = store.materialize_config("demo", "app").await?;
//!     assert_eq!(app, json!({"a": {"b": {"c": 5}}}));
//!     Ok(())
//! }
//! ```

pub mod args;
pub mod clone;
pub mod ids;
pub mod tree;

pub use args::{parse_set_args, parse_unset_args, ConfigKey, SetArg};
pub use clone::clone_config;

use crate::error::{FnshipError, Result};
use crate::fanout::try_join_bounded;
use crate::remote::RuntimeConfigApi;
use ids::{config_name, config_name_to_ids, variable_name, variable_name_to_ids};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Namespaces owned by the platform itself
pub const RESERVED_NAMESPACES: &[&str] = &["firebase"];

/// Default number of concurrent remote calls
pub const DEFAULT_MAX_CONCURRENCY: usize = 8;

/// True for namespaces users may not set, unset, or clone
pub fn is_reserved(namespace: &str) -> bool {
    RESERVED_NAMESPACES.contains(&namespace)
}

/// Handle over a runtime config backend
///
/// Every operation takes the project explicitly; the store holds no cached
/// state between calls.
#[derive(Clone)]
pub struct ConfigStore {
    api: Arc<dyn RuntimeConfigApi>,
    max_concurrency: usize,
}

impl std::fmt::Debug for ConfigStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigStore")
            .field("max_concurrency", &self.max_concurrency)
            .finish_non_exhaustive()
    }
}

impl ConfigStore {
    /// Create a store over `api`
    pub fn new(api: Arc<dyn RuntimeConfigApi>) -> Self {
        Self {
            api,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }

    /// Cap concurrent remote calls
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    /// Underlying backend
    pub fn api(&self) -> &Arc<dyn RuntimeConfigApi> {
        &self.api
    }

    pub(crate) fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Fetch every variable of `namespace` and fold them into one object
    pub async fn materialize_config(&self, project: &str, namespace: &str) -> Result<Value> {
        let variables = self
            .api
            .list_variables(&config_name(project, namespace))
            .await?;

        let mut root = Map::new();
        for variable in &variables {
            let ids = variable_name_to_ids(&variable.name)?;
            tree::insert_at_path(
                &mut root,
                ids.variable.split(tree::PATH_SEPARATOR),
                tree::decode_text(&variable.text),
            );
        }
        tracing::debug!(
            config.namespace = namespace,
            config.variables = variables.len(),
            "Materialized config namespace"
        );
        Ok(Value::Object(root))
    }

    /// Materialize every user namespace of `project`, keyed by namespace id
    ///
    /// Reserved namespaces are skipped.
    pub async fn materialize_all(&self, project: &str) -> Result<Map<String, Value>> {
        let mut namespaces = Vec::new();
        for name in self.api.list_configs(project).await? {
            let (_, namespace) = config_name_to_ids(&name)?;
            if !is_reserved(&namespace) {
                namespaces.push(namespace);
            }
        }

        let values = try_join_bounded(
            self.max_concurrency,
            namespaces
                .iter()
                .map(|namespace| self.materialize_config(project, namespace)),
        )
        .await?;

        Ok(namespaces.into_iter().zip(values).collect())
    }

    /// Write `value` below `path`, one remote write per leaf
    ///
    /// Objects recurse once per key. Writes run concurrently and stop at the
    /// first failure; leaves already written stay written.
    pub async fn set_variables_recursive(
        &self,
        project: &str,
        namespace: &str,
        path: &str,
        value: &Value,
    ) -> Result<()> {
        if is_reserved(namespace) {
            return Err(FnshipError::FilterConflict(format!(
                "Cannot set to reserved config namespace {}",
                namespace
            ))
            .into());
        }

        let mut writes = Vec::new();
        for (leaf_path, leaf) in tree::flatten(path, value) {
            if leaf_path.is_empty() {
                return Err(FnshipError::InvalidArgument(format!(
                    "Cannot set a value directly on config namespace {}",
                    namespace
                ))
                .into());
            }
            writes.push((leaf_path, tree::encode_value(&leaf)?));
        }

        tracing::debug!(
            config.namespace = namespace,
            config.writes = writes.len(),
            "Writing config variables"
        );
        try_join_bounded(
            self.max_concurrency,
            writes.iter().map(|(leaf_path, text)| {
                self.api.set_variable(project, namespace, leaf_path, text)
            }),
        )
        .await?;
        Ok(())
    }

    /// Remove a namespace or a variable subtree
    ///
    /// A missing target is not an error.
    pub async fn unset(&self, project: &str, key: &ConfigKey) -> Result<()> {
        if is_reserved(&key.namespace) {
            return Err(FnshipError::FilterConflict(format!(
                "Cannot unset reserved config namespace {}",
                key.namespace
            ))
            .into());
        }

        let outcome = if key.is_namespace() {
            self.api.delete_config(project, &key.namespace).await
        } else {
            self.api
                .delete_variable(&variable_name(project, &key.namespace, &key.path))
                .await
        };

        match outcome {
            Err(err) if FnshipError::is_not_found(&err) => {
                tracing::debug!("Nothing to unset at {}: {}", key.namespace, err);
                Ok(())
            }
            other => other,
        }
    }

    /// Config for a dotted `path`, or every namespace when `path` is `None`
    ///
    /// Returns `null` when the path does not exist inside its namespace.
    pub async fn get(&self, project: &str, path: Option<&str>) -> Result<Value> {
        let Some(path) = path.filter(|p| !p.is_empty()) else {
            return Ok(Value::Object(self.materialize_all(project).await?));
        };

        let (namespace, rest) = path.split_once('.').unwrap_or((path, ""));
        let config = self.materialize_config(project, namespace).await?;
        Ok(tree::get_dotted(&config, rest).cloned().unwrap_or(Value::Null))
    }

    /// Config written by older tooling under `firebase/<version>`
    ///
    /// Returns `None` when no legacy config exists.
    pub async fn legacy_config(&self, project: &str) -> Result<Option<Value>> {
        let Some(meta) = self.probe(project, "meta").await? else {
            return Ok(None);
        };

        let version = match meta.get("version") {
            Some(Value::String(version)) => version.clone(),
            Some(version @ (Value::Number(_) | Value::Bool(_))) => version.to_string(),
            _ => {
                tracing::debug!("Legacy config meta has no version");
                return Ok(None);
            }
        };

        self.probe(project, &version).await
    }

    async fn probe(&self, project: &str, path: &str) -> Result<Option<Value>> {
        let name = variable_name(project, RESERVED_NAMESPACES[0], path);
        match self.api.get_variable(&name).await {
            Ok(variable) => Ok(Some(tree::decode_text(&variable.text))),
            Err(err) if FnshipError::is_not_found(&err) => Ok(None),
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::MemoryRuntimeConfig;
    use serde_json::json;

    fn store_with(memory: MemoryRuntimeConfig) -> (ConfigStore, Arc<MemoryRuntimeConfig>) {
        let memory = Arc::new(memory);
        (ConfigStore::new(memory.clone()), memory)
    }

    #[tokio::test]
    async fn test_round_trip_nested_path() {
        let (store, _) = store_with(MemoryRuntimeConfig::new());
        store
            .set_variables_recursive("p", "ns", "a/b/c", &json!(5))
            .await
            .unwrap();
        let value = store.materialize_config("p", "ns").await.unwrap();
        assert_eq!(value, json!({"a": {"b": {"c": 5}}}));
    }

    #[tokio::test]
    async fn test_set_subtree_writes_each_leaf() {
        let (store, memory) = store_with(MemoryRuntimeConfig::new());
        store
            .set_variables_recursive("p", "app", "", &json!({"db": {"host": "h", "port": 5432}}))
            .await
            .unwrap();
        assert_eq!(memory.writes().len(), 2);
        assert_eq!(memory.text("p", "app", "db/host"), Some("\"h\"".to_string()));
        assert_eq!(memory.text("p", "app", "db/port"), Some("5432".to_string()));
    }

    #[tokio::test]
    async fn test_set_rejects_scalar_on_namespace() {
        let (store, memory) = store_with(MemoryRuntimeConfig::new());
        let err = store
            .set_variables_recursive("p", "app", "", &json!("x"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("directly"));
        assert!(memory.writes().is_empty());
    }

    #[tokio::test]
    async fn test_set_rejects_reserved_namespace() {
        let (store, memory) = store_with(MemoryRuntimeConfig::new());
        assert!(store
            .set_variables_recursive("p", "firebase", "x", &json!(1))
            .await
            .is_err());
        assert!(memory.writes().is_empty());
    }

    #[tokio::test]
    async fn test_materialize_all_skips_reserved() {
        let (store, _) = store_with(
            MemoryRuntimeConfig::new()
                .with_variable("p", "firebase", "meta", r#"{"version":"v1"}"#)
                .with_variable("p", "app", "key", "\"v\"")
                .with_variable("p", "db", "host", "legacy-text"),
        );
        let all = store.materialize_all("p").await.unwrap();
        assert_eq!(
            Value::Object(all),
            json!({"app": {"key": "v"}, "db": {"host": "legacy-text"}})
        );
    }

    #[tokio::test]
    async fn test_get_dotted_path() {
        let (store, _) = store_with(
            MemoryRuntimeConfig::new()
                .with_variable("p", "app", "db/host", "\"h\"")
                .with_variable("p", "app", "db/port", "1"),
        );
        assert_eq!(store.get("p", Some("app.db.host")).await.unwrap(), json!("h"));
        assert_eq!(
            store.get("p", Some("app.db")).await.unwrap(),
            json!({"host": "h", "port": 1})
        );
        assert_eq!(store.get("p", Some("app.missing")).await.unwrap(), Value::Null);
        assert_eq!(
            store.get("p", None).await.unwrap(),
            json!({"app": {"db": {"host": "h", "port": 1}}})
        );
    }

    #[tokio::test]
    async fn test_unset_tolerates_missing() {
        let (store, memory) = store_with(
            MemoryRuntimeConfig::new()
                .with_variable("p", "app", "db/host", "\"h\"")
                .with_variable("p", "app", "keep", "1"),
        );
        let key = ConfigKey::parse("app.db").unwrap();
        store.unset("p", &key).await.unwrap();
        store.unset("p", &key).await.unwrap();
        assert_eq!(memory.text("p", "app", "db/host"), None);
        assert_eq!(memory.text("p", "app", "keep"), Some("1".to_string()));

        store.unset("p", &ConfigKey::parse("app").unwrap()).await.unwrap();
        assert!(memory.config_ids("p").is_empty());
        store.unset("p", &ConfigKey::parse("gone").unwrap()).await.unwrap();
    }

    #[tokio::test]
    async fn test_legacy_config_absent() {
        let (store, _) = store_with(MemoryRuntimeConfig::new());
        assert_eq!(store.legacy_config("p").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_legacy_config_without_version() {
        let (store, _) = store_with(
            MemoryRuntimeConfig::new().with_variable("p", "firebase", "meta", "{}"),
        );
        assert_eq!(store.legacy_config("p").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_legacy_config_present() {
        let (store, _) = store_with(
            MemoryRuntimeConfig::new()
                .with_variable("p", "firebase", "meta", r#"{"version":"v7"}"#)
                .with_variable("p", "firebase", "v7", r#"{"app":{"key":"old"}}"#),
        );
        assert_eq!(
            store.legacy_config("p").await.unwrap(),
            Some(json!({"app": {"key": "old"}}))
        );
    }

    #[tokio::test]
    async fn test_legacy_config_numeric_version() {
        let (store, _) = store_with(
            MemoryRuntimeConfig::new()
                .with_variable("p", "firebase", "meta", r#"{"version":3}"#)
                .with_variable("p", "firebase", "3", r#"{"app":{"key":"v3"}}"#),
        );
        assert_eq!(
            store.legacy_config("p").await.unwrap(),
            Some(json!({"app": {"key": "v3"}}))
        );
    }
}
