//! Copying runtime config between projects

use super::args::ConfigKey;
use super::ids::{config_name, variable_name_to_ids};
use super::{is_reserved, tree, ConfigStore, RESERVED_NAMESPACES};
use crate::error::{FnshipError, Result};
use crate::fanout::try_join_bounded;

/// Copy config from `from_project` into `to_project`
///
/// With `only`, each dotted key selects a whole namespace or the variables
/// whose path starts with the key's sub-path; their stored text is copied
/// verbatim. Otherwise the full source project is materialized, the
/// reserved namespace and every `except` key are removed, and the rest is
/// written namespace by namespace. `only` and `except` cannot both be
/// non-empty.
///
/// Writes are not transactional: a failure stops the copy with whatever
/// was already written left in place.
pub async fn clone_config(
    store: &ConfigStore,
    from_project: &str,
    to_project: &str,
    only: &[String],
    except: &[String],
) -> Result<()> {
    if !only.is_empty() && !except.is_empty() {
        return Err(FnshipError::FilterConflict(
            "Cannot use both --only and --except at the same time.".to_string(),
        )
        .into());
    }

    if only.is_empty() {
        clone_all(store, from_project, to_project, except).await
    } else {
        clone_only(store, from_project, to_project, only).await
    }
}

async fn clone_only(
    store: &ConfigStore,
    from_project: &str,
    to_project: &str,
    only: &[String],
) -> Result<()> {
    let keys = only
        .iter()
        .map(|key| ConfigKey::parse(key))
        .collect::<Result<Vec<_>>>()?;
    if let Some(key) = keys.iter().find(|key| is_reserved(&key.namespace)) {
        return Err(FnshipError::FilterConflict(format!(
            "Cannot clone reserved namespace {}",
            key.namespace
        ))
        .into());
    }

    let mut copies = Vec::new();
    for key in &keys {
        let variables = store
            .api()
            .list_variables(&config_name(from_project, &key.namespace))
            .await?;
        let prefix = key.segments();
        for variable in variables {
            let ids = variable_name_to_ids(&variable.name)?;
            let path: Vec<&str> = ids.variable.split(tree::PATH_SEPARATOR).collect();
            if path.starts_with(&prefix) {
                copies.push((ids.config, ids.variable, variable.text));
            }
        }
    }

    tracing::info!(
        clone.from = from_project,
        clone.to = to_project,
        clone.variables = copies.len(),
        "Cloning selected config"
    );
    try_join_bounded(
        store.max_concurrency(),
        copies.iter().map(|(config, path, text)| {
            store.api().set_variable(to_project, config, path, text)
        }),
    )
    .await?;
    Ok(())
}

async fn clone_all(
    store: &ConfigStore,
    from_project: &str,
    to_project: &str,
    except: &[String],
) -> Result<()> {
    let mut source = store.materialize_all(from_project).await?;
    for reserved in RESERVED_NAMESPACES {
        source.remove(*reserved);
    }
    for key in except {
        if !tree::remove_dotted(&mut source, key) {
            tracing::debug!("Except key {} not present in {}", key, from_project);
        }
    }

    tracing::info!(
        clone.from = from_project,
        clone.to = to_project,
        clone.namespaces = source.len(),
        "Cloning config"
    );
    try_join_bounded(
        store.max_concurrency(),
        source
            .iter()
            .map(|(namespace, value)| store.set_variables_recursive(to_project, namespace, "", value)),
    )
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::MemoryRuntimeConfig;
    use std::sync::Arc;

    fn source() -> Arc<MemoryRuntimeConfig> {
        Arc::new(
            MemoryRuntimeConfig::new()
                .with_variable("src", "app", "db/host", "\"h\"")
                .with_variable("src", "app", "db/port", "1")
                .with_variable("src", "app", "dbx", "\"x\"")
                .with_variable("src", "mail", "key", "\"k\"")
                .with_variable("src", "firebase", "meta", "{}"),
        )
    }

    #[tokio::test]
    async fn test_clone_only_subpath() {
        let memory = source();
        let store = ConfigStore::new(memory.clone());
        clone_config(&store, "src", "dst", &["app.db".to_string()], &[])
            .await
            .unwrap();

        let mut writes = memory.writes();
        writes.sort();
        assert_eq!(
            writes,
            vec![
                "projects/dst/configs/app/variables/db/host".to_string(),
                "projects/dst/configs/app/variables/db/port".to_string(),
            ]
        );
        assert_eq!(memory.text("dst", "app", "db/host"), Some("\"h\"".to_string()));
    }

    #[tokio::test]
    async fn test_clone_only_namespace() {
        let memory = source();
        let store = ConfigStore::new(memory.clone());
        clone_config(&store, "src", "dst", &["mail".to_string()], &[])
            .await
            .unwrap();
        assert_eq!(memory.config_ids("dst"), vec!["mail".to_string()]);
    }

    #[tokio::test]
    async fn test_clone_only_reserved_is_rejected_before_writes() {
        let memory = source();
        let store = ConfigStore::new(memory.clone());
        let err = clone_config(
            &store,
            "src",
            "dst",
            &["app".to_string(), "firebase".to_string()],
            &[],
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("reserved"));
        assert!(memory.writes().is_empty());
    }

    #[tokio::test]
    async fn test_clone_all_with_except() {
        let memory = source();
        let store = ConfigStore::new(memory.clone());
        clone_config(&store, "src", "dst", &[], &["app.db".to_string()])
            .await
            .unwrap();

        assert_eq!(memory.text("dst", "app", "db/host"), None);
        assert_eq!(memory.text("dst", "app", "dbx"), Some("\"x\"".to_string()));
        assert_eq!(memory.text("dst", "mail", "key"), Some("\"k\"".to_string()));
        assert!(!memory.config_ids("dst").contains(&"firebase".to_string()));
    }

    #[tokio::test]
    async fn test_only_and_except_conflict() {
        let store = ConfigStore::new(source());
        let err = clone_config(&store, "src", "dst", &["a".to_string()], &["b".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<FnshipError>(),
            Some(FnshipError::FilterConflict(_))
        ));
    }
}
