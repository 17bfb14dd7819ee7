//! Runtime config commands
//!
//! `config get`, `set`, `unset`, `clone`, and `legacy`. Results are printed
//! to stdout as pretty JSON; status lines use `colored`.

use crate::error::{FnshipError, Result};
use crate::runtime_config::{clone_config, parse_set_args, parse_unset_args, ConfigStore};
use colored::Colorize;
use serde_json::Value;

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn deploy_reminder() {
    println!(
        "\nPlease deploy your functions for the change to take effect by running {}\n",
        "fnship deploy --only functions".bold()
    );
}

/// Print config at `path`, or every namespace
pub async fn get(store: &ConfigStore, project: &str, path: Option<&str>) -> Result<()> {
    let value = store.get(project, path).await?;
    print_json(&value)
}

/// Apply `key=value` assignments
///
/// All tokens are parsed before the first write.
pub async fn set(store: &ConfigStore, project: &str, tokens: &[String]) -> Result<()> {
    if tokens.is_empty() {
        return Err(FnshipError::InvalidArgument(
            "Must supply at least one key/value pair, e.g. app.name=\"My App\"".to_string(),
        )
        .into());
    }

    let args = parse_set_args(tokens)?;
    for arg in &args {
        store
            .set_variables_recursive(project, &arg.namespace, &arg.path, &arg.value)
            .await?;
    }

    println!("{} Functions config updated.", "✔".green());
    deploy_reminder();
    Ok(())
}

/// Remove namespaces or variable subtrees
pub async fn unset(store: &ConfigStore, project: &str, keys: &[String]) -> Result<()> {
    if keys.is_empty() {
        return Err(FnshipError::InvalidArgument("Must supply at least one key".to_string()).into());
    }

    for key in parse_unset_args(keys)? {
        store.unset(project, &key).await?;
    }

    println!("{} Environment updated.", "✔".green());
    deploy_reminder();
    Ok(())
}

/// Copy config from `from_project` into `project`
pub async fn clone(
    store: &ConfigStore,
    from_project: &str,
    project: &str,
    only: &[String],
    except: &[String],
) -> Result<()> {
    if from_project.trim().is_empty() {
        return Err(FnshipError::InvalidArgument(
            "Must specify a source project in --from <projectId> option.".to_string(),
        )
        .into());
    }
    if from_project == project {
        return Err(FnshipError::FilterConflict(
            "From project and destination can't be the same project.".to_string(),
        )
        .into());
    }

    clone_config(store, from_project, project, only, except).await?;

    println!(
        "{} Cloned functions config from {} into {}",
        "✔".green(),
        from_project.bold(),
        project.bold()
    );
    deploy_reminder();
    Ok(())
}

/// Print config stored by older tooling, if any
pub async fn legacy(store: &ConfigStore, project: &str) -> Result<()> {
    match store.legacy_config(project).await? {
        Some(value) => print_json(&value),
        None => {
            println!("{}", "No legacy config found.".yellow());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::MemoryRuntimeConfig;
    use std::sync::Arc;

    fn store() -> (ConfigStore, Arc<MemoryRuntimeConfig>) {
        let memory =
            Arc::new(MemoryRuntimeConfig::new().with_variable("src", "app", "k", "\"v\""));
        (ConfigStore::new(memory.clone()), memory)
    }

    #[tokio::test]
    async fn test_set_parses_everything_before_writing() {
        let (store, memory) = store();
        let tokens = vec!["app.a=1".to_string(), "broken".to_string()];
        assert!(set(&store, "p", &tokens).await.is_err());
        assert!(memory.writes().is_empty());
    }

    #[tokio::test]
    async fn test_set_rejects_namespace_scalar_before_writing() {
        let (store, memory) = store();
        let tokens = vec!["app.a=1".to_string(), "foo=bar".to_string()];
        let err = set(&store, "p", &tokens).await.unwrap_err();
        assert!(err.to_string().contains("config namespace foo"));
        assert!(memory.writes().is_empty());
    }

    #[tokio::test]
    async fn test_set_rejects_empty_object_before_writing() {
        let (store, memory) = store();
        let tokens = vec!["app.a=1".to_string(), "app.x={}".to_string()];
        assert!(set(&store, "p", &tokens).await.is_err());
        assert!(memory.writes().is_empty());
    }

    #[tokio::test]
    async fn test_set_writes_values() {
        let (store, memory) = store();
        set(&store, "p", &["app.a.b=1".to_string()]).await.unwrap();
        assert_eq!(memory.text("p", "app", "a/b"), Some("\"1\"".to_string()));
    }

    #[tokio::test]
    async fn test_set_requires_tokens() {
        let (store, _) = store();
        assert!(set(&store, "p", &[]).await.is_err());
    }

    #[tokio::test]
    async fn test_clone_rejects_same_project() {
        let (store, memory) = store();
        let err = clone(&store, "src", "src", &[], &[]).await.unwrap_err();
        assert!(err.to_string().contains("same project"));
        assert!(memory.writes().is_empty());
    }

    #[tokio::test]
    async fn test_clone_copies() {
        let (store, memory) = store();
        clone(&store, "src", "dst", &[], &[]).await.unwrap();
        assert_eq!(memory.text("dst", "app", "k"), Some("\"v\"".to_string()));
    }

    #[tokio::test]
    async fn test_unset_rejects_reserved() {
        let (store, _) = store();
        assert!(unset(&store, "p", &["firebase.x".to_string()]).await.is_err());
    }
}
