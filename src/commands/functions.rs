//! Deployed function commands
//!
//! `functions list` prints the inventory as a table. `functions delete`
//! selects deployed functions by dotted filter and optional region and
//! deletes them concurrently.

use crate::config::Config;
use crate::deploy::filter::{select_functions, FilterGroup};
use crate::deploy::names::FunctionName;
use crate::error::{FnshipError, Result};
use crate::fanout::join_bounded;
use crate::remote::FunctionsApi;
use colored::Colorize;
use prettytable::{cell, row, Table};

/// Print every deployed function in the configured project
pub async fn list_functions(config: &Config) -> Result<()> {
    let project = config.project_id()?;
    let api = super::functions_api(config)?;
    let mut functions = api.list_functions(project).await?;
    functions.sort_by(|a, b| a.name.cmp(&b.name));

    if functions.is_empty() {
        println!("No functions deployed in project {}", project);
        return Ok(());
    }

    let mut table = Table::new();
    table.add_row(row!["Function", "Region", "Status", "Entry Point"]);
    for function in &functions {
        table.add_row(row![
            function.name.id(),
            function.name.region(),
            function.status.as_deref().unwrap_or("-"),
            function.entry_point.as_deref().unwrap_or("-")
        ]);
    }

    println!("\nFunctions deployed in {}:\n", project);
    table.printstd();
    println!();
    Ok(())
}

/// Delete deployed functions matching `filters` using the configured API
pub async fn run_delete(
    config: &Config,
    filters: &[String],
    region: Option<&str>,
    force: bool,
) -> Result<()> {
    let project = config.project_id()?;
    let api = super::functions_api(config)?;
    let deleted = delete_functions(
        api.as_ref(),
        project,
        filters,
        region,
        force,
        config.runtime_config.max_concurrent_requests,
    )
    .await?;
    println!("{} Deleted {} function(s).", "✔".green(), deleted.len());
    Ok(())
}

/// Delete deployed functions matching any dotted filter and the region
///
/// Without `force` the matching functions are printed and nothing is
/// deleted. Returns the names that were deleted.
///
/// # Errors
///
/// Fails when nothing matches, when `force` is not set, or when any
/// deletion fails. Deletions that succeeded are not undone.
pub async fn delete_functions(
    api: &dyn FunctionsApi,
    project: &str,
    filters: &[String],
    region: Option<&str>,
    force: bool,
    max_concurrency: usize,
) -> Result<Vec<FunctionName>> {
    if filters.iter().all(|filter| filter.trim().is_empty()) {
        return Err(FnshipError::InvalidArgument(
            "Must supply at least function or group name.".to_string(),
        )
        .into());
    }

    let groups: Vec<FilterGroup> = filters
        .iter()
        .map(|filter| FilterGroup::from_dotted(filter))
        .collect();

    let existing: Vec<FunctionName> = api
        .list_functions(project)
        .await?
        .into_iter()
        .map(|function| function.name)
        .collect();
    let selected = select_functions(&existing, &groups, region);

    if selected.is_empty() {
        anyhow::bail!(
            "The specified filters do not match any existing functions in project {}.",
            project
        );
    }

    let labels: Vec<String> = selected.iter().map(FunctionName::label).collect();
    if !force {
        println!(
            "You are about to delete the following functions:\n\t{}",
            labels.join("\n\t")
        );
        anyhow::bail!("Command aborted. Re-run with --force to delete these functions.");
    }

    let outcomes = join_bounded(
        max_concurrency,
        selected.iter().map(|name| api.delete_function(name)),
    )
    .await;

    let mut deleted = Vec::new();
    let mut failed = Vec::new();
    for (name, outcome) in selected.into_iter().zip(outcomes) {
        match outcome {
            Ok(()) => {
                tracing::info!("Deleted function {}", name.label());
                deleted.push(name);
            }
            Err(err) => {
                eprintln!(
                    "{} Failed to delete function {}: {}",
                    "✖".red(),
                    name.label(),
                    err
                );
                failed.push(name.label());
            }
        }
    }

    if !failed.is_empty() {
        anyhow::bail!("Failed to delete functions: {}", failed.join(", "));
    }
    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::MemoryFunctions;

    fn name(id: &str, region: &str) -> FunctionName {
        FunctionName::new("p", region, id)
    }

    fn inventory() -> MemoryFunctions {
        MemoryFunctions::new()
            .with_function(name("group-a", "us-central1"))
            .with_function(name("group-a", "us-east1"))
            .with_function(name("group-b", "us-central1"))
            .with_function(name("other", "us-central1"))
    }

    #[tokio::test]
    async fn test_delete_group_with_region() {
        let api = inventory();
        let deleted = delete_functions(
            &api,
            "p",
            &["group".to_string()],
            Some("us-central1"),
            true,
            4,
        )
        .await
        .unwrap();
        assert_eq!(
            deleted,
            vec![name("group-a", "us-central1"), name("group-b", "us-central1")]
        );
        assert_eq!(api.deployed().len(), 2);
    }

    #[tokio::test]
    async fn test_delete_requires_filters() {
        let api = inventory();
        let err = delete_functions(&api, "p", &[], None, true, 4)
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<FnshipError>(),
            Some(FnshipError::InvalidArgument(_))
        ));
        assert!(delete_functions(&api, "p", &[" ".to_string()], None, true, 4)
            .await
            .is_err());
        assert_eq!(api.deployed().len(), 4);
    }

    #[tokio::test]
    async fn test_delete_without_match_fails() {
        let api = inventory();
        let err = delete_functions(&api, "p", &["nope".to_string()], None, true, 4)
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "The specified filters do not match any existing functions in project p."
        );
    }

    #[tokio::test]
    async fn test_delete_without_force_aborts() {
        let api = inventory();
        let err = delete_functions(&api, "p", &["other".to_string()], None, false, 4)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("--force"));
        assert!(api.deleted().is_empty());
    }

    #[tokio::test]
    async fn test_delete_reports_failures() {
        let api = inventory().fail_on(name("group-b", "us-central1"));
        let err = delete_functions(&api, "p", &["group".to_string()], None, true, 4)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("group-b(us-central1)"));
        assert_eq!(api.deleted().len(), 2);
    }
}
