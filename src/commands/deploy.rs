//! Deploy command handler
//!
//! Loads the declaration manifest, prepares the release, prints the plan,
//! and unless `--dry-run` is set writes the packaging files and applies the
//! plan.

use crate::config::Config;
use crate::deploy::pipeline::{functions_selected, DeployPipeline, PreparedDeploy, ReleaseReport};
use crate::deploy::planner::ReleasePlan;
use crate::error::Result;
use crate::triggers::load_manifest;
use colored::Colorize;
use prettytable::{cell, row, Table};
use std::path::PathBuf;

/// Arguments of `fnship deploy`
#[derive(Debug, Clone, Default)]
pub struct DeployArgs {
    /// Raw `--only` targets
    pub only: Option<String>,
    /// Raw `--except` targets
    pub except: Option<String>,
    /// Manifest override
    pub manifest: Option<PathBuf>,
    /// Output directory override
    pub out: Option<PathBuf>,
    /// Uploaded source archive
    pub source_archive_url: Option<String>,
    /// Stop after printing the plan
    pub dry_run: bool,
}

/// Run a functions deploy against the configured APIs
pub async fn run_deploy(config: &Config, args: DeployArgs) -> Result<()> {
    if !functions_selected(args.only.as_deref(), args.except.as_deref()) {
        println!("{} functions not selected, nothing to deploy.", "i".cyan());
        return Ok(());
    }

    let project = config.project_id()?;
    let manifest = args
        .manifest
        .clone()
        .unwrap_or_else(|| config.functions.manifest.clone());
    let root = load_manifest(&manifest)?;

    let mut pipeline = DeployPipeline::new(project, super::functions_api(config)?)
        .with_default_region(config.project.default_region.clone())
        .with_runtime(config.functions.runtime.clone())
        .with_source_archive_url(args.source_archive_url.clone())
        .with_platform_config(config.platform_config(project))
        .with_max_concurrency(config.runtime_config.max_concurrent_requests);
    if config.runtime_config.enabled {
        pipeline = pipeline.with_config_store(super::config_store(config)?);
    }

    let prepared = pipeline
        .prepare(&root, args.only.as_deref(), args.except.as_deref())
        .await?;
    print_plan(&prepared);

    if args.dry_run {
        println!("{} Dry run, no changes made.", "i".cyan());
        return Ok(());
    }

    let out_dir = args
        .out
        .clone()
        .unwrap_or_else(|| config.deploy.output_dir.clone());
    pipeline.package(&prepared, &out_dir)?;

    let report = pipeline.release(&prepared).await?;
    print_report(&report);
    report.ensure_success()
}

fn print_plan(prepared: &PreparedDeploy) {
    match plan_table(&prepared.plan) {
        Some(table) => {
            println!("\nRelease plan:\n");
            table.printstd();
            println!();
        }
        None => println!("No functions to release."),
    }
}

/// Unmatched filters are already logged by `DeployPipeline::prepare`
fn plan_table(plan: &ReleasePlan) -> Option<Table> {
    if plan.is_empty() {
        return None;
    }

    let mut table = Table::new();
    table.add_row(row!["Action", "Function", "Region"]);
    for (action, names) in [
        ("create", &plan.to_create),
        ("update", &plan.to_update),
        ("delete", &plan.to_delete),
    ] {
        for name in names {
            table.add_row(row![action, name.id(), name.region()]);
        }
    }
    Some(table)
}

fn print_report(report: &ReleaseReport) {
    for (action, name) in &report.succeeded {
        println!("{} {} {}", "✔".green(), action, name.label());
    }
    for failure in &report.failed {
        eprintln!(
            "{} {} {}: {}",
            "✖".red(),
            failure.action,
            failure.name.label(),
            failure.error
        );
    }
}
