//! Functions deploy pipeline
//!
//! Stages run strictly in order: extract triggers, plan the release, take a
//! config snapshot, package, and release. Declaration and filter errors are
//! raised by [`DeployPipeline::prepare`] before any write is issued. Work
//! inside a stage (materializing namespaces, releasing functions) runs
//! concurrently.

use super::filter::{ensure_named_filters, parse_filters, targets_functions, FUNCTIONS_TARGET};
use super::names::{function_names, FunctionName, DEFAULT_REGION};
use super::planner::ReleasePlan;
use crate::error::{FnshipError, Result};
use crate::fanout::join_bounded;
use crate::remote::{CloudFunction, FunctionsApi};
use crate::runtime_config::{ConfigStore, DEFAULT_MAX_CONCURRENCY, RESERVED_NAMESPACES};
use crate::triggers::{extract_triggers, DeclarationNode, Trigger, TriggerKind};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Config snapshot file handed to the packaging step
pub const CONFIG_FILE: &str = ".runtimeconfig.json";

/// Trigger list handed to the packaging step
pub const TRIGGERS_FILE: &str = "triggers.json";

/// Label attached to every function this tool creates or updates
pub const DEPLOYMENT_TOOL_LABEL: (&str, &str) = ("deployment-tool", "cli-fnship");

/// True if the functions stage runs for these `--only`/`--except` strings
///
/// `--only` must mention functions when given; `--except functions` skips
/// the stage entirely.
pub fn functions_selected(only: Option<&str>, except: Option<&str>) -> bool {
    let only_ok = only.map(targets_functions).unwrap_or(true);
    let excluded = except
        .map(|raw| raw.split(',').map(str::trim).any(|e| e == FUNCTIONS_TARGET))
        .unwrap_or(false);
    only_ok && !excluded
}

/// Everything computed before the first remote write
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreparedDeploy {
    /// Triggers extracted from the declaration tree
    pub triggers: Vec<Trigger>,
    /// Reconciled release plan
    pub plan: ReleasePlan,
    /// Config snapshot including the reserved platform key
    pub config: Map<String, Value>,
    #[serde(skip)]
    sources: HashMap<FunctionName, usize>,
}

impl PreparedDeploy {
    /// Trigger that declared `name`, if it is declared in source
    pub fn trigger_for(&self, name: &FunctionName) -> Option<&Trigger> {
        self.sources.get(name).map(|&index| &self.triggers[index])
    }
}

/// Files written for the packaging step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageOutput {
    /// Path of the config snapshot
    pub config_file: PathBuf,
    /// Path of the trigger list
    pub triggers_file: PathBuf,
}

/// Remote mutation applied to one function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReleaseAction {
    /// Create a function that is not deployed yet
    Create,
    /// Replace a deployed function
    Update,
    /// Delete a function that is no longer declared
    Delete,
}

impl fmt::Display for ReleaseAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReleaseAction::Create => write!(f, "create"),
            ReleaseAction::Update => write!(f, "update"),
            ReleaseAction::Delete => write!(f, "delete"),
        }
    }
}

/// A function release that failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReleaseFailure {
    /// Attempted action
    pub action: ReleaseAction,
    /// Target function
    pub name: FunctionName,
    /// Error message
    pub error: String,
}

/// Per-function outcome of the release stage
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReleaseReport {
    /// Actions that completed
    pub succeeded: Vec<(ReleaseAction, FunctionName)>,
    /// Actions that failed
    pub failed: Vec<ReleaseFailure>,
}

impl ReleaseReport {
    /// Fail if any function could not be released
    pub fn ensure_success(&self) -> Result<()> {
        if self.failed.is_empty() {
            return Ok(());
        }
        let labels: Vec<String> = self
            .failed
            .iter()
            .map(|failure| format!("{} {}", failure.action, failure.name.label()))
            .collect();
        anyhow::bail!(
            "{} function operation(s) failed: {}",
            self.failed.len(),
            labels.join(", ")
        )
    }
}

/// Drives one functions deploy for a project
pub struct DeployPipeline {
    project: String,
    functions: Arc<dyn FunctionsApi>,
    config_store: Option<ConfigStore>,
    default_region: String,
    runtime: Option<String>,
    source_archive_url: Option<String>,
    platform_config: Option<Value>,
    max_concurrency: usize,
}

impl DeployPipeline {
    /// Pipeline for `project` without a runtime config snapshot
    pub fn new(project: impl Into<String>, functions: Arc<dyn FunctionsApi>) -> Self {
        Self {
            project: project.into(),
            functions,
            config_store: None,
            default_region: DEFAULT_REGION.to_string(),
            runtime: None,
            source_archive_url: None,
            platform_config: None,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }

    /// Embed a snapshot of this store's config into the deploy
    pub fn with_config_store(mut self, store: ConfigStore) -> Self {
        self.config_store = Some(store);
        self
    }

    /// Region for triggers that do not list any
    pub fn with_default_region(mut self, region: impl Into<String>) -> Self {
        self.default_region = region.into();
        self
    }

    /// Runtime set on created and updated functions
    pub fn with_runtime(mut self, runtime: Option<String>) -> Self {
        self.runtime = runtime;
        self
    }

    /// Location of the packaged source, set on created and updated functions
    pub fn with_source_archive_url(mut self, url: Option<String>) -> Self {
        self.source_archive_url = url;
        self
    }

    /// Value stored under the reserved key of the config snapshot
    pub fn with_platform_config(mut self, value: Value) -> Self {
        self.platform_config = Some(value);
        self
    }

    /// Cap concurrent release calls
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    /// Extract, plan, and snapshot
    ///
    /// # Errors
    ///
    /// Fails on an invalid declaration or a `functions:` filter without a
    /// name before any remote call, when every filter is unmatched, or when
    /// the inventory or config cannot be read.
    pub async fn prepare(
        &self,
        root: &DeclarationNode,
        only: Option<&str>,
        except: Option<&str>,
    ) -> Result<PreparedDeploy> {
        for raw in only.into_iter().chain(except) {
            ensure_named_filters(raw)?;
        }
        let triggers = extract_triggers(root)?;

        let mut upload = Vec::new();
        let mut sources = HashMap::new();
        for (index, trigger) in triggers.iter().enumerate() {
            for name in function_names(
                std::slice::from_ref(trigger),
                &self.project,
                &self.default_region,
            ) {
                sources.insert(name.clone(), index);
                upload.push(name);
            }
        }

        let existing: Vec<FunctionName> = self
            .functions
            .list_functions(&self.project)
            .await?
            .into_iter()
            .map(|function| function.name)
            .collect();

        let only_groups = only.map(parse_filters).unwrap_or_default();
        let except_groups = except.map(parse_filters).unwrap_or_default();
        let plan = ReleasePlan::build(&upload, &existing, &only_groups, &except_groups);
        plan.check_filters()?;
        if !plan.unmatched_filters.is_empty() {
            tracing::warn!(
                "The following filters were specified but do not match any functions in the project: {}",
                plan.unmatched_filters.join(", ")
            );
        }

        let config = self.snapshot().await?;

        tracing::info!(
            deploy.project = %self.project,
            deploy.triggers = triggers.len(),
            deploy.release = plan.release_names.len(),
            "Prepared functions deploy"
        );
        Ok(PreparedDeploy {
            triggers,
            plan,
            config,
            sources,
        })
    }

    async fn snapshot(&self) -> Result<Map<String, Value>> {
        let mut config = match &self.config_store {
            Some(store) => store
                .materialize_all(&self.project)
                .await
                .map_err(explain_config_outage)?,
            None => Map::new(),
        };

        let platform = self
            .platform_config
            .clone()
            .unwrap_or_else(|| serde_json::json!({ "projectId": self.project }));
        config.insert(RESERVED_NAMESPACES[0].to_string(), platform);
        Ok(config)
    }

    /// Write the config snapshot and trigger list into `out_dir`
    pub fn package(&self, prepared: &PreparedDeploy, out_dir: &Path) -> Result<PackageOutput> {
        std::fs::create_dir_all(out_dir)?;

        let config_file = out_dir.join(CONFIG_FILE);
        std::fs::write(&config_file, serde_json::to_string_pretty(&prepared.config)?)?;

        let triggers_file = out_dir.join(TRIGGERS_FILE);
        std::fs::write(&triggers_file, serde_json::to_string_pretty(&prepared.triggers)?)?;

        tracing::info!("Packaged config and triggers into {}", out_dir.display());
        Ok(PackageOutput {
            config_file,
            triggers_file,
        })
    }

    /// Apply the plan through the functions API
    ///
    /// Every action is attempted; failures are collected in the report
    /// rather than aborting the other releases.
    pub async fn release(&self, prepared: &PreparedDeploy) -> Result<ReleaseReport> {
        let plan = &prepared.plan;
        let mut actions = Vec::new();
        for name in &plan.to_create {
            actions.push((ReleaseAction::Create, name));
        }
        for name in &plan.to_update {
            actions.push((ReleaseAction::Update, name));
        }
        for name in &plan.to_delete {
            actions.push((ReleaseAction::Delete, name));
        }

        let outcomes = join_bounded(
            self.max_concurrency,
            actions
                .iter()
                .map(|&(action, name)| self.apply(prepared, action, name)),
        )
        .await;

        let mut report = ReleaseReport::default();
        for ((action, name), outcome) in actions.into_iter().zip(outcomes) {
            match outcome {
                Ok(()) => {
                    tracing::info!(
                        release.action = %action,
                        release.function = %name.label(),
                        "Released function"
                    );
                    report.succeeded.push((action, name.clone()));
                }
                Err(err) => {
                    tracing::warn!(
                        release.action = %action,
                        release.function = %name.label(),
                        "Release failed: {}",
                        err
                    );
                    report.failed.push(ReleaseFailure {
                        action,
                        name: name.clone(),
                        error: err.to_string(),
                    });
                }
            }
        }
        Ok(report)
    }

    async fn apply(
        &self,
        prepared: &PreparedDeploy,
        action: ReleaseAction,
        name: &FunctionName,
    ) -> Result<()> {
        match action {
            ReleaseAction::Delete => self.functions.delete_function(name).await,
            ReleaseAction::Create | ReleaseAction::Update => {
                let trigger = prepared.trigger_for(name).ok_or_else(|| {
                    FnshipError::InvalidArgument(format!("{} is not declared in source", name))
                })?;
                let function = self.cloud_function(name, trigger);
                if action == ReleaseAction::Create {
                    self.functions.create_function(&function).await
                } else {
                    self.functions.update_function(&function).await
                }
            }
        }
    }

    fn cloud_function(&self, name: &FunctionName, trigger: &Trigger) -> CloudFunction {
        let mut function = CloudFunction::named(name.clone());
        function.entry_point = Some(trigger.entry_point.clone());
        function.runtime = self.runtime.clone();
        function.source_archive_url = self.source_archive_url.clone();

        let payload = Value::Object(trigger.descriptor.fields.clone());
        match trigger.descriptor.kind {
            TriggerKind::Http => function.https_trigger = Some(payload),
            TriggerKind::Event => function.event_trigger = Some(payload),
        }
        function.labels.insert(
            DEPLOYMENT_TOOL_LABEL.0.to_string(),
            Value::String(DEPLOYMENT_TOOL_LABEL.1.to_string()),
        );
        function
    }
}

fn explain_config_outage(err: anyhow::Error) -> anyhow::Error {
    match FnshipError::remote_status(&err) {
        Some(500) | Some(503) => {
            tracing::debug!("Runtime config materialization failed: {}", err);
            anyhow::anyhow!(
                "The runtime config service is currently experiencing issues, which is \
                 preventing your functions from being deployed. Please wait a few minutes \
                 and then try to deploy again.\nRun `fnship deploy --except functions` to \
                 continue deploying the rest of your project."
            )
        }
        _ => err,
    }
}
