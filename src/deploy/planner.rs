//! Release planning
//!
//! Reconciles the functions declared in source against the functions already
//! deployed, scoped by the user's filters, into a [`ReleasePlan`].

use super::filter::{function_matches_any_group, unmatched_filters, FilterGroup};
use super::names::FunctionName;
use crate::error::{FnshipError, Result};
use indexmap::IndexSet;
use serde::Serialize;

/// Names to release: declared and deployed names matching `groups`
///
/// Declared names come first in discovery order, followed by deployed-only
/// names in inventory order, without duplicates. An empty `groups` matches
/// every candidate.
///
/// # Examples
///
/// ```
/// use fnship::deploy::filter::FilterGroup;
/// use fnship::deploy::names::FunctionName;
/// use fnship::deploy::planner::release_names;
///
/// let upload = vec![FunctionName::new("p", "us-central1", "myGroup-func1")];
/// let existing = vec![FunctionName::new("p", "us-central1", "myGroup-func2")];
///
/// let whole_group = release_names(&upload, &existing, &[FilterGroup::new(["myGroup"])]);
/// assert_eq!(whole_group.len(), 2);
///
/// let one = release_names(&upload, &existing, &[FilterGroup::new(["myGroup", "func1"])]);
/// assert_eq!(one, upload);
/// ```
pub fn release_names(
    upload: &[FunctionName],
    existing: &[FunctionName],
    groups: &[FilterGroup],
) -> Vec<FunctionName> {
    let candidates: IndexSet<&FunctionName> = upload.iter().chain(existing.iter()).collect();
    candidates
        .into_iter()
        .filter(|name| function_matches_any_group(name, groups))
        .cloned()
        .collect()
}

/// Outcome of reconciling declared and deployed functions
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleasePlan {
    /// Every function touched by this release, in release order
    pub release_names: Vec<FunctionName>,
    /// Declared but not yet deployed
    pub to_create: Vec<FunctionName>,
    /// Declared and already deployed
    pub to_update: Vec<FunctionName>,
    /// Deployed but no longer declared
    pub to_delete: Vec<FunctionName>,
    /// Filters (dotted) that matched neither a declared nor a deployed function
    pub unmatched_filters: Vec<String>,
    /// Number of filters supplied through `--only` and `--except`
    pub filter_count: usize,
}

impl ReleasePlan {
    /// Build a plan from declared names, deployed names, and filters
    ///
    /// `only` selects names as in [`release_names`]; names matching any
    /// `except` group are then dropped.
    pub fn build(
        upload: &[FunctionName],
        existing: &[FunctionName],
        only: &[FilterGroup],
        except: &[FilterGroup],
    ) -> Self {
        let release_names: Vec<FunctionName> = release_names(upload, existing, only)
            .into_iter()
            .filter(|name| except.is_empty() || !function_matches_any_group(name, except))
            .collect();

        let declared: IndexSet<&FunctionName> = upload.iter().collect();
        let deployed: IndexSet<&FunctionName> = existing.iter().collect();

        let mut plan = ReleasePlan {
            filter_count: only.len() + except.len(),
            ..Default::default()
        };
        for name in &release_names {
            match (declared.contains(name), deployed.contains(name)) {
                (true, true) => plan.to_update.push(name.clone()),
                (true, false) => plan.to_create.push(name.clone()),
                (false, true) => plan.to_delete.push(name.clone()),
                (false, false) => {}
            }
        }

        let candidates: Vec<&FunctionName> = declared.union(&deployed).copied().collect();
        plan.unmatched_filters = unmatched_filters(only, candidates.iter().copied());
        plan.unmatched_filters
            .extend(unmatched_filters(except, candidates.iter().copied()));
        plan.release_names = release_names;

        tracing::debug!(
            deploy.create = plan.to_create.len(),
            deploy.update = plan.to_update.len(),
            deploy.delete = plan.to_delete.len(),
            deploy.unmatched = plan.unmatched_filters.len(),
            "Built release plan"
        );
        plan
    }

    /// True if nothing would be created, updated, or deleted
    pub fn is_empty(&self) -> bool {
        self.release_names.is_empty()
    }

    /// Fail only when filters were given and none of them matched anything
    ///
    /// Partially unmatched filters are left for the caller to report as a
    /// warning.
    pub fn check_filters(&self) -> Result<()> {
        if self.filter_count > 0 && self.unmatched_filters.len() == self.filter_count {
            return Err(FnshipError::UnmatchedFilters(self.unmatched_filters.clone()).into());
        }
        Ok(())
    }
}
