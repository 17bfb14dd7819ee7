//! Deploy filter parsing and matching
//!
//! Users scope a deploy with `--only functions:groupA.myFunc,hosting` style
//! expressions. Entries targeting `functions` become [`FilterGroup`]s, each an
//! ordered list of name segments that must prefix a function's dash-split id.

use super::names::FunctionName;
use crate::error::{FnshipError, Result};
use crate::triggers::NAME_SEPARATOR;
use std::fmt;

/// Target prefix that scopes a filter entry to functions
pub const FUNCTIONS_TARGET: &str = "functions";

/// A parsed function filter, e.g. `["groupA", "myFunc"]`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FilterGroup(Vec<String>);

impl FilterGroup {
    /// Build a filter from its segments
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// Parse a dotted filter such as `groupA.myFunc`
    pub fn from_dotted(filter: &str) -> Self {
        Self::new(filter.split('.'))
    }

    /// The filter's name segments
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// True if the segments prefix (or equal) the dash-split function id
    pub fn matches(&self, function_id: &str) -> bool {
        let parts: Vec<&str> = function_id.split(NAME_SEPARATOR).collect();
        self.0.len() <= parts.len() && self.0.iter().zip(parts.iter()).all(|(a, b)| a == b)
    }
}

impl fmt::Display for FilterGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

/// Parse a raw `--only`/`--except` string into function filter groups
///
/// Entries are comma-separated; only `functions:<dotted>` entries produce
/// groups. A bare `functions` entry targets all functions and yields none.
///
/// # Examples
///
/// ```
/// use fnship::deploy::filter::{parse_filters, FilterGroup};
///
/// let groups = parse_filters("functions:a,functions:b.c,hosting");
/// assert_eq!(groups, vec![FilterGroup::new(["a"]), FilterGroup::new(["b", "c"])]);
/// ```
pub fn parse_filters(raw: &str) -> Vec<FilterGroup> {
    raw.split(',')
        .map(str::trim)
        .filter_map(|entry| {
            let (target, rest) = entry.split_once(':')?;
            if target == FUNCTIONS_TARGET && !rest.is_empty() {
                Some(FilterGroup::from_dotted(rest))
            } else {
                None
            }
        })
        .collect()
}

/// Reject `functions:` entries with nothing after the colon
///
/// Such an entry would parse to no group and select every function.
pub fn ensure_named_filters(raw: &str) -> Result<()> {
    let blank = raw.split(',').map(str::trim).any(|entry| {
        entry
            .split_once(':')
            .map(|(target, rest)| target == FUNCTIONS_TARGET && rest.trim().is_empty())
            .unwrap_or(false)
    });
    if blank {
        return Err(FnshipError::InvalidArgument(format!(
            "Filter \"{}\" has an empty function name. Use \"{}\" to target all functions.",
            raw, FUNCTIONS_TARGET
        ))
        .into());
    }
    Ok(())
}

/// True if a raw target list mentions functions at all
///
/// Matches either a bare `functions` entry or any `functions:<name>` entry.
pub fn targets_functions(raw: &str) -> bool {
    raw.split(',').map(str::trim).any(|entry| {
        entry == FUNCTIONS_TARGET
            || entry
                .split_once(':')
                .map(|(target, _)| target == FUNCTIONS_TARGET)
                .unwrap_or(false)
    })
}

/// True if the name matches any of `groups`; an empty list matches everything
pub fn function_matches_any_group(name: &FunctionName, groups: &[FilterGroup]) -> bool {
    groups.is_empty() || groups.iter().any(|group| group.matches(name.id()))
}

/// True if no region filter is set or the function lives in `region`
pub fn matches_region(name: &FunctionName, region: Option<&str>) -> bool {
    region.map(|r| name.region() == r).unwrap_or(true)
}

/// Names matching any filter group AND the optional region, in input order
pub fn select_functions<'a, I>(names: I, groups: &[FilterGroup], region: Option<&str>) -> Vec<FunctionName>
where
    I: IntoIterator<Item = &'a FunctionName>,
{
    names
        .into_iter()
        .filter(|name| function_matches_any_group(name, groups) && matches_region(name, region))
        .cloned()
        .collect()
}

/// Filters that match none of `names`, rendered in dotted form
pub fn unmatched_filters<'a, I>(groups: &[FilterGroup], names: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a FunctionName> + Clone,
{
    groups
        .iter()
        .filter(|group| !names.clone().into_iter().any(|name| group.matches(name.id())))
        .map(ToString::to_string)
        .collect()
}
