//! Fully-qualified function identities and region expansion

use crate::error::{FnshipError, Result};
use crate::triggers::Trigger;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Region used when a trigger does not list any
pub const DEFAULT_REGION: &str = "us-central1";

/// `projects/<project>/locations/<region>/functions/<id>`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FunctionName {
    project: String,
    region: String,
    id: String,
}

impl FunctionName {
    /// Build a name from its parts
    pub fn new(project: impl Into<String>, region: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            region: region.into(),
            id: id.into(),
        }
    }

    /// Owning project id
    pub fn project(&self) -> &str {
        &self.project
    }

    /// Region (location) segment
    pub fn region(&self) -> &str {
        &self.region
    }

    /// Dash-joined function id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// `projects/<project>/locations/<region>`, the parent used for creates
    pub fn parent(&self) -> String {
        format!("projects/{}/locations/{}", self.project, self.region)
    }

    /// Short human label, e.g. `myGroup-func(us-central1)`
    pub fn label(&self) -> String {
        format!("{}({})", self.id, self.region)
    }
}

impl fmt::Display for FunctionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "projects/{}/locations/{}/functions/{}",
            self.project, self.region, self.id
        )
    }
}

impl FromStr for FunctionName {
    type Err = FnshipError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('/').collect();
        match parts.as_slice() {
            ["projects", project, "locations", region, "functions", id]
                if !project.is_empty() && !region.is_empty() && !id.is_empty() =>
            {
                Ok(Self::new(*project, *region, *id))
            }
            _ => Err(FnshipError::InvalidArgument(format!(
                "'{}' is not a function resource name",
                s
            ))),
        }
    }
}

impl Serialize for FunctionName {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FunctionName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Expand triggers into one function name per region, preserving order
///
/// Triggers without regions deploy to `default_region`.
pub fn function_names(triggers: &[Trigger], project: &str, default_region: &str) -> Vec<FunctionName> {
    triggers
        .iter()
        .flat_map(|trigger| {
            let regions: Vec<&str> = if trigger.regions.is_empty() {
                vec![default_region]
            } else {
                trigger.regions.iter().map(String::as_str).collect()
            };
            regions
                .into_iter()
                .map(move |region| FunctionName::new(project, region, trigger.name.as_str()))
        })
        .collect()
}

/// Parse a list of resource names, failing on the first malformed one
pub fn parse_function_names<I, S>(names: I) -> Result<Vec<FunctionName>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names
        .into_iter()
        .map(|name| {
            name.as_ref()
                .parse::<FunctionName>()
                .map_err(anyhow::Error::from)
        })
        .collect()
}
