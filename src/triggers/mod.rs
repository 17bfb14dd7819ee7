//! Function declarations and trigger extraction
//!
//! A deployable source exports a tree of function declarations. Groups nest
//! other declarations; leaves are functions carrying a [`TriggerDescriptor`].
//! [`extract_triggers`] flattens the tree into [`Trigger`] records whose names
//! join the enclosing group keys with `-`.
//!
//! # Example
//!
//! ```
//! use fnship::triggers::{extract_triggers, DeclarationBuilder, TriggerDescriptor};
//!
//! let tree = DeclarationBuilder::new()
//!     .function("httpsAction", TriggerDescriptor::http())
//!     .group("nested", |g| g.function("dbAction", TriggerDescriptor::event()))
//!     .build();
//!
//! let triggers = extract_triggers(&tree).unwrap();
//! assert_eq!(triggers[1].name, "nested-dbAction");
//! assert_eq!(triggers[1].entry_point, "nested.dbAction");
//! ```

use crate::error::{FnshipError, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize, Serializer};

pub mod manifest;

pub use manifest::{load_manifest, parse_manifest};

/// Separator joining group keys into a function name
pub const NAME_SEPARATOR: char = '-';

/// Separator used in the source-addressable entry point
pub const ENTRY_POINT_SEPARATOR: char = '.';

/// Kind of event that invokes a function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerKind {
    /// Invoked by HTTPS requests
    Http,
    /// Invoked by a platform event (database write, pubsub message, ...)
    Event,
}

/// Deployment metadata attached to a declared function
///
/// Kind-specific fields (event type, resource, schedule, ...) are kept
/// verbatim in `fields` and passed through to the functions API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerDescriptor {
    /// Trigger kind
    pub kind: TriggerKind,

    /// Regions to deploy to; empty means the default region
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub regions: Vec<String>,

    /// Kind-specific payload
    #[serde(flatten)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

impl TriggerDescriptor {
    /// Descriptor for an HTTPS function
    pub fn http() -> Self {
        Self {
            kind: TriggerKind::Http,
            regions: Vec::new(),
            fields: serde_json::Map::new(),
        }
    }

    /// Descriptor for an event-driven function
    pub fn event() -> Self {
        Self {
            kind: TriggerKind::Event,
            regions: Vec::new(),
            fields: serde_json::Map::new(),
        }
    }

    /// Restrict the function to the given regions, in order
    pub fn with_regions<I, S>(mut self, regions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.regions = regions.into_iter().map(Into::into).collect();
        self
    }

    /// Attach a kind-specific field
    pub fn with_field(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.fields.insert(key.into(), value);
        self
    }
}

/// A node in the declaration tree
#[derive(Debug, Clone, PartialEq)]
pub enum DeclarationNode {
    /// A deployable function
    Function(TriggerDescriptor),
    /// A named grouping of further declarations, in declaration order
    Group(IndexMap<String, DeclarationNode>),
}

impl DeclarationNode {
    /// An empty group
    pub fn empty() -> Self {
        DeclarationNode::Group(IndexMap::new())
    }

    /// Number of function leaves below this node
    pub fn function_count(&self) -> usize {
        match self {
            DeclarationNode::Function(_) => 1,
            DeclarationNode::Group(children) => {
                children.values().map(DeclarationNode::function_count).sum()
            }
        }
    }
}

/// Registers functions and groups explicitly, in declaration order
///
/// Names are not validated here; [`extract_triggers`] rejects invalid keys
/// before anything is deployed.
#[derive(Debug, Default)]
pub struct DeclarationBuilder {
    children: IndexMap<String, DeclarationNode>,
}

impl DeclarationBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a function under `name`
    pub fn function(mut self, name: impl Into<String>, descriptor: TriggerDescriptor) -> Self {
        self.children
            .insert(name.into(), DeclarationNode::Function(descriptor));
        self
    }

    /// Declare a group under `name`, populated by `build`
    pub fn group<F>(mut self, name: impl Into<String>, build: F) -> Self
    where
        F: FnOnce(DeclarationBuilder) -> DeclarationBuilder,
    {
        let group = build(DeclarationBuilder::new()).build();
        self.children.insert(name.into(), group);
        self
    }

    /// Finish the tree
    pub fn build(self) -> DeclarationNode {
        DeclarationNode::Group(self.children)
    }
}

/// A declared function flattened out of the declaration tree
///
/// Serialized with the regions at the top level only; the descriptor is
/// written as its kind and kind-specific fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Trigger {
    /// Group keys and function key joined with `-`
    pub name: String,

    /// `name` with `-` replaced by `.`
    pub entry_point: String,

    /// Regions to deploy to; empty means the default region
    #[serde(default)]
    pub regions: Vec<String>,

    /// Descriptor exactly as declared
    #[serde(serialize_with = "serialize_payload")]
    pub descriptor: TriggerDescriptor,
}

fn serialize_payload<S: Serializer>(
    descriptor: &TriggerDescriptor,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    #[derive(Serialize)]
    struct Payload<'a> {
        kind: TriggerKind,
        #[serde(flatten)]
        fields: &'a serde_json::Map<String, serde_json::Value>,
    }

    Payload {
        kind: descriptor.kind,
        fields: &descriptor.fields,
    }
    .serialize(serializer)
}

/// Flatten a declaration tree into triggers, depth-first in declaration order
///
/// # Errors
///
/// Returns [`FnshipError::Declaration`] if any group or function key
/// contains `-`. No partial list is returned.
pub fn extract_triggers(root: &DeclarationNode) -> Result<Vec<Trigger>> {
    let mut triggers = Vec::new();
    match root {
        DeclarationNode::Group(children) => walk(children, "", &mut triggers)?,
        DeclarationNode::Function(_) => {
            return Err(FnshipError::Declaration(
                "the declaration root must be a group of functions".to_string(),
            )
            .into())
        }
    }
    tracing::debug!(count = triggers.len(), "Extracted triggers");
    Ok(triggers)
}

fn walk(
    children: &IndexMap<String, DeclarationNode>,
    prefix: &str,
    out: &mut Vec<Trigger>,
) -> Result<()> {
    for (key, node) in children {
        if key.contains(NAME_SEPARATOR) {
            let what = match node {
                DeclarationNode::Function(_) => "Function",
                DeclarationNode::Group(_) => "Group",
            };
            return Err(FnshipError::Declaration(format!(
                "{} name \"{}\" is invalid. Names cannot contain dashes.",
                what, key
            ))
            .into());
        }

        let name = format!("{}{}", prefix, key);
        match node {
            DeclarationNode::Function(descriptor) => out.push(Trigger {
                entry_point: name.replace(NAME_SEPARATOR, &ENTRY_POINT_SEPARATOR.to_string()),
                regions: descriptor.regions.clone(),
                descriptor: descriptor.clone(),
                name,
            }),
            DeclarationNode::Group(grandchildren) => {
                let nested = format!("{}{}", name, NAME_SEPARATOR);
                walk(grandchildren, &nested, out)?;
            }
        }
    }
    Ok(())
}
