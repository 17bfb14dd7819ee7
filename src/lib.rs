//! fnship - Serverless functions deploy library
//!
//! This library provides the core of the fnship CLI: discovering declared
//! functions, planning which deployed functions to create, update, or
//! delete, and managing the hierarchical runtime config embedded into each
//! deployment.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `triggers`: Declaration tree and trigger extraction
//! - `deploy`: Filters, function names, release planning, and the deploy pipeline
//! - `runtime_config`: Hierarchical config store, `key=value` parsing, and cloning
//! - `remote`: Remote API traits with HTTP and in-memory implementations
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//!
//! # Example
//!
//! ```
//! use fnship::deploy::{function_names, release_names, FilterGroup, DEFAULT_REGION};
//! use fnship::triggers::{extract_triggers, DeclarationBuilder, TriggerDescriptor};
//!
//! let tree = DeclarationBuilder::new()
//!     .group("api", |g| g.function("users", TriggerDescriptor::http()))
//!     .build();
//! let triggers = extract_triggers(&tree).unwrap();
//! let upload = function_names(&triggers, "demo", DEFAULT_REGION);
//!
//! let names = release_names(&upload, &[], &[FilterGroup::new(["api"])]);
//! assert_eq!(names[0].id(), "api-users");
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod deploy;
pub mod error;
pub mod fanout;
pub mod remote;
pub mod runtime_config;
pub mod triggers;

// Re-export commonly used types
pub use config::Config;
pub use deploy::{DeployPipeline, FunctionName, ReleasePlan};
pub use error::{FnshipError, Result};
pub use runtime_config::ConfigStore;
pub use triggers::{extract_triggers, DeclarationNode, Trigger};
