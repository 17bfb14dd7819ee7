//! Functions deploy: filters, names, planning, and the release pipeline

pub mod filter;
pub mod names;
pub mod pipeline;
pub mod planner;

pub use filter::{parse_filters, FilterGroup};
pub use names::{function_names, FunctionName, DEFAULT_REGION};
pub use pipeline::{functions_selected, DeployPipeline, PreparedDeploy, ReleaseReport};
pub use planner::{release_names, ReleasePlan};
