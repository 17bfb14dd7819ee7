/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint.

It exposes three top-level command modules:

- `deploy`: Plan and release declared functions
- `functions`: List and delete deployed functions
- `config`: Read, write, and clone runtime config

Each handler has a thin entry point that builds HTTP clients from
[`Config`], and an inner function that works against the remote traits so
it can be exercised with the in-memory backends.
*/

use crate::config::Config;
use crate::error::Result;
use crate::remote::{FunctionsApi, HttpFunctions, HttpRuntimeConfig};
use crate::runtime_config::ConfigStore;
use std::sync::Arc;

pub mod config;
pub mod deploy;
pub mod functions;

/// Runtime config store backed by the configured HTTP API
pub fn config_store(config: &Config) -> Result<ConfigStore> {
    let api = HttpRuntimeConfig::new(&config.runtime_config.api_base, &config.http)?;
    Ok(ConfigStore::new(Arc::new(api))
        .with_max_concurrency(config.runtime_config.max_concurrent_requests))
}

/// Functions client backed by the configured HTTP API
pub fn functions_api(config: &Config) -> Result<Arc<dyn FunctionsApi>> {
    Ok(Arc::new(HttpFunctions::new(
        &config.functions.api_base,
        &config.http,
    )?))
}
