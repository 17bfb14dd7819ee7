//! In-process implementations of the remote APIs
//!
//! [`MemoryRuntimeConfig`] and [`MemoryFunctions`] keep all state behind a
//! mutex and record every mutating call, so tests can assert exactly which
//! remote writes an operation issued. They follow the same 404 semantics as
//! the HTTP clients.

use super::{CloudFunction, FunctionsApi, RuntimeConfigApi, Variable};
use crate::deploy::names::FunctionName;
use crate::error::{FnshipError, Result};
use crate::runtime_config::ids::{config_name, config_name_to_ids, variable_name, variable_name_to_ids};
use async_trait::async_trait;
use indexmap::IndexMap;
use std::collections::{BTreeMap, HashSet};
use std::sync::{Mutex, MutexGuard};

type Variables = IndexMap<String, String>;

#[derive(Debug, Default)]
struct ConfigState {
    projects: BTreeMap<String, IndexMap<String, Variables>>,
    writes: Vec<String>,
    failing: HashSet<String>,
}

/// Runtime config service held in memory
#[derive(Debug, Default)]
pub struct MemoryRuntimeConfig {
    state: Mutex<ConfigState>,
}

impl MemoryRuntimeConfig {
    /// An empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a variable without recording it as a write
    pub fn with_variable(self, project: &str, config: &str, path: &str, text: &str) -> Self {
        self.lock()
            .projects
            .entry(project.to_string())
            .or_default()
            .entry(config.to_string())
            .or_default()
            .insert(path.to_string(), text.to_string());
        self
    }

    /// Make writes to `variable_name` fail with a 500
    pub fn fail_writes_to(self, variable_name: &str) -> Self {
        self.lock().failing.insert(variable_name.to_string());
        self
    }

    /// Variable names written through [`RuntimeConfigApi::set_variable`], in order
    pub fn writes(&self) -> Vec<String> {
        self.lock().writes.clone()
    }

    /// Stored text of one variable
    pub fn text(&self, project: &str, config: &str, path: &str) -> Option<String> {
        self.lock()
            .projects
            .get(project)
            .and_then(|configs| configs.get(config))
            .and_then(|vars| vars.get(path))
            .cloned()
    }

    /// Config ids present in a project
    pub fn config_ids(&self, project: &str) -> Vec<String> {
        self.lock()
            .projects
            .get(project)
            .map(|configs| configs.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn lock(&self) -> MutexGuard<'_, ConfigState> {
        // A poisoned lock only means another test thread panicked mid-write.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl RuntimeConfigApi for MemoryRuntimeConfig {
    async fn list_configs(&self, project: &str) -> Result<Vec<String>> {
        Ok(self
            .config_ids(project)
            .iter()
            .map(|config| config_name(project, config))
            .collect())
    }

    async fn list_variables(&self, config: &str) -> Result<Vec<Variable>> {
        let (project, config_id) = config_name_to_ids(config)?;
        let state = self.lock();
        let vars = state
            .projects
            .get(&project)
            .and_then(|configs| configs.get(&config_id))
            .ok_or_else(|| FnshipError::NotFound(config.to_string()))?;
        Ok(vars
            .iter()
            .map(|(path, text)| Variable {
                name: variable_name(&project, &config_id, path),
                text: text.clone(),
            })
            .collect())
    }

    async fn get_variable(&self, variable: &str) -> Result<Variable> {
        let ids = variable_name_to_ids(variable)?;
        let text = self
            .text(&ids.project, &ids.config, &ids.variable)
            .ok_or_else(|| FnshipError::NotFound(variable.to_string()))?;
        Ok(Variable {
            name: variable.to_string(),
            text,
        })
    }

    async fn set_variable(&self, project: &str, config: &str, path: &str, text: &str) -> Result<()> {
        let name = variable_name(project, config, path);
        let mut state = self.lock();
        if state.failing.contains(&name) {
            return Err(FnshipError::Remote {
                status: 500,
                message: format!("injected failure writing {}", name),
            }
            .into());
        }
        state
            .projects
            .entry(project.to_string())
            .or_default()
            .entry(config.to_string())
            .or_default()
            .insert(path.to_string(), text.to_string());
        state.writes.push(name);
        Ok(())
    }

    async fn delete_variable(&self, variable: &str) -> Result<()> {
        let ids = variable_name_to_ids(variable)?;
        let mut state = self.lock();
        let vars = state
            .projects
            .get_mut(&ids.project)
            .and_then(|configs| configs.get_mut(&ids.config))
            .ok_or_else(|| FnshipError::NotFound(variable.to_string()))?;

        let nested = format!("{}/", ids.variable);
        let before = vars.len();
        vars.retain(|path, _| path != &ids.variable && !path.starts_with(&nested));
        if vars.len() == before {
            return Err(FnshipError::NotFound(variable.to_string()).into());
        }
        Ok(())
    }

    async fn delete_config(&self, project: &str, config: &str) -> Result<()> {
        self.lock()
            .projects
            .get_mut(project)
            .and_then(|configs| configs.shift_remove(config))
            .map(|_| ())
            .ok_or_else(|| FnshipError::NotFound(config_name(project, config)).into())
    }
}

#[derive(Debug, Default)]
struct FunctionsState {
    functions: Vec<CloudFunction>,
    created: Vec<FunctionName>,
    updated: Vec<FunctionName>,
    deleted: Vec<FunctionName>,
    failing: HashSet<FunctionName>,
}

/// Functions service held in memory
#[derive(Debug, Default)]
pub struct MemoryFunctions {
    state: Mutex<FunctionsState>,
}

impl MemoryFunctions {
    /// An empty inventory
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a deployed function
    pub fn with_function(self, name: FunctionName) -> Self {
        self.lock().functions.push(CloudFunction::named(name));
        self
    }

    /// Make every mutation of `name` fail with a 500
    pub fn fail_on(self, name: FunctionName) -> Self {
        self.lock().failing.insert(name);
        self
    }

    /// Names currently deployed, in inventory order
    pub fn deployed(&self) -> Vec<FunctionName> {
        self.lock().functions.iter().map(|f| f.name.clone()).collect()
    }

    /// Names created so far
    pub fn created(&self) -> Vec<FunctionName> {
        self.lock().created.clone()
    }

    /// Names updated so far
    pub fn updated(&self) -> Vec<FunctionName> {
        self.lock().updated.clone()
    }

    /// Names deleted so far
    pub fn deleted(&self) -> Vec<FunctionName> {
        self.lock().deleted.clone()
    }

    fn lock(&self) -> MutexGuard<'_, FunctionsState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check_failure(state: &FunctionsState, name: &FunctionName) -> Result<()> {
        if state.failing.contains(name) {
            return Err(FnshipError::Remote {
                status: 500,
                message: format!("injected failure for {}", name),
            }
            .into());
        }
        Ok(())
    }
}

#[async_trait]
impl FunctionsApi for MemoryFunctions {
    async fn list_functions(&self, project: &str) -> Result<Vec<CloudFunction>> {
        Ok(self
            .lock()
            .functions
            .iter()
            .filter(|f| f.name.project() == project)
            .cloned()
            .collect())
    }

    async fn create_function(&self, function: &CloudFunction) -> Result<()> {
        let mut state = self.lock();
        Self::check_failure(&state, &function.name)?;
        if state.functions.iter().any(|f| f.name == function.name) {
            return Err(FnshipError::Remote {
                status: 409,
                message: format!("{} already exists", function.name),
            }
            .into());
        }
        state.functions.push(function.clone());
        state.created.push(function.name.clone());
        Ok(())
    }

    async fn update_function(&self, function: &CloudFunction) -> Result<()> {
        let mut state = self.lock();
        Self::check_failure(&state, &function.name)?;
        let slot = state
            .functions
            .iter_mut()
            .find(|f| f.name == function.name)
            .ok_or_else(|| FnshipError::NotFound(function.name.to_string()))?;
        *slot = function.clone();
        state.updated.push(function.name.clone());
        Ok(())
    }

    async fn delete_function(&self, name: &FunctionName) -> Result<()> {
        let mut state = self.lock();
        Self::check_failure(&state, name)?;
        let before = state.functions.len();
        state.functions.retain(|f| &f.name != name);
        if state.functions.len() == before {
            return Err(FnshipError::NotFound(name.to_string()).into());
        }
        state.deleted.push(name.clone());
        Ok(())
    }
}
