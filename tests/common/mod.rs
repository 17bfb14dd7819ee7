use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use fnship::remote::MemoryRuntimeConfig;
use fnship::runtime_config::ConfigStore;
use tempfile::TempDir;

#[allow(dead_code)]
pub fn temp_file(name: &str, contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let path = temp_dir.path().join(name);
    fs::write(&path, contents).expect("failed to write file");
    (temp_dir, path)
}

#[allow(dead_code)]
pub fn memory_store(memory: MemoryRuntimeConfig) -> (ConfigStore, Arc<MemoryRuntimeConfig>) {
    let memory = Arc::new(memory);
    (ConfigStore::new(memory.clone()), memory)
}
