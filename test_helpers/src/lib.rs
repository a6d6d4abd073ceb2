//! Test helpers for the ITC workspace
//!
//! This crate provides common utilities for tests that need the bundled
//! reference data or a scratch directory for artifacts.

use once_cell::sync::Lazy;
use std::env;
use std::path::{Path, PathBuf};

/// Error type for test helper operations
#[derive(thiserror::Error, Debug)]
pub enum TestHelperError {
    #[error("Failed to find project root: {0}")]
    ProjectRootNotFound(String),
}

/// Returns the path to the workspace root directory.
///
/// Walks up from the current directory until it finds a Cargo.toml that
/// declares `[workspace]`.
pub fn find_project_root() -> Result<PathBuf, TestHelperError> {
    let mut current_dir = env::current_dir().map_err(|e| {
        TestHelperError::ProjectRootNotFound(format!("Failed to get current directory: {}", e))
    })?;

    loop {
        let cargo_toml = current_dir.join("Cargo.toml");
        if cargo_toml.exists() {
            let content = std::fs::read_to_string(&cargo_toml).map_err(|e| {
                TestHelperError::ProjectRootNotFound(format!("Failed to read Cargo.toml: {}", e))
            })?;

            if content.contains("[workspace]") {
                return Ok(current_dir);
            }
        }

        if !current_dir.pop() {
            break;
        }
    }

    Err(TestHelperError::ProjectRootNotFound(
        "Workspace root not found".to_string(),
    ))
}

static PROJECT_ROOT: Lazy<PathBuf> =
    Lazy::new(|| find_project_root().expect("Failed to find project root directory"));

/// Directory holding the bundled tabulated resources.
pub fn data_dir() -> PathBuf {
    PROJECT_ROOT.join("data")
}

/// Path of a bundled resource, relative to [`data_dir`].
pub fn data_path<P: AsRef<Path>>(path: P) -> PathBuf {
    data_dir().join(path)
}

/// Returns the directory for test artifacts, creating it if needed.
pub fn get_output_dir() -> PathBuf {
    let output_dir = PROJECT_ROOT.join("test_output");

    if !output_dir.exists() {
        std::fs::create_dir_all(&output_dir).expect("Failed to create output directory");
    }

    output_dir
}

/// Returns a path within the output directory.
pub fn output_path<P: AsRef<Path>>(path: P) -> PathBuf {
    get_output_dir().join(path)
}
