use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Where serial records live and where fresh scopes start counting.
///
/// Deserializes from e.g. `{"directory": "/var/lib/moadian"}`; `start`
/// defaults to 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerialStoreConfig {
    /// Directory holding `serial_<SCOPE>.json` and `serial_<SCOPE>.lock`.
    pub directory: PathBuf,
    /// First serial issued for a scope with no record yet.
    #[serde(default = "default_start")]
    pub start: u64,
}

fn default_start() -> u64 {
    1
}

impl SerialStoreConfig {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            start: default_start(),
        }
    }

    pub fn with_start(mut self, start: u64) -> Self {
        self.start = start;
        self
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }
}
