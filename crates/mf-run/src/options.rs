//! Run options.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{RunError, RunResult};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunOptions {
    /// Log engine version and per-step progress at `info` instead of `debug`.
    pub verbose: bool,
    /// Write every discovered variable address to this file, one per line.
    pub address_dump: Option<PathBuf>,
}

impl RunOptions {
    pub fn verbose() -> Self {
        Self {
            verbose: true,
            ..Self::default()
        }
    }

    pub fn with_address_dump(mut self, path: impl Into<PathBuf>) -> Self {
        self.address_dump = Some(path.into());
        self
    }

    pub fn from_yaml_str(text: &str) -> RunResult<Self> {
        serde_yaml::from_str(text).map_err(|e| RunError::InvalidOptions {
            what: e.to_string(),
        })
    }

    pub fn load_yaml(path: &std::path::Path) -> RunResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| RunError::InvalidOptions {
            what: format!("{}: {e}", path.display()),
        })?;
        Self::from_yaml_str(&content)
    }
}
