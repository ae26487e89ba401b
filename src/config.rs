//! Orchestrator configuration

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::CoterieError;
use crate::topology::TopologyDescriptor;

/// Everything one orchestration run needs to know
///
/// Loadable from a JSON file; every field has a default so a partial
/// file (or none at all) works.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Command sent to every pane to launch the assistant process
    pub assistant_command: String,
    /// Settle delay, in seconds, between staging instructions and
    /// committing them. A heuristic for "every assistant finished
    /// starting" - there is no readiness signal to wait on instead.
    pub settle_secs: u64,
    /// Directory holding completion markers, relative to the working
    /// directory
    pub marker_dir: PathBuf,
    /// Shared instruction document every role is pointed at
    pub instructions_path: PathBuf,
    /// Directory every pane is moved to; defaults to the process cwd
    pub work_dir: Option<PathBuf>,
    /// Topology to build
    pub topology: TopologyDescriptor,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            assistant_command: "claude".into(),
            settle_secs: 10,
            marker_dir: "coordination".into(),
            instructions_path: "instructions.md".into(),
            work_dir: None,
            topology: TopologyDescriptor::standard(),
        }
    }
}

impl OrchestratorConfig {
    /// Load from a JSON file
    pub fn from_file(path: &Path) -> Result<Self, CoterieError> {
        let raw = std::fs::read_to_string(path)?;
        serde_json::from_str(&raw)
            .map_err(|e| CoterieError::Config(format!("{}: {e}", path.display())))
    }

    /// The barrier delay as a duration
    pub fn settle(&self) -> Duration {
        Duration::from_secs(self.settle_secs)
    }

    /// The working directory panes are pointed at
    pub fn resolved_work_dir(&self) -> PathBuf {
        self.work_dir
            .clone()
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_default())
    }

    /// The marker directory resolved against the working directory
    pub fn resolved_marker_dir(&self) -> PathBuf {
        self.resolved_work_dir().join(&self.marker_dir)
    }
}
