use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::burndown::DEFAULT_DONE_STATUSES;
use crate::error::ErrorCode;
use crate::log::log_path;
use crate::observe::ITEMS_FILE;

/// Name of the optional project config file.
pub const CONFIG_FILE: &str = ".sprintlog.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub burndown: BurndownConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_snapshots_dir")]
    pub snapshots: PathBuf,
    #[serde(default = "default_input_dir")]
    pub input_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            snapshots: default_snapshots_dir(),
            input_dir: default_input_dir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BurndownConfig {
    #[serde(default = "default_done_statuses")]
    pub done_statuses: Vec<String>,
}

impl Default for BurndownConfig {
    fn default() -> Self {
        Self {
            done_statuses: default_done_statuses(),
        }
    }
}

/// Settings for one run after flags, environment, and file are combined.
#[derive(Debug, Clone)]
pub struct EffectiveConfig {
    pub project: ProjectConfig,
    pub sprint: String,
    pub snapshot_dir: PathBuf,
}

impl EffectiveConfig {
    /// Log file of the configured sprint.
    #[must_use]
    pub fn log_path(&self) -> PathBuf {
        log_path(&self.snapshot_dir, &self.sprint)
    }

    /// Board export inside the input directory.
    #[must_use]
    pub fn items_path(&self) -> PathBuf {
        self.project.paths.input_dir.join(ITEMS_FILE)
    }
}

/// Load `.sprintlog.toml` from `project_root`, or defaults if absent.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_project_config(project_root: &Path) -> Result<ProjectConfig> {
    let path = project_root.join(CONFIG_FILE);
    if !path.exists() {
        return Ok(ProjectConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<ProjectConfig>(&content).with_context(|| {
        format!(
            "{}: Failed to parse {}",
            ErrorCode::ConfigParseError.code(),
            path.display()
        )
    })
}

/// Resolve the run configuration.
///
/// Sprint name: `cli_sprint` > `SPRINT_NAME`. Snapshot directory:
/// `cli_snapshots` > `SNAPSHOT_PATH` > config file > `./snapshots`.
///
/// # Errors
///
/// Returns an error if the config file is invalid or no sprint name is set.
pub fn resolve_config(
    project_root: &Path,
    cli_sprint: Option<&str>,
    cli_snapshots: Option<&Path>,
) -> Result<EffectiveConfig> {
    let project = load_project_config(project_root)?;
    resolve_with(
        project,
        cli_sprint,
        cli_snapshots,
        env::var("SPRINT_NAME").ok(),
        env::var("SNAPSHOT_PATH").ok(),
    )
}

fn resolve_with(
    project: ProjectConfig,
    cli_sprint: Option<&str>,
    cli_snapshots: Option<&Path>,
    env_sprint: Option<String>,
    env_snapshots: Option<String>,
) -> Result<EffectiveConfig> {
    let sprint = cli_sprint
        .map(str::to_string)
        .or(env_sprint)
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .with_context(|| {
            let code = ErrorCode::SprintNameMissing;
            format!(
                "{}: {}. {}",
                code.code(),
                code.message(),
                code.hint().unwrap_or_default()
            )
        })?;

    let snapshot_dir = cli_snapshots
        .map(Path::to_path_buf)
        .or_else(|| env_snapshots.filter(|p| !p.is_empty()).map(PathBuf::from))
        .unwrap_or_else(|| project.paths.snapshots.clone());

    Ok(EffectiveConfig {
        project,
        sprint,
        snapshot_dir,
    })
}

fn default_snapshots_dir() -> PathBuf {
    PathBuf::from("./snapshots")
}

fn default_input_dir() -> PathBuf {
    PathBuf::from(".tmp")
}

fn default_done_statuses() -> Vec<String> {
    DEFAULT_DONE_STATUSES.iter().map(ToString::to_string).collect()
}
