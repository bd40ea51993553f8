use std::fs::create_dir_all;
use std::path::{Path, PathBuf};
use std::process::Command;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::output::write_json_atomic;

use super::RegistryResult;

/// Metadata captured at run start.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub schema_version: String,
    pub schema_path: PathBuf,
    pub target: String,
    pub code_targets: Vec<String>,
    pub run_dir: PathBuf,
}

/// JSON config written to each run directory.
#[derive(Debug, Serialize)]
struct RunConfig<'a> {
    run_id: &'a str,
    started_at: String,
    schema_version: &'a str,
    schema_path: String,
    target: &'a str,
    code_targets: &'a [String],
    git: GitInfo,
}

/// Git metadata for reproducibility.
#[derive(Debug, Serialize)]
struct GitInfo {
    commit: Option<String>,
    dirty: Option<bool>,
}

/// Files written for one code target.
#[derive(Debug, Clone, Serialize)]
pub struct TargetSummary {
    pub name: String,
    pub output_dir: String,
    pub files: usize,
    pub bytes: u64,
}

/// Outcome of a generation run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: String,
    pub status: &'static str,
    pub duration_ms: u64,
    pub dry_run: bool,
    pub targets: Vec<TargetSummary>,
}

/// Create `<run_dir>/<timestamp>__run_<id>/` and record the run config.
pub fn start_run(ctx: &RunContext) -> RegistryResult<PathBuf> {
    let timestamp = ctx.started_at.format("%Y-%m-%dT%H-%M-%SZ").to_string();
    let run_root = ctx
        .run_dir
        .join(format!("{timestamp}__run_{}", ctx.run_id));
    create_dir_all(&run_root)?;

    let config = RunConfig {
        run_id: &ctx.run_id,
        started_at: ctx.started_at.to_rfc3339(),
        schema_version: &ctx.schema_version,
        schema_path: ctx.schema_path.display().to_string(),
        target: &ctx.target,
        code_targets: &ctx.code_targets,
        git: collect_git_info(),
    };
    write_json_atomic(&run_root.join("config.json"), &config)?;

    Ok(run_root)
}

pub fn write_summary(run_root: &Path, summary: &RunSummary) -> RegistryResult<()> {
    write_json_atomic(&run_root.join("summary.json"), summary)?;
    Ok(())
}

fn collect_git_info() -> GitInfo {
    let commit = Command::new("git")
        .args(["rev-parse", "HEAD"])
        .output()
        .ok()
        .filter(|output| output.status.success())
        .map(|output| String::from_utf8_lossy(&output.stdout).trim().to_string())
        .filter(|value| !value.is_empty());

    let dirty = Command::new("git")
        .args(["status", "--porcelain"])
        .output()
        .ok()
        .filter(|output| output.status.success())
        .map(|output| !output.stdout.is_empty());

    GitInfo { commit, dirty }
}
