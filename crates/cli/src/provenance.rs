//! Run records written next to the arrays a command produces.
//!
//! `spins.npy` gets `spins.provenance.json` holding the command, its typed
//! parameters, the shape of every array written, and the library revision.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// One `.npy` array on disk.
#[derive(Debug, Serialize)]
pub struct Artifact {
    pub path: PathBuf,
    pub shape: [usize; 2],
}

impl Artifact {
    /// `shape` as returned by `DMatrix::shape`.
    pub fn new(path: &Path, (rows, cols): (usize, usize)) -> Self {
        Self {
            path: path.to_path_buf(),
            shape: [rows, cols],
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RunRecord<P: Serialize> {
    pub command: &'static str,
    pub version: &'static str,
    pub code_rev: String,
    pub params: P,
    pub artifacts: Vec<Artifact>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl<P: Serialize> RunRecord<P> {
    pub fn new(command: &'static str, params: P) -> Self {
        Self {
            command,
            version: brainspin::VERSION,
            code_rev: code_rev(),
            params,
            artifacts: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn artifact(mut self, artifact: Artifact) -> Self {
        self.artifacts.push(artifact);
        self
    }

    /// Writes the record beside the first artifact and returns its path.
    pub fn save(&self) -> Result<PathBuf> {
        let primary = self
            .artifacts
            .first()
            .context("run record has no artifact to sit next to")?;
        let path = sidecar_path(&primary.path);
        let text = serde_json::to_string_pretty(self)?;
        fs::write(&path, text).with_context(|| format!("writing {}", path.display()))?;
        Ok(path)
    }
}

fn sidecar_path(artifact: &Path) -> PathBuf {
    let stem = artifact.file_stem().and_then(|s| s.to_str()).unwrap_or("array");
    artifact.with_file_name(format!("{stem}.provenance.json"))
}

/// Commit the binary was built from: `GIT_COMMIT` at build or run time, else
/// `git rev-parse HEAD`, else `"unknown"`.
pub fn code_rev() -> String {
    let from_env = option_env!("GIT_COMMIT")
        .map(str::to_string)
        .or_else(|| std::env::var("GIT_COMMIT").ok())
        .filter(|rev| !rev.is_empty());
    if let Some(rev) = from_env {
        return rev;
    }
    match Command::new("git").args(["rev-parse", "HEAD"]).output() {
        Ok(out) if out.status.success() => String::from_utf8_lossy(&out.stdout).trim().to_string(),
        _ => "unknown".to_string(),
    }
}
