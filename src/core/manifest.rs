//! `dependencies.json`: the revision and branch of every source repository.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    process::Command,
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::errors::BuildError;

pub const MANIFEST_FILE_NAME: &str = "dependencies.json";

/// Version-control state of one repository. Both fields are null when the
/// directory is not a git checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoRevision {
    pub sha: Option<String>,
    pub branch: Option<String>,
}

pub type Manifest = BTreeMap<String, RepoRevision>;

/// Runs git in `cwd` and returns trimmed stdout, or `None` if git fails.
fn git_output(args: &[&str], cwd: &Path) -> Option<String> {
    let output = Command::new("git").args(args).current_dir(cwd).output().ok()?;
    if !output.status.success() {
        log::debug!(
            "git {} failed in {:?}: {}",
            args.join(" "),
            cwd,
            String::from_utf8_lossy(&output.stderr).trim()
        );
        return None;
    }
    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!stdout.is_empty()).then_some(stdout)
}

pub fn repo_revision(repo: &str, repo_dir: &Path) -> Result<RepoRevision> {
    if !repo_dir.is_dir() {
        return Err(BuildError::RepoNotFound {
            repo: repo.to_string(),
            path: repo_dir.to_path_buf(),
        }
        .into());
    }
    let revision = RepoRevision {
        sha: git_output(&["rev-parse", "HEAD"], repo_dir),
        branch: git_output(&["rev-parse", "--abbrev-ref", "HEAD"], repo_dir),
    };
    if revision.sha.is_none() {
        log::info!("{} has no git metadata, recording null revision", repo);
    }
    Ok(revision)
}

pub fn collect_manifest(repos: &[String], source_root: &Path) -> Result<Manifest> {
    repos
        .iter()
        .map(|repo| Ok((repo.clone(), repo_revision(repo, &source_root.join(repo))?)))
        .collect()
}

/// Writes the manifest as two-space indented JSON into `dir`.
pub fn write_manifest(manifest: &Manifest, dir: &Path) -> Result<PathBuf> {
    let path = dir.join(MANIFEST_FILE_NAME);
    let content = serde_json::to_string_pretty(manifest)?;
    fs::write(&path, content).with_context(|| format!("Failed to write manifest: {:?}", path))?;
    Ok(path)
}
