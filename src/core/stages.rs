//! External build stages (type checker, bundler, cycle detector).
//!
//! Stages run one at a time and are awaited before the next starts. A nonzero
//! exit ends the build.

use std::{
    path::Path,
    process::{Command, Stdio},
};

use anyhow::{Context, Result};

use crate::config::{StageConfig, StagePhase, resolve};
use crate::errors::BuildError;

/// Captured result of a finished stage.
#[derive(Debug, Clone)]
pub struct StageOutput {
    pub name: String,
    pub stdout: String,
    pub stderr: String,
}

pub fn run_stage(stage: &StageConfig, base: &Path) -> Result<StageOutput> {
    let cwd = stage
        .cwd
        .as_deref()
        .map(|cwd| resolve(base, cwd))
        .unwrap_or_else(|| base.to_path_buf());
    log::info!("running {}: {} {}", stage.name, stage.program, stage.args.join(" "));

    let output = Command::new(&stage.program)
        .args(&stage.args)
        .current_dir(&cwd)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .with_context(|| format!("Failed to run stage {} in {:?}", stage.name, cwd))?;

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    for line in stdout.lines().filter(|l| !l.trim().is_empty()) {
        log::info!("[{}] {}", stage.name, line);
    }
    for line in stderr.lines().filter(|l| !l.trim().is_empty()) {
        log::warn!("[{}] {}", stage.name, line);
    }

    if !output.status.success() {
        return Err(BuildError::StageFailed {
            stage: stage.name.clone(),
            code: output.status.code(),
        }
        .into());
    }

    Ok(StageOutput {
        name: stage.name.clone(),
        stdout,
        stderr,
    })
}

/// Runs the configured stages of one phase, in order.
pub fn run_phase(stages: &[StageConfig], phase: StagePhase, base: &Path) -> Result<Vec<StageOutput>> {
    stages
        .iter()
        .filter(|stage| stage.phase == phase)
        .map(|stage| run_stage(stage, base))
        .collect()
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    fn stage(name: &str, program: &str, args: &[&str], phase: StagePhase) -> StageConfig {
        StageConfig {
            name: name.to_string(),
            program: program.to_string(),
            args: args.iter().map(|s| s.to_string()).collect(),
            cwd: None,
            phase,
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_stage_output_is_captured() {
        let dir = tempdir().unwrap();
        let output = run_stage(
            &stage("echo", "sh", &["-c", "echo hello"], StagePhase::Final),
            dir.path(),
        )
        .unwrap();
        assert_eq!(output.stdout.trim(), "hello");
    }

    #[cfg(unix)]
    #[test]
    fn test_nonzero_exit_is_fatal() {
        let dir = tempdir().unwrap();
        let err = run_stage(
            &stage("fail", "sh", &["-c", "exit 3"], StagePhase::Final),
            dir.path(),
        )
        .unwrap_err();
        match err.downcast_ref::<BuildError>() {
            Some(BuildError::StageFailed { stage, code }) => {
                assert_eq!(stage, "fail");
                assert_eq!(*code, Some(3));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_phase_filter() {
        let dir = tempdir().unwrap();
        let stages = vec![
            stage("prod", "sh", &["-c", "exit 0"], StagePhase::Production),
            stage("dev", "sh", &["-c", "exit 1"], StagePhase::Development),
        ];
        let outputs = run_phase(&stages, StagePhase::Production, dir.path()).unwrap();
        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs[0].name, "prod");
    }
}
