//! Dispatches parsed arguments to the pipeline.

use std::{
    env, fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};

use super::args::{Arguments, Command, CommonArgs, ExportsCommand};
use crate::config::{
    CONFIG_FILE_NAME, Config, default_config_json, find_config_file, load_config, resolve,
};
use crate::core::{
    BuildOptions, BuildSummary, PatchSummary, copy_and_patch,
    exports::{ExportList, extract_exports},
    manifest::{collect_manifest, write_manifest},
    run_build,
};
use crate::utils::to_slash;

#[derive(Debug)]
pub enum CommandSummary {
    Build(BuildSummary),
    Patch(PatchSummary),
    Manifest { path: PathBuf, repos: usize },
    Exports { file: String, exports: ExportList, json: bool },
    Init { path: PathBuf },
}

/// Result of running a flatstack command.
#[derive(Debug)]
pub struct CommandResult {
    pub summary: CommandSummary,
    /// Non-fatal problems (post-patches that did not apply).
    pub problem_count: usize,
}

impl CommandResult {
    fn clean(summary: CommandSummary) -> Self {
        Self {
            summary,
            problem_count: 0,
        }
    }
}

/// Loaded configuration with CLI overrides applied, and the directory relative
/// paths resolve against.
struct Project {
    config: Config,
    base: PathBuf,
}

fn load_project(common: &CommonArgs) -> Result<Project> {
    let cwd = env::current_dir().context("Failed to read the current directory")?;
    let base = find_config_file(&cwd)
        .and_then(|path| path.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| cwd.clone());

    let loaded = load_config(&cwd)?;
    if !loaded.from_file {
        log::debug!("no {} found, using defaults", CONFIG_FILE_NAME);
    }
    let mut config = loaded.config;
    // CLI paths are relative to where the command runs.
    if let Some(source_root) = &common.source_root {
        config.source_root = to_slash(&cwd.join(source_root));
    }
    if let Some(dest_root) = &common.dest_root {
        config.dest_root = to_slash(&cwd.join(dest_root));
    }
    config.validate()?;

    Ok(Project { config, base })
}

pub fn run(Arguments { command }: Arguments) -> Result<CommandResult> {
    match command {
        Some(Command::Build(cmd)) => {
            let project = load_project(&cmd.common)?;
            let summary = run_build(&project.config, &project.base, cmd.skip_stages)?;
            let problem_count = summary.production.missing_post_patches.len()
                + summary.development.missing_post_patches.len();
            Ok(CommandResult {
                summary: CommandSummary::Build(summary),
                problem_count,
            })
        }
        Some(Command::Patch(cmd)) => {
            let project = load_project(&cmd.common)?;
            let options = BuildOptions {
                remove_assertions: !cmd.keep_assertions,
                remove_namespacing: !cmd.keep_namespaces,
            };
            let summary = copy_and_patch(&project.config, &project.base, options)?;
            let problem_count = summary.missing_post_patches.len();
            Ok(CommandResult {
                summary: CommandSummary::Patch(summary),
                problem_count,
            })
        }
        Some(Command::Manifest(cmd)) => {
            let project = load_project(&cmd.common)?;
            let source_root = resolve(&project.base, &project.config.source_root);
            let manifest = collect_manifest(&project.config.repos, &source_root)?;
            let path = write_manifest(&manifest, &project.base)?;
            Ok(CommandResult::clean(CommandSummary::Manifest {
                path,
                repos: manifest.len(),
            }))
        }
        Some(Command::Exports(cmd)) => exports(cmd),
        Some(Command::Init) => {
            let path = init()?;
            Ok(CommandResult::clean(CommandSummary::Init { path }))
        }
        None => bail!("No command provided. Use --help to see available commands."),
    }
}

fn exports(cmd: ExportsCommand) -> Result<CommandResult> {
    let text = fs::read_to_string(&cmd.file)
        .with_context(|| format!("Failed to read {:?}", cmd.file))?;
    let file = to_slash(&cmd.file);
    let exports = extract_exports(&text, &file)?;
    Ok(CommandResult::clean(CommandSummary::Exports {
        file,
        exports,
        json: cmd.json,
    }))
}

fn init() -> Result<PathBuf> {
    let config_path = Path::new(CONFIG_FILE_NAME);
    if config_path.exists() {
        bail!("{} already exists", CONFIG_FILE_NAME);
    }

    fs::write(config_path, default_config_json()?)?;
    Ok(config_path.to_path_buf())
}
