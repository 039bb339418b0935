use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use walkdir::WalkDir;

use crate::config::ExclusionMatcher;
use crate::errors::BuildError;
use crate::utils::to_slash;

/// A source file selected for copying.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub repo: String,
    /// Absolute path of the input file.
    pub path: PathBuf,
    /// `repo/js/Foo.ts`; also the path under the destination root.
    pub repo_path: String,
}

/// Result of scanning one repository.
#[derive(Debug, Default)]
pub struct ScanResult {
    pub files: Vec<SourceFile>,
    pub excluded_count: usize,
}

fn has_source_suffix(name: &str, suffixes: &[String]) -> bool {
    suffixes.iter().any(|suffix| name.ends_with(suffix.as_str()))
}

/// Lists the files of `<source_root>/<repo>` that get copied, in path order.
///
/// Directories are pruned by name; files need a source suffix and must not match
/// an exclusion.
pub fn scan_repo(
    source_root: &Path,
    repo: &str,
    exclusions: &ExclusionMatcher,
    suffixes: &[String],
) -> Result<ScanResult> {
    let repo_dir = source_root.join(repo);
    if !repo_dir.is_dir() {
        return Err(BuildError::RepoNotFound {
            repo: repo.to_string(),
            path: repo_dir,
        }
        .into());
    }

    let mut result = ScanResult::default();
    let walker = WalkDir::new(&repo_dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0
                || !entry.file_type().is_dir()
                || exclusions.should_descend(&entry.file_name().to_string_lossy())
        });

    for entry in walker {
        let entry = entry.with_context(|| format!("Cannot access path in {}", repo))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if !has_source_suffix(&name, suffixes) {
            continue;
        }

        let relative = entry.path().strip_prefix(source_root).with_context(|| {
            format!("{:?} is outside of {:?}", entry.path(), source_root)
        })?;
        let repo_path = to_slash(relative);
        if exclusions.is_excluded(&repo_path) {
            log::trace!("excluded {}", repo_path);
            result.excluded_count += 1;
            continue;
        }

        result.files.push(SourceFile {
            repo: repo.to_string(),
            path: entry.path().to_path_buf(),
            repo_path,
        });
    }

    Ok(result)
}
