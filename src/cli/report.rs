//! Summary printing for the CLI.
//!
//! Kept apart from the pipeline so flatstack can be used as a library.

use std::io::{self, Write};

use colored::Colorize;

use super::run::{CommandResult, CommandSummary};
use crate::core::{PatchSummary, exports::ExportList};

/// Success mark for consistent output formatting.
pub const SUCCESS_MARK: &str = "\u{2713}"; // ✓

pub fn print(result: &CommandResult, verbose: bool) {
    print_to(result, verbose, &mut io::stdout().lock());
}

pub fn print_to<W: Write>(result: &CommandResult, verbose: bool, writer: &mut W) {
    match &result.summary {
        CommandSummary::Build(summary) => {
            let _ = writeln!(
                writer,
                "{} Wrote {}",
                SUCCESS_MARK.green(),
                summary.manifest.display()
            );
            print_patch(&summary.production, verbose, writer);
            print_patch(&summary.development, verbose, writer);
            let _ = writeln!(writer, "{} Ran {} stages", SUCCESS_MARK.green(), summary.stages_run);
        }
        CommandSummary::Patch(summary) => print_patch(summary, verbose, writer),
        CommandSummary::Manifest { path, repos } => {
            let _ = writeln!(
                writer,
                "{} Wrote {} ({} {})",
                SUCCESS_MARK.green(),
                path.display(),
                repos,
                if *repos == 1 { "repository" } else { "repositories" }
            );
        }
        CommandSummary::Exports {
            file,
            exports,
            json,
        } => {
            if *json {
                match serde_json::to_string_pretty(exports) {
                    Ok(json) => {
                        let _ = writeln!(writer, "{}", json);
                    }
                    Err(err) => log::error!("Failed to serialize exports: {}", err),
                }
            } else {
                print_exports(file, exports, writer);
            }
        }
        CommandSummary::Init { path } => {
            let _ = writeln!(
                writer,
                "{} Created {}",
                SUCCESS_MARK.green(),
                path.display()
            );
        }
    }
}

fn print_patch<W: Write>(summary: &PatchSummary, verbose: bool, writer: &mut W) {
    let label = summary.options.label();
    let _ = writeln!(
        writer,
        "{} {}",
        SUCCESS_MARK.green(),
        format!(
            "Patched {} {}{}",
            summary.stats.files_written,
            if summary.stats.files_written == 1 { "file" } else { "files" },
            if label.is_empty() {
                String::new()
            } else {
                format!(" ({})", label.trim())
            }
        )
        .green()
    );
    let _ = writeln!(writer, "  debug guards removed: {}", summary.stats.debug_guards_removed);
    let _ = writeln!(
        writer,
        "  namespace registrations removed: {}",
        summary.stats.registrations_removed
    );
    let _ = writeln!(writer, "  string keys: {}", summary.string_keys);
    let _ = writeln!(
        writer,
        "  export records: {} ({} runtime modules)",
        summary.export_records, summary.runtime_modules
    );
    let _ = writeln!(writer, "  barrels: {}", summary.barrels.join(", "));

    if verbose {
        for (name, count) in &summary.stats.heuristics_fired {
            let _ = writeln!(writer, "  {} {}: {}", "import".dimmed(), name, count);
        }
        let _ = writeln!(writer, "  excluded files: {}", summary.stats.files_excluded);
        let _ = writeln!(writer, "  local files: {}", summary.stats.local_files);
    }

    for file in &summary.missing_post_patches {
        let _ = writeln!(
            writer,
            "{} post-patch did not apply to {}",
            "warning:".bold().yellow(),
            file
        );
    }
}

fn print_exports<W: Write>(file: &str, exports: &ExportList, writer: &mut W) {
    let _ = writeln!(writer, "{}", file.bold());
    for name in &exports.values {
        let _ = writeln!(writer, "  {}  {}", "value".cyan(), name);
    }
    for name in &exports.types {
        let _ = writeln!(writer, "  {}   {}", "type".blue(), name);
    }
    for string_enum in &exports.string_enums {
        let _ = writeln!(
            writer,
            "  {}   {} = typeof {}[number]",
            "enum".magenta(),
            string_enum.type_name,
            string_enum.values_name
        );
    }
    for source in &exports.star_reexports {
        let _ = writeln!(writer, "  {}   * from {}", "star".dimmed(), source);
    }
}
