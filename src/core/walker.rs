//! Copy-and-patch: walks every repository, rewrites each source file into the
//! destination tree and then emits the files derived from what the walk saw.
//!
//! Per file, in order: import injection, `window` -> `self`, debug stripping,
//! namespace stripping, string rewriting, write, export extraction. After the
//! walk: export resolution, string modules, aggregates, bridges, barrels,
//! post-patches and the removed-namespace verification.

use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::{
    config::{Config, PostPatch, StagePhase, resolve},
    core::{
        context::{BuildContext, BuildOptions, PatchSummary},
        exports::{ExportRouter, extract_exports},
        inject::{InjectionTarget, apply_heuristics, replace_window_references},
        manifest::{collect_manifest, write_manifest},
        parsers::locale::load_locale_data,
        scanner::{SourceFile, scan_repo},
        stages::run_phase,
        strings::{
            StringSources, generate_string_modules, regenerate_aggregate_modules,
            rewrite_string_references, write_bridge_modules,
        },
        strip::{strip_debug_code, strip_namespace_registrations},
        verify::verify_removed_namespaces,
    },
};

const AGGREGATE_SUFFIX: &str = "Strings.ts";
const AGGREGATE_MARKER: &str = "Strings = getStringModule(";

fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {:?}", parent))?;
    }
    fs::write(path, content).with_context(|| format!("Failed to write file: {:?}", path))
}

/// Applies the text rewrites to one file and returns its final text.
pub fn patch_file(context: &mut BuildContext, repo: &str, dest_path: &str, text: &str) -> Result<String> {
    let config = context.config;
    let mut text = text.to_string();

    if !config.injection_exempt_repos.iter().any(|r| r == repo) {
        let (injected, fired) = apply_heuristics(&text, &InjectionTarget { repo, dest_path });
        for name in fired {
            log::trace!("{}: {}", dest_path, name);
            *context
                .stats
                .heuristics_fired
                .entry(name.to_string())
                .or_default() += 1;
        }
        text = injected;
    }
    text = replace_window_references(&text);

    if context.options.remove_assertions {
        let result = strip_debug_code(&text, dest_path, &context.predicates)?;
        context.stats.debug_guards_removed += result.removed;
        text = result.text;
    }

    if context.options.remove_namespacing {
        let namespace = config.namespace_identifier(repo);
        let result = strip_namespace_registrations(
            &text,
            dest_path,
            &namespace,
            &config.allowed_namespaces,
        )?;
        context.stats.registrations_removed += result.removed_patterns.len();
        context.removed_patterns.extend(result.removed_patterns);
        text = result.text;
    }

    for string_repo in &config.repos {
        text = rewrite_string_references(&text, string_repo, dest_path, &mut context.string_usages)?;
    }

    Ok(text)
}

/// Patches one file and routes its exports. `write` is false for local sources,
/// which are read in place.
fn process_file(context: &mut BuildContext, file: &SourceFile, write: bool) -> Result<()> {
    let dest_path = file.repo_path.as_str();
    let original = fs::read_to_string(&file.path)
        .with_context(|| format!("Failed to read source file: {:?}", file.path))?;

    if dest_path.ends_with(AGGREGATE_SUFFIX) && original.contains(AGGREGATE_MARKER) {
        context.aggregate_modules.push(dest_path.to_string());
    }

    let text = patch_file(context, &file.repo, dest_path, &original)?;
    if write {
        write_file(&context.paths.dest_root.join(dest_path), &text)?;
        context.stats.files_written += 1;
    } else {
        context.stats.local_files += 1;
    }

    if text.contains("export") {
        let exports = extract_exports(&text, dest_path)?;
        let router = ExportRouter::new(context.config);
        for (namespace, record) in router.records(&file.repo, dest_path, &exports)? {
            context.buckets.add(&file.repo, &namespace, record)?;
        }
    }

    context.written.insert(dest_path.to_string(), text);
    Ok(())
}

fn walk_repo(context: &mut BuildContext, repo: &str) -> Result<()> {
    let dest_repo = context.paths.dest_root.join(repo);
    if dest_repo.exists() {
        fs::remove_dir_all(&dest_repo)
            .with_context(|| format!("Failed to wipe {:?}", dest_repo))?;
    }

    let scan = scan_repo(
        &context.paths.source_root,
        repo,
        &context.exclusions,
        &context.config.source_suffixes,
    )?;
    context.stats.files_excluded += scan.excluded_count;
    log::debug!("{}: {} files", repo, scan.files.len());

    for file in &scan.files {
        process_file(context, file, true)?;
    }
    Ok(())
}

/// Processes the sources under `<destRoot>/<repo>` without copying them.
fn walk_local_sources(context: &mut BuildContext) -> Result<()> {
    let config = context.config;
    let Some(local) = &config.local_sources else {
        return Ok(());
    };
    let dir = context.paths.dest_root.join(&local.repo);
    if !dir.is_dir() {
        log::warn!("local sources {:?} not found, skipping", dir);
        return Ok(());
    }

    let scan = scan_repo(
        &context.paths.dest_root,
        &local.repo,
        &context.exclusions,
        &config.source_suffixes,
    )?;
    log::debug!("{} (local): {} files", local.repo, scan.files.len());

    for file in &scan.files {
        process_file(context, file, false)?;
    }
    Ok(())
}

/// Locale codes and data for the bridge modules. Without a locale data file only
/// the base locale is known.
fn locale_data(context: &BuildContext) -> Result<(Vec<String>, Value)> {
    let path = &context.paths.locale_data;
    if path.exists() {
        return load_locale_data(path);
    }
    log::warn!("locale data {:?} not found, using {} only", path, context.config.base_locale);
    let base_locale = context.config.base_locale.clone();
    let mut data = Map::new();
    data.insert(base_locale.clone(), Value::Object(Map::new()));
    Ok((vec![base_locale], Value::Object(data)))
}

/// Applies configured textual patches to written files. Patches whose target or
/// `before` text is missing are logged and returned.
pub fn apply_post_patches(
    patches: &[PostPatch],
    dest_root: &Path,
    written: &mut HashMap<String, String>,
) -> Result<Vec<String>> {
    let mut missing = Vec::new();
    for patch in patches {
        let path = dest_root.join(&patch.file);
        let Ok(content) = fs::read_to_string(&path) else {
            log::error!("post-patch target {} not found", patch.file);
            missing.push(patch.file.clone());
            continue;
        };
        if !content.contains(&patch.before) {
            log::error!("post-patch text not found in {}: {:?}", patch.file, patch.before);
            missing.push(patch.file.clone());
            continue;
        }
        let patched = content.replacen(&patch.before, &patch.after, 1);
        fs::write(&path, &patched)
            .with_context(|| format!("Failed to write file: {:?}", path))?;
        if let Some(text) = written.get_mut(&patch.file) {
            *text = patched;
        }
    }
    Ok(missing)
}

fn finish(mut context: BuildContext) -> Result<PatchSummary> {
    let config = context.config;

    let tainted = context
        .buckets
        .resolve(&config.duplicate_resolutions, &context.written)?;
    log::debug!("{} modules require the runtime namespace", tainted.len());

    let (locales, locale_data) = locale_data(&context)?;
    let sources = StringSources {
        source_root: &context.paths.source_root,
        translations_root: &context.paths.translations_root,
        base_locale: &config.base_locale,
        locales: &locales,
    };
    let string_modules =
        generate_string_modules(&mut context.string_usages, &sources, &context.paths.dest_root)?;
    log::debug!("wrote {} string modules", string_modules);

    regenerate_aggregate_modules(
        &context.aggregate_modules,
        &context.string_usages,
        |repo| config.namespace_identifier(repo),
        &context.paths.dest_root,
    )?;
    write_bridge_modules(
        &context.paths.dest_root,
        &context.paths.source_root,
        &config.string_repos,
        &locale_data,
    )?;

    let barrels = context.buckets.write_barrels(
        &context.paths.dest_root,
        &config.unwritten_barrels,
        &config.exported_namespaces,
    )?;

    let missing_post_patches =
        apply_post_patches(&config.post_patches, &context.paths.dest_root, &mut context.written)?;

    verify_removed_namespaces(&context.written, &context.removed_patterns)?;

    Ok(PatchSummary {
        options: context.options,
        stats: context.stats,
        removed_patterns: context.removed_patterns.len(),
        string_keys: context.string_usages.len(),
        aggregate_modules: context.aggregate_modules.len(),
        export_records: context.buckets.len(),
        runtime_modules: tainted.len(),
        barrels: barrels
            .iter()
            .filter_map(|path| path.file_name())
            .map(|name| name.to_string_lossy().to_string())
            .collect(),
        missing_post_patches,
    })
}

/// One full copy-and-patch run for an output variant.
pub fn copy_and_patch(config: &Config, base: &Path, options: BuildOptions) -> Result<PatchSummary> {
    log::info!("copying and patching{}", options.label());
    let mut context = BuildContext::new(config, base, options)?;
    for repo in &config.repos {
        walk_repo(&mut context, repo)?;
    }
    walk_local_sources(&mut context)?;
    finish(context)
}

/// Outcome of the full build.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildSummary {
    pub manifest: PathBuf,
    pub production: PatchSummary,
    pub development: PatchSummary,
    pub stages_run: usize,
}

/// Manifest, production variant, development variant, with the configured stages
/// after each. The development variant is written last so the tree left in place
/// keeps its assertions.
pub fn run_build(config: &Config, base: &Path, skip_stages: bool) -> Result<BuildSummary> {
    let manifest = collect_manifest(&config.repos, &resolve(base, &config.source_root))?;
    let manifest = write_manifest(&manifest, base)?;

    let mut stages_run = 0;
    let mut run_stages = |phase: StagePhase| -> Result<()> {
        if !skip_stages {
            stages_run += run_phase(&config.stages, phase, base)?.len();
        }
        Ok(())
    };

    let production = copy_and_patch(config, base, BuildOptions::production())?;
    run_stages(StagePhase::Production)?;
    let development = copy_and_patch(config, base, BuildOptions::development())?;
    run_stages(StagePhase::Development)?;
    run_stages(StagePhase::Final)?;

    Ok(BuildSummary {
        manifest,
        production,
        development,
        stages_run,
    })
}

#[cfg(test)]
mod tests {
    use tempfile::{TempDir, tempdir};

    use super::*;
    use crate::config::{LocalRoute, LocalSources, NamespaceRoute};
    use crate::errors::BuildError;

    struct Fixture {
        dir: TempDir,
        config: Config,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = tempdir().unwrap();
            let config = Config {
                repos: vec!["axon".to_string(), "joist".to_string()],
                source_root: "repos".to_string(),
                dest_root: "out".to_string(),
                exclusions: vec!["Tests.".to_string()],
                string_repos: vec!["joist".to_string()],
                locale_data_path: "babel/localeData.json".to_string(),
                translations_root: "babel".to_string(),
                namespaces: vec!["axon".to_string(), "joist".to_string(), "sim".to_string()],
                namespace_routes: vec![NamespaceRoute {
                    repo: "joist".to_string(),
                    path_contains: Some("Sim".to_string()),
                    namespace: "sim".to_string(),
                }],
                export_skips: Vec::new(),
                export_renames: Vec::new(),
                duplicate_resolutions: Vec::new(),
                unwritten_barrels: Vec::new(),
                post_patches: Vec::new(),
                stages: Vec::new(),
                ..Config::default()
            };
            let fixture = Self { dir, config };

            fixture.write(
                "repos/axon/js/axon.ts",
                "import Namespace from '../../phet-core/js/Namespace.js';\n\nconst axon = new Namespace( 'axon' );\n\nexport default axon;\n",
            );
            fixture.write(
                "repos/axon/js/Property.ts",
                "import axon from './axon.js';\n\nexport default class Property {\n  public constructor( public value: number ) {\n    assert && assert( value !== undefined, 'value required' );\n  }\n}\n\naxon.register( 'Property', Property );\n",
            );
            fixture.write("repos/axon/js/PropertyTests.ts", "export const skipped = 1;\n");
            fixture.write(
                "repos/joist/js/joist.ts",
                "import Namespace from '../../phet-core/js/Namespace.js';\n\nconst joist = new Namespace( 'joist' );\n\nexport default joist;\n",
            );
            fixture.write(
                "repos/joist/js/JoistStrings.ts",
                "import getStringModule from '../../chipper/js/browser/getStringModule.js';\nimport joist from './joist.js';\n\nconst JoistStrings = getStringModule( 'JOIST' );\n\njoist.register( 'JoistStrings', JoistStrings );\n\nexport default JoistStrings;\n",
            );
            fixture.write(
                "repos/joist/js/Sim.ts",
                "import JoistStrings from './JoistStrings.js';\nimport joist from './joist.js';\n\nexport default class Sim {\n  public readonly title = JoistStrings.title.value;\n}\n\njoist.register( 'Sim', Sim );\n",
            );
            fixture.write(
                "repos/joist/joist-strings_en.json",
                "{ \"title\": { \"value\": \"Title\" } }",
            );
            fixture.write(
                "babel/joist/joist-strings_fr.json",
                "{ \"title\": { \"value\": \"Titre\" } }",
            );
            fixture.write("babel/localeData.json", "{ \"en\": {}, \"fr\": {} }");
            fixture
        }

        fn write(&self, path: &str, content: &str) {
            write_file(&self.dir.path().join(path), content).unwrap();
        }

        fn read(&self, path: &str) -> String {
            fs::read_to_string(self.dir.path().join("out").join(path)).unwrap()
        }

        fn patch(&self, options: BuildOptions) -> Result<PatchSummary> {
            copy_and_patch(&self.config, self.dir.path(), options)
        }
    }

    #[test]
    fn test_production_variant() {
        let fixture = Fixture::new();
        let summary = fixture.patch(BuildOptions::production()).unwrap();

        let property = fixture.read("axon/js/Property.ts");
        assert!(!property.contains("assert && assert("));
        assert!(!property.contains("axon.register"));
        assert!(property.contains("import '../../globals.js';"));
        assert!(!fixture.dir.path().join("out/axon/js/PropertyTests.ts").exists());

        let sim = fixture.read("joist/js/Sim.ts");
        assert!(sim.contains("import { string_joist_title_StringProperty } from './strings/title.js';"));
        assert!(sim.contains("public readonly title = string_joist_title_StringProperty.value;"));
        assert!(!sim.contains("JoistStrings"));

        let title = fixture.read("joist/js/strings/title.ts");
        assert!(title.contains("\"JOIST/title\""));
        assert!(title.contains("\"fr\": \"Titre\""));

        let aggregate = fixture.read("joist/js/JoistStrings.ts");
        assert!(aggregate.contains("string_joist_title_StringProperty"));
        assert!(aggregate.contains("joist.register( 'JoistStrings', JoistStrings );"));

        let axon = fixture.read("axon.ts");
        assert!(axon.contains("export { default as Property } from './axon/js/Property.js';"));
        assert!(!axon.contains("as axon"));
        assert!(fixture.read("sim.ts").contains("export { default as Sim } from './joist/js/Sim.js';"));
        assert!(fixture.dir.path().join("out/babel/babel-strings.js").exists());

        assert_eq!(summary.stats.files_written, 5);
        assert_eq!(summary.stats.files_excluded, 1);
        assert_eq!(summary.stats.debug_guards_removed, 1);
        assert_eq!(summary.removed_patterns, 3);
        assert_eq!(summary.string_keys, 1);
        assert_eq!(summary.aggregate_modules, 1);
    }

    #[test]
    fn test_development_variant_keeps_guards_and_registrations() {
        let fixture = Fixture::new();
        let summary = fixture.patch(BuildOptions::development()).unwrap();

        let property = fixture.read("axon/js/Property.ts");
        assert!(property.contains("assert && assert( value !== undefined, 'value required' );"));
        assert!(property.contains("axon.register( 'Property', Property );"));
        assert_eq!(summary.removed_patterns, 0);
        assert_eq!(summary.stats.debug_guards_removed, 0);
    }

    #[test]
    fn test_destination_is_wiped_per_repository() {
        let fixture = Fixture::new();
        fixture.write("out/axon/js/Stale.ts", "export const stale = 1;\n");
        fixture.patch(BuildOptions::development()).unwrap();
        assert!(!fixture.dir.path().join("out/axon/js/Stale.ts").exists());
    }

    fn with_local_sources(mut fixture: Fixture) -> Fixture {
        fixture.config.local_sources = Some(LocalSources {
            repo: "stack".to_string(),
            routes: vec![LocalRoute {
                path_contains: "init.ts".to_string(),
                namespace: "sim".to_string(),
            }],
        });
        fixture
    }

    #[test]
    fn test_local_sources_are_exported_in_place() {
        let fixture = with_local_sources(Fixture::new());
        let init = "export default function init() {\n  assert && assert( true );\n}\n";
        fixture.write("out/stack/init.ts", init);
        fixture.write("out/stack/README.md", "not a source file\n");

        let summary = fixture.patch(BuildOptions::production()).unwrap();

        assert_eq!(fixture.read("stack/init.ts"), init);
        assert_eq!(summary.stats.local_files, 1);
        assert_eq!(summary.stats.files_written, 5);
        assert!(fixture.read("sim.ts").contains("export { default as init } from './stack/init.js';"));
    }

    #[test]
    fn test_unmapped_local_source_is_fatal() {
        let fixture = with_local_sources(Fixture::new());
        fixture.write("out/stack/init.ts", "export default function init() {}\n");
        fixture.write("out/stack/extra.ts", "export const extra = 1;\n");

        let err = fixture.patch(BuildOptions::development()).unwrap_err();
        match err.downcast_ref::<BuildError>() {
            Some(BuildError::UnmappedLocalSource { repo, path }) => {
                assert_eq!(repo, "stack");
                assert_eq!(path, "stack/extra.ts");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_missing_local_sources_are_skipped() {
        let fixture = with_local_sources(Fixture::new());
        let summary = fixture.patch(BuildOptions::development()).unwrap();
        assert_eq!(summary.stats.local_files, 0);
    }

    #[test]
    fn test_reading_a_removed_registration_is_fatal() {
        let fixture = Fixture::new();
        fixture.write(
            "repos/axon/js/Uses.ts",
            "import axon from './axon.js';\n\nexport const lookup = () => axon.Property;\n",
        );
        let err = fixture.patch(BuildOptions::production()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BuildError>(),
            Some(BuildError::NamespacePatternUsed { .. })
        ));
    }

    #[test]
    fn test_duplicate_export_is_fatal() {
        let fixture = Fixture::new();
        fixture.write("repos/axon/js/A.ts", "export const shared = 1;\n");
        fixture.write("repos/joist/js/B.ts", "export const shared = 2;\n");
        let err = fixture.patch(BuildOptions::development()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BuildError>(),
            Some(BuildError::DuplicateExport { .. })
        ));
    }

    #[test]
    fn test_missing_base_string_is_fatal() {
        let fixture = Fixture::new();
        fixture.write("repos/joist/joist-strings_en.json", "{}");
        let err = fixture.patch(BuildOptions::development()).unwrap_err();
        match err.downcast_ref::<BuildError>() {
            Some(BuildError::MissingBaseString { repo, key, .. }) => {
                assert_eq!(repo, "joist");
                assert_eq!(key, "title");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_post_patches() {
        let dir = tempdir().unwrap();
        write_file(&dir.path().join("a/js/A.js"), "}( this, () => {\n").unwrap();
        let patches = vec![
            PostPatch {
                file: "a/js/A.js".to_string(),
                before: "}( this, () => {".to_string(),
                after: "}( self, () => {".to_string(),
            },
            PostPatch {
                file: "a/js/Missing.js".to_string(),
                before: "x".to_string(),
                after: "y".to_string(),
            },
        ];
        let mut written = HashMap::new();
        written.insert("a/js/A.js".to_string(), "}( this, () => {\n".to_string());

        let missing = apply_post_patches(&patches, dir.path(), &mut written).unwrap();
        assert_eq!(missing, vec!["a/js/Missing.js"]);
        assert_eq!(written["a/js/A.js"], "}( self, () => {\n");
        assert_eq!(
            fs::read_to_string(dir.path().join("a/js/A.js")).unwrap(),
            "}( self, () => {\n"
        );
    }
}
