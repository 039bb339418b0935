//! Built-in defaults: the hand-maintained data of the component ecosystem.

use std::collections::BTreeMap;

use super::{
    DuplicateResolution, ExportRename, ExportSkip, LocalRoute, LocalSources, NamespaceRoute,
    PostPatch, StageConfig, StagePhase,
};

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

pub fn repos() -> Vec<String> {
    strings(&[
        "alpenglow",
        "assert",
        "axon",
        "bamboo",
        "brand",
        "chipper",
        "dot",
        "joist",
        "kite",
        "mobius",
        "nitroglycerin",
        "perennial-alias",
        "phet-core",
        "phetcommon",
        "query-string-machine",
        "scenery-phet",
        "scenery",
        "sherpa",
        "sun",
        "tambo",
        "tandem",
        "tappi",
        "twixt",
        "utterance-queue",
        "vegas",
    ])
}

pub fn source_root() -> String {
    "..".to_string()
}

pub fn dest_root() -> String {
    "src".to_string()
}

pub fn exclusions() -> Vec<String> {
    strings(&[
        "alpenglow/doc",
        "eslint.config.mjs",
        "alpenglow/tests",
        "brand/phet",
        "brand/phet-io",
        "chipper/data",
        "chipper/js/common",
        "chipper/js/data",
        "chipper/js/grunt",
        "chipper/js/phet-io",
        "chipper/js/scripts",
        "chipper/js/test",
        "chipper/templates",
        "chipper/tsconfig",
        "dot/assets",
        "dot/doc",
        "dot/examples",
        "dot/tests",
        "joist/assets",
        "joist/doc",
        "kite/doc",
        "kite/examples",
        "kite/tests",
        "perennial-alias/aider",
        "perennial-alias/bin",
        "perennial-alias/data",
        "perennial-alias/doc",
        "perennial-alias/logs",
        "perennial-alias/tsconfig",
        "perennial-alias/views",
        "perennial-alias/js/build-server",
        "perennial-alias/js/common",
        "perennial-alias/js/eslint",
        "perennial-alias/js/grunt",
        "perennial-alias/js/npm-dependencies",
        "perennial-alias/js/scripts",
        "perennial-alias/js/test",
        "perennial-alias/js/listContinuousTests.",
        "phet-types.d.ts",
        "phet-types-module.d.ts",
        "phet-core/tests",
        "scenery/assets",
        "scenery/doc",
        "scenery/examples",
        "scenery/tests",
        "scenery-phet/assets",
        "scenery-phet/util",
        "sun/doc",
        "tambo/assets",
        "tambo/css",
        "tambo/doc",
        "tambo/html",
        "tambo/resources",
        "tappi/doc",
        "vegas/assets",
        "load-unbuilt-strings.",
        "brand/adapted-from-phet/js/Brand.",
        "tappi/js/demo/patterns/PatternsScreen",
        "tappi/js/demo/patterns/view/PatternsScreenView",
        "tappi/js/view/VibrationChart",
        "tappi/js/main",
        "joist/js/simLauncher.ts",
        "chipper/js/browser/sim-tests/qunitStart.js",
        "bamboo/js/bamboo-main.",
        "joist/js/joist-main.",
        "mobius/js/mobius-main.",
        "nitroglycerin/js/nitroglycerin-main.",
        "scenery/js/scenery-main.",
        "scenery-phet/js/scenery-phet-main.",
        "sun/js/sun-main.",
        "tambo/js/tambo-main.",
        "tappi/js/tappi-main.",
        "twixt/js/twixt-main.",
        "vegas/js/vegas-main.",
        "bamboo/js/demo",
        "joist/js/demo",
        "mobius/js/demo",
        "nitroglycerin/js/demo",
        "scenery-phet/js/demo",
        "sun/js/demo",
        "tappi/js/demo",
        "tambo/js/demo",
        "twixt/js/demo",
        "vegas/js/demo",
        "axon/js/axon-tests.",
        "bamboo/js/bamboo-tests.",
        "**/bamboo/js/*Tests.ts",
        "dot/js/dot-tests.",
        "joist/js/joist-tests.",
        "kite/js/kite-tests.",
        "phet-core/js/phet-core-tests.",
        "phetcommon/js/phetcommon-tests.",
        "scenery-phet/js/scenery-phet-tests.",
        "scenery/js/scenery-tests.",
        "sun/js/sun-tests.",
        "tandem/js/tandem-tests.",
        "twixt/js/twixt-tests.",
        "dot/js/UtilsTests.",
        "chipper/js/browser/sim-tests",
        "phet-core/js/qunitStartWithoutPhetioTests.",
        "query-string-machine-tests.",
        "QueryStringMachineTests.",
        "chipper-tests.",
        "MipmapElementTests.ts",
        "PixelComparisonTestUtils.ts",
        "alpenglow/js/main.",
        "axon/js/main.",
        "bamboo/js/main.",
        "dot/js/dot-main.",
        "dot/js/main.",
        "joist/js/main.",
        "kite/js/kite-main.",
        "kite/js/main.",
        "mobius/js/main.",
        "nitroglycerin/js/main.",
        "phet-core/js/main.",
        "phetcommon/js/main.",
        "scenery-phet/js/main.",
        "scenery/js/main.",
        "sun/js/main.",
        "tambo/js/main.",
        "tandem/js/main.",
        "twixt/js/main.",
        "utterance-queue/js/main.",
        "vegas/js/main.",
    ])
}

pub fn skipped_directories() -> Vec<String> {
    strings(&["build", "dist", "node_modules"])
}

pub fn source_suffixes() -> Vec<String> {
    strings(&[".js", ".ts", ".mjs"])
}

pub fn debug_predicates() -> Vec<String> {
    strings(&["assert", "assertSlow", "affirm"])
}

pub fn debug_channels() -> Vec<String> {
    strings(&["sceneryLog"])
}

pub fn allowed_namespaces() -> Vec<String> {
    strings(&[
        // noted circularity
        "dot.Quaternion",
        // used for assignment
        "kite.svgPath",
        "kite.Edge",
        "brand.Brand",
        "joist.ScreenshotGenerator",
    ])
}

pub fn exported_namespaces() -> Vec<String> {
    strings(&["assert", "brand", "init", "scenery"])
}

pub fn namespace_identifier_overrides() -> BTreeMap<String, String> {
    [
        ("tandem", "tandemNamespace"),
        ("utterance-queue", "utteranceQueueNamespace"),
    ]
    .into_iter()
    .map(|(repo, ident)| (repo.to_string(), ident.to_string()))
    .collect()
}

pub fn string_repos() -> Vec<String> {
    strings(&["joist", "scenery-phet", "sun", "vegas"])
}

pub fn base_locale() -> String {
    "en".to_string()
}

pub fn locale_data_path() -> String {
    "../babel/localeData.json".to_string()
}

pub fn translations_root() -> String {
    "../babel".to_string()
}

pub fn namespaces() -> Vec<String> {
    strings(&[
        "adapted-from-phet",
        "alpenglow",
        "assert",
        "axon",
        "bamboo",
        "brand",
        "chipper",
        "dot",
        "init",
        "joist",
        "kite",
        "mobius",
        "nitroglycerin",
        "perennial",
        "phet-core",
        "phetcommon",
        "query-string-machine",
        "scenery",
        "scenery-phet",
        "sim",
        "splash",
        "sun",
        "tambo",
        "tandem",
        "tappi",
        "twixt",
        "utterance-queue",
        "vegas",
    ])
}

pub fn runtime_namespace() -> String {
    "sim".to_string()
}

pub fn namespace_routes() -> Vec<NamespaceRoute> {
    let route = |repo: &str, path_contains: Option<&str>, namespace: &str| NamespaceRoute {
        repo: repo.to_string(),
        path_contains: path_contains.map(String::from),
        namespace: namespace.to_string(),
    };
    vec![
        route("sun", Some("Dialog"), "sim"),
        route("joist", Some("Screen"), "sim"),
        route("joist", Some("Sim"), "sim"),
        route("perennial-alias", None, "perennial"),
        route("brand", Some("adapted-from-phet"), "adapted-from-phet"),
    ]
}

pub fn export_skips() -> Vec<ExportSkip> {
    let skip = |repo: Option<&str>, path_contains: &str| ExportSkip {
        repo: repo.map(String::from),
        path_contains: path_contains.to_string(),
    };
    vec![
        // aggregators; the barrels reference declarations directly
        skip(Some("scenery"), "imports.ts"),
        skip(Some("kite"), "imports.ts"),
        // deprecated
        skip(None, "axon/js/EnumerationDeprecatedProperty."),
        skip(None, "phet-core/js/EnumerationDeprecated."),
        skip(None, "phet-core/js/Poolable."),
        skip(None, "scenery-phet/js/SpectrumSlider."),
        skip(None, "scenery-phet/js/WavelengthSlider."),
        skip(None, "tappi/js/VibrationManageriOS."),
    ]
}

pub fn export_renames() -> Vec<ExportRename> {
    let rename = |repo: &str, from: &str, to: &str| ExportRename {
        repo: repo.to_string(),
        from: from.to_string(),
        to: to.to_string(),
    };
    vec![
        rename("kite", "Line", "KiteLine"),
        rename("dot", "Utils", "DotUtils"),
        rename("dot", "Rectangle", "DotRectangle"),
    ]
}

pub fn duplicate_resolutions() -> Vec<DuplicateResolution> {
    vec![
        // ReadOnlyProperty declares PropertyOptions and Property re-exports it
        DuplicateResolution::PreferPath {
            namespace: "axon".to_string(),
            name: "PropertyOptions".to_string(),
            path_contains: "ReadOnlyProperty".to_string(),
        },
        DuplicateResolution::PreferDefault {
            namespace: "axon".to_string(),
            name: "TRangedProperty".to_string(),
        },
        DuplicateResolution::PreferDefault {
            namespace: "joist".to_string(),
            name: "concreteRegionAndCultureProperty".to_string(),
        },
    ]
}

pub fn unwritten_barrels() -> Vec<String> {
    strings(&["splash"])
}

pub fn injection_exempt_repos() -> Vec<String> {
    strings(&["sherpa"])
}

pub fn post_patches() -> Vec<PostPatch> {
    vec![
        PostPatch {
            file: "query-string-machine/js/QueryStringMachine.js".to_string(),
            before: "}( this, () => {".to_string(),
            after: "}( self, () => {".to_string(),
        },
        PostPatch {
            file: "scenery/js/util/rich-text/richTextContentToString.ts".to_string(),
            before: "// @ts-expect-error - we should get a string from this".to_string(),
            after: String::new(),
        },
    ]
}

pub fn stages() -> Vec<StageConfig> {
    let stage = |name: &str, program: &str, args: &[&str], phase: StagePhase| StageConfig {
        name: name.to_string(),
        program: program.to_string(),
        args: strings(args),
        cwd: None,
        phase,
    };
    vec![
        stage(
            "tsc (prod)",
            "node",
            &["../perennial-alias/node_modules/typescript/bin/tsc"],
            StagePhase::Production,
        ),
        stage(
            "tsc (dev)",
            "node",
            &[
                "../perennial-alias/node_modules/typescript/bin/tsc",
                "--project",
                "tsconfig.dev.json",
            ],
            StagePhase::Development,
        ),
        stage(
            "circular dependencies",
            "npx",
            &["madge", "--circular", "--extensions", "ts", "src"],
            StagePhase::Final,
        ),
        stage("rollup", "npx", &["rollup", "-c"], StagePhase::Final),
    ]
}

pub fn local_sources() -> Option<LocalSources> {
    let route = |path_contains: &str, namespace: &str| LocalRoute {
        path_contains: path_contains.to_string(),
        namespace: namespace.to_string(),
    };
    Some(LocalSources {
        repo: "scenerystack".to_string(),
        routes: vec![
            route("assert.ts", "assert"),
            route("onReadyToLaunch.ts", "sim"),
            route("QueryStringMachine.ts", "query-string-machine"),
            route("init.ts", "init"),
            route("splash.ts", "splash"),
        ],
    })
}
