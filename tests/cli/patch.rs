use anyhow::Result;

use crate::{CliTest, stdout};

const AXON_NAMESPACE: &str = "import Namespace from '../../phet-core/js/Namespace.js';\n\nconst axon = new Namespace( 'axon' );\n\nexport default axon;\n";

const PROPERTY: &str = "import axon from './axon.js';\n\nexport default class Property {\n  public constructor( public value: number ) {\n    assert && assert( value !== undefined, 'value required' );\n  }\n}\n\naxon.register( 'Property', Property );\n";

fn config(post_patches: &str) -> String {
    config_with(r#"["axon", "sim"]"#, "null", post_patches)
}

fn config_with(namespaces: &str, local_sources: &str, post_patches: &str) -> String {
    format!(
        r#"{{
  "repos": ["axon"],
  "sourceRoot": "repos",
  "destRoot": "out",
  "stringRepos": [],
  "localeDataPath": "babel/localeData.json",
  "translationsRoot": "babel",
  "namespaces": {namespaces},
  "namespaceRoutes": [],
  "localSources": {local_sources},
  "exportSkips": [],
  "exportRenames": [],
  "duplicateResolutions": [],
  "unwrittenBarrels": [],
  "postPatches": {post_patches},
  "stages": []
}}"#
    )
}

fn project(post_patches: &str) -> Result<CliTest> {
    let test = CliTest::with_file(".flatstackrc.json", &config(post_patches))?;
    test.write_file("repos/axon/js/axon.ts", AXON_NAMESPACE)?;
    test.write_file("repos/axon/js/Property.ts", PROPERTY)?;
    test.write_file("babel/localeData.json", "{ \"en\": {} }")?;
    Ok(test)
}

#[test]
fn test_patch_production() -> Result<()> {
    let test = project("[]")?;

    let output = test.run(&["patch"])?;
    assert_eq!(output.status.code(), Some(0));
    let out = stdout(&output);
    assert!(out.contains("Patched 2 files (no-assert no-namespace)"), "{out}");
    assert!(out.contains("debug guards removed: 1"), "{out}");

    let property = test.read_file("out/axon/js/Property.ts")?;
    assert!(!property.contains("assert && assert("));
    assert!(!property.contains("axon.register"));

    let barrel = test.read_file("out/axon.ts")?;
    assert!(barrel.contains("export { default as Property } from './axon/js/Property.js';"));

    Ok(())
}

#[test]
fn test_patch_keeps_guards_when_asked() -> Result<()> {
    let test = project("[]")?;

    let output = test.run(&["patch", "--keep-assertions", "--keep-namespaces"])?;
    assert_eq!(output.status.code(), Some(0));
    assert!(stdout(&output).contains("Patched 2 files\n"));

    let property = test.read_file("out/axon/js/Property.ts")?;
    assert!(property.contains("assert && assert( value !== undefined, 'value required' );"));
    assert!(property.contains("axon.register( 'Property', Property );"));

    Ok(())
}

#[test]
fn test_patch_reports_missing_post_patch() -> Result<()> {
    let test = project(r#"[{ "file": "axon/js/Gone.js", "before": "this", "after": "self" }]"#)?;

    let output = test.run(&["patch"])?;
    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).contains("post-patch did not apply to axon/js/Gone.js"));

    Ok(())
}

#[test]
fn test_patch_rejects_unknown_namespace() -> Result<()> {
    let test = CliTest::with_file(
        ".flatstackrc.json",
        r#"{ "namespaces": ["axon"], "runtimeNamespace": "sim" }"#,
    )?;

    let output = test.run(&["patch"])?;
    assert_eq!(output.status.code(), Some(2));
    assert!(
        crate::stderr(&output).contains("'runtimeNamespace' \"sim\" is not listed in 'namespaces'")
    );

    Ok(())
}

const LOCAL_ROUTES: &str = r#"{
    "repo": "scenerystack",
    "routes": [
      { "pathContains": "init.ts", "namespace": "init" },
      { "pathContains": "splash.ts", "namespace": "splash" }
    ]
  }"#;

fn local_project() -> Result<CliTest> {
    let test = CliTest::with_file(
        ".flatstackrc.json",
        &config_with(r#"["axon", "sim", "init", "splash"]"#, LOCAL_ROUTES, "[]"),
    )?;
    test.write_file("repos/axon/js/axon.ts", AXON_NAMESPACE)?;
    test.write_file("repos/axon/js/Property.ts", PROPERTY)?;
    test.write_file("babel/localeData.json", "{ \"en\": {} }")?;
    test.write_file("out/scenerystack/init.ts", "export const initialized = true;\n")?;
    test.write_file("out/scenerystack/splash.ts", "export const splashReady = true;\n")?;
    Ok(test)
}

#[test]
fn test_patch_exports_local_sources() -> Result<()> {
    let test = local_project()?;

    let output = test.run(&["patch"])?;
    assert_eq!(output.status.code(), Some(0), "{}", crate::stderr(&output));

    let init = test.read_file("out/init.ts")?;
    assert!(init.contains("from './scenerystack/init.js';"), "{init}");
    assert!(init.contains("initialized"));

    let splash = test.read_file("out/splash.ts")?;
    assert!(splash.contains("from './scenerystack/splash.js';"), "{splash}");
    assert!(splash.contains("splashReady"));

    assert_eq!(
        test.read_file("out/scenerystack/init.ts")?,
        "export const initialized = true;\n"
    );

    Ok(())
}

#[test]
fn test_patch_rejects_unmapped_local_source() -> Result<()> {
    let test = local_project()?;
    test.write_file("out/scenerystack/extra.ts", "export const extra = 1;\n")?;

    let output = test.run(&["patch"])?;
    assert_eq!(output.status.code(), Some(2));
    assert!(
        crate::stderr(&output)
            .contains("scenerystack/extra.ts in scenerystack does not have an explicit export mapping")
    );

    Ok(())
}
