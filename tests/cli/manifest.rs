use anyhow::Result;
use serde_json::Value;

use crate::{CliTest, stderr, stdout};

#[test]
fn test_manifest_records_every_repo() -> Result<()> {
    let test = CliTest::with_file(
        ".flatstackrc.json",
        r#"{ "repos": ["axon", "joist"], "sourceRoot": "repos" }"#,
    )?;
    test.write_file("repos/axon/js/axon.ts", "export default 1;\n")?;
    test.write_file("repos/joist/js/joist.ts", "export default 2;\n")?;

    let output = test.run(&["manifest"])?;
    assert!(output.status.success());
    assert!(stdout(&output).contains("dependencies.json (2 repositories)"));

    let manifest: Value = serde_json::from_str(&test.read_file("dependencies.json")?)?;
    let repos: Vec<&String> = manifest.as_object().map(|m| m.keys().collect()).unwrap_or_default();
    assert_eq!(repos, vec!["axon", "joist"]);
    assert!(manifest["axon"].get("sha").is_some());
    assert!(manifest["axon"].get("branch").is_some());

    Ok(())
}

#[test]
fn test_manifest_missing_repo_fails() -> Result<()> {
    let test = CliTest::with_file(
        ".flatstackrc.json",
        r#"{ "repos": ["axon"], "sourceRoot": "repos" }"#,
    )?;

    let output = test.run(&["manifest"])?;
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("axon"));
    assert!(!test.root().join("dependencies.json").exists());

    Ok(())
}
