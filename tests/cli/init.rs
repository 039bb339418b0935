use anyhow::{Context, Result};
use insta::assert_snapshot;
use serde_json::Value;

use crate::{CliTest, stderr, stdout};

/// Validates config file structure and default values.
fn assert_config_content(content: &str) -> Result<()> {
    let parsed: Value = serde_json::from_str(content).context("Config should be valid JSON")?;

    for field in ["repos", "namespaces", "namespaceRoutes", "stringRepos", "stages"] {
        assert!(parsed.get(field).is_some(), "Config should have '{field}' field");
    }
    assert_eq!(parsed["runtimeNamespace"], "sim");
    assert_eq!(parsed["namespaceIdentifierOverrides"]["tandem"], "tandemNamespace");

    assert!(
        content.contains("\n  \"repos\""),
        "Config should use 2-space indentation"
    );

    Ok(())
}

#[test]
fn test_init_creates_config() -> Result<()> {
    let test = CliTest::new()?;

    let output = test.run(&["init"])?;
    assert!(output.status.success());
    assert_snapshot!(stdout(&output).trim_end(), @"✓ Created .flatstackrc.json");

    assert!(test.root().join(".flatstackrc.json").exists());
    let content = test.read_file(".flatstackrc.json")?;
    assert_config_content(&content)?;

    Ok(())
}

#[test]
fn test_init_fails_if_exists() -> Result<()> {
    let test = CliTest::with_file(".flatstackrc.json", "{}")?;

    let output = test.run(&["init"])?;
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("Error: .flatstackrc.json already exists"));
    assert_eq!(test.read_file(".flatstackrc.json")?, "{}");

    Ok(())
}
