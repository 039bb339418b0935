use anyhow::Result;
use insta::assert_snapshot;
use serde_json::Value;

use crate::{CliTest, stdout};

const MODULE: &str = "// Copyright\n\nimport Node from './Node.js';\n\nexport const AlignValues = [ 'left', 'right' ] as const;\nexport type Align = typeof AlignValues[number];\n\nexport type PanelOptions = { align?: Align };\n\nexport default class Panel extends Node {}\n\nexport * from './PanelHelpers.js';\n";

#[test]
fn test_exports_listing() -> Result<()> {
    let test = CliTest::with_file("sun/js/Panel.ts", MODULE)?;

    let output = test.run(&["exports", "sun/js/Panel.ts"])?;
    assert!(output.status.success());
    assert_snapshot!(stdout(&output).trim_end(), @r"
    sun/js/Panel.ts
      value  AlignValues
      value  default
      type   Align
      type   PanelOptions
      enum   Align = typeof AlignValues[number]
      star   * from ./PanelHelpers.js
    ");

    Ok(())
}

#[test]
fn test_exports_json() -> Result<()> {
    let test = CliTest::with_file("sun/js/Panel.ts", MODULE)?;

    let output = test.run(&["exports", "sun/js/Panel.ts", "--json"])?;
    assert!(output.status.success());

    let json: Value = serde_json::from_str(&stdout(&output))?;
    assert_eq!(json["values"], serde_json::json!(["AlignValues", "default"]));
    assert_eq!(json["types"], serde_json::json!(["Align", "PanelOptions"]));
    assert_eq!(json["stringEnums"][0]["valuesName"], "AlignValues");
    assert_eq!(json["starReexports"], serde_json::json!(["./PanelHelpers.js"]));

    Ok(())
}

#[test]
fn test_exports_parse_error() -> Result<()> {
    let test = CliTest::with_file("Broken.ts", "export const = ;\n")?;

    let output = test.run(&["exports", "Broken.ts"])?;
    assert_eq!(output.status.code(), Some(2));

    Ok(())
}
