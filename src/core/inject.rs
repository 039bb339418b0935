//! Synthetic import injection.
//!
//! Source files lean on globals that the flattened package has to import
//! explicitly. Each rule of [`HEURISTICS`] looks for a usage signature in the file
//! text and, when it fires, inserts an import and/or rewrites the text. Rules are
//! evaluated in table order. Every import goes in front of the first existing
//! import, so the last rule's import ends up physically first.

use std::sync::LazyLock;

use regex::Regex;

use crate::utils::relative_import_path;

/// Inserts `line` in front of the first `import` statement, or at the top of the
/// file when there is none.
pub fn insert_import(text: &str, line: &str) -> String {
    let index = text.find("\nimport ").map(|i| i + 1).unwrap_or(0);
    let mut output = String::with_capacity(text.len() + line.len() + 1);
    output.push_str(&text[..index]);
    output.push_str(line);
    output.push('\n');
    output.push_str(&text[index..]);
    output
}

/// The file a rule is evaluated for.
#[derive(Debug, Clone, Copy)]
pub struct InjectionTarget<'a> {
    pub repo: &'a str,
    /// Path relative to the destination root, e.g. `joist/js/Sim.ts`.
    pub dest_path: &'a str,
}

impl InjectionTarget<'_> {
    /// Side-effect import of a module given relative to the destination root.
    fn side_effect_import(&self, module: &str) -> String {
        format!(
            "import '{}';",
            relative_import_path(self.dest_path, module)
        )
    }
}

/// One row of the injection table.
pub struct Heuristic {
    pub name: &'static str,
    detect: fn(&str, &InjectionTarget) -> bool,
    import: Option<fn(&InjectionTarget) -> String>,
    transform: Option<fn(&str) -> String>,
}

impl Heuristic {
    /// Applies the rule when its detector fires. Returns `None` otherwise.
    pub fn apply(&self, text: &str, target: &InjectionTarget) -> Option<String> {
        if !(self.detect)(text, target) {
            return None;
        }
        let mut output = match self.transform {
            Some(transform) => transform(text),
            None => text.to_string(),
        };
        if let Some(import) = self.import {
            output = insert_import(&output, &import(target));
        }
        Some(output)
    }
}

const INITIALIZE_GLOBALS_USAGES: &[&str] = &[
    "chipper.queryParameters",
    "chipper?.queryParameters",
    "chipper.isProduction",
    "chipper?.isProduction",
    "chipper.isApp",
    "chipper?.isApp",
    "chipper.colorProfiles",
    "chipper?.colorProfiles",
    "chipper.brand",
    "chipper?.brand",
    "chipper.mapString",
    "chipper?.mapString",
    "chipper.remapLocale",
    "chipper?.remapLocale",
    "chipper.getValidRuntimeLocale",
    "chipper?.getValidRuntimeLocale",
    "chipper.checkAndRemapLocale",
    "chipper?.checkAndRemapLocale",
    "chipper.makeEverythingSlow",
    "chipper?.makeEverythingSlow",
    "chipper.makeRandomSlowness",
    "chipper?.makeRandomSlowness",
    "chipper.reportContinuousTestResult",
    "chipper?.reportContinuousTestResult",
    "phet.log",
    "phet?.log",
];

static SHERPA_LODASH_IMPORT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"import _ from '[^'\n]*sherpa/js/lodash\.js';").unwrap());
static SHERPA_FLUENT_IMPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"import (.+) from '[^'\n]*sherpa/lib/fluent/fluent-(\w+)-[^'\n]*';").unwrap()
});
static SHERPA_BIG_IMPORT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"import Big from '[^'\n]*sherpa/lib/big-6\.2\.1\.js';").unwrap());
static GAME_UP_CAMERA_IMPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"import '[^'\n]*sherpa/lib/game-up-camera-1\.0\.0\.js';").unwrap()
});
static SEEDRANDOM_ASSERT_SUPPRESSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"// @ts-expect-error\s+assert && assert\( Math\.seedrandom").unwrap()
});
static SEEDRANDOM_FIELD_SUPPRESSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"// @ts-expect-error\s+this\.seedrandom = Math\.seedrandom").unwrap()
});
static FILE_SAVER_SUPPRESSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"// @ts-expect-error when typescript knows anything about window\. \. \.\.\s+window\.saveAs\( blob, filename \);",
    )
    .unwrap()
});
static THREE_USAGE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"THREE[^:]").unwrap());
static WINDOW_REFERENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([ (,!])window(\??[., ])").unwrap());

const FLUENT_PATTERN_IMPORT: &str = "import { Pattern } from '@fluent/bundle';";
const FLUENT_PATTERN_EXPORT: &str = "export type { Pattern as FluentPattern };";

/// The `@fluent/bundle` pattern types, written out so the package does not
/// depend on fluent for a type-only export.
const FLUENT_PATTERN_TYPES: &str = r#"export type FluentPattern = string | ComplexPattern;
type ComplexPattern = Array<PatternElement>;
type PatternElement = string | Expression;
type Expression = SelectExpression | VariableReference | TermReference | MessageReference | FunctionReference | Literal;
type SelectExpression = {
  type: "select";
  selector: Expression;
  variants: Array<Variant>;
  star: number;
};
type VariableReference = {
  type: "var";
  name: string;
};
type TermReference = {
  type: "term";
  name: string;
  attr: string | null;
  args: Array<Expression | NamedArgument>;
};
type MessageReference = {
  type: "mesg";
  name: string;
  attr: string | null;
};
type FunctionReference = {
  type: "func";
  name: string;
  args: Array<Expression | NamedArgument>;
};
type Variant = {
  key: Literal;
  value: FluentPattern;
};
type NamedArgument = {
  type: "narg";
  name: string;
  value: Literal;
};
type Literal = StringLiteral | NumberLiteral;
type StringLiteral = {
  type: "str";
  value: string;
};
type NumberLiteral = {
  type: "num";
  value: number;
  precision: number;
};
"#;

fn rewrite_himalaya(text: &str) -> String {
    text.replacen("\nimport '../../../sherpa/lib/himalaya-1.1.0.js';", "", 1)
        .replacen("\n// @ts-expect-error - Since himalaya isn't in tsconfig", "", 1)
        .replacen("\nconst himalayaVar = himalaya;", "", 1)
        .replacen(
            "\nassert && assert( himalayaVar, 'himalaya dependency needed for RichText.' );",
            "",
            1,
        )
        .replace("himalayaVar.parse", "himalayaParse")
}

fn suppress_three_attribute_errors(text: &str) -> String {
    if !text.contains(".needsUpdate = true;") {
        return text.to_string();
    }
    text.replace(
        "this.attributes.position.needsUpdate = true;",
        "// @ts-expect-error\nthis.attributes.position.needsUpdate = true;",
    )
    .replace(
        "this.attributes.normal.needsUpdate = true;",
        "// @ts-expect-error\nthis.attributes.normal.needsUpdate = true;",
    )
}

/// Injection rules in evaluation order.
pub static HEURISTICS: &[Heuristic] = &[
    Heuristic {
        name: "query-string-machine",
        detect: |text, target| {
            !target.dest_path.contains("QueryStringMachine")
                && !target.dest_path.contains("assert/js/assert")
                && text.contains("QueryStringMachine")
        },
        import: Some(|target| {
            target.side_effect_import("query-string-machine/js/QueryStringMachine.js")
        }),
        transform: None,
    },
    Heuristic {
        name: "assert",
        detect: |text, target| !target.dest_path.starts_with("assert/") && text.contains("assert"),
        import: Some(|target| target.side_effect_import("assert/js/assert.js")),
        transform: None,
    },
    Heuristic {
        name: "initialize-globals",
        detect: |text, target| {
            !target.dest_path.contains("initialize-globals")
                && INITIALIZE_GLOBALS_USAGES.iter().any(|usage| text.contains(usage))
        },
        import: Some(|target| {
            target.side_effect_import("chipper/js/browser/initialize-globals.js")
        }),
        transform: None,
    },
    Heuristic {
        name: "babel-strings",
        detect: |text, _| text.contains("phet.chipper.strings"),
        import: Some(|target| target.side_effect_import("babel/babel-strings.js")),
        transform: None,
    },
    Heuristic {
        name: "babel-metadata",
        detect: |text, _| text.contains("phet.chipper.stringMetadata"),
        import: Some(|target| target.side_effect_import("babel/babel-metadata.js")),
        transform: None,
    },
    Heuristic {
        name: "babel-string-repos",
        detect: |text, _| text.contains("phet.chipper.stringRepos"),
        import: Some(|target| target.side_effect_import("babel/babel-stringRepos.js")),
        transform: None,
    },
    Heuristic {
        name: "locale-data",
        detect: |text, _| text.contains("phet.chipper.localeData"),
        import: Some(|target| target.side_effect_import("babel/localeData.js")),
        transform: None,
    },
    Heuristic {
        name: "lodash",
        detect: |text, _| text.contains("_.") && !text.contains("import _ "),
        import: Some(|_| "import _ from 'lodash';".to_string()),
        transform: None,
    },
    Heuristic {
        name: "sherpa-lodash",
        detect: |text, _| SHERPA_LODASH_IMPORT.is_match(text),
        import: None,
        transform: Some(|text| {
            SHERPA_LODASH_IMPORT
                .replace_all(text, "import _ from 'lodash';")
                .into_owned()
        }),
    },
    Heuristic {
        name: "sherpa-fluent",
        detect: |text, _| SHERPA_FLUENT_IMPORT.is_match(text),
        import: None,
        transform: Some(|text| {
            SHERPA_FLUENT_IMPORT
                .replace_all(text, "import ${1} from '@fluent/${2}';")
                .into_owned()
        }),
    },
    Heuristic {
        name: "sherpa-big",
        detect: |text, _| SHERPA_BIG_IMPORT.is_match(text),
        import: None,
        transform: Some(|text| {
            SHERPA_BIG_IMPORT
                .replace_all(text, "import Big from 'big.js';")
                .into_owned()
        }),
    },
    Heuristic {
        name: "himalaya",
        detect: |text, _| text.contains("sherpa/lib/himalaya-1.1.0.js"),
        import: Some(|_| "import { parse as himalayaParse } from 'himalaya';".to_string()),
        transform: Some(rewrite_himalaya),
    },
    Heuristic {
        name: "game-up-camera",
        detect: |text, _| text.contains("game-up-camera"),
        import: None,
        transform: Some(|text| GAME_UP_CAMERA_IMPORT.replace_all(text, "").into_owned()),
    },
    Heuristic {
        name: "fluent-pattern",
        detect: |text, _| text.contains(FLUENT_PATTERN_IMPORT),
        import: None,
        transform: Some(|text| {
            text.replacen(FLUENT_PATTERN_IMPORT, "", 1)
                .replacen(FLUENT_PATTERN_EXPORT, FLUENT_PATTERN_TYPES, 1)
        }),
    },
    Heuristic {
        name: "jquery",
        detect: |text, _| text.contains("$("),
        import: Some(|_| "import $ from 'jquery';".to_string()),
        transform: None,
    },
    Heuristic {
        name: "paper",
        detect: |text, _| text.contains("paper."),
        import: Some(|_| "import paper from 'paper';".to_string()),
        transform: None,
    },
    Heuristic {
        name: "he",
        detect: |text, _| text.contains("he.decode"),
        import: Some(|_| "import he from 'he';".to_string()),
        transform: None,
    },
    Heuristic {
        name: "seedrandom",
        detect: |text, _| text.contains("Math.seedrandom"),
        import: Some(|_| "import 'seedrandom';".to_string()),
        transform: Some(|text| {
            let text = SEEDRANDOM_ASSERT_SUPPRESSION
                .replace_all(text, "assert && assert( Math.seedrandom");
            SEEDRANDOM_FIELD_SUPPRESSION
                .replace_all(&text, "this.seedrandom = Math.seedrandom")
                .into_owned()
        }),
    },
    Heuristic {
        name: "file-saver",
        detect: |text, _| text.contains("window.saveAs( blob, filename )"),
        import: Some(|_| "import saveAs from 'file-saver';".to_string()),
        transform: Some(|text| {
            FILE_SAVER_SUPPRESSION
                .replace_all(text, "saveAs( blob, filename );")
                .into_owned()
        }),
    },
    Heuristic {
        name: "three",
        detect: |text, _| THREE_USAGE.is_match(text),
        import: Some(|_| "import * as THREE from 'three';".to_string()),
        transform: Some(suppress_three_attribute_errors),
    },
    Heuristic {
        name: "linebreak",
        detect: |text, _| text.contains("LineBreaker"),
        import: Some(|_| "import { LineBreaker } from 'linebreak-ts';".to_string()),
        transform: Some(|text| {
            text.replacen(
                "lineBreaker[ Symbol.iterator ]",
                "// @ts-expect-error\nlineBreaker[ Symbol.iterator ]",
                1,
            )
            .replacen(
                "for ( const brk of lineBreaker ) {",
                "// @ts-expect-error\nfor ( const brk of lineBreaker ) {",
                1,
            )
        }),
    },
    Heuristic {
        name: "flatqueue",
        detect: |text, _| text.contains("FlatQueue"),
        import: Some(|_| "import FlatQueue from 'flatqueue';".to_string()),
        transform: Some(|text| {
            text.replace("new window.FlatQueue()", "new FlatQueue()").replace(
                "// @ts-expect-error because FlatQueue is not declared as a global",
                "",
            )
        }),
    },
    Heuristic {
        name: "base64-js",
        detect: |text, _| text.contains("fromByteArray("),
        import: Some(|_| {
            "import base64js from 'base64-js';const fromByteArray = base64js.fromByteArray;"
                .to_string()
        }),
        transform: None,
    },
    Heuristic {
        name: "text-encoder-lite",
        detect: |text, _| text.contains("TextEncoderLite"),
        import: Some(|_| "import TextEncoder from 'text-encoder-lite';".to_string()),
        transform: Some(|text| {
            text.replacen("// @ts-expect-error - fromByteArray Exterior lib", "", 1)
                .replacen("new TextEncoderLite", "new TextEncoder.TextEncoderLite", 1)
        }),
    },
    // Last, so it lands above every other import.
    Heuristic {
        name: "globals",
        detect: |_, _| true,
        import: Some(|target| target.side_effect_import("globals.js")),
        transform: None,
    },
];

/// Runs the injection table over a file. Returns the new text and the names of
/// the rules that fired.
pub fn apply_heuristics(text: &str, target: &InjectionTarget) -> (String, Vec<&'static str>) {
    let mut output = text.to_string();
    let mut fired = Vec::new();
    for heuristic in HEURISTICS {
        if let Some(next) = heuristic.apply(&output, target) {
            output = next;
            fired.push(heuristic.name);
        }
    }
    (output, fired)
}

/// `window` references become `self` so the output also runs in web workers.
pub fn replace_window_references(text: &str) -> String {
    WINDOW_REFERENCE
        .replace_all(text, "${1}self${2}")
        .replace("!globalThis.hasOwnProperty( 'window' )", "!globalThis.self")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const TARGET: InjectionTarget = InjectionTarget {
        repo: "joist",
        dest_path: "joist/js/Sim.ts",
    };

    #[test]
    fn test_insert_import_before_first_import() {
        let text = "// Copyright\nimport a from './a.js';\nimport b from './b.js';\n";
        assert_eq!(
            insert_import(text, "import c from './c.js';"),
            "// Copyright\nimport c from './c.js';\nimport a from './a.js';\nimport b from './b.js';\n"
        );
    }

    #[test]
    fn test_insert_import_without_imports_goes_to_top() {
        assert_eq!(insert_import("const a = 1;\n", "import 'x';"), "import 'x';\nconst a = 1;\n");
    }

    #[test]
    fn test_repeated_inserts_stack_latest_first() {
        let text = "// header\nimport a from './a.js';\n";
        let once = insert_import(text, "import 'first';");
        let twice = insert_import(&once, "import 'second';");
        assert_eq!(
            twice,
            "// header\nimport 'second';\nimport 'first';\nimport a from './a.js';\n"
        );
    }

    #[test]
    fn test_globals_import_is_physically_first() {
        let text = "// Copyright\nimport Foo from './Foo.js';\nconst q = QueryStringMachine.get( 'x' );\n_.range( 3 );\n";
        let (output, fired) = apply_heuristics(text, &TARGET);
        assert_eq!(fired, vec!["query-string-machine", "lodash", "globals"]);
        let imports: Vec<&str> = output.lines().filter(|l| l.starts_with("import")).collect();
        assert_eq!(
            imports,
            vec![
                "import '../../globals.js';",
                "import _ from 'lodash';",
                "import '../../query-string-machine/js/QueryStringMachine.js';",
                "import Foo from './Foo.js';",
            ]
        );
    }

    #[test]
    fn test_assert_module_does_not_import_itself() {
        let target = InjectionTarget {
            repo: "assert",
            dest_path: "assert/js/assert.ts",
        };
        let (_, fired) = apply_heuristics("window.assert = assert;\n", &target);
        assert!(!fired.contains(&"assert"));
    }

    #[test]
    fn test_sherpa_imports_are_rewritten() {
        let text = "import _ from '../../sherpa/js/lodash.js';\nimport { FluentBundle } from '../../sherpa/lib/fluent/fluent-bundle-0.18.0/src/bundle.js';\nimport Big from '../../sherpa/lib/big-6.2.1.js';\n";
        let (output, fired) = apply_heuristics(text, &TARGET);
        assert!(fired.contains(&"sherpa-lodash"));
        assert!(output.contains("import _ from 'lodash';"));
        assert!(output.contains("import { FluentBundle } from '@fluent/bundle';"));
        assert!(output.contains("import Big from 'big.js';"));
        assert!(!fired.contains(&"lodash"));
    }

    #[test]
    fn test_fluent_pattern_types_are_inlined() {
        let direct = "import { Pattern } from '@fluent/bundle';\n\nexport type { Pattern as FluentPattern };\n";
        let from_sherpa = "import { Pattern } from '../../sherpa/lib/fluent/fluent-bundle-0.18.0/src/bundle.js';\n\nexport type { Pattern as FluentPattern };\n";

        for text in [direct, from_sherpa] {
            let (output, fired) = apply_heuristics(text, &TARGET);
            assert!(fired.contains(&"fluent-pattern"));
            assert!(!output.contains("@fluent/bundle"));
            assert!(!output.contains("Pattern as FluentPattern"));
            assert!(output.contains("export type FluentPattern = string | ComplexPattern;"));
            assert!(output.contains("type NumberLiteral = {\n  type: \"num\";"));
        }
    }

    #[test]
    fn test_himalaya_usage_is_rewritten() {
        let text = "import x from './x.js';\nimport '../../../sherpa/lib/himalaya-1.1.0.js';\n// @ts-expect-error - Since himalaya isn't in tsconfig\nconst himalayaVar = himalaya;\nconst tree = himalayaVar.parse( html );\n";
        let (output, _) = apply_heuristics(text, &TARGET);
        assert!(output.contains("import { parse as himalayaParse } from 'himalaya';"));
        assert!(output.contains("const tree = himalayaParse( html );"));
        assert!(!output.contains("himalayaVar"));
        assert!(!output.contains("himalaya-1.1.0"));
    }

    #[test]
    fn test_window_references_become_self() {
        assert_eq!(
            replace_window_references("if ( window.foo || !window?.bar ) { f( window ); }"),
            "if ( self.foo || !self?.bar ) { f( self ); }"
        );
        assert_eq!(replace_window_references("const windowSize = 1;"), "const windowSize = 1;");
        assert_eq!(
            replace_window_references("!globalThis.hasOwnProperty( 'window' )"),
            "!globalThis.self"
        );
    }
}
