//! Compiler configuration: the three name-keyed extension tables and the
//! runtime module the generated program imports.
//!
//! Distributions and parsers are data, not a plugin system: plain maps from
//! name to pure lowering functions (expression text in, expression text
//! out). Names missing from a table still compile — the generated code
//! falls back to the runtime's dispatch-by-name entry points — but the
//! generator reports a warning because it cannot verify the fallback.

use exclaim_binder::EventsMap;
use rustc_hash::FxHashMap;

/// Maps a collection expression to an index expression selecting one
/// element of it.
pub type DistributionFn = fn(&str) -> String;

pub type DistributionsMap = FxHashMap<String, DistributionFn>;

/// How `is <type>` checks are lowered for a parser.
#[derive(Copy, Clone)]
pub enum ParserTest {
    /// A direct test expression over the value.
    Test(fn(&str) -> String),
    /// No direct test exists: probe by running the parse lowering inside a
    /// try/catch.
    TryParse,
}

#[derive(Copy, Clone)]
pub struct ParserEntry {
    pub test: ParserTest,
    /// Lowering from a value expression to the parsed value; parsers
    /// without one (pure type tests) cannot appear in `parse` statements
    /// other than as checked pass-throughs.
    pub parse: Option<fn(&str) -> String>,
}

pub type ParserMap = FxHashMap<String, ParserEntry>;

pub struct CompilerOptions {
    pub events: EventsMap,
    pub distributions: DistributionsMap,
    pub parsers: ParserMap,
    /// Module specifier the generated program imports `$runtime` from.
    pub runtime_module: String,
    /// Magic constant names destructured from the host context object.
    pub global_fields: Vec<String>,
}

impl Default for CompilerOptions {
    fn default() -> CompilerOptions {
        CompilerOptions {
            events: EventsMap::default(),
            distributions: default_distributions(),
            parsers: default_parsers(),
            runtime_module: "@exclaim/runtime".to_string(),
            global_fields: Vec::new(),
        }
    }
}

pub fn default_distributions() -> DistributionsMap {
    let mut distributions = DistributionsMap::default();
    distributions.insert("first".to_string(), (|_| "0".to_string()) as DistributionFn);
    distributions.insert("last".to_string(), |x| format!("{x}.length-1"));
    distributions.insert("random".to_string(), |x| {
        format!("Math.floor(Math.random()*{x}.length)")
    });
    distributions
}

pub fn default_parsers() -> ParserMap {
    let mut parsers = ParserMap::default();
    parsers.insert(
        "json".to_string(),
        ParserEntry {
            test: ParserTest::TryParse,
            parse: Some(|x| format!("JSON.parse({x})")),
        },
    );
    parsers.insert(
        "number".to_string(),
        ParserEntry {
            test: ParserTest::Test(|x| format!("(typeof {x}==='number')")),
            parse: Some(|x| {
                format!("($x=>{{if(isNaN($x))throw new Error('Not a number!');return $x;}})(Number({x}))")
            }),
        },
    );
    parsers.insert(
        "integer".to_string(),
        ParserEntry {
            test: ParserTest::Test(|x| format!("($x=>Math.floor($x)===$x)({x})")),
            parse: Some(|x| {
                format!(
                    "($x=>{{if(Math.floor($x)!==$x)throw new Error('Not an integer!');return $x;}})(Number({x}))"
                )
            }),
        },
    );
    parsers.insert(
        "boolean".to_string(),
        ParserEntry {
            test: ParserTest::Test(|x| format!("(typeof {x}==='boolean')")),
            parse: Some(|x| format!("Boolean({x})")),
        },
    );
    parsers.insert(
        "string".to_string(),
        ParserEntry {
            test: ParserTest::Test(|x| format!("(typeof {x}==='string')")),
            parse: Some(|x| format!("String({x})")),
        },
    );
    parsers.insert(
        "function".to_string(),
        ParserEntry {
            test: ParserTest::Test(|x| format!("(typeof {x}==='function')")),
            parse: None,
        },
    );
    parsers.insert(
        "symbol".to_string(),
        ParserEntry {
            test: ParserTest::Test(|x| format!("(typeof {x}==='symbol')")),
            parse: None,
        },
    );
    parsers.insert(
        "null".to_string(),
        ParserEntry {
            test: ParserTest::Test(|x| format!("({x}===null)")),
            parse: None,
        },
    );
    parsers.insert(
        "undefined".to_string(),
        ParserEntry {
            test: ParserTest::Test(|x| format!("({x}===undefined)")),
            parse: None,
        },
    );
    parsers.insert(
        "bigint".to_string(),
        ParserEntry {
            test: ParserTest::Test(|x| format!("(typeof {x}==='bigint')")),
            parse: Some(|x| format!("BigInt({x})")),
        },
    );
    parsers
}
