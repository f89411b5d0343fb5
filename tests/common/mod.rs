#![allow(clippy::uninlined_format_args)]

use parsley::{MatchError, Options, Rule, Sequence, Value, Variables};

/// Test that \p source fails to compile.
#[track_caller]
pub fn test_compile_fails(source: &str) -> MatchError {
    match Rule::from_source(source) {
        Ok(rule) => panic!("Rule should not have compiled: {}\n{}", source, rule),
        Err(err) => err,
    }
}

/// Read \p source as a list subject.
#[track_caller]
pub fn block(source: &str) -> Sequence {
    match parsley::read(source) {
        Ok(items) => Sequence::List(items),
        Err(err) => panic!("Bad block source {}: {}", source, err),
    }
}

/// Format a value for comparison. Binaries are shown as text, so that the
/// same expectation holds for string and byte subjects.
pub fn format_value(value: &Value) -> String {
    fn normalize(value: &Value) -> Value {
        match value {
            Value::Binary(bytes) => Value::Text(String::from_utf8_lossy(bytes).into_owned()),
            Value::Block(items) => Value::Block(items.iter().map(normalize).collect()),
            Value::Quoted(inner) => Value::quoted(normalize(inner)),
            other => other.clone(),
        }
    }
    normalize(value).to_string()
}

/// Format a subject as a string. Lists are shown molded.
pub fn format_sequence(seq: &Sequence) -> String {
    match seq {
        Sequence::Text(chars) => chars.iter().collect(),
        Sequence::Bytes(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        Sequence::List(items) => format_value(&Value::Block(items.clone())),
    }
}

/// Format the variable \p name, or "unset".
pub fn format_var(vars: &Variables, name: &str) -> String {
    vars.get(name).map_or("unset".to_string(), format_value)
}

pub trait StringTestHelpers {
    /// "Fluent" style helper for testing that a String is equal to a str.
    fn test_eq(&self, s: &str);
}

impl StringTestHelpers for String {
    #[track_caller]
    fn test_eq(&self, rhs: &str) {
        assert_eq!(self.as_str(), rhs)
    }
}

/// A compiled rule which remembers a TestConfig.
#[derive(Debug)]
pub struct TestCompiledRule {
    rule: Rule,
    options: Options,
    tc: TestConfig,
}

impl TestCompiledRule {
    /// Match against \p input, with fresh variables.
    pub fn parse(&self, input: &str) -> Result<Option<Value>, MatchError> {
        self.parse_vars(input, &mut Variables::new())
    }

    /// Match against \p input, binding into \p vars.
    pub fn parse_vars(&self, input: &str, vars: &mut Variables) -> Result<Option<Value>, MatchError> {
        self.rule
            .parse_with(&self.tc.subject(input), self.options, vars)
    }

    /// Match against a string, returning the formatted product.
    #[track_caller]
    pub fn match1(&self, input: &str) -> String {
        self.match1_vars(input, &mut Variables::new())
    }

    /// Like match1(), but binding into \p vars.
    #[track_caller]
    pub fn match1_vars(&self, input: &str, vars: &mut Variables) -> String {
        match self.parse_vars(input, vars) {
            Ok(Some(value)) => format_value(&value),
            Ok(None) => panic!("Failed to match {} ({:?})", input, self.tc),
            Err(err) => panic!("Error matching {} ({:?}): {}", input, self.tc, err),
        }
    }

    /// Test that matching against \p input fails without error.
    #[track_caller]
    pub fn test_fails(&self, input: &str) {
        let res = self.parse(input);
        assert!(
            matches!(res, Ok(None)),
            "Should not have matched {} ({:?}): {:?}",
            input,
            self.tc,
            res
        )
    }

    /// Test that matching against \p input succeeds.
    #[track_caller]
    pub fn test_succeeds(&self, input: &str) {
        let res = self.parse(input);
        assert!(
            matches!(res, Ok(Some(_))),
            "Should have matched {} ({:?}): {:?}",
            input,
            self.tc,
            res
        )
    }

    /// Test that the rule matches but leaves part of \p input unconsumed.
    #[track_caller]
    pub fn test_incomplete(&self, input: &str) {
        let res = self.parse(input);
        assert!(
            matches!(&res, Err(err) if err.is_incomplete()),
            "Should have been incomplete {} ({:?}): {:?}",
            input,
            self.tc,
            res
        )
    }

    /// Match against \p input, which must fail with an error.
    #[track_caller]
    pub fn fatal(&self, input: &str) -> MatchError {
        match self.parse(input) {
            Err(err) => err,
            Ok(res) => panic!("Should have failed {} ({:?}): {:?}", input, self.tc, res),
        }
    }

    /// Match against \p input as a mutable subject, returning the edited
    /// subject.
    #[track_caller]
    pub fn rewrite(&self, input: &str) -> String {
        self.rewrite_vars(input, &mut Variables::new())
    }

    /// Like rewrite(), but binding into \p vars.
    #[track_caller]
    pub fn rewrite_vars(&self, input: &str, vars: &mut Variables) -> String {
        let mut subject = self.tc.subject(input);
        match self.rule.parse_mut(&mut subject, self.options, vars) {
            Ok(Some(_)) => format_sequence(&subject),
            Ok(None) => panic!("Failed to match {} ({:?})", input, self.tc),
            Err(err) => panic!("Error matching {} ({:?}): {}", input, self.tc, err),
        }
    }

    /// Like fatal(), but against a mutable subject.
    #[track_caller]
    pub fn fatal_mut(&self, input: &str) -> MatchError {
        let mut subject = self.tc.subject(input);
        match self
            .rule
            .parse_mut(&mut subject, self.options, &mut Variables::new())
        {
            Err(err) => err,
            Ok(res) => panic!("Should have failed {} ({:?}): {:?}", input, self.tc, res),
        }
    }
}

/// Our subject encodings.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Encoding {
    Text,
    Bytes,
}

/// Description of how to test a rule.
#[derive(Debug, Copy, Clone)]
pub struct TestConfig {
    // How string inputs are presented to the rule.
    encoding: Encoding,
}

impl TestConfig {
    /// Whether subjects are byte arrays.
    pub fn is_bytes(&self) -> bool {
        self.encoding == Encoding::Bytes
    }

    /// Encode a string input as a subject.
    pub fn subject(&self, input: &str) -> Sequence {
        match self.encoding {
            Encoding::Text => Sequence::from(input),
            Encoding::Bytes => Sequence::from(input.as_bytes()),
        }
    }

    /// Compile rule source, with default options.
    #[track_caller]
    pub fn compile(&self, source: &str) -> TestCompiledRule {
        self.compilef(source, "")
    }

    /// Compile rule source, with given option flags.
    #[track_caller]
    pub fn compilef(&self, source: &str, flags: &str) -> TestCompiledRule {
        match Rule::from_source(source) {
            Ok(rule) => TestCompiledRule {
                rule,
                options: Options::from(flags),
                tc: *self,
            },
            Err(err) => panic!(
                "Failed to compile! flags: {} rule: {}, error: {}",
                flags, source, err
            ),
        }
    }

    /// Compile \p source with \p options rather than flags.
    #[track_caller]
    pub fn compile_with(&self, source: &str, options: Options) -> TestCompiledRule {
        let mut compiled = self.compile(source);
        compiled.options = options;
        compiled
    }
}

/// Invoke \p F with each test config, in turn.
pub fn test_with_configs<F>(func: F)
where
    F: Fn(TestConfig),
{
    func(TestConfig {
        encoding: Encoding::Text,
    });
    func(TestConfig {
        encoding: Encoding::Bytes,
    });
}
