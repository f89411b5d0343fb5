#![allow(clippy::uninlined_format_args)]

use parsley::{MatchError, Rule, Table, Value};
use std::rc::Rc;

#[track_caller]
fn test_1_error(source: &str, expected_err: &str) -> MatchError {
    let res = Rule::from_source(source);
    assert!(res.is_err(), "Rule should not have compiled: {}", source);

    let err = res.err().unwrap();
    let text = err.to_string();
    assert!(
        text.contains(expected_err),
        "Error text '{}' did not contain '{}' for rule '{}'",
        text,
        expected_err,
        source
    );
    err
}

#[track_caller]
fn test_syntax_offset(source: &str, expected_offset: usize) {
    match test_1_error(source, "syntax error") {
        MatchError::Syntax { offset, .. } => assert_eq!(offset, expected_offset, "{}", source),
        err => panic!("Expected a syntax error for '{}', got {:?}", source, err),
    }
}

#[test]
fn test_syntax_errors() {
    test_1_error(r#"[a b"#, "missing `]`");
    test_1_error(r#"a ]"#, "unexpected `]`");
    test_1_error(r#"("a""#, "missing `)`");
    test_1_error(r#""abc"#, "unterminated string");
    test_1_error(r#""a\qb""#, "unknown escape");
    test_1_error(r#"#{ABC}"#, "even number of hex digits");
    test_1_error(r#"#{AZ}"#, "not a hex digit");
    test_1_error(r#"#"ab""#, "exactly one char");
    test_1_error(r#"<>"#, "malformed tag");
    test_1_error(r#"~maybe~"#, "unknown signal");
    test_1_error(r#"~(a b)"#, "expected `~`");
    test_1_error(r#"a::"#, "malformed set-word");
    test_1_error(r#"' "a""#, "nothing to quote");
    test_1_error(r#"99999999999999999999"#, "out of range");

    test_syntax_offset(r#"[a b"#, 1);
    test_syntax_offset(r#"some "a" )"#, 9);
    test_syntax_offset(r#"x #{ABC}"#, 2);
    test_syntax_offset(r#"some ["a" '] "b""#, 10);
}

#[test]
fn test_missing_arguments() {
    test_1_error("some", "takes 1 argument(s) but the rule ended");
    test_1_error(r#""a" | opt"#, "takes 1 argument(s)");
    test_1_error(r#"change "a""#, "takes 2 argument(s)");
    test_1_error("repeat 3", "takes 2 argument(s)");
    test_1_error("some | \"a\"", "takes 1 argument(s)");
    test_1_error(r#""a" x:"#, "`x:` must be followed by a rule");

    // The location names the combinator and its element index.
    let err = test_1_error(r#""a" "b" keep"#, "keep");
    match err {
        MatchError::MalformedRule { location, .. } => {
            assert_eq!(location.combinator, "keep");
            assert_eq!(location.index, 2);
            assert_eq!(location.element, "keep");
        }
        err => panic!("Expected a malformed rule, got {:?}", err),
    }
}

#[test]
fn test_illegal_rule_values() {
    test_1_error("~null~", "null! is not a legal rule value");
    test_1_error(r#""a" ~null~"#, "null! is not a legal rule value");
    test_1_error("a: ~null~", "null! is not a legal rule value");
    test_1_error("x:", "must be followed by a rule");
    test_1_error("<nothing>", "unknown keyword <nothing>");
    test_1_error(r#"some <nothing>"#, "unknown keyword");
    test_1_error("~(a)~", "splice! is not a legal rule value");
}

#[test]
fn test_argument_checks() {
    test_1_error(r#"except some "a""#, "`some` does not match a single element");
    test_1_error(r#"except ["a"]"#, "cannot be excluded");
    test_1_error(r#"except "ab" "c""#, "`literal` does not match a single element");
    test_1_error(r#"except #{0102}"#, "cannot be excluded");
    assert!(Rule::from_source(r#"except "a""#).is_ok());
    assert!(Rule::from_source(r#"except #"a""#).is_ok());
    assert!(Rule::from_source(r#"except #{01}"#).is_ok());
    assert!(Rule::from_source(r#"except 'ab"#).is_ok());
    test_1_error(r#"<delay> "x""#, "expected a group, not text!");
    test_1_error(r#"repeat [3 1] "a""#, "max 1 is less than min 3");
    test_1_error(r#"repeat [1 2 3] "a""#, "[min max]");
    test_1_error(r#"repeat -1 "a""#, "negative count -1");
    test_1_error(r#"repeat "x" "a""#, "text! is not a count");

    // Computed counts are accepted until they are known.
    assert!(Rule::from_source(r#"repeat n "a""#).is_ok());
    assert!(Rule::from_source(r#"repeat (n) "a""#).is_ok());
}

#[test]
fn test_table_errors() {
    let mut table = (*Table::default_table()).clone();
    table.insert_alias("ping", Value::word("pong"));
    table.insert_alias("pong", Value::word("ping"));
    table.insert_alias("or", Value::Bar);
    let table = Rc::new(table);

    let err = Rule::with_table(&[Value::word("ping")], Rc::clone(&table)).unwrap_err();
    assert!(err.to_string().contains("nest deeper"), "{}", err);

    let items = vec![Value::text("a"), Value::word("or"), Value::text("b")];
    let err = Rule::with_table(&items, Rc::clone(&table)).unwrap_err();
    assert!(err.to_string().contains("may only separate alternatives"), "{}", err);

    // Nothing compiles against an empty table.
    let err = Rule::with_table(&[Value::text("a")], Rc::new(Table::new())).unwrap_err();
    assert!(err.to_string().contains("text! is not a legal rule value"), "{}", err);
}
