pub mod common;
use common::*;

use parsley::{MatchError, Options, Rule, Value, Variables};

fn test_collect_basics_tc(tc: TestConfig) {
    tc.compile(r#"collect [keep across some "a" keep across some "b"]"#)
        .match1("aaabbb")
        .test_eq(r#"["aaa" "bbb"]"#);
    tc.compile(r#"collect some "a""#).match1("aa").test_eq("[]");
    tc.compile(r#"collect [keep ("x") keep "a"]"#)
        .match1("a")
        .test_eq(r#"["x" "a"]"#);
    tc.compile(r#"collect [keep "a" "b"]"#).test_fails("ac");

    let mut vars = Variables::new();
    tc.compile(r#"x: collect [keep "a"] "b""#).match1_vars("ab", &mut vars);
    format_var(&vars, "x").test_eq(r#"["a"]"#);
}

#[test]
fn test_collect_basics() {
    test_with_configs(test_collect_basics_tc)
}

fn test_collect_transactions_tc(tc: TestConfig) {
    // Values kept by an abandoned alternative are discarded.
    tc.compile(r#"collect [keep "a" "x" | keep "a" "y"]"#)
        .match1("ay")
        .test_eq(r#"["a"]"#);

    // Including those kept by the failed last iteration of a loop.
    let rule = tc.compile(r#"collect [some [keep "a" keep "b"] keep opt "a"]"#);
    rule.match1("ababa").test_eq(r#"["a" "b" "a" "b" "a"]"#);
    rule.match1("abab").test_eq(r#"["a" "b" "a" "b"]"#);

    // Lookahead keeps what it saw; negative lookahead cannot.
    tc.compile(r#"collect [ahead [keep "a"] keep "a"]"#)
        .match1("a")
        .test_eq(r#"["a" "a"]"#);
    tc.compile(r#"collect [not [keep "b"] keep "a"]"#)
        .match1("a")
        .test_eq(r#"["a"]"#);

    // Nothing survives from a frame whose rule failed.
    tc.compile(r#"collect [[keep collect [keep "a" "x"]] | keep "a"]"#)
        .match1("a")
        .test_eq(r#"["a"]"#);
}

#[test]
fn test_collect_transactions() {
    test_with_configs(test_collect_transactions_tc)
}

fn test_nested_collect_tc(tc: TestConfig) {
    tc.compile(r#"collect [keep "a" keep collect [keep "b" keep "c"]]"#)
        .match1("abc")
        .test_eq(r#"["a" ["b" "c"]]"#);
    tc.compile(r#"collect [keep "a" keep spread collect [keep "b" keep "c"]]"#)
        .match1("abc")
        .test_eq(r#"["a" "b" "c"]"#);
    // A collect that is not kept does not add to the outer frame.
    tc.compile(r#"collect [keep "a" collect [keep "b"]]"#)
        .match1("ab")
        .test_eq(r#"["a"]"#);
    tc.compile(r#"collect [keep "a" collect [keep "b"]] "c""#)
        .match1("abc")
        .test_eq(r#""c""#);
}

#[test]
fn test_nested_collect() {
    test_with_configs(test_nested_collect_tc)
}

fn test_keep_outside_collect_tc(tc: TestConfig) {
    let err = tc.compile(r#"keep "a""#).fatal("a");
    assert!(
        matches!(&err, MatchError::MalformedRule { message, .. } if message.contains("outside of `collect`")),
        "{:?}",
        err
    );
}

#[test]
fn test_keep_outside_collect() {
    test_with_configs(test_keep_outside_collect_tc)
}

#[test]
fn test_collect_lists() {
    let rule = |source: &str| Rule::from_source(source).unwrap();
    assert_eq!(
        rule("collect some [keep integer! | word!]").parse(&block("1 a 2 b")),
        Ok(Some(Value::Block(vec![Value::Integer(1), Value::Integer(2)])))
    );
    assert_eq!(
        rule("collect [keep across [skip skip]]").parse(&block("1 2")),
        Ok(Some(Value::Block(vec![Value::Block(vec![
            Value::Integer(1),
            Value::Integer(2)
        ])])))
    );
    assert_eq!(
        rule("collect [keep spread across [skip skip]]").parse(&block("1 2")),
        Ok(Some(Value::Block(vec![Value::Integer(1), Value::Integer(2)])))
    );
    // Keeping a spliced group keeps its items.
    assert_eq!(
        rule("collect [skip keep ('~(x y)~)]").parse(&block("1")),
        Ok(Some(Value::Block(vec![Value::word("x"), Value::word("y")])))
    );
}

#[test]
fn test_collect_into() {
    let rule = Rule::from_source("collect some [into [some [keep integer! | skip]]]").unwrap();
    let product = rule.parse_with(
        &block("[1 a] [b 2 3]"),
        Options::default(),
        &mut Variables::new(),
    );
    assert_eq!(
        product,
        Ok(Some(Value::Block(vec![
            Value::Integer(1),
            Value::Integer(2),
            Value::Integer(3)
        ])))
    );
}
