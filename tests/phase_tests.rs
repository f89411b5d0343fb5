pub mod common;
use common::*;

use parsley::{MatchError, Value, Variables};

/// Variables with a `note` action, which appends the text in `next` to the
/// text in `trace`.
fn tracing_vars() -> Variables {
    let mut vars = Variables::new();
    vars.set_action("note", |vars| {
        let next = match vars.get("next") {
            Some(Value::Text(s)) => s.clone(),
            _ => return Err(MatchError::raise("`next` is not text")),
        };
        let mut trace = match vars.get("trace") {
            Some(Value::Text(s)) => s.clone(),
            _ => String::new(),
        };
        trace.push_str(&next);
        vars.set("trace", trace);
        Ok(Value::Void)
    });
    vars
}

fn trace(vars: &Variables) -> String {
    match vars.get("trace") {
        Some(Value::Text(s)) => s.clone(),
        _ => String::new(),
    }
}

fn test_immediate_groups_tc(tc: TestConfig) {
    let mut vars = tracing_vars();
    tc.compile(r#"["a" (next: "1" note) "x" | "a" (next: "2" note) "b"]"#)
        .match1_vars("ab", &mut vars);
    trace(&vars).test_eq("12");
}

#[test]
fn test_immediate_groups() {
    test_with_configs(test_immediate_groups_tc)
}

fn test_delayed_groups_tc(tc: TestConfig) {
    // Only the alternative that matched runs its delayed group.
    let mut vars = tracing_vars();
    tc.compile(r#"["a" <delay> (next: "1" note) "x" | "a" <delay> (next: "2" note) "b"]"#)
        .match1_vars("ab", &mut vars);
    trace(&vars).test_eq("2");

    // Delayed groups run after the whole match, in order.
    let mut vars = tracing_vars();
    tc.compile(r#""a" <delay> (next: "1" note) (next: "2" note) <delay> (next: "3" note) "b""#)
        .match1_vars("ab", &mut vars);
    trace(&vars).test_eq("213");

    // Iterations that fail take their delayed groups with them.
    let mut vars = tracing_vars();
    tc.compilef(r#"some ["a" <delay> (next: "1" note) "b"]"#, "p")
        .match1_vars("aba", &mut vars);
    trace(&vars).test_eq("1");
}

#[test]
fn test_delayed_groups() {
    test_with_configs(test_delayed_groups_tc)
}

fn test_delayed_groups_need_a_match_tc(tc: TestConfig) {
    let mut vars = tracing_vars();
    tc.compile(r#""a" <delay> (next: "1" note) "x""#).test_fails("ab");
    let res = tc
        .compile(r#""a" <delay> (next: "1" note) "x""#)
        .parse_vars("ab", &mut vars);
    assert_eq!(res, Ok(None));
    trace(&vars).test_eq("");

    // An incomplete match runs nothing either.
    let res = tc
        .compile(r#""a" <delay> (next: "1" note)"#)
        .parse_vars("ab", &mut vars);
    assert!(matches!(&res, Err(err) if err.is_incomplete()), "{:?}", res);
    trace(&vars).test_eq("");
}

#[test]
fn test_delayed_groups_need_a_match() {
    test_with_configs(test_delayed_groups_need_a_match_tc)
}

fn test_phases_tc(tc: TestConfig) {
    // A phase runs its delayed groups as soon as it succeeds.
    let mut vars = tracing_vars();
    tc.compile(r#"phase ["a" <delay> (next: "1" note)] (next: "2" note) "b""#)
        .match1_vars("ab", &mut vars);
    trace(&vars).test_eq("12");

    // A phase that fails runs nothing.
    let mut vars = tracing_vars();
    tc.compile(r#"[phase ["a" <delay> (next: "1" note) "x"] | "a"] "b""#)
        .match1_vars("ab", &mut vars);
    trace(&vars).test_eq("");

    // Each iteration is its own phase.
    let mut vars = tracing_vars();
    tc.compile(r#"some phase ["a" <delay> (next: "a" note)] (next: "!" note)"#)
        .match1_vars("aa", &mut vars);
    trace(&vars).test_eq("aa!");

    // Delays outside any phase still wait for the whole match.
    let mut vars = tracing_vars();
    tc.compile(r#"<delay> (next: "1" note) phase ["a" <delay> (next: "2" note)] "b""#)
        .match1_vars("ab", &mut vars);
    trace(&vars).test_eq("21");
}

#[test]
fn test_phases() {
    test_with_configs(test_phases_tc)
}

fn test_delayed_errors_tc(tc: TestConfig) {
    let err = tc.compile(r#"<delay> (missing) "a""#).fatal("a");
    assert_eq!(err, MatchError::raise("`missing` has no value"));
}

#[test]
fn test_delayed_errors() {
    test_with_configs(test_delayed_errors_tc)
}
