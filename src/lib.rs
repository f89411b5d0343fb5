/*!

# parsley - backtracking PARSE-style rule matching

This crate provides a pattern-matching engine driven by a small rule language. Rules recognize and deconstruct sequential data (lists of values, strings, and byte arrays) by composing primitives: literal matches, repetition, ordered choice, lookahead, capture, and hooks into host code. They replace hand-written recursive-descent code for ad hoc extraction, and named sub-rules give full recursive grammars.

# Example: test if a string matches a rule

```rust
use parsley::{Rule, Sequence};
let rule = Rule::from_source(r#"some ["a" | "b"] "c""#).unwrap();
assert!(rule.is_match(&Sequence::from("abbac")).unwrap());
assert!(!rule.is_match(&Sequence::from("abx")).unwrap());
```

# Example: collecting values

`collect` builds a new block from everything `keep` kept inside it. Values kept by alternatives that were abandoned never appear.

```rust
use parsley::{Rule, Sequence, Value};
let rule: Rule = r#"collect [keep across some "a", keep across some "b"]"#.parse().unwrap();
let product = rule.parse(&Sequence::from("aaabbb")).unwrap();
assert_eq!(product, Some(Value::Block(vec![Value::text("aaa"), Value::text("bbb")])));
```

# Example: binding variables

A set-word binds the product of the rule element after it. Repetition produces the last element it matched.

```rust
use parsley::{Options, Rule, Sequence, Value, Variables};
let rule = Rule::from_source("[<any> result: some 'a <any>]").unwrap();
let subject = Sequence::from(vec![Value::word("a"), Value::word("a"), Value::word("b")]);
let mut vars = Variables::new();
rule.parse_with(&subject, Options::default(), &mut vars).unwrap();
assert_eq!(vars.get("result"), Some(&Value::word("a")));
```

# Example: editing in place

```rust
use parsley::{Options, Rule, Sequence, Variables};
let rule = Rule::from_source(r#"some [change "cat" "dog" | <any>]"#).unwrap();
let mut subject = Sequence::from("a cat, a cat");
rule.parse_mut(&mut subject, Options::default(), &mut Variables::new()).unwrap();
assert_eq!(subject, Sequence::from("a dog, a dog"));
```

# Matching semantics

Matching is ordered-choice backtracking: `a | b` takes `a` whenever it matches, even if `b` would consume more. There is no linear-time guarantee; pathological rules take exponential time. A rule which matches without consuming the whole subject is reported as `MatchError::Incomplete` unless partial matching is requested with the `p` option.

Text, chars and words compare case-insensitively unless the `c` option is given.

Failing to match is not an error: it is reported as `Ok(None)`. Errors are reserved for malformed rules, failures raised by host code, incomplete matches, and invalid edits. No combinator catches them.

# Architecture

A rule block is compiled into a tree of nodes. Compilation is driven entirely by a dispatch `Table` that maps rule elements (by keyword, or by the kind of a literal value) to `Combinator` implementations; callers can clone the table and add their own. Words that name variables are compiled lazily, when first reached, which is what allows recursive rules.

The tree is interpreted directly against a cursor into the subject. Kept values and deferred groups are transactional: whatever a failed branch produced is discarded. Edits to a mutable subject are not; they are recorded instead, so that positions they invalidated are refused.

*/

#![warn(clippy::all)]
#![allow(clippy::match_like_matches_macro)]

pub use crate::api::*;
pub use crate::compile::{Compiler, Node};
pub use crate::cursor::{Cursor, SeriesId};
pub use crate::deferred::Deferred;
pub use crate::error::{Location, MatchError};
pub use crate::exec::Context;
pub use crate::indexing::{Element, Sequence};
pub use crate::outcome::{Outcome, Parsed};
pub use crate::pending::Pending;
pub use crate::reader::read;
pub use crate::registry::{Combinator, Entry, Param, Scan, Table, MAX_ALIAS_DEPTH};
pub use crate::value::{Action, ActionFn, Kind, Value, Variables};

mod api;
mod bytesearch;
mod combinators;
mod compile;
mod cursor;
mod deferred;
mod error;
mod exec;
mod indexing;
mod matchers;
mod mutate;
mod outcome;
mod pending;
mod reader;
mod registry;
mod value;
