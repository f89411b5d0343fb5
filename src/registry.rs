//! The dispatch table mapping rule elements to combinators.
//!
//! The compiler resolves every rule element purely by looking it up here:
//! words and tags by keyword, everything else by kind. Callers extend the
//! rule language by cloning a table and inserting entries.

use crate::combinators;
use crate::compile::{Compiler, Node};
use crate::deferred;
use crate::exec::Context;
use crate::matchers;
use crate::mutate;
use crate::outcome::Parsed;
use crate::pending;
use crate::value::{Kind, Value};
use crate::MatchError;
use core::fmt;
use std::collections::HashMap;
use std::rc::Rc;

/// How far a keyword may be aliased to another keyword before the compiler
/// gives up.
pub const MAX_ALIAS_DEPTH: usize = 16;

/// One parameter a combinator takes from the rule stream.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Param {
    /// Compile the next rule element into a child node.
    Parser,

    /// Take the next rule element verbatim.
    Raw,
}

/// Where scanning combinators should next probe a node.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Scan {
    /// No shortcut; probe every position.
    Anywhere,

    /// The first position at or after the starting point that could match.
    At(usize),

    /// Nothing at or after the starting point can match.
    Nowhere,
}

/// A rule-language building block.
pub trait Combinator: fmt::Debug {
    /// The name used in tree dumps and error locations.
    fn name(&self) -> &str;

    /// The parameters consumed from the rule stream after the element that
    /// selected this combinator.
    fn params(&self) -> &[Param] {
        &[]
    }

    /// Compile any children implied by the selecting element itself, like
    /// the contents of a block.
    fn prepare(&self, _literal: &Value, _compiler: &Compiler<'_>) -> Result<Vec<Node>, MatchError> {
        Ok(Vec::new())
    }

    /// Validate a freshly compiled node.
    fn check(&self, _node: &Node) -> Result<(), MatchError> {
        Ok(())
    }

    /// Run the node against the subject at `pos`.
    fn parse(&self, node: &Node, ctx: &mut Context<'_>, pos: usize) -> Parsed;

    /// Whether the node always matches exactly one element, so that
    /// `except` may negate it into "one element that is not this".
    fn excludes_one(&self, _node: &Node) -> bool {
        false
    }

    /// A start predicate: where this node could first match at or after
    /// `from`. Used by `to` and `thru` to skip hopeless positions.
    fn scan(&self, _node: &Node, _ctx: &Context<'_>, _from: usize) -> Scan {
        Scan::Anywhere
    }
}

/// What a keyword maps to.
#[derive(Debug, Clone)]
pub enum Entry {
    Combinator(Rc<dyn Combinator>),

    /// A plain value; the compiler dispatches on the value's own kind.
    Value(Value),
}

/// \return the keyword under which a word or tag is looked up.
pub fn keyword_key(element: &Value) -> Option<String> {
    match element {
        Value::Word(w) => Some(w.to_lowercase()),
        Value::Tag(t) => Some(format!("<{}>", t.to_lowercase())),
        _ => None,
    }
}

/// The dispatch table.
#[derive(Debug, Clone, Default)]
pub struct Table {
    kinds: HashMap<Kind, Rc<dyn Combinator>>,
    keywords: HashMap<String, Entry>,
}

thread_local! {
    static DEFAULT_TABLE: Rc<Table> = Rc::new(Table::builtin());
}

impl Table {
    /// An empty table. Nothing compiles against it.
    pub fn new() -> Self {
        Self::default()
    }

    /// The shared default table. It is built once per thread and never
    /// mutated; clone it to customize.
    pub fn default_table() -> Rc<Table> {
        DEFAULT_TABLE.with(Rc::clone)
    }

    /// Set the combinator for literal elements of `kind`.
    pub fn insert_kind(&mut self, kind: Kind, combinator: Rc<dyn Combinator>) {
        self.kinds.insert(kind, combinator);
    }

    /// Set the combinator for a keyword. Keywords are words like `some` or
    /// tags written with their brackets, like `<any>`.
    pub fn insert_keyword(&mut self, keyword: &str, combinator: Rc<dyn Combinator>) {
        self.keywords
            .insert(keyword.to_lowercase(), Entry::Combinator(combinator));
    }

    /// Map a keyword to a plain value, used in its place.
    pub fn insert_alias(&mut self, keyword: &str, value: Value) {
        self.keywords
            .insert(keyword.to_lowercase(), Entry::Value(value));
    }

    pub fn remove_keyword(&mut self, keyword: &str) -> Option<Entry> {
        self.keywords.remove(&keyword.to_lowercase())
    }

    #[inline]
    pub fn keyword(&self, keyword: &str) -> Option<&Entry> {
        self.keywords.get(keyword)
    }

    #[inline]
    pub fn kind(&self, kind: Kind) -> Option<&Rc<dyn Combinator>> {
        self.kinds.get(&kind)
    }

    /// The built-in catalogue.
    pub fn builtin() -> Self {
        let mut table = Self::new();

        let literal: Rc<dyn Combinator> = Rc::new(matchers::Literal);
        for kind in [
            Kind::Text,
            Kind::Char,
            Kind::Binary,
            Kind::Integer,
            Kind::Logic,
            Kind::Blank,
            Kind::Quoted,
        ] {
            table.insert_kind(kind, Rc::clone(&literal));
        }
        table.insert_kind(Kind::Datatype, Rc::new(matchers::Typecheck));
        table.insert_kind(Kind::Void, Rc::new(matchers::VoidRule));
        table.insert_kind(Kind::Block, Rc::new(combinators::SubRule));
        table.insert_kind(Kind::Word, Rc::new(combinators::VariableRule));
        table.insert_kind(Kind::Group, Rc::new(combinators::Evaluate));
        table.insert_kind(Kind::GetGroup, Rc::new(combinators::Inject));

        table.insert_keyword("<any>", Rc::new(matchers::AnyElement));
        table.insert_keyword("<end>", Rc::new(matchers::End));
        let here: Rc<dyn Combinator> = Rc::new(combinators::Here);
        table.insert_keyword("here", Rc::clone(&here));
        table.insert_keyword("<here>", here);

        table.insert_keyword("some", Rc::new(combinators::Repeat::new("some", 1, None)));
        table.insert_keyword("while", Rc::new(combinators::Repeat::new("while", 0, None)));
        table.insert_keyword("opt", Rc::new(combinators::Opt));
        table.insert_keyword("repeat", Rc::new(combinators::RepeatCount));
        table.insert_keyword("stop", Rc::new(combinators::Stop));
        table.insert_keyword("veto", Rc::new(combinators::Veto));

        table.insert_keyword("ahead", Rc::new(combinators::Ahead));
        table.insert_keyword("not", Rc::new(combinators::Not));
        table.insert_keyword("except", Rc::new(combinators::Except));
        table.insert_keyword("across", Rc::new(combinators::Across));
        table.insert_keyword("seek", Rc::new(combinators::Seek));
        table.insert_keyword("to", Rc::new(combinators::ScanTo::to()));
        table.insert_keyword("thru", Rc::new(combinators::ScanTo::thru()));
        table.insert_keyword("into", Rc::new(combinators::IntoNested));

        table.insert_keyword("collect", Rc::new(pending::Collect));
        table.insert_keyword("keep", Rc::new(pending::Keep));
        table.insert_keyword("spread", Rc::new(pending::Spread));

        table.insert_keyword("remove", Rc::new(mutate::Remove));
        table.insert_keyword("insert", Rc::new(mutate::Insert));
        table.insert_keyword("change", Rc::new(mutate::Change));

        table.insert_keyword("phase", Rc::new(deferred::Phase));
        table.insert_keyword("<delay>", Rc::new(deferred::Delay));

        table.insert_alias("skip", Value::tag("any"));
        table.insert_alias("end", Value::tag("end"));
        table
    }
}
