use crate::compile::{Compiler, Node};
use crate::error::MatchError;
use crate::exec::{self, Subject};
use crate::indexing::Sequence;
use crate::reader;
use crate::registry::Table;
use crate::value::{Value, Variables};
use core::{fmt, str::FromStr};
use std::rc::Rc;

/// Options used to control a match.
/// The default options are case-insensitive, require the rule to consume
/// the whole subject, and match the whole subject.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct Options {
    /// If set, text, chars and words compare case-sensitively.
    pub case_sensitive: bool,

    /// If set, a match need not consume the whole window; the product is
    /// returned wherever the rule stopped.
    pub partial: bool,

    /// The index the match starts at.
    pub start: usize,

    /// The end of the window, or None for the end of the subject.
    pub end: Option<usize>,
}

impl Options {
    /// Construct Options from flag letters.
    /// 'c' means case-sensitive, 'p' means partial.
    /// Other letters are ignored.
    #[inline]
    pub fn new<T: Iterator<Item = char>>(chars: T) -> Self {
        let mut result = Self::default();
        for c in chars {
            match c {
                'c' => {
                    result.case_sensitive = true;
                }
                'p' => {
                    result.partial = true;
                }
                _ => {
                    // Silently skip unsupported flags.
                }
            }
        }
        result
    }

    /// Restrict the match to the window `start..end`.
    #[inline]
    pub fn with_window(mut self, start: usize, end: usize) -> Self {
        self.start = start;
        self.end = Some(end);
        self
    }
}

impl From<&str> for Options {
    /// Construct Options from a string of flag letters.
    ///
    /// See also: [`Options::new`].
    #[inline]
    fn from(s: &str) -> Self {
        Self::new(s.chars())
    }
}

impl fmt::Display for Options {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.case_sensitive {
            f.write_str("c")?;
        }
        if self.partial {
            f.write_str("p")?;
        }
        Ok(())
    }
}

/// A Rule is the compiled version of a block of rule elements.
#[derive(Debug)]
pub struct Rule {
    root: Node,
    table: Rc<Table>,
}

impl Rule {
    /// Compile `items` against the default table.
    #[inline]
    pub fn new(items: &[Value]) -> Result<Rule, MatchError> {
        Self::with_table(items, Table::default_table())
    }

    /// Compile `items` against `table`. The table is kept with the rule and
    /// also used for rules compiled while matching.
    pub fn with_table(items: &[Value], table: Rc<Table>) -> Result<Rule, MatchError> {
        let root = Compiler::new(&table).compile_block(items)?;
        Ok(Rule { root, table })
    }

    /// Read and compile rule source text. A source holding exactly one block
    /// compiles the block's contents.
    pub fn from_source(source: &str) -> Result<Rule, MatchError> {
        let mut items = reader::read(source)?;
        if let [Value::Block(inner)] = items.as_mut_slice() {
            let inner = std::mem::take(inner);
            return Self::new(&inner);
        }
        Self::new(&items)
    }

    /// The compiled tree.
    #[inline]
    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Match against `subject` with the default options.
    /// \return the product, or None if the rule did not match.
    #[inline]
    pub fn parse(&self, subject: &Sequence) -> Result<Option<Value>, MatchError> {
        self.parse_with(subject, Options::default(), &mut Variables::new())
    }

    /// Match against `subject`. Variables bound by the rule are left in
    /// `variables`.
    pub fn parse_with(
        &self,
        subject: &Sequence,
        options: Options,
        variables: &mut Variables,
    ) -> Result<Option<Value>, MatchError> {
        exec::execute(
            &self.root,
            Rc::clone(&self.table),
            Subject::Shared(subject),
            &options,
            variables,
        )
    }

    /// Match against a subject the rule may edit in place.
    pub fn parse_mut(
        &self,
        subject: &mut Sequence,
        options: Options,
        variables: &mut Variables,
    ) -> Result<Option<Value>, MatchError> {
        exec::execute(
            &self.root,
            Rc::clone(&self.table),
            Subject::Exclusive(subject),
            &options,
            variables,
        )
    }

    /// \return whether the rule matches the whole of `subject`. Errors other
    /// than an incomplete match are still reported.
    pub fn is_match(&self, subject: &Sequence) -> Result<bool, MatchError> {
        match self.parse(subject) {
            Ok(found) => Ok(found.is_some()),
            Err(err) if err.is_incomplete() => Ok(false),
            Err(err) => Err(err),
        }
    }
}

/// Rules display as their compiled tree.
impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.root)
    }
}

impl FromStr for Rule {
    type Err = MatchError;

    /// Attempts to read and compile rule source text.
    #[inline]
    fn from_str(s: &str) -> Result<Self, MatchError> {
        Self::from_source(s)
    }
}

/// Match `rule` against `subject` with the default table.
pub fn parse(subject: &Sequence, rule: &[Value], options: Options) -> Result<Option<Value>, MatchError> {
    Rule::new(rule)?.parse_with(subject, options, &mut Variables::new())
}
