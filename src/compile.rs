//! Rule compiler: turns a block of rule elements into a tree of nodes.
//!
//! Compilation is structural. Each element is classified through the
//! dispatch table, and the combinator it selects says how many following
//! elements it consumes, either compiled (`Param::Parser`) or verbatim
//! (`Param::Raw`). Words naming variables are left as references and
//! compiled lazily at run time, which is what lets rules refer to
//! themselves.

use crate::combinators::{Alternatives, SequenceRule};
use crate::error::{Location, MatchError};
use crate::registry::{keyword_key, Combinator, Entry, Param, Table, MAX_ALIAS_DEPTH};
use crate::value::Value;
use core::fmt;
use core::ops::Range;
use std::rc::Rc;

/// A compiled rule element: a combinator bound to its arguments.
#[derive(Debug)]
pub struct Node {
    pub(crate) combinator: Rc<dyn Combinator>,

    /// Compiled `Param::Parser` arguments, plus anything `prepare` produced.
    pub(crate) children: Vec<Node>,

    /// `Param::Raw` arguments, in order.
    pub(crate) args: Vec<Value>,

    /// The element that selected the combinator, after alias resolution.
    pub(crate) literal: Value,

    /// Index of the element within its block.
    pub(crate) index: usize,

    /// Variables set from this node's product when it matches.
    pub(crate) bindings: Vec<String>,
}

impl Node {
    #[inline]
    pub fn name(&self) -> &str {
        self.combinator.name()
    }

    #[inline]
    pub fn combinator(&self) -> &dyn Combinator {
        self.combinator.as_ref()
    }

    #[inline]
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// \return the first compiled child. Every combinator taking a
    /// `Param::Parser` has one.
    #[inline]
    pub fn child(&self) -> &Node {
        &self.children[0]
    }

    #[inline]
    pub fn args(&self) -> &[Value] {
        &self.args
    }

    /// \return the first raw argument. Every combinator taking a
    /// `Param::Raw` has one.
    #[inline]
    pub fn arg(&self) -> &Value {
        &self.args[0]
    }

    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    #[inline]
    pub fn literal(&self) -> &Value {
        &self.literal
    }

    #[inline]
    pub fn bindings(&self) -> &[String] {
        &self.bindings
    }

    pub fn location(&self) -> Location {
        Location {
            combinator: self.name().to_string(),
            index: self.index,
            element: self.literal.to_string(),
        }
    }

    /// \return a malformed-rule error located at this node.
    pub fn error<S: ToString>(&self, message: S) -> MatchError {
        MatchError::MalformedRule {
            location: self.location(),
            message: message.to_string(),
        }
    }

    /// \return an invalid-mutation error located at this node.
    pub fn mutation_error<S: ToString>(&self, message: S) -> MatchError {
        MatchError::Mutation {
            location: self.location(),
            message: message.to_string(),
        }
    }
}

fn display_node(node: &Node, depth: usize, f: &mut fmt::Formatter) -> fmt::Result {
    for _ in 0..depth {
        write!(f, "..")?;
    }
    for name in &node.bindings {
        write!(f, "{}: ", name)?;
    }
    write!(f, "{}", node.name())?;
    let is_keyword = keyword_key(&node.literal).map_or(false, |key| {
        key == node.name() || key.trim_matches(|c| c == '<' || c == '>') == node.name()
    });
    if !is_keyword && !matches!(node.literal, Value::Block(_)) {
        write!(f, " {}", node.literal)?;
    }
    for arg in &node.args {
        write!(f, " {}", arg)?;
    }
    writeln!(f)?;
    for child in &node.children {
        display_node(child, depth + 1, f)?;
    }
    Ok(())
}

/// Nodes display as an indented tree.
impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        display_node(self, 0, f)
    }
}

fn malformed(combinator: &str, index: usize, element: &Value, message: String) -> MatchError {
    MatchError::MalformedRule {
        location: Location {
            combinator: combinator.to_string(),
            index,
            element: element.to_string(),
        },
        message,
    }
}

/// The remaining elements of one alternative.
struct Stream<'a> {
    items: &'a [Value],
    pos: usize,
    end: usize,
}

impl<'a> Stream<'a> {
    #[inline]
    fn is_empty(&self) -> bool {
        self.pos >= self.end
    }

    fn next(&mut self) -> Option<(usize, &'a Value)> {
        if self.is_empty() {
            return None;
        }
        let idx = self.pos;
        self.pos += 1;
        self.items.get(idx).map(|v| (idx, v))
    }
}

/// Compiles rule blocks against a dispatch table.
#[derive(Debug, Clone, Copy)]
pub struct Compiler<'t> {
    table: &'t Table,
}

impl<'t> Compiler<'t> {
    pub fn new(table: &'t Table) -> Self {
        Self { table }
    }

    /// Compile a block. Bars split it into ordered alternatives, each of
    /// which is a sequence.
    pub fn compile_block(&self, items: &[Value]) -> Result<Node, MatchError> {
        let mut alternatives = Vec::new();
        let mut start = 0;
        for (idx, item) in items.iter().enumerate() {
            if *item == Value::Bar {
                alternatives.push(self.compile_sequence(items, start..idx)?);
                start = idx + 1;
            }
        }
        let last = self.compile_sequence(items, start..items.len())?;
        if alternatives.is_empty() {
            return Ok(last);
        }
        alternatives.push(last);
        Ok(Node {
            combinator: Rc::new(Alternatives),
            children: alternatives,
            args: Vec::new(),
            literal: Value::Block(items.to_vec()),
            index: 0,
            bindings: Vec::new(),
        })
    }

    fn compile_sequence(&self, items: &[Value], range: Range<usize>) -> Result<Node, MatchError> {
        let mut stream = Stream {
            items,
            pos: range.start,
            end: range.end,
        };
        let mut children = Vec::new();
        while !stream.is_empty() {
            children.push(self.compile_next(&mut stream)?);
        }
        Ok(Node {
            combinator: Rc::new(SequenceRule),
            children,
            args: Vec::new(),
            literal: Value::Block(items.get(range.clone()).unwrap_or(&[]).to_vec()),
            index: range.start,
            bindings: Vec::new(),
        })
    }

    /// Compile the next element of the stream, with its arguments.
    fn compile_next(&self, stream: &mut Stream<'_>) -> Result<Node, MatchError> {
        let mut bindings = Vec::new();
        let (index, element) = loop {
            let Some((index, element)) = stream.next() else {
                // Callers only ask when the stream is non-empty.
                return Err(MatchError::raise("rule ended unexpectedly"));
            };
            if let Value::SetWord(name) = element {
                if stream.is_empty() {
                    return Err(malformed(
                        "set-word!",
                        index,
                        element,
                        format!("`{}:` must be followed by a rule", name),
                    ));
                }
                bindings.push(name.clone());
                continue;
            }
            break (index, element);
        };

        let (combinator, literal) = self.resolve(index, element)?;
        let mut children = combinator.prepare(&literal, self)?;
        let mut args = Vec::new();
        for param in combinator.params() {
            if stream.is_empty() {
                return Err(malformed(
                    combinator.name(),
                    index,
                    element,
                    format!(
                        "`{}` takes {} argument(s) but the rule ended",
                        combinator.name(),
                        combinator.params().len()
                    ),
                ));
            }
            match param {
                Param::Parser => children.push(self.compile_next(stream)?),
                Param::Raw => {
                    if let Some((_, raw)) = stream.next() {
                        args.push(raw.clone());
                    }
                }
            }
        }
        tracing::trace!(combinator = combinator.name(), index, "compiled rule element");

        let node = Node {
            combinator,
            children,
            args,
            literal,
            index,
            bindings,
        };
        node.combinator.check(&node)?;
        Ok(node)
    }

    /// Find the combinator for an element, following keyword aliases.
    /// \return the combinator and the element it was finally selected by.
    fn resolve(&self, index: usize, element: &Value) -> Result<(Rc<dyn Combinator>, Value), MatchError> {
        let mut current = element.clone();
        for _ in 0..MAX_ALIAS_DEPTH {
            if let Some(key) = keyword_key(&current) {
                match self.table.keyword(&key) {
                    Some(Entry::Combinator(combinator)) => {
                        return Ok((Rc::clone(combinator), current));
                    }
                    Some(Entry::Value(value)) => {
                        current = value.clone();
                        continue;
                    }
                    None if matches!(current, Value::Tag(_)) => {
                        return Err(malformed(
                            "tag!",
                            index,
                            element,
                            format!("unknown keyword {}", current),
                        ));
                    }
                    None => {}
                }
            }
            if current == Value::Bar {
                return Err(malformed(
                    "bar!",
                    index,
                    element,
                    "`|` may only separate alternatives".to_string(),
                ));
            }
            return match self.table.kind(current.kind()) {
                Some(combinator) => Ok((Rc::clone(combinator), current)),
                None => Err(malformed(
                    current.kind().name(),
                    index,
                    element,
                    format!("{} is not a legal rule value", current.kind()),
                )),
            };
        }
        Err(malformed(
            "alias",
            index,
            element,
            format!("keyword aliases nest deeper than {}", MAX_ALIAS_DEPTH),
        ))
    }
}
