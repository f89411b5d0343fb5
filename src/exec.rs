//! Execution engine bits.
//!
//! A `Context` walks a compiled node tree against one subject sequence.
//! Every node is entered through `Context::run`, which is where the
//! transactional parts of a match live: kept values and deferred groups
//! produced by a node that ends in `NoMatch` are discarded there, and
//! set-word bindings are applied there when a node succeeds.

use crate::api::Options;
use crate::compile::{Compiler, Node};
use crate::cursor::{Cursor, EditLog, SeriesId};
use crate::deferred::Deferred;
use crate::error::MatchError;
use crate::indexing::{Element, Sequence};
use crate::outcome::{Outcome, Parsed};
use crate::pending::Pending;
use crate::registry::Table;
use crate::value::{Value, Variables};
use core::ops::Range;
use std::collections::HashMap;
use std::mem;
use std::rc::Rc;

/// State shared by every context of one top-level call, including the
/// contexts of nested sequences entered through `into`.
#[derive(Debug)]
pub(crate) struct Shared {
    table: Rc<Table>,
    case_sensitive: bool,
    variables: Variables,
    pending: Pending,
    deferred: Deferred,

    /// Edit logs of the sequences edited so far. Sequences without one
    /// are unedited.
    logs: HashMap<SeriesId, EditLog>,

    /// The id the next sequence entered through `into` gets.
    next_series: SeriesId,

    /// Edits made to any sequence so far.
    edits: usize,

    /// Rules compiled from word references, by variable name.
    rules: HashMap<String, Rc<Node>>,

    /// Set by `stop`; cleared by the loop it ends.
    stop: bool,

    /// Loop iterations currently running.
    loops: usize,
}

impl Shared {
    fn new(table: Rc<Table>, case_sensitive: bool, variables: Variables) -> Self {
        Self {
            table,
            case_sensitive,
            variables,
            pending: Pending::default(),
            deferred: Deferred::new(),
            logs: HashMap::new(),
            next_series: 1,
            edits: 0,
            rules: HashMap::new(),
            stop: false,
            loops: 0,
        }
    }
}

/// The subject of a context. Only exclusive subjects may be edited.
#[derive(Debug)]
pub(crate) enum Subject<'s> {
    Shared(&'s Sequence),
    Exclusive(&'s mut Sequence),
}

impl Subject<'_> {
    #[inline]
    fn sequence(&self) -> &Sequence {
        match self {
            Subject::Shared(seq) => seq,
            Subject::Exclusive(seq) => seq,
        }
    }
}

/// The running state a combinator sees.
#[derive(Debug)]
pub struct Context<'a> {
    subject: Subject<'a>,
    series: SeriesId,

    /// The end of the window. Reads at or past it see the end of input.
    limit: usize,

    shared: &'a mut Shared,
}

impl<'a> Context<'a> {
    /// Run `node` at `pos`.
    ///
    /// On `NoMatch` everything the node kept or deferred is discarded, and
    /// any pending stop request is dropped with it. On success the node's
    /// product is bound to its set-words.
    pub fn run(&mut self, node: &Node, pos: usize) -> Parsed {
        tracing::trace!(combinator = node.name(), pos, "enter");
        let pending = self.shared.pending.mark();
        let deferred = self.shared.deferred.mark();
        let outcome = node.combinator.parse(node, self, pos)?;
        match &outcome {
            Outcome::NoMatch => {
                self.shared.pending.rollback(pending);
                self.shared.deferred.rollback(deferred);
                self.shared.stop = false;
            }
            Outcome::Matched(value, _) => self.bind(node, value),
            Outcome::Void(_) => self.bind(node, &Value::Void),
        }
        Ok(outcome)
    }

    fn bind(&mut self, node: &Node, value: &Value) {
        for name in node.bindings() {
            self.shared.rules.remove(name);
            self.shared.variables.set(name, value.clone().meta());
        }
    }

    /// The sequence being matched.
    #[inline]
    pub fn sequence(&self) -> &Sequence {
        self.subject.sequence()
    }

    /// \return the element at `pos`, or None at the end of the window.
    #[inline]
    pub fn at(&self, pos: usize) -> Option<Element<'_>> {
        if pos >= self.limit {
            return None;
        }
        self.sequence().at(pos)
    }

    #[inline]
    pub fn is_end(&self, pos: usize) -> bool {
        pos >= self.limit
    }

    #[inline]
    pub fn limit(&self) -> usize {
        self.limit
    }

    #[inline]
    pub fn case_sensitive(&self) -> bool {
        self.shared.case_sensitive
    }

    /// The dispatch table the rule was compiled against.
    pub fn table(&self) -> Rc<Table> {
        Rc::clone(&self.shared.table)
    }

    pub fn variables(&mut self) -> &mut Variables {
        &mut self.shared.variables
    }

    /// Evaluate an embedded expression.
    pub fn evaluate(&mut self, value: &Value) -> Result<Value, MatchError> {
        let assigns = match value {
            Value::Group(_) | Value::GetGroup(_) => true,
            Value::Word(name) => matches!(self.shared.variables.get(name), Some(Value::Action(_))),
            _ => false,
        };
        let result = self.shared.variables.evaluate(value);
        if assigns {
            // Host code may have rebound any word used as a rule.
            self.shared.rules.clear();
        }
        result
    }

    /// \return a cursor for `pos` in the current sequence.
    pub fn cursor(&self, pos: usize) -> Cursor {
        Cursor::new(self.series, pos, self.generation())
    }

    /// The number of edits the current sequence has seen.
    pub fn generation(&self) -> usize {
        self.log().map_or(0, EditLog::generation)
    }

    /// The number of edits made to any sequence so far.
    #[inline]
    pub fn edits(&self) -> usize {
        self.shared.edits
    }

    fn log(&self) -> Option<&EditLog> {
        self.shared.logs.get(&self.series)
    }

    /// Turn a seek target into an index of the current sequence. The target
    /// is evaluated first, so it may be a word naming a captured position.
    pub fn resolve(&mut self, node: &Node, target: &Value) -> Result<usize, MatchError> {
        let index = match self.evaluate(target)? {
            Value::Position(cursor) => {
                if cursor.series() != self.series {
                    return Err(node.error(format!("{} belongs to another sequence", cursor)));
                }
                if self.log().map_or(false, |log| log.is_stale(&cursor)) {
                    return Err(node.mutation_error(format!(
                        "{} was invalidated by an edit before it",
                        cursor
                    )));
                }
                cursor.index()
            }
            Value::Integer(i) => usize::try_from(i)
                .map_err(|_| node.error(format!("cannot seek to index {}", i)))?,
            other => return Err(node.error(format!("cannot seek to {}", other.kind()))),
        };
        if index > self.limit {
            return Err(node.error(format!(
                "seek target {} is past the end of the window ({})",
                index, self.limit
            )));
        }
        Ok(index)
    }

    /// Replace the elements in `range` with `value`. An edit that neither
    /// removes nor inserts anything is not recorded.
    /// \return the number of elements inserted.
    pub fn edit(&mut self, node: &Node, range: Range<usize>, value: &Value) -> Result<usize, MatchError> {
        let Subject::Exclusive(seq) = &mut self.subject else {
            return Err(node.mutation_error("the subject is read-only"));
        };
        if range.start > range.end || range.end > seq.len() {
            return Err(node.mutation_error(format!(
                "cannot edit {}..{} of a sequence of length {}",
                range.start,
                range.end,
                seq.len()
            )));
        }
        let content = seq.encode(value).map_err(|msg| node.mutation_error(msg))?;
        let removed = range.end - range.start;
        let at = range.start;
        let inserted = seq.splice(range, content).map_err(|msg| node.mutation_error(msg))?;
        if removed == 0 && inserted == 0 {
            return Ok(0);
        }
        self.limit = self.limit.saturating_sub(removed) + inserted;
        self.shared.logs.entry(self.series).or_default().record(at);
        self.shared.edits += 1;
        tracing::trace!(combinator = node.name(), at, removed, inserted, "edit");
        Ok(inserted)
    }

    /// Ask the innermost loop to finish after its current iteration.
    #[inline]
    pub fn stop(&mut self) {
        self.shared.stop = true;
    }

    /// Whether a loop iteration encloses the current node.
    #[inline]
    pub fn in_loop(&self) -> bool {
        self.shared.loops > 0
    }

    /// Run `node` at `pos` as one iteration of a loop.
    pub fn run_iteration(&mut self, node: &Node, pos: usize) -> Parsed {
        self.shared.loops += 1;
        let outcome = self.run(node, pos);
        self.shared.loops -= 1;
        outcome
    }

    #[inline]
    pub fn stopping(&self) -> bool {
        self.shared.stop
    }

    /// Consume a stop request. Called by loops.
    #[inline]
    pub fn take_stop(&mut self) -> bool {
        mem::take(&mut self.shared.stop)
    }

    pub fn pending(&mut self) -> &mut Pending {
        &mut self.shared.pending
    }

    pub fn deferred(&mut self) -> &mut Deferred {
        &mut self.shared.deferred
    }

    /// \return the rule a word refers to, compiling it on first use.
    pub fn rule_for(&mut self, node: &Node, name: &str) -> Result<Rc<Node>, MatchError> {
        if let Some(rule) = self.shared.rules.get(name) {
            return Ok(Rc::clone(rule));
        }
        let value = match self.shared.variables.get(name) {
            None => return Err(node.error(format!("`{}` has no value", name))),
            Some(Value::Null) => return Err(node.error(format!("`{}` is null", name))),
            Some(value) => value.clone(),
        };
        let compiler = Compiler::new(&self.shared.table);
        let rule = match &value {
            Value::Block(items) => compiler.compile_block(items)?,
            other => compiler.compile_block(core::slice::from_ref(other))?,
        };
        tracing::trace!(word = name, "compiled rule reference");
        let rule = Rc::new(rule);
        self.shared.rules.insert(name.to_string(), Rc::clone(&rule));
        Ok(rule)
    }

    /// Match `rule` against the nested sequence at `pos`, which must be
    /// consumed completely. Edits made inside a mutable subject are written
    /// back to the element.
    pub fn enter(&mut self, rule: &Node, pos: usize) -> Parsed {
        let Some(element) = self.at(pos) else {
            return Ok(Outcome::NoMatch);
        };
        let Ok(mut nested) = Sequence::from_value(element.to_value()) else {
            return Ok(Outcome::NoMatch);
        };
        let series = self.shared.next_series;
        self.shared.next_series = series
            .checked_add(1)
            .ok_or_else(|| rule.error("too many nested sequences"))?;

        let limit = nested.len();
        let (outcome, end) = match self.subject {
            Subject::Exclusive(_) => {
                let mut inner = Context {
                    subject: Subject::Exclusive(&mut nested),
                    series,
                    limit,
                    shared: &mut *self.shared,
                };
                let outcome = inner.run(rule, 0)?;
                (outcome, inner.limit)
            }
            Subject::Shared(_) => {
                let mut inner = Context {
                    subject: Subject::Shared(&nested),
                    series,
                    limit,
                    shared: &mut *self.shared,
                };
                let outcome = inner.run(rule, 0)?;
                (outcome, inner.limit)
            }
        };
        if outcome.pos() != Some(end) {
            return Ok(Outcome::NoMatch);
        }

        let edited = self.shared.logs.contains_key(&series);
        if edited {
            if let Subject::Exclusive(Sequence::List(items)) = &mut self.subject {
                if let Some(slot) = items.get_mut(pos) {
                    *slot = nested.into_value();
                }
            }
        }
        Ok(outcome.at(pos + 1))
    }
}

/// Match `rule` against `subject` as one top-level call.
pub(crate) fn execute(
    rule: &Node,
    table: Rc<Table>,
    subject: Subject<'_>,
    options: &Options,
    variables: &mut Variables,
) -> Result<Option<Value>, MatchError> {
    let length = subject.sequence().len();
    let start = options.start;
    let end = options.end.unwrap_or(length);
    if start > end || end > length {
        return Err(MatchError::Window { start, end, length });
    }
    tracing::debug!(start, end, length, options = %options, "match");

    let mut shared = Shared::new(table, options.case_sensitive, mem::take(variables));
    let result = run_top(rule, subject, options, start, end, &mut shared);
    *variables = mem::take(&mut shared.variables);

    match &result {
        Ok(Some(value)) => tracing::debug!(value = %value, "matched"),
        Ok(None) => tracing::debug!("no match"),
        Err(err) => tracing::debug!(error = %err, "failed"),
    }
    result
}

fn run_top(
    rule: &Node,
    subject: Subject<'_>,
    options: &Options,
    start: usize,
    end: usize,
    shared: &mut Shared,
) -> Result<Option<Value>, MatchError> {
    let mut ctx = Context {
        subject,
        series: 0,
        limit: end,
        shared,
    };
    let outcome = ctx.run(rule, start)?;
    let limit = ctx.limit;
    let (value, pos) = match outcome {
        Outcome::NoMatch => return Ok(None),
        Outcome::Matched(value, pos) => (value, pos),
        Outcome::Void(pos) => (Value::Void, pos),
    };
    if !options.partial && pos != limit {
        return Err(MatchError::Incomplete {
            index: pos,
            length: limit,
        });
    }

    let groups = shared.deferred.take_root();
    if !groups.is_empty() {
        tracing::debug!(count = groups.len(), "flushing deferred groups");
    }
    for group in &groups {
        shared.variables.evaluate(group)?;
    }
    Ok(Some(value))
}
