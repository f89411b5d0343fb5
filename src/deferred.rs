//! Deferred groups.
//!
//! A `<delay>` group is queued in the innermost phase instead of running.
//! Queued groups run, in the order they were queued, once their phase
//! succeeds: an explicit `phase` rule, or the whole match for the root
//! phase. Groups queued by a node that ends in `NoMatch` are dropped.

use crate::compile::Node;
use crate::error::MatchError;
use crate::exec::Context;
use crate::outcome::{Outcome, Parsed};
use crate::registry::{Combinator, Param};
use crate::value::Value;

/// The stack of open phases. The root phase is always present.
#[derive(Debug)]
pub struct Deferred {
    phases: Vec<Vec<Value>>,
}

impl Default for Deferred {
    fn default() -> Self {
        Self::new()
    }
}

impl Deferred {
    pub fn new() -> Self {
        Self {
            phases: vec![Vec::new()],
        }
    }

    /// \return a mark recording the length of the innermost phase's queue.
    #[inline]
    pub fn mark(&self) -> usize {
        self.phases.last().map_or(0, Vec::len)
    }

    /// Drop whatever was queued since `mark`.
    pub fn rollback(&mut self, mark: usize) {
        if let Some(top) = self.phases.last_mut() {
            top.truncate(mark);
        }
    }

    pub fn open(&mut self) {
        self.phases.push(Vec::new());
    }

    /// Close the innermost phase.
    /// \return its queue. The root phase is never closed.
    pub fn close(&mut self) -> Vec<Value> {
        if self.phases.len() > 1 {
            self.phases.pop().unwrap_or_default()
        } else {
            Vec::new()
        }
    }

    pub fn push(&mut self, group: Value) {
        if let Some(top) = self.phases.last_mut() {
            top.push(group);
        }
    }

    /// Take the root phase's queue.
    pub fn take_root(&mut self) -> Vec<Value> {
        self.phases.first_mut().map(std::mem::take).unwrap_or_default()
    }
}

/// `phase rule`: run the groups deferred inside the rule as soon as it
/// succeeds.
#[derive(Debug)]
pub struct Phase;

impl Combinator for Phase {
    fn name(&self) -> &str {
        "phase"
    }

    fn params(&self) -> &[Param] {
        &[Param::Parser]
    }

    fn parse(&self, node: &Node, ctx: &mut Context<'_>, pos: usize) -> Parsed {
        ctx.deferred().open();
        let outcome = ctx.run(node.child(), pos);
        let queued = ctx.deferred().close();
        let outcome = outcome?;
        if outcome.is_match() && !queued.is_empty() {
            tracing::debug!(count = queued.len(), pos, "flushing phase");
            for group in &queued {
                ctx.evaluate(group)?;
            }
        }
        Ok(outcome)
    }
}

/// `<delay> (group)`: queue the group in the innermost phase.
#[derive(Debug)]
pub struct Delay;

impl Combinator for Delay {
    fn name(&self) -> &str {
        "<delay>"
    }

    fn params(&self) -> &[Param] {
        &[Param::Raw]
    }

    fn check(&self, node: &Node) -> Result<(), MatchError> {
        match node.arg() {
            Value::Group(_) => Ok(()),
            other => Err(node.error(format!("expected a group, not {}", other.kind()))),
        }
    }

    fn parse(&self, node: &Node, ctx: &mut Context<'_>, pos: usize) -> Parsed {
        ctx.deferred().push(node.arg().clone());
        Ok(Outcome::Void(pos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phases_nest_over_the_root() {
        let mut deferred = Deferred::new();
        deferred.push(Value::Integer(1));
        deferred.open();
        let mark = deferred.mark();
        deferred.push(Value::Integer(2));
        deferred.rollback(mark);
        deferred.push(Value::Integer(3));
        assert_eq!(deferred.close(), vec![Value::Integer(3)]);
        // The root survives any number of closes.
        assert_eq!(deferred.close(), Vec::<Value>::new());
        assert_eq!(deferred.take_root(), vec![Value::Integer(1)]);
        assert_eq!(deferred.take_root(), Vec::<Value>::new());
    }
}
