//! Collected values.
//!
//! `collect` opens a frame; `keep` appends to the innermost open frame.
//! Appends are undone by `Context::run` when the node that made them ends
//! in `NoMatch`, so a frame only ever holds values kept along the path that
//! actually matched.

use crate::compile::Node;
use crate::exec::Context;
use crate::outcome::{Outcome, Parsed};
use crate::registry::{Combinator, Param};
use crate::value::Value;

/// The stack of open collect frames.
#[derive(Debug, Default)]
pub struct Pending {
    frames: Vec<Vec<Value>>,
}

impl Pending {
    /// \return a mark recording the length of the innermost frame.
    #[inline]
    pub fn mark(&self) -> Option<usize> {
        self.frames.last().map(Vec::len)
    }

    /// Discard whatever was kept since `mark`.
    pub fn rollback(&mut self, mark: Option<usize>) {
        if let (Some(len), Some(top)) = (mark, self.frames.last_mut()) {
            top.truncate(len);
        }
    }

    #[inline]
    pub fn is_collecting(&self) -> bool {
        !self.frames.is_empty()
    }

    pub fn open(&mut self) {
        self.frames.push(Vec::new());
    }

    /// Close the innermost frame.
    /// \return the values it collected.
    pub fn close(&mut self) -> Vec<Value> {
        self.frames.pop().unwrap_or_default()
    }

    /// Append to the innermost frame. Signals keep nothing, and splices keep
    /// each of their items.
    pub fn keep(&mut self, value: Value) {
        let Some(top) = self.frames.last_mut() else {
            return;
        };
        match value {
            Value::Null | Value::Void => {}
            Value::Splice(items) => top.extend(items),
            other => top.push(other),
        }
    }
}

/// `collect rule`: a new block of everything kept inside the rule.
#[derive(Debug)]
pub struct Collect;

impl Combinator for Collect {
    fn name(&self) -> &str {
        "collect"
    }

    fn params(&self) -> &[Param] {
        &[Param::Parser]
    }

    fn parse(&self, node: &Node, ctx: &mut Context<'_>, pos: usize) -> Parsed {
        ctx.pending().open();
        let outcome = ctx.run(node.child(), pos);
        let collected = ctx.pending().close();
        Ok(match outcome?.pos() {
            Some(end) => Outcome::Matched(Value::Block(collected), end),
            None => Outcome::NoMatch,
        })
    }
}

/// `keep rule`: add the rule's product to the innermost collect.
#[derive(Debug)]
pub struct Keep;

impl Combinator for Keep {
    fn name(&self) -> &str {
        "keep"
    }

    fn params(&self) -> &[Param] {
        &[Param::Parser]
    }

    fn parse(&self, node: &Node, ctx: &mut Context<'_>, pos: usize) -> Parsed {
        if !ctx.pending().is_collecting() {
            return Err(node.error("`keep` used outside of `collect`"));
        }
        let outcome = ctx.run(node.child(), pos)?;
        if let Outcome::Matched(value, _) = &outcome {
            ctx.pending().keep(value.clone());
        }
        Ok(outcome)
    }
}

/// `spread rule`: a block product becomes a splice, so `keep` adds its
/// items one by one.
#[derive(Debug)]
pub struct Spread;

impl Combinator for Spread {
    fn name(&self) -> &str {
        "spread"
    }

    fn params(&self) -> &[Param] {
        &[Param::Parser]
    }

    fn parse(&self, node: &Node, ctx: &mut Context<'_>, pos: usize) -> Parsed {
        Ok(match ctx.run(node.child(), pos)? {
            Outcome::Matched(Value::Block(items) | Value::Group(items), end) => {
                Outcome::Matched(Value::Splice(items), end)
            }
            outcome => outcome,
        })
    }
}
