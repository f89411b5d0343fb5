//! In-place edits of a mutable subject.
//!
//! Edits are not undone by backtracking. Each one is recorded in the
//! sequence's edit log so that `seek` can refuse cursors it invalidated.

use crate::compile::Node;
use crate::error::MatchError;
use crate::exec::Context;
use crate::outcome::{Outcome, Parsed};
use crate::registry::{Combinator, Param};
use crate::value::Value;

/// Run `node`'s rule child at `pos`.
/// \return the end of its match, or None.
fn matched_end(node: &Node, ctx: &mut Context<'_>, pos: usize) -> Result<Option<usize>, MatchError> {
    let Some(end) = ctx.run(node.child(), pos)?.pos() else {
        return Ok(None);
    };
    if end < pos {
        return Err(node.mutation_error(format!(
            "the rule ended at {}, before it started at {}",
            end, pos
        )));
    }
    Ok(Some(end))
}

/// `remove rule`: delete what the rule matched. The cursor stays at the
/// deletion point.
#[derive(Debug)]
pub struct Remove;

impl Combinator for Remove {
    fn name(&self) -> &str {
        "remove"
    }

    fn params(&self) -> &[Param] {
        &[Param::Parser]
    }

    fn parse(&self, node: &Node, ctx: &mut Context<'_>, pos: usize) -> Parsed {
        let Some(end) = matched_end(node, ctx, pos)? else {
            return Ok(Outcome::NoMatch);
        };
        ctx.edit(node, pos..end, &Value::Void)?;
        Ok(Outcome::Void(pos))
    }
}

/// `insert value`: splice the evaluated value in at the cursor and move
/// past it.
#[derive(Debug)]
pub struct Insert;

impl Combinator for Insert {
    fn name(&self) -> &str {
        "insert"
    }

    fn params(&self) -> &[Param] {
        &[Param::Raw]
    }

    fn parse(&self, node: &Node, ctx: &mut Context<'_>, pos: usize) -> Parsed {
        let value = ctx.evaluate(node.arg())?;
        let inserted = ctx.edit(node, pos..pos, &value)?;
        Ok(Outcome::Void(pos + inserted))
    }
}

/// `change rule value`: replace what the rule matched in one edit. The
/// value is evaluated after the rule ran, so it may use what the rule
/// bound.
#[derive(Debug)]
pub struct Change;

impl Combinator for Change {
    fn name(&self) -> &str {
        "change"
    }

    fn params(&self) -> &[Param] {
        &[Param::Parser, Param::Raw]
    }

    fn parse(&self, node: &Node, ctx: &mut Context<'_>, pos: usize) -> Parsed {
        let Some(end) = matched_end(node, ctx, pos)? else {
            return Ok(Outcome::NoMatch);
        };
        let value = ctx.evaluate(node.arg())?;
        let inserted = ctx.edit(node, pos..end, &value)?;
        Ok(Outcome::Void(pos + inserted))
    }
}
