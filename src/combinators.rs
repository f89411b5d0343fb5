//! Structural combinators: sequencing, choice, repetition, lookahead,
//! capture and cursor movement.

use crate::compile::{Compiler, Node};
use crate::error::MatchError;
use crate::exec::Context;
use crate::outcome::{Outcome, Parsed};
use crate::registry::{Combinator, Param, Scan};
use crate::value::Value;

/// Children in order. The product is the last non-void child's.
#[derive(Debug)]
pub struct SequenceRule;

impl Combinator for SequenceRule {
    fn name(&self) -> &str {
        "sequence"
    }

    fn parse(&self, node: &Node, ctx: &mut Context<'_>, pos: usize) -> Parsed {
        let mut pos = pos;
        let mut product = None;
        for child in node.children() {
            match ctx.run(child, pos)? {
                Outcome::NoMatch => return Ok(Outcome::NoMatch),
                Outcome::Matched(value, next) => {
                    product = Some(value);
                    pos = next;
                }
                Outcome::Void(next) => pos = next,
            }
            if ctx.stopping() {
                break;
            }
        }
        Ok(match product {
            Some(value) => Outcome::Matched(value, pos),
            None => Outcome::Void(pos),
        })
    }
}

/// Ordered choice: the first alternative that matches wins.
#[derive(Debug)]
pub struct Alternatives;

impl Combinator for Alternatives {
    fn name(&self) -> &str {
        "alternatives"
    }

    fn parse(&self, node: &Node, ctx: &mut Context<'_>, pos: usize) -> Parsed {
        for alternative in node.children() {
            let outcome = ctx.run(alternative, pos)?;
            if outcome.is_match() {
                return Ok(outcome);
            }
        }
        Ok(Outcome::NoMatch)
    }
}

/// A block used as a rule.
#[derive(Debug)]
pub struct SubRule;

impl Combinator for SubRule {
    fn name(&self) -> &str {
        "rule"
    }

    fn prepare(&self, literal: &Value, compiler: &Compiler<'_>) -> Result<Vec<Node>, MatchError> {
        match literal {
            Value::Block(items) => Ok(vec![compiler.compile_block(items)?]),
            _ => Ok(Vec::new()),
        }
    }

    fn check(&self, node: &Node) -> Result<(), MatchError> {
        if node.children().is_empty() {
            return Err(node.error("expected a block"));
        }
        Ok(())
    }

    fn parse(&self, node: &Node, ctx: &mut Context<'_>, pos: usize) -> Parsed {
        ctx.run(node.child(), pos)
    }
}

/// A word used as a rule: the rule held by the variable of that name,
/// compiled when first reached.
#[derive(Debug)]
pub struct VariableRule;

impl Combinator for VariableRule {
    fn name(&self) -> &str {
        "word"
    }

    fn parse(&self, node: &Node, ctx: &mut Context<'_>, pos: usize) -> Parsed {
        let Value::Word(name) = node.literal() else {
            return Err(node.error("expected a word"));
        };
        let rule = ctx.rule_for(node, name)?;
        ctx.run(&rule, pos)
    }
}

/// A group runs when reached, even inside an alternative that later fails.
/// Its result is the product; nothing is consumed.
#[derive(Debug)]
pub struct Evaluate;

impl Combinator for Evaluate {
    fn name(&self) -> &str {
        "group"
    }

    fn parse(&self, node: &Node, ctx: &mut Context<'_>, pos: usize) -> Parsed {
        Ok(match ctx.evaluate(node.literal())? {
            Value::Void => Outcome::Void(pos),
            value => Outcome::Matched(value, pos),
        })
    }
}

/// A get-group evaluates to a rule, which is compiled and run in place.
#[derive(Debug)]
pub struct Inject;

impl Combinator for Inject {
    fn name(&self) -> &str {
        "get-group"
    }

    fn parse(&self, node: &Node, ctx: &mut Context<'_>, pos: usize) -> Parsed {
        let rule = match ctx.evaluate(node.literal())? {
            Value::Void => return Ok(Outcome::Void(pos)),
            Value::Null => return Err(node.error("the group evaluated to null")),
            value => value,
        };
        let table = ctx.table();
        let compiler = Compiler::new(&table);
        let compiled = match &rule {
            Value::Block(items) => compiler.compile_block(items)?,
            other => compiler.compile_block(core::slice::from_ref(other))?,
        };
        ctx.run(&compiled, pos)
    }
}

/// `here`: the current position, as a cursor.
#[derive(Debug)]
pub struct Here;

impl Combinator for Here {
    fn name(&self) -> &str {
        "here"
    }

    fn parse(&self, _node: &Node, ctx: &mut Context<'_>, pos: usize) -> Parsed {
        Ok(Outcome::Matched(Value::Position(ctx.cursor(pos)), pos))
    }
}

/// Run `child` between `min` and `max` times. The product is the last
/// iteration's; zero iterations are void.
fn repeat(node: &Node, ctx: &mut Context<'_>, pos: usize, min: usize, max: Option<usize>) -> Parsed {
    let child = node.child();
    let mut pos = pos;
    let mut count = 0;
    let mut last = Outcome::Void(pos);
    while max.map_or(true, |max| count < max) {
        let edits = ctx.edits();
        let outcome = ctx.run_iteration(child, pos)?;
        let Some(next) = outcome.pos() else {
            break;
        };
        let stopping = ctx.take_stop();
        if max.is_none() && next == pos && ctx.edits() == edits && !stopping {
            return Err(node.error("loop body succeeded without advancing"));
        }
        count += 1;
        pos = next;
        last = outcome;
        if stopping {
            break;
        }
    }
    if count < min {
        return Ok(Outcome::NoMatch);
    }
    Ok(last)
}

/// `some` and `while`: unbounded repetition.
#[derive(Debug)]
pub struct Repeat {
    name: &'static str,
    min: usize,
    max: Option<usize>,
}

impl Repeat {
    pub const fn new(name: &'static str, min: usize, max: Option<usize>) -> Self {
        Self { name, min, max }
    }
}

impl Combinator for Repeat {
    fn name(&self) -> &str {
        self.name
    }

    fn params(&self) -> &[Param] {
        &[Param::Parser]
    }

    fn parse(&self, node: &Node, ctx: &mut Context<'_>, pos: usize) -> Parsed {
        repeat(node, ctx, pos, self.min, self.max)
    }
}

/// \return the bounds described by a repeat count: an integer, or a block
/// of `[min max]` where a blank max is unbounded.
fn count_bounds(count: &Value) -> Result<(usize, Option<usize>), String> {
    let bound = |v: &Value| match v {
        Value::Integer(i) => usize::try_from(*i).map_err(|_| format!("negative count {}", i)),
        other => Err(format!("{} is not a count", other.kind())),
    };
    match count {
        Value::Integer(_) => {
            let n = bound(count)?;
            Ok((n, Some(n)))
        }
        Value::Block(items) => match items.as_slice() {
            [min, Value::Blank] => Ok((bound(min)?, None)),
            [min, max] => {
                let (min, max) = (bound(min)?, bound(max)?);
                if max < min {
                    return Err(format!("max {} is less than min {}", max, min));
                }
                Ok((min, Some(max)))
            }
            _ => Err("a count block must hold [min max]".to_string()),
        },
        other => Err(format!("{} is not a count", other.kind())),
    }
}

/// `repeat <count> rule`.
#[derive(Debug)]
pub struct RepeatCount;

impl Combinator for RepeatCount {
    fn name(&self) -> &str {
        "repeat"
    }

    fn params(&self) -> &[Param] {
        &[Param::Raw, Param::Parser]
    }

    fn check(&self, node: &Node) -> Result<(), MatchError> {
        match node.arg() {
            // Computed counts are checked when they are known.
            Value::Word(_) | Value::Group(_) => Ok(()),
            count => count_bounds(count).map(|_| ()).map_err(|msg| node.error(msg)),
        }
    }

    fn parse(&self, node: &Node, ctx: &mut Context<'_>, pos: usize) -> Parsed {
        let count = ctx.evaluate(node.arg())?;
        let (min, max) = count_bounds(&count).map_err(|msg| node.error(msg))?;
        repeat(node, ctx, pos, min, max)
    }
}

/// `opt rule`: null when the rule does not match.
#[derive(Debug)]
pub struct Opt;

impl Combinator for Opt {
    fn name(&self) -> &str {
        "opt"
    }

    fn params(&self) -> &[Param] {
        &[Param::Parser]
    }

    fn parse(&self, node: &Node, ctx: &mut Context<'_>, pos: usize) -> Parsed {
        Ok(match ctx.run(node.child(), pos)? {
            Outcome::NoMatch => Outcome::Matched(Value::Null, pos),
            outcome => outcome,
        })
    }
}

/// `stop`: succeed, and end the innermost loop after this iteration.
/// Outside of a loop there is nothing to end, which is an error.
#[derive(Debug)]
pub struct Stop;

impl Combinator for Stop {
    fn name(&self) -> &str {
        "stop"
    }

    fn parse(&self, node: &Node, ctx: &mut Context<'_>, pos: usize) -> Parsed {
        if !ctx.in_loop() {
            return Err(node.error("`stop` used outside of a loop"));
        }
        ctx.stop();
        Ok(Outcome::Void(pos))
    }
}

/// `veto`: never matches.
#[derive(Debug)]
pub struct Veto;

impl Combinator for Veto {
    fn name(&self) -> &str {
        "veto"
    }

    fn parse(&self, _node: &Node, _ctx: &mut Context<'_>, _pos: usize) -> Parsed {
        Ok(Outcome::NoMatch)
    }
}

/// `ahead rule`: match without advancing.
#[derive(Debug)]
pub struct Ahead;

impl Combinator for Ahead {
    fn name(&self) -> &str {
        "ahead"
    }

    fn params(&self) -> &[Param] {
        &[Param::Parser]
    }

    fn parse(&self, node: &Node, ctx: &mut Context<'_>, pos: usize) -> Parsed {
        Ok(ctx.run(node.child(), pos)?.at(pos))
    }
}

/// `not rule`: succeed, without advancing, only where the rule fails.
#[derive(Debug)]
pub struct Not;

impl Combinator for Not {
    fn name(&self) -> &str {
        "not"
    }

    fn params(&self) -> &[Param] {
        &[Param::Parser]
    }

    fn parse(&self, node: &Node, ctx: &mut Context<'_>, pos: usize) -> Parsed {
        Ok(if ctx.run(node.child(), pos)?.is_match() {
            Outcome::NoMatch
        } else {
            Outcome::Void(pos)
        })
    }
}

/// `except rule`: one element, provided the rule does not match there.
/// Only rules that themselves match single elements may be negated.
#[derive(Debug)]
pub struct Except;

impl Combinator for Except {
    fn name(&self) -> &str {
        "except"
    }

    fn params(&self) -> &[Param] {
        &[Param::Parser]
    }

    fn check(&self, node: &Node) -> Result<(), MatchError> {
        let child = node.child();
        if !child.combinator().excludes_one(child) {
            return Err(node.error(format!(
                "`{}` does not match a single element and cannot be excluded",
                child.name()
            )));
        }
        Ok(())
    }

    fn parse(&self, node: &Node, ctx: &mut Context<'_>, pos: usize) -> Parsed {
        let Some(element) = ctx.at(pos).map(|e| e.to_value()) else {
            return Ok(Outcome::NoMatch);
        };
        if ctx.run(node.child(), pos)?.is_match() {
            return Ok(Outcome::NoMatch);
        }
        Ok(Outcome::Matched(element, pos + 1))
    }
}

/// `across rule`: the span the rule consumed, whatever it produced.
#[derive(Debug)]
pub struct Across;

impl Combinator for Across {
    fn name(&self) -> &str {
        "across"
    }

    fn params(&self) -> &[Param] {
        &[Param::Parser]
    }

    fn parse(&self, node: &Node, ctx: &mut Context<'_>, pos: usize) -> Parsed {
        let Some(end) = ctx.run(node.child(), pos)?.pos() else {
            return Ok(Outcome::NoMatch);
        };
        if end < pos || end > ctx.sequence().len() {
            return Err(node.error(format!("cannot capture the span {}..{}", pos, end)));
        }
        Ok(Outcome::Matched(ctx.sequence().span(pos..end), end))
    }
}

/// `seek target`: jump to a captured cursor or an index.
#[derive(Debug)]
pub struct Seek;

impl Combinator for Seek {
    fn name(&self) -> &str {
        "seek"
    }

    fn params(&self) -> &[Param] {
        &[Param::Raw]
    }

    fn parse(&self, node: &Node, ctx: &mut Context<'_>, _pos: usize) -> Parsed {
        let target = ctx.resolve(node, node.arg())?;
        Ok(Outcome::Void(target))
    }
}

/// `to rule` and `thru rule`: scan forward for the first position where
/// the rule matches. `to` leaves the cursor before the match and `thru`
/// after it; both produce what the rule produced.
#[derive(Debug)]
pub struct ScanTo {
    thru: bool,
}

impl ScanTo {
    pub const fn to() -> Self {
        Self { thru: false }
    }

    pub const fn thru() -> Self {
        Self { thru: true }
    }
}

impl Combinator for ScanTo {
    fn name(&self) -> &str {
        if self.thru {
            "thru"
        } else {
            "to"
        }
    }

    fn params(&self) -> &[Param] {
        &[Param::Parser]
    }

    fn parse(&self, node: &Node, ctx: &mut Context<'_>, pos: usize) -> Parsed {
        let child = node.child();
        let mut at = pos;
        loop {
            match child.combinator().scan(child, ctx, at) {
                Scan::Nowhere => return Ok(Outcome::NoMatch),
                Scan::At(next) if next > ctx.limit() => return Ok(Outcome::NoMatch),
                Scan::At(next) => at = next.max(at),
                Scan::Anywhere => {}
            }
            let outcome = ctx.run(child, at)?;
            if outcome.is_match() {
                return Ok(if self.thru { outcome } else { outcome.at(at) });
            }
            if ctx.is_end(at) {
                return Ok(Outcome::NoMatch);
            }
            at += 1;
        }
    }
}

/// `into rule`: match the rule against the nested sequence at the cursor.
#[derive(Debug)]
pub struct IntoNested;

impl Combinator for IntoNested {
    fn name(&self) -> &str {
        "into"
    }

    fn params(&self) -> &[Param] {
        &[Param::Parser]
    }

    fn parse(&self, node: &Node, ctx: &mut Context<'_>, pos: usize) -> Parsed {
        ctx.enter(node.child(), pos)
    }
}
