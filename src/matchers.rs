//! Combinators that match single elements or literal spans.

use crate::bytesearch;
use crate::compile::Node;
use crate::exec::Context;
use crate::indexing::{literal_bytes, Sequence};
use crate::outcome::{Outcome, Parsed};
use crate::registry::{Combinator, Scan};
use crate::value::Value;

/// A literal rule value matches itself.
///
/// Against a list the product is the matched element itself; against text
/// or bytes it is the literal.
#[derive(Debug)]
pub struct Literal;

impl Combinator for Literal {
    fn name(&self) -> &str {
        "literal"
    }

    fn parse(&self, node: &Node, ctx: &mut Context<'_>, pos: usize) -> Parsed {
        let lit = node.literal();
        let Some(end) = ctx
            .sequence()
            .match_literal(pos, ctx.limit(), lit, ctx.case_sensitive())
        else {
            return Ok(Outcome::NoMatch);
        };
        let product = match ctx.sequence() {
            Sequence::List(_) => ctx.at(pos).map(|e| e.to_value()),
            Sequence::Text(_) | Sequence::Bytes(_) => None,
        };
        Ok(Outcome::Matched(
            product.unwrap_or_else(|| lit.unquote().clone()),
            end,
        ))
    }

    /// Text and binary literals may span several elements of a string
    /// subject; only single-element ones can be excluded.
    fn excludes_one(&self, node: &Node) -> bool {
        match node.literal().unquote() {
            Value::Text(s) => s.chars().count() == 1,
            Value::Binary(b) => b.len() == 1,
            _ => true,
        }
    }

    fn scan(&self, node: &Node, ctx: &Context<'_>, from: usize) -> Scan {
        let Sequence::Bytes(bytes) = ctx.sequence() else {
            return Scan::Anywhere;
        };
        let Some(needle) = literal_bytes(node.literal()) else {
            return Scan::Anywhere;
        };
        let folds = !ctx.case_sensitive()
            && matches!(node.literal().unquote(), Value::Text(_) | Value::Char(_));
        let window = bytes.get(from..ctx.limit()).unwrap_or(&[]);
        match bytesearch::find_literal(window, &needle, !folds) {
            Some(offset) => Scan::At(from + offset),
            None => Scan::Nowhere,
        }
    }
}

/// A datatype marker matches one element of that kind.
#[derive(Debug)]
pub struct Typecheck;

impl Combinator for Typecheck {
    fn name(&self) -> &str {
        "typecheck"
    }

    fn parse(&self, node: &Node, ctx: &mut Context<'_>, pos: usize) -> Parsed {
        let Value::Datatype(kind) = node.literal() else {
            return Err(node.error("expected a datatype"));
        };
        match ctx.at(pos) {
            Some(e) if e.kind() == *kind => Ok(Outcome::Matched(e.to_value(), pos + 1)),
            _ => Ok(Outcome::NoMatch),
        }
    }

    fn excludes_one(&self, _node: &Node) -> bool {
        true
    }
}

/// `<any>`: one element, whatever it is.
#[derive(Debug)]
pub struct AnyElement;

impl Combinator for AnyElement {
    fn name(&self) -> &str {
        "<any>"
    }

    fn parse(&self, _node: &Node, ctx: &mut Context<'_>, pos: usize) -> Parsed {
        Ok(match ctx.at(pos) {
            Some(e) => Outcome::Matched(e.to_value(), pos + 1),
            None => Outcome::NoMatch,
        })
    }

    fn excludes_one(&self, _node: &Node) -> bool {
        true
    }
}

/// `<end>`: matches only at the end of the window.
#[derive(Debug)]
pub struct End;

impl Combinator for End {
    fn name(&self) -> &str {
        "<end>"
    }

    fn parse(&self, _node: &Node, ctx: &mut Context<'_>, pos: usize) -> Parsed {
        Ok(if ctx.is_end(pos) {
            Outcome::Void(pos)
        } else {
            Outcome::NoMatch
        })
    }

    fn scan(&self, _node: &Node, ctx: &Context<'_>, from: usize) -> Scan {
        Scan::At(ctx.limit().max(from))
    }
}

/// The void signal as a rule: inert success.
#[derive(Debug)]
pub struct VoidRule;

impl Combinator for VoidRule {
    fn name(&self) -> &str {
        "void"
    }

    fn parse(&self, _node: &Node, _ctx: &mut Context<'_>, pos: usize) -> Parsed {
        Ok(Outcome::Void(pos))
    }
}
