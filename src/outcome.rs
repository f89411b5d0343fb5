//! The result of running one compiled node.

use crate::error::MatchError;
use crate::value::Value;

/// What a combinator produced at a position.
///
/// Positions are indexes into the sequence the combinator ran against.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Matched, synthesizing a value, leaving the cursor at the position.
    Matched(Value, usize),

    /// Matched without a usable value.
    Void(usize),

    /// An ordinary failure. Triggers backtracking.
    NoMatch,
}

/// Combinators return an Outcome, or a fatal error which no combinator
/// catches.
pub type Parsed = Result<Outcome, MatchError>;

impl Outcome {
    /// \return the position after a match, or None on failure.
    #[inline]
    pub fn pos(&self) -> Option<usize> {
        match self {
            Outcome::Matched(_, pos) | Outcome::Void(pos) => Some(*pos),
            Outcome::NoMatch => None,
        }
    }

    #[inline]
    pub fn is_match(&self) -> bool {
        !matches!(self, Outcome::NoMatch)
    }

    /// \return the synthesized value, void for a void match.
    pub fn into_value(self) -> Option<Value> {
        match self {
            Outcome::Matched(v, _) => Some(v),
            Outcome::Void(_) => Some(Value::Void),
            Outcome::NoMatch => None,
        }
    }

    /// Keep the product but report a different position.
    pub fn at(self, pos: usize) -> Outcome {
        match self {
            Outcome::Matched(v, _) => Outcome::Matched(v, pos),
            Outcome::Void(_) => Outcome::Void(pos),
            Outcome::NoMatch => Outcome::NoMatch,
        }
    }
}
