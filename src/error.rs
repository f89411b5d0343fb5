//! Fatal errors.
//!
//! An ordinary failure to match is not an error: it is `Outcome::NoMatch`,
//! which drives backtracking and is reported to callers as `Ok(None)`.
//! Everything here unwinds to the top-level call unchanged.

use core::fmt;
use thiserror::Error;

/// Where in a rule a fatal error was raised.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Location {
    /// The name of the combinator, or the kind of rule element.
    pub combinator: String,

    /// Index of the rule element within its enclosing block.
    pub index: usize,

    /// The rule element itself, molded.
    pub element: String,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "`{}` (rule element {}: {})",
            self.combinator, self.index, self.element
        )
    }
}

/// Represents an unrecoverable error encountered while compiling or running
/// a rule.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchError {
    /// The rule cannot be compiled or run as written: a missing argument, an
    /// unknown keyword, or an illegal rule value.
    #[error("malformed rule at {location}: {message}")]
    MalformedRule { location: Location, message: String },

    /// Host code invoked from the rule signalled failure.
    #[error("{message}")]
    Raised { message: String },

    /// The rule matched but did not consume the whole subject, and partial
    /// matching was not requested.
    #[error("incomplete match: stopped at index {index} of {length}")]
    Incomplete { index: usize, length: usize },

    /// An edit of a read-only subject, or a seek to a position invalidated
    /// by an earlier edit.
    #[error("invalid mutation at {location}: {message}")]
    Mutation { location: Location, message: String },

    /// The rule source text could not be read.
    #[error("syntax error at offset {offset}: {message}")]
    Syntax { offset: usize, message: String },

    /// The requested start and end cursors do not describe a window of the
    /// subject.
    #[error("invalid window {start}..{end} for a subject of length {length}")]
    Window {
        start: usize,
        end: usize,
        length: usize,
    },
}

impl MatchError {
    /// Construct the error that host actions use to abort the whole match.
    pub fn raise<S: ToString>(message: S) -> Self {
        MatchError::Raised {
            message: message.to_string(),
        }
    }

    /// \return whether this is the top-level incomplete-match error.
    #[inline]
    pub fn is_incomplete(&self) -> bool {
        matches!(self, MatchError::Incomplete { .. })
    }
}
