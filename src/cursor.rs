//! Cursors into subject sequences, and the edit history that validates them.

use core::cmp::Ordering;
use core::fmt;
use core::hash::{Hash, Hasher};

/// Identifies one sequence within a single match call.
/// The top-level subject is always 0; every sequence entered through
/// `into` gets a fresh id.
pub type SeriesId = u32;

/// An immutable position within a subject sequence.
///
/// Cursors remember which sequence they belong to and how many edits that
/// sequence had seen when they were captured. They are only ordered against
/// cursors of the same sequence. Two cursors are equal when they name the
/// same index of the same sequence, whenever they were captured.
#[derive(Debug, Copy, Clone)]
pub struct Cursor {
    series: SeriesId,
    index: usize,
    generation: usize,
}

impl Cursor {
    #[inline]
    pub(crate) fn new(series: SeriesId, index: usize, generation: usize) -> Self {
        Self {
            series,
            index,
            generation,
        }
    }

    /// The index of the element to the right of this cursor.
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    /// The sequence this cursor points into.
    #[inline]
    pub fn series(&self) -> SeriesId {
        self.series
    }

    /// The number of edits the sequence had seen when this cursor was made.
    #[inline]
    pub fn generation(&self) -> usize {
        self.generation
    }
}

impl PartialEq for Cursor {
    fn eq(&self, other: &Self) -> bool {
        self.series == other.series && self.index == other.index
    }
}

impl Eq for Cursor {}

impl Hash for Cursor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.series.hash(state);
        self.index.hash(state);
    }
}

impl PartialOrd for Cursor {
    /// Cursors into different sequences are unordered.
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self.series != other.series {
            return None;
        }
        Some(self.index.cmp(&other.index))
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "@{}:{}", self.series, self.index)
    }
}

/// The edit points of one sequence, in the order the edits happened.
/// The number of recorded edits is the sequence's generation.
#[derive(Debug, Clone, Default)]
pub struct EditLog {
    edits: Vec<usize>,
}

impl EditLog {
    /// \return the current generation.
    #[inline]
    pub fn generation(&self) -> usize {
        self.edits.len()
    }

    /// Record an edit that changed the sequence starting at index `at`.
    pub fn record(&mut self, at: usize) {
        self.edits.push(at)
    }

    /// \return whether a cursor was invalidated by an edit made after it was
    /// captured. Edits at or after the cursor's index leave it meaningful;
    /// an earlier edit shifted what the cursor's index refers to.
    pub fn is_stale(&self, cursor: &Cursor) -> bool {
        let later = self.edits.get(cursor.generation..).unwrap_or(&[]);
        later.iter().any(|&at| at < cursor.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursors_of_different_series_are_unordered() {
        let a = Cursor::new(0, 1, 0);
        let b = Cursor::new(0, 3, 0);
        let c = Cursor::new(1, 3, 0);
        assert!(a < b);
        assert_eq!(b.partial_cmp(&c), None);
        assert_ne!(b, c);
    }

    #[test]
    fn equality_ignores_generation() {
        let before = Cursor::new(0, 2, 0);
        let after = Cursor::new(0, 2, 3);
        assert_eq!(before, after);
        assert_eq!(before.partial_cmp(&after), Some(Ordering::Equal));
        assert_ne!(before, Cursor::new(0, 3, 0));
        assert_ne!(before, Cursor::new(1, 2, 0));
    }

    #[test]
    fn staleness() {
        let mut log = EditLog::default();
        log.record(5);
        let early = Cursor::new(0, 2, log.generation());
        let late = Cursor::new(0, 8, log.generation());
        // Edits before capture never invalidate.
        assert!(!log.is_stale(&early));
        assert!(!log.is_stale(&late));

        log.record(4);
        assert!(!log.is_stale(&early));
        assert!(log.is_stale(&late));

        // An edit exactly at the cursor keeps it valid.
        let at = Cursor::new(0, 4, log.generation());
        log.record(4);
        assert!(!log.is_stale(&at));
    }
}
