//! Facilities for searching bytes, used as start predicates when scanning
//! binary subjects.

extern crate memchr;

/// \return the first index of `needle` in `haystack`, or None.
/// ASCII letters compare case-insensitively unless `case_sensitive`.
pub fn find_literal(haystack: &[u8], needle: &[u8], case_sensitive: bool) -> Option<usize> {
    let Some(&first) = needle.first() else {
        return Some(0);
    };
    if case_sensitive || !needle.iter().any(u8::is_ascii_alphabetic) {
        if needle.len() == 1 {
            return memchr::memchr(first, haystack);
        }
        return memchr::memmem::find(haystack, needle);
    }

    // Find candidates by their first byte in either case, then verify.
    let (lower, upper) = (first.to_ascii_lowercase(), first.to_ascii_uppercase());
    let mut from = 0;
    while let Some(offset) = memchr::memchr2(lower, upper, &haystack[from..]) {
        let at = from + offset;
        let rest = &haystack[at..];
        if rest.len() < needle.len() {
            return None;
        }
        if rest[..needle.len()].eq_ignore_ascii_case(needle) {
            return Some(at);
        }
        from = at + 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_search() {
        assert_eq!(find_literal(&[], &[], true), Some(0));
        assert_eq!(find_literal(b"abc", &[], false), Some(0));
        assert_eq!(find_literal(&[], b"a", true), None);
    }

    #[test]
    fn literal_search() {
        let haystack = b"the quick brown fox";
        assert_eq!(find_literal(haystack, b"t", true), Some(0));
        assert_eq!(find_literal(haystack, b"q", true), Some(4));
        assert_eq!(find_literal(haystack, b"brown", true), Some(10));
        assert_eq!(find_literal(haystack, b"fox", true), Some(16));
        assert_eq!(find_literal(haystack, b"foxes", true), None);
        assert_eq!(find_literal(haystack, b"z", true), None);
        assert_eq!(find_literal(&[0, 1, 255, 2], &[255, 2], true), Some(2));
    }

    #[test]
    fn case_folding_search() {
        let haystack = b"xxAbCxxaBc";
        assert_eq!(find_literal(haystack, b"abc", true), None);
        assert_eq!(find_literal(haystack, b"AbC", true), Some(2));
        assert_eq!(find_literal(haystack, b"abc", false), Some(2));
        assert_eq!(find_literal(&haystack[3..], b"ABC", false), Some(4));
        assert_eq!(find_literal(b"ab", b"abc", false), None);
        // Non-letters never fold.
        assert_eq!(find_literal(b"a1b2", b"2", false), Some(3));
    }
}
