//! Case-sensitive and case-insensitive comparisons over raw byte slices.
//!
//! Every comparison here works directly on `(buffer, offset, length)` style
//! slices so that name comparisons against the [element registry](crate::registry)
//! never need to allocate or lowercase a copy of the input. Case folding is
//! ASCII-only: non-ASCII bytes are compared by identity, matching the HTML
//! and XML specs' treatment of tag/attribute names.

/// Returns `true` if `a` and `b` are equal, treating ASCII letters as
/// case-insensitive and comparing all other bytes by identity.
#[inline]
pub fn eq_ignore_ascii_case(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.eq_ignore_ascii_case(b)
}

/// Returns `true` if `a` and `b` are byte-for-byte identical.
#[inline]
pub fn eq_case_sensitive(a: &[u8], b: &[u8]) -> bool {
    a == b
}

/// Returns `true` if `haystack` starts with `prefix`, folding ASCII case.
#[inline]
pub fn starts_with_ignore_ascii_case(haystack: &[u8], prefix: &[u8]) -> bool {
    haystack.len() >= prefix.len() && haystack[..prefix.len()].eq_ignore_ascii_case(prefix)
}

/// Returns `true` if `haystack` starts with `prefix`, comparing bytes exactly.
#[inline]
pub fn starts_with_case_sensitive(haystack: &[u8], prefix: &[u8]) -> bool {
    haystack.starts_with(prefix)
}

/// Compares two names according to a dialect's case sensitivity.
#[inline]
pub fn eq_name(a: &[u8], b: &[u8], case_sensitive: bool) -> bool {
    if case_sensitive {
        eq_case_sensitive(a, b)
    } else {
        eq_ignore_ascii_case(a, b)
    }
}

/// Returns `true` if `b` is a byte (ASCII) whitespace character as defined by
/// the tokenizer: space, tab, `\n`, `\r`, or form feed.
#[inline]
pub fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r' | 0x0C)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_case_insensitive_equality() {
        assert!(eq_ignore_ascii_case(b"SCRIPT", b"script"));
        assert!(eq_ignore_ascii_case(b"Script", b"SCRIPT"));
        assert!(!eq_ignore_ascii_case(b"script", b"scripts"));
    }

    #[test]
    fn non_ascii_bytes_compare_by_identity() {
        // 0xC3 0xA9 is "é" in UTF-8; folding must not touch it.
        assert!(eq_ignore_ascii_case(&[0xC3, 0xA9], &[0xC3, 0xA9]));
        assert!(!eq_ignore_ascii_case(&[0xC3, 0xA9], &[0xC3, 0x89]));
    }

    #[test]
    fn prefix_checks() {
        assert!(starts_with_ignore_ascii_case(b"DOCTYPE html", b"doctype"));
        assert!(!starts_with_ignore_ascii_case(b"DOC", b"doctype"));
        assert!(starts_with_case_sensitive(b"xml version", b"xml"));
        assert!(!starts_with_case_sensitive(b"XML version", b"xml"));
    }
}
