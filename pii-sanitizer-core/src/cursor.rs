//! Caret reconciliation after a rewrite.
//!
//! Not a diff-based mapping: when regex rules change text ahead of the caret
//! and no literal anchor exists, the caret is only clamped, so it may drift
//! by the length difference of those rewrites.

/// Number of characters in `text`; the unit of every caret offset.
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Computes the caret offset in `transformed`.
///
/// * no caret requested: `None`
/// * paste: end of the transformed text
/// * a literal-rule anchor was recorded: the anchor
/// * caret was at the end of `original`: end of the transformed text
/// * otherwise: the old offset, clamped to the new length
pub fn reconcile(
    original: &str,
    transformed: &str,
    cursor: Option<usize>,
    is_paste: bool,
    anchor: Option<usize>,
) -> Option<usize> {
    let cursor = cursor?;
    let new_len = char_len(transformed);

    if is_paste {
        return Some(new_len);
    }
    if let Some(anchor) = anchor {
        return Some(anchor);
    }
    if cursor == char_len(original) {
        return Some(new_len);
    }
    Some(cursor.min(new_len))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_cursor_requested() {
        assert_eq!(reconcile("abc", "xyz", None, false, Some(2)), None);
        assert_eq!(reconcile("abc", "xyz", None, true, None), None);
    }

    #[test]
    fn test_paste_goes_to_end_for_any_offset() {
        for offset in 0..=10 {
            assert_eq!(reconcile("0123456789", "short", Some(offset), true, Some(3)), Some(5));
        }
    }

    #[test]
    fn test_anchor_wins_over_end_of_text() {
        assert_eq!(reconcile("xasdy", "xWEEEeeeEEEEy", Some(5), false, Some(12)), Some(12));
    }

    #[test]
    fn test_end_anchored_caret_follows_new_end() {
        assert_eq!(reconcile("call 123", "call XXXXXXX", Some(8), false, None), Some(12));
        assert_eq!(reconcile("a long line", "short", Some(11), false, None), Some(5));
    }

    #[test]
    fn test_mid_text_caret_is_clamped() {
        assert_eq!(reconcile("abcdefgh", "abcdefgh!", Some(3), false, None), Some(3));
        assert_eq!(reconcile("abcdefgh", "ab", Some(5), false, None), Some(2));
    }

    #[test]
    fn test_offsets_count_characters_not_bytes() {
        assert_eq!(reconcile("héllo", "héllo wörld", Some(5), false, None), Some(11));
    }
}
