//! Positional string insertion.

/// Insert `fragment` into `original` at byte `offset`.
///
/// The result is always `original[..offset] + fragment + original[offset..]`
/// for a valid offset. Invalid offsets are clamped instead of failing:
/// past-the-end offsets clamp to `original.len()`, and an offset inside a
/// multi-byte character moves back to that character's start.
pub fn insert_at(original: &str, fragment: &str, offset: usize) -> String {
    let offset = clamp_to_boundary(original, offset);

    let mut out = String::with_capacity(original.len() + fragment.len());
    out.push_str(&original[..offset]);
    out.push_str(fragment);
    out.push_str(&original[offset..]);
    out
}

/// Nearest char boundary at or before `offset`, capped at `s.len()`.
fn clamp_to_boundary(s: &str, offset: usize) -> usize {
    let mut offset = offset.min(s.len());
    while !s.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concatenation_law_holds_for_every_offset() {
        let original = "<head></head><body></body>";
        let fragment = "<style>a{}</style>";
        for offset in 0..=original.len() {
            let result = insert_at(original, fragment, offset);
            assert_eq!(result.len(), original.len() + fragment.len());
            assert_eq!(
                result,
                format!("{}{}{}", &original[..offset], fragment, &original[offset..])
            );
        }
    }

    #[test]
    fn insert_at_edges() {
        assert_eq!(insert_at("abc", "X", 0), "Xabc");
        assert_eq!(insert_at("abc", "X", 3), "abcX");
        assert_eq!(insert_at("", "X", 0), "X");
        assert_eq!(insert_at("abc", "", 1), "abc");
    }

    #[test]
    fn past_the_end_offset_clamps_to_length() {
        assert_eq!(insert_at("abc", "X", 99), "abcX");
    }

    #[test]
    fn mid_character_offset_moves_to_char_start() {
        // 'é' is two bytes: offsets 1..3
        let original = "aéb";
        assert_eq!(insert_at(original, "X", 2), "aXéb");
        assert_eq!(insert_at(original, "X", 3), "aéXb");
    }
}
