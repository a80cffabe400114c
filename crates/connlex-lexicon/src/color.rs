//! Display colors derived from lexicon names.
//!
//! The color is a pure function of the name:
//!
//! - hash: 32-bit multiplicative string hash (`h = 31 * h + unit`) over the
//!   UTF-16 code units of the name, with wrapping arithmetic
//! - color: the low 24 bits of the hash, masked before formatting so negative
//!   hashes still produce a valid code
//! - output: exactly 6 lowercase hex digits, no `#`

/// 32-bit string hash over UTF-16 code units.
pub fn name_hash(name: &str) -> i32 {
    name.encode_utf16().fold(0i32, |hash, unit| {
        (hash << 5).wrapping_sub(hash).wrapping_add(i32::from(unit))
    })
}

/// Six lowercase hex digits for `name`.
pub fn lexicon_color(name: &str) -> String {
    let rgb = (name_hash(name) as u32) & 0x00FF_FFFF;
    format!("{rgb:06x}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn known_hashes() {
        assert_eq!(name_hash(""), 0);
        assert_eq!(name_hash("a"), 97);
        assert_eq!(name_hash("hello"), 99_162_322);
        assert_eq!(name_hash("polygenelubricants"), i32::MIN);
    }

    #[test]
    fn colors_are_masked_and_padded() {
        assert_eq!(lexicon_color("hello"), "e918d2");
        assert_eq!(lexicon_color("a"), "000061");
        assert_eq!(lexicon_color(""), "000000");
        assert_eq!(lexicon_color("polygenelubricants"), "000000");
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(256))]

        #[test]
        fn color_is_six_lowercase_hex_digits(name in ".{0,40}") {
            let color = lexicon_color(&name);
            prop_assert_eq!(color.len(), 6);
            prop_assert!(color.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
            prop_assert_eq!(color, lexicon_color(&name.clone()));
        }
    }
}
