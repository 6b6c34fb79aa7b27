//! # Printable Byte Aliases
//!
//! The GPT-2-standard bijection between byte values and 256 printable
//! Unicode code points, used only at persistence boundaries. The printable
//! ISO/IEC 8859-1 ranges `[0x21, 0x7E]`, `[0xA1, 0xAC]`, and `[0xAE, 0xFF]`
//! map to themselves; the remaining bytes map to `char(256 + n)` in byte
//! order.

use once_cell::sync::Lazy;

use crate::types::CommonHashMap;

static BYTE_TO_ALIAS: Lazy<[char; 256]> = Lazy::new(|| {
    let printable =
        |b: u8| matches!(b, 0x21..=0x7E | 0xA1..=0xAC | 0xAE..=0xFF);

    let mut table = ['\0'; 256];
    let mut n = 0u32;
    for b in 0..=255u8 {
        table[b as usize] = if printable(b) {
            char::from(b)
        } else {
            let alias = char::from_u32(256 + n).unwrap();
            n += 1;
            alias
        };
    }
    table
});

static ALIAS_TO_BYTE: Lazy<CommonHashMap<char, u8>> = Lazy::new(|| {
    BYTE_TO_ALIAS
        .iter()
        .enumerate()
        .map(|(b, &alias)| (alias, b as u8))
        .collect()
});

/// The printable alias for a byte.
pub fn byte_to_alias(byte: u8) -> char {
    BYTE_TO_ALIAS[byte as usize]
}

/// The byte for a printable alias, if it is one.
pub fn alias_to_byte(alias: char) -> Option<u8> {
    ALIAS_TO_BYTE.get(&alias).copied()
}

/// Render a byte string as its printable alias string.
pub fn bytes_to_alias(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| byte_to_alias(b)).collect()
}

/// Decode a printable alias string back to bytes.
///
/// ## Returns
/// `None` if any character is not a printable alias.
pub fn alias_to_bytes(text: &str) -> Option<Vec<u8>> {
    text.chars().map(alias_to_byte).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bijection() {
        let mut seen = CommonHashMap::new();
        for b in 0..=255u8 {
            let alias = byte_to_alias(b);
            assert!(!alias.is_whitespace(), "alias for {b:#04x} not printable");
            assert_eq!(alias_to_byte(alias), Some(b));
            assert!(seen.insert(alias, b).is_none(), "alias reused");
        }
        assert_eq!(seen.len(), 256);
    }

    #[test]
    fn test_known_mappings() {
        // Printable ASCII is itself.
        assert_eq!(byte_to_alias(b'a'), 'a');
        assert_eq!(byte_to_alias(b'!'), '!');

        // Space is the first shifted byte after the control range.
        assert_eq!(byte_to_alias(b' '), '\u{0120}');

        // 0x00 is the first non-printable byte overall.
        assert_eq!(byte_to_alias(0x00), '\u{0100}');
    }

    #[test]
    fn test_string_roundtrip() {
        let bytes = b" hello\n\xFF";
        let alias = bytes_to_alias(bytes);
        assert_eq!(alias_to_bytes(&alias), Some(bytes.to_vec()));

        assert_eq!(alias_to_bytes("\u{0500}"), None);
    }
}
