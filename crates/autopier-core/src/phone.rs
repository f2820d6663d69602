// SPDX-FileCopyrightText: 2026 AutoPier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Phone number normalization.
//!
//! The phone number is the durable customer identity. Comparisons always
//! happen on the normalized form: every non-ASCII-digit character stripped.

/// Strip all non-digit characters from a phone number.
pub fn normalize_phone(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Whether two phone numbers identify the same customer.
pub fn phones_match(a: &str, b: &str) -> bool {
    let a = normalize_phone(a);
    !a.is_empty() && a == normalize_phone(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_strips_formatting() {
        assert_eq!(normalize_phone("(69) 9 9371-6918"), "69993716918");
        assert_eq!(normalize_phone("69 99371 6918"), "69993716918");
        assert_eq!(normalize_phone("69993716918"), "69993716918");
        assert_eq!(normalize_phone("+55 (11) 99999-8888"), "5511999998888");
    }

    #[test]
    fn formatted_variants_match_each_other() {
        assert!(phones_match("(69) 9 9371-6918", "69993716918"));
        assert!(phones_match("69 99371 6918", "(69) 9 9371-6918"));
        assert!(!phones_match("69993716918", "69993716917"));
    }

    #[test]
    fn empty_phones_never_match() {
        assert!(!phones_match("", ""));
        assert!(!phones_match("---", "---"));
    }
}
