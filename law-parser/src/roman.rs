//! Roman numeral helpers for inciso identifiers.

const DIGITS: [(u32, &str); 13] = [
    (1000, "M"),
    (900, "CM"),
    (500, "D"),
    (400, "CD"),
    (100, "C"),
    (90, "XC"),
    (50, "L"),
    (40, "XL"),
    (10, "X"),
    (9, "IX"),
    (5, "V"),
    (4, "IV"),
    (1, "I"),
];

/// Convert an integer to its canonical roman form (`4` -> `"IV"`).
pub fn int_to_roman(mut n: u32) -> String {
    let mut out = String::new();
    for (value, glyph) in DIGITS {
        while n >= value {
            out.push_str(glyph);
            n -= value;
        }
    }
    out
}

/// Parse a canonical roman numeral (`"IV"` -> `Some(4)`).
///
/// Non-canonical sequences such as `IIII` or `IC` return `None`, which keeps
/// garbage like a stray `V` in running text from becoming an inciso.
pub fn roman_to_int(s: &str) -> Option<u32> {
    if s.is_empty() {
        return None;
    }
    let values = |c: char| match c {
        'I' => Some(1u32),
        'V' => Some(5),
        'X' => Some(10),
        'L' => Some(50),
        'C' => Some(100),
        'D' => Some(500),
        'M' => Some(1000),
        _ => None,
    };
    let chars: Vec<u32> = s.chars().map(values).collect::<Option<Vec<_>>>()?;
    let mut total: i64 = 0;
    for (i, v) in chars.iter().enumerate() {
        if chars.get(i + 1).is_some_and(|next| next > v) {
            total -= i64::from(*v);
        } else {
            total += i64::from(*v);
        }
    }
    let total = u32::try_from(total).ok()?;
    // Round-trip guarantees canonical form.
    (int_to_roman(total) == s).then_some(total)
}

/// True when `s` is a canonical roman numeral.
pub fn is_valid_roman(s: &str) -> bool {
    roman_to_int(s).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("I", 1)]
    #[case("IV", 4)]
    #[case("IX", 9)]
    #[case("XIV", 14)]
    #[case("XL", 40)]
    #[case("XC", 90)]
    #[case("C", 100)]
    fn parses_canonical_numerals(#[case] roman: &str, #[case] value: u32) {
        assert_eq!(roman_to_int(roman), Some(value));
        assert_eq!(int_to_roman(value), roman);
    }

    #[rstest]
    #[case("IIII")]
    #[case("IC")]
    #[case("VV")]
    #[case("")]
    #[case("A")]
    fn rejects_non_canonical(#[case] roman: &str) {
        assert_eq!(roman_to_int(roman), None);
        assert!(!is_valid_roman(roman));
    }
}
