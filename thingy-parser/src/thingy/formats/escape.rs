//! String literal escaping
//!
//!     Inside a quoted literal the delimiter is written twice, and `%` introduces an escape:
//!
//!         %%       a literal `%`
//!         %n       a line feed
//!         %uXXXX   one UTF-16 code unit, hex (surrogate pairs are written as two escapes)
//!
//!     Any other `%` stands for itself. The other quote character needs no escaping.

use crate::thingy::token::Quote;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EscapeError {
    #[error("incomplete %u escape")]
    Incomplete,
    #[error("'%u{0}' is not a hex escape")]
    InvalidHex(String),
    #[error("unpaired surrogate %u{0:04x}")]
    UnpairedSurrogate(u16),
}

/// Escape `value` for use between `quote` delimiters.
pub fn encode(value: &str, quote: Quote) -> String {
    let delimiter = quote.as_char();
    let mut out = String::with_capacity(value.len() + 2);
    for c in value.chars() {
        match c {
            '%' => out.push_str("%%"),
            '\n' => out.push_str("%n"),
            '\r' => out.push_str("%u000d"),
            c if c == delimiter => {
                out.push(c);
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out
}

/// Escape every character that is not a letter or digit with `%uXXXX`.
pub fn encode_all(value: &str) -> String {
    let mut out = String::with_capacity(value.len() * 2);
    let mut units = [0u16; 2];
    for c in value.chars() {
        if c.is_alphanumeric() {
            out.push(c);
            continue;
        }
        for unit in c.encode_utf16(&mut units) {
            out.push_str(&format!("%u{:04x}", unit));
        }
    }
    out
}

/// `value` escaped and wrapped in delimiters.
pub fn quote(value: &str, quote: Quote) -> String {
    let delimiter = quote.as_char();
    let mut out = String::with_capacity(value.len() + 2);
    out.push(delimiter);
    out.push_str(&encode(value, quote));
    out.push(delimiter);
    out
}

/// Undo [encode] (and [encode_all]) on the body of a literal, delimiters already stripped.
pub fn decode(body: &str, quote: Quote) -> Result<String, EscapeError> {
    let delimiter = quote.as_char();
    let chars: Vec<char> = body.chars().collect();
    let mut out = String::with_capacity(body.len());
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c == delimiter && chars.get(i + 1) == Some(&delimiter) {
            out.push(delimiter);
            i += 2;
            continue;
        }
        if c != '%' {
            out.push(c);
            i += 1;
            continue;
        }
        match chars.get(i + 1) {
            Some('%') => {
                out.push('%');
                i += 2;
            }
            Some('n') => {
                out.push('\n');
                i += 2;
            }
            Some('u') => {
                let unit = hex_unit(&chars, i + 2)?;
                i += 6;
                match unit {
                    0xD800..=0xDBFF => {
                        let low = match (chars.get(i), chars.get(i + 1)) {
                            (Some('%'), Some('u')) => hex_unit(&chars, i + 2)?,
                            _ => return Err(EscapeError::UnpairedSurrogate(unit)),
                        };
                        if !(0xDC00..=0xDFFF).contains(&low) {
                            return Err(EscapeError::UnpairedSurrogate(unit));
                        }
                        i += 6;
                        let code = 0x10000 + (((unit as u32) - 0xD800) << 10) + ((low as u32) - 0xDC00);
                        // a valid pair always lands in the supplementary planes
                        out.extend(char::from_u32(code));
                    }
                    0xDC00..=0xDFFF => return Err(EscapeError::UnpairedSurrogate(unit)),
                    _ => out.extend(char::from_u32(unit as u32)),
                }
            }
            _ => {
                out.push('%');
                i += 1;
            }
        }
    }
    Ok(out)
}

fn hex_unit(chars: &[char], start: usize) -> Result<u16, EscapeError> {
    if start + 4 > chars.len() {
        return Err(EscapeError::Incomplete);
    }
    let digits: String = chars[start..start + 4].iter().collect();
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(EscapeError::InvalidHex(digits));
    }
    u16::from_str_radix(&digits, 16).map_err(|_| EscapeError::InvalidHex(digits))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    #[rstest]
    #[case("X''Y", Quote::Single, "X'Y")]
    #[case("X''Y", Quote::Double, "X''Y")]
    #[case("X\"\"Y", Quote::Double, "X\"Y")]
    #[case("WollMux%%%n", Quote::Double, "WollMux%\n")]
    #[case("100%", Quote::Double, "100%")]
    #[case("50%off", Quote::Double, "50%off")]
    #[case("%u00e4", Quote::Double, "ä")]
    #[case("%ud83d%ude00", Quote::Single, "😀")]
    fn test_decode(#[case] body: &str, #[case] quote: Quote, #[case] expected: &str) {
        assert_eq!(decode(body, quote).unwrap(), expected);
    }

    #[rstest]
    #[case("%u12", EscapeError::Incomplete)]
    #[case("%uzz12", EscapeError::InvalidHex("zz12".into()))]
    #[case("%ud83d", EscapeError::UnpairedSurrogate(0xd83d))]
    #[case("%ude00", EscapeError::UnpairedSurrogate(0xde00))]
    fn test_decode_rejects_bad_unicode_escapes(#[case] body: &str, #[case] error: EscapeError) {
        assert_eq!(decode(body, Quote::Double), Err(error));
    }

    #[test]
    fn test_encode_doubles_only_the_chosen_delimiter() {
        assert_eq!(encode("it's \"x\"", Quote::Single), "it''s \"x\"");
        assert_eq!(encode("it's \"x\"", Quote::Double), "it's \"\"x\"\"");
        assert_eq!(encode("a%b\nc\r", Quote::Double), "a%%b%nc%u000d");
    }

    #[test]
    fn test_encode_all_escapes_non_alphanumerics() {
        assert_eq!(encode_all("a b"), "a%u0020b");
        assert_eq!(encode_all("ä1"), "ä1");
        assert_eq!(encode_all("😀"), "%ud83d%ude00");
        assert_eq!(decode(&encode_all("x'y\"%\n"), Quote::Single).unwrap(), "x'y\"%\n");
    }

    #[test]
    fn test_quote_wraps_in_delimiters() {
        assert_eq!(quote("X'Y", Quote::Single), "'X''Y'");
        assert_eq!(quote("", Quote::Double), "\"\"");
    }

    proptest! {
        #[test]
        fn prop_decode_inverts_encode(value in any::<String>(), single in any::<bool>()) {
            let q = if single { Quote::Single } else { Quote::Double };
            prop_assert_eq!(decode(&encode(&value, q), q).unwrap(), value);
        }
    }
}
