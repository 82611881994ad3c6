//! Character reference decoding
//!
//! Covers the references templates actually use: the markup-significant
//! named ones, `nbsp`, and decimal or hex numeric references. Unknown or
//! unterminated references are kept as literal text.

const NAMED: &[(&str, char)] = &[
    ("amp", '&'),
    ("lt", '<'),
    ("gt", '>'),
    ("quot", '"'),
    ("apos", '\''),
    ("nbsp", '\u{a0}'),
];

/// Longest reference body looked at before the `;`: `#x10FFFF` plus two leading zeros
const MAX_REFERENCE_LEN: usize = 10;

/// Decode character references in text or attribute values
pub fn decode(input: &str) -> String {
    if !input.contains('&') {
        return input.to_string();
    }
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(at) = rest.find('&') {
        out.push_str(&rest[..at]);
        rest = &rest[at..];
        match reference(rest) {
            Some((ch, consumed)) => {
                out.push(ch);
                rest = &rest[consumed..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Decode one reference at the start of `s`, returning the char and bytes consumed
fn reference(s: &str) -> Option<(char, usize)> {
    let body = s.get(1..)?;
    let end = body
        .bytes()
        .take(MAX_REFERENCE_LEN + 1)
        .position(|b| b == b';')?;
    let name = &body[..end];
    let ch = match name.strip_prefix('#') {
        Some(numeric) => {
            let code = match numeric.strip_prefix(&['x', 'X'][..]) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => numeric.parse().ok()?,
            };
            char::from_u32(code).filter(|&c| c != '\0').unwrap_or('\u{fffd}')
        }
        None => NAMED.iter().find(|(n, _)| *n == name)?.1,
    };
    Some((ch, end + 2))
}
