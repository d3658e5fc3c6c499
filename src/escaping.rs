//! C-style escaping for quoted PO strings.

use phf::phf_map;

static ESCAPES: phf::Map<char, &'static str> = phf_map! {
    '\\' => "\\\\",
    '"' => "\\\"",
    '\t' => "\\t",
    '\n' => "\\n",
    '\r' => "\\r",
};

/// Escapes a string to be safely included between double quotes
/// in a PO field.
pub fn escape(text: &str) -> String {
    let mut ret = String::with_capacity(text.len());
    for character in text.chars() {
        match ESCAPES.get(&character) {
            Some(escaped) => ret.push_str(escaped),
            None => ret.push(character),
        }
    }
    ret
}

/// Reverses [escape].
///
/// A single left to right scan, so a backslash consumed by one
/// sequence can't be reinterpreted as the start of another.
/// Unknown escape sequences are passed through verbatim.
pub fn unescape(text: &str) -> String {
    let mut ret = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(character) = chars.next() {
        if character != '\\' {
            ret.push(character);
            continue;
        }
        match chars.next() {
            Some('n') => ret.push('\n'),
            Some('r') => ret.push('\r'),
            Some('t') => ret.push('\t'),
            Some('"') => ret.push('"'),
            Some('\\') => ret.push('\\'),
            Some(other) => {
                ret.push('\\');
                ret.push(other);
            }
            None => ret.push('\\'),
        }
    }
    ret
}
