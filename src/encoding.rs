//! Charset detection and text transcoding.
//!
//! Catalogs declare their charset in the header entry, on the
//! `Content-Type: text/plain; charset=NAME` line. The detector
//! scans raw bytes so it works before any decoding has happened;
//! for MO content it walks the binary tables up to the header
//! translation first.

use std::fs;
use std::path::Path;

use encoding_rs::{Encoding, UTF_8};
use lazy_static::lazy_static;
use regex::bytes::Regex;

use crate::moparser::{MAGIC, MAGIC_SWAPPED};

/// Fallback charset, also gettext's default.
pub(crate) const DEFAULT_ENCODING: &str = "utf-8";

lazy_static! {
    // (?-u) so the lookup also works on not yet decoded content
    static ref CHARSET_RE: Regex =
        Regex::new(r#"(?-u)"?Content-Type:.+? charset=([\w_\-:\.]+)"#)
            .unwrap();
}

/// Returns the charset declared in `source`, a file path or the
/// content itself, with the name case preserved. Returns `utf-8`
/// when no charset is declared or the declared name is unknown.
///
/// With `binary` set the source is treated as MO content and the
/// declaration is looked up in the embedded header entry.
pub fn detect_encoding(source: &str, binary: bool) -> String {
    let bytes: Vec<u8> = match Path::new(source).is_file() {
        true => match fs::read(source) {
            Ok(bytes) => bytes,
            Err(_) => return DEFAULT_ENCODING.to_string(),
        },
        false => source.as_bytes().to_vec(),
    };

    let found = match binary {
        true => charset_from_mo_bytes(&bytes),
        false => charset_from_po_bytes(&bytes),
    };
    found
        .filter(|name| Encoding::for_label(name.as_bytes()).is_some())
        .unwrap_or_else(|| DEFAULT_ENCODING.to_string())
}

pub(crate) fn charset_from_po_bytes(bytes: &[u8]) -> Option<String> {
    CHARSET_RE.captures(bytes).map(|captures| {
        String::from_utf8_lossy(&captures[1]).into_owned()
    })
}

// Walks the MO header up to the translation of the empty msgid,
// where the Content-Type line lives. Any structural problem means
// "nothing declared"; the real parser reports them properly.
pub(crate) fn charset_from_mo_bytes(bytes: &[u8]) -> Option<String> {
    let u32_at = |offset: usize, big_endian: bool| -> Option<u32> {
        let chunk: [u8; 4] =
            bytes.get(offset..offset + 4)?.try_into().ok()?;
        Some(match big_endian {
            true => u32::from_be_bytes(chunk),
            false => u32::from_le_bytes(chunk),
        })
    };

    let big_endian = match u32_at(0, false)? {
        MAGIC => false,
        MAGIC_SWAPPED => true,
        _ => return None,
    };

    let num_strings = u32_at(8, big_endian)? as usize;
    let originals_offset = u32_at(12, big_endian)? as usize;
    let translations_offset = u32_at(16, big_endian)? as usize;

    for index in 0..num_strings {
        let length = u32_at(originals_offset + index * 8, big_endian)?;
        if length != 0 {
            continue;
        }
        let translation_length =
            u32_at(translations_offset + index * 8, big_endian)?
                as usize;
        let translation_offset =
            u32_at(translations_offset + index * 8 + 4, big_endian)?
                as usize;
        let translation = bytes.get(
            translation_offset
                ..translation_offset + translation_length,
        )?;
        return charset_from_po_bytes(translation);
    }
    None
}

/// Decodes `bytes` with the named charset, falling back to UTF-8
/// for unknown names.
pub(crate) fn decode_bytes(bytes: &[u8], encoding: &str) -> String {
    let encoding = Encoding::for_label(encoding.as_bytes())
        .unwrap_or(UTF_8);
    encoding.decode(bytes).0.into_owned()
}

/// Encodes `text` with the named charset, falling back to UTF-8
/// for unknown names.
pub(crate) fn encode_string(text: &str, encoding: &str) -> Vec<u8> {
    let encoding = Encoding::for_label(encoding.as_bytes())
        .unwrap_or(UTF_8);
    encoding.encode(text).0.into_owned()
}
