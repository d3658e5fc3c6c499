//! Binary MO format reader.
//!
//! The format starts with a magic number that also reveals the byte
//! order, a revision field, and two tables of `(length, offset)`
//! pairs pointing at the original and translated strings. Contexts
//! are joined to the original with an EOT byte and plural forms are
//! joined with NUL bytes.

use std::collections::BTreeMap;
use std::fs;
use std::mem;
use std::path::{Path, PathBuf};

use snafu::prelude::*;

use crate::encoding::{
    charset_from_po_bytes, decode_bytes, DEFAULT_ENCODING,
};
use crate::entry::MOEntry;
use crate::errors::{
    CorruptedMODataSnafu, ErrorReadingMagicNumberSnafu,
    IncorrectMagicNumberSnafu, MOParseError,
    UnsupportedRevisionNumberSnafu,
};
use crate::file::mofile::MOFile;
use crate::file::{msgstr_to_metadata, Options};

/// Magic number of little endian MO files.
pub const MAGIC: u32 = 0x950412de;
/// [MAGIC] as read with the wrong byte order, meaning the file is
/// big endian.
pub const MAGIC_SWAPPED: u32 = 0xde120495;

pub(crate) struct MOFileParser {
    pub file: MOFile,
    data: Vec<u8>,
    big_endian: bool,
}

impl MOFileParser {
    pub fn new(mut options: Options) -> Result<Self, MOParseError> {
        let mut path: Option<PathBuf> = None;

        let data: Vec<u8> = match options.byte_content.take() {
            Some(bytes) => bytes,
            None => {
                let source = Path::new(&options.path_or_content);
                if source.is_file() {
                    path = Some(source.to_path_buf());
                    fs::read(source)?
                } else {
                    options.path_or_content.clone().into_bytes()
                }
            }
        };

        let mut file = MOFile::new(options);
        file.path = path;

        Ok(Self {
            file,
            data,
            big_endian: false,
        })
    }

    pub fn parse(&mut self) -> Result<(), MOParseError> {
        let data = mem::take(&mut self.data);

        let magic_chunk: [u8; 4] = data
            .get(0..4)
            .and_then(|chunk| chunk.try_into().ok())
            .context(ErrorReadingMagicNumberSnafu)?;
        self.big_endian = match u32::from_le_bytes(magic_chunk) {
            MAGIC => false,
            MAGIC_SWAPPED => true,
            magic_le => {
                return IncorrectMagicNumberSnafu {
                    magic_number_le: magic_le,
                    magic_number_be: u32::from_be_bytes(magic_chunk),
                }
                .fail()
            }
        };

        let version = self.u32_at(&data, 4, "parsing revision number")?;
        // the high 16 bits carry the major revision; a reader must
        // stop on an unexpected one
        if version >> 16 > 1 {
            return UnsupportedRevisionNumberSnafu { version }.fail();
        }

        let num_strings =
            self.u32_at(&data, 8, "parsing number of strings")?
                as usize;
        let originals_offset = self.u32_at(
            &data,
            12,
            "parsing offset of original strings table",
        )? as usize;
        let translations_offset = self.u32_at(
            &data,
            16,
            "parsing offset of translation strings table",
        )? as usize;

        let mut pairs: Vec<(Vec<u8>, Vec<u8>)> =
            Vec::with_capacity(num_strings);
        for index in 0..num_strings {
            let original = self.read_string(
                &data,
                originals_offset + index * 8,
                "reading original strings table",
            )?;
            let translation = self.read_string(
                &data,
                translations_offset + index * 8,
                "reading translation strings table",
            )?;
            pairs.push((original, translation));
        }

        // the charset lives in the header entry translation, and
        // every string of the file is decoded with it
        if self.file.options.encoding.is_none() {
            let declared = pairs
                .iter()
                .find(|(original, _)| original.is_empty())
                .and_then(|(_, translation)| {
                    charset_from_po_bytes(translation)
                });
            self.file.encoding = declared
                .unwrap_or_else(|| DEFAULT_ENCODING.to_string());
        }

        let encoding = self.file.encoding.clone();
        for (original, translation) in &pairs {
            let original = decode_bytes(original, &encoding);
            let translation = decode_bytes(translation, &encoding);

            if original.is_empty() {
                msgstr_to_metadata(
                    &translation,
                    &mut self.file.metadata,
                );
                continue;
            }

            self.file
                .entries
                .push(decompose_strings(&original, &translation));
        }

        self.file.magic_number = Some(MAGIC);
        self.file.version = Some(version);
        Ok(())
    }

    fn u32_at(
        &self,
        data: &[u8],
        offset: usize,
        context: &str,
    ) -> Result<u32, MOParseError> {
        let chunk: [u8; 4] = data
            .get(offset..offset + 4)
            .and_then(|chunk| chunk.try_into().ok())
            .with_context(|| CorruptedMODataSnafu {
                context: context.to_string(),
            })?;
        Ok(match self.big_endian {
            true => u32::from_be_bytes(chunk),
            false => u32::from_le_bytes(chunk),
        })
    }

    // Reads the string behind one (length, offset) table row. The
    // trailing NUL is not part of the declared length.
    fn read_string(
        &self,
        data: &[u8],
        table_offset: usize,
        context: &str,
    ) -> Result<Vec<u8>, MOParseError> {
        let length = self.u32_at(data, table_offset, context)? as usize;
        let offset =
            self.u32_at(data, table_offset + 4, context)? as usize;
        let bytes = data.get(offset..offset + length).with_context(
            || CorruptedMODataSnafu {
                context: context.to_string(),
            },
        )?;
        Ok(bytes.to_vec())
    }
}

// Splits the stored strings back into context, msgid, plural msgid
// and the translation forms.
fn decompose_strings(original: &str, translation: &str) -> MOEntry {
    let (msgctxt, original) = match original.split_once('\u{4}') {
        Some((msgctxt, rest)) => (Some(msgctxt.to_string()), rest),
        None => (None, original),
    };

    match original.split_once('\u{0}') {
        Some((msgid, msgid_plural)) => {
            let msgstr_plural: BTreeMap<usize, String> = translation
                .split('\u{0}')
                .enumerate()
                .map(|(index, form)| (index, form.to_string()))
                .collect();
            MOEntry::new(
                msgid.to_string(),
                None,
                Some(msgid_plural.to_string()),
                Some(msgstr_plural),
                msgctxt,
            )
        }
        None => MOEntry::new(
            original.to_string(),
            Some(translation.to_string()),
            None,
            None,
            msgctxt,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::mofile::mofile;
    use pomolib_testing::create_binary_content;

    #[test]
    fn empty_input() {
        let err = mofile(vec![]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid mo file, error reading magic number"
        );
    }

    #[test]
    fn incorrect_magic_number() {
        let content = create_binary_content(&[800], true);
        let err = mofile(content).unwrap_err();
        assert!(err
            .to_string()
            .starts_with("invalid mo file, magic number is incorrect"));
    }

    #[test]
    fn magic_number_both_byte_orders() {
        // no strings at all is a legal file
        let header = [MAGIC, 0, 0, 28, 28, 0, 28];
        let file = mofile(create_binary_content(&header, true)).unwrap();
        assert_eq!(file.entries.len(), 0);
        assert_eq!(file.metadata.len(), 0);

        let file =
            mofile(create_binary_content(&header, false)).unwrap();
        assert_eq!(file.entries.len(), 0);
    }

    #[test]
    fn unsupported_revision_number() {
        let version = 2 << 16;
        let content =
            create_binary_content(&[MAGIC, version], true);
        let err = mofile(content).unwrap_err();
        assert_eq!(
            err.to_string(),
            format!(
                "invalid mo file, expected major revision number 0 or 1, found {version}",
            ),
        );
    }

    #[test]
    fn minor_revision_accepted() {
        let version = (1 << 16) + 1;
        let header = [MAGIC, version, 0, 28, 28, 0, 28];
        let file =
            mofile(create_binary_content(&header, true)).unwrap();
        assert_eq!(file.version, Some(version));
    }

    #[test]
    fn truncated_header() {
        let content = create_binary_content(&[MAGIC, 0], true);
        let err = mofile(content).unwrap_err();
        assert_eq!(
            err.to_string(),
            concat!(
                "invalid mo file, malformed or corrupted data",
                " found when parsing number of strings",
            ),
        );
    }

    #[test]
    fn truncated_strings_table() {
        // declares one string but the table is missing
        let content =
            create_binary_content(&[MAGIC, 0, 1, 28, 36, 0, 44], true);
        let err = mofile(content).unwrap_err();
        assert_eq!(
            err.to_string(),
            concat!(
                "invalid mo file, malformed or corrupted data",
                " found when reading original strings table",
            ),
        );
    }

    #[test]
    fn decompose_context_and_plurals() {
        let entry = decompose_strings(
            "ctx\u{4}one file\u{0}several files",
            "un fichier\u{0}plusieurs fichiers",
        );
        assert_eq!(entry.msgctxt.as_deref(), Some("ctx"));
        assert_eq!(entry.msgid, "one file");
        assert_eq!(entry.msgid_plural.as_deref(), Some("several files"));
        assert_eq!(
            entry.msgstr_plural,
            Some(BTreeMap::from([
                (0, "un fichier".to_string()),
                (1, "plusieurs fichiers".to_string()),
            ])),
        );

        let entry = decompose_strings("simple", "simple translation");
        assert_eq!(entry.msgctxt, None);
        assert_eq!(entry.msgstr.as_deref(), Some("simple translation"));
    }
}
