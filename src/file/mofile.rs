use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::encoding::{encode_string, DEFAULT_ENCODING};
use crate::entry::{MOEntry, MsgidEotMsgctxt};
use crate::errors::MOParseError;
use crate::file::pofile::POFile;
use crate::file::{
    metadata_to_msgstr, metadata_to_ordered, AsBytes, Options, Save,
    SaveAsMOFile, SaveAsPOFile,
};
use crate::moparser::{MOFileParser, MAGIC};

/// Parses a MO file or MO bytes into a [MOFile].
///
/// The source is either a path to a file on disk or the binary
/// content itself, passed as `Vec<u8>`.
///
/// # Example
///
/// ```rust
/// use pomolib::{mofile, pofile, AsBytes};
///
/// let po_file = pofile("tests-data/features.po").unwrap();
/// let mo_file = mofile(po_file.as_bytes()).unwrap();
/// assert_eq!(
///     mo_file.entries.len(),
///     po_file.translated_entries().len(),
/// );
/// ```
pub fn mofile<Opt>(options: Opt) -> Result<MOFile, MOParseError>
where
    Opt: Into<Options>,
{
    let mut parser = MOFileParser::new(options.into())?;
    parser.parse()?;
    Ok(parser.file)
}

/// An in memory MO catalog.
///
/// Rendering a [MOFile] with `Display` produces the equivalent PO
/// textual form, and [AsBytes] compiles it back to the binary
/// format, byte equal to `msgfmt --no-hash` output.
#[derive(Clone, Debug, Default)]
pub struct MOFile {
    /// magic number read by the parser
    pub magic_number: Option<u32>,
    /// format revision read by the parser
    pub version: Option<u32>,
    /// header entry fields, keys unique
    pub metadata: HashMap<String, String>,
    /// charset of the catalog, name preserved as declared
    pub encoding: String,
    pub entries: Vec<MOEntry>,
    /// last known path, remembered by [Save::save]
    pub path: Option<PathBuf>,
    pub options: Options,
}

impl MOFile {
    pub fn new(options: Options) -> Self {
        Self {
            encoding: options
                .encoding
                .clone()
                .unwrap_or_else(|| DEFAULT_ENCODING.to_string()),
            options,
            ..Default::default()
        }
    }

    /// MO files only store translated content, so the whole
    /// catalog counts as translated.
    pub fn percent_translated(&self) -> u32 {
        100
    }

    pub fn translated_entries(&self) -> Vec<&MOEntry> {
        self.entries.iter().collect()
    }

    pub fn untranslated_entries(&self) -> Vec<&MOEntry> {
        vec![]
    }

    pub fn fuzzy_entries(&self) -> Vec<&MOEntry> {
        vec![]
    }

    pub fn obsolete_entries(&self) -> Vec<&MOEntry> {
        vec![]
    }

    pub fn metadata_as_entry(&self) -> MOEntry {
        let mut entry = MOEntry::from("");
        if !self.metadata.is_empty() {
            entry.msgstr = Some(metadata_to_msgstr(&self.metadata));
        }
        entry
    }

    pub fn ordered_metadata(&self) -> Vec<(String, String)> {
        metadata_to_ordered(&self.metadata)
    }

    // Compiles the catalog, `msgfmt --no-hash` layout: the 28 byte
    // header, both (length, offset) tables, then the NUL terminated
    // originals and translations regions. Entries are sorted by the
    // UTF-8 bytes of their original key, the header entry first.
    fn to_binary(&self, revision: u32, big_endian: bool) -> Vec<u8> {
        let int_bytes = |value: u32| -> [u8; 4] {
            match big_endian {
                true => value.to_be_bytes(),
                false => value.to_le_bytes(),
            }
        };

        let mut items: Vec<(String, String)> = self
            .entries
            .iter()
            .map(|entry| {
                let mut original = entry.msgid_eot_msgctxt();
                if let Some(msgid_plural) = &entry.msgid_plural {
                    original.push('\u{0}');
                    original.push_str(msgid_plural);
                }
                let translation = match &entry.msgstr_plural {
                    Some(msgstr_plural) => msgstr_plural
                        .values()
                        .cloned()
                        .collect::<Vec<String>>()
                        .join("\u{0}"),
                    None => {
                        entry.msgstr.clone().unwrap_or_default()
                    }
                };
                (original, translation)
            })
            .collect();
        items.sort_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));
        items.insert(
            0,
            (String::new(), metadata_to_msgstr(&self.metadata)),
        );

        let encoded: Vec<(Vec<u8>, Vec<u8>)> = items
            .iter()
            .map(|(original, translation)| {
                (
                    encode_string(original, &self.encoding),
                    encode_string(translation, &self.encoding),
                )
            })
            .collect();

        let num_strings = encoded.len() as u32;
        let originals_start: u32 = 7 * 4 + 16 * num_strings;
        let originals_size: u32 = encoded
            .iter()
            .map(|(original, _)| original.len() as u32 + 1)
            .sum();
        let translations_start = originals_start + originals_size;

        let mut output: Vec<u8> = vec![];
        for value in [
            MAGIC,
            revision,
            num_strings,
            7 * 4,
            7 * 4 + num_strings * 8,
            0,
            // no hash table, its offset points at the end of the
            // offset tables
            originals_start,
        ] {
            output.extend(int_bytes(value));
        }

        let mut offset = originals_start;
        for (original, _) in &encoded {
            output.extend(int_bytes(original.len() as u32));
            output.extend(int_bytes(offset));
            offset += original.len() as u32 + 1;
        }
        let mut offset = translations_start;
        for (_, translation) in &encoded {
            output.extend(int_bytes(translation.len() as u32));
            output.extend(int_bytes(offset));
            offset += translation.len() as u32 + 1;
        }

        for (original, _) in &encoded {
            output.extend(original);
            output.push(0);
        }
        for (_, translation) in &encoded {
            output.extend(translation);
            output.push(0);
        }

        output
    }
}

impl fmt::Display for MOFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let wrapwidth = self.options.wrapwidth;
        let mut blocks: Vec<String> = vec![self
            .metadata_as_entry()
            .to_string_with_wrapwidth(wrapwidth)];
        for entry in &self.entries {
            blocks.push(entry.to_string_with_wrapwidth(wrapwidth));
        }
        write!(f, "{}", blocks.join("\n"))
    }
}

impl PartialEq for MOFile {
    /// Catalogs are compared by their rendered textual form.
    fn eq(&self, other: &Self) -> bool {
        self.to_string() == other.to_string()
    }
}

impl From<&POFile> for MOFile {
    /// Takes the metadata and the translated entries of a PO
    /// catalog; fuzzy, obsolete and untranslated entries are left
    /// out, as msgfmt does.
    fn from(po_file: &POFile) -> Self {
        let mut file = MOFile::new(po_file.options.clone());
        file.magic_number = Some(MAGIC);
        file.version = Some(0);
        file.metadata = po_file.metadata.clone();
        file.encoding = po_file.encoding.clone();
        file.entries = po_file
            .translated_entries()
            .iter()
            .map(|entry| MOEntry::from(*entry))
            .collect();
        file
    }
}

impl SaveAsPOFile for MOFile {
    fn save_as_pofile(&self, path: &Path) -> io::Result<()> {
        fs::write(
            path,
            encode_string(&self.to_string(), &self.encoding),
        )
    }
}

impl Save for MOFile {
    fn save(&mut self, path: Option<&Path>) -> io::Result<()> {
        let target = match path {
            Some(path) => path.to_path_buf(),
            None => self.path.clone().ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "no known path to save the catalog to",
                )
            })?,
        };
        self.save_as_mofile(&target)?;
        self.path = Some(target);
        Ok(())
    }
}

impl SaveAsMOFile for MOFile {
    fn save_as_mofile(&self, path: &Path) -> io::Result<()> {
        fs::write(path, self.as_bytes())
    }
}

impl AsBytes for MOFile {
    fn as_bytes(&self) -> Vec<u8> {
        self.to_binary(0, false)
    }

    fn as_bytes_le(&self) -> Vec<u8> {
        self.to_binary(0, false)
    }

    fn as_bytes_be(&self) -> Vec<u8> {
        self.to_binary(0, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::pofile::pofile;
    use std::env;

    #[test]
    fn writer_layout_is_msgfmt_no_hash() {
        let content = concat!(
            "msgid \"\"\n",
            "msgstr \"\"\n",
            "\n",
            "msgid \"foo\"\n",
            "msgstr \"bar\"\n",
        );
        let po_file = pofile(content).unwrap();
        let bytes = po_file.as_bytes();

        let mut expected: Vec<u8> = vec![];
        for value in [
            0x950412de_u32, // magic
            0,              // revision
            2,              // two strings, the header and foo
            28,             // originals table right after the header
            44,             // translations table
            0,              // no hash table
            60,             // hash offset, end of the tables
        ] {
            expected.extend(value.to_le_bytes());
        }
        // originals table: "" at 60, "foo" at 61
        for value in [0_u32, 60, 3, 61] {
            expected.extend(value.to_le_bytes());
        }
        // translations table: "" at 65, "bar" at 66
        for value in [0_u32, 65, 3, 66] {
            expected.extend(value.to_le_bytes());
        }
        expected.extend(b"\x00foo\x00");
        expected.extend(b"\x00bar\x00");

        assert_eq!(bytes, expected);
    }

    #[test]
    fn entries_sorted_by_original_bytes() {
        let content = concat!(
            "msgid \"\"\n",
            "msgstr \"\"\n",
            "\n",
            "msgid \"zebra\"\n",
            "msgstr \"z\"\n",
            "\n",
            "msgid \"apple\"\n",
            "msgstr \"a\"\n",
        );
        let file = mofile(pofile(content).unwrap().as_bytes()).unwrap();
        assert_eq!(file.entries[0].msgid, "apple");
        assert_eq!(file.entries[1].msgid, "zebra");
    }

    #[test]
    fn binary_roundtrip() {
        let po_file = pofile("tests-data/features.po").unwrap();
        let mo_file = mofile(po_file.as_bytes()).unwrap();

        assert_eq!(
            mo_file.entries.len(),
            po_file.translated_entries().len(),
        );
        assert_eq!(mo_file.metadata, po_file.metadata);
        assert_eq!(mo_file.encoding, "UTF-8");
        assert_eq!(mo_file.magic_number, Some(MAGIC));
        assert_eq!(mo_file.version, Some(0));

        // writing what was read back is stable
        assert_eq!(mo_file.as_bytes(), po_file.as_bytes());
    }

    #[test]
    fn binary_roundtrip_big_endian() {
        let po_file = pofile("tests-data/features.po").unwrap();
        let mo_file = mofile(po_file.as_bytes_be()).unwrap();

        assert_eq!(
            mo_file.entries.len(),
            po_file.translated_entries().len(),
        );
        assert_eq!(mo_file.as_bytes_be(), po_file.as_bytes_be());
    }

    #[test]
    fn context_and_plurals_roundtrip() {
        let content = concat!(
            "msgid \"\"\n",
            "msgstr \"\"\n",
            "\"Content-Type: text/plain; charset=UTF-8\\n\"\n",
            "\n",
            "msgctxt \"menu\"\n",
            "msgid \"Open\"\n",
            "msgstr \"Ouvrir\"\n",
            "\n",
            "msgid \"one file\"\n",
            "msgid_plural \"several files\"\n",
            "msgstr[0] \"un fichier\"\n",
            "msgstr[1] \"plusieurs fichiers\"\n",
        );
        let file = mofile(pofile(content).unwrap().as_bytes()).unwrap();

        let with_context = file
            .entries
            .iter()
            .find(|entry| entry.msgctxt.is_some())
            .unwrap();
        assert_eq!(with_context.msgctxt.as_deref(), Some("menu"));
        assert_eq!(with_context.msgid, "Open");
        assert_eq!(with_context.msgstr.as_deref(), Some("Ouvrir"));

        let plural = file
            .entries
            .iter()
            .find(|entry| entry.msgid_plural.is_some())
            .unwrap();
        assert_eq!(
            plural.msgid_plural.as_deref(),
            Some("several files")
        );
        let forms = plural.msgstr_plural.as_ref().unwrap();
        assert_eq!(forms[&0], "un fichier");
        assert_eq!(forms[&1], "plusieurs fichiers");
        assert_eq!(plural.msgstr, None);
    }

    #[test]
    fn untranslated_and_fuzzy_left_out() {
        let po_file =
            pofile("tests-data/translated-partly.po").unwrap();
        let mo_file = MOFile::from(&po_file);

        assert_eq!(po_file.entries.len(), 5);
        assert_eq!(mo_file.entries.len(), 2);
    }

    #[test]
    fn to_string_renders_po_text() {
        let content = concat!(
            "msgid \"\"\n",
            "msgstr \"Content-Type: text/plain; charset=UTF-8\\n\"\n",
            "\n",
            "msgctxt \"Some message context\"\n",
            "msgid \"some string\"\n",
            "msgstr \"une chaîne avec contexte\"\n",
            "\n",
            "msgid \"some string\"\n",
            "msgstr \"une chaîne sans contexte\"\n",
        );
        let file = mofile(pofile(content).unwrap().as_bytes()).unwrap();
        // contexts sort before the bare msgid because of the EOT
        // byte, and the header has no leading # line
        assert_eq!(file.to_string(), content);
    }

    #[test]
    fn dummy_filter_methods() {
        let file = MOFile::new(Options::default());
        assert_eq!(file.percent_translated(), 100);
        assert_eq!(file.untranslated_entries().len(), 0);
        assert_eq!(file.fuzzy_entries().len(), 0);
        assert_eq!(file.obsolete_entries().len(), 0);
    }

    #[test]
    fn save_and_reload() {
        let po_file = pofile("tests-data/features.po").unwrap();
        let mut mo_file = MOFile::from(&po_file);

        let tmp_path = env::temp_dir().join("mofile_save.mo");
        mo_file.save(Some(&tmp_path)).unwrap();

        let reloaded = mofile(tmp_path.to_str().unwrap()).unwrap();
        assert_eq!(reloaded.entries.len(), mo_file.entries.len());
        assert_eq!(reloaded.metadata, mo_file.metadata);
        assert!(reloaded.path.is_some());
        fs::remove_file(&tmp_path).ok();
    }

    #[test]
    fn save_as_pofile() {
        let content = concat!(
            "msgid \"\"\n",
            "msgstr \"Content-Type: text/plain; charset=UTF-8\\n\"\n",
            "\n",
            "msgid \"foo\"\n",
            "msgstr \"oof\"\n",
        );
        let mo_file =
            mofile(pofile(content).unwrap().as_bytes()).unwrap();

        let tmp_path = env::temp_dir().join("mofile_save_as_po.po");
        mo_file.save_as_pofile(&tmp_path).unwrap();
        assert_eq!(
            fs::read_to_string(&tmp_path).unwrap(),
            mo_file.to_string(),
        );
        fs::remove_file(&tmp_path).ok();
    }
}
