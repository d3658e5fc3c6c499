use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::encoding::{encode_string, DEFAULT_ENCODING};
use crate::entry::{POEntry, Translated};
use crate::errors::{DuplicateEntryError, POParseError};
use crate::file::mofile::MOFile;
use crate::file::{
    metadata_to_msgstr, metadata_to_ordered, AsBytes, Options, Save,
    SaveAsMOFile, SaveAsPOFile,
};
use crate::poparser::POFileParser;

/// Parses a PO file or PO content into a [POFile].
///
/// The source is treated as a file path when a file exists at that
/// location, and as the content itself otherwise.
///
/// # Example
///
/// ```rust
/// use pomolib::pofile;
///
/// let file = pofile("tests-data/features.po").unwrap();
/// assert!(!file.entries.is_empty());
/// ```
pub fn pofile<Opt>(options: Opt) -> Result<POFile, POParseError>
where
    Opt: Into<Options>,
{
    let mut parser = POFileParser::new(options.into())?;
    parser.parse()?;
    Ok(parser.file)
}

/// Entry field compared by [POFile::find], instead of looking
/// fields up by name at runtime.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FieldSelector {
    #[default]
    Msgid,
    Msgstr,
    Msgctxt,
    Tcomment,
    OccurrenceFile,
}

fn field_matches(
    entry: &POEntry,
    by: FieldSelector,
    needle: &str,
) -> bool {
    match by {
        FieldSelector::Msgid => entry.msgid == needle,
        FieldSelector::Msgstr => {
            entry.msgstr.as_deref() == Some(needle)
        }
        FieldSelector::Msgctxt => {
            entry.msgctxt.as_deref() == Some(needle)
        }
        FieldSelector::Tcomment => {
            entry.tcomment.as_deref() == Some(needle)
        }
        FieldSelector::OccurrenceFile => {
            entry.occurrences.iter().any(|(file, _)| file == needle)
        }
    }
}

/// An in memory PO catalog: an ordered collection of [POEntry]
/// with a header comment and the metadata of the header entry.
#[derive(Clone, Debug, Default)]
pub struct POFile {
    /// comment block at the top of the file
    pub header: Option<String>,
    /// header entry fields, keys unique
    pub metadata: HashMap<String, String>,
    /// whether the header entry carries the `fuzzy` flag
    pub metadata_is_fuzzy: bool,
    /// charset of the catalog, name preserved as declared
    pub encoding: String,
    pub entries: Vec<POEntry>,
    /// last known path, remembered by [Save::save]
    pub path: Option<PathBuf>,
    pub options: Options,
}

impl POFile {
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

    /// First entry whose selected field equals `needle`.
    ///
    /// With `msgctxt` the context has to match too. Without it,
    /// when several entries match, the one without any context
    /// wins. Obsolete entries are skipped unless
    /// `include_obsolete_entries` is set.
    pub fn find(
        &self,
        needle: &str,
        by: FieldSelector,
        include_obsolete_entries: bool,
        msgctxt: Option<&str>,
    ) -> Option<&POEntry> {
        let mut matches =
            self.entries.iter().filter(|entry| {
                (include_obsolete_entries || !entry.obsolete)
                    && field_matches(entry, by, needle)
            });

        match msgctxt {
            Some(msgctxt) => matches.find(|entry| {
                entry.msgctxt.as_deref() == Some(msgctxt)
            }),
            None => {
                let matches: Vec<&POEntry> = matches.collect();
                match matches.len() {
                    0 => None,
                    1 => Some(matches[0]),
                    _ => matches
                        .iter()
                        .find(|entry| entry.msgctxt.is_none())
                        .copied()
                        .or(Some(matches[0])),
                }
            }
        }
    }

    /// Shorthand for a [POFile::find] by msgid without context.
    pub fn find_by_msgid(&self, msgid: &str) -> Option<&POEntry> {
        self.find(msgid, FieldSelector::Msgid, false, None)
    }

    pub fn find_by_msgid_msgctxt(
        &self,
        msgid: &str,
        msgctxt: &str,
    ) -> Option<&POEntry> {
        self.find(msgid, FieldSelector::Msgid, false, Some(msgctxt))
    }

    /// Appends an entry. With `check_for_duplicates` enabled the
    /// append fails when a non obsolete entry with the same
    /// identity already exists.
    pub fn append(
        &mut self,
        entry: POEntry,
    ) -> Result<(), DuplicateEntryError> {
        self.check_duplicate(&entry)?;
        self.entries.push(entry);
        Ok(())
    }

    /// Like [POFile::append] at an arbitrary position.
    pub fn insert(
        &mut self,
        index: usize,
        entry: POEntry,
    ) -> Result<(), DuplicateEntryError> {
        self.check_duplicate(&entry)?;
        self.entries.insert(index, entry);
        Ok(())
    }

    fn check_duplicate(
        &self,
        entry: &POEntry,
    ) -> Result<(), DuplicateEntryError> {
        if self.options.check_for_duplicates
            && self.entries.iter().any(|existing| {
                !existing.obsolete && existing.same_identity(entry)
            })
        {
            return Err(DuplicateEntryError {
                msgid: entry.msgid.clone(),
            });
        }
        Ok(())
    }

    /// Removes the first entry equal to `entry`.
    pub fn remove(&mut self, entry: &POEntry) {
        if let Some(index) =
            self.entries.iter().position(|e| e == entry)
        {
            self.entries.remove(index);
        }
    }

    /// Percentage of translated entries, truncated to an integer.
    /// An empty catalog is complete, so 100.
    pub fn percent_translated(&self) -> u32 {
        let total = self
            .entries
            .iter()
            .filter(|entry| !entry.obsolete)
            .count();
        if total == 0 {
            return 100;
        }
        let translated = self.translated_entries().len();
        (translated * 100 / total) as u32
    }

    pub fn translated_entries(&self) -> Vec<&POEntry> {
        self.entries
            .iter()
            .filter(|entry| entry.translated())
            .collect()
    }

    pub fn untranslated_entries(&self) -> Vec<&POEntry> {
        self.entries
            .iter()
            .filter(|entry| {
                !entry.translated()
                    && !entry.obsolete
                    && !entry.fuzzy()
            })
            .collect()
    }

    pub fn fuzzy_entries(&self) -> Vec<&POEntry> {
        self.entries
            .iter()
            .filter(|entry| entry.fuzzy() && !entry.obsolete)
            .collect()
    }

    pub fn obsolete_entries(&self) -> Vec<&POEntry> {
        self.entries
            .iter()
            .filter(|entry| entry.obsolete)
            .collect()
    }

    /// The metadata as the conventional empty msgid entry.
    pub fn metadata_as_entry(&self) -> POEntry {
        let mut entry = POEntry::new(0);
        if self.metadata_is_fuzzy {
            entry.flags.push("fuzzy".to_string());
        }
        if !self.metadata.is_empty() {
            entry.msgstr = Some(metadata_to_msgstr(&self.metadata));
        }
        entry
    }

    /// Metadata pairs with the well known keys first, in their
    /// canonical order, and everything else in natural order.
    pub fn ordered_metadata(&self) -> Vec<(String, String)> {
        metadata_to_ordered(&self.metadata)
    }

    /// Stable sort by source location: entries without occurrences
    /// first, then by `(file, line)` with numeric lines, then by
    /// msgid; obsolete entries move to the end.
    pub fn sort(&mut self) {
        self.entries
            .sort_by(|a, b| a.cmp_by_occurrences(b));
    }

    /// Aligns the catalog against a reference template, the
    /// msgmerge way: entries found in the reference by their
    /// `(msgctxt, msgid)` pair are updated in place, entries only
    /// in the reference are added untranslated and entries no
    /// longer referenced become obsolete. An added entry is flagged
    /// fuzzy when the catalog already holds the same msgid under
    /// another context, since that translation needs review before
    /// it can be reused.
    pub fn merge(&mut self, reference: &POFile) {
        use crate::traits::Merge;

        for ref_entry in &reference.entries {
            let position = self.entries.iter().position(|entry| {
                entry.msgid == ref_entry.msgid
                    && entry.msgctxt == ref_entry.msgctxt
            });
            match position {
                Some(position) => {
                    self.entries[position].merge(ref_entry.clone())
                }
                None => {
                    let similar_msgid = self
                        .entries
                        .iter()
                        .any(|entry| entry.msgid == ref_entry.msgid);
                    let mut entry = POEntry::new(0);
                    entry.merge(ref_entry.clone());
                    if similar_msgid && !entry.fuzzy() {
                        entry.flags.push("fuzzy".to_string());
                    }
                    self.entries.push(entry);
                }
            }
        }

        for entry in &mut self.entries {
            let referenced = reference.entries.iter().any(|r| {
                r.msgid == entry.msgid && r.msgctxt == entry.msgctxt
            });
            if !referenced {
                entry.obsolete = true;
            }
        }
    }
}

impl fmt::Display for POFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ret = String::new();

        // the header comment, a bare # for empty lines; lines
        // starting with , or : would collide with flag and
        // occurrence markers so they get no space
        let header = self.header.as_deref().unwrap_or("");
        for line in header.split('\n') {
            if line.is_empty() {
                ret.push_str("#\n");
            } else if line.starts_with(',') || line.starts_with(':') {
                ret.push('#');
                ret.push_str(line);
                ret.push('\n');
            } else {
                ret.push_str("# ");
                ret.push_str(line);
                ret.push('\n');
            }
        }

        let wrapwidth = self.options.wrapwidth;
        let mut blocks: Vec<String> = vec![self
            .metadata_as_entry()
            .to_string_with_wrapwidth(wrapwidth)];
        for entry in &self.entries {
            if !entry.obsolete {
                blocks
                    .push(entry.to_string_with_wrapwidth(wrapwidth));
            }
        }
        for entry in &self.entries {
            if entry.obsolete {
                blocks
                    .push(entry.to_string_with_wrapwidth(wrapwidth));
            }
        }
        ret.push_str(&blocks.join("\n"));

        write!(f, "{}", ret)
    }
}

impl PartialEq for POFile {
    /// Catalogs are compared by their rendered textual form.
    fn eq(&self, other: &Self) -> bool {
        self.to_string() == other.to_string()
    }
}

impl SaveAsPOFile for POFile {
    fn save_as_pofile(&self, path: &Path) -> io::Result<()> {
        fs::write(
            path,
            encode_string(&self.to_string(), &self.encoding),
        )
    }
}

impl Save for POFile {
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
        self.save_as_pofile(&target)?;
        self.path = Some(target);
        Ok(())
    }
}

impl SaveAsMOFile for POFile {
    fn save_as_mofile(&self, path: &Path) -> io::Result<()> {
        fs::write(path, self.as_bytes())
    }
}

impl AsBytes for POFile {
    fn as_bytes(&self) -> Vec<u8> {
        MOFile::from(self).as_bytes()
    }

    fn as_bytes_le(&self) -> Vec<u8> {
        MOFile::from(self).as_bytes_le()
    }

    fn as_bytes_be(&self) -> Vec<u8> {
        MOFile::from(self).as_bytes_be()
    }
}
