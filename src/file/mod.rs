pub mod mofile;
pub mod pofile;

use std::collections::HashMap;
use std::io;
use std::path::Path;

use natord::compare as compare_natural_order;

// Canonical order of the well known header fields. Anything else
// follows in natural order, so X-Poedit-SearchPath-2 stays before
// X-Poedit-SearchPath-10.
const METADATA_KEYS_ORDER: [&str; 9] = [
    "Project-Id-Version",
    "Report-Msgid-Bugs-To",
    "POT-Creation-Date",
    "PO-Revision-Date",
    "Last-Translator",
    "Language-Team",
    "MIME-Version",
    "Content-Type",
    "Content-Transfer-Encoding",
];

/// Writes the catalog to `path` in the PO textual format.
pub trait SaveAsPOFile {
    fn save_as_pofile(&self, path: &Path) -> io::Result<()>;
}

/// Writes the catalog to its remembered path, or to `path` and
/// remembers it.
///
/// Saving with `None` before any save or parse that recorded a
/// path fails with an [io::ErrorKind::InvalidInput] error.
pub trait Save {
    fn save(&mut self, path: Option<&Path>) -> io::Result<()>;
}

/// Writes the catalog to `path` in the MO binary format.
pub trait SaveAsMOFile {
    fn save_as_mofile(&self, path: &Path) -> io::Result<()>;
}

/// The catalog compiled to MO bytes.
pub trait AsBytes {
    fn as_bytes(&self) -> Vec<u8>;
    fn as_bytes_le(&self) -> Vec<u8>;
    fn as_bytes_be(&self) -> Vec<u8>;
}

/// Parsing options accepted by [pofile::pofile] and
/// [mofile::mofile].
///
/// Usually built through one of the `From` conversions:
///
/// ```rust
/// use pomolib::FileOptions;
///
/// // path or content
/// let options = FileOptions::from("tests-data/features.po");
/// // with a wrap width
/// let options = FileOptions::from(("tests-data/features.po", 50));
/// // checking for duplicated entries
/// let options = FileOptions::from(("tests-data/features.po", true));
/// ```
#[derive(Clone, Debug)]
pub struct Options {
    /// Path to a file, or the content itself when no file exists
    /// at that path.
    pub path_or_content: String,
    /// Binary content, for sources that are not valid paths.
    pub byte_content: Option<Vec<u8>>,
    /// Charset to decode the source with; `None` means detect.
    pub encoding: Option<String>,
    /// Whether to sniff the charset from the `Content-Type` line.
    pub autodetect_encoding: bool,
    /// Make `append`/`insert` fail on entry identity collisions.
    pub check_for_duplicates: bool,
    /// Preferred line width when rendering, 0 never wraps.
    pub wrapwidth: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            path_or_content: String::new(),
            byte_content: None,
            encoding: None,
            autodetect_encoding: true,
            check_for_duplicates: false,
            wrapwidth: 78,
        }
    }
}

impl Options {
    /// Forces a charset, disabling autodetection.
    pub fn with_encoding(mut self, encoding: &str) -> Self {
        self.encoding = Some(encoding.to_string());
        self.autodetect_encoding = false;
        self
    }

    pub fn with_wrapwidth(mut self, wrapwidth: usize) -> Self {
        self.wrapwidth = wrapwidth;
        self
    }

    pub fn with_check_for_duplicates(mut self, check: bool) -> Self {
        self.check_for_duplicates = check;
        self
    }
}

impl From<&str> for Options {
    fn from(path_or_content: &str) -> Self {
        Self {
            path_or_content: path_or_content.to_string(),
            ..Default::default()
        }
    }
}

impl From<String> for Options {
    fn from(path_or_content: String) -> Self {
        Self {
            path_or_content,
            ..Default::default()
        }
    }
}

impl From<(&str, usize)> for Options {
    fn from((path_or_content, wrapwidth): (&str, usize)) -> Self {
        Self {
            path_or_content: path_or_content.to_string(),
            wrapwidth,
            ..Default::default()
        }
    }
}

impl From<(&str, bool)> for Options {
    fn from(
        (path_or_content, check_for_duplicates): (&str, bool),
    ) -> Self {
        Self {
            path_or_content: path_or_content.to_string(),
            check_for_duplicates,
            ..Default::default()
        }
    }
}

impl From<Vec<u8>> for Options {
    fn from(byte_content: Vec<u8>) -> Self {
        Self {
            byte_content: Some(byte_content),
            ..Default::default()
        }
    }
}

// Metadata rendered as the msgstr of the header entry, every
// `Key: value` pair newline terminated.
pub(crate) fn metadata_to_msgstr(
    metadata: &HashMap<String, String>,
) -> String {
    let mut msgstr = String::new();
    for (key, value) in metadata_to_ordered(metadata) {
        msgstr.push_str(&key);
        msgstr.push_str(": ");
        msgstr.push_str(&value);
        msgstr.push('\n');
    }
    msgstr
}

pub(crate) fn metadata_to_ordered(
    metadata: &HashMap<String, String>,
) -> Vec<(String, String)> {
    let mut ret: Vec<(String, String)> = vec![];
    for key in METADATA_KEYS_ORDER {
        if let Some(value) = metadata.get(key) {
            ret.push((key.to_string(), value.to_string()));
        }
    }

    let mut other_keys = metadata
        .keys()
        .filter(|key| !METADATA_KEYS_ORDER.contains(&key.as_str()))
        .collect::<Vec<&String>>();
    other_keys.sort_by(|a, b| compare_natural_order(a, b));

    for key in other_keys {
        ret.push((key.to_string(), metadata[key].to_string()));
    }

    ret
}

// Parses the msgstr of a header entry into metadata pairs. A line
// without a separator continues the value of the previous key.
pub(crate) fn msgstr_to_metadata(
    msgstr: &str,
    metadata: &mut HashMap<String, String>,
) {
    let mut last_key: Option<String> = None;
    for line in msgstr.split('\n') {
        if line.is_empty() {
            continue;
        }
        match line.split_once(':') {
            Some((key, value)) if !key.trim().is_empty() => {
                let key = key.trim().to_string();
                metadata
                    .insert(key.clone(), value.trim_start().to_string());
                last_key = Some(key);
            }
            _ => {
                if let Some(key) = &last_key {
                    let value = metadata.get_mut(key).unwrap();
                    value.push('\n');
                    value.push_str(line);
                }
            }
        }
    }
}
