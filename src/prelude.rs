//! Everything needed to work with catalogs in one import.

pub use crate::errors::{
    DuplicateEntryError, MOParseError, POParseError,
};
pub use crate::{
    detect_encoding, escape, mofile, pofile, unescape, AsBytes,
    Entry, FieldSelector, FileOptions, MOEntry, MOFile, Merge,
    POEntry, POFile, Save, SaveAsMOFile, SaveAsPOFile,
    TranslatedEntry,
};
