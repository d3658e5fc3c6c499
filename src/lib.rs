//! Read, manipulate and write gettext catalogs, in both the PO
//! textual and the MO binary formats.
//!
//! # Quickstart
//!
//! ```rust
//! use pomolib::prelude::*;
//!
//! let file = pofile("tests-data/features.po").unwrap();
//! for entry in &file.entries {
//!     if entry.translated() {
//!         println!("{} -> {:?}", entry.msgid, entry.msgstr);
//!     }
//! }
//! ```

mod encoding;
mod entry;
pub mod errors;
mod escaping;
mod file;
mod moparser;
mod poparser;
pub mod prelude;
mod traits;
mod twrapper;

pub use crate::encoding::detect_encoding;
pub use crate::entry::{
    Entry, MOEntry, POEntry, Translated as TranslatedEntry,
};
pub use crate::escaping::{escape, unescape};
pub use crate::file::{
    mofile::{mofile, MOFile},
    pofile::{pofile, FieldSelector, POFile},
    AsBytes, Options as FileOptions, Save, SaveAsMOFile,
    SaveAsPOFile,
};
pub use crate::moparser::{MAGIC, MAGIC_SWAPPED};
pub use crate::traits::Merge;
