use std::collections::BTreeMap;
use std::fmt;

use crate::entry::{
    mo_entry_to_string, maybe_msgid_msgctxt_eot_split, Entry,
    MsgidEotMsgctxt, POEntry, Translated,
};
use crate::traits::Merge;

/// MO file entry representing a message.
///
/// Unlike PO entries, MO entries carry only the content needed to
/// translate a program at runtime, so this struct has no comments,
/// flags nor source references.
///
/// - If `msgstr` is not `None`, the entry is the translation of a
///   singular form.
/// - If `msgid_plural` is not `None`, the entry is the translation
///   of a plural form and the forms live in `msgstr_plural`,
///   indexed from 0.
#[derive(Default, Clone, Debug, PartialEq)]
pub struct MOEntry {
    /// untranslated string
    pub msgid: String,
    /// translated string
    pub msgstr: Option<String>,
    /// untranslated string for plural form
    pub msgid_plural: Option<String>,
    /// translated strings for plural form, indexed from 0
    pub msgstr_plural: Option<BTreeMap<usize, String>>,
    /// context
    pub msgctxt: Option<String>,
}

impl MOEntry {
    pub fn new(
        msgid: String,
        msgstr: Option<String>,
        msgid_plural: Option<String>,
        msgstr_plural: Option<BTreeMap<usize, String>>,
        msgctxt: Option<String>,
    ) -> MOEntry {
        MOEntry {
            msgid,
            msgstr,
            msgid_plural,
            msgstr_plural,
            msgctxt,
        }
    }

    pub fn to_string_with_wrapwidth(
        &self,
        wrapwidth: usize,
    ) -> String {
        mo_entry_to_string(self, wrapwidth, "")
    }
}

impl Entry for MOEntry {}

impl MsgidEotMsgctxt for MOEntry {
    fn msgid_eot_msgctxt(&self) -> String {
        maybe_msgid_msgctxt_eot_split(&self.msgid, &self.msgctxt)
    }
}

impl Translated for MOEntry {
    /// MO files normally contain only translated entries, but this
    /// is consistent with the PO implementation for entries built
    /// by hand.
    fn translated(&self) -> bool {
        if let Some(msgstr) = &self.msgstr {
            return !msgstr.is_empty();
        }

        if let Some(msgstr_plural) = &self.msgstr_plural {
            if msgstr_plural.is_empty() {
                return false;
            }
            return msgstr_plural
                .values()
                .all(|form| !form.is_empty());
        }

        false
    }
}

impl Merge for MOEntry {
    fn merge(&mut self, other: Self) {
        self.msgid = other.msgid;
        self.msgstr = other.msgstr;
        self.msgid_plural = other.msgid_plural;
        self.msgstr_plural = other.msgstr_plural;
        self.msgctxt = other.msgctxt;
    }
}

impl fmt::Display for MOEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_string_with_wrapwidth(78))
    }
}

impl From<&str> for MOEntry {
    /// Generates a [MOEntry] with the given string as the `msgid`.
    fn from(msgid: &str) -> Self {
        MOEntry::new(msgid.to_string(), None, None, None, None)
    }
}

impl From<&POEntry> for MOEntry {
    /// Generates a [MOEntry] from a [POEntry], dropping the
    /// annotations that only PO files carry.
    fn from(entry: &POEntry) -> Self {
        MOEntry {
            msgid: entry.msgid.clone(),
            msgstr: entry.msgstr.clone(),
            msgid_plural: entry.msgid_plural.clone(),
            msgstr_plural: match entry.msgstr_plural.is_empty() {
                true => None,
                false => Some(entry.msgstr_plural.clone()),
            },
            msgctxt: entry.msgctxt.clone(),
        }
    }
}
