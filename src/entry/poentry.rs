use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use unicode_width::UnicodeWidthStr;

use crate::entry::{
    mo_entry_to_string, maybe_msgid_msgctxt_eot_split, Entry,
    MOEntry, MsgidEotMsgctxt, POStringField, Translated,
};
use crate::traits::Merge;
use crate::twrapper::wrap;

/// PO file entry representing a message and its annotations.
///
/// An entry is either singular (`msgstr` set) or plural
/// (`msgid_plural` set and the forms in `msgstr_plural`, indexed
/// from 0). The identity of an entry inside a catalog is the
/// `(msgctxt, msgid, msgid_plural)` triple, see [POEntry::same_identity].
#[derive(Default, Clone, Debug, PartialEq)]
pub struct POEntry {
    /// untranslated string
    pub msgid: String,
    /// translated string
    pub msgstr: Option<String>,
    /// untranslated string for plural form
    pub msgid_plural: Option<String>,
    /// translated strings for plural form, indexed from 0
    pub msgstr_plural: BTreeMap<usize, String>,
    /// context
    pub msgctxt: Option<String>,
    /// no longer active, rendered with a `#~` prefix
    pub obsolete: bool,
    /// translator comment block, rendered with `# `
    pub comment: Option<String>,
    /// extracted comment block, rendered with `#. `
    pub tcomment: Option<String>,
    /// `(file, line)` source references; the line may be empty
    pub occurrences: Vec<(String, String)>,
    /// flags like `fuzzy` or `c-format`
    pub flags: Vec<String>,
    /// context before the last fuzzy update, rendered with `#| `
    pub previous_msgctxt: Option<String>,
    /// msgid before the last fuzzy update
    pub previous_msgid: Option<String>,
    /// plural msgid before the last fuzzy update
    pub previous_msgid_plural: Option<String>,
    /// 1-based line where the entry started, assigned by the parser
    pub linenum: usize,
}

impl POEntry {
    pub fn new(linenum: usize) -> Self {
        Self {
            linenum,

            ..Default::default()
        }
    }

    /// Whether the entry carries the `fuzzy` flag.
    pub fn fuzzy(&self) -> bool {
        self.flags.iter().any(|flag| flag == "fuzzy")
    }

    /// Whether `other` has the same `(msgctxt, msgid, msgid_plural)`
    /// identity. This is the key used for duplicate detection.
    pub fn same_identity(&self, other: &POEntry) -> bool {
        self.msgctxt == other.msgctxt
            && self.msgid == other.msgid
            && self.msgid_plural == other.msgid_plural
    }

    /// Source order used by catalog sorting: entries without
    /// occurrences first, then `(file, line)` pairs with numeric
    /// lines, then msgid and msgctxt; obsolete entries always last.
    pub fn cmp_by_occurrences(&self, other: &POEntry) -> Ordering {
        if self.obsolete != other.obsolete {
            return match self.obsolete {
                true => Ordering::Greater,
                false => Ordering::Less,
            };
        }

        let occurrences = |entry: &POEntry| {
            entry
                .occurrences
                .iter()
                .map(|(file, line)| {
                    (file.clone(), line.parse::<u64>().unwrap_or(0))
                })
                .collect::<Vec<(String, u64)>>()
        };
        occurrences(self)
            .cmp(&occurrences(other))
            .then_with(|| self.msgid.cmp(&other.msgid))
            .then_with(|| self.msgctxt.cmp(&other.msgctxt))
    }

    fn format_comment(
        comment: &str,
        prefix: &str,
        wrapwidth: usize,
        target: &mut String,
    ) {
        for line in comment.split('\n') {
            if wrapwidth > 0
                && UnicodeWidthStr::width(line) + prefix.len()
                    > wrapwidth
            {
                let available =
                    wrapwidth.saturating_sub(prefix.len()).max(1);
                for chunk in wrap(line, available) {
                    target.push_str(prefix);
                    target.push_str(chunk.trim_end());
                    target.push('\n');
                }
            } else {
                target.push_str(prefix.trim_end());
                if !line.is_empty() {
                    target.push(' ');
                    target.push_str(line);
                }
                target.push('\n');
            }
        }
    }

    pub fn to_string_with_wrapwidth(
        &self,
        wrapwidth: usize,
    ) -> String {
        let mut ret = String::new();

        // translator comments
        if let Some(comment) = &self.comment {
            Self::format_comment(comment, "# ", wrapwidth, &mut ret);
        }

        // extracted comments and source references are dropped from
        // obsolete entries, as msgattrib does
        if !self.obsolete {
            if let Some(tcomment) = &self.tcomment {
                Self::format_comment(
                    tcomment, "#. ", wrapwidth, &mut ret,
                );
            }

            if !self.occurrences.is_empty() {
                let files_repr = self
                    .occurrences
                    .iter()
                    .map(|(fpath, lineno)| {
                        if lineno.is_empty() {
                            return fpath.clone();
                        }
                        format!("{}:{}", fpath, lineno)
                    })
                    .collect::<Vec<String>>()
                    .join(" ");
                if wrapwidth > 0
                    && UnicodeWidthStr::width(files_repr.as_str())
                        + 3
                        > wrapwidth
                {
                    for chunk in
                        wrap(&files_repr, wrapwidth.saturating_sub(3))
                    {
                        ret.push_str("#: ");
                        ret.push_str(chunk.trim_end());
                        ret.push('\n');
                    }
                } else {
                    ret.push_str("#: ");
                    ret.push_str(&files_repr);
                    ret.push('\n');
                }
            }
        }

        if !self.flags.is_empty() {
            ret.push_str("#, ");
            ret.push_str(&self.flags.join(", "));
            ret.push('\n');
        }

        let prev_prefix = match self.obsolete {
            true => "#~| ",
            false => "#| ",
        };
        if let Some(previous_msgctxt) = &self.previous_msgctxt {
            ret.push_str(
                &POStringField::new(
                    "msgctxt",
                    prev_prefix,
                    previous_msgctxt,
                    None,
                    wrapwidth,
                )
                .to_string(),
            );
        }
        if let Some(previous_msgid) = &self.previous_msgid {
            ret.push_str(
                &POStringField::new(
                    "msgid",
                    prev_prefix,
                    previous_msgid,
                    None,
                    wrapwidth,
                )
                .to_string(),
            );
        }
        if let Some(previous_msgid_plural) =
            &self.previous_msgid_plural
        {
            ret.push_str(
                &POStringField::new(
                    "msgid_plural",
                    prev_prefix,
                    previous_msgid_plural,
                    None,
                    wrapwidth,
                )
                .to_string(),
            );
        }

        ret.push_str(&mo_entry_to_string(
            &MOEntry::from(self),
            wrapwidth,
            match self.obsolete {
                true => "#~ ",
                false => "",
            },
        ));
        ret
    }
}

impl Entry for POEntry {}

impl MsgidEotMsgctxt for POEntry {
    fn msgid_eot_msgctxt(&self) -> String {
        maybe_msgid_msgctxt_eot_split(&self.msgid, &self.msgctxt)
    }
}

impl Translated for POEntry {
    fn translated(&self) -> bool {
        if self.obsolete || self.fuzzy() {
            return false;
        }

        if let Some(msgstr) = &self.msgstr {
            return !msgstr.is_empty();
        }

        if self.msgstr_plural.is_empty() {
            return false;
        }
        self.msgstr_plural.values().all(|form| !form.is_empty())
    }
}

impl Merge for POEntry {
    /// Merges a reference catalog entry into this one, keeping the
    /// translation and the `fuzzy` flag while the annotations follow
    /// the reference.
    fn merge(&mut self, other: Self) {
        self.msgid = other.msgid;
        self.msgctxt = other.msgctxt;
        self.msgid_plural = other.msgid_plural;
        self.obsolete = other.obsolete;
        self.occurrences = other.occurrences;
        self.comment = other.comment;
        self.tcomment = other.tcomment;
        self.previous_msgctxt = other.previous_msgctxt;
        self.previous_msgid = other.previous_msgid;
        self.previous_msgid_plural = other.previous_msgid_plural;

        let was_fuzzy = self.fuzzy();
        self.flags = other.flags;
        if was_fuzzy && !self.fuzzy() {
            self.flags.push("fuzzy".to_string());
        }

        if self.msgid_plural.is_some() {
            for index in other.msgstr_plural.keys() {
                self.msgstr_plural.entry(*index).or_default();
            }
        }
    }
}

impl fmt::Display for POEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_string_with_wrapwidth(78))
    }
}

impl From<&str> for POEntry {
    fn from(msgid: &str) -> Self {
        let mut entry = POEntry::new(0);
        entry.msgid = msgid.to_string();
        entry
    }
}

impl From<(&str, &str)> for POEntry {
    fn from((msgid, msgstr): (&str, &str)) -> Self {
        let mut entry = POEntry::new(0);
        entry.msgid = msgid.to_string();
        entry.msgstr = Some(msgstr.to_string());
        entry
    }
}

impl From<usize> for POEntry {
    fn from(linenum: usize) -> Self {
        Self::new(linenum)
    }
}

impl From<&MOEntry> for POEntry {
    fn from(mo_entry: &MOEntry) -> Self {
        let mut entry = POEntry::new(0);
        entry.msgid = mo_entry.msgid.clone();
        entry.msgstr = mo_entry.msgstr.clone();
        entry.msgid_plural = mo_entry.msgid_plural.clone();
        entry.msgstr_plural = match &mo_entry.msgstr_plural {
            Some(plural) => plural.clone(),
            None => BTreeMap::new(),
        };
        entry.msgctxt = mo_entry.msgctxt.clone();
        entry
    }
}
