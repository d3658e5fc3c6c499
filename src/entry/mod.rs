//! Translation unit kinds shared by PO and MO catalogs.

mod moentry;
mod poentry;

use std::fmt;

use unicode_width::UnicodeWidthStr;

pub use moentry::MOEntry;
pub use poentry::POEntry;

use crate::escaping::{escape, unescape};
use crate::twrapper::wrap;

/// Marker for translation unit kinds.
pub trait Entry {}

/// Completeness of the translation carried by an entry.
pub trait Translated {
    fn translated(&self) -> bool;
}

/// The key a MO file stores for an entry.
pub trait MsgidEotMsgctxt {
    fn msgid_eot_msgctxt(&self) -> String;
}

// From the MO files spec: contexts are stored by storing the
// concatenation of the context, a EOT byte, and the original string.
pub(crate) fn maybe_msgid_msgctxt_eot_split(
    msgid: &str,
    msgctxt: &Option<String>,
) -> String {
    if let Some(ctx) = msgctxt {
        let mut ret = String::from(ctx);
        ret.push('\u{4}');
        ret.push_str(msgid);
        ret
    } else {
        msgid.to_string()
    }
}

/// One `fieldname "value"` block of a PO entry, rendered with the
/// catalog wrap width.
///
/// A value with an interior newline always takes the multi line form,
/// one physical line per `\n` terminated chunk. A single line value
/// that overflows the wrap width is wrapped on word boundaries over
/// the escaped text. In both cases the first physical line is the
/// field name with an empty string.
pub(crate) struct POStringField<'a> {
    fieldname: &'a str,
    delflag: &'a str,
    value: &'a str,
    plural_index: Option<usize>,
    wrapwidth: usize,
}

impl<'a> POStringField<'a> {
    pub fn new(
        fieldname: &'a str,
        delflag: &'a str,
        value: &'a str,
        plural_index: Option<usize>,
        wrapwidth: usize,
    ) -> Self {
        Self {
            fieldname,
            delflag,
            value,
            plural_index,
            wrapwidth,
        }
    }

    fn lines(&self) -> Vec<String> {
        let chunks: Vec<&str> =
            self.value.split_inclusive('\n').collect();
        if chunks.len() > 1 {
            // interior newline, one physical line per chunk
            let mut lines = vec![String::new()];
            lines.extend(chunks.iter().map(|c| c.to_string()));
            return lines;
        }

        let escaped = escape(self.value);
        let index_width = match self.plural_index {
            // brackets plus the decimal digits
            Some(index) => index.to_string().len() + 2,
            None => 0,
        };
        // field name, plural index, one space and both quotes
        let overhead = UnicodeWidthStr::width(self.fieldname)
            + self.delflag.len()
            + index_width
            + 3;
        let escaped_width = UnicodeWidthStr::width(escaped.as_str());
        if self.wrapwidth > 0
            && escaped_width + overhead > self.wrapwidth
        {
            // each escaped special char costs one extra column
            let specials =
                escaped_width - UnicodeWidthStr::width(self.value);
            let available =
                self.wrapwidth.saturating_sub(2 + specials).max(1);
            let mut lines = vec![String::new()];
            lines.extend(
                wrap(&escaped, available).iter().map(|c| unescape(c)),
            );
            return lines;
        }

        vec![self.value.to_string()]
    }
}

impl<'a> fmt::Display for POStringField<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut lines = self.lines();
        let index_repr = match self.plural_index {
            Some(index) => format!("[{}]", index),
            None => String::new(),
        };

        writeln!(
            f,
            "{}{}{} \"{}\"",
            self.delflag,
            self.fieldname,
            index_repr,
            escape(&lines.remove(0)),
        )?;
        for line in lines {
            writeln!(f, "{}\"{}\"", self.delflag, escape(&line))?;
        }
        Ok(())
    }
}

// Renders the string fields shared by both entry kinds, in the
// canonical msgctxt, msgid, msgid_plural, msgstr order.
pub(crate) fn mo_entry_to_string(
    entry: &MOEntry,
    wrapwidth: usize,
    delflag: &str,
) -> String {
    let mut ret = String::new();

    if let Some(msgctxt) = &entry.msgctxt {
        ret.push_str(
            &POStringField::new(
                "msgctxt", delflag, msgctxt, None, wrapwidth,
            )
            .to_string(),
        );
    }

    ret.push_str(
        &POStringField::new(
            "msgid",
            delflag,
            &entry.msgid,
            None,
            wrapwidth,
        )
        .to_string(),
    );

    if let Some(msgid_plural) = &entry.msgid_plural {
        ret.push_str(
            &POStringField::new(
                "msgid_plural",
                delflag,
                msgid_plural,
                None,
                wrapwidth,
            )
            .to_string(),
        );
    }

    match &entry.msgstr_plural {
        Some(msgstr_plural) => {
            for (index, msgstr) in msgstr_plural {
                ret.push_str(
                    &POStringField::new(
                        "msgstr",
                        delflag,
                        msgstr,
                        Some(*index),
                        wrapwidth,
                    )
                    .to_string(),
                );
            }
        }
        None => {
            let msgstr = entry.msgstr.as_deref().unwrap_or("");
            ret.push_str(
                &POStringField::new(
                    "msgstr", delflag, msgstr, None, wrapwidth,
                )
                .to_string(),
            );
        }
    }

    ret
}
