//! Line oriented state machine over the PO textual format.
//!
//! Each state names the token a continuation line would extend.
//! Lines prefixed with `#~` re-dispatch into the same states with
//! the obsolete flag raised on the entry under construction.

use std::fs;
use std::mem;
use std::path::{Path, PathBuf};

use snafu::prelude::*;

use crate::encoding::{
    charset_from_po_bytes, decode_bytes, DEFAULT_ENCODING,
};
use crate::entry::POEntry;
use crate::errors::{
    DuplicateSnafu, MalformedSnafu, POParseError, SyntaxSnafu,
    UnescapedDoubleQuoteSnafu,
};
use crate::escaping::unescape;
use crate::file::pofile::POFile;
use crate::file::{msgstr_to_metadata, Options};

#[derive(Clone, Copy, Debug, PartialEq)]
enum State {
    Init,
    Comment,
    TComment,
    Flags,
    Occurrences,
    PrevMsgctxt,
    PrevMsgid,
    PrevMsgidPlural,
    Msgctxt,
    Msgid,
    MsgidPlural,
    Msgstr,
    MsgstrPlural,
}

impl State {
    // a string field is open and a bare quoted line extends it
    fn collecting_string(self) -> bool {
        matches!(
            self,
            State::PrevMsgctxt
                | State::PrevMsgid
                | State::PrevMsgidPlural
                | State::Msgctxt
                | State::Msgid
                | State::MsgidPlural
                | State::Msgstr
                | State::MsgstrPlural
        )
    }

    // the entry under construction holds a complete unit
    fn entry_complete(self) -> bool {
        matches!(self, State::Msgstr | State::MsgstrPlural)
    }
}

pub(crate) struct POFileParser {
    pub file: POFile,
    content: String,
    state: State,
    entry: POEntry,
    entry_touched: bool,
    plural_index: usize,
    lineno: usize,
}

impl POFileParser {
    pub fn new(mut options: Options) -> Result<Self, POParseError> {
        let mut path: Option<PathBuf> = None;

        let bytes: Vec<u8> = match options.byte_content.take() {
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

        let encoding = match &options.encoding {
            Some(encoding) => encoding.clone(),
            None if options.autodetect_encoding => {
                charset_from_po_bytes(&bytes)
                    .unwrap_or_else(|| DEFAULT_ENCODING.to_string())
            }
            None => DEFAULT_ENCODING.to_string(),
        };
        let content = decode_bytes(&bytes, &encoding);

        let mut file = POFile::new(options);
        file.encoding = encoding;
        file.path = path;

        Ok(Self {
            file,
            content,
            state: State::Init,
            entry: POEntry::new(0),
            entry_touched: false,
            plural_index: 0,
            lineno: 0,
        })
    }

    pub fn parse(&mut self) -> Result<(), POParseError> {
        let content = mem::take(&mut self.content);
        for (index, line) in content.lines().enumerate() {
            self.lineno = index + 1;
            self.process_line(line.trim())?;
        }

        // a pending entry is emitted at end of input, while a
        // trailing comment block that never reached a string field
        // is discarded
        if self.state.collecting_string() {
            self.emit()?;
        }
        self.promote_header();
        Ok(())
    }

    fn process_line(&mut self, line: &str) -> Result<(), POParseError> {
        if line.is_empty() {
            if self.state.collecting_string() {
                self.emit()?;
            }
            return Ok(());
        }

        if line.starts_with("#~|") {
            // previous msgid annotations on obsolete entries are
            // tolerated but not retained
            return Ok(());
        }
        if let Some(rest) = line.strip_prefix("#~") {
            return self.handle_directive(rest.trim_start(), true);
        }
        if let Some(rest) = line.strip_prefix("#.") {
            self.close_complete_entry()?;
            return self.handle_tcomment(rest);
        }
        if let Some(rest) = line.strip_prefix("#:") {
            self.close_complete_entry()?;
            return self.handle_occurrences(rest);
        }
        if let Some(rest) = line.strip_prefix("#,") {
            self.close_complete_entry()?;
            return self.handle_flags(rest);
        }
        if let Some(rest) = line.strip_prefix("#|") {
            self.close_complete_entry()?;
            return self.handle_previous(rest.trim_start());
        }
        if let Some(rest) = line.strip_prefix('#') {
            self.close_complete_entry()?;
            return self.handle_comment(rest);
        }

        self.handle_directive(line, false)
    }

    // comments and directives after a completed unit open the next
    // entry
    fn close_complete_entry(&mut self) -> Result<(), POParseError> {
        if self.state.entry_complete() {
            self.emit()?;
        }
        Ok(())
    }

    fn handle_comment(&mut self, rest: &str) -> Result<(), POParseError> {
        self.touch();
        let text = rest.strip_prefix(' ').unwrap_or(rest);
        append_block(&mut self.entry.comment, text);
        self.state = State::Comment;
        Ok(())
    }

    fn handle_tcomment(
        &mut self,
        rest: &str,
    ) -> Result<(), POParseError> {
        self.touch();
        let text = rest.strip_prefix(' ').unwrap_or(rest);
        append_block(&mut self.entry.tcomment, text);
        self.state = State::TComment;
        Ok(())
    }

    fn handle_occurrences(
        &mut self,
        rest: &str,
    ) -> Result<(), POParseError> {
        self.touch();
        for token in rest.split_whitespace() {
            // the line number is the last colon separated token
            // that parses as a number, so Windows paths with drive
            // letters survive
            let occurrence = match token.rsplit_once(':') {
                Some((path, lineno))
                    if !lineno.is_empty()
                        && lineno
                            .bytes()
                            .all(|byte| byte.is_ascii_digit()) =>
                {
                    (path.to_string(), lineno.to_string())
                }
                _ => (token.to_string(), String::new()),
            };
            self.entry.occurrences.push(occurrence);
        }
        self.state = State::Occurrences;
        Ok(())
    }

    fn handle_flags(&mut self, rest: &str) -> Result<(), POParseError> {
        self.touch();
        self.entry.flags.extend(
            rest.split(',')
                .map(str::trim)
                .filter(|flag| !flag.is_empty())
                .map(str::to_string),
        );
        self.state = State::Flags;
        Ok(())
    }

    fn handle_previous(
        &mut self,
        rest: &str,
    ) -> Result<(), POParseError> {
        self.touch();
        if rest.starts_with('"') {
            let body = self.parse_quoted(rest)?;
            let target = match self.state {
                State::PrevMsgctxt => &mut self.entry.previous_msgctxt,
                State::PrevMsgid => &mut self.entry.previous_msgid,
                State::PrevMsgidPlural => {
                    &mut self.entry.previous_msgid_plural
                }
                _ => {
                    return SyntaxSnafu { line: self.lineno }.fail()
                }
            };
            append_string(target, &body);
            return Ok(());
        }

        if let Some(rest) = rest.strip_prefix("msgid_plural") {
            self.entry.previous_msgid_plural =
                Some(self.parse_quoted(rest)?);
            self.state = State::PrevMsgidPlural;
        } else if let Some(rest) = rest.strip_prefix("msgid") {
            self.entry.previous_msgid = Some(self.parse_quoted(rest)?);
            self.state = State::PrevMsgid;
        } else if let Some(rest) = rest.strip_prefix("msgctxt") {
            self.entry.previous_msgctxt =
                Some(self.parse_quoted(rest)?);
            self.state = State::PrevMsgctxt;
        } else {
            let keyword = rest
                .split_whitespace()
                .next()
                .unwrap_or_default()
                .to_string();
            return MalformedSnafu {
                message: format!("unknown keyword {keyword}"),
                line: self.lineno,
            }
            .fail();
        }
        Ok(())
    }

    fn handle_directive(
        &mut self,
        line: &str,
        obsolete: bool,
    ) -> Result<(), POParseError> {
        if line.starts_with('"') {
            self.handle_continuation(line)?;
            if obsolete {
                self.entry.obsolete = true;
            }
            return Ok(());
        }

        if let Some(rest) = line.strip_prefix("msgid_plural") {
            let body = self.parse_quoted(rest)?;
            self.touch();
            self.entry.msgid_plural = Some(body);
            self.state = State::MsgidPlural;
        } else if let Some(rest) = line.strip_prefix("msgid") {
            let body = self.parse_quoted(rest)?;
            if self.state.entry_complete()
                || self.state == State::Msgid
            {
                self.emit()?;
            }
            self.touch();
            self.entry.msgid = body;
            self.state = State::Msgid;
        } else if let Some(rest) = line.strip_prefix("msgstr[") {
            let (index, rest) =
                rest.split_once(']').with_context(|| MalformedSnafu {
                    message: "malformed msgstr index".to_string(),
                    line: self.lineno,
                })?;
            let index: usize = index.parse().ok().with_context(|| {
                MalformedSnafu {
                    message: format!(
                        "invalid msgstr index {index}"
                    ),
                    line: self.lineno,
                }
            })?;
            let body = self.parse_quoted(rest)?;
            self.touch();
            self.entry.msgstr_plural.insert(index, body);
            self.plural_index = index;
            self.state = State::MsgstrPlural;
        } else if let Some(rest) = line.strip_prefix("msgstr") {
            let body = self.parse_quoted(rest)?;
            self.touch();
            self.entry.msgstr = Some(body);
            self.state = State::Msgstr;
        } else if let Some(rest) = line.strip_prefix("msgctxt") {
            let body = self.parse_quoted(rest)?;
            if self.state.entry_complete() {
                self.emit()?;
            }
            self.touch();
            self.entry.msgctxt = Some(body);
            self.state = State::Msgctxt;
        } else {
            return SyntaxSnafu { line: self.lineno }.fail();
        }
        if obsolete {
            self.entry.obsolete = true;
        }
        Ok(())
    }

    fn handle_continuation(
        &mut self,
        line: &str,
    ) -> Result<(), POParseError> {
        let body = self.parse_quoted(line)?;
        match self.state {
            State::Msgctxt => {
                append_string(&mut self.entry.msgctxt, &body)
            }
            State::Msgid => self.entry.msgid.push_str(&body),
            State::MsgidPlural => {
                append_string(&mut self.entry.msgid_plural, &body)
            }
            State::Msgstr => {
                append_string(&mut self.entry.msgstr, &body)
            }
            State::MsgstrPlural => self
                .entry
                .msgstr_plural
                .entry(self.plural_index)
                .or_default()
                .push_str(&body),
            State::PrevMsgctxt => {
                append_string(&mut self.entry.previous_msgctxt, &body)
            }
            State::PrevMsgid => {
                append_string(&mut self.entry.previous_msgid, &body)
            }
            State::PrevMsgidPlural => append_string(
                &mut self.entry.previous_msgid_plural,
                &body,
            ),
            _ => return SyntaxSnafu { line: self.lineno }.fail(),
        }
        Ok(())
    }

    // Extracts the body of a quoted token, validating the quoting.
    // The body must be delimited by double quotes and any quote
    // inside must be escaped by an odd number of backslashes.
    fn parse_quoted(
        &self,
        rest: &str,
    ) -> Result<String, POParseError> {
        let rest = rest.trim();
        if rest.len() < 2
            || !rest.starts_with('"')
            || !rest.ends_with('"')
        {
            return SyntaxSnafu { line: self.lineno }.fail();
        }
        let body = &rest[1..rest.len() - 1];
        if contains_unescaped_quote(body) {
            return UnescapedDoubleQuoteSnafu { line: self.lineno }
                .fail();
        }
        Ok(unescape(body))
    }

    fn touch(&mut self) {
        if !self.entry_touched {
            self.entry_touched = true;
            self.entry.linenum = self.lineno;
        }
    }

    fn emit(&mut self) -> Result<(), POParseError> {
        let entry = mem::take(&mut self.entry);
        self.entry_touched = false;
        self.plural_index = 0;
        self.state = State::Init;

        if self.file.options.check_for_duplicates
            && self
                .file
                .entries
                .iter()
                .any(|existing| {
                    !existing.obsolete
                        && existing.same_identity(&entry)
                })
        {
            return DuplicateSnafu {
                msgid: entry.msgid,
                line: self.lineno,
            }
            .fail();
        }
        self.file.entries.push(entry);
        Ok(())
    }

    // The empty msgid entry becomes the catalog header: its msgstr
    // holds the metadata and its comment block the header comment.
    fn promote_header(&mut self) {
        let position = self
            .file
            .entries
            .iter()
            .position(|entry| entry.msgid.is_empty() && !entry.obsolete);
        if let Some(position) = position {
            let header_entry = self.file.entries.remove(position);
            if header_entry.fuzzy() {
                self.file.metadata_is_fuzzy = true;
            }
            self.file.header = header_entry.comment;
            if let Some(msgstr) = &header_entry.msgstr {
                msgstr_to_metadata(msgstr, &mut self.file.metadata);
            }
        }
    }
}

fn append_block(target: &mut Option<String>, text: &str) {
    match target {
        Some(block) => {
            block.push('\n');
            block.push_str(text);
        }
        None => *target = Some(text.to_string()),
    }
}

fn append_string(target: &mut Option<String>, text: &str) {
    match target {
        Some(value) => value.push_str(text),
        None => *target = Some(text.to_string()),
    }
}

fn contains_unescaped_quote(body: &str) -> bool {
    let mut backslashes = 0usize;
    for character in body.chars() {
        if character == '\\' {
            backslashes += 1;
            continue;
        }
        if character == '"' && backslashes % 2 == 0 {
            return true;
        }
        backslashes = 0;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::pofile::pofile;

    #[test]
    fn unescaped_quote_detection() {
        assert!(!contains_unescaped_quote("no quotes"));
        assert!(!contains_unescaped_quote("escaped \\\" quote"));
        assert!(contains_unescaped_quote("bare \" quote"));
        assert!(contains_unescaped_quote("\"starts with one"));
        // an even number of backslashes does not escape the quote
        assert!(contains_unescaped_quote("even \\\\\" quote"));
        assert!(!contains_unescaped_quote("odd \\\\\\\" quote"));
    }

    #[test]
    fn unescaped_quote_in_msgid() {
        let content = concat!(
            "\n",
            "msgid \"Some msgid with \\\"double\\\" quotes\"\n",
            "msgid \"Some msgid with \"double\\\" quotes\"\n",
        );
        let err = pofile(content).unwrap_err();
        assert_eq!(
            err.to_string(),
            "unescaped double quote found: (line 3)"
        );
        assert_eq!(err.lineno(), Some(3));
    }

    #[test]
    fn unescaped_quote_in_continuation() {
        let content = concat!(
            "\n",
            "msgid \"Some msgid with \\\"double\\\" quotes\"\n",
            "msgstr \"\"\n",
            "\"Some msgstr with \"double\\\" quotes\"\n",
        );
        let err = pofile(content).unwrap_err();
        assert_eq!(
            err.to_string(),
            "unescaped double quote found: (line 4)"
        );
    }

    #[test]
    fn unescaped_quote_at_start_of_string() {
        let content = concat!(
            "\n",
            "msgid \"Some msgid with \\\"double\\\" quotes\"\n",
            "msgid \"\"Some msgid with double\\\" quotes\"\n",
        );
        let err = pofile(content).unwrap_err();
        assert_eq!(
            err.to_string(),
            "unescaped double quote found: (line 3)"
        );
    }

    #[test]
    fn unknown_previous_keyword() {
        let content = concat!(
            "#| previous_message \"Good morning\"\n",
            "msgid \"Hello\"\n",
            "msgstr \"Hola\"\n",
        );
        let err = pofile(content).unwrap_err();
        assert_eq!(
            err.to_string(),
            "unknown keyword previous_message: (line 1)"
        );
    }

    #[test]
    fn garbage_line_is_a_syntax_error() {
        let content = concat!(
            "msgid \"valid\"\n",
            "msgstr \"valide\"\n",
            "\n",
            "whatever this is\n",
        );
        let err = pofile(content).unwrap_err();
        assert_eq!(err.to_string(), "syntax error: (line 4)");
    }

    #[test]
    fn tolerant_entry_recovery_without_blank_line() {
        let content = concat!(
            "msgid \"first\"\n",
            "msgstr \"premier\"\n",
            "msgid \"second\"\n",
            "msgstr \"second\"\n",
        );
        let file = pofile(content).unwrap();
        assert_eq!(file.entries.len(), 2);
        assert_eq!(file.entries[0].msgid, "first");
        assert_eq!(file.entries[1].msgid, "second");
    }

    #[test]
    fn obsolete_previous_msgid_is_discarded() {
        let content = concat!(
            "#~| msgid \"previous version\"\n",
            "#~ msgid \"old\"\n",
            "#~ msgstr \"ancien\"\n",
        );
        let file = pofile(content).unwrap();
        assert_eq!(file.entries.len(), 1);
        assert!(file.entries[0].obsolete);
        assert_eq!(file.entries[0].previous_msgid, None);
    }

    #[test]
    fn windows_path_occurrences() {
        let content = concat!(
            "#: C:\\foo\\bar.py:12 simple.py:100 noline.py\n",
            "msgid \"foo\"\n",
            "msgstr \"bar\"\n",
        );
        let file = pofile(content).unwrap();
        assert_eq!(
            file.entries[0].occurrences,
            vec![
                ("C:\\foo\\bar.py".to_string(), "12".to_string()),
                ("simple.py".to_string(), "100".to_string()),
                ("noline.py".to_string(), String::new()),
            ],
        );
    }

    #[test]
    fn linenum_assignment() {
        let content = concat!(
            "# header comment\n",
            "msgid \"\"\n",
            "msgstr \"\"\n",
            "\n",
            "# a comment\n",
            "msgid \"foo\"\n",
            "msgstr \"bar\"\n",
            "\n",
            "msgid \"baz\"\n",
            "msgstr \"\"\n",
        );
        let file = pofile(content).unwrap();
        assert_eq!(file.entries[0].linenum, 5);
        assert_eq!(file.entries[1].linenum, 9);
    }

    #[test]
    fn trailing_comment_is_discarded() {
        let content = concat!(
            "msgid \"\"\n",
            "msgstr \"Content-Type: text/plain; charset=UTF-8\\n\"\n",
            "\n",
            "msgid \"foo\"\n",
            "msgstr \"oof\"\n",
            "\n",
            "# trailing comment\n",
        );
        let file = pofile(content).unwrap();
        assert_eq!(file.entries.len(), 1);
        assert_eq!(
            file.to_string(),
            concat!(
                "#\n",
                "msgid \"\"\n",
                "msgstr \"Content-Type: text/plain; charset=UTF-8\\n\"\n",
                "\n",
                "msgid \"foo\"\n",
                "msgstr \"oof\"\n",
            ),
        );
    }

    #[test]
    fn indented_entries() {
        let content = concat!(
            "msgid \"\"\n",
            "msgstr \"\"\n",
            "\n",
            "   msgid \"foo\"\n",
            "   msgstr \"bar\"\n",
        );
        let file = pofile(content).unwrap();
        assert_eq!(file.entries.len(), 1);
        assert_eq!(file.entries[0].msgstr.as_deref(), Some("bar"));
    }

    #[test]
    fn crlf_line_endings() {
        let content =
            "msgid \"\"\r\nmsgstr \"\"\r\n\r\nmsgid \"a\"\r\nmsgstr \"b\"\r\n";
        let file = pofile(content).unwrap();
        assert_eq!(file.entries.len(), 1);
        assert_eq!(file.entries[0].msgstr.as_deref(), Some("b"));
    }

    #[test]
    fn duplicated_entries_rejected_while_parsing() {
        let content = concat!(
            "msgid \"and\"\n",
            "msgstr \"y\"\n",
            "\n",
            "msgid \"and\"\n",
            "msgstr \"e\"\n",
        );
        let err = pofile(
            Options::from(content).with_check_for_duplicates(true),
        )
        .unwrap_err();
        assert!(err
            .to_string()
            .starts_with("entry \"and\" already exists"));

        // different contexts are different identities
        let content = concat!(
            "msgid \"and\"\n",
            "msgstr \"y\"\n",
            "\n",
            "msgctxt \"other context\"\n",
            "msgid \"and\"\n",
            "msgstr \"e\"\n",
        );
        let file = pofile(
            Options::from(content).with_check_for_duplicates(true),
        )
        .unwrap();
        assert_eq!(file.entries.len(), 2);
    }

    #[test]
    fn fuzzy_header_promotion() {
        let content = concat!(
            "# the header comment\n",
            "#, fuzzy\n",
            "msgid \"\"\n",
            "msgstr \"\"\n",
            "\"Project-Id-Version: PACKAGE VERSION\\n\"\n",
        );
        let file = pofile(content).unwrap();
        assert!(file.metadata_is_fuzzy);
        assert_eq!(
            file.header.as_deref(),
            Some("the header comment")
        );
        assert_eq!(
            file.metadata["Project-Id-Version"],
            "PACKAGE VERSION"
        );
        assert!(file.entries.is_empty());
    }

    #[test]
    fn header_promoted_from_unusual_location() {
        let content = concat!(
            "msgid \"foo\"\n",
            "msgstr \"oof\"\n",
            "\n",
            "msgid \"\"\n",
            "msgstr \"Content-Type: text/plain; charset=UTF-8\\n\"\n",
        );
        let file = pofile(content).unwrap();
        assert_eq!(
            file.metadata["Content-Type"],
            "text/plain; charset=UTF-8"
        );
        assert_eq!(file.entries.len(), 1);
    }

    #[test]
    fn multiline_previous_fields() {
        let content = concat!(
            "#| msgctxt \"\"\n",
            "#| \"Some message context\"\n",
            "#| msgid \"\"\n",
            "#| \"multi\\n\"\n",
            "#| \"line\\n\"\n",
            "msgid \"multi line\"\n",
            "msgstr \"\"\n",
        );
        let file = pofile(content).unwrap();
        let entry = &file.entries[0];
        assert_eq!(
            entry.previous_msgctxt.as_deref(),
            Some("Some message context")
        );
        assert_eq!(
            entry.previous_msgid.as_deref(),
            Some("multi\nline\n")
        );
    }
}
