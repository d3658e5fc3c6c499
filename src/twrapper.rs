//! Greedy text wrapping on unicode line break opportunities.

use unicode_linebreak::linebreaks;
use unicode_width::UnicodeWidthStr;

/// Wraps `text` into chunks of at most `wrapwidth` columns, breaking
/// only at line break opportunities.
///
/// Chunks keep their trailing whitespace, so the concatenation of the
/// returned chunks is always the original text. A chunk with no break
/// opportunity inside is returned whole even when it overflows.
pub fn wrap(text: &str, wrapwidth: usize) -> Vec<String> {
    let opportunities = linebreaks(text)
        .map(|(offset, _)| offset)
        .filter(|offset| *offset > 0 && *offset < text.len());

    let mut ret: Vec<String> = vec![];
    let mut start = 0;
    let mut candidate = 0;

    for offset in opportunities {
        if UnicodeWidthStr::width(&text[start..offset]) > wrapwidth
            && candidate > start
        {
            ret.push(text[start..candidate].to_string());
            start = candidate;
        }
        candidate = offset;
    }

    if UnicodeWidthStr::width(&text[start..]) > wrapwidth
        && candidate > start
    {
        ret.push(text[start..candidate].to_string());
        start = candidate;
    }
    ret.push(text[start..].to_string());
    ret
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple() {
        let text =
            "This is a test of the emergency broadcast system.";
        let wrapped = wrap(text, 10);
        assert_eq!(
            wrapped,
            vec![
                "This is a ",
                "test of ",
                "the ",
                "emergency ",
                "broadcast ",
                "system."
            ]
        );
    }

    #[test]
    fn long_wrapwidth() {
        let text =
            "This is a test of the emergency broadcast system.";
        let wrapped = wrap(text, 100);
        assert_eq!(wrapped, vec![text]);
    }

    #[test]
    fn unbreakable_line() {
        let text = "Thislineisverylongbutmustnotbebroken breaks should be here.";
        let wrapped = wrap(text, 5);
        assert_eq!(
            wrapped,
            vec![
                "Thislineisverylongbutmustnotbebroken ",
                "breaks ",
                "should ",
                "be ",
                "here."
            ]
        );
    }

    #[test]
    fn unicode_characters() {
        let text = "123Ááé aabbcc ÁáééÚí aabbcc";
        let wrapped = wrap(text, 7);
        assert_eq!(
            wrapped,
            vec!["123Ááé ", "aabbcc ", "ÁáééÚí ", "aabbcc"]
        );
    }

    #[test]
    fn chunks_rebuild_the_input() {
        let text = "a few words over a small width";
        assert_eq!(wrap(text, 8).concat(), text);
    }
}
