use std::borrow::Cow;

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const ELLIPSIS: char = '…';

/// Width of `s` in terminal columns.
pub fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Fit `s` into `max_width` columns, ending with `…` when something was cut.
///
/// Borrows when no cut is needed. A width of 1 leaves room for the ellipsis
/// only.
pub fn truncate_to_width(s: &str, max_width: usize) -> Cow<'_, str> {
    if display_width(s) <= max_width {
        return Cow::Borrowed(s);
    }
    if max_width == 0 {
        return Cow::Borrowed("");
    }

    let budget = max_width - 1;
    let mut used = 0;
    let mut end = 0;
    for (idx, c) in s.char_indices() {
        let w = UnicodeWidthChar::width(c).unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        end = idx + c.len_utf8();
    }

    let mut out = String::with_capacity(end + ELLIPSIS.len_utf8());
    out.push_str(&s[..end]);
    out.push(ELLIPSIS);
    Cow::Owned(out)
}

/// Drop control characters and escape sequences from server-supplied text
/// before it reaches the terminal.
///
/// CSI (`ESC [ ... final`) and OSC (`ESC ] ... BEL|ST`) sequences are removed
/// whole; every other control character, newlines included, is removed.
pub fn strip_control_chars(s: &str) -> Cow<'_, str> {
    if !s.chars().any(char::is_control) {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\x1b' {
            if !c.is_control() {
                out.push(c);
            }
            continue;
        }
        match chars.peek() {
            Some('[') => {
                chars.next();
                for c in chars.by_ref() {
                    if ('\x40'..='\x7e').contains(&c) {
                        break;
                    }
                }
            }
            Some(']') => {
                chars.next();
                while let Some(c) = chars.next() {
                    if c == '\x07' {
                        break;
                    }
                    if c == '\x1b' && chars.peek() == Some(&'\\') {
                        chars.next();
                        break;
                    }
                }
            }
            _ => {}
        }
    }
    Cow::Owned(out)
}

/// Last path segment of `path`, accepting both separators. Falls back to the
/// whole string when there is no usable segment.
pub fn file_name(path: &str) -> &str {
    path.rsplit(['/', '\\'])
        .find(|segment| !segment.is_empty())
        .unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fits_is_borrowed() {
        assert!(matches!(truncate_to_width("cat.jpg", 10), Cow::Borrowed("cat.jpg")));
    }

    #[test]
    fn test_truncates_with_ellipsis() {
        assert_eq!(truncate_to_width("sample-00042.jpg", 8), "sample-…");
        assert_eq!(display_width(&truncate_to_width("sample-00042.jpg", 8)), 8);
    }

    #[test]
    fn test_wide_chars_do_not_overflow() {
        // Each CJK char is two columns; the third would overflow 6 - 1.
        let out = truncate_to_width("画像画像画像", 6);
        assert_eq!(out, "画像…");
        assert!(display_width(&out) <= 6);
    }

    #[test]
    fn test_tiny_widths() {
        assert_eq!(truncate_to_width("abc", 0), "");
        assert_eq!(truncate_to_width("abc", 1), "…");
    }

    #[test]
    fn test_strip_clean_is_borrowed() {
        assert!(matches!(strip_control_chars("dog"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_strip_sequences() {
        assert_eq!(strip_control_chars("\x1b[31mred\x1b[0m"), "red");
        assert_eq!(strip_control_chars("\x1b]0;title\x07after"), "after");
        assert_eq!(strip_control_chars("\x1b]8;;http://x\x1b\\link"), "link");
        assert_eq!(strip_control_chars("a\nb\tc\x00"), "abc");
    }

    #[test]
    fn test_file_name() {
        assert_eq!(file_name("/data/demo/00001.jpg"), "00001.jpg");
        assert_eq!(file_name(r"C:\imgs\a.png"), "a.png");
        assert_eq!(file_name("plain.png"), "plain.png");
        assert_eq!(file_name("/data/dir/"), "dir");
    }
}
