//! Text utilities for document snapshots.

/// Split a full document snapshot into its ordered, zero-based lines.
///
/// Separators are `\n`; a trailing `\r` per line is stripped so CRLF
/// documents compare like LF ones. A trailing newline does not produce a
/// phantom final line, and empty text yields an empty sequence.
pub fn split_lines(text: &str) -> Vec<String> {
    text.lines().map(str::to_owned).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text() {
        assert!(split_lines("").is_empty());
    }

    #[test]
    fn single_line() {
        assert_eq!(split_lines("hello"), vec!["hello"]);
    }

    #[test]
    fn multi_line() {
        assert_eq!(split_lines("a\nb\nc"), vec!["a", "b", "c"]);
    }

    #[test]
    fn trailing_newline_is_not_a_line() {
        assert_eq!(split_lines("a\nb\n"), vec!["a", "b"]);
    }

    #[test]
    fn blank_lines_are_preserved() {
        assert_eq!(split_lines("a\n\nb"), vec!["a", "", "b"]);
        assert_eq!(split_lines("\n"), vec![""]);
    }

    #[test]
    fn crlf_matches_lf() {
        assert_eq!(split_lines("a\r\nb\r\n"), split_lines("a\nb\n"));
    }
}
