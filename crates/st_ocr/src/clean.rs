//! Line-level noise filter for free-form OCR text.
//!
//! Mixed-script recognition (Latin + CJK + Hangul) tends to hallucinate short runs of
//! unrelated symbols. Lines whose printable-ASCII density is below [`MIN_ASCII_RATIO`] are
//! dropped as gibberish; surviving lines are restricted to printable ASCII.

use tracing::debug;

pub const MIN_ASCII_RATIO: f64 = 0.3;

#[inline]
fn is_printable_ascii(c: char) -> bool {
    matches!(c, '\x20'..='\x7E')
}

fn clean_line(line: &str) -> Option<String> {
    let ascii = line.chars().filter(|&c| is_printable_ascii(c)).count();
    let total = line.trim().chars().count();

    // `ascii` counts the untrimmed line, so padding raises the ratio.
    if total > 0 && (ascii as f64) / (total as f64) < MIN_ASCII_RATIO {
        debug!("Filtered gibberish line: {line:?}");
        return None;
    }

    let stripped: String = line.chars().filter(|&c| is_printable_ascii(c)).collect();
    let stripped = stripped.trim();
    (stripped.chars().count() > 1).then(|| stripped.to_string())
}

/// Clean OCR text line by line. Idempotent.
pub fn clean_text(text: &str) -> String {
    text.split('\n')
        .filter_map(clean_line)
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::clean_text;

    #[test]
    fn mostly_foreign_line_is_dropped() {
        assert_eq!(clean_text("안녕하세요 반갑습니다"), "");
        assert_eq!(clean_text("Title\n漢字漢字漢字 a\nBody"), "Title\nBody");
    }

    #[test]
    fn mostly_ascii_line_keeps_ascii_only() {
        assert_eq!(clean_text("H3ll0 ##@@ 世界"), "H3ll0 ##@@");
        assert_eq!(clean_text("price: 12€"), "price: 12");
    }

    #[test]
    fn short_leftovers_are_dropped() {
        assert_eq!(clean_text("a\nok\n x \n"), "ok");
        assert_eq!(clean_text("é a"), "");
    }

    #[test]
    fn ratio_uses_untrimmed_ascii_count() {
        // 3 CJK + 1 ASCII letter: 1/4 < 0.3 -> dropped.
        assert_eq!(clean_text("世界人a"), "");
        // Same content padded with spaces: 3 ASCII / 4 trimmed chars -> kept, strips to "a".
        // A single char is then noise anyway.
        assert_eq!(clean_text(" 世界人a "), "");
        // 2 / 8 is noise, but padding the same line lifts it to 4 / 8.
        assert_eq!(clean_text("世界人人人人ab"), "");
        assert_eq!(clean_text(" 世界人人人人ab "), "ab");
    }

    #[test]
    fn carriage_returns_and_tabs_are_stripped() {
        assert_eq!(clean_text("first\r\nsecond\tline"), "first\nsecondline");
    }

    #[test]
    fn empty_input_is_empty() {
        assert_eq!(clean_text(""), "");
        assert_eq!(clean_text("\n\n"), "");
    }

    #[test]
    fn cleaning_is_idempotent() {
        let samples = [
            "H3ll0 ##@@ 世界",
            "Title\n漢字漢字漢字 a\nBody",
            "  spaced   out  \n\n\u{3000}全角\u{3000}x",
            "mixed 한글 text\r\nline two\n ? \n!!",
            "",
            "a\nb\nc",
            "ÀÉÎÕÜ çñ\nabc ÿ def",
        ];
        for s in samples {
            let once = clean_text(s);
            assert_eq!(clean_text(&once), once, "input: {s:?}");
        }
    }
}
