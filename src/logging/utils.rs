//! Log file helpers: timestamps and ANSI stripping.
use chrono::Local;

/// Timestamp format of the run header.
pub(super) const DATETIME: &str = "%Y-%m-%d %H:%M:%S";
/// Timestamp format prefixed to every log line.
pub(super) const TIME: &str = "%H:%M:%S";

/// Current local time rendered with `format`.
pub(super) fn now(format: &str) -> String {
    Local::now().format(format).to_string()
}

/// Remove terminal escape sequences so the log file stays plain text.
///
/// CSI sequences (`ESC [` ... final byte in `@..=~`) are dropped whole; any
/// other escape drops `ESC` and the byte after it.
pub(super) fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some((text, tail)) = rest.split_once('\x1b') {
        out.push_str(text);
        rest = if let Some(csi) = tail.strip_prefix('[') {
            csi.find(|c| ('@'..='~').contains(&c))
                .and_then(|end| csi.get(end + 1..))
                .unwrap_or("")
        } else {
            tail.chars()
                .next()
                .and_then(|c| tail.get(c.len_utf8()..))
                .unwrap_or("")
        };
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colours_are_removed() {
        assert_eq!(strip_ansi("\x1b[33mWARN\x1b[0m  skipped"), "WARN  skipped");
        assert_eq!(
            strip_ansi("\x1b[1;34m==>\x1b[0m \x1b[1mBuilding ex01\x1b[0m"),
            "==> Building ex01"
        );
    }

    #[test]
    fn plain_text_is_untouched() {
        assert_eq!(strip_ansi("ex01-raw.js"), "ex01-raw.js");
        assert_eq!(strip_ansi(""), "");
    }

    #[test]
    fn cursor_and_short_escapes_are_removed() {
        assert_eq!(strip_ansi("\x1b[2Kdone"), "done");
        assert_eq!(strip_ansi("\x1b7saved"), "saved");
        assert_eq!(strip_ansi("trailing\x1b["), "trailing");
    }

    #[test]
    fn timestamps_have_expected_shape() {
        assert_eq!(now(TIME).len(), "12:34:56".len());
        assert_eq!(now(DATETIME).len(), "2024-01-31 12:34:56".len());
        assert_eq!(now(DATETIME).matches(':').count(), 2);
    }
}
