//! Message framing
//!
//! One read (or one datagram) yields at most one message. The message ends at
//! the first `%` or newline; when neither shows up inside the scan window the
//! window itself is the message, so a peer that never sends a terminator still
//! gets an answer.

/// Dedicated end-of-message byte
pub const MESSAGE_TERMINATOR: u8 = b'%';

/// Scan window for a single message, in bytes
pub const MAX_MESSAGE_LEN: usize = 2000;

/// Extract one message from raw bytes.
///
/// Only the first `window` bytes are considered. Surrounding whitespace and NUL
/// padding are trimmed before the terminator scan. Anything after the first
/// terminator is discarded.
pub fn frame_message(raw: &[u8], window: usize) -> String {
    let raw = &raw[..raw.len().min(window)];
    let text = String::from_utf8_lossy(raw);
    let text = text.trim_matches(|c: char| c.is_whitespace() || c == '\0');

    match text.find([MESSAGE_TERMINATOR as char, '\n']) {
        Some(end) if text.as_bytes()[end] == b'\n' => {
            text[..end].trim_end_matches('\r').to_string()
        }
        Some(end) => text[..end].to_string(),
        None => text.to_string(),
    }
}

/// Whether `raw` contains an end-of-message byte
pub fn has_terminator(raw: &[u8]) -> bool {
    raw.iter().any(|&b| b == MESSAGE_TERMINATOR || b == b'\n')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_terminator() {
        assert!(has_terminator(b"hello\n"));
        assert!(has_terminator(b"tail%"));
        assert!(!has_terminator(b"no end in sight"));
        assert!(!has_terminator(b""));
    }

    #[test]
    fn test_newline_terminated() {
        assert_eq!(frame_message(b"hello\n", MAX_MESSAGE_LEN), "hello");
        assert_eq!(frame_message(b"hello\r\n", MAX_MESSAGE_LEN), "hello");
    }

    #[test]
    fn test_percent_terminated() {
        assert_eq!(frame_message(b"hello%", MAX_MESSAGE_LEN), "hello");
    }

    #[test]
    fn test_embedded_percent_truncates_at_first() {
        assert_eq!(
            frame_message(b"GET_NEXT_EVENTS;x;2024%trailing%more\n", MAX_MESSAGE_LEN),
            "GET_NEXT_EVENTS;x;2024"
        );
    }

    #[test]
    fn test_earliest_terminator_wins() {
        assert_eq!(frame_message(b"one\ntwo%three", MAX_MESSAGE_LEN), "one");
        assert_eq!(frame_message(b"one%two\nthree", MAX_MESSAGE_LEN), "one");
    }

    #[test]
    fn test_second_message_in_same_read_is_dropped() {
        assert_eq!(frame_message(b"first\nsecond\n", MAX_MESSAGE_LEN), "first");
    }

    #[test]
    fn test_no_terminator_is_dispatched_as_is() {
        assert_eq!(frame_message(b"no terminator", MAX_MESSAGE_LEN), "no terminator");
    }

    #[test]
    fn test_no_terminator_truncated_at_window() {
        let raw = vec![b'a'; MAX_MESSAGE_LEN + 500];
        let message = frame_message(&raw, MAX_MESSAGE_LEN);
        assert_eq!(message.len(), MAX_MESSAGE_LEN);
    }

    #[test]
    fn test_terminator_beyond_window_is_ignored() {
        let mut raw = vec![b'a'; 10];
        raw.push(b'%');
        assert_eq!(frame_message(&raw, 5), "aaaaa");
    }

    #[test]
    fn test_trims_padding_and_whitespace() {
        let mut raw = b"  hello world \n".to_vec();
        raw.extend_from_slice(&[0u8; 32]);
        assert_eq!(frame_message(&raw, MAX_MESSAGE_LEN), "hello world");
    }

    #[test]
    fn test_blank_input() {
        assert_eq!(frame_message(b"", MAX_MESSAGE_LEN), "");
        assert_eq!(frame_message(b"\n\n", MAX_MESSAGE_LEN), "");
    }
}
