//! Incremental decoder for `text/event-stream` bodies.
//!
//! Only `data` fields matter to the client: each dispatched event yields its data
//! payload, with multi-line data joined by `\n`. Comments and the `event`, `id` and
//! `retry` fields are skipped.

const BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Debug, Default)]
pub struct SseDecoder {
    line: Vec<u8>,
    data: Option<String>,
    /// Previous chunk ended on CR; a leading LF belongs to the same line break.
    skip_lf: bool,
    /// The stream start has been checked for a byte order mark.
    bom_checked: bool,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds a body chunk and returns the payloads of every event it completed.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        let mut events = Vec::new();
        for &byte in chunk {
            if !self.bom_checked {
                // Stream start: the line buffer holds the BOM bytes matched so far.
                if byte == BOM[self.line.len()] {
                    self.line.push(byte);
                    if self.line.len() == BOM.len() {
                        self.line.clear();
                        self.bom_checked = true;
                    }
                    continue;
                }
                self.bom_checked = true;
            }
            if std::mem::take(&mut self.skip_lf) && byte == b'\n' {
                continue;
            }
            match byte {
                b'\n' => self.end_line(&mut events),
                b'\r' => {
                    self.skip_lf = true;
                    self.end_line(&mut events);
                }
                _ => self.line.push(byte),
            }
        }
        events
    }

    fn end_line(&mut self, events: &mut Vec<String>) {
        let line = std::mem::take(&mut self.line);
        if line.is_empty() {
            if let Some(data) = self.data.take() {
                events.push(data);
            }
            return;
        }
        if line[0] == b':' {
            return;
        }

        let text = String::from_utf8_lossy(&line);
        let (field, value) = match text.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (&*text, ""),
        };
        if field != "data" {
            return;
        }
        match self.data.as_mut() {
            Some(data) => {
                data.push('\n');
                data.push_str(value);
            }
            None => self.data = Some(value.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leading_bom_is_skipped_once() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.feed(b"\xEF\xBB").is_empty());
        assert_eq!(
            decoder.feed(b"\xBFdata: first\n\n\xEF\xBB\xBFdata: second\n\n"),
            vec!["first".to_string()]
        );
    }

    #[test]
    fn dispatches_on_blank_line() {
        let mut decoder = SseDecoder::new();
        assert_eq!(
            decoder.feed(b"data: one\n\ndata: two\n\n"),
            vec!["one", "two"]
        );
    }

    #[test]
    fn incomplete_event_waits_for_more_input() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.feed(b"data: par").is_empty());
        assert!(decoder.feed(b"tial\n").is_empty());
        assert_eq!(decoder.feed(b"\n"), vec!["partial"]);
    }

    #[test]
    fn joins_multi_line_data() {
        let mut decoder = SseDecoder::new();
        assert_eq!(
            decoder.feed(b"data: first\ndata:second\n\n"),
            vec!["first\nsecond"]
        );
    }

    #[test]
    fn handles_crlf_split_across_chunks() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.feed(b"data: a\r").is_empty());
        assert_eq!(decoder.feed(b"\n\r\n"), vec!["a"]);
        assert_eq!(decoder.feed(b"data: b\r\r"), vec!["b"]);
    }

    #[test]
    fn skips_comments_and_other_fields() {
        let mut decoder = SseDecoder::new();
        let events = decoder.feed(b": keep-alive\n\nevent: log\nid: 7\nretry: 100\ndata: x\n\n");
        assert_eq!(events, vec!["x"]);
    }

    #[test]
    fn event_without_data_is_not_dispatched() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.feed(b"event: ping\n\n").is_empty());
        assert_eq!(decoder.feed(b"data:\n\n"), vec![""]);
    }

    #[test]
    fn only_one_leading_space_is_stripped() {
        let mut decoder = SseDecoder::new();
        assert_eq!(decoder.feed(b"data:  -- msg\n\n"), vec![" -- msg"]);
    }

    #[test]
    fn non_ascii_payload_survives_chunking() {
        let text = "data: ✔ Обработка завершена.\n\n".as_bytes();
        let (head, tail) = text.split_at(12);
        let mut decoder = SseDecoder::new();
        assert!(decoder.feed(head).is_empty());
        assert_eq!(decoder.feed(tail), vec!["✔ Обработка завершена."]);
    }
}
