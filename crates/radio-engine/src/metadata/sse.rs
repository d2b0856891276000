//! Incremental Server-Sent Events decoder.
//!
//! Bytes arrive in arbitrary chunks; lines may end in CR, LF or CRLF and a
//! CRLF pair may be split across chunks.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    /// Event type; `message` when the stream did not name one.
    pub event: String,
    pub data: String,
}

impl SseEvent {
    pub fn is_message(&self) -> bool {
        self.event == "message"
    }
}

#[derive(Debug, Default)]
pub struct SseDecoder {
    line: Vec<u8>,
    data: String,
    event: Option<String>,
    skip_lf: bool,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and collect every event it completes.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        let mut out = Vec::new();
        for &b in chunk {
            if self.skip_lf {
                self.skip_lf = false;
                if b == b'\n' {
                    continue;
                }
            }
            match b {
                b'\r' => {
                    self.skip_lf = true;
                    self.end_line(&mut out);
                }
                b'\n' => self.end_line(&mut out),
                _ => self.line.push(b),
            }
        }
        out
    }

    fn end_line(&mut self, out: &mut Vec<SseEvent>) {
        let raw = std::mem::take(&mut self.line);
        let line = String::from_utf8_lossy(&raw);

        if line.is_empty() {
            self.dispatch(out);
            return;
        }
        if line.starts_with(':') {
            return;
        }

        let (field, value) = match line.find(':') {
            Some(i) => {
                let value = &line[i + 1..];
                (&line[..i], value.strip_prefix(' ').unwrap_or(value))
            }
            None => (&line[..], ""),
        };

        match field {
            "data" => {
                self.data.push_str(value);
                self.data.push('\n');
            }
            "event" => self.event = Some(value.to_string()),
            // id and retry only matter for reconnection, which we never do.
            _ => {}
        }
    }

    fn dispatch(&mut self, out: &mut Vec<SseEvent>) {
        let event = self.event.take();
        if self.data.is_empty() {
            return;
        }
        let mut data = std::mem::take(&mut self.data);
        if data.ends_with('\n') {
            data.pop();
        }
        out.push(SseEvent {
            event: event
                .filter(|e| !e.is_empty())
                .unwrap_or_else(|| "message".to_string()),
            data,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_simple_message() {
        let mut d = SseDecoder::new();
        let events = d.feed(b"data: {\"streamTitle\":\"A\"}\n\n");
        assert_eq!(
            events,
            vec![SseEvent {
                event: "message".into(),
                data: "{\"streamTitle\":\"A\"}".into()
            }]
        );
    }

    #[test]
    fn joins_multiline_data_and_skips_comments() {
        let mut d = SseDecoder::new();
        let events = d.feed(b": keepalive\ndata: one\ndata:two\n\n");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "one\ntwo");
    }

    #[test]
    fn handles_split_chunks_and_crlf() {
        let mut d = SseDecoder::new();
        assert!(d.feed(b"data: hel").is_empty());
        assert!(d.feed(b"lo\r").is_empty());
        // The LF completing the CRLF must not count as a blank line.
        assert!(d.feed(b"\n").is_empty());
        let events = d.feed(b"\r\n");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "hello");

        let events = d.feed(b"data: x\r\rdata: y\n\n");
        let data: Vec<_> = events.iter().map(|e| e.data.as_str()).collect();
        assert_eq!(data, ["x", "y"]);
    }

    #[test]
    fn named_events_are_not_messages() {
        let mut d = SseDecoder::new();
        let events = d.feed(b"event: ping\ndata: {}\n\nevent: message\ndata: {}\n\n");
        assert_eq!(events.len(), 2);
        assert!(!events[0].is_message());
        assert!(events[1].is_message());
    }

    #[test]
    fn blank_lines_without_data_dispatch_nothing() {
        let mut d = SseDecoder::new();
        assert!(d.feed(b"\n\nevent: x\n\n").is_empty());
        let events = d.feed(b"data\n\n");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "");
        assert!(events[0].is_message());
    }
}
