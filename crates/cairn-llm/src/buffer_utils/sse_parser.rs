use bytes::Bytes;
use futures::{Stream, StreamExt};
use serde_json::Value;
use tracing::debug;

use super::buffering::Utf8LineBuffer;
use crate::error::{truncate_excerpt, LlmError};
use crate::streaming::{EventStream, ProtocolEvent};

/// Data value that terminates the stream
pub const DONE_SENTINEL: &str = "[DONE]";

/// Incremental decoder for the event-tagged line protocol.
///
/// Feed it byte chunks in arrival order; it yields one [`ProtocolEvent`]
/// per well-formed `data:` line. An `event:` line sets the kind of the
/// next data line only. Data lines that are not JSON are dropped.
/// After the `[DONE]` sentinel the decoder ignores all further input.
pub struct EventStreamDecoder {
    lines: Utf8LineBuffer,
    pending_kind: Option<String>,
    done: bool,
}

enum LineOutcome {
    Event(ProtocolEvent),
    Done,
    Nothing,
}

impl EventStreamDecoder {
    pub fn new() -> Self {
        Self {
            lines: Utf8LineBuffer::with_capacity(4096),
            pending_kind: None,
            done: false,
        }
    }

    /// Whether the sentinel has been seen
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Decode one chunk, returning every event completed by it
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<ProtocolEvent> {
        let mut events = Vec::new();
        if self.done {
            return events;
        }

        self.lines.extend(chunk);

        while let Some(line) = self.lines.next_line() {
            match self.parse_line(&line) {
                LineOutcome::Event(event) => events.push(event),
                LineOutcome::Done => {
                    self.done = true;
                    break;
                }
                LineOutcome::Nothing => {}
            }
        }

        events
    }

    /// End of input. A trailing line without newline was never completed
    /// and is discarded.
    pub fn finish(&mut self) {
        if !self.done && !self.lines.is_empty() {
            debug!(
                excerpt = %truncate_excerpt(&self.lines.remainder(), 80),
                "discarding unterminated trailing line"
            );
        }
        self.done = true;
    }

    fn parse_line(&mut self, line: &str) -> LineOutcome {
        if let Some(kind) = field_value(line, "event") {
            self.pending_kind = Some(kind.trim().to_string());
            return LineOutcome::Nothing;
        }

        let Some(data) = field_value(line, "data") else {
            // blank separators, comments and unknown fields
            return LineOutcome::Nothing;
        };

        let kind = self.pending_kind.take();

        if data == DONE_SENTINEL {
            return LineOutcome::Done;
        }

        match serde_json::from_str::<Value>(data) {
            Ok(payload) => LineOutcome::Event(ProtocolEvent { kind, payload }),
            Err(e) => {
                debug!(
                    error = %e,
                    excerpt = %truncate_excerpt(data, 80),
                    "dropping malformed data line"
                );
                LineOutcome::Nothing
            }
        }
    }
}

impl Default for EventStreamDecoder {
    fn default() -> Self {
        Self::new()
    }
}

/// `field:` or `field: ` prefix match, returning the value
fn field_value<'a>(line: &'a str, field: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(field)?.strip_prefix(':')?;
    Some(rest.strip_prefix(' ').unwrap_or(rest))
}

/// Pull-based iterator over already available chunks.
///
/// Lazy and single-pass: a chunk is only decoded once the events of the
/// previous one are consumed, and nothing after the sentinel is read.
pub struct EventIter<I> {
    chunks: I,
    decoder: EventStreamDecoder,
    ready: std::collections::VecDeque<ProtocolEvent>,
}

impl<I, B> EventIter<I>
where
    I: Iterator<Item = B>,
    B: AsRef<[u8]>,
{
    pub fn new(chunks: I) -> Self {
        Self {
            chunks,
            decoder: EventStreamDecoder::new(),
            ready: std::collections::VecDeque::new(),
        }
    }
}

impl<I, B> Iterator for EventIter<I>
where
    I: Iterator<Item = B>,
    B: AsRef<[u8]>,
{
    type Item = ProtocolEvent;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(event) = self.ready.pop_front() {
                return Some(event);
            }
            if self.decoder.is_done() {
                return None;
            }
            match self.chunks.next() {
                Some(chunk) => self.ready.extend(self.decoder.feed(chunk.as_ref())),
                None => self.decoder.finish(),
            }
        }
    }
}

/// Decode an async byte stream into protocol events.
///
/// Reading stops as soon as the sentinel is seen. A failed read is
/// yielded once as [`LlmError::Stream`] and ends the stream.
pub fn decode_event_stream<S, E>(byte_stream: S) -> EventStream
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    Box::pin(async_stream::stream! {
        let mut byte_chunks = Box::pin(byte_stream);
        let mut decoder = EventStreamDecoder::new();

        while let Some(chunk_result) = byte_chunks.next().await {
            match chunk_result {
                Ok(bytes) => {
                    for event in decoder.feed(&bytes) {
                        yield Ok(event);
                    }
                    if decoder.is_done() {
                        return;
                    }
                }
                Err(e) => {
                    yield Err(LlmError::Stream(e.to_string()));
                    return;
                }
            }
        }

        decoder.finish();
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_line_sets_kind_for_one_data_line() {
        let mut decoder = EventStreamDecoder::new();
        let events = decoder.feed(b"event: ping\ndata: {}\ndata: {\"a\":1}\n");

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind.as_deref(), Some("ping"));
        assert_eq!(events[1].kind, None);
        assert_eq!(events[1].payload, json!({"a": 1}));
    }

    #[test]
    fn test_space_after_colon_is_optional() {
        let mut decoder = EventStreamDecoder::new();
        let events = decoder.feed(b"event:ping\ndata:{\"x\":true}\n");

        assert_eq!(events[0].kind.as_deref(), Some("ping"));
        assert_eq!(events[0].payload, json!({"x": true}));
    }

    #[test]
    fn test_malformed_data_line_is_dropped_and_clears_kind() {
        let mut decoder = EventStreamDecoder::new();
        let events = decoder.feed(b"event: oops\ndata: {not json\ndata: {\"ok\":1}\n");

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, None);
        assert_eq!(events[0].payload, json!({"ok": 1}));
    }

    #[test]
    fn test_sentinel_stops_mid_chunk() {
        let mut decoder = EventStreamDecoder::new();
        let events = decoder.feed(b"data: {\"n\":1}\ndata: [DONE]\ndata: {\"n\":2}\n");

        assert_eq!(events.len(), 1);
        assert!(decoder.is_done());
        assert!(decoder.feed(b"data: {\"n\":3}\n").is_empty());
    }

    #[test]
    fn test_comments_and_blank_lines_ignored() {
        let mut decoder = EventStreamDecoder::new();
        let events = decoder.feed(b": keep-alive\n\nid: 7\ndata: 1\n\n");

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].payload, json!(1));
    }

    #[test]
    fn test_iter_discards_unterminated_tail() {
        let chunks = vec![b"data: {\"a\":1}\ndata: {\"b\":".to_vec(), b"2}".to_vec()];
        let events: Vec<_> = EventIter::new(chunks.into_iter()).collect();

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].payload, json!({"a": 1}));
    }

    #[test]
    fn test_iter_does_not_pull_past_sentinel() {
        let mut pulled = 0;
        let chunks = ["data: 1\n", "data: [DONE]\n", "data: 2\n", "data: 3\n"]
            .into_iter()
            .inspect(|_| pulled += 1);

        let events: Vec<_> = EventIter::new(chunks).collect();

        assert_eq!(events.len(), 1);
        assert_eq!(pulled, 2);
    }
}
