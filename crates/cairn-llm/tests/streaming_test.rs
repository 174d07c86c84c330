use bytes::Bytes;
use cairn_llm::{decode_event_stream, EventIter, LlmError, ProtocolEvent};
use futures::StreamExt;
use serde_json::json;

const WELL_FORMED: &str = concat!(
    "event: message_start\n",
    "data: {\"type\":\"message_start\",\"message\":{\"id\":\"m1\"}}\n",
    "\n",
    "event: content_block_start\n",
    "data: {\"type\":\"content_block_start\",\"index\":0,\"content_block\":{\"type\":\"text\",\"text\":\"\"}}\n",
    "\n",
    "event: content_block_delta\n",
    "data: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"Grüße → 世界\"}}\n",
    "\n",
    "data: {\"type\":\"ping\"}\n",
    "event: content_block_stop\r\n",
    "data: {\"type\":\"content_block_stop\",\"index\":0}\r\n",
    "\r\n",
    "event: message_stop\n",
    "data: {\"type\":\"message_stop\"}\n",
    "\n",
);

fn decode_in_chunks(bytes: &[u8], splits: &[usize]) -> Vec<ProtocolEvent> {
    let mut chunks = Vec::new();
    let mut start = 0;
    for &split in splits {
        chunks.push(&bytes[start..split]);
        start = split;
    }
    chunks.push(&bytes[start..]);
    EventIter::new(chunks.into_iter()).collect()
}

#[test]
fn test_every_single_split_yields_identical_events() {
    let bytes = WELL_FORMED.as_bytes();
    let expected = decode_in_chunks(bytes, &[]);
    assert_eq!(expected.len(), 6);

    for split in 0..=bytes.len() {
        assert_eq!(decode_in_chunks(bytes, &[split]), expected, "split at {split}");
    }
}

#[test]
fn test_every_double_split_yields_identical_events() {
    let bytes = WELL_FORMED.as_bytes();
    let expected = decode_in_chunks(bytes, &[]);

    for first in (0..bytes.len()).step_by(7) {
        for second in first..=bytes.len() {
            assert_eq!(
                decode_in_chunks(bytes, &[first, second]),
                expected,
                "splits at {first},{second}"
            );
        }
    }
}

#[test]
fn test_byte_at_a_time_decoding() {
    let bytes = WELL_FORMED.as_bytes();
    let expected = decode_in_chunks(bytes, &[]);
    let events: Vec<_> = EventIter::new(bytes.chunks(1)).collect();

    assert_eq!(events, expected);
    assert_eq!(events[2].payload["delta"]["text"], json!("Grüße → 世界"));
}

#[test]
fn test_kind_is_attached_and_cleared() {
    let events = decode_in_chunks(WELL_FORMED.as_bytes(), &[]);

    assert_eq!(events[0].kind.as_deref(), Some("message_start"));
    // the ping data line has no event line of its own
    assert_eq!(events[3].kind, None);
    assert_eq!(events[3].event_kind(), Some("ping"));
    assert_eq!(events[4].kind.as_deref(), Some("content_block_stop"));
}

#[tokio::test]
async fn test_async_decoder_stops_at_sentinel_without_further_reads() {
    let chunks: Vec<Result<Bytes, LlmError>> = vec![
        Ok(Bytes::from_static(b"data: {\"n\":1}\ndata: [DO")),
        Ok(Bytes::from_static(b"NE]\ndata: {\"n\":2}\n")),
    ];
    // a read after the sentinel would fail the stream
    let poisoned = futures::stream::once(async {
        Err::<Bytes, LlmError>(LlmError::Stream("read past sentinel".to_string()))
    });

    let stream = decode_event_stream(futures::stream::iter(chunks).chain(poisoned));
    let events: Vec<_> = stream.collect().await;

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].as_ref().unwrap().payload, json!({"n": 1}));
}

#[tokio::test]
async fn test_async_decoder_propagates_read_failure() {
    let chunks: Vec<Result<Bytes, LlmError>> = vec![
        Ok(Bytes::from_static(b"data: {\"n\":1}\n")),
        Err(LlmError::Stream("connection reset".to_string())),
        Ok(Bytes::from_static(b"data: {\"n\":2}\n")),
    ];

    let events: Vec<_> = decode_event_stream(futures::stream::iter(chunks)).collect().await;

    assert_eq!(events.len(), 2);
    assert!(events[0].is_ok());
    assert!(matches!(events[1], Err(LlmError::Stream(ref msg)) if msg.contains("connection reset")));
}
