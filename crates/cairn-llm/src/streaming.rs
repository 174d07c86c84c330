use std::pin::Pin;

use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::error::{LlmError, Result};

/// One logical record of the event-tagged stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtocolEvent {
    /// Value of the preceding `event:` line, if any
    pub kind: Option<String>,

    pub payload: Value,
}

impl ProtocolEvent {
    pub fn new(kind: Option<&str>, payload: Value) -> Self {
        Self {
            kind: kind.map(str::to_string),
            payload,
        }
    }

    /// Event kind, falling back to the payload's `type` field for
    /// transports that do not send `event:` lines
    pub fn event_kind(&self) -> Option<&str> {
        self.kind
            .as_deref()
            .or_else(|| self.payload.get("type").and_then(Value::as_str))
    }
}

/// Lazy, single-pass sequence of decoded events
pub type EventStream = Pin<Box<dyn Stream<Item = Result<ProtocolEvent>> + Send>>;

/// Abort `stream` when `token` fires.
///
/// The inner stream (and with it the underlying transfer) is dropped on
/// cancellation and a single [`LlmError::Cancelled`] is yielded.
pub fn with_cancellation(stream: EventStream, token: CancellationToken) -> EventStream {
    Box::pin(async_stream::stream! {
        let mut inner = stream;

        loop {
            let next = tokio::select! {
                biased;

                _ = token.cancelled() => None,
                item = inner.next() => Some(item),
            };

            match next {
                Some(Some(item)) => yield item,
                Some(None) => return,
                None => {
                    drop(inner);
                    yield Err(LlmError::Cancelled);
                    return;
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kind_falls_back_to_payload_type() {
        let event = ProtocolEvent::new(None, json!({"type": "message_stop"}));
        assert_eq!(event.event_kind(), Some("message_stop"));

        let event = ProtocolEvent::new(Some("ping"), json!({"type": "other"}));
        assert_eq!(event.event_kind(), Some("ping"));
    }

    #[tokio::test]
    async fn test_cancellation_ends_pending_stream() {
        let token = CancellationToken::new();
        let first = futures::stream::iter(vec![Ok::<_, LlmError>(ProtocolEvent::new(None, json!(1)))]);
        let never = futures::stream::pending();
        let inner: EventStream = Box::pin(first.chain(never));

        let mut stream = with_cancellation(inner, token.clone());

        assert!(stream.next().await.unwrap().is_ok());
        token.cancel();
        assert!(stream.next().await.unwrap().unwrap_err().is_cancelled());
        assert!(stream.next().await.is_none());
    }
}
