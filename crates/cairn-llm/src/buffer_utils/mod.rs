mod buffering;
mod sse_parser;

pub use buffering::Utf8LineBuffer;
pub use sse_parser::{decode_event_stream, EventIter, EventStreamDecoder, DONE_SENTINEL};
