pub mod types;
pub mod traits;
pub mod streaming;
pub mod buffer_utils;
pub mod messages;
pub mod config;
pub mod error;
pub mod history;

pub use traits::{ModelClient, ModelRequest};

pub use streaming::{with_cancellation, EventStream, ProtocolEvent};
pub use buffer_utils::{decode_event_stream, EventIter, EventStreamDecoder, Utf8LineBuffer};
pub use messages::MessagesClient;
pub use config::{ModelConfig, ProviderConfig};
pub use error::{LlmError, Result};
pub use history::{validate_history, HistoryError};
pub use types::{ContentBlock, Role, ToolDescriptor, ToolInvocation, ToolResult, Turn, TurnContent};
