pub mod content;
pub mod tool;
pub mod turn;

pub use content::{ContentBlock, ToolInvocation, ToolResult};
pub use tool::ToolDescriptor;
pub use turn::{Role, Turn, TurnContent};
