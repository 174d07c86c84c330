pub mod error;
pub mod file;
pub mod memory;
pub mod models;
pub mod store;

pub use error::{PersistError, Result};
pub use file::FileSessionStore;
pub use memory::MemorySessionStore;
pub use models::SessionSnapshot;
pub use store::SessionStore;
