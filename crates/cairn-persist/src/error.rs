use thiserror::Error;

#[derive(Error, Debug)]
pub enum PersistError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid history: {0}")]
    InvalidHistory(#[from] cairn_llm::HistoryError),
}

pub type Result<T> = std::result::Result<T, PersistError>;
