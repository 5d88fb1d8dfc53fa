//! Error types for the subscriber store.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} is already subscribed")]
    Duplicate(String),

    #[error("Subscriber store at {path} holds malformed data")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("IO error while accessing the subscriber store")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize the subscriber collection")]
    Serialization(#[source] serde_json::Error),

    #[error("The store writer is no longer running")]
    WriterClosed,
}
