/// Errors that can occur in the storage layer.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Reading or writing the backing file failed.
    #[error("storage i/o failed: {0}")]
    Io(#[source] std::io::Error),

    /// A value could not be serialized before storing.
    #[error("encode failed: {0}")]
    Encode(#[source] serde_json::Error),

    /// A stored value could not be parsed back into the requested type.
    #[error("decode failed for key {key}: {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// The backend can no longer be used (e.g. a poisoned lock).
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}
