/// Error types for loading and validating study content.
///
/// Lookups never fail with an error: a missing chapter or card is `None`.
/// These variants cover the authoring boundary only (reading and checking
/// chapter records), and the board binary wraps them via `#[from]`.

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("content json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid content: {0}")]
    InvalidContent(String),
}
