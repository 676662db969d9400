use thiserror::Error;

/// Error types that can occur when talking to the agent backend.
#[derive(Debug, Error)]
pub enum ChatError {
    /// Network-level failure: DNS, connect, timeout, or a broken stream.
    #[error("transport error: {0}")]
    Transport(String),
    /// A non-streaming response body could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),
    /// The backend answered with a non-success status.
    #[error("server error (status {status}): {message}")]
    Server { status: u16, message: String },
    /// The operation was invoked in a state it cannot run in.
    #[error("precondition failed: {0}")]
    Precondition(String),
    /// The in-flight stream was cancelled by the caller.
    #[error("stream cancelled")]
    Cancelled,
    /// Local persistence failed; always handled best-effort by callers.
    #[error("storage error: {0}")]
    Storage(String),
}

impl From<reqwest::Error> for ChatError {
    fn from(err: reqwest::Error) -> Self {
        ChatError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for ChatError {
    fn from(err: serde_json::Error) -> Self {
        ChatError::Decode(format!(
            "{} at line {} column {}",
            err,
            err.line(),
            err.column()
        ))
    }
}
