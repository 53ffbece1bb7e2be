use std::path::PathBuf;

/// Transport-level failures. `Clone` so one failure can be handed to every
/// caller waiting on a dead proxy.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProxyError {
    #[error("no proxy registered for service '{0}'")]
    ProxyNotFound(String),
    #[error("proxy stream closed")]
    StreamClosed,
    #[error("malformed frame: {0}")]
    MalformedFrame(String),
    #[error("call {id} timed out after {timeout_ms}ms")]
    CallTimedOut { id: u64, timeout_ms: u64 },
    #[error("malformed service call: {0}")]
    MalformedCall(String),
    #[error("invalid registration: {0}")]
    Registration(String),
    #[error("service handler failed: {0}")]
    Handler(String),
    #[error("failed to launch {}: {message}", path.display())]
    Launch { path: PathBuf, message: String },
    #[error("io error: {0}")]
    Io(String),
}

impl From<std::io::Error> for ProxyError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}
