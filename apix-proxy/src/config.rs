use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_CALL_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_MAX_FRAME_LEN: usize = 16 * 1024 * 1024;
pub const DEFAULT_PROXY_SUFFIX: &str = "-proxy";

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Per-call deadline for synchronous calls. `0` waits forever.
    pub call_timeout_ms: u64,
    /// Frames announcing a longer body are treated as malformed.
    pub max_frame_len: usize,
    /// Directory scanned for backend executables.
    pub proxy_dir: PathBuf,
    /// File name suffix identifying backend executables.
    pub proxy_suffix: String,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            call_timeout_ms: DEFAULT_CALL_TIMEOUT_MS,
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
            proxy_dir: PathBuf::from("."),
            proxy_suffix: DEFAULT_PROXY_SUFFIX.to_string(),
        }
    }
}

impl ProxyConfig {
    pub fn call_timeout(&self) -> Option<Duration> {
        (self.call_timeout_ms > 0).then(|| Duration::from_millis(self.call_timeout_ms))
    }

    /// The suffix with the platform executable extension appended.
    pub fn executable_suffix(&self) -> String {
        if cfg!(windows) {
            format!("{}.exe", self.proxy_suffix)
        } else {
            self.proxy_suffix.clone()
        }
    }
}
