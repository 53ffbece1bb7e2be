use std::sync::OnceLock;

use serde_json::Value as JsonValue;

use super::ForwardError;

/// Outcome of one executed node, cached for the rest of the request.
#[derive(Debug)]
pub struct ForwardResult {
    pub error: Option<ForwardError>,
    pub bytes: Vec<u8>,
    decoded: OnceLock<Option<JsonValue>>,
}

impl ForwardResult {
    pub fn ok(bytes: Vec<u8>) -> Self {
        Self {
            error: None,
            bytes,
            decoded: OnceLock::new(),
        }
    }

    pub fn failed(error: ForwardError) -> Self {
        Self {
            error: Some(error),
            bytes: Vec::new(),
            decoded: OnceLock::new(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// The body decoded as JSON, parsed on first use. `None` when the body is
    /// not JSON.
    pub fn json(&self) -> Option<&JsonValue> {
        self.decoded
            .get_or_init(|| serde_json::from_slice(&self.bytes).ok())
            .as_ref()
    }

    /// A top-level field of the decoded body.
    pub fn field(&self, name: &str) -> Option<&JsonValue> {
        self.json()?.as_object()?.get(name)
    }

    pub fn to_result(&self) -> Result<Vec<u8>, ForwardError> {
        match &self.error {
            Some(e) => Err(e.clone()),
            None => Ok(self.bytes.clone()),
        }
    }
}
