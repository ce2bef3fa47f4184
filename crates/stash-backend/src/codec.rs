use serde_json::Value;

use crate::error::{BackendError, BackendResult};

/// Converts registered values to and from the strings a backend stores.
pub trait Codec: Send + Sync {
    /// Encode a value into its stored form.
    fn encode(&self, value: &Value) -> BackendResult<String>;

    /// Decode a stored snapshot.
    fn decode(&self, stored: &str) -> BackendResult<Value>;
}

/// Compact JSON codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode(&self, value: &Value) -> BackendResult<String> {
        serde_json::to_string(value).map_err(|e| BackendError::Codec(e.to_string()))
    }

    fn decode(&self, stored: &str) -> BackendResult<Value> {
        serde_json::from_str(stored).map_err(|e| BackendError::Codec(e.to_string()))
    }
}
