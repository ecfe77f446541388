//! JSON payload decoding for the OneAPI wire format.
//!
//! Every payload wraps its content in a single named root element, e.g.
//! `{"deliveryInfoNotification": {...}}`. The codec unwraps the root and
//! deserializes the inner value into the typed model.

use serde::de::DeserializeOwned;
use serde_json::Value;

/// Errors produced while decoding a payload.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("missing root element `{root}` in payload")]
    MissingRoot { root: &'static str },
}

/// Decode a payload whose content sits under the named `root` element.
pub fn decode_root<T: DeserializeOwned>(payload: &[u8], root: &'static str) -> Result<T, DecodeError> {
    let mut value: Value = serde_json::from_slice(payload)?;
    let inner = value
        .get_mut(root)
        .map(Value::take)
        .ok_or(DecodeError::MissingRoot { root })?;
    Ok(serde_json::from_value(inner)?)
}
