//! Datagram framing: one newline-terminated UTF-8 JSON document per datagram.

use serde_json::Value;

pub const DELIMITER: u8 = b'\n';

/// Serialize an envelope into its on-wire form.
pub fn encode(envelope: &Value) -> Option<Vec<u8>> {
    let mut payload = serde_json::to_vec(envelope).ok()?;
    payload.push(DELIMITER);
    Some(payload)
}

/// Parse a received datagram; trailing delimiter and whitespace are accepted.
///
/// Anything that is not exactly one JSON document yields `None`.
pub fn decode(datagram: &[u8]) -> Option<Value> {
    serde_json::from_slice(datagram).ok()
}
