use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The latest token material as returned by the authorization server, plus
/// the locally stamped `issued_at`.
///
/// The record wraps the raw JSON object so pass-through fields owned by the
/// server (`expires_in`, `token_type`, scope, anything future) survive a
/// round trip untouched. Only `access_token`, `refresh_token` and
/// `issued_at` have meaning to this daemon.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenRecord {
    fields: Map<String, Value>,
}

impl TokenRecord {
    pub fn from_fields(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    pub fn access_token(&self) -> Option<&str> {
        self.fields.get("access_token").and_then(Value::as_str)
    }

    /// The rotating credential for the next exchange, if the record carries
    /// a non-empty one.
    pub fn refresh_token(&self) -> Option<&str> {
        self.fields
            .get("refresh_token")
            .and_then(Value::as_str)
            .filter(|token| !token.is_empty())
    }

    pub fn issued_at(&self) -> Option<&str> {
        self.fields.get("issued_at").and_then(Value::as_str)
    }

    /// Stamps (or overwrites) the moment the exchange response was accepted.
    pub fn set_issued_at(&mut self, stamp: String) {
        self.fields
            .insert("issued_at".to_owned(), Value::String(stamp));
    }

    /// Pretty-printed serialization; the file is meant to be readable by
    /// humans, not just consumers.
    pub fn to_pretty_json(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec_pretty(&self.fields)
    }
}
