//! Completion events delivered by the native networking layer

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Opaque identifier handed out by the native layer for one in-flight request.
///
/// Native modules use either strings or integers; both are kept in their
/// textual form so `7` and `"7"` name the same request.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Token(String);

impl Token {
    /// Token as text
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Token {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Token {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<u64> for Token {
    fn from(n: u64) -> Self {
        Self(n.to_string())
    }
}

impl From<i64> for Token {
    fn from(n: i64) -> Self {
        Self(n.to_string())
    }
}

impl<'de> Deserialize<'de> for Token {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawToken {
            Text(String),
            Signed(i64),
            Unsigned(u64),
        }

        Ok(match RawToken::deserialize(deserializer)? {
            RawToken::Text(s) => Token(s),
            RawToken::Signed(n) => Token(n.to_string()),
            RawToken::Unsigned(n) => Token(n.to_string()),
        })
    }
}

/// Error object attached to a native response, in the platform's own vocabulary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeError {
    /// Error domain or exception type, e.g. `NSURLErrorDomain` or `IOException`
    #[serde(rename = "type")]
    pub error_type: String,
    /// Platform error code
    #[serde(default)]
    pub code: i64,
    /// Platform error message
    #[serde(default)]
    pub message: String,
}

impl NativeError {
    /// Create a new native error
    pub fn new(error_type: impl Into<String>, code: i64, message: impl Into<String>) -> Self {
        Self {
            error_type: error_type.into(),
            code,
            message: message.into(),
        }
    }
}

/// Response part of a native event.
///
/// Besides `data` and `error` the native layer may attach arbitrary fields
/// (status code, headers, ...); they are kept in `fields`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NativeResponse {
    /// Raw payload. Some platforms deliver it as a JSON string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Error object, present on failures
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<NativeError>,
    /// Every other field of the response
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl NativeResponse {
    /// Response carrying a payload
    pub fn with_data(data: Value) -> Self {
        Self {
            data: Some(data),
            ..Default::default()
        }
    }

    /// Response carrying an error
    pub fn with_error(error: NativeError) -> Self {
        Self {
            error: Some(error),
            ..Default::default()
        }
    }

    /// Attach an extra response field
    pub fn field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Whether the payload counts as present.
    ///
    /// A missing payload, JSON `null` and the empty string all count as absent.
    pub fn has_payload(&self) -> bool {
        match &self.data {
            None | Some(Value::Null) => false,
            Some(Value::String(s)) => !s.is_empty(),
            Some(_) => true,
        }
    }
}

/// Event emitted by the native layer when a request completes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NativeEvent {
    /// Token of the request this event belongs to
    pub token: Token,
    /// Response or error
    pub response: NativeResponse,
}

impl NativeEvent {
    /// Create a new event
    pub fn new(token: impl Into<Token>, response: NativeResponse) -> Self {
        Self {
            token: token.into(),
            response,
        }
    }

    /// Success event carrying `data`
    pub fn success(token: impl Into<Token>, data: Value) -> Self {
        Self::new(token, NativeResponse::with_data(data))
    }

    /// Error event carrying `error`
    pub fn failure(token: impl Into<Token>, error: NativeError) -> Self {
        Self::new(token, NativeResponse::with_error(error))
    }
}
