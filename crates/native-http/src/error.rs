//! Error types
//!
//! [`HttpError`] is what a failed request resolves with: a portable
//! [`ErrorKind`] plus the native error it was translated from. [`Error`]
//! covers everything that goes wrong before a request reaches the native
//! layer.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::event::NativeError;

/// Key under which the original native error is kept in [`HttpError::user_info`]
pub const NATIVE_ERROR_KEY: &str = "nativeError";

/// Platform independent failure category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// The request was canceled
    #[serde(rename = "http.cancelled")]
    Canceled,
    /// The device is offline
    #[serde(rename = "http.notConnectedToInternet")]
    NotConnectedToInternet,
    /// The request timed out
    #[serde(rename = "http.timedOut")]
    TimedOut,
    /// TLS handshake or certificate validation failed
    #[serde(rename = "http.serverCertificateUntrusted")]
    ServerCertificateUntrusted,
    /// Any other transport failure
    #[serde(rename = "http.requestFailed")]
    RequestFailed,
    /// The response body could not be decoded
    #[serde(rename = "http.parseResponseFailed")]
    ParseResponseFailed,
    /// The native error could not be classified
    #[serde(rename = "http.unknown")]
    Unknown,
}

impl ErrorKind {
    /// All kinds
    pub const ALL: [ErrorKind; 7] = [
        ErrorKind::Canceled,
        ErrorKind::NotConnectedToInternet,
        ErrorKind::TimedOut,
        ErrorKind::ServerCertificateUntrusted,
        ErrorKind::RequestFailed,
        ErrorKind::ParseResponseFailed,
        ErrorKind::Unknown,
    ];

    /// Stable string code of the kind
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Canceled => "http.cancelled",
            ErrorKind::NotConnectedToInternet => "http.notConnectedToInternet",
            ErrorKind::TimedOut => "http.timedOut",
            ErrorKind::ServerCertificateUntrusted => "http.serverCertificateUntrusted",
            ErrorKind::RequestFailed => "http.requestFailed",
            ErrorKind::ParseResponseFailed => "http.parseResponseFailed",
            ErrorKind::Unknown => "http.unknown",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ErrorKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ErrorKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| Error::InvalidConfiguration(format!("unknown error kind: {s}")))
    }
}

/// Failure of a request, normalized across platforms
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[error("{kind}: {message}")]
#[serde(rename_all = "camelCase")]
pub struct HttpError {
    /// Portable category
    pub kind: ErrorKind,
    /// Numeric code. Always 0; the native code lives in `user_info.nativeError`.
    pub code: i64,
    /// Native message, unmodified
    pub message: String,
    /// Response fields other than the error, plus `nativeError`
    pub user_info: Map<String, Value>,
}

impl HttpError {
    /// Create an error without extra information
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            code: 0,
            message: message.into(),
            user_info: Map::new(),
        }
    }

    /// Attach response fields
    pub fn with_user_info(mut self, user_info: Map<String, Value>) -> Self {
        self.user_info = user_info;
        self
    }

    /// Whether the request ended because it was canceled
    pub fn is_canceled(&self) -> bool {
        self.kind == ErrorKind::Canceled
    }

    /// The native error this error was translated from, if any
    pub fn native_error(&self) -> Option<NativeError> {
        self.user_info
            .get(NATIVE_ERROR_KEY)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }
}

/// Errors raised while preparing requests or loading settings
#[derive(Debug, Error)]
pub enum Error {
    /// Request options or settings are not usable
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
    /// Settings could not be loaded
    #[error(transparent)]
    Config(#[from] config::ConfigError),
    /// JSON (de)serialization error
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    /// Request failed
    #[error(transparent)]
    Http(#[from] HttpError),
}
