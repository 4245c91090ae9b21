//! Successful response

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Error;

/// Response of a completed request.
///
/// `data` holds the decoded payload; every other field the native layer
/// reported (status code, headers, ...) is available through [`Response::field`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    data: Value,
    #[serde(flatten)]
    fields: Map<String, Value>,
}

impl Response {
    /// Create a response
    pub fn new(data: Value, fields: Map<String, Value>) -> Self {
        Self { data, fields }
    }

    /// Decoded payload
    pub fn data(&self) -> &Value {
        &self.data
    }

    /// Take the decoded payload
    pub fn into_data(self) -> Value {
        self.data
    }

    /// Deserialize the payload into `T`
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, Error> {
        serde_json::from_value(self.data.clone()).map_err(Error::from)
    }

    /// Payload as text, when it is a string
    pub fn text(&self) -> Option<&str> {
        self.data.as_str()
    }

    /// Other response field reported by the native layer
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// All other response fields
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }
}
