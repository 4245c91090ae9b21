//! Request options and the parameter bundle handed to the native layer

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Error;
use crate::settings::{Settings, DEFAULT_TIMEOUT_SECS};

/// Query parameters as supplied by callers; values are coerced to text
pub type Query = BTreeMap<String, Value>;

/// Header map
pub type Headers = BTreeMap<String, String>;

/// Accept types derived for JSON responses
pub const JSON_ACCEPT_TYPES: [&str; 2] = ["text/json", "application/json"];

/// Accept types derived for text responses
pub const TEXT_ACCEPT_TYPES: [&str; 1] = ["text/plain"];

macro_rules! wire_enum_from_str {
    ($ty:ident, $what:literal, [$($variant:ident => $($name:literal)|+),+ $(,)?]) => {
        impl FromStr for $ty {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($($name)|+ => Ok($ty::$variant),)+
                    other => Err(Error::InvalidConfiguration(format!(
                        concat!("unknown ", $what, ": {}"),
                        other
                    ))),
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

/// HTTP method
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Method {
    /// GET
    #[default]
    #[serde(rename = "GET", alias = "get")]
    Get,
    /// POST
    #[serde(rename = "POST", alias = "post")]
    Post,
}

impl Method {
    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

wire_enum_from_str!(Method, "method", [Get => "GET" | "get", Post => "POST" | "post"]);

/// Encoding of the request body
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestBodyType {
    /// URL encoded form; the body must be an object
    #[default]
    Form,
    /// JSON document
    Json,
    /// Plain text; the body must be a string
    Text,
    /// Multipart form. Not supported, rejected at construction.
    Multipart,
}

impl RequestBodyType {
    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestBodyType::Form => "form",
            RequestBodyType::Json => "json",
            RequestBodyType::Text => "text",
            RequestBodyType::Multipart => "multipart",
        }
    }
}

wire_enum_from_str!(RequestBodyType, "request body type", [
    Form => "form",
    Json => "json",
    Text => "text",
    Multipart => "multipart",
]);

/// Expected encoding of the response body
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseBodyType {
    /// Plain text
    #[default]
    Text,
    /// JSON document
    Json,
    /// Binary. Not supported, rejected at construction.
    Blob,
}

impl ResponseBodyType {
    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseBodyType::Text => "text",
            ResponseBodyType::Json => "json",
            ResponseBodyType::Blob => "blob",
        }
    }

    /// Accept types sent when the caller does not choose any
    pub fn default_accept_types(&self) -> Option<Vec<String>> {
        let types: &[&str] = match self {
            ResponseBodyType::Json => &JSON_ACCEPT_TYPES,
            ResponseBodyType::Text => &TEXT_ACCEPT_TYPES,
            ResponseBodyType::Blob => return None,
        };
        Some(types.iter().map(|t| t.to_string()).collect())
    }
}

wire_enum_from_str!(ResponseBodyType, "response body type", [
    Text => "text",
    Json => "json",
    Blob => "blob",
]);

/// Cache behaviour of the native layer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CachePolicy {
    /// Platform default caching
    #[default]
    #[serde(rename = "default", alias = "useCache")]
    UseCache,
    /// Bypass the cache
    #[serde(rename = "noCache")]
    NoCache,
}

impl CachePolicy {
    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            CachePolicy::UseCache => "default",
            CachePolicy::NoCache => "noCache",
        }
    }
}

wire_enum_from_str!(CachePolicy, "cache policy", [
    UseCache => "default" | "useCache",
    NoCache => "noCache",
]);

/// Caller supplied options of a request. Unset fields take defaults.
///
/// Can be built with the setters or parsed from a JSON options object with
/// camelCase keys. Unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RequestOptions {
    /// HTTP method
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<Method>,
    /// Request headers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<Headers>,
    /// Query parameters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<Query>,
    /// Request body, shaped according to `request_body_type`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_body: Option<Value>,
    /// Request body encoding
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_body_type: Option<RequestBodyType>,
    /// Accept header values, in order
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accept_content_types: Option<Vec<String>>,
    /// Expected response encoding
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_body_type: Option<ResponseBodyType>,
    /// Timeout in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<f64>,
    /// Cache policy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_policy: Option<CachePolicy>,
}

impl RequestOptions {
    /// Options with every field unset
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON options object
    pub fn from_json(value: Value) -> Result<Self, Error> {
        serde_json::from_value(value).map_err(|e| Error::InvalidConfiguration(e.to_string()))
    }

    /// Set the method
    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    /// Add a header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .get_or_insert_with(Headers::new)
            .insert(key.into(), value.into());
        self
    }

    /// Replace the query
    pub fn query(mut self, query: Query) -> Self {
        self.query = Some(query);
        self
    }

    /// Add a query parameter
    pub fn query_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.query
            .get_or_insert_with(Query::new)
            .insert(key.into(), value.into());
        self
    }

    /// Set the request body
    pub fn body(mut self, body: impl Into<Value>) -> Self {
        self.request_body = Some(body.into());
        self
    }

    /// Serialize `body` as a JSON request body
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, Error> {
        self.request_body = Some(serde_json::to_value(body)?);
        self.request_body_type = Some(RequestBodyType::Json);
        Ok(self)
    }

    /// Set the request body encoding
    pub fn request_body_type(mut self, body_type: RequestBodyType) -> Self {
        self.request_body_type = Some(body_type);
        self
    }

    /// Set the accept types
    pub fn accept<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.accept_content_types = Some(types.into_iter().map(Into::into).collect());
        self
    }

    /// Set the expected response encoding
    pub fn response_body_type(mut self, body_type: ResponseBodyType) -> Self {
        self.response_body_type = Some(body_type);
        self
    }

    /// Set the timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout.as_secs_f64());
        self
    }

    /// Set the cache policy
    pub fn cache_policy(mut self, policy: CachePolicy) -> Self {
        self.cache_policy = Some(policy);
        self
    }
}

/// Render every non-null query value as text; null values are dropped.
///
/// Strings are kept verbatim, numbers and booleans use their usual textual
/// form, arrays and objects their compact JSON text.
pub fn coerce_query(query: Query) -> BTreeMap<String, String> {
    query
        .into_iter()
        .filter_map(|(key, value)| {
            let text = match value {
                Value::Null => return None,
                Value::String(s) => s,
                other => other.to_string(),
            };
            Some((key, text))
        })
        .collect()
}

/// Convert a timeout in seconds, rejecting values that are not positive or
/// do not fit a [`Duration`]
pub(crate) fn timeout_from_secs(timeout: f64) -> Result<Duration, Error> {
    match Duration::try_from_secs_f64(timeout) {
        Ok(duration) if !duration.is_zero() => Ok(duration),
        _ => Err(Error::InvalidConfiguration(format!(
            "timeout must be a positive number of seconds, got {timeout}"
        ))),
    }
}

/// Normalized parameters of one request, as sent to the native layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestParams {
    /// HTTP method
    pub method: Method,
    /// Request headers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<Headers>,
    /// Query with every value rendered as text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<BTreeMap<String, String>>,
    /// Request body
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_body: Option<Value>,
    /// Request body encoding
    pub request_body_type: RequestBodyType,
    /// Accept header values, in order
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accept_content_types: Option<Vec<String>>,
    /// Expected response encoding
    pub response_body_type: ResponseBodyType,
    /// Timeout in seconds
    pub timeout: f64,
    /// Cache policy
    pub cache_policy: CachePolicy,
}

impl Default for RequestParams {
    fn default() -> Self {
        Self {
            method: Method::Get,
            headers: None,
            query: None,
            request_body: None,
            request_body_type: RequestBodyType::Form,
            accept_content_types: ResponseBodyType::Text.default_accept_types(),
            response_body_type: ResponseBodyType::Text,
            timeout: DEFAULT_TIMEOUT_SECS,
            cache_policy: CachePolicy::UseCache,
        }
    }
}

impl RequestParams {
    /// Apply `settings` defaults to `options`, then validate the result
    pub fn from_options(options: RequestOptions, settings: &Settings) -> Result<Self, Error> {
        let RequestOptions {
            method,
            headers,
            query,
            request_body,
            request_body_type,
            accept_content_types,
            response_body_type,
            timeout,
            cache_policy,
        } = options;

        let request_body_type = request_body_type.unwrap_or(settings.request_body_type);
        let response_body_type = response_body_type.unwrap_or(settings.response_body_type);
        let timeout = timeout.unwrap_or(settings.timeout);

        timeout_from_secs(timeout)?;

        if request_body_type == RequestBodyType::Multipart {
            return Err(Error::InvalidConfiguration(
                "multipart request bodies are not supported".to_string(),
            ));
        }

        if response_body_type == ResponseBodyType::Blob {
            return Err(Error::InvalidConfiguration(
                "blob response bodies are not supported".to_string(),
            ));
        }

        match (&request_body, request_body_type) {
            (Some(Value::Object(_)), RequestBodyType::Form)
            | (Some(Value::String(_)), RequestBodyType::Text)
            | (Some(_), RequestBodyType::Json)
            | (None, _) => {}
            (Some(_), body_type) => {
                return Err(Error::InvalidConfiguration(format!(
                    "request body does not match body type {body_type}"
                )))
            }
        }

        let headers = match (settings.headers.is_empty(), headers) {
            (true, headers) => headers,
            (false, headers) => {
                let mut merged = settings.headers.clone();
                merged.extend(headers.unwrap_or_default());
                Some(merged)
            }
        };

        let accept_content_types =
            accept_content_types.or_else(|| response_body_type.default_accept_types());

        Ok(Self {
            method: method.unwrap_or_default(),
            headers,
            query: query.map(coerce_query),
            request_body,
            request_body_type,
            accept_content_types,
            response_body_type,
            timeout,
            cache_policy: cache_policy.unwrap_or(settings.cache_policy),
        })
    }

    /// Timeout as a duration
    pub fn timeout_duration(&self) -> Result<Duration, Error> {
        timeout_from_secs(self.timeout)
    }
}
