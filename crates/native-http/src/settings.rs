//! Client wide defaults
//!
//! Settings are layered: built-in defaults, then an optional TOML file, then
//! environment variables.

use std::env;
use std::path::Path;

use config::{Config, File};
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::params::{
    timeout_from_secs, CachePolicy, Headers, RequestBodyType, ResponseBodyType,
};

/// Timeout applied when neither the request nor the settings choose one
pub const DEFAULT_TIMEOUT_SECS: f64 = 30.0;

/// Overrides [`Settings::timeout`], in seconds
pub const ENV_TIMEOUT: &str = "NATIVE_HTTP_TIMEOUT";
/// Overrides [`Settings::cache_policy`]
pub const ENV_CACHE_POLICY: &str = "NATIVE_HTTP_CACHE_POLICY";
/// Overrides [`Settings::request_body_type`]
pub const ENV_REQUEST_BODY_TYPE: &str = "NATIVE_HTTP_REQUEST_BODY_TYPE";
/// Overrides [`Settings::response_body_type`]
pub const ENV_RESPONSE_BODY_TYPE: &str = "NATIVE_HTTP_RESPONSE_BODY_TYPE";

/// Defaults applied to every request of a client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Timeout in seconds
    pub timeout: f64,
    /// Cache policy
    pub cache_policy: CachePolicy,
    /// Request body encoding
    pub request_body_type: RequestBodyType,
    /// Expected response encoding
    pub response_body_type: ResponseBodyType,
    /// Headers sent with every request; per-request headers take precedence
    pub headers: Headers,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT_SECS,
            cache_policy: CachePolicy::default(),
            request_body_type: RequestBodyType::default(),
            response_body_type: ResponseBodyType::default(),
            headers: Headers::new(),
        }
    }
}

impl Settings {
    /// Load settings from the defaults, `config_file` when given, and the environment
    pub fn load<P>(config_file: Option<P>) -> Result<Self, Error>
    where
        P: AsRef<Path>,
    {
        let mut builder = Config::builder().add_source(Config::try_from(&Settings::default())?);

        if let Some(path) = config_file {
            builder = builder.add_source(File::from(path.as_ref()).required(true));
        }

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.from_env().validate()
    }

    /// Apply environment overrides. Unparsable values are ignored.
    pub fn from_env(mut self) -> Self {
        if let Ok(timeout) = env::var(ENV_TIMEOUT) {
            if let Ok(timeout) = timeout.trim().parse() {
                self.timeout = timeout;
            }
        }

        if let Ok(policy) = env::var(ENV_CACHE_POLICY) {
            if let Ok(policy) = policy.trim().parse() {
                self.cache_policy = policy;
            }
        }

        if let Ok(body_type) = env::var(ENV_REQUEST_BODY_TYPE) {
            if let Ok(body_type) = body_type.trim().parse() {
                self.request_body_type = body_type;
            }
        }

        if let Ok(body_type) = env::var(ENV_RESPONSE_BODY_TYPE) {
            if let Ok(body_type) = body_type.trim().parse() {
                self.response_body_type = body_type;
            }
        }

        self
    }

    /// Reject settings no request could be built from
    pub fn validate(self) -> Result<Self, Error> {
        if timeout_from_secs(self.timeout).is_err() {
            return Err(Error::InvalidConfiguration(format!(
                "default timeout must be a positive number of seconds, got {}",
                self.timeout
            )));
        }
        if self.request_body_type == RequestBodyType::Multipart {
            return Err(Error::InvalidConfiguration(
                "multipart cannot be the default request body type".to_string(),
            ));
        }
        if self.response_body_type == ResponseBodyType::Blob {
            return Err(Error::InvalidConfiguration(
                "blob cannot be the default response body type".to_string(),
            ));
        }
        Ok(self)
    }
}
