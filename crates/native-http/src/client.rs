//! Convenience entry points

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::bridge::Bridge;
use crate::error::Error;
use crate::params::{Method, Query, RequestOptions, ResponseBodyType};
use crate::request::{PendingRequest, Request};
use crate::settings::Settings;

/// HTTP client over a native bridge
#[derive(Debug, Clone)]
pub struct HttpClient {
    bridge: Arc<Bridge>,
    settings: Settings,
}

impl HttpClient {
    /// Create a client with default settings
    pub fn new(bridge: Arc<Bridge>) -> Self {
        Self::with_settings(bridge, Settings::default())
    }

    /// Create a client whose requests start from `settings`
    pub fn with_settings(bridge: Arc<Bridge>, settings: Settings) -> Self {
        Self { bridge, settings }
    }

    /// Bridge requests are sent over
    pub fn bridge(&self) -> &Arc<Bridge> {
        &self.bridge
    }

    /// Client wide defaults
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Send a request described by `options`
    pub fn request(&self, url: &str, options: RequestOptions) -> Result<PendingRequest, Error> {
        Ok(Request::with_settings(self.bridge.clone(), url, options, &self.settings)?.send())
    }

    /// Send a GET request. `query` replaces any query set in `options`.
    pub fn get(
        &self,
        url: &str,
        query: Option<Query>,
        options: RequestOptions,
    ) -> Result<PendingRequest, Error> {
        self.request(
            url,
            RequestOptions {
                method: Some(Method::Get),
                query,
                ..options
            },
        )
    }

    /// Send a POST request. `body` and `query` replace those set in `options`.
    pub fn post(
        &self,
        url: &str,
        body: Option<Value>,
        query: Option<Query>,
        options: RequestOptions,
    ) -> Result<PendingRequest, Error> {
        self.request(
            url,
            RequestOptions {
                method: Some(Method::Post),
                request_body: body,
                query,
                ..options
            },
        )
    }

    /// GET `url` and deserialize the JSON payload into `R`
    pub async fn fetch<R>(&self, url: &str) -> Result<R, Error>
    where
        R: DeserializeOwned,
    {
        let options = RequestOptions::new().response_body_type(ResponseBodyType::Json);
        let response = self.get(url, None, options)?.await?;
        response.json()
    }
}

/// Send a request described by `options` through `client`
pub fn request(
    client: &HttpClient,
    url: &str,
    options: RequestOptions,
) -> Result<PendingRequest, Error> {
    client.request(url, options)
}

/// Send a GET request through `client`
pub fn get(
    client: &HttpClient,
    url: &str,
    query: Option<Query>,
    options: RequestOptions,
) -> Result<PendingRequest, Error> {
    client.get(url, query, options)
}

/// Send a POST request through `client`
pub fn post(
    client: &HttpClient,
    url: &str,
    body: Option<Value>,
    query: Option<Query>,
    options: RequestOptions,
) -> Result<PendingRequest, Error> {
    client.post(url, body, query, options)
}
