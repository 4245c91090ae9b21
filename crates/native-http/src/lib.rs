//! Cancelable HTTP requests over native networking bridges
//!
//! Mobile hosts already ship an HTTP stack: `NSURLSession` on iOS, OkHttp on
//! Android. This crate drives them through a small [`NativeNetworking`]
//! capability, correlates their `onSuccess`/`onError` completion events with
//! the request that caused them, and translates each platform's error codes
//! into one portable [`ErrorKind`].
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use native_http::{Bridge, EventEmitter, HttpClient, NativeNetworking, RequestOptions};
//!
//! async fn example(networking: Arc<dyn NativeNetworking>, events: EventEmitter) {
//!     let client = HttpClient::new(Arc::new(Bridge::new(networking, events)));
//!
//!     let pending = client
//!         .get("https://api.example.com/items", None, RequestOptions::new())
//!         .expect("valid request");
//!
//!     match pending.result.await {
//!         Ok(response) => println!("{}", response.data()),
//!         Err(error) if error.is_canceled() => println!("canceled"),
//!         Err(error) => println!("failed: {error}"),
//!     }
//! }
//! ```

mod bridge;
mod client;
mod emitter;
mod error;
mod event;
mod params;
mod platform;
mod request;
mod response;
mod settings;
mod translate;

pub use bridge::{Bridge, NativeNetworking, TokenCallback};
pub use client::{get, post, request, HttpClient};
pub use emitter::{EventEmitter, EventName, Subscription};
pub use error::{Error, ErrorKind, HttpError, NATIVE_ERROR_KEY};
pub use event::{NativeError, NativeEvent, NativeResponse, Token};
pub use params::{
    coerce_query, CachePolicy, Headers, Method, Query, RequestBodyType, RequestOptions,
    RequestParams, ResponseBodyType,
};
pub use platform::Platform;
pub use request::{CancelHandle, PendingRequest, Request, RequestResult, ResponseFuture};
pub use response::Response;
pub use settings::{
    Settings, DEFAULT_TIMEOUT_SECS, ENV_CACHE_POLICY, ENV_REQUEST_BODY_TYPE,
    ENV_RESPONSE_BODY_TYPE, ENV_TIMEOUT,
};
pub use translate::{
    cancellation_code, translate, translate_response, ANDROID_IO_EXCEPTION,
    EMPTY_PAYLOAD_MESSAGE, IOS_RESPONSE_SERIALIZATION, IOS_URL_ERROR_DOMAIN,
};
