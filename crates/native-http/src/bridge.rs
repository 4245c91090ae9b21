//! Adapter over the host's native networking module

use std::fmt;
use std::sync::Arc;

use native_http_log::log_debug;

use crate::emitter::{EventEmitter, EventName, Subscription};
use crate::event::{NativeEvent, Token};
use crate::params::RequestParams;
use crate::platform::Platform;

/// Continuation receiving the token of an issued request
pub type TokenCallback = Box<dyn FnOnce(Token) + Send + 'static>;

/// Native networking capability provided by the host.
///
/// Implementations perform the actual HTTP exchange and report completion by
/// emitting `onSuccess`/`onError` events on the [`EventEmitter`] the bridge
/// was built with.
pub trait NativeNetworking: Send + Sync {
    /// Start a request.
    ///
    /// `on_token` must be called exactly once with the token identifying the
    /// request. It may be called before or after this method returns, and
    /// before or after the completion event for that token is emitted.
    fn request(&self, url: &str, params: &RequestParams, on_token: TokenCallback);

    /// Abort the request identified by `token`.
    ///
    /// An aborted request is expected to finish with an `onError` event
    /// carrying the platform's cancellation code. Unknown or finished tokens
    /// are ignored.
    fn cancel_request(&self, token: &Token);
}

/// Bridge between requests and the native networking module.
///
/// One bridge is shared by all requests of a process; it is passed around as
/// `Arc<Bridge>`.
pub struct Bridge {
    platform: Platform,
    networking: Arc<dyn NativeNetworking>,
    events: EventEmitter,
}

impl fmt::Debug for Bridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bridge")
            .field("platform", &self.platform)
            .field("events", &self.events)
            .finish_non_exhaustive()
    }
}

impl Bridge {
    /// Create a bridge for the platform of the compilation target
    pub fn new(networking: Arc<dyn NativeNetworking>, events: EventEmitter) -> Self {
        Self {
            platform: Platform::current(),
            networking,
            events,
        }
    }

    /// Select the platform explicitly
    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    /// Platform whose payload and error conventions apply
    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Event emitter completions are delivered on
    pub fn events(&self) -> &EventEmitter {
        &self.events
    }

    /// Issue a request; `on_token` receives its token once the native layer assigns one
    pub fn issue_request<F>(&self, url: &str, params: &RequestParams, on_token: F)
    where
        F: FnOnce(Token) + Send + 'static,
    {
        log_debug!("Issuing {} request to {}", params.method, url);
        self.networking.request(url, params, Box::new(on_token));
    }

    /// Ask the native layer to abort the request identified by `token`
    pub fn cancel(&self, token: &Token) {
        log_debug!("Canceling request {}", token);
        self.networking.cancel_request(token);
    }

    /// Listen for events on `name`
    pub fn subscribe<F>(&self, name: EventName, handler: F) -> Subscription
    where
        F: Fn(&NativeEvent) + Send + Sync + 'static,
    {
        self.events.add_listener(name, handler)
    }
}
