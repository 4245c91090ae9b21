//! Fake native networking module
//!
//! Used for testing where the host's networking stack is not available.
//!
//! [`FakeNetworking`] records every request and cancellation it receives and
//! emits completion events on its [`EventEmitter`] the way the Android or iOS
//! module would: Android payloads are delivered as JSON strings, iOS payloads
//! as decoded values, and canceled requests finish with the platform's
//! cancellation error. Replies can be scripted per URL, delivered after a
//! delay, or sent by hand from the test.

#![warn(missing_docs)]
#![warn(rustdoc::bare_urls)]

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use error::Error;
use native_http::{
    cancellation_code, Bridge, EventEmitter, EventName, NativeError, NativeEvent, NativeNetworking,
    NativeResponse, Platform, RequestParams, Token, TokenCallback,
};
use native_http_log::{log_debug, log_warn};
use parking_lot::Mutex;
use serde_json::Value;

pub mod error;

/// Message of the error emitted for canceled requests
pub const CANCELED_MESSAGE: &str = "cancelled";

/// When issued tokens reach the caller
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TokenDelivery {
    /// Before [`NativeNetworking::request`] returns
    #[default]
    Immediate,
    /// Only once the test calls [`FakeNetworking::release_tokens`]
    Deferred,
}

/// Scripted reply for a URL
#[derive(Debug, Clone, PartialEq)]
pub enum FakeReply {
    /// Succeed with this payload, encoded the platform's way
    Success(Value),
    /// Fail with this native error
    Failure(NativeError),
    /// Emit this response on `onSuccess` untouched
    Raw(NativeResponse),
    /// Never complete
    Silent,
}

impl FakeReply {
    /// Successful reply
    pub fn success(data: Value) -> Self {
        Self::Success(data)
    }

    /// Failed reply
    pub fn failure(error_type: &str, code: i64, message: &str) -> Self {
        Self::Failure(NativeError::new(error_type, code, message))
    }
}

/// Request received by the fake
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    /// Requested URL
    pub url: String,
    /// Parameters as they crossed the bridge
    pub params: RequestParams,
    /// Token issued for it
    pub token: Token,
}

#[derive(Debug, Clone)]
struct Script {
    reply: FakeReply,
    delay: Option<Duration>,
}

#[derive(Default)]
struct FakeState {
    next_token: u64,
    delivery: TokenDelivery,
    cancel_errors: bool,
    scripts: HashMap<String, Script>,
    requests: Vec<RecordedRequest>,
    cancelled: Vec<Token>,
    in_flight: HashSet<Token>,
    held_tokens: Vec<(Token, TokenCallback)>,
}

/// In-memory [`NativeNetworking`] implementation
#[derive(Clone)]
pub struct FakeNetworking {
    platform: Platform,
    events: EventEmitter,
    state: Arc<Mutex<FakeState>>,
}

impl fmt::Debug for FakeNetworking {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("FakeNetworking")
            .field("platform", &self.platform)
            .field("delivery", &state.delivery)
            .field("requests", &state.requests.len())
            .field("in_flight", &state.in_flight.len())
            .field("held_tokens", &state.held_tokens.len())
            .finish()
    }
}

impl FakeNetworking {
    /// Create a fake behaving like the networking module of `platform`
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            events: EventEmitter::new(),
            state: Arc::new(Mutex::new(FakeState {
                next_token: 1,
                cancel_errors: true,
                ..Default::default()
            })),
        }
    }

    /// Choose when tokens are handed to callers
    pub fn with_token_delivery(self, delivery: TokenDelivery) -> Self {
        self.state.lock().delivery = delivery;
        self
    }

    /// Reply to every request for `url` with `reply`
    pub fn with_reply(self, url: &str, reply: FakeReply) -> Self {
        self.script(url, reply, None)
    }

    /// Reply to every request for `url` with `reply` after `delay`.
    ///
    /// Needs a running tokio runtime; without one the reply is sent right away.
    pub fn with_delayed_reply(self, url: &str, reply: FakeReply, delay: Duration) -> Self {
        self.script(url, reply, Some(delay))
    }

    /// Do not emit an error event when a request is canceled
    pub fn without_cancel_errors(self) -> Self {
        self.state.lock().cancel_errors = false;
        self
    }

    fn script(self, url: &str, reply: FakeReply, delay: Option<Duration>) -> Self {
        self.state
            .lock()
            .scripts
            .insert(url.to_string(), Script { reply, delay });
        self
    }

    /// Platform the fake imitates
    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Emitter completion events are delivered on
    pub fn events(&self) -> &EventEmitter {
        &self.events
    }

    /// Bridge over this fake
    pub fn bridge(&self) -> Arc<Bridge> {
        Arc::new(
            Bridge::new(Arc::new(self.clone()), self.events.clone()).with_platform(self.platform),
        )
    }

    /// Every request received so far, oldest first
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().requests.clone()
    }

    /// Most recent request
    pub fn last_request(&self) -> Option<RecordedRequest> {
        self.state.lock().requests.last().cloned()
    }

    /// Token issued for the request at `index`
    pub fn token(&self, index: usize) -> Result<Token, Error> {
        self.state
            .lock()
            .requests
            .get(index)
            .map(|request| request.token.clone())
            .ok_or(Error::NoRequest(index))
    }

    /// Tokens passed to `cancel_request`, in call order
    pub fn cancelled(&self) -> Vec<Token> {
        self.state.lock().cancelled.clone()
    }

    /// Number of requests that have not completed
    pub fn in_flight(&self) -> usize {
        self.state.lock().in_flight.len()
    }

    /// Hand every held token to its caller. Returns how many were released.
    pub fn release_tokens(&self) -> usize {
        let held = std::mem::take(&mut self.state.lock().held_tokens);
        let count = held.len();
        for (token, on_token) in held {
            log_debug!("Releasing token {}", token);
            on_token(token);
        }
        count
    }

    /// Complete `token` successfully with `data`, encoded the platform's way.
    ///
    /// Returns the number of listeners the event reached.
    pub fn succeed(&self, token: &Token, data: Value) -> Result<usize, Error> {
        self.finish(token)?;
        Ok(self.emit(
            EventName::Success,
            &NativeEvent::success(token.clone(), self.encode(data)),
        ))
    }

    /// Complete `token` with `response` on `onSuccess`, untouched
    pub fn respond(&self, token: &Token, response: NativeResponse) -> Result<usize, Error> {
        self.finish(token)?;
        Ok(self.emit(EventName::Success, &NativeEvent::new(token.clone(), response)))
    }

    /// Fail `token` with a native error
    pub fn fail(
        &self,
        token: &Token,
        error_type: &str,
        code: i64,
        message: &str,
    ) -> Result<usize, Error> {
        self.finish(token)?;
        Ok(self.emit(
            EventName::Error,
            &NativeEvent::failure(token.clone(), NativeError::new(error_type, code, message)),
        ))
    }

    /// Emit an arbitrary event, whether or not its token was issued
    pub fn emit(&self, name: EventName, event: &NativeEvent) -> usize {
        log_debug!("Emitting {} for {}", name, event.token);
        self.events.emit(name, event)
    }

    fn finish(&self, token: &Token) -> Result<(), Error> {
        let mut state = self.state.lock();
        if !state.requests.iter().any(|request| &request.token == token) {
            return Err(Error::UnknownToken(token.clone()));
        }
        state.in_flight.remove(token);
        Ok(())
    }

    fn encode(&self, data: Value) -> Value {
        match self.platform {
            Platform::Android => Value::String(data.to_string()),
            Platform::Ios => data,
        }
    }

    fn deliver(&self, token: Token, reply: FakeReply) {
        if matches!(reply, FakeReply::Silent) {
            return;
        }
        if !self.state.lock().in_flight.remove(&token) {
            log_debug!("Dropping scripted reply for finished request {}", token);
            return;
        }

        match reply {
            FakeReply::Success(data) => {
                self.emit(EventName::Success, &NativeEvent::success(token, self.encode(data)));
            }
            FakeReply::Failure(error) => {
                self.emit(EventName::Error, &NativeEvent::failure(token, error));
            }
            FakeReply::Raw(response) => {
                self.emit(EventName::Success, &NativeEvent::new(token, response));
            }
            FakeReply::Silent => {}
        }
    }
}

impl NativeNetworking for FakeNetworking {
    fn request(&self, url: &str, params: &RequestParams, on_token: TokenCallback) {
        let (token, script, on_token) = {
            let mut state = self.state.lock();
            let token = Token::from(state.next_token);
            state.next_token += 1;

            state.requests.push(RecordedRequest {
                url: url.to_string(),
                params: params.clone(),
                token: token.clone(),
            });
            state.in_flight.insert(token.clone());

            let on_token = match state.delivery {
                TokenDelivery::Immediate => Some(on_token),
                TokenDelivery::Deferred => {
                    state.held_tokens.push((token.clone(), on_token));
                    None
                }
            };
            (token, state.scripts.get(url).cloned(), on_token)
        };

        log_debug!("Fake {} request {} to {}", params.method, token, url);

        if let Some(on_token) = on_token {
            on_token(token.clone());
        }

        let Some(Script { reply, delay }) = script else {
            return;
        };

        match delay {
            Some(delay) => match tokio::runtime::Handle::try_current() {
                Ok(handle) => {
                    let fake = self.clone();
                    handle.spawn(async move {
                        tokio::time::sleep(delay).await;
                        fake.deliver(token, reply);
                    });
                }
                Err(_) => {
                    log_warn!("No tokio runtime, replying to {} without delay", token);
                    self.deliver(token, reply);
                }
            },
            None => self.deliver(token, reply),
        }
    }

    fn cancel_request(&self, token: &Token) {
        let emit_error = {
            let mut state = self.state.lock();
            state.cancelled.push(token.clone());
            state.in_flight.remove(token) && state.cancel_errors
        };

        if emit_error {
            let (error_type, code) = cancellation_code(self.platform);
            self.emit(
                EventName::Error,
                &NativeEvent::failure(
                    token.clone(),
                    NativeError::new(error_type, code, CANCELED_MESSAGE),
                ),
            );
        }
    }
}
