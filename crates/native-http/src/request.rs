//! One logical HTTP call over the bridge
//!
//! # Lifecycle
//! A [`Request`] subscribes to both completion channels, then issues the
//! native request. The token may arrive before or after the completion event
//! for it, so the request moves through three phases:
//!
//! - `AwaitingToken`: events are buffered, since nothing can be matched yet.
//! - `Active`: events are matched against the token; the buffered ones are
//!   replayed when the token arrives and the rest are discarded.
//! - `Finished`: the first matching event resolved the result and removed the
//!   subscriptions. Anything delivered afterwards is ignored.

use std::collections::VecDeque;
use std::fmt;
use std::future::{Future, IntoFuture};
use std::pin::Pin;
use std::sync::{Arc, Weak};
use std::task::{Context, Poll};
use std::time::Instant;

use native_http_log::{log_debug, log_info, log_warn};
use parking_lot::Mutex;
use serde_json::{Map, Value};
use tokio::sync::oneshot;

use crate::bridge::Bridge;
use crate::emitter::{EventName, Subscription};
use crate::error::{Error, ErrorKind, HttpError};
use crate::event::{NativeEvent, NativeResponse, Token};
use crate::params::{RequestOptions, RequestParams};
use crate::platform::Platform;
use crate::response::Response;
use crate::settings::Settings;
use crate::translate::translate_response;

/// Events kept while a request waits for its token; older ones are dropped
const MAX_EARLY_EVENTS: usize = 256;

/// Outcome of a request
pub type RequestResult = Result<Response, HttpError>;

/// A prepared request, not yet sent
pub struct Request {
    url: String,
    params: RequestParams,
    bridge: Arc<Bridge>,
    started: Instant,
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("url", &self.url)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

impl Request {
    /// Prepare a request with the built-in defaults
    pub fn new(bridge: Arc<Bridge>, url: &str, options: RequestOptions) -> Result<Self, Error> {
        Self::with_settings(bridge, url, options, &Settings::default())
    }

    /// Prepare a request, filling unset options from `settings`
    pub fn with_settings(
        bridge: Arc<Bridge>,
        url: &str,
        options: RequestOptions,
        settings: &Settings,
    ) -> Result<Self, Error> {
        url::Url::parse(url)
            .map_err(|e| Error::InvalidConfiguration(format!("invalid url {url}: {e}")))?;

        Ok(Self {
            url: url.to_string(),
            params: RequestParams::from_options(options, settings)?,
            bridge,
            started: Instant::now(),
        })
    }

    /// Target URL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Normalized parameters
    pub fn params(&self) -> &RequestParams {
        &self.params
    }

    /// Send the request.
    ///
    /// Returns right away; the outcome is delivered through
    /// [`PendingRequest::result`].
    pub fn send(self) -> PendingRequest {
        let Request {
            url,
            params,
            bridge,
            started,
        } = self;

        let (sender, receiver) = oneshot::channel();
        let inner = Arc::new(Inner {
            platform: bridge.platform(),
            url,
            started,
            bridge,
            state: Mutex::new(State {
                phase: Phase::AwaitingToken {
                    early: VecDeque::new(),
                },
                cancel_requested: false,
                subscriptions: Vec::new(),
                sender: Some(sender),
            }),
        });

        let subscriptions = [EventName::Success, EventName::Error]
            .into_iter()
            .map(|name| {
                let weak: Weak<Inner> = Arc::downgrade(&inner);
                inner.bridge.subscribe(name, move |event| {
                    if let Some(inner) = weak.upgrade() {
                        inner.on_event(name, event);
                    }
                })
            })
            .collect();
        inner.state.lock().subscriptions = subscriptions;

        let weak = Arc::downgrade(&inner);
        inner
            .bridge
            .issue_request(&inner.url, &params, move |token| {
                if let Some(inner) = weak.upgrade() {
                    inner.on_token(token);
                }
            });

        PendingRequest {
            result: ResponseFuture {
                receiver,
                _request: inner.clone(),
            },
            cancel: CancelHandle { inner },
        }
    }
}

enum Phase {
    AwaitingToken {
        early: VecDeque<(EventName, NativeEvent)>,
    },
    Active { token: Token },
    Finished,
}

struct State {
    phase: Phase,
    cancel_requested: bool,
    subscriptions: Vec<Subscription>,
    sender: Option<oneshot::Sender<RequestResult>>,
}

/// What is left to do once a request reached its terminal event
struct Teardown {
    subscriptions: Vec<Subscription>,
    sender: Option<oneshot::Sender<RequestResult>>,
}

impl State {
    fn finish(&mut self) -> Teardown {
        self.phase = Phase::Finished;
        Teardown {
            subscriptions: std::mem::take(&mut self.subscriptions),
            sender: self.sender.take(),
        }
    }
}

struct Inner {
    platform: Platform,
    url: String,
    started: Instant,
    bridge: Arc<Bridge>,
    state: Mutex<State>,
}

impl Inner {
    fn on_event(&self, name: EventName, event: &NativeEvent) {
        let mut state = self.state.lock();
        match &mut state.phase {
            Phase::Finished => return,
            Phase::AwaitingToken { early } => {
                if early.len() == MAX_EARLY_EVENTS {
                    if let Some((_, dropped)) = early.pop_front() {
                        log_warn!(
                            "Request {} still has no token, dropping early event for {}",
                            self.url,
                            dropped.token
                        );
                    }
                }
                early.push_back((name, event.clone()));
                return;
            }
            Phase::Active { token } if *token != event.token => return,
            Phase::Active { .. } => {}
        }
        let teardown = state.finish();
        drop(state);

        self.complete(name, event.response.clone(), teardown);
    }

    fn on_token(&self, token: Token) {
        let mut state = self.state.lock();
        let early = match &mut state.phase {
            Phase::AwaitingToken { early } => std::mem::take(early),
            _ => {
                log_warn!("Ignoring second token {} for {}", token, self.url);
                return;
            }
        };
        state.phase = Phase::Active {
            token: token.clone(),
        };
        let cancel_requested = state.cancel_requested;

        let matched = early.into_iter().find(|(_, event)| event.token == token);
        let teardown = matched.is_some().then(|| state.finish());
        drop(state);

        log_debug!("Request {} has token {}", self.url, token);

        if cancel_requested {
            self.bridge.cancel(&token);
        }

        if let (Some((name, event)), Some(teardown)) = (matched, teardown) {
            self.complete(name, event.response, teardown);
        }
    }

    fn cancel(&self) {
        let mut state = self.state.lock();
        if state.cancel_requested {
            return;
        }
        state.cancel_requested = true;
        let token = match &state.phase {
            Phase::Active { token } => token.clone(),
            Phase::AwaitingToken { .. } => {
                log_debug!("Deferring cancel of {} until its token arrives", self.url);
                return;
            }
            Phase::Finished => return,
        };
        drop(state);

        self.bridge.cancel(&token);
    }

    fn is_cancel_requested(&self) -> bool {
        self.state.lock().cancel_requested
    }

    fn complete(&self, name: EventName, response: NativeResponse, teardown: Teardown) {
        for subscription in teardown.subscriptions.iter() {
            subscription.remove();
        }

        let result = match name {
            EventName::Success => self.resolve(response),
            EventName::Error => Err(translate_response(self.platform, response)),
        };

        log_info!(
            "Http request {} finished in {} ms",
            self.url,
            self.started.elapsed().as_millis()
        );

        if let Some(sender) = teardown.sender {
            // The receiver is gone when the caller stopped waiting
            let _ = sender.send(result);
        }
    }

    fn resolve(&self, response: NativeResponse) -> RequestResult {
        if !response.has_payload() {
            return Err(translate_response(self.platform, response));
        }

        let NativeResponse { data, fields, .. } = response;
        let data = data.unwrap_or(Value::Null);

        let data = match data {
            Value::String(raw) if !self.platform.decodes_payloads() => {
                decode_payload(&raw, &fields)?
            }
            data => data,
        };

        Ok(Response::new(data, fields))
    }
}

/// Decode a payload delivered as JSON text.
///
/// Falsy documents (`null`, `false`, `0`, `""`) decode to an empty object.
fn decode_payload(raw: &str, fields: &Map<String, Value>) -> Result<Value, HttpError> {
    match serde_json::from_str(raw) {
        Ok(value) if is_falsy(&value) => Ok(Value::Object(Map::new())),
        Ok(value) => Ok(value),
        Err(e) => {
            let mut user_info = fields.clone();
            user_info.insert("data".to_string(), Value::String(raw.to_string()));
            Err(HttpError::new(ErrorKind::ParseResponseFailed, e.to_string())
                .with_user_info(user_info))
        }
    }
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

/// A sent request: its eventual result and a way to cancel it
#[derive(Debug)]
pub struct PendingRequest {
    /// Resolves once the native layer reports completion
    pub result: ResponseFuture,
    /// Cancels the request
    pub cancel: CancelHandle,
}

impl PendingRequest {
    /// Split into result and cancel handle
    pub fn into_parts(self) -> (ResponseFuture, CancelHandle) {
        (self.result, self.cancel)
    }
}

impl IntoFuture for PendingRequest {
    type Output = RequestResult;
    type IntoFuture = ResponseFuture;

    fn into_future(self) -> Self::IntoFuture {
        self.result
    }
}

/// Single-shot result of a request.
///
/// Dropping it together with every [`CancelHandle`] stops listening for the
/// completion; the native request itself is not aborted.
pub struct ResponseFuture {
    receiver: oneshot::Receiver<RequestResult>,
    _request: Arc<Inner>,
}

impl fmt::Debug for ResponseFuture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseFuture")
            .field("url", &self._request.url)
            .finish_non_exhaustive()
    }
}

impl Future for ResponseFuture {
    type Output = RequestResult;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver).poll(cx).map(|result| {
            result.unwrap_or_else(|_| {
                Err(HttpError::new(
                    ErrorKind::Unknown,
                    "request was dropped before completion",
                ))
            })
        })
    }
}

/// Cancels a sent request.
///
/// Only the first call has an effect. Before the token is known the
/// cancellation is deferred until it arrives; afterwards it is forwarded to
/// the native layer right away. The result then fails with
/// [`ErrorKind::Canceled`] once the native layer reports the abort.
#[derive(Clone)]
pub struct CancelHandle {
    inner: Arc<Inner>,
}

impl fmt::Debug for CancelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelHandle")
            .field("url", &self.inner.url)
            .field("cancel_requested", &self.is_cancel_requested())
            .finish()
    }
}

impl CancelHandle {
    /// Request cancellation
    pub fn cancel(&self) {
        self.inner.cancel();
    }

    /// Whether cancellation was requested
    pub fn is_cancel_requested(&self) -> bool {
        self.inner.is_cancel_requested()
    }
}
