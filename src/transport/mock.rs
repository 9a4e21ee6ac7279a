//! In-process transports for tests.

// ============================================================================
// Imports
// ============================================================================

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use crate::error::{Error, Result};

use super::http::{HttpResponse, HttpTransport, Method};
use super::push::{PushHandlers, PushTransport, TransportFactory};

// ============================================================================
// MockPush
// ============================================================================

/// Scripted outcome of one `connect` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectOutcome {
    /// Fire `on_connect` and succeed.
    Succeed,
    /// Fail with a connection error.
    Fail,
    /// Never complete.
    Hang,
}

#[derive(Default)]
struct PushState {
    script: Mutex<VecDeque<ConnectOutcome>>,
    fallback: Mutex<Option<ConnectOutcome>>,
    connects: AtomicUsize,
    disconnects: AtomicUsize,
    urls: Mutex<Vec<String>>,
    current: Mutex<Option<PushHandlers>>,
    /// Handlers of every handle, in creation order.
    history: Mutex<Vec<PushHandlers>>,
}

/// Factory whose transports follow a script shared across reconnects.
#[derive(Clone, Default)]
pub struct MockPushFactory {
    state: Arc<PushState>,
}

impl MockPushFactory {
    /// Every connect attempt yields `outcome`.
    pub fn always(outcome: ConnectOutcome) -> Self {
        let factory = Self::default();
        *factory.state.fallback.lock() = Some(outcome);
        factory
    }

    /// Attempts follow `script`, then `fallback` forever.
    pub fn scripted(script: &[ConnectOutcome], fallback: ConnectOutcome) -> Self {
        let factory = Self::always(fallback);
        factory.state.script.lock().extend(script.iter().copied());
        factory
    }

    /// Number of `connect` calls across all handles.
    pub fn connect_calls(&self) -> usize {
        self.state.connects.load(Ordering::SeqCst)
    }

    /// Number of `disconnect` calls across all handles.
    pub fn disconnect_calls(&self) -> usize {
        self.state.disconnects.load(Ordering::SeqCst)
    }

    /// URLs passed to `connect`.
    pub fn urls(&self) -> Vec<String> {
        self.state.urls.lock().clone()
    }

    /// Delivers an event through the most recent handle's handlers.
    pub fn emit(&self, name: &str, payload: Value) {
        let handler = self
            .state
            .current
            .lock()
            .as_ref()
            .map(|h| Arc::clone(&h.on_event));
        if let Some(handler) = handler {
            handler(name.to_string(), payload);
        }
    }

    /// Simulates the server dropping the most recent connection.
    pub fn drop_connection(&self) {
        let handler = self
            .state
            .current
            .lock()
            .as_ref()
            .map(|h| Arc::clone(&h.on_disconnect));
        if let Some(handler) = handler {
            handler();
        }
    }

    /// Fires the disconnect handler of the `index`-th handle ever wired.
    pub fn drop_connection_at(&self, index: usize) {
        let handler = self
            .state
            .history
            .lock()
            .get(index)
            .map(|h| Arc::clone(&h.on_disconnect));
        if let Some(handler) = handler {
            handler();
        }
    }
}

impl TransportFactory for MockPushFactory {
    fn create(&self) -> Arc<dyn PushTransport> {
        Arc::new(MockPushTransport {
            state: Arc::clone(&self.state),
            handlers: Mutex::new(None),
        })
    }
}

/// Transport handle produced by [`MockPushFactory`].
pub struct MockPushTransport {
    state: Arc<PushState>,
    handlers: Mutex<Option<PushHandlers>>,
}

#[async_trait]
impl PushTransport for MockPushTransport {
    fn set_handlers(&self, handlers: PushHandlers) {
        self.state.history.lock().push(handlers.clone());
        *self.handlers.lock() = Some(handlers);
    }

    async fn connect(&self, url: &str, _timeout: Duration) -> Result<()> {
        self.state.connects.fetch_add(1, Ordering::SeqCst);
        self.state.urls.lock().push(url.to_string());

        let outcome = self
            .state
            .script
            .lock()
            .pop_front()
            .or(*self.state.fallback.lock())
            .unwrap_or(ConnectOutcome::Fail);

        match outcome {
            ConnectOutcome::Succeed => {
                let handlers = self.handlers.lock().clone();
                *self.state.current.lock() = handlers.clone();
                if let Some(handlers) = handlers {
                    (handlers.on_connect)();
                }
                Ok(())
            }
            ConnectOutcome::Fail => Err(Error::connection("mock connect refused")),
            ConnectOutcome::Hang => {
                std::future::pending::<()>().await;
                Ok(())
            }
        }
    }

    async fn disconnect(&self) -> Result<()> {
        self.state.disconnects.fetch_add(1, Ordering::SeqCst);
        let handlers = self.handlers.lock().clone();
        if let Some(handlers) = handlers {
            (handlers.on_disconnect)();
        }
        Ok(())
    }
}

// ============================================================================
// MockHttp
// ============================================================================

/// A recorded request.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub method: Method,
    pub url: String,
    pub body: Option<Value>,
}

/// Scripted [`HttpTransport`].
///
/// Replies are consumed in order; once exhausted, every request fails
/// with a connection error unless a fallback status is set.
#[derive(Default)]
pub struct MockHttp {
    replies: Mutex<VecDeque<Result<HttpResponse>>>,
    fallback: Mutex<Option<HttpResponse>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MockHttp {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Every unscripted request gets `response`.
    pub fn with_fallback(response: HttpResponse) -> Arc<Self> {
        let http = Self::default();
        *http.fallback.lock() = Some(response);
        Arc::new(http)
    }

    pub fn reply(&self, reply: Result<HttpResponse>) {
        self.replies.lock().push_back(reply);
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait]
impl HttpTransport for MockHttp {
    async fn request(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
        _timeout: Duration,
    ) -> Result<HttpResponse> {
        self.requests.lock().push(RecordedRequest {
            method,
            url: url.to_string(),
            body: body.cloned(),
        });

        if let Some(reply) = self.replies.lock().pop_front() {
            return reply;
        }
        match self.fallback.lock().clone() {
            Some(response) => Ok(response),
            None => Err(Error::connection("mock http unreachable")),
        }
    }
}
