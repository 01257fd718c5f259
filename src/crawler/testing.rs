//! In-memory transport for unit tests

use crate::crawler::{HttpResponse, Transport};
use crate::shutdown::Shutdown;
use crate::ScraperError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use url::Url;

/// Canned response for a URL
#[derive(Debug, Clone)]
enum Canned {
    Response(u16, Vec<u8>),
    Error(String),
}

/// Serves canned responses and records every request
///
/// Unknown URLs answer 404.
#[derive(Debug, Default)]
pub(crate) struct FakeTransport {
    routes: Mutex<HashMap<String, Canned>>,
    interrupt_on: Mutex<Option<(String, Shutdown)>>,
    requests: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl FakeTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_response(self, url: &str, status: u16, body: impl Into<Vec<u8>>) -> Self {
        self.routes
            .lock()
            .unwrap()
            .insert(url.to_string(), Canned::Response(status, body.into()));
        self
    }

    pub(crate) fn with_error(self, url: &str, message: &str) -> Self {
        self.routes
            .lock()
            .unwrap()
            .insert(url.to_string(), Canned::Error(message.to_string()));
        self
    }

    /// Triggers `shutdown` when `url` is requested, as a Ctrl-C mid-run would
    pub(crate) fn with_interrupt_on(self, url: &str, shutdown: Shutdown) -> Self {
        *self.interrupt_on.lock().unwrap() = Some((url.to_string(), shutdown));
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn get(&self, url: &Url) -> Result<HttpResponse, ScraperError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(url.to_string());

        if let Some((trigger_url, shutdown)) = self.interrupt_on.lock().unwrap().as_ref() {
            if trigger_url == url.as_str() {
                shutdown.trigger();
            }
        }

        let canned = self.routes.lock().unwrap().get(url.as_str()).cloned();
        match canned {
            Some(Canned::Response(status, body)) => Ok(HttpResponse {
                status,
                final_url: url.clone(),
                body,
            }),
            Some(Canned::Error(message)) => Err(ScraperError::Transport {
                url: url.to_string(),
                message,
            }),
            None => Ok(HttpResponse {
                status: 404,
                final_url: url.clone(),
                body: Vec::new(),
            }),
        }
    }
}
