//! Transport abstraction
//!
//! The interceptor and aggregator only need "send this request, give me the
//! response". Keeping that behind a trait lets the engine run against a real
//! HTTP client, a proxy upstream, or a scripted backend in tests.

use crate::error::Result;
use crate::request::{RequestDescriptor, ResponseSnapshot};
use async_trait::async_trait;
use std::sync::Arc;

/// Sends one request and returns the complete response.
///
/// HTTP error statuses are returned as snapshots; `Err` is reserved for
/// failures where no response exists (connect errors, timeouts).
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &RequestDescriptor) -> Result<ResponseSnapshot>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send(&self, request: &RequestDescriptor) -> Result<ResponseSnapshot> {
        (**self).send(request).await
    }
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for &T {
    async fn send(&self, request: &RequestDescriptor) -> Result<ResponseSnapshot> {
        (**self).send(request).await
    }
}

/// Scripted backend for unit tests
#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::error::Error;
    use reqwest::header::HeaderMap;
    use reqwest::StatusCode;
    use std::sync::Mutex;

    type Handler = dyn Fn(&RequestDescriptor, usize) -> Result<ResponseSnapshot> + Send + Sync;

    /// Answers every request with a closure and records what it saw
    pub(crate) struct ScriptedBackend {
        handler: Box<Handler>,
        seen: Mutex<Vec<RequestDescriptor>>,
    }

    impl ScriptedBackend {
        pub(crate) fn new(
            handler: impl Fn(&RequestDescriptor, usize) -> Result<ResponseSnapshot>
                + Send
                + Sync
                + 'static,
        ) -> Self {
            Self {
                handler: Box::new(handler),
                seen: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn requests(&self) -> Vec<RequestDescriptor> {
            self.seen.lock().unwrap().clone()
        }

        pub(crate) fn calls(&self) -> usize {
            self.seen.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Transport for ScriptedBackend {
        async fn send(&self, request: &RequestDescriptor) -> Result<ResponseSnapshot> {
            let call = {
                let mut seen = self.seen.lock().unwrap();
                seen.push(request.clone());
                seen.len() - 1
            };
            (self.handler)(request, call)
        }
    }

    pub(crate) fn status(code: u16) -> ResponseSnapshot {
        ResponseSnapshot::new(
            StatusCode::from_u16(code).unwrap(),
            HeaderMap::new(),
            bytes::Bytes::new(),
        )
    }

    pub(crate) fn connect_error() -> Error {
        Error::Other("connection refused".to_string())
    }
}
