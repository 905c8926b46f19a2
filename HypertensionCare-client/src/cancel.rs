//! Cancellation scopes for page controllers.
//!
//! A page owns one [`ViewScope`] and runs every service call through it. Cancelling
//! the scope, or dropping it together with the page, aborts whatever is still in
//! flight, so a late response is never applied to a view that has gone away.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use futures::future::{AbortHandle, Abortable};
use tracing::debug;

use crate::error::ApiError;

#[derive(Debug, Default)]
struct ScopeInner {
    cancelled: AtomicBool,
    handles: Mutex<Vec<AbortHandle>>,
}

impl ScopeInner {
    fn cancel(&self) {
        if self.cancelled.swap(true, Ordering::SeqCst) {
            return;
        }

        let handles = {
            let mut handles = self.handles.lock().unwrap_or_else(|e| e.into_inner());
            std::mem::take(&mut *handles)
        };
        if !handles.is_empty() {
            debug!("Aborting {} in-flight request(s)", handles.len());
        }
        for handle in handles {
            handle.abort();
        }
    }

    fn register(&self, handle: AbortHandle) {
        let mut handles = self.handles.lock().unwrap_or_else(|e| e.into_inner());
        handles.push(handle);
    }
}

/// Owner of the in-flight requests of one view
#[derive(Debug, Default)]
pub struct ViewScope {
    inner: Arc<ScopeInner>,
}

impl ViewScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `future` so that cancelling this scope aborts it with [`ApiError::Cancelled`]
    pub async fn run<F, T>(&self, future: F) -> Result<T, ApiError>
    where
        F: Future<Output = Result<T, ApiError>>,
    {
        if self.is_cancelled() {
            return Err(ApiError::Cancelled);
        }

        let (handle, registration) = AbortHandle::new_pair();
        self.inner.register(handle);

        // A cancel racing the registration above must still win
        if self.is_cancelled() {
            return Err(ApiError::Cancelled);
        }

        match Abortable::new(future, registration).await {
            Ok(result) => result,
            Err(_aborted) => Err(ApiError::Cancelled),
        }
    }

    /// Abort every in-flight request and refuse new ones
    pub fn cancel(&self) {
        self.inner.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Handle that can cancel this scope from another task
    pub fn canceller(&self) -> ScopeCanceller {
        ScopeCanceller {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Drop for ViewScope {
    fn drop(&mut self) {
        self.inner.cancel();
    }
}

/// Cloneable cancel switch for a [`ViewScope`]
#[derive(Debug, Clone)]
pub struct ScopeCanceller {
    inner: Arc<ScopeInner>,
}

impl ScopeCanceller {
    pub fn cancel(&self) {
        self.inner.cancel();
    }
}
