//! # Per-monitor event pipeline.
//!
//! The conduit between a monitor's diff step and its state-update handler. One pipeline
//! has exactly one producer (the scan) and exactly one subscriber (the handler installed
//! by `Monitor::start`).
//!
//! ```text
//! scan ── publish(ProcessEvent) ──► EventPipeline ──► handler(ProcessEvent)
//!                                        │               ├─ update known children
//!                                   complete()           └─ call hooks
//!                                        ▼
//!                              later publishes are dropped
//! ```
//!
//! ## Rules
//! - Delivery is synchronous and in publish order.
//! - A second `subscribe` fails; a subscribe after `complete` fails.
//! - `publish` before subscription or after completion drops the event and returns `false`.
//! - `complete` is idempotent and releases the handler.

use parking_lot::Mutex;

use crate::error::PipelineError;
use crate::process::ProcessEvent;

type Handler = Box<dyn FnMut(ProcessEvent) + Send>;

struct Inner {
    handler: Option<Handler>,
    completed: bool,
}

/// Single-subscriber, synchronous event conduit.
pub(crate) struct EventPipeline {
    inner: Mutex<Inner>,
}

impl EventPipeline {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                handler: None,
                completed: false,
            }),
        }
    }

    /// Installs the one and only handler.
    pub fn subscribe<F>(&self, handler: F) -> Result<(), PipelineError>
    where
        F: FnMut(ProcessEvent) + Send + 'static,
    {
        let mut inner = self.inner.lock();
        if inner.completed {
            return Err(PipelineError::Completed);
        }
        if inner.handler.is_some() {
            return Err(PipelineError::AlreadySubscribed);
        }
        inner.handler = Some(Box::new(handler));
        Ok(())
    }

    /// Delivers `event` to the handler. Returns `false` if it was dropped.
    pub fn publish(&self, event: ProcessEvent) -> bool {
        let mut inner = self.inner.lock();
        if inner.completed {
            return false;
        }
        match inner.handler.as_mut() {
            Some(handler) => {
                handler(event);
                true
            }
            None => false,
        }
    }

    /// Stops accepting events and drops the handler.
    pub fn complete(&self) {
        let mut inner = self.inner.lock();
        inner.completed = true;
        inner.handler = None;
    }

    pub fn is_completed(&self) -> bool {
        self.inner.lock().completed
    }
}
