//! # Core subscriber trait
//!
//! `Subscribe` is the extension point for reacting to runtime notices (UI messages,
//! audit trails, metrics exporters). Each subscriber is driven by a dedicated worker loop
//! fed by a bounded queue owned by the [`SubscriberSet`](crate::SubscriberSet).
//!
//! ## Contract
//! - Implementations may be slow; they do **not** block monitors nor other subscribers.
//! - Each subscriber declares its preferred queue capacity via
//!   [`Subscribe::queue_capacity`]. On overflow, notices for that subscriber are
//!   **dropped** and a `SubscriberOverflow` notice is published.
//!
//! ## Example
//! ```rust
//! use childvisor::{Event, EventKind, Subscribe};
//!
//! struct Toast;
//!
//! #[async_trait::async_trait]
//! impl Subscribe for Toast {
//!     async fn on_event(&self, ev: &Event) {
//!         if ev.kind == EventKind::ProcessStarted {
//!             // show "attached to <pid>" somewhere
//!         }
//!     }
//!     fn name(&self) -> &'static str { "toast" }
//! }
//! ```

use async_trait::async_trait;

use crate::events::Event;

/// Contract for notice subscribers.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handle a single notice.
    async fn on_event(&self, event: &Event);

    /// Human-readable name (for logs).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Preferred capacity of this subscriber's queue.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
