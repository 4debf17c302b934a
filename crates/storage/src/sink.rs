//! Persistence hook for accepted events

use ticketlog_core::{Event, Result};

/// Receives every event the store is about to publish.
///
/// `persist` runs under the store's writer lock, after validation and before
/// the event becomes visible to readers. Returning an error aborts the append
/// and leaves the store unchanged.
pub trait EventSink: Send + Sync {
    /// Make `event` durable (or at least hand it to the backing storage)
    fn persist(&self, event: &Event) -> Result<()>;
}
