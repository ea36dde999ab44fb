// Gateway layer - narrow contracts over the hosted backend
//
// Everything the rest of the app knows about identity, the document store
// and the blob store goes through the two traits in this module. The
// production implementation talks HTTPS (backend.rs); the in-memory one
// (memory.rs) powers demo mode and tests. Both are constructed once at
// startup and shared as handles - there is no ambient global lookup.

pub mod backend;
pub mod memory;

use crate::ticket::{Ticket, TicketDraft};
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::task::AbortHandle;

/// Blob paths are always rooted here; a second upload with the same file
/// name overwrites the prior blob (backend-defined collision behavior).
pub const ATTACHMENT_PREFIX: &str = "tickets/attachments";

/// The authenticated identity, as observed through the session stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub uid: String,
    pub email: Option<String>,
}

/// An attachment picked in the form, read from disk at submit time
#[derive(Debug, Clone)]
pub struct Attachment {
    pub file_name: String,
    pub bytes: Bytes,
}

/// Errors crossing the gateway seam.
///
/// Validation failures never reach this layer - the form blocks them.
/// Policy for all of these: caught at the call site, logged, surfaced as
/// a toast where the user can act on it, never retried automatically.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("attachment upload failed: {0}")]
    Upload(String),

    #[error("ticket write failed: {0}")]
    Write(String),

    #[error("sign-out failed: {0}")]
    Auth(String),

    #[error("subscription stream failed: {0}")]
    Subscription(String),
}

/// Callback for session changes. Invoked once immediately with the
/// current session (possibly None), then on every subsequent change.
pub type SessionCallback = Box<dyn FnMut(Option<Session>) + Send + 'static>;

/// Each live-query delivery: the complete current matching set, or the
/// stream error when the backend could not be read.
pub type SnapshotResult = Result<Vec<Ticket>, GatewayError>;

/// Callback for ticket snapshots
pub type SnapshotCallback = Box<dyn FnMut(SnapshotResult) + Send + 'static>;

/// Cancellation handle returned by every subscribe operation.
///
/// `cancel()` is idempotent and synchronous-effective: the shared flag is
/// flipped before the delivery task is aborted, and deliverers check the
/// flag immediately before invoking the callback, so no callback runs
/// after `cancel()` returns. Dropping the handle cancels too.
pub struct Subscription {
    cancelled: Arc<AtomicBool>,
    abort: Mutex<Option<AbortHandle>>,
}

/// The deliverer's side of a subscription: implementations check this
/// before every callback invocation.
#[derive(Clone)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

impl Subscription {
    /// Create a subscription handle and its matching deliverer token
    pub fn new() -> (Self, CancelToken) {
        let cancelled = Arc::new(AtomicBool::new(false));
        let token = CancelToken {
            cancelled: cancelled.clone(),
        };
        let sub = Self {
            cancelled,
            abort: Mutex::new(None),
        };
        (sub, token)
    }

    /// Attach the delivery task so cancellation also stops its loop
    pub fn set_abort(&self, handle: AbortHandle) {
        *self.abort.lock().unwrap() = Some(handle);
    }

    /// Stop all further deliveries. Safe to call any number of times.
    pub fn cancel(&self) {
        // swap, not store: the abort only needs to happen once
        if !self.cancelled.swap(true, Ordering::SeqCst) {
            if let Some(handle) = self.abort.lock().unwrap().take() {
                handle.abort();
            }
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// Forward a `watch` stream of session states to a callback: one
/// immediate delivery of the current value, then one per change. Both
/// gateway implementations drive their session streams through this.
pub(crate) fn forward_session_watch(
    mut rx: tokio::sync::watch::Receiver<Option<Session>>,
    mut on_change: SessionCallback,
) -> Subscription {
    let (sub, token) = Subscription::new();
    let handle = tokio::spawn(async move {
        let current = rx.borrow_and_update().clone();
        if token.is_cancelled() {
            return;
        }
        on_change(current);
        while rx.changed().await.is_ok() {
            let next = rx.borrow_and_update().clone();
            if token.is_cancelled() {
                return;
            }
            on_change(next);
        }
    });
    sub.set_abort(handle.abort_handle());
    sub
}

/// Identity backend: session stream plus sign-out.
///
/// Sign-in happens on a separate surface entirely - the only way the app
/// learns about authentication state is through `subscribe`.
#[async_trait]
pub trait SessionGateway: Send + Sync {
    /// Register a session observer. The callback fires once immediately
    /// with the current state, then on every change (sign-in, sign-out,
    /// external expiry).
    fn subscribe(&self, on_change: SessionCallback) -> Subscription;

    /// End the current session. On failure the prior session remains
    /// active; a successful sign-out is observed by subscribers as a
    /// `None` emission.
    async fn sign_out(&self) -> Result<(), GatewayError>;
}

/// Document + blob store access for tickets
#[async_trait]
pub trait TicketStore: Send + Sync {
    /// Upload the attachment (if any), then persist a new ticket record
    /// built from the draft with status "Open", `created_by` set to the
    /// caller and `created_at` set to now. The record is only written
    /// after a required upload completed, so no partial ticket is ever
    /// visible. Returns the stored ticket with its assigned id.
    async fn create_ticket(
        &self,
        draft: TicketDraft,
        attachment: Option<Attachment>,
        created_by: &str,
    ) -> Result<Ticket, GatewayError>;

    /// Live query filtered to `created_by == owner`. Every change to the
    /// matching set delivers the complete current set; the initial load
    /// counts as one change.
    fn subscribe_tickets(&self, owner: &str, on_snapshot: SnapshotCallback) -> Subscription;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_is_idempotent() {
        let (sub, token) = Subscription::new();
        assert!(!token.is_cancelled());
        sub.cancel();
        assert!(token.is_cancelled());
        // Second cancel: no panic, no state change
        sub.cancel();
        assert!(sub.is_cancelled());
    }

    #[test]
    fn drop_cancels() {
        let (sub, token) = Subscription::new();
        drop(sub);
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn cancel_aborts_delivery_task() {
        let (sub, token) = Subscription::new();
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<u32>();

        let task_token = token.clone();
        let handle = tokio::spawn(async move {
            let mut n = 0;
            loop {
                tokio::time::sleep(std::time::Duration::from_millis(5)).await;
                if task_token.is_cancelled() {
                    return;
                }
                let _ = tx.send(n);
                n += 1;
            }
        });
        sub.set_abort(handle.abort_handle());

        // Let a delivery or two through, then cancel
        let _ = rx.recv().await;
        sub.cancel();

        // Flag was flipped before the abort, so nothing slips through
        // after the channel drains
        while rx.try_recv().is_ok() {}
        tokio::time::sleep(std::time::Duration::from_millis(30)).await;
        assert!(rx.try_recv().is_err());
    }
}
