// In-memory backend - demo mode and test substitute
//
// Implements both gateway traits against process-local state. Demo mode
// runs the TUI against this backend with a seeded session and a trickle
// of incoming tickets; tests use the failure-injection switches to drive
// the error paths without a network.

use super::{
    Attachment, GatewayError, Session, SessionCallback, SessionGateway, SnapshotCallback,
    Subscription, TicketStore, ATTACHMENT_PREFIX,
};
use crate::ticket::{Ticket, TicketDraft, STATUS_OPEN};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{broadcast, watch};

pub struct MemoryBackend {
    session_tx: watch::Sender<Option<Session>>,
    /// Shared with snapshot delivery tasks
    tickets: Arc<Mutex<Vec<Ticket>>>,
    /// Pinged after every change to the ticket set; snapshot tasks
    /// re-collect and deliver on each ping
    changed_tx: broadcast::Sender<()>,
    /// Blob paths written so far, in write order
    uploads: Mutex<Vec<String>>,
    fail_uploads: AtomicBool,
    fail_writes: AtomicBool,
    fail_sign_out: AtomicBool,
}

impl MemoryBackend {
    pub fn new() -> Arc<Self> {
        let (session_tx, _) = watch::channel(None);
        let (changed_tx, _) = broadcast::channel(64);
        Arc::new(Self {
            session_tx,
            tickets: Arc::new(Mutex::new(Vec::new())),
            changed_tx,
            uploads: Mutex::new(Vec::new()),
            fail_uploads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
            fail_sign_out: AtomicBool::new(false),
        })
    }

    /// Establish a session, as the out-of-scope sign-in surface would
    pub fn sign_in(&self, session: Session) {
        let _ = self.session_tx.send(Some(session));
    }

    pub fn set_fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_sign_out(&self, fail: bool) {
        self.fail_sign_out.store(fail, Ordering::SeqCst);
    }

    /// Blob paths written so far (write order)
    pub fn uploaded_paths(&self) -> Vec<String> {
        self.uploads.lock().unwrap().clone()
    }

    pub fn ticket_count(&self) -> usize {
        self.tickets.lock().unwrap().len()
    }
}

#[async_trait]
impl SessionGateway for MemoryBackend {
    fn subscribe(&self, on_change: SessionCallback) -> Subscription {
        super::forward_session_watch(self.session_tx.subscribe(), on_change)
    }

    async fn sign_out(&self) -> Result<(), GatewayError> {
        if self.fail_sign_out.load(Ordering::SeqCst) {
            // Prior session stays active
            return Err(GatewayError::Auth("injected sign-out failure".into()));
        }
        let _ = self.session_tx.send(None);
        Ok(())
    }
}

#[async_trait]
impl TicketStore for MemoryBackend {
    async fn create_ticket(
        &self,
        draft: TicketDraft,
        attachment: Option<Attachment>,
        created_by: &str,
    ) -> Result<Ticket, GatewayError> {
        // Upload strictly before the record write
        let attachment_url = match attachment {
            Some(file) => {
                if self.fail_uploads.load(Ordering::SeqCst) {
                    return Err(GatewayError::Upload("injected upload failure".into()));
                }
                let path = format!("{}/{}", ATTACHMENT_PREFIX, file.file_name);
                // Same-name uploads alias the prior blob
                let mut uploads = self.uploads.lock().unwrap();
                if !uploads.contains(&path) {
                    uploads.push(path.clone());
                }
                Some(format!("memory://{}", path))
            }
            None => None,
        };

        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(GatewayError::Write("injected write failure".into()));
        }

        let ticket = Ticket {
            id: uuid::Uuid::new_v4().to_string(),
            title: draft.title,
            description: draft.description,
            priority: draft.priority,
            category: draft.category,
            contact_email: draft.contact_email,
            contact_phone: draft.contact_phone,
            attachment: attachment_url,
            status: STATUS_OPEN.to_string(),
            created_by: created_by.to_string(),
            created_at: Utc::now(),
            assigned_to: None,
        };
        self.tickets.lock().unwrap().push(ticket.clone());
        let _ = self.changed_tx.send(());
        Ok(ticket)
    }

    fn subscribe_tickets(&self, owner: &str, mut on_snapshot: SnapshotCallback) -> Subscription {
        let (sub, token) = Subscription::new();
        let owner = owner.to_string();
        // Subscribe before the initial collection so a write racing the
        // subscription still produces a delivery
        let mut changed_rx = self.changed_tx.subscribe();
        let tickets = self.tickets.clone();

        let collect = move |tickets: &Arc<Mutex<Vec<Ticket>>>, owner: &str| -> Vec<Ticket> {
            tickets
                .lock()
                .unwrap()
                .iter()
                .filter(|t| t.created_by == owner)
                .cloned()
                .collect()
        };

        let handle = tokio::spawn(async move {
            if token.is_cancelled() {
                return;
            }
            // Initial load counts as one change
            on_snapshot(Ok(collect(&tickets, &owner)));
            loop {
                match changed_rx.recv().await {
                    Ok(()) | Err(broadcast::error::RecvError::Lagged(_)) => {
                        let set = collect(&tickets, &owner);
                        if token.is_cancelled() {
                            return;
                        }
                        on_snapshot(Ok(set));
                    }
                    Err(broadcast::error::RecvError::Closed) => return,
                }
            }
        });
        sub.set_abort(handle.abort_handle());
        sub
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::time::Duration;

    fn draft(title: &str) -> TicketDraft {
        TicketDraft {
            title: title.to_string(),
            description: "desc".to_string(),
            contact_email: "a@b.com".to_string(),
            ..Default::default()
        }
    }

    fn attachment(name: &str) -> Attachment {
        Attachment {
            file_name: name.to_string(),
            bytes: bytes::Bytes::from_static(b"payload"),
        }
    }

    #[tokio::test]
    async fn create_without_attachment_skips_blob_store() {
        let backend = MemoryBackend::new();
        let ticket = backend
            .create_ticket(draft("t"), None, "user-a")
            .await
            .unwrap();
        assert_eq!(ticket.attachment, None);
        assert_eq!(ticket.status, STATUS_OPEN);
        assert_eq!(ticket.created_by, "user-a");
        assert!(backend.uploaded_paths().is_empty());
    }

    #[tokio::test]
    async fn create_with_attachment_uploads_before_write() {
        let backend = MemoryBackend::new();
        let ticket = backend
            .create_ticket(draft("t"), Some(attachment("error.png")), "user-a")
            .await
            .unwrap();
        let paths = backend.uploaded_paths();
        assert_eq!(paths, vec!["tickets/attachments/error.png".to_string()]);
        assert_eq!(
            ticket.attachment.as_deref(),
            Some("memory://tickets/attachments/error.png")
        );
    }

    #[tokio::test]
    async fn upload_failure_leaves_no_record() {
        let backend = MemoryBackend::new();
        backend.set_fail_uploads(true);
        let err = backend
            .create_ticket(draft("t"), Some(attachment("a.txt")), "user-a")
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Upload(_)));
        assert_eq!(backend.ticket_count(), 0);
        assert!(backend.uploaded_paths().is_empty());
    }

    #[tokio::test]
    async fn write_failure_leaves_no_record() {
        let backend = MemoryBackend::new();
        backend.set_fail_writes(true);
        let err = backend
            .create_ticket(draft("t"), None, "user-a")
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Write(_)));
        assert_eq!(backend.ticket_count(), 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn snapshots_are_filtered_by_owner() {
        let backend = MemoryBackend::new();
        backend
            .create_ticket(draft("a1"), None, "user-a")
            .await
            .unwrap();
        backend
            .create_ticket(draft("a2"), None, "user-a")
            .await
            .unwrap();
        backend
            .create_ticket(draft("b1"), None, "user-b")
            .await
            .unwrap();

        let (tx, rx) = mpsc::channel();
        let _sub = backend.subscribe_tickets(
            "user-a",
            Box::new(move |snapshot| {
                let _ = tx.send(snapshot);
            }),
        );

        let snapshot = rx.recv_timeout(Duration::from_secs(1)).unwrap().unwrap();
        let titles: Vec<&str> = snapshot.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["a1", "a2"]);
        assert!(snapshot.iter().all(|t| t.created_by == "user-a"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn new_write_produces_a_subsequent_snapshot() {
        let backend = MemoryBackend::new();
        let (tx, rx) = mpsc::channel();
        let _sub = backend.subscribe_tickets(
            "user-a",
            Box::new(move |snapshot| {
                let _ = tx.send(snapshot);
            }),
        );
        // Initial (empty) snapshot
        let first = rx.recv_timeout(Duration::from_secs(1)).unwrap().unwrap();
        assert!(first.is_empty());

        backend
            .create_ticket(draft("late"), None, "user-a")
            .await
            .unwrap();
        let second = rx.recv_timeout(Duration::from_secs(1)).unwrap().unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].title, "late");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn cancelled_subscription_stops_delivering() {
        let backend = MemoryBackend::new();
        let (tx, rx) = mpsc::channel();
        let sub = backend.subscribe_tickets(
            "user-a",
            Box::new(move |snapshot| {
                let _ = tx.send(snapshot);
            }),
        );
        let _ = rx.recv_timeout(Duration::from_secs(1)).unwrap();

        sub.cancel();
        sub.cancel(); // idempotent

        backend
            .create_ticket(draft("after"), None, "user-a")
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn session_stream_emits_current_then_changes() {
        let backend = MemoryBackend::new();
        let (tx, rx) = mpsc::channel();
        let _sub = SessionGateway::subscribe(
            &*backend,
            Box::new(move |session| {
                let _ = tx.send(session);
            }),
        );
        // Immediate first emission: no session yet
        assert_eq!(rx.recv_timeout(Duration::from_secs(1)).unwrap(), None);

        backend.sign_in(Session {
            uid: "user-a".to_string(),
            email: Some("a@b.com".to_string()),
        });
        let observed = rx.recv_timeout(Duration::from_secs(1)).unwrap();
        assert_eq!(observed.unwrap().uid, "user-a");

        backend.sign_out().await.unwrap();
        assert_eq!(rx.recv_timeout(Duration::from_secs(1)).unwrap(), None);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn failed_sign_out_keeps_session_active() {
        let backend = MemoryBackend::new();
        backend.sign_in(Session {
            uid: "user-a".to_string(),
            email: None,
        });
        backend.set_fail_sign_out(true);

        let err = backend.sign_out().await.unwrap_err();
        assert!(matches!(err, GatewayError::Auth(_)));

        let (tx, rx) = mpsc::channel();
        let _sub = SessionGateway::subscribe(
            &*backend,
            Box::new(move |session| {
                let _ = tx.send(session);
            }),
        );
        let observed = rx.recv_timeout(Duration::from_secs(1)).unwrap();
        assert_eq!(observed.unwrap().uid, "user-a");
    }

    #[tokio::test]
    async fn same_name_upload_aliases_prior_blob() {
        let backend = MemoryBackend::new();
        backend
            .create_ticket(draft("one"), Some(attachment("dup.txt")), "user-a")
            .await
            .unwrap();
        backend
            .create_ticket(draft("two"), Some(attachment("dup.txt")), "user-a")
            .await
            .unwrap();
        assert_eq!(backend.uploaded_paths().len(), 1);
    }
}
