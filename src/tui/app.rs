// Application state for the ticket dashboard
//
// The dashboard is a state machine keyed off the session stream:
// AwaitingSession until the first delivery, Authenticated while a user
// is signed in, Redirecting once the stream reports no user. Every
// gateway delivery arrives as an AppEvent on one channel and is applied
// here single-threaded.

use crate::events::AppEvent;
use crate::gateway::{
    Attachment, GatewayError, Session, SessionGateway, SnapshotResult, Subscription, TicketStore,
};
use crate::logging::LogBuffer;
use crate::ticket::Ticket;
use crate::tui::input::InputHandler;
use crate::tui::modal::Modal;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

/// Where the user currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Route {
    #[default]
    Dashboard,
    Login,
}

/// Dashboard lifecycle, driven by session stream deliveries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DashboardState {
    /// No delivery yet; show a loading surface, start nothing
    #[default]
    AwaitingSession,
    /// A user is signed in and the live query is running
    Authenticated,
    /// The stream reported no user; dashboard is torn down
    Redirecting,
}

/// The two backend seams the dashboard talks through
#[derive(Clone)]
pub struct Gateways {
    pub session: Arc<dyn SessionGateway>,
    pub store: Arc<dyn TicketStore>,
}

const TOAST_DURATION: Duration = Duration::from_secs(3);

/// Transient notification shown over the status line
pub struct Toast {
    pub message: String,
    expires_at: Instant,
}

pub struct App {
    pub state: DashboardState,
    pub route: Route,
    pub session: Option<Session>,
    /// Current snapshot of the user's tickets, arrival order
    pub tickets: Vec<Ticket>,
    pub selected: Option<usize>,
    pub modal: Option<Modal>,
    pub toast: Option<Toast>,
    pub should_quit: bool,
    pub start_time: Instant,
    pub log_buffer: LogBuffer,

    gateways: Gateways,
    event_tx: mpsc::UnboundedSender<AppEvent>,
    session_sub: Option<Subscription>,
    tickets_sub: Option<Subscription>,
    torn_down: bool,

    input_handler: InputHandler,
}

impl App {
    pub fn new(
        gateways: Gateways,
        log_buffer: LogBuffer,
        event_tx: mpsc::UnboundedSender<AppEvent>,
    ) -> Self {
        Self {
            state: DashboardState::default(),
            route: Route::default(),
            session: None,
            tickets: Vec::new(),
            selected: None,
            modal: None,
            toast: None,
            should_quit: false,
            start_time: Instant::now(),
            log_buffer,
            gateways,
            event_tx,
            session_sub: None,
            tickets_sub: None,
            torn_down: false,
            input_handler: InputHandler::default(),
        }
    }

    /// Start the session subscription. Until its first delivery the
    /// dashboard stays in AwaitingSession.
    pub fn activate(&mut self) {
        let tx = self.event_tx.clone();
        let sub = self.gateways.session.subscribe(Box::new(move |session| {
            let _ = tx.send(AppEvent::SessionChanged(session));
        }));
        self.session_sub = Some(sub);
    }

    pub fn handle_event(&mut self, event: AppEvent) {
        if self.torn_down {
            return;
        }
        match event {
            AppEvent::SessionChanged(session) => self.on_session(session),
            AppEvent::TicketSnapshot(result) => match result {
                Ok(tickets) => self.on_snapshot(tickets),
                Err(e) => {
                    tracing::error!("Live query error: {}", e);
                    self.show_toast("✗ Live query error");
                }
            },
            AppEvent::SubmitFinished(result) => match result {
                Ok(ticket) => {
                    tracing::info!(id = %ticket.id, "Ticket created");
                    if matches!(self.modal, Some(Modal::CreateTicket(_))) {
                        self.modal = None;
                    }
                    self.show_toast("✓ Ticket created");
                }
                Err(e) => {
                    tracing::error!("Ticket submission failed: {}", e);
                    if let Some(form) = self.modal.as_mut().and_then(Modal::form_mut) {
                        form.submit_failed();
                    }
                    self.show_toast(&format!("✗ {}", e));
                }
            },
            AppEvent::SignOutFinished(result) => {
                if let Err(e) = result {
                    tracing::error!("Error logging out: {}", e);
                    self.show_toast("✗ Error logging out");
                }
            }
        }
    }

    fn on_session(&mut self, session: Option<Session>) {
        match session {
            None => {
                // No user: cancel the live query and drop everything
                // derived from the old session before redirecting
                if let Some(sub) = self.tickets_sub.take() {
                    sub.cancel();
                }
                self.tickets.clear();
                self.selected = None;
                self.session = None;
                self.modal = None;
                self.state = DashboardState::Redirecting;
                self.route = Route::Login;
            }
            Some(session) => {
                let changed_user = self
                    .session
                    .as_ref()
                    .map(|current| current.uid != session.uid)
                    .unwrap_or(true);
                self.session = Some(session.clone());
                self.state = DashboardState::Authenticated;
                self.route = Route::Dashboard;
                if changed_user {
                    self.subscribe_tickets(&session.uid);
                }
            }
        }
    }

    fn subscribe_tickets(&mut self, owner: &str) {
        if let Some(old) = self.tickets_sub.take() {
            old.cancel();
        }
        self.tickets.clear();
        self.selected = None;

        let tx = self.event_tx.clone();
        let sub = self.gateways.store.subscribe_tickets(
            owner,
            Box::new(move |snapshot: SnapshotResult| {
                let _ = tx.send(AppEvent::TicketSnapshot(snapshot));
            }),
        );
        self.tickets_sub = Some(sub);
    }

    /// Snapshot semantics: each delivery replaces the whole collection
    fn on_snapshot(&mut self, tickets: Vec<Ticket>) {
        if self.state != DashboardState::Authenticated {
            return;
        }
        self.tickets = tickets;
        self.selected = match self.selected {
            _ if self.tickets.is_empty() => None,
            Some(i) => Some(i.min(self.tickets.len() - 1)),
            None => Some(0),
        };
    }

    pub fn open_create_form(&mut self) {
        if self.state == DashboardState::Authenticated && self.modal.is_none() {
            self.modal = Some(Modal::create_ticket());
        }
    }

    pub fn close_modal(&mut self) {
        self.modal = None;
    }

    /// Run the submission for the open form; results come back as a
    /// SubmitFinished event
    pub fn submit_form(&mut self) {
        let Some(session) = self.session.clone() else {
            return;
        };
        let Some(Modal::CreateTicket(form)) = &self.modal else {
            return;
        };
        let draft = form.draft();
        let attachment_path = form.attachment_path().map(str::to_string);

        let store = self.gateways.store.clone();
        let tx = self.event_tx.clone();
        tokio::spawn(async move {
            let result = async {
                let attachment = match attachment_path {
                    Some(path) => Some(load_attachment(&path).await?),
                    None => None,
                };
                store.create_ticket(draft, attachment, &session.uid).await
            }
            .await;
            let _ = tx.send(AppEvent::SubmitFinished(result));
        });
    }

    pub fn request_sign_out(&mut self) {
        if self.state != DashboardState::Authenticated {
            return;
        }
        let session = self.gateways.session.clone();
        let tx = self.event_tx.clone();
        tokio::spawn(async move {
            let result = session.sign_out().await;
            let _ = tx.send(AppEvent::SignOutFinished(result));
        });
    }

    /// Cancel both subscriptions; no callback fires after this returns
    pub fn teardown(&mut self) {
        if let Some(sub) = self.tickets_sub.take() {
            sub.cancel();
        }
        if let Some(sub) = self.session_sub.take() {
            sub.cancel();
        }
        self.torn_down = true;
    }

    pub fn select_previous(&mut self) {
        if self.tickets.is_empty() {
            return;
        }
        self.selected = Some(match self.selected {
            Some(i) if i > 0 => i - 1,
            _ => 0,
        });
    }

    pub fn select_next(&mut self) {
        if self.tickets.is_empty() {
            return;
        }
        let last = self.tickets.len() - 1;
        self.selected = Some(match self.selected {
            Some(i) => (i + 1).min(last),
            None => 0,
        });
    }

    pub fn show_toast(&mut self, message: &str) {
        self.toast = Some(Toast {
            message: message.to_string(),
            expires_at: Instant::now() + TOAST_DURATION,
        });
    }

    pub fn clear_expired_toast(&mut self) {
        if let Some(toast) = &self.toast {
            if Instant::now() >= toast.expires_at {
                self.toast = None;
            }
        }
    }

    pub fn handle_key_press(&mut self, key: crossterm::event::KeyCode) -> bool {
        self.input_handler.handle_key_press(key)
    }

    pub fn handle_key_release(&mut self, key: crossterm::event::KeyCode) {
        self.input_handler.handle_key_release(key)
    }

    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }
}

impl Drop for App {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Read an attachment from disk. The upload itself happens in the
/// gateway; this only stages the bytes.
async fn load_attachment(path: &str) -> Result<Attachment, GatewayError> {
    let file_name = Path::new(path)
        .file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .ok_or_else(|| GatewayError::Upload(format!("not a file path: {path}")))?;
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| GatewayError::Upload(format!("could not read {path}: {e}")))?;
    Ok(Attachment {
        file_name,
        bytes: bytes.into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::memory::MemoryBackend;
    use crate::ticket::{Category, Priority, TicketDraft};
    use crate::tui::form::{Field, FormState};
    use crossterm::event::KeyCode;
    use tokio::sync::mpsc::UnboundedReceiver;

    fn harness() -> (App, Arc<MemoryBackend>, UnboundedReceiver<AppEvent>) {
        let backend = MemoryBackend::new();
        let gateways = Gateways {
            session: backend.clone(),
            store: backend.clone(),
        };
        let (tx, rx) = mpsc::unbounded_channel();
        let mut app = App::new(gateways, LogBuffer::new(), tx);
        app.activate();
        (app, backend, rx)
    }

    /// Drain every event currently queued into the app
    fn pump(app: &mut App, rx: &mut UnboundedReceiver<AppEvent>) {
        while let Ok(event) = rx.try_recv() {
            app.handle_event(event);
        }
    }

    /// Wait for background deliveries to go quiet, applying each one
    async fn settle(app: &mut App, rx: &mut UnboundedReceiver<AppEvent>) {
        loop {
            match tokio::time::timeout(Duration::from_millis(100), rx.recv()).await {
                Ok(Some(event)) => app.handle_event(event),
                _ => return,
            }
        }
    }

    fn sign_in(backend: &MemoryBackend, uid: &str) {
        backend.sign_in(Session {
            uid: uid.to_string(),
            email: Some(format!("{uid}@example.com")),
        });
    }

    fn valid_draft() -> TicketDraft {
        TicketDraft {
            title: "Screen flickers".to_string(),
            description: "Started after the update".to_string(),
            priority: Priority::High,
            category: Category::Technical,
            contact_email: "user@example.com".to_string(),
            contact_phone: None,
        }
    }

    fn fill_form(app: &mut App) {
        let form = app.modal.as_mut().and_then(Modal::form_mut).unwrap();
        let draft = valid_draft();
        form.title = draft.title;
        form.description = draft.description;
        form.contact_email = draft.contact_email;
        form.focus = Field::Submit;
    }

    #[tokio::test]
    async fn no_session_redirects_to_login() {
        let (mut app, _backend, mut rx) = harness();
        assert_eq!(app.state, DashboardState::AwaitingSession);

        settle(&mut app, &mut rx).await;
        assert_eq!(app.state, DashboardState::Redirecting);
        assert_eq!(app.route, Route::Login);
    }

    #[tokio::test]
    async fn session_authenticates_and_loads_tickets() {
        let (mut app, backend, mut rx) = harness();
        backend
            .create_ticket(valid_draft(), None, "user-1")
            .await
            .unwrap();
        sign_in(&backend, "user-1");

        settle(&mut app, &mut rx).await;
        assert_eq!(app.state, DashboardState::Authenticated);
        assert_eq!(app.route, Route::Dashboard);
        assert_eq!(app.tickets.len(), 1);
        assert_eq!(app.selected, Some(0));
    }

    #[tokio::test]
    async fn dashboard_never_shows_another_users_tickets() {
        let (mut app, backend, mut rx) = harness();
        backend
            .create_ticket(valid_draft(), None, "user-1")
            .await
            .unwrap();
        backend
            .create_ticket(valid_draft(), None, "user-2")
            .await
            .unwrap();
        sign_in(&backend, "user-1");

        settle(&mut app, &mut rx).await;
        assert_eq!(app.tickets.len(), 1);
        assert!(app.tickets.iter().all(|t| t.created_by == "user-1"));
    }

    #[tokio::test]
    async fn sign_out_cancels_query_and_clears_state() {
        let (mut app, backend, mut rx) = harness();
        backend
            .create_ticket(valid_draft(), None, "user-1")
            .await
            .unwrap();
        sign_in(&backend, "user-1");
        settle(&mut app, &mut rx).await;
        assert_eq!(app.tickets.len(), 1);

        app.request_sign_out();
        settle(&mut app, &mut rx).await;

        assert_eq!(app.state, DashboardState::Redirecting);
        assert_eq!(app.route, Route::Login);
        assert!(app.tickets.is_empty());
        assert!(app.session.is_none());

        // The old subscription must not deliver after teardown
        backend
            .create_ticket(valid_draft(), None, "user-1")
            .await
            .unwrap();
        settle(&mut app, &mut rx).await;
        assert!(app.tickets.is_empty());
    }

    #[tokio::test]
    async fn form_submission_creates_ticket_and_closes_modal() {
        let (mut app, backend, mut rx) = harness();
        sign_in(&backend, "user-1");
        settle(&mut app, &mut rx).await;

        app.open_create_form();
        fill_form(&mut app);
        let form = app.modal.as_mut().and_then(Modal::form_mut).unwrap();
        form.handle_key(KeyCode::Enter);
        assert!(form.is_submitting());

        app.submit_form();
        settle(&mut app, &mut rx).await;

        assert!(app.modal.is_none());
        assert_eq!(backend.ticket_count(), 1);
        assert_eq!(app.tickets.len(), 1);
        assert_eq!(app.toast.as_ref().unwrap().message, "✓ Ticket created");
    }

    #[tokio::test]
    async fn failed_write_reopens_editing_and_stores_nothing() {
        let (mut app, backend, mut rx) = harness();
        sign_in(&backend, "user-1");
        settle(&mut app, &mut rx).await;

        backend.set_fail_writes(true);
        app.open_create_form();
        fill_form(&mut app);
        let form = app.modal.as_mut().and_then(Modal::form_mut).unwrap();
        form.handle_key(KeyCode::Enter);
        app.submit_form();
        settle(&mut app, &mut rx).await;

        let form = app.modal.as_mut().and_then(Modal::form_mut).unwrap();
        assert_eq!(form.state, FormState::Editing);
        assert_eq!(form.title, "Screen flickers");
        assert_eq!(backend.ticket_count(), 0);
        assert!(app.toast.is_some());
    }

    #[tokio::test]
    async fn teardown_stops_all_callbacks() {
        let (mut app, backend, mut rx) = harness();
        sign_in(&backend, "user-1");
        settle(&mut app, &mut rx).await;
        assert_eq!(app.state, DashboardState::Authenticated);

        app.teardown();
        backend.sign_out().await.unwrap();
        backend
            .create_ticket(valid_draft(), None, "user-1")
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        pump(&mut app, &mut rx);

        // Still Authenticated: nothing was applied after teardown
        assert_eq!(app.state, DashboardState::Authenticated);
    }

    #[tokio::test]
    async fn sign_out_failure_keeps_dashboard_and_toasts() {
        let (mut app, backend, mut rx) = harness();
        sign_in(&backend, "user-1");
        settle(&mut app, &mut rx).await;

        backend.set_fail_sign_out(true);
        app.request_sign_out();
        settle(&mut app, &mut rx).await;

        assert_eq!(app.state, DashboardState::Authenticated);
        assert_eq!(app.route, Route::Dashboard);
        assert!(app.session.is_some());
        assert_eq!(app.toast.as_ref().unwrap().message, "✗ Error logging out");
    }

    #[tokio::test]
    async fn open_form_requires_authentication() {
        let (mut app, _backend, mut rx) = harness();
        settle(&mut app, &mut rx).await;
        assert_eq!(app.state, DashboardState::Redirecting);

        app.open_create_form();
        assert!(app.modal.is_none());
    }
}
