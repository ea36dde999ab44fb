// Hosted backend client - production implementation of both gateways
//
// The platform exposes a small HTTPS API rooted at the configured auth
// domain; all endpoints take the project API key as a `key` query
// parameter and the session token as a bearer credential:
//
//   GET  /v1/projects/{project}/session                 -> {uid, email}
//   POST /v1/projects/{project}/session:signOut         -> 200
//   POST /v1/projects/{project}/tickets                 -> {id}
//   GET  /v1/projects/{project}/tickets?createdBy={uid} -> {tickets: [..]}
//   POST /v1/buckets/{bucket}/blobs/{path}              -> {url}
//
// The session credential is written by the sign-in surface (out of scope
// here) to ~/.config/tickwatch/session.json; this client only consumes
// and revokes it. Live queries are driven by an interval poll that emits
// a snapshot whenever the result set changes.

use super::{
    Attachment, GatewayError, Session, SessionCallback, SessionGateway, SnapshotCallback,
    Subscription, TicketStore, ATTACHMENT_PREFIX,
};
use crate::config::BackendConfig;
use crate::ticket::{Category, Priority, Ticket, TicketDraft, STATUS_OPEN};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Stored credential as written by the sign-in surface
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredCredential {
    uid: String,
    email: Option<String>,
    token: String,
}

/// Wire shape of a ticket record insert (id is store-assigned)
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NewTicketRecord<'a> {
    title: &'a str,
    description: &'a str,
    priority: Priority,
    category: Category,
    contact_email: &'a str,
    contact_phone: Option<&'a str>,
    attachment: Option<&'a str>,
    status: &'a str,
    created_by: &'a str,
    created_at: DateTime<Utc>,
    assigned_to: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct CreatedResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct BlobResponse {
    url: String,
}

#[derive(Debug, Deserialize)]
struct TicketsResponse {
    tickets: Vec<Ticket>,
}

#[derive(Debug, Deserialize)]
struct SessionResponse {
    uid: String,
    email: Option<String>,
}

pub struct HostedBackend {
    http: reqwest::Client,
    config: BackendConfig,
    poll_interval: Duration,
    session_path: PathBuf,
    session_tx: watch::Sender<Option<Session>>,
    /// Bearer credential for authenticated calls; cleared on sign-out
    token: std::sync::Mutex<Option<String>>,
}

impl HostedBackend {
    /// Initialize the backend connection: load the stored credential (if
    /// any), validate it against the session endpoint, and seed the
    /// session stream. A missing or stale credential is not an error -
    /// the stream simply starts at "no user".
    pub async fn connect(
        config: BackendConfig,
        poll_interval: Duration,
        session_path: PathBuf,
    ) -> Arc<Self> {
        let (session_tx, _) = watch::channel(None);
        let backend = Arc::new(Self {
            http: reqwest::Client::new(),
            config,
            poll_interval,
            session_path,
            session_tx,
            token: std::sync::Mutex::new(None),
        });

        match backend.load_credential().await {
            Some(credential) => match backend.lookup_session(&credential.token).await {
                Ok(session) => {
                    tracing::info!(uid = %session.uid, "Session restored");
                    *backend.token.lock().unwrap() = Some(credential.token);
                    let _ = backend.session_tx.send(Some(session));
                }
                Err(e) => {
                    tracing::warn!("Stored session rejected by backend: {}", e);
                }
            },
            None => {
                tracing::debug!("No stored session credential");
            }
        }

        backend
    }

    async fn load_credential(&self) -> Option<StoredCredential> {
        let raw = tokio::fs::read_to_string(&self.session_path).await.ok()?;
        match serde_json::from_str(&raw) {
            Ok(credential) => Some(credential),
            Err(e) => {
                tracing::warn!(
                    "Unreadable session file {}: {}",
                    self.session_path.display(),
                    e
                );
                None
            }
        }
    }

    fn project_url(&self, suffix: &str) -> String {
        format!(
            "https://{}/v1/projects/{}/{}",
            self.config.auth_domain, self.config.project_id, suffix
        )
    }

    fn blob_url(&self, path: &str) -> String {
        format!(
            "https://{}/v1/buckets/{}/blobs/{}",
            self.config.auth_domain, self.config.storage_bucket, path
        )
    }

    fn bearer(&self) -> Option<String> {
        self.token.lock().unwrap().clone()
    }

    async fn lookup_session(&self, token: &str) -> Result<Session, GatewayError> {
        let response = self
            .http
            .get(self.project_url("session"))
            .query(&[("key", self.config.api_key.as_str())])
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| GatewayError::Auth(e.to_string()))?
            .error_for_status()
            .map_err(|e| GatewayError::Auth(e.to_string()))?;
        let info: SessionResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::Auth(e.to_string()))?;
        Ok(Session {
            uid: info.uid,
            email: info.email,
        })
    }

    /// Upload one attachment and resolve its fetchable URL.
    /// Same-name uploads overwrite the prior blob on the backend side.
    async fn upload_attachment(&self, file: &Attachment) -> Result<String, GatewayError> {
        let path = format!("{}/{}", ATTACHMENT_PREFIX, file.file_name);
        let mut request = self
            .http
            .post(self.blob_url(&path))
            .query(&[("key", self.config.api_key.as_str())])
            .body(file.bytes.clone());
        if let Some(token) = self.bearer() {
            request = request.bearer_auth(token);
        }
        let response = request
            .send()
            .await
            .map_err(|e| GatewayError::Upload(e.to_string()))?
            .error_for_status()
            .map_err(|e| GatewayError::Upload(e.to_string()))?;
        let blob: BlobResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::Upload(e.to_string()))?;
        Ok(blob.url)
    }

}

#[async_trait]
impl SessionGateway for HostedBackend {
    fn subscribe(&self, on_change: SessionCallback) -> Subscription {
        super::forward_session_watch(self.session_tx.subscribe(), on_change)
    }

    async fn sign_out(&self) -> Result<(), GatewayError> {
        let Some(token) = self.bearer() else {
            // Nothing to revoke; subscribers already see "no user"
            return Ok(());
        };

        self.http
            .post(self.project_url("session:signOut"))
            .query(&[("key", self.config.api_key.as_str())])
            .bearer_auth(&token)
            .send()
            .await
            .map_err(|e| GatewayError::Auth(e.to_string()))?
            .error_for_status()
            .map_err(|e| GatewayError::Auth(e.to_string()))?;

        // Revoked remotely; clear local state and notify the stream
        *self.token.lock().unwrap() = None;
        if let Err(e) = tokio::fs::remove_file(&self.session_path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!("Could not remove session file: {}", e);
            }
        }
        let _ = self.session_tx.send(None);
        Ok(())
    }
}

#[async_trait]
impl TicketStore for HostedBackend {
    async fn create_ticket(
        &self,
        draft: TicketDraft,
        attachment: Option<Attachment>,
        created_by: &str,
    ) -> Result<Ticket, GatewayError> {
        // Upload first: the record is only written once the blob exists
        let attachment_url = match &attachment {
            Some(file) => Some(self.upload_attachment(file).await?),
            None => None,
        };

        let created_at = Utc::now();
        let record = NewTicketRecord {
            title: &draft.title,
            description: &draft.description,
            priority: draft.priority,
            category: draft.category,
            contact_email: &draft.contact_email,
            contact_phone: draft.contact_phone.as_deref(),
            attachment: attachment_url.as_deref(),
            status: STATUS_OPEN,
            created_by,
            created_at,
            assigned_to: None,
        };

        let mut request = self
            .http
            .post(self.project_url("tickets"))
            .query(&[("key", self.config.api_key.as_str())])
            .json(&record);
        if let Some(token) = self.bearer() {
            request = request.bearer_auth(token);
        }
        let response = request
            .send()
            .await
            .map_err(|e| GatewayError::Write(e.to_string()))?
            .error_for_status()
            .map_err(|e| GatewayError::Write(e.to_string()))?;
        let created: CreatedResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::Write(e.to_string()))?;

        Ok(Ticket {
            id: created.id,
            title: draft.title,
            description: draft.description,
            priority: draft.priority,
            category: draft.category,
            contact_email: draft.contact_email,
            contact_phone: draft.contact_phone,
            attachment: attachment_url,
            status: STATUS_OPEN.to_string(),
            created_by: created_by.to_string(),
            created_at,
            assigned_to: None,
        })
    }

    fn subscribe_tickets(&self, owner: &str, on_snapshot: SnapshotCallback) -> Subscription {
        let (sub, token) = Subscription::new();
        let owner = owner.to_string();
        let http = self.http.clone();
        let url = self.project_url("tickets");
        let api_key = self.config.api_key.clone();
        let bearer = self.bearer();
        let interval = self.poll_interval;

        let mut on_snapshot = on_snapshot;
        let handle = tokio::spawn(async move {
            let mut last: Option<Vec<Ticket>> = None;
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if token.is_cancelled() {
                    return;
                }

                let result = poll_once(&http, &url, &api_key, bearer.as_deref(), &owner).await;
                if token.is_cancelled() {
                    return;
                }
                match result {
                    Ok(set) => {
                        // Emit on first load and on any change thereafter
                        if last.as_ref() != Some(&set) {
                            last = Some(set.clone());
                            on_snapshot(Ok(set));
                        }
                    }
                    Err(e) => {
                        tracing::warn!(owner = %owner, "Live query poll failed: {}", e);
                        on_snapshot(Err(e));
                    }
                }
            }
        });
        sub.set_abort(handle.abort_handle());
        sub
    }
}

async fn poll_once(
    http: &reqwest::Client,
    url: &str,
    api_key: &str,
    bearer: Option<&str>,
    owner: &str,
) -> Result<Vec<Ticket>, GatewayError> {
    let mut request = http
        .get(url)
        .query(&[("key", api_key), ("createdBy", owner)]);
    if let Some(token) = bearer {
        request = request.bearer_auth(token);
    }
    let response = request
        .send()
        .await
        .map_err(|e| GatewayError::Subscription(e.to_string()))?
        .error_for_status()
        .map_err(|e| GatewayError::Subscription(e.to_string()))?;
    let body: TicketsResponse = response
        .json()
        .await
        .map_err(|e| GatewayError::Subscription(e.to_string()))?;
    Ok(body.tickets)
}
