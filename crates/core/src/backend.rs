//! Analytics and support-ticket backend client.
//!
//! Everything here is fire-and-forget relative to the engine: requests
//! run on their own tokio tasks, failures are queued to a JSON file
//! and replayed in order on the next launch, and nothing in this
//! module can block a match mutation.

use std::{
    fs,
    path::{Path, PathBuf},
};

use chrono::Utc;
use parking_lot::Mutex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

const QUEUE_FILE: &str = "offline_queue.json";
const INSTANCE_FILE: &str = "instance_id";

/// Errors from talking to the backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The HTTP request failed or returned a non-success status.
    #[error("request to {path} failed: {source}")]
    Http {
        /// Relative request path.
        path: String,
        /// Underlying reqwest error.
        source: reqwest::Error,
    },
}

/// A request that failed while offline, kept for replay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueuedRequest {
    /// Queue entry id.
    pub id: String,
    /// Relative request path.
    pub path: String,
    /// JSON body to resend.
    pub body: Value,
}

/// Ordered, file-backed queue of requests awaiting replay.
pub struct OfflineQueue {
    path: PathBuf,
    items: Mutex<Vec<QueuedRequest>>,
}

impl OfflineQueue {
    /// Load the queue from `data_root`, starting empty when the file
    /// is missing or unreadable.
    pub fn new(data_root: impl AsRef<Path>) -> Self {
        let path = data_root.as_ref().join(QUEUE_FILE);
        let items = match fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|err| {
                warn!("discarding unreadable offline queue: {err}");
                Vec::new()
            }),
            Err(_) => Vec::new(),
        };
        Self {
            path,
            items: Mutex::new(items),
        }
    }

    /// Append a request for later replay.
    pub fn enqueue(&self, path: &str, body: Value) {
        let mut items = self.items.lock();
        items.push(QueuedRequest {
            id: Uuid::new_v4().to_string(),
            path: path.to_string(),
            body,
        });
        self.persist(&items);
    }

    /// Snapshot of the queued requests, oldest first.
    pub fn all(&self) -> Vec<QueuedRequest> {
        self.items.lock().clone()
    }

    /// Drop a replayed entry.
    pub fn remove(&self, id: &str) {
        let mut items = self.items.lock();
        items.retain(|item| item.id != id);
        self.persist(&items);
    }

    /// Number of pending entries.
    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn persist(&self, items: &[QueuedRequest]) {
        if let Some(parent) = self.path.parent() {
            if let Err(err) = fs::create_dir_all(parent) {
                warn!("offline queue not saved: {err}");
                return;
            }
        }
        match serde_json::to_vec_pretty(items) {
            Ok(bytes) => {
                if let Err(err) = fs::write(&self.path, bytes) {
                    warn!("offline queue not saved: {err}");
                }
            }
            Err(err) => warn!("offline queue not encoded: {err}"),
        }
    }
}

/// A support ticket as returned by the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupportTicket {
    /// Ticket id.
    pub id: String,
    /// Ticket category (support, suggestion, feature).
    pub ticket_type: String,
    /// User-entered message.
    pub message: String,
    /// Processing status.
    #[serde(default)]
    pub status: String,
    /// Creation timestamp, RFC 3339.
    #[serde(default)]
    pub created_at: String,
}

/// Runtime settings fetched at launch.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BootstrapConfig {
    /// Whether the running version must be updated.
    #[serde(default)]
    pub force_update_required: bool,
    /// Optional operator-supplied message shown to the user.
    #[serde(default)]
    pub force_update_message: Option<String>,
}

/// Thin HTTP client for the analytics/support backend.
pub struct BackendClient {
    http: Client,
    base_url: String,
    instance_id: String,
    queue: OfflineQueue,
}

impl BackendClient {
    /// Create a client rooted at `base_url`, with queue and instance
    /// id stored under `data_root`.
    pub fn new(base_url: impl Into<String>, data_root: impl AsRef<Path>) -> Self {
        let data_root = data_root.as_ref();
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            instance_id: load_or_create_instance_id(data_root),
            queue: OfflineQueue::new(data_root),
        }
    }

    /// Stable anonymous id for this installation.
    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    /// POST a JSON body to a relative path.
    pub async fn fire(&self, path: &str, body: &Value) -> Result<(), BackendError> {
        let url = format!("{}/{path}", self.base_url);
        let wrap = |source| BackendError::Http {
            path: path.to_string(),
            source,
        };
        self.http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(wrap)?
            .error_for_status()
            .map_err(wrap)?;
        Ok(())
    }

    /// Register or refresh this installation. Queued on failure.
    pub async fn register_instance(&self) {
        let body = json!({
            "instance_id": self.instance_id,
            "platform": "terminal",
            "os": std::env::consts::OS,
            "app_version": env!("CARGO_PKG_VERSION"),
        });
        self.fire_or_enqueue("register-instance", body).await;
    }

    /// Open a usage session, returning its id. Queued on failure.
    pub async fn session_start(&self) -> String {
        let session_id = Uuid::new_v4().to_string();
        let body = json!({
            "instance_id": self.instance_id,
            "session_id": session_id,
            "started_at": Utc::now().to_rfc3339(),
        });
        self.fire_or_enqueue("session/start", body).await;
        session_id
    }

    /// Close a usage session. Queued on failure.
    pub async fn session_end(&self, session_id: &str) {
        let body = json!({
            "instance_id": self.instance_id,
            "session_id": session_id,
            "ended_at": Utc::now().to_rfc3339(),
        });
        self.fire_or_enqueue("session/end", body).await;
    }

    /// Submit a support ticket. Not queued — the caller surfaces the
    /// failure so the user can retry with their text intact.
    pub async fn submit_ticket(&self, ticket_type: &str, message: &str) -> Result<(), BackendError> {
        let body = json!({
            "instance_id": self.instance_id,
            "type": ticket_type,
            "message": message,
        });
        self.fire("support-tickets", &body).await?;
        debug!(ticket_type, "support ticket submitted");
        Ok(())
    }

    /// Fetch tickets submitted from this installation.
    pub async fn list_tickets(&self) -> Result<Vec<SupportTicket>, BackendError> {
        let path = "support-tickets";
        let url = format!(
            "{}/{path}?instance_id={}",
            self.base_url, self.instance_id
        );
        let wrap = |source| BackendError::Http {
            path: path.to_string(),
            source,
        };
        let tickets = self
            .http
            .get(url)
            .send()
            .await
            .map_err(wrap)?
            .error_for_status()
            .map_err(wrap)?
            .json()
            .await
            .map_err(wrap)?;
        Ok(tickets)
    }

    /// Fetch runtime settings.
    pub async fn bootstrap_config(&self) -> Result<BootstrapConfig, BackendError> {
        let path = "bootstrap-config";
        let url = format!(
            "{}/{path}?app_version={}",
            self.base_url,
            env!("CARGO_PKG_VERSION")
        );
        let wrap = |source| BackendError::Http {
            path: path.to_string(),
            source,
        };
        let config = self
            .http
            .get(url)
            .send()
            .await
            .map_err(wrap)?
            .error_for_status()
            .map_err(wrap)?
            .json()
            .await
            .map_err(wrap)?;
        Ok(config)
    }

    /// Replay queued requests in order, stopping at the first failure
    /// so ordering is preserved for the next attempt.
    pub async fn drain_queue(&self) {
        let items = self.queue.all();
        if items.is_empty() {
            return;
        }
        debug!(count = items.len(), "draining offline queue");
        for item in items {
            match self.fire(&item.path, &item.body).await {
                Ok(()) => self.queue.remove(&item.id),
                Err(err) => {
                    debug!("queue replay stopped at {}: {err}", item.path);
                    break;
                }
            }
        }
    }

    /// Launch-time sync: replay the queue, refresh runtime settings,
    /// register, and open a session. Never fails; returns the session
    /// id to close on exit.
    pub async fn launch_sync(&self) -> String {
        self.drain_queue().await;
        match self.bootstrap_config().await {
            Ok(config) if config.force_update_required => {
                warn!(
                    "backend requests an update: {}",
                    config.force_update_message.as_deref().unwrap_or("")
                );
            }
            Ok(_) => {}
            Err(err) => debug!("bootstrap config unavailable: {err}"),
        }
        self.register_instance().await;
        self.session_start().await
    }

    async fn fire_or_enqueue(&self, path: &str, body: Value) {
        if let Err(err) = self.fire(path, &body).await {
            debug!("{path} queued for retry: {err}");
            self.queue.enqueue(path, body);
        }
    }
}

fn load_or_create_instance_id(data_root: &Path) -> String {
    let path = data_root.join(INSTANCE_FILE);
    if let Ok(existing) = fs::read_to_string(&path) {
        let existing = existing.trim();
        if Uuid::parse_str(existing).is_ok() {
            return existing.to_string();
        }
    }
    let created = Uuid::new_v4().to_string();
    if let Err(err) = fs::create_dir_all(data_root) {
        warn!("instance id not saved: {err}");
        return created;
    }
    if let Err(err) = fs::write(&path, &created) {
        warn!("instance id not saved: {err}");
    }
    created
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn queue_preserves_order_across_reload() {
        let dir = tempdir().unwrap();
        let queue = OfflineQueue::new(dir.path());
        queue.enqueue("session/start", json!({"n": 1}));
        queue.enqueue("session/end", json!({"n": 2}));

        let reloaded = OfflineQueue::new(dir.path());
        let items = reloaded.all();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].path, "session/start");
        assert_eq!(items[1].path, "session/end");
    }

    #[test]
    fn queue_remove_drops_only_the_given_entry() {
        let dir = tempdir().unwrap();
        let queue = OfflineQueue::new(dir.path());
        queue.enqueue("a", json!({}));
        queue.enqueue("b", json!({}));
        let first = queue.all()[0].id.clone();
        queue.remove(&first);
        let items = queue.all();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].path, "b");
    }

    #[test]
    fn instance_id_is_stable() {
        let dir = tempdir().unwrap();
        let first = load_or_create_instance_id(dir.path());
        let second = load_or_create_instance_id(dir.path());
        assert_eq!(first, second);
        assert!(Uuid::parse_str(&first).is_ok());
    }

    #[test]
    fn corrupt_queue_starts_empty() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(QUEUE_FILE), b"][").unwrap();
        let queue = OfflineQueue::new(dir.path());
        assert!(queue.is_empty());
    }
}
