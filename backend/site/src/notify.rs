//! Transient toast notifications.
//!
//! Every flow reports its outcome as a [`Notice`]. The [`NotificationCenter`]
//! keeps at most one of them visible: posting a new notice removes the
//! current one first, and each notice dismisses itself once its TTL elapses.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Success,
    Error,
}

/// An outcome message produced by a flow, before it is posted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub message: String,
    pub severity: Severity,
    /// Download the page should start alongside the toast.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Notice {
            message: message.into(),
            severity: Severity::Success,
            link: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Notice {
            message: message.into(),
            severity: Severity::Error,
            link: None,
        }
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }
}

/// A posted notice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub id: u64,
    #[serde(flatten)]
    pub notice: Notice,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Slot {
    next_id: u64,
    current: Option<Notification>,
}

#[derive(Debug, Clone)]
pub struct NotificationCenter {
    slot: Arc<RwLock<Slot>>,
    ttl: Duration,
}

impl NotificationCenter {
    pub fn new(ttl: Duration) -> Self {
        NotificationCenter {
            slot: Arc::new(RwLock::new(Slot::default())),
            ttl,
        }
    }

    /// Replace the visible notification with `notice` and schedule its
    /// dismissal.
    pub async fn push(&self, notice: Notice) -> Notification {
        let notification = {
            let mut slot = self.slot.write().await;
            if let Some(previous) = slot.current.take() {
                debug!(id = previous.id, "notification replaced");
            }
            slot.next_id += 1;
            let notification = Notification {
                id: slot.next_id,
                notice,
                created_at: Utc::now(),
            };
            slot.current = Some(notification.clone());
            notification
        };

        let slot = Arc::clone(&self.slot);
        let id = notification.id;
        let ttl = self.ttl;
        tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            let mut slot = slot.write().await;
            // A newer notification owns the slot now; leave it alone.
            if slot.current.as_ref().map(|n| n.id) == Some(id) {
                slot.current = None;
                debug!(id, "notification dismissed");
            }
        });

        notification
    }

    pub async fn current(&self) -> Option<Notification> {
        self.slot.read().await.current.clone()
    }
}
