//! Per-visitor state.
//!
//! Every page load opens a fresh visitor with its own plan selection and
//! notification slot; the id travels in a cookie. Visitors idle for longer
//! than the configured window are dropped the next time one is opened.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use rand::{distributions::Alphanumeric, Rng};
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

use crate::notify::NotificationCenter;
use crate::plans::PlanSelector;

pub type VisitorId = String;

const VISITOR_ID_LEN: usize = 32;

/// One browser tab's view of the site.
#[derive(Debug)]
pub struct Visitor {
    pub plans: RwLock<PlanSelector>,
    pub notifications: NotificationCenter,
}

#[derive(Debug)]
struct Session {
    visitor: Arc<Visitor>,
    last_seen: Instant,
}

#[derive(Debug)]
pub struct VisitorRegistry {
    sessions: RwLock<HashMap<VisitorId, Session>>,
    initial_plan: PlanSelector,
    notification_ttl: Duration,
    idle_timeout: Duration,
}

impl VisitorRegistry {
    pub fn new(initial_plan: PlanSelector, notification_ttl: Duration, idle_timeout: Duration) -> Self {
        VisitorRegistry {
            sessions: RwLock::new(HashMap::new()),
            initial_plan,
            notification_ttl,
            idle_timeout,
        }
    }

    /// Start a visitor with the default plan and an empty notification slot.
    pub async fn open(&self) -> (VisitorId, Arc<Visitor>) {
        let visitor = Arc::new(Visitor {
            plans: RwLock::new(self.initial_plan.clone()),
            notifications: NotificationCenter::new(self.notification_ttl),
        });
        let id = generate_visitor_id();
        let now = Instant::now();

        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| now.duration_since(s.last_seen) < self.idle_timeout);
        if sessions.len() < before {
            debug!(dropped = before - sessions.len(), "idle visitors dropped");
        }
        sessions.insert(
            id.clone(),
            Session {
                visitor: Arc::clone(&visitor),
                last_seen: now,
            },
        );
        (id, visitor)
    }

    /// The visitor behind `id`, or a new one when the id is unknown or has
    /// gone idle.
    pub async fn resolve(&self, id: Option<&str>) -> (VisitorId, Arc<Visitor>) {
        if let Some(id) = id {
            let now = Instant::now();
            let mut sessions = self.sessions.write().await;
            if let Some(session) = sessions.get_mut(id) {
                if now.duration_since(session.last_seen) < self.idle_timeout {
                    session.last_seen = now;
                    return (id.to_string(), Arc::clone(&session.visitor));
                }
                sessions.remove(id);
            }
        }
        self.open().await
    }
}

fn generate_visitor_id() -> VisitorId {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(VISITOR_ID_LEN)
        .map(char::from)
        .collect()
}
