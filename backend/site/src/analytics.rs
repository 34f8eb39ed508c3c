//! Optional fire-and-forget event tracking.

use reqwest::Client;
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackedEvent {
    pub event: &'static str,
    pub event_category: &'static str,
    pub event_label: &'static str,
}

impl TrackedEvent {
    pub fn sample_download() -> Self {
        TrackedEvent {
            event: "download",
            event_category: "pdf",
            event_label: "sample_report",
        }
    }
}

#[derive(Clone)]
pub struct Analytics {
    client: Client,
    url: Option<String>,
}

impl Analytics {
    pub fn new(client: Client, url: Option<String>) -> Self {
        Analytics { client, url }
    }

    pub fn is_enabled(&self) -> bool {
        self.url.is_some()
    }

    /// Send `event` in the background. Returns `false` when tracking is off.
    pub fn track(&self, event: TrackedEvent) -> bool {
        let Some(url) = self.url.clone() else {
            return false;
        };
        let client = self.client.clone();
        tokio::spawn(async move {
            match client.post(&url).json(&event).send().await {
                Ok(resp) => debug!(status = %resp.status(), event = event.event, "Analytics event sent"),
                Err(e) => debug!(event = event.event, "Analytics event dropped: {e}"),
            }
        });
        true
    }
}
