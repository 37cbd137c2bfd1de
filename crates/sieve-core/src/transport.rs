//! The seam to the remote store: one write operation, two targets.

use std::future::Future;

use serde::Deserialize;
use thiserror::Error;

use crate::reference::ReferenceItem;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned HTTP {0}")]
    Status(u16),
    #[error("server rejected the write: {0}")]
    Rejected(String),
    #[error("malformed server reply: {0}")]
    Json(#[from] serde_json::Error),
}

/// Which remote resource a write is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteTarget {
    /// The sieve resource itself; accepts the read action.
    Sieve,
    /// The bookmark collection resource.
    Collection,
}

/// Performs authenticated writes against the remote store.
///
/// Implementations must be shareable across tasks; the returned futures are
/// `Send` so callers can run them on spawned tasks. Beyond success/failure
/// the reply body is not surfaced.
pub trait Transport: Send + Sync + 'static {
    fn write(
        &self,
        target: WriteTarget,
        payload: serde_json::Value,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;
}

/// In-band reply to a write: `{"status": "success", ...}` or an error
/// report.
#[derive(Debug, Deserialize)]
pub struct WriteAck {
    pub status: String,
    #[serde(default)]
    pub count: Option<u64>,
}

impl WriteAck {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

/// Build the read-state sync payload. Urls are sorted so the wire form is
/// stable regardless of queue iteration order.
pub fn read_payload(urls: &[String]) -> serde_json::Value {
    let mut references: Vec<&str> = urls.iter().map(String::as_str).collect();
    references.sort_unstable();
    serde_json::json!({ "action": "read", "references": references })
}

/// Build the bookmark payload for one reference.
pub fn bookmark_payload(item: &ReferenceItem) -> serde_json::Value {
    serde_json::json!({
        "url": item.url(),
        "title": item.title(),
        "source_url": item.source_url(),
        "source_title": item.source_title(),
    })
}
