//! Shared doubles for exercising the network-facing components.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Arc, Mutex};

use tokio::sync::{mpsc, oneshot};

use crate::transport::{Transport, TransportError, WriteTarget};
use crate::warning::{Warning, WarningPresenter};

/// Answers each write immediately from a scripted result queue (success
/// once the script runs out) and records every request.
pub struct InstantTransport {
    requests: Mutex<Vec<(WriteTarget, serde_json::Value)>>,
    script: Mutex<VecDeque<Result<(), TransportError>>>,
}

impl InstantTransport {
    pub fn new() -> Arc<Self> {
        Self::scripted(Vec::new())
    }

    pub fn scripted(results: Vec<Result<(), TransportError>>) -> Arc<Self> {
        Arc::new(Self {
            requests: Mutex::new(Vec::new()),
            script: Mutex::new(results.into()),
        })
    }

    pub fn recorded(&self) -> Vec<(WriteTarget, serde_json::Value)> {
        self.requests.lock().unwrap().clone()
    }
}

impl Transport for InstantTransport {
    fn write(
        &self,
        target: WriteTarget,
        payload: serde_json::Value,
    ) -> impl Future<Output = Result<(), TransportError>> + Send {
        self.requests.lock().unwrap().push((target, payload));
        let result = self.script.lock().unwrap().pop_front().unwrap_or(Ok(()));
        async move { result }
    }
}

type Gate = oneshot::Sender<Result<(), TransportError>>;

/// Records requests and keeps each write in flight until the test releases
/// its gate, pinning down what happens while a request is outstanding.
pub struct ManualTransport {
    requests: Mutex<Vec<(WriteTarget, serde_json::Value)>>,
    gates: mpsc::UnboundedSender<Gate>,
}

impl ManualTransport {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<Gate>) {
        let (gates, gate_rx) = mpsc::unbounded_channel();
        (
            Arc::new(Self {
                requests: Mutex::new(Vec::new()),
                gates,
            }),
            gate_rx,
        )
    }

    pub fn recorded(&self) -> Vec<(WriteTarget, serde_json::Value)> {
        self.requests.lock().unwrap().clone()
    }
}

impl Transport for ManualTransport {
    fn write(
        &self,
        target: WriteTarget,
        payload: serde_json::Value,
    ) -> impl Future<Output = Result<(), TransportError>> + Send {
        self.requests.lock().unwrap().push((target, payload));
        let (reply_tx, reply_rx) = oneshot::channel();
        let _ = self.gates.send(reply_tx);
        async move { reply_rx.await.expect("test dropped the gate") }
    }
}

/// Replays show/hide calls so tests can assert on the visible set.
#[derive(Default)]
pub struct RecordingWarnings {
    events: Mutex<Vec<(Warning, bool)>>,
}

impl RecordingWarnings {
    pub fn is_shown(&self, warning: Warning) -> bool {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|(w, _)| *w == warning)
            .next_back()
            .is_some_and(|(_, visible)| *visible)
    }

    pub fn events(&self) -> Vec<(Warning, bool)> {
        self.events.lock().unwrap().clone()
    }
}

impl WarningPresenter for RecordingWarnings {
    fn show_warning(&self, warning: Warning) {
        self.events.lock().unwrap().push((warning, true));
    }

    fn hide_warning(&self, warning: Warning) {
        self.events.lock().unwrap().push((warning, false));
    }
}

/// Urls carried by a read-action payload.
pub fn payload_urls(payload: &serde_json::Value) -> Vec<String> {
    payload["references"]
        .as_array()
        .expect("read payload has a references array")
        .iter()
        .map(|v| v.as_str().expect("url is a string").to_string())
        .collect()
}
