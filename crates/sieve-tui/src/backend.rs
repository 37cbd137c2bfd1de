use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use sieve_core::{
    FlushOutcome, HttpTransport, ReadStateSynchronizer, Warning, WarningPresenter,
};

use crate::tui_event::UiEvent;

/// Bridges core warning calls onto the UI event channel, so banners can be
/// raised from background flush/save tasks.
pub struct ChannelPresenter {
    tx: mpsc::UnboundedSender<UiEvent>,
}

impl ChannelPresenter {
    pub fn new(tx: mpsc::UnboundedSender<UiEvent>) -> Self {
        Self { tx }
    }
}

impl WarningPresenter for ChannelPresenter {
    fn show_warning(&self, warning: Warning) {
        let _ = self.tx.send(UiEvent::Warning {
            warning,
            visible: true,
        });
    }

    fn hide_warning(&self, warning: Warning) {
        let _ = self.tx.send(UiEvent::Warning {
            warning,
            visible: false,
        });
    }
}

/// Fetch the sieve and report the outcome to the UI loop.
pub async fn load_sieve(
    transport: Arc<HttpTransport>,
    tx: mpsc::UnboundedSender<UiEvent>,
    cancel: CancellationToken,
) {
    let result = tokio::select! {
        _ = cancel.cancelled() => return,
        result = transport.fetch_sieve() => result,
    };
    let event = match result {
        Ok(page) => UiEvent::SieveLoaded {
            descriptors: page.references,
            num_unread: page.num_unread_references,
        },
        Err(err) => UiEvent::SieveLoadFailed {
            error: err.to_string(),
        },
    };
    let _ = tx.send(event);
}

/// Drain pending read markers ahead of a reload.
pub async fn drain_for_reload(
    sync: Arc<ReadStateSynchronizer<HttpTransport>>,
    tx: mpsc::UnboundedSender<UiEvent>,
) {
    let ok = sync.drain().await != FlushOutcome::Failed;
    let _ = tx.send(UiEvent::DrainFinished { ok });
}
