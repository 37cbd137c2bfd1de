//! Named warning banners raised when a remote write fails.

/// The warnings the core can raise or clear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Warning {
    /// A read-state sync write did not complete.
    SyncFailed,
    /// A bookmark save did not complete.
    SaveFailed,
}

impl Warning {
    /// Stable banner id, usable as a widget or element key.
    pub fn id(self) -> &'static str {
        match self {
            Warning::SyncFailed => "server-sync-problem",
            Warning::SaveFailed => "bookmark-save-problem",
        }
    }

    /// Banner text shown to the reader.
    pub fn message(self) -> &'static str {
        match self {
            Warning::SyncFailed => {
                "Syncing read items with the server failed; they are kept for a later retry."
            }
            Warning::SaveFailed => "Saving the bookmark failed; repeat the save to retry.",
        }
    }
}

/// Shows and hides named banners. Implemented by each frontend.
///
/// Calls may come from background tasks, so implementations must be shareable
/// across tasks (typically by forwarding onto an event channel).
pub trait WarningPresenter: Send + Sync {
    fn show_warning(&self, warning: Warning);
    fn hide_warning(&self, warning: Warning);
}
