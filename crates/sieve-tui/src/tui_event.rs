use sieve_core::{ReferenceDescriptor, Warning};

/// Events flowing from background tasks to the UI loop.
#[derive(Debug)]
pub enum UiEvent {
    /// The sieve content arrived from the server.
    SieveLoaded {
        descriptors: Vec<ReferenceDescriptor>,
        num_unread: u64,
    },
    /// The sieve fetch failed.
    SieveLoadFailed { error: String },
    /// A warning banner changed visibility.
    Warning { warning: Warning, visible: bool },
    /// The pre-reload drain settled; re-fetch may proceed on success.
    DrainFinished { ok: bool },
}
