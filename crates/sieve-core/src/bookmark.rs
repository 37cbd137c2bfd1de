//! One-shot bookmark saves to the remote collection.

use std::sync::Arc;

use crate::reference::ReferenceItem;
use crate::transport::{Transport, WriteTarget, bookmark_payload};
use crate::warning::{Warning, WarningPresenter};

/// What a save call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The item is now in the remote collection.
    Saved,
    /// The item was saved earlier; nothing was sent.
    AlreadySaved,
    /// The write failed; the save warning is up and the flag stays unset.
    Failed,
}

/// Saves references to the remote bookmark collection, one attempt per
/// user action: no retry, no queueing.
pub struct BookmarkSaver<T: Transport> {
    transport: Arc<T>,
    warnings: Arc<dyn WarningPresenter>,
}

impl<T: Transport> BookmarkSaver<T> {
    pub fn new(transport: Arc<T>, warnings: Arc<dyn WarningPresenter>) -> Self {
        Self {
            transport,
            warnings,
        }
    }

    /// Save `item` to the collection. Idempotent per item: a no-op once the
    /// saved flag is set.
    pub async fn save(&self, item: &ReferenceItem) -> SaveOutcome {
        if item.is_saved() {
            return SaveOutcome::AlreadySaved;
        }
        let result = self
            .transport
            .write(WriteTarget::Collection, bookmark_payload(item))
            .await;
        match result {
            Ok(()) => {
                item.mark_saved();
                self.warnings.hide_warning(Warning::SaveFailed);
                SaveOutcome::Saved
            }
            Err(err) => {
                log::warn!("bookmark save failed for {}: {err}", item.url());
                self.warnings.show_warning(Warning::SaveFailed);
                SaveOutcome::Failed
            }
        }
    }

    /// Run `save` on a background task (fire-and-forget for UI callers).
    pub fn save_detached(self: Arc<Self>, item: &Arc<ReferenceItem>) {
        let item = Arc::clone(item);
        tokio::spawn(async move {
            self.save(&item).await;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::ReferenceDescriptor;
    use crate::testutil::{InstantTransport, RecordingWarnings};
    use crate::transport::TransportError;

    fn item(url: &str) -> ReferenceItem {
        ReferenceItem::new(
            0,
            ReferenceDescriptor {
                url: url.to_string(),
                title: "a title".to_string(),
                source_url: "http://source".to_string(),
                source_title: "source".to_string(),
            },
        )
    }

    fn saver<T: Transport>(
        transport: &Arc<T>,
    ) -> (BookmarkSaver<T>, Arc<RecordingWarnings>) {
        let warnings = Arc::new(RecordingWarnings::default());
        (
            BookmarkSaver::new(
                Arc::clone(transport),
                warnings.clone() as Arc<dyn WarningPresenter>,
            ),
            warnings,
        )
    }

    #[tokio::test]
    async fn second_save_is_a_no_op() {
        let transport = InstantTransport::new();
        let (saver, _) = saver(&transport);
        let item = item("http://a");

        assert_eq!(saver.save(&item).await, SaveOutcome::Saved);
        assert!(item.is_saved());
        assert_eq!(saver.save(&item).await, SaveOutcome::AlreadySaved);
        // exactly one write went out
        assert_eq!(transport.recorded().len(), 1);
        assert_eq!(transport.recorded()[0].0, WriteTarget::Collection);
    }

    #[tokio::test]
    async fn failure_leaves_flag_unset_and_raises_warning() {
        let transport = InstantTransport::scripted(vec![Err(TransportError::Status(500))]);
        let (saver, warnings) = saver(&transport);
        let item = item("http://a");

        assert_eq!(saver.save(&item).await, SaveOutcome::Failed);
        assert!(!item.is_saved());
        assert!(warnings.is_shown(Warning::SaveFailed));

        // a repeated user action retries and clears the banner
        assert_eq!(saver.save(&item).await, SaveOutcome::Saved);
        assert!(item.is_saved());
        assert!(!warnings.is_shown(Warning::SaveFailed));
        assert_eq!(transport.recorded().len(), 2);
    }

    #[tokio::test]
    async fn rejected_reply_counts_as_failure() {
        let transport = InstantTransport::scripted(vec![Err(TransportError::Rejected(
            "error".to_string(),
        ))]);
        let (saver, warnings) = saver(&transport);
        let item = item("http://a");

        assert_eq!(saver.save(&item).await, SaveOutcome::Failed);
        assert!(!item.is_saved());
        assert!(warnings.is_shown(Warning::SaveFailed));
    }
}
