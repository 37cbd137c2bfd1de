//! Reference items and the index-addressed registry they live in.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Deserialize;

/// Wire-side description of one feed reference, as served by the sieve
/// resource.
#[derive(Debug, Clone, Deserialize)]
pub struct ReferenceDescriptor {
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub source_url: String,
    #[serde(default)]
    pub source_title: String,
}

/// One feed entry being triaged.
///
/// Created once per sieve load; the `index` stays stable for the session.
/// Only the `read` and `saved` flags ever change, and `read` transitions
/// false→true exactly once.
#[derive(Debug)]
pub struct ReferenceItem {
    index: usize,
    url: String,
    title: String,
    source_url: String,
    source_title: String,
    read: AtomicBool,
    saved: AtomicBool,
}

impl ReferenceItem {
    pub fn new(index: usize, descriptor: ReferenceDescriptor) -> Self {
        Self {
            index,
            url: descriptor.url,
            title: descriptor.title,
            source_url: descriptor.source_url,
            source_title: descriptor.source_title,
            read: AtomicBool::new(false),
            saved: AtomicBool::new(false),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    pub fn source_title(&self) -> &str {
        &self.source_title
    }

    pub fn is_read(&self) -> bool {
        self.read.load(Ordering::SeqCst)
    }

    /// Flip the read flag. Returns true when this call performed the
    /// false→true transition, false when the item was already read.
    pub fn mark_read(&self) -> bool {
        !self.read.swap(true, Ordering::SeqCst)
    }

    pub fn is_saved(&self) -> bool {
        self.saved.load(Ordering::SeqCst)
    }

    pub fn mark_saved(&self) {
        self.saved.store(true, Ordering::SeqCst);
    }
}

/// The ordered list of references presented for sequential triage,
/// addressed by index.
pub struct Sieve {
    items: Vec<Arc<ReferenceItem>>,
}

impl Sieve {
    /// Build the registry from wire descriptors, assigning indices in
    /// served order.
    pub fn new(descriptors: Vec<ReferenceDescriptor>) -> Self {
        let items = descriptors
            .into_iter()
            .enumerate()
            .map(|(index, descriptor)| Arc::new(ReferenceItem::new(index, descriptor)))
            .collect();
        Self { items }
    }

    pub fn empty() -> Self {
        Self { items: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Arc<ReferenceItem>> {
        self.items.get(index)
    }

    pub fn items(&self) -> &[Arc<ReferenceItem>] {
        &self.items
    }

    /// Number of items marked read so far this session.
    pub fn read_count(&self) -> usize {
        self.items.iter().filter(|item| item.is_read()).count()
    }

    /// Number of items bookmarked so far this session.
    pub fn saved_count(&self) -> usize {
        self.items.iter().filter(|item| item.is_saved()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(url: &str) -> ReferenceDescriptor {
        ReferenceDescriptor {
            url: url.to_string(),
            title: format!("title of {url}"),
            source_url: "http://source.example".to_string(),
            source_title: "a source".to_string(),
        }
    }

    #[test]
    fn read_flag_transitions_once() {
        let item = ReferenceItem::new(0, descriptor("http://example.org/a"));
        assert!(!item.is_read());
        assert!(item.mark_read());
        assert!(item.is_read());
        // re-marking is a no-op
        assert!(!item.mark_read());
        assert!(item.is_read());
    }

    #[test]
    fn registry_indices_follow_served_order() {
        let sieve = Sieve::new(vec![descriptor("http://a"), descriptor("http://b")]);
        assert_eq!(sieve.len(), 2);
        assert_eq!(sieve.get(0).map(|i| i.url()), Some("http://a"));
        assert_eq!(sieve.get(1).map(|i| i.index()), Some(1));
        assert!(sieve.get(2).is_none());
    }

    #[test]
    fn counters_track_flags() {
        let sieve = Sieve::new(vec![descriptor("http://a"), descriptor("http://b")]);
        assert_eq!(sieve.read_count(), 0);
        sieve.get(0).unwrap().mark_read();
        sieve.get(1).unwrap().mark_saved();
        assert_eq!(sieve.read_count(), 1);
        assert_eq!(sieve.saved_count(), 1);
    }
}
