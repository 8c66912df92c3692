//! Drag-and-drop data exchange at the toolkit boundary.
//!
//! Payload metadata (name, byte size, content type) can be slow to obtain
//! from the platform, so the source is a trait the bridge queries off the UI
//! thread. Access tokens are minted only when content is actually dropped.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DragFile {
    pub name: String,
    pub size: u64,
    pub content_type: String,
}

/// Source of the files being dragged over a view.
pub trait DragDataSource: Send + Sync {
    /// May block on IO; the bridge never calls it on the UI thread.
    fn files(&self) -> Vec<DragFile>;
}

#[derive(Clone)]
pub struct DragContent {
    pub source: Arc<dyn DragDataSource>,
}

impl DragContent {
    pub fn from_files(files: Vec<DragFile>) -> DragContent {
        DragContent {
            source: Arc::new(StaticFiles(files)),
        }
    }
}

struct StaticFiles(Vec<DragFile>);

impl DragDataSource for StaticFiles {
    fn files(&self) -> Vec<DragFile> {
        self.0.clone()
    }
}

/// Grants the remote side durable access to dropped files via opaque tokens.
#[derive(Default)]
pub struct AccessList {
    grants: Mutex<HashMap<String, String>>,
    next: AtomicU64,
}

impl AccessList {
    pub fn new() -> AccessList {
        AccessList::default()
    }

    pub fn grant(&self, file_name: &str) -> String {
        let token = format!("casement-access:{}", self.next.fetch_add(1, Ordering::Relaxed));
        self.grants
            .lock()
            .insert(token.clone(), file_name.to_string());
        token
    }

    pub fn lookup(&self, token: &str) -> Option<String> {
        self.grants.lock().get(token).cloned()
    }

    pub fn len(&self) -> usize {
        self.grants.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.grants.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grant_and_lookup() {
        let list = AccessList::new();
        let token = list.grant("report.pdf");
        assert_eq!(list.lookup(&token).as_deref(), Some("report.pdf"));
        assert_eq!(list.lookup("casement-access:999"), None);
    }

    #[test]
    fn test_tokens_are_unique() {
        let list = AccessList::new();
        let a = list.grant("a.txt");
        let b = list.grant("a.txt");
        assert_ne!(a, b);
        assert_eq!(list.len(), 2);
    }
}
