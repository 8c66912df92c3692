//! Outbound event forwarding to the cross-boundary channel.

use std::collections::HashSet;
use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender, unbounded};
use parking_lot::RwLock;
use serde_json::Value;

use casement_core::Tag;

#[derive(Clone, Debug, PartialEq)]
pub struct UiEvent {
    pub tag: Tag,
    pub name: String,
    pub payload: Value,
}

/// Forwards structured events keyed by tag. One FIFO channel carries every
/// event, so per-tag ordering is the dispatch order. Events for tags that
/// have been removed are dropped: the remote side has already forgotten the
/// node and would not know what to do with them.
#[derive(Clone)]
pub struct EventDispatcher {
    tx: Sender<UiEvent>,
    live: Arc<RwLock<HashSet<Tag>>>,
}

impl EventDispatcher {
    pub fn channel() -> (EventDispatcher, Receiver<UiEvent>) {
        let (tx, rx) = unbounded();
        (
            EventDispatcher {
                tx,
                live: Arc::new(RwLock::new(HashSet::new())),
            },
            rx,
        )
    }

    pub fn register(&self, tag: Tag) {
        self.live.write().insert(tag);
    }

    pub fn unregister(&self, tag: Tag) {
        self.live.write().remove(&tag);
    }

    pub fn is_live(&self, tag: Tag) -> bool {
        self.live.read().contains(&tag)
    }

    pub fn dispatch(&self, event: UiEvent) {
        if !self.is_live(event.tag) {
            log::trace!("dropping event `{}` for removed tag {}", event.name, event.tag);
            return;
        }
        // A torn-down receiver just means nobody is listening anymore.
        let _ = self.tx.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_per_tag_order_is_preserved() {
        let (events, rx) = EventDispatcher::channel();
        let tag = Tag::new(5);
        events.register(tag);
        events.dispatch(UiEvent {
            tag,
            name: "topChange".into(),
            payload: json!({"value": 1}),
        });
        events.dispatch(UiEvent {
            tag,
            name: "topChange".into(),
            payload: json!({"value": 2}),
        });
        let seen: Vec<Value> = rx.try_iter().map(|e| e.payload).collect();
        assert_eq!(seen, vec![json!({"value": 1}), json!({"value": 2})]);
    }

    #[test]
    fn test_events_for_removed_tags_are_dropped() {
        let (events, rx) = EventDispatcher::channel();
        let tag = Tag::new(5);
        events.register(tag);
        events.unregister(tag);
        events.dispatch(UiEvent {
            tag,
            name: "topChange".into(),
            payload: Value::Null,
        });
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_unregistered_tag_is_never_live() {
        let (events, _rx) = EventDispatcher::channel();
        assert!(!events.is_live(Tag::new(1)));
    }
}
