//! The shadow tree: data-only nodes mirroring the declarative description.
//!
//! Shadow nodes never touch native views. They record declared properties and
//! ordered children, and receive computed layout boxes back from the layout
//! bridge. The native mirror is kept consistent by the UI manager, which
//! derives native mutations from the operations applied here.

use std::collections::HashMap;
use std::fmt;

use serde_json::Value;
use smallvec::SmallVec;

use crate::error::ShadowError;
use crate::geometry::Dimensions;

/// Identifies one logical UI element for its whole lifetime. Assigned by the
/// instruction channel; never reused while the node is live.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tag(i64);

impl Tag {
    pub const fn new(raw: i64) -> Tag {
        Tag(raw)
    }

    pub const fn raw(self) -> i64 {
        self.0
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug)]
pub struct ShadowNode {
    pub tag: Tag,
    /// View-manager class that materializes this node.
    pub class: String,
    pub parent: Option<Tag>,
    pub children: SmallVec<[Tag; 4]>,
    pub props: HashMap<String, Value>,
    pub layout: Dimensions,
    /// The node lays out its children itself; the flex engine's boxes for
    /// them are not published.
    pub needs_custom_layout: bool,
}

impl ShadowNode {
    fn new(tag: Tag, class: String) -> ShadowNode {
        ShadowNode {
            tag,
            class,
            parent: None,
            children: SmallVec::new(),
            props: HashMap::new(),
            layout: Dimensions::UNSET,
            needs_custom_layout: false,
        }
    }

    pub fn set_property(&mut self, name: &str, value: Value) {
        self.props.insert(name.to_string(), value);
    }
}

#[derive(Default)]
pub struct ShadowTree {
    nodes: HashMap<Tag, ShadowNode>,
}

impl ShadowTree {
    pub fn new() -> ShadowTree {
        ShadowTree::default()
    }

    pub fn create(&mut self, tag: Tag, class: &str) -> Result<&mut ShadowNode, ShadowError> {
        if self.nodes.contains_key(&tag) {
            return Err(ShadowError::DuplicateTag(tag));
        }
        Ok(self
            .nodes
            .entry(tag)
            .or_insert_with(|| ShadowNode::new(tag, class.to_string())))
    }

    pub fn contains(&self, tag: Tag) -> bool {
        self.nodes.contains_key(&tag)
    }

    pub fn get(&self, tag: Tag) -> Result<&ShadowNode, ShadowError> {
        self.nodes.get(&tag).ok_or(ShadowError::UnknownTag(tag))
    }

    pub fn get_mut(&mut self, tag: Tag) -> Result<&mut ShadowNode, ShadowError> {
        self.nodes.get_mut(&tag).ok_or(ShadowError::UnknownTag(tag))
    }

    pub fn insert_child(
        &mut self,
        parent: Tag,
        child: Tag,
        index: usize,
    ) -> Result<(), ShadowError> {
        if !self.contains(child) {
            return Err(ShadowError::UnknownTag(child));
        }
        let parent_node = self.get_mut(parent)?;
        if index > parent_node.children.len() {
            return Err(ShadowError::ChildIndexOutOfRange { parent, index });
        }
        parent_node.children.insert(index, child);
        self.get_mut(child)?.parent = Some(parent);
        Ok(())
    }

    /// Detaches the child at `index` without releasing it.
    pub fn remove_child_at(&mut self, parent: Tag, index: usize) -> Result<Tag, ShadowError> {
        let parent_node = self.get_mut(parent)?;
        if index >= parent_node.children.len() {
            return Err(ShadowError::ChildIndexOutOfRange { parent, index });
        }
        let child = parent_node.children.remove(index);
        self.get_mut(child)?.parent = None;
        Ok(child)
    }

    /// Removes `tag` and every descendant, detaching `tag` from its parent's
    /// child sequence. Returns the removed tags, children before parents, so
    /// callers can release native resources in a safe order.
    pub fn remove_subtree(&mut self, tag: Tag) -> Result<Vec<Tag>, ShadowError> {
        let parent = self.get(tag)?.parent;
        if let Some(parent) = parent {
            if let Ok(parent_node) = self.get_mut(parent) {
                parent_node.children.retain(|c| *c != tag);
            }
        }
        let mut removed = Vec::new();
        self.collect_subtree(tag, &mut removed);
        for removed_tag in &removed {
            self.nodes.remove(removed_tag);
        }
        Ok(removed)
    }

    fn collect_subtree(&self, tag: Tag, out: &mut Vec<Tag>) {
        if let Some(node) = self.nodes.get(&tag) {
            for child in &node.children {
                self.collect_subtree(*child, out);
            }
            out.push(tag);
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn tags(&self) -> impl Iterator<Item = Tag> + '_ {
        self.nodes.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tree_with(tags: &[i64]) -> ShadowTree {
        let mut tree = ShadowTree::new();
        for raw in tags {
            tree.create(Tag::new(*raw), "Panel").unwrap();
        }
        tree
    }

    #[test]
    fn test_create_rejects_duplicates() {
        let mut tree = tree_with(&[1]);
        assert_eq!(
            tree.create(Tag::new(1), "Panel").unwrap_err(),
            ShadowError::DuplicateTag(Tag::new(1))
        );
    }

    #[test]
    fn test_child_order_is_preserved() {
        let mut tree = tree_with(&[1, 2, 3, 4]);
        tree.insert_child(Tag::new(1), Tag::new(2), 0).unwrap();
        tree.insert_child(Tag::new(1), Tag::new(3), 1).unwrap();
        tree.insert_child(Tag::new(1), Tag::new(4), 1).unwrap();
        let children: Vec<i64> = tree
            .get(Tag::new(1))
            .unwrap()
            .children
            .iter()
            .map(|t| t.raw())
            .collect();
        assert_eq!(children, vec![2, 4, 3]);
        assert_eq!(tree.get(Tag::new(4)).unwrap().parent, Some(Tag::new(1)));
    }

    #[test]
    fn test_insert_child_bounds() {
        let mut tree = tree_with(&[1, 2]);
        assert_eq!(
            tree.insert_child(Tag::new(1), Tag::new(2), 1).unwrap_err(),
            ShadowError::ChildIndexOutOfRange {
                parent: Tag::new(1),
                index: 1
            }
        );
        assert_eq!(
            tree.insert_child(Tag::new(1), Tag::new(9), 0).unwrap_err(),
            ShadowError::UnknownTag(Tag::new(9))
        );
    }

    #[test]
    fn test_remove_child_detaches_without_release() {
        let mut tree = tree_with(&[1, 2]);
        tree.insert_child(Tag::new(1), Tag::new(2), 0).unwrap();
        let removed = tree.remove_child_at(Tag::new(1), 0).unwrap();
        assert_eq!(removed, Tag::new(2));
        assert!(tree.contains(Tag::new(2)));
        assert_eq!(tree.get(Tag::new(2)).unwrap().parent, None);
    }

    #[test]
    fn test_remove_subtree_cascades_children_first() {
        let mut tree = tree_with(&[1, 2, 3, 4]);
        tree.insert_child(Tag::new(1), Tag::new(2), 0).unwrap();
        tree.insert_child(Tag::new(2), Tag::new(3), 0).unwrap();
        tree.insert_child(Tag::new(2), Tag::new(4), 1).unwrap();
        let removed = tree.remove_subtree(Tag::new(2)).unwrap();
        let raw: Vec<i64> = removed.iter().map(|t| t.raw()).collect();
        assert_eq!(raw, vec![3, 4, 2]);
        assert!(tree.contains(Tag::new(1)));
        assert!(tree.get(Tag::new(1)).unwrap().children.is_empty());
        assert!(!tree.contains(Tag::new(3)));
    }

    #[test]
    fn test_set_property_records_last_value() {
        let mut tree = tree_with(&[1]);
        let node = tree.get_mut(Tag::new(1)).unwrap();
        node.set_property("opacity", json!(0.5));
        node.set_property("opacity", json!(0.9));
        assert_eq!(node.props["opacity"], json!(0.9));
    }
}
