//! Tree view of the document: child cursors, lookups, grouping and the
//! visibility/lock flags.

use super::document::{Document, DocumentEvent};
use super::registry::{ChildAccess, Grouping};
use super::value::Color;
use super::NodeId;
use uuid::Uuid;

type ChildGetter = fn(&Document, NodeId, usize) -> Option<NodeId>;
type ChildCounter = fn(&Document, NodeId) -> usize;

/// Cursor over the children of a node, driven by an index getter and a
/// count so no node needs to materialize a child container.
#[derive(Clone)]
pub struct ChildRange<'a> {
    doc: &'a Document,
    node: NodeId,
    get: ChildGetter,
    count: ChildCounter,
    index: usize,
}

impl<'a> ChildRange<'a> {
    fn new(doc: &'a Document, node: NodeId, get: ChildGetter, count: ChildCounter) -> Self {
        Self {
            doc,
            node,
            get,
            count,
            index: 0,
        }
    }
}

impl Iterator for ChildRange<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        if self.index >= (self.count)(self.doc, self.node) {
            return None;
        }
        let child = (self.get)(self.doc, self.node, self.index);
        self.index += 1;
        child
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.count)(self.doc, self.node).saturating_sub(self.index);
        (remaining, Some(remaining))
    }
}

fn tree_child(doc: &Document, node: NodeId, index: usize) -> Option<NodeId> {
    match doc.object(node)?.type_info().children {
        ChildAccess::None => None,
        ChildAccess::List(name) => doc.items(node, name).get(index).copied(),
        ChildAccess::SubObjects(names) => doc.sub_object(node, names.get(index)?),
    }
}

fn tree_child_count(doc: &Document, node: NodeId) -> usize {
    match doc.object(node).map(|o| o.type_info().children) {
        Some(ChildAccess::List(name)) => doc.items(node, name).len(),
        Some(ChildAccess::SubObjects(names)) => names
            .iter()
            .filter(|name| doc.sub_object(node, name).is_some())
            .count(),
        _ => 0,
    }
}

fn group_candidates(doc: &Document, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
    let siblings = match doc.object(node).map(|o| o.type_info().grouping) {
        Some(Grouping::LayerParent) => doc.docnode_parent(node),
        _ => None,
    };
    doc.children(node)
        .chain(siblings.into_iter().flat_map(move |p| doc.children(p)))
        .filter(move |&candidate| doc.group_parent(candidate) == Some(node))
}

fn group_child(doc: &Document, node: NodeId, index: usize) -> Option<NodeId> {
    group_candidates(doc, node).nth(index)
}

fn group_child_count(doc: &Document, node: NodeId) -> usize {
    group_candidates(doc, node).count()
}

impl Document {
    pub fn children(&self, id: NodeId) -> ChildRange<'_> {
        ChildRange::new(self, id, tree_child, tree_child_count)
    }

    /// Children by grouping rather than ownership: a layer groups the
    /// layers naming it as their parent.
    pub fn group_children(&self, id: NodeId) -> ChildRange<'_> {
        ChildRange::new(self, id, group_child, group_child_count)
    }

    pub fn child_count(&self, id: NodeId) -> usize {
        tree_child_count(self, id)
    }

    pub fn child(&self, id: NodeId, index: usize) -> Option<NodeId> {
        tree_child(self, id, index)
    }

    pub fn child_index(&self, parent: NodeId, child: NodeId) -> Option<usize> {
        self.children(parent).position(|c| c == child)
    }

    /// Closest owning node that is a document node.
    pub fn docnode_parent(&self, id: NodeId) -> Option<NodeId> {
        let mut current = self.parent(id);
        while let Some(node) = current {
            if self.object(node)?.type_info().document_node {
                return Some(node);
            }
            current = self.parent(node);
        }
        None
    }

    pub fn group_parent(&self, id: NodeId) -> Option<NodeId> {
        let object = self.object(id)?;
        if object.type_info().grouping == Grouping::LayerParent {
            if let Some(parent) = self.reference(id, "parent") {
                return Some(parent);
            }
        }
        self.docnode_parent(id)
    }

    pub fn find_by_uuid(&self, root: NodeId, uuid: Uuid) -> Option<NodeId> {
        if self.uuid(root) == Some(uuid) {
            return Some(root);
        }
        self.children(root)
            .find_map(|child| self.find_by_uuid(child, uuid))
    }

    pub fn find_by_name(&self, root: NodeId, name: &str) -> Option<NodeId> {
        if self.object(root).is_some_and(|o| o.name() == name) {
            return Some(root);
        }
        self.children(root)
            .find_map(|child| self.find_by_name(child, name))
    }

    /// Pre-order search for instances of `type_name` below `root`.
    pub fn find_by_type_name(&self, root: NodeId, type_name: &str, include_self: bool) -> Vec<NodeId> {
        let mut found = Vec::new();
        if include_self && self.object(root).is_some_and(|o| o.is_instance(type_name)) {
            found.push(root);
        }
        for child in self.children(root) {
            found.extend(self.find_by_type_name(child, type_name, true));
        }
        found
    }

    /// Own group color, else the group parent's, else white.
    pub fn group_color(&self, id: NodeId) -> Color {
        let mut current = Some(id);
        let mut steps = 0;
        while let Some(node) = current {
            if let Some(color) = self.get(node, "group_color").and_then(|v| v.as_color()) {
                if color.is_valid() {
                    return color;
                }
            }
            steps += 1;
            if steps > self.len() {
                break;
            }
            current = self.group_parent(node);
        }
        Color::WHITE
    }

    /// Notifies `id` and every group descendant that their effective color
    /// may have changed.
    pub(crate) fn on_update_group(&mut self, id: NodeId) {
        let mut pending = vec![id];
        let mut visited = Vec::new();
        while let Some(node) = pending.pop() {
            if visited.contains(&node) {
                continue;
            }
            visited.push(node);
            let color = self.group_color(node);
            self.emit(DocumentEvent::GroupColorChanged { node, color });
            let children: Vec<_> = self.group_children(node).collect();
            pending.extend(children.into_iter().rev());
        }
    }

    pub fn is_visible(&self, id: NodeId) -> bool {
        self.object(id)
            .and_then(|o| o.get_bool("visible"))
            .unwrap_or(true)
    }

    pub fn set_visible(&mut self, id: NodeId, visible: bool) -> bool {
        self.set(id, "visible", visible.into())
    }

    pub fn is_locked(&self, id: NodeId) -> bool {
        self.object(id)
            .and_then(|o| o.get_bool("locked"))
            .unwrap_or(false)
    }

    pub fn set_locked(&mut self, id: NodeId, locked: bool) -> bool {
        self.set(id, "locked", locked.into())
    }

    pub fn locked_by_ancestor(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if self.is_locked(node) {
                return true;
            }
            current = self.docnode_parent(node);
        }
        false
    }

    /// Visible, unlocked and inside a selectable parent.
    pub fn is_selectable(&self, id: NodeId) -> bool {
        if !self.is_visible(id) || self.is_locked(id) {
            return false;
        }
        self.docnode_parent(id)
            .map_or(true, |parent| self.is_selectable(parent))
    }

    pub fn visible_recursive(&self, id: NodeId) -> bool {
        if !self.is_visible(id) {
            return false;
        }
        self.docnode_parent(id)
            .map_or(true, |parent| self.visible_recursive(parent))
    }

    /// Display name: the node's name, or its type when unnamed.
    pub fn object_name(&self, id: NodeId) -> String {
        match self.object(id) {
            Some(object) if !object.name().is_empty() => object.name(),
            Some(object) => object.type_name().to_owned(),
            None => String::new(),
        }
    }
}
