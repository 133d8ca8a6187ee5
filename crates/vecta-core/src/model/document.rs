//! # Document Module
//!
//! Arena that owns every object of one document.
//!
//! ## Responsibilities
//! - **Node Storage**: `Vec<Option<Node>>` arena with recycled `NodeId` indices.
//! - **Ownership**: sub-object and object-list slots own their nodes; each node
//!   records the node owning it.
//! - **Mutation**: generic get/set by property name, reference validation,
//!   list editing, keyframes and undoable sets.
//! - **Notification**: [`DocumentEvent`]s delivered over channels.

use super::animatable::Animatable;
use super::object::Object;
use super::property::{Property, Slot};
use super::registry::{ObjectType, Registry};
use super::transition::KeyframeTransition;
use super::value::{Color, Value};
use super::NodeId;
use crate::FrameTime;
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::collections::HashMap;
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) object: Object,
    pub(crate) parent: Option<NodeId>,
}

impl Node {
    pub fn object(&self) -> &Object {
        &self.object
    }

    /// The node owning this one through a sub-object or list property.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }
}

/// Change notifications for observers such as views and timelines.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentEvent {
    PropertyChanged {
        node: NodeId,
        property: String,
        value: Value,
    },
    GroupColorChanged {
        node: NodeId,
        color: Color,
    },
    VisibilityChanged {
        node: NodeId,
        visible: bool,
    },
    LockedChanged {
        node: NodeId,
        locked: bool,
    },
    ChildAdded {
        parent: NodeId,
        property: String,
        child: NodeId,
        index: usize,
    },
    ChildRemoved {
        parent: NodeId,
        property: String,
        child: NodeId,
        index: usize,
    },
    NodeDestroyed {
        node: NodeId,
    },
}

/// Reversible record of a property change.
#[derive(Debug, Clone, PartialEq)]
pub struct SetPropertyCommand {
    pub node: NodeId,
    pub property: String,
    pub before: Value,
    pub after: Value,
    /// Set when the change went into a keyframe
    pub time: Option<FrameTime>,
    pub keyframe_added: bool,
}

impl SetPropertyCommand {
    pub fn apply(&self, document: &mut Document) -> bool {
        match self.time {
            Some(time) => document.set_keyframe(self.node, &self.property, time, self.after.clone()),
            None => document.set(self.node, &self.property, self.after.clone()),
        }
    }

    pub fn revert(&self, document: &mut Document) -> bool {
        match self.time {
            Some(time) if self.keyframe_added => {
                document.remove_keyframe_at(self.node, &self.property, time)
            }
            Some(time) => document.set_keyframe(self.node, &self.property, time, self.before.clone()),
            None => document.set(self.node, &self.property, self.before.clone()),
        }
    }
}

/// Receives the commands produced by undoable setters.
pub trait CommandSink {
    fn push(&mut self, command: SetPropertyCommand);
}

impl CommandSink for Vec<SetPropertyCommand> {
    fn push(&mut self, command: SetPropertyCommand) {
        Vec::push(self, command);
    }
}

pub struct Document {
    nodes: Vec<Option<Node>>,
    free_indices: Vec<usize>,
    main: NodeId,
    assets: NodeId,
    current_time: FrameTime,
    observers: Vec<Sender<DocumentEvent>>,
    metadata: serde_json::Map<String, serde_json::Value>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("nodes", &self.len())
            .field("main", &self.main)
            .field("assets", &self.assets)
            .field("current_time", &self.current_time)
            .finish()
    }
}

impl Document {
    /// An empty document with its main composition and asset store.
    pub fn new() -> Self {
        let mut doc = Self {
            nodes: Vec::new(),
            free_indices: Vec::new(),
            main: 0,
            assets: 0,
            current_time: 0.0,
            observers: Vec::new(),
            metadata: serde_json::Map::new(),
        };
        let registry = Registry::global();
        if let Some(main) = registry.get("MainComposition") {
            doc.main = doc.instantiate(main);
        }
        if let Some(assets) = registry.get("Assets") {
            doc.assets = doc.instantiate(assets);
        }
        doc
    }

    pub fn main(&self) -> NodeId {
        self.main
    }

    pub fn assets(&self) -> NodeId {
        self.assets
    }

    pub fn metadata(&self) -> &serde_json::Map<String, serde_json::Value> {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut serde_json::Map<String, serde_json::Value> {
        &mut self.metadata
    }

    /// Creates a detached node of a concrete registered type.
    pub fn create(&mut self, type_name: &str) -> Option<NodeId> {
        let object_type = Registry::global().get(type_name)?;
        if object_type.is_abstract {
            debug!(type_name, "Refusing to instantiate abstract type");
            return None;
        }
        Some(self.instantiate(object_type))
    }

    /// Adds a node with its sub-objects.
    pub(crate) fn instantiate(&mut self, object_type: &'static ObjectType) -> NodeId {
        let id = self.alloc(Node {
            object: Object::new(object_type),
            parent: None,
        });

        let sub_objects: Vec<(String, &'static str)> = self.nodes[id]
            .as_ref()
            .map(|node| {
                node.object
                    .properties()
                    .filter_map(|prop| match prop.slot() {
                        Slot::Object { type_name, .. } => Some((prop.name().to_owned(), *type_name)),
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default();

        for (name, type_name) in sub_objects {
            let Some(sub_type) = Registry::global().get(type_name) else {
                continue;
            };
            let child = self.instantiate(sub_type);
            if let Some(node) = self.node_mut(child) {
                node.parent = Some(id);
            }
            if let Some(Slot::Object { node, .. }) = self.slot_mut(id, &name) {
                *node = Some(child);
            }
        }

        let time = self.current_time;
        if let Some(node) = self.node_mut(id) {
            for prop in node.object.properties_mut() {
                if let Some(anim) = prop.animatable_mut() {
                    anim.set_time(time);
                }
            }
        }
        id
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        if let Some(id) = self.free_indices.pop() {
            self.nodes[id] = Some(node);
            id
        } else {
            self.nodes.push(Some(node));
            self.nodes.len() - 1
        }
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id).and_then(|n| n.as_ref())
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id).and_then(|n| n.as_mut())
    }

    pub fn object(&self, id: NodeId) -> Option<&Object> {
        self.node(id).map(|n| &n.object)
    }

    pub(crate) fn object_mut(&mut self, id: NodeId) -> Option<&mut Object> {
        self.node_mut(id).map(|n| &mut n.object)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|n| n.parent)
    }

    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(id, node)| node.as_ref().map(|_| id))
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.nodes.len() - self.free_indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `ancestor` is `node` or owns it, directly or not.
    pub fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// The closest composition containing `id`, itself included.
    pub fn composition_of(&self, id: NodeId) -> Option<NodeId> {
        let mut current = Some(id);
        while let Some(node) = current {
            if self.object(node)?.is_instance("Composition") {
                return Some(node);
            }
            current = self.parent(node);
        }
        None
    }

    fn property(&self, id: NodeId, name: &str) -> Option<&Property> {
        self.object(id)?.property(name)
    }

    fn slot_mut(&mut self, id: NodeId, name: &str) -> Option<&mut Slot> {
        self.object_mut(id)?.property_mut(name).map(Property::slot_mut)
    }

    pub fn get(&self, id: NodeId, name: &str) -> Option<Value> {
        self.object(id)?.get(name)
    }

    pub fn has(&self, id: NodeId, name: &str) -> bool {
        self.object(id).is_some_and(|o| o.has(name))
    }

    /// Sets a property by name, dispatching on its kind.
    /// Returns false and leaves the document untouched on rejection.
    pub fn set(&mut self, id: NodeId, name: &str, value: Value) -> bool {
        let Some(prop) = self.property(id, name) else {
            return false;
        };
        match prop.slot() {
            Slot::Reference { .. } => match value {
                Value::Null => self.set_reference(id, name, None),
                Value::Node(target) => self.set_reference(id, name, Some(target)),
                _ => false,
            },
            Slot::ObjectList { .. } => match value {
                Value::List(items) => {
                    let sources: Option<Vec<NodeId>> = items.iter().map(Value::as_node).collect();
                    sources.is_some_and(|sources| self.set_list(id, name, &sources))
                }
                _ => false,
            },
            Slot::Object { .. } => match value {
                Value::Node(child) => self.set_sub_object(id, name, child),
                _ => false,
            },
            _ => {
                let changed = self
                    .object_mut(id)
                    .is_some_and(|object| object.set_value(name, value));
                if changed {
                    self.on_property_changed(id, name);
                }
                changed
            }
        }
    }

    /// Like [`Document::set`], optionally creating undeclared properties.
    pub fn set_property(&mut self, id: NodeId, name: &str, value: Value, allow_unknown: bool) -> bool {
        if self.has(id, name) {
            return self.set(id, name, value);
        }
        if !allow_unknown {
            return false;
        }
        let added = self
            .object_mut(id)
            .is_some_and(|object| object.add_property(Property::unknown(name.to_owned(), value)));
        if added {
            self.on_property_changed(id, name);
        }
        added
    }

    /// Loaders restore persisted identities; nothing else may change a uuid.
    pub(crate) fn restore_uuid(&mut self, id: NodeId, uuid: Uuid) -> bool {
        match self.slot_mut(id, "uuid") {
            Some(Slot::Fixed(value)) => {
                *value = Value::Uuid(uuid);
                true
            }
            _ => false,
        }
    }

    pub fn uuid(&self, id: NodeId) -> Option<Uuid> {
        self.get(id, "uuid")?.as_uuid()
    }

    fn on_property_changed(&mut self, id: NodeId, name: &str) {
        let Some(value) = self.get(id, name) else {
            return;
        };
        self.emit(DocumentEvent::PropertyChanged {
            node: id,
            property: name.to_owned(),
            value: value.clone(),
        });
        match name {
            "group_color" => self.on_update_group(id),
            "visible" => {
                if let Some(visible) = value.as_bool() {
                    self.emit(DocumentEvent::VisibilityChanged { node: id, visible });
                }
            }
            "locked" => {
                if let Some(locked) = value.as_bool() {
                    self.emit(DocumentEvent::LockedChanged { node: id, locked });
                }
            }
            _ => {}
        }
    }

    pub fn reference(&self, id: NodeId, name: &str) -> Option<NodeId> {
        match self.property(id, name)?.slot() {
            Slot::Reference { target, .. } => *target,
            _ => None,
        }
    }

    /// Points a reference property at `target`, or clears it with `None`.
    /// Targets rejected by the property's policy leave it unchanged.
    pub fn set_reference(&mut self, id: NodeId, name: &str, target: Option<NodeId>) -> bool {
        let Some(Slot::Reference { policy, .. }) = self.property(id, name).map(Property::slot) else {
            return false;
        };
        let policy = *policy;
        if let Some(target) = target {
            if !(policy.is_valid_option)(self, id, target) {
                return false;
            }
        }
        if let Some(Slot::Reference { target: current, .. }) = self.slot_mut(id, name) {
            *current = target;
        }
        self.on_property_changed(id, name);
        true
    }

    /// Targets the reference property currently accepts.
    pub fn valid_options(&self, id: NodeId, name: &str) -> Vec<NodeId> {
        match self.property(id, name).map(Property::slot) {
            Some(Slot::Reference { policy, .. }) => (policy.valid_options)(self, id),
            _ => Vec::new(),
        }
    }

    pub fn sub_object(&self, id: NodeId, name: &str) -> Option<NodeId> {
        match self.property(id, name)?.slot() {
            Slot::Object { node, .. } => *node,
            _ => None,
        }
    }

    /// Replaces an owned sub-object with a detached node of the right type.
    pub fn set_sub_object(&mut self, id: NodeId, name: &str, child: NodeId) -> bool {
        let Some(Slot::Object { type_name, node }) = self.property(id, name).map(Property::slot) else {
            return false;
        };
        let (type_name, previous) = (*type_name, *node);
        if !self.can_adopt(id, child, type_name) {
            return false;
        }
        if let Some(Slot::Object { node, .. }) = self.slot_mut(id, name) {
            *node = Some(child);
        }
        if let Some(node) = self.node_mut(child) {
            node.parent = Some(id);
        }
        self.sync_time(child);
        if let Some(previous) = previous {
            if let Some(node) = self.node_mut(previous) {
                node.parent = None;
            }
            self.destroy(previous);
        }
        self.on_property_changed(id, name);
        true
    }

    /// Detached, of the expected type and not an ancestor of `owner`.
    fn can_adopt(&self, owner: NodeId, child: NodeId, type_name: &str) -> bool {
        let Some(node) = self.node(child) else {
            return false;
        };
        node.parent.is_none()
            && child != self.main
            && child != self.assets
            && node.object.is_instance(type_name)
            && !self.is_ancestor(child, owner)
    }

    pub fn items(&self, id: NodeId, name: &str) -> &[NodeId] {
        match self.property(id, name).map(Property::slot) {
            Some(Slot::ObjectList { items, .. }) => items,
            _ => &[],
        }
    }

    pub fn valid_index(&self, id: NodeId, name: &str, index: usize) -> bool {
        index < self.items(id, name).len()
    }

    /// Moves a detached node into a list, at the end if `index` is `None`.
    pub fn insert(&mut self, id: NodeId, name: &str, child: NodeId, index: Option<usize>) -> bool {
        let Some(Slot::ObjectList { element, items }) = self.property(id, name).map(Property::slot) else {
            return false;
        };
        let element = *element;
        let index = index.unwrap_or(items.len()).min(items.len());
        if !self.can_adopt(id, child, element) {
            return false;
        }
        if let Some(Slot::ObjectList { items, .. }) = self.slot_mut(id, name) {
            items.insert(index, child);
        }
        if let Some(node) = self.node_mut(child) {
            node.parent = Some(id);
        }
        self.sync_time(child);
        self.emit(DocumentEvent::ChildAdded {
            parent: id,
            property: name.to_owned(),
            child,
            index,
        });
        true
    }

    /// Inserts a deep copy of `source`. The copy is discarded if the list
    /// refuses it.
    pub fn insert_clone(
        &mut self,
        id: NodeId,
        name: &str,
        source: NodeId,
        index: Option<usize>,
    ) -> Option<NodeId> {
        let clone = self.clone_node(source)?;
        if self.insert(id, name, clone, index) {
            Some(clone)
        } else {
            self.destroy(clone);
            None
        }
    }

    /// Detaches the item at `index` and hands it back to the caller.
    pub fn remove(&mut self, id: NodeId, name: &str, index: usize) -> Option<NodeId> {
        let child = match self.slot_mut(id, name) {
            Some(Slot::ObjectList { items, .. }) if index < items.len() => items.remove(index),
            _ => return None,
        };
        if let Some(node) = self.node_mut(child) {
            node.parent = None;
        }
        self.emit(DocumentEvent::ChildRemoved {
            parent: id,
            property: name.to_owned(),
            child,
            index,
        });
        Some(child)
    }

    pub fn swap(&mut self, id: NodeId, name: &str, a: usize, b: usize) -> bool {
        match self.slot_mut(id, name) {
            Some(Slot::ObjectList { items, .. }) if a < items.len() && b < items.len() => {
                items.swap(a, b);
                self.on_property_changed(id, name);
                true
            }
            _ => false,
        }
    }

    /// Replaces the list with copies of `sources`; copies of the wrong type
    /// are dropped.
    pub fn set_list(&mut self, id: NodeId, name: &str, sources: &[NodeId]) -> bool {
        let Some(Slot::ObjectList { element, .. }) = self.property(id, name).map(Property::slot) else {
            return false;
        };
        let element = *element;

        let mut clones = Vec::with_capacity(sources.len());
        for &source in sources {
            let Some(clone) = self.clone_node(source) else {
                continue;
            };
            if self.object(clone).is_some_and(|o| o.is_instance(element)) {
                clones.push(clone);
            } else {
                warn!(property = name, expected = element, "Discarding list item of the wrong type");
                self.destroy(clone);
            }
        }

        while !self.items(id, name).is_empty() {
            let last = self.items(id, name).len() - 1;
            if let Some(child) = self.remove(id, name, last) {
                self.destroy(child);
            }
        }
        for clone in clones {
            self.insert(id, name, clone, None);
        }
        true
    }

    /// Nodes owned by `id` through sub-object and list slots.
    pub fn owned_nodes(&self, id: NodeId) -> Vec<NodeId> {
        let Some(object) = self.object(id) else {
            return Vec::new();
        };
        let mut owned = Vec::new();
        for prop in object.properties() {
            match prop.slot() {
                Slot::Object { node: Some(node), .. } => owned.push(*node),
                Slot::ObjectList { items, .. } => owned.extend(items.iter().copied()),
                _ => {}
            }
        }
        owned
    }

    fn subtree(&self, root: NodeId) -> Vec<NodeId> {
        let mut ids = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if self.node(id).is_none() {
                continue;
            }
            ids.push(id);
            let mut owned = self.owned_nodes(id);
            owned.reverse();
            stack.extend(owned);
        }
        ids
    }

    /// Destroys a node with everything it owns, detaching it from its owner
    /// and clearing references to the destroyed nodes.
    pub fn destroy(&mut self, id: NodeId) -> bool {
        if id == self.main || id == self.assets || self.node(id).is_none() {
            return false;
        }

        if let Some(parent) = self.parent(id) {
            self.detach(parent, id);
        }

        let doomed = self.subtree(id);
        for &node in &doomed {
            self.nodes[node] = None;
            self.free_indices.push(node);
        }

        let mut cleared = Vec::new();
        for (owner, slot) in self.nodes.iter_mut().enumerate() {
            let Some(node) = slot else { continue };
            for prop in node.object.properties_mut() {
                if let Slot::Reference { target, .. } = prop.slot_mut() {
                    if target.is_some_and(|t| doomed.contains(&t)) {
                        *target = None;
                        cleared.push((owner, prop.name().to_owned()));
                    }
                }
            }
        }
        for (owner, name) in cleared {
            self.on_property_changed(owner, &name);
        }
        for node in doomed {
            self.emit(DocumentEvent::NodeDestroyed { node });
        }
        true
    }

    fn detach(&mut self, parent: NodeId, child: NodeId) {
        let mut removed_at = None;
        if let Some(object) = self.object_mut(parent) {
            for prop in object.properties_mut() {
                match prop.slot_mut() {
                    Slot::Object { node, .. } if *node == Some(child) => *node = None,
                    Slot::ObjectList { items, .. } => {
                        if let Some(index) = items.iter().position(|&i| i == child) {
                            items.remove(index);
                            removed_at = Some((prop.name().to_owned(), index));
                        }
                    }
                    _ => {}
                }
            }
        }
        if let Some(node) = self.node_mut(child) {
            node.parent = None;
        }
        if let Some((property, index)) = removed_at {
            self.emit(DocumentEvent::ChildRemoved {
                parent,
                property,
                child,
                index,
            });
        }
    }

    /// Deep copy of a subtree, left detached. Copies get fresh uuids and
    /// references inside the subtree point at the copies.
    pub fn clone_node(&mut self, source: NodeId) -> Option<NodeId> {
        self.node(source)?;
        let originals = self.subtree(source);
        let mut mapping = HashMap::with_capacity(originals.len());
        for &original in &originals {
            let Some(node) = self.node(original) else { continue };
            let copy = node.clone();
            mapping.insert(original, self.alloc(copy));
        }

        for (&original, &copy) in &mapping {
            let Some(node) = self.node_mut(copy) else { continue };
            node.parent = if original == source {
                None
            } else {
                node.parent.and_then(|p| mapping.get(&p).copied())
            };
            for prop in node.object.properties_mut() {
                let is_uuid = prop.name() == "uuid";
                match prop.slot_mut() {
                    Slot::Fixed(value) if is_uuid => *value = Value::Uuid(Uuid::new_v4()),
                    Slot::Object { node: Some(child), .. } => {
                        if let Some(&mapped) = mapping.get(&*child) {
                            *child = mapped;
                        }
                    }
                    Slot::ObjectList { items, .. } => {
                        for item in items.iter_mut() {
                            if let Some(&mapped) = mapping.get(&*item) {
                                *item = mapped;
                            }
                        }
                    }
                    Slot::Reference { target: Some(target), .. } => {
                        if let Some(&mapped) = mapping.get(&*target) {
                            *target = mapped;
                        }
                    }
                    _ => {}
                }
            }
        }
        mapping.get(&source).copied()
    }

    /// Any live node with the given uuid, attached or not.
    pub fn node_by_uuid(&self, uuid: Uuid) -> Option<NodeId> {
        self.node_ids().find(|&id| self.uuid(id) == Some(uuid))
    }

    pub fn subscribe(&mut self) -> Receiver<DocumentEvent> {
        let (sender, receiver) = unbounded();
        self.observers.push(sender);
        receiver
    }

    pub(crate) fn emit(&mut self, event: DocumentEvent) {
        if self.observers.is_empty() {
            return;
        }
        self.observers
            .retain(|observer| observer.send(event.clone()).is_ok());
    }

    pub fn current_time(&self) -> FrameTime {
        self.current_time
    }

    /// Moves every animated property to `time`.
    pub fn set_time(&mut self, time: FrameTime) {
        self.current_time = time;
        for node in self.nodes.iter_mut().flatten() {
            for prop in node.object.properties_mut() {
                if let Some(anim) = prop.animatable_mut() {
                    anim.set_time(time);
                }
            }
        }
    }

    fn sync_time(&mut self, root: NodeId) {
        let time = self.current_time;
        for id in self.subtree(root) {
            if let Some(node) = self.node_mut(id) {
                for prop in node.object.properties_mut() {
                    if let Some(anim) = prop.animatable_mut() {
                        anim.set_time(time);
                    }
                }
            }
        }
    }

    /// Property value at an arbitrary time, without moving the document.
    pub fn value_at(&self, id: NodeId, name: &str, time: FrameTime) -> Option<Value> {
        let prop = self.property(id, name)?;
        Some(match prop.animatable() {
            Some(anim) => anim.value_at(time),
            None => prop.value(),
        })
    }

    pub fn animatable(&self, id: NodeId, name: &str) -> Option<&Animatable> {
        self.property(id, name)?.animatable()
    }

    pub(crate) fn animatable_mut(&mut self, id: NodeId, name: &str) -> Option<&mut Animatable> {
        self.object_mut(id)?.property_mut(name)?.animatable_mut()
    }

    pub fn set_keyframe(&mut self, id: NodeId, name: &str, time: FrameTime, value: Value) -> bool {
        let added = self
            .animatable_mut(id, name)
            .is_some_and(|anim| anim.set_keyframe(time, value).is_some());
        if added {
            self.on_property_changed(id, name);
        }
        added
    }

    pub fn set_keyframe_transition(
        &mut self,
        id: NodeId,
        name: &str,
        index: usize,
        transition: KeyframeTransition,
    ) -> bool {
        let changed = self
            .animatable_mut(id, name)
            .is_some_and(|anim| anim.set_transition(index, transition));
        if changed {
            self.on_property_changed(id, name);
        }
        changed
    }

    pub fn remove_keyframe_at(&mut self, id: NodeId, name: &str, time: FrameTime) -> bool {
        let removed = self
            .animatable_mut(id, name)
            .is_some_and(|anim| anim.remove_keyframe_at_time(time).is_some());
        if removed {
            self.on_property_changed(id, name);
        }
        removed
    }

    /// Sets a property and records how to undo it. Animated properties get
    /// a keyframe at the current time.
    pub fn set_undoable(
        &mut self,
        id: NodeId,
        name: &str,
        value: Value,
        sink: &mut dyn CommandSink,
    ) -> bool {
        let Some(prop) = self.property(id, name) else {
            return false;
        };
        if !prop.accepts(&value) {
            return false;
        }

        let time = self.current_time;
        let command = match prop.animatable() {
            Some(anim) if anim.is_animated() => {
                let existing = anim
                    .keyframes()
                    .iter()
                    .find(|kf| kf.time() == time)
                    .map(|kf| kf.value().clone());
                SetPropertyCommand {
                    node: id,
                    property: name.to_owned(),
                    keyframe_added: existing.is_none(),
                    before: existing.unwrap_or_else(|| anim.value().clone()),
                    after: value,
                    time: Some(time),
                }
            }
            _ => SetPropertyCommand {
                node: id,
                property: name.to_owned(),
                before: prop.value(),
                after: value,
                time: None,
                keyframe_added: false,
            },
        };

        if !command.apply(self) {
            return false;
        }
        sink.push(command);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec2;

    fn add(doc: &mut Document, owner: NodeId, type_name: &str) -> NodeId {
        let id = doc.create(type_name).unwrap();
        assert!(doc.insert(owner, "shapes", id, None));
        id
    }

    #[test]
    fn new_document_has_main_and_assets() {
        let doc = Document::new();
        assert_eq!(doc.object(doc.main()).unwrap().type_name(), "MainComposition");
        assert_eq!(doc.object(doc.assets()).unwrap().type_name(), "Assets");
        let animation = doc.sub_object(doc.main(), "animation").unwrap();
        assert_eq!(doc.parent(animation), Some(doc.main()));
        assert!(doc.sub_object(doc.assets(), "precompositions").is_some());
    }

    #[test]
    fn abstract_and_unknown_types_are_not_created() {
        let mut doc = Document::new();
        assert!(doc.create("ShapeElement").is_none());
        assert!(doc.create("Bogus").is_none());
    }

    #[test]
    fn insert_checks_type_and_cycles() {
        let mut doc = Document::new();
        let main = doc.main();
        let group = add(&mut doc, main, "Group");
        let inner = add(&mut doc, group, "Group");

        let transform = doc.create("Transform").unwrap();
        assert!(!doc.insert(main, "shapes", transform, None));

        // Already attached
        assert!(!doc.insert(main, "shapes", inner, None));
        let detached = doc.remove(main, "shapes", 0).unwrap();
        assert_eq!(detached, group);
        assert!(!doc.insert(inner, "shapes", group, None));
        assert!(doc.insert(main, "shapes", group, Some(7)));
        assert_eq!(doc.items(main, "shapes"), &[group]);
    }

    #[test]
    fn destroy_frees_subtree_and_clears_references() {
        let mut doc = Document::new();
        let main = doc.main();
        let parent = add(&mut doc, main, "Layer");
        let child = add(&mut doc, main, "Layer");
        let rect = add(&mut doc, parent, "Rect");
        assert!(doc.set_reference(child, "parent", Some(parent)));

        let events = doc.subscribe();
        assert!(doc.destroy(parent));
        assert!(doc.node(parent).is_none());
        assert!(doc.node(rect).is_none());
        assert_eq!(doc.reference(child, "parent"), None);
        assert_eq!(doc.items(main, "shapes"), &[child]);

        let events: Vec<_> = events.try_iter().collect();
        assert!(events.contains(&DocumentEvent::NodeDestroyed { node: rect }));
        assert!(events.iter().any(|e| matches!(
            e,
            DocumentEvent::PropertyChanged { node, property, value: Value::Null }
                if *node == child && property == "parent"
        )));

        assert!(!doc.destroy(main));
        assert!(!doc.destroy(parent));
    }

    #[test]
    fn invalid_reference_keeps_previous_target() {
        let mut doc = Document::new();
        let main = doc.main();
        let a = add(&mut doc, main, "Layer");
        let b = add(&mut doc, main, "Layer");
        let fill = add(&mut doc, main, "Fill");

        assert!(doc.set_reference(b, "parent", Some(a)));
        assert!(!doc.set_reference(a, "parent", Some(b)), "cycle");
        assert!(!doc.set_reference(b, "parent", Some(fill)));
        assert!(!doc.set_reference(b, "parent", Some(b)));
        assert_eq!(doc.reference(b, "parent"), Some(a));
        assert_eq!(doc.valid_options(b, "parent"), vec![a]);

        assert!(doc.set(b, "parent", Value::Null));
        assert_eq!(doc.reference(b, "parent"), None);
    }

    #[test]
    fn clone_gets_fresh_identity_and_internal_references() {
        let mut doc = Document::new();
        let main = doc.main();
        let group = add(&mut doc, main, "Group");
        let parent = add(&mut doc, group, "Layer");
        let child = add(&mut doc, group, "Layer");
        assert!(doc.set_reference(child, "parent", Some(parent)));

        let copy = doc.clone_node(group).unwrap();
        assert_eq!(doc.parent(copy), None);
        assert_ne!(doc.uuid(copy), doc.uuid(group));
        let items = doc.items(copy, "shapes").to_vec();
        assert_eq!(items.len(), 2);
        assert_eq!(doc.reference(items[1], "parent"), Some(items[0]));
        assert_eq!(doc.parent(items[0]), Some(copy));
    }

    #[test]
    fn set_list_discards_wrong_types() {
        let mut doc = Document::new();
        let main = doc.main();
        let rect = doc.create("Rect").unwrap();
        let named = doc.create("NamedColor").unwrap();
        assert!(doc.set(
            main,
            "shapes",
            Value::List(vec![Value::Node(rect), Value::Node(named)])
        ));
        let items = doc.items(main, "shapes");
        assert_eq!(items.len(), 1);
        assert_eq!(doc.object(items[0]).unwrap().type_name(), "Rect");
        assert_ne!(items[0], rect);
    }

    #[test]
    fn undoable_set_round_trips() {
        let mut doc = Document::new();
        let main = doc.main();
        let rect = add(&mut doc, main, "Rect");
        let mut history: Vec<SetPropertyCommand> = Vec::new();

        assert!(doc.set_undoable(rect, "position", Value::Point(DVec2::new(5.0, 6.0)), &mut history));
        assert!(!doc.set_undoable(rect, "position", Value::from("x"), &mut history));
        assert_eq!(history.len(), 1);
        assert!(history[0].revert(&mut doc));
        assert_eq!(doc.get(rect, "position"), Some(Value::Point(DVec2::ZERO)));

        doc.set_keyframe(rect, "rounded", 0.0, Value::Float(1.0));
        doc.set_time(10.0);
        assert!(doc.set_undoable(rect, "rounded", Value::Float(4.0), &mut history));
        let command = history.last().unwrap().clone();
        assert!(command.keyframe_added);
        assert_eq!(doc.animatable(rect, "rounded").unwrap().keyframe_count(), 2);
        assert!(command.revert(&mut doc));
        assert_eq!(doc.animatable(rect, "rounded").unwrap().keyframe_count(), 1);
    }

    #[test]
    fn unknown_properties_need_opt_in() {
        let mut doc = Document::new();
        let main = doc.main();
        assert!(!doc.set_property(main, "custom", Value::Int(1), false));
        assert!(doc.set_property(main, "custom", Value::Int(1), true));
        assert_eq!(doc.get(main, "custom"), Some(Value::Int(1)));
    }
}
