//! Rebuilds a document from the generic JSON format.
//!
//! Loading is two-phase. Objects are built and inserted while the tree is
//! walked; references are only recorded by uuid and bound by
//! [`ImportState::resolve`] once every node exists.

use super::codec::{json_to_value, load_point, load_value};
use crate::io::set_keyframe_with;
use crate::model::{Document, KeyframeTransition, NodeId, PropertyFlags, PropertyTraits, PropertyType, Slot};
use serde_json::{Map, Value as Json};
use std::collections::HashMap;
use uuid::Uuid;
use vecta_data::model::{FormatInfo, KeyframeData, FORMAT_VERSION, TYPE_KEY};
use vecta_data::Diagnostics;

type JsonObject = Map<String, Json>;

/// Builds objects by type name for the loader.
pub trait ObjectFactory {
    fn build(&self, type_name: &str, document: &mut Document) -> Option<NodeId>;
}

/// Instantiates any concrete type known to the global registry.
#[derive(Debug, Default, Clone, Copy)]
pub struct RegistryFactory;

impl ObjectFactory for RegistryFactory {
    fn build(&self, type_name: &str, document: &mut Document) -> Option<NodeId> {
        document.create(type_name)
    }
}

struct PropertyInfo {
    name: String,
    traits: PropertyTraits,
    sub_type: Option<&'static str>,
}

pub struct ImportState<'a> {
    document: &'a mut Document,
    factory: &'a dyn ObjectFactory,
    diagnostics: &'a mut dyn Diagnostics,
    unresolved_references: Vec<(NodeId, String, Uuid)>,
    deferred_loads: HashMap<NodeId, JsonObject>,
    unwanted: Vec<NodeId>,
    document_version: i64,
}

impl<'a> ImportState<'a> {
    pub fn new(
        document: &'a mut Document,
        factory: &'a dyn ObjectFactory,
        diagnostics: &'a mut dyn Diagnostics,
    ) -> Self {
        Self {
            document,
            factory,
            diagnostics,
            unresolved_references: Vec::new(),
            deferred_loads: HashMap::new(),
            unwanted: Vec::new(),
            document_version: FORMAT_VERSION,
        }
    }

    pub fn document_version(&self) -> i64 {
        self.document_version
    }

    pub fn set_document_version(&mut self, version: i64) {
        self.document_version = version;
    }

    fn error(&mut self, message: String) {
        self.diagnostics.warning(message);
    }

    /// Loads a whole file: format header, metadata, main composition and
    /// assets, then binds references.
    pub fn load_document(&mut self, top: &JsonObject) {
        if let Some(format) = top.get("format") {
            match serde_json::from_value::<FormatInfo>(format.clone()) {
                Ok(info) => self.document_version = info.format_version,
                Err(err) => self.error(format!("Invalid format header: {}", err)),
            }
        }
        if self.document_version > FORMAT_VERSION {
            self.error(format!(
                "Opening a file from a newer version (format {}), some features may not load",
                self.document_version
            ));
        }

        if let Some(Json::Object(metadata)) = top.get("metadata") {
            *self.document.metadata_mut() = metadata.clone();
        }

        match top.get("animation") {
            Some(Json::Object(animation)) => {
                let main = self.document.main();
                self.load_object(main, animation.clone());
            }
            _ => self.error("Missing animation object".to_owned()),
        }

        if let Some(Json::Object(assets)) = top.get("assets") {
            let assets_id = self.document.assets();
            self.load_object(assets_id, assets.clone());
        }

        self.resolve();
    }

    /// Binds pending references and drops objects nobody accepted.
    pub fn resolve(&mut self) {
        let pending = std::mem::take(&mut self.unresolved_references);
        for (node, property, uuid) in pending {
            match self.document.node_by_uuid(uuid) {
                None => {
                    let name = self.document.object_name(node);
                    self.error(format!(
                        "Property {} of {} refers to unexisting object {}",
                        property, name, uuid
                    ));
                }
                Some(target) => {
                    if !self.document.set_reference(node, &property, Some(target)) {
                        let name = self.document.object_name(node);
                        self.error(format!(
                            "Could not load {} for {}: uuid refers to an unacceptable object",
                            property, name
                        ));
                    }
                }
            }
        }

        for node in std::mem::take(&mut self.unwanted) {
            if self.document.node(node).is_some() {
                let name = self.document.object_name(node);
                self.error(format!("Object {} is invalid", name));
                self.document.destroy(node);
            }
        }
        self.deferred_loads.clear();
    }

    /// Rewrites legacy layouts into the current schema.
    fn version_fixup(&self, object: &mut JsonObject) {
        if self.document_version != 1 {
            return;
        }

        fn fix_animation_container(object: &mut JsonObject) {
            let first = object.remove("first_frame");
            let last = object.remove("last_frame");
            if first.is_none() && last.is_none() {
                return;
            }
            let mut container = JsonObject::new();
            container.insert(TYPE_KEY.to_owned(), Json::from("AnimationContainer"));
            if let Some(first) = first {
                container.insert("first_frame".to_owned(), first);
            }
            if let Some(last) = last {
                container.insert("last_frame".to_owned(), last);
            }
            object.insert("animation".to_owned(), Json::Object(container));
        }

        let type_name = object.get(TYPE_KEY).and_then(Json::as_str).unwrap_or_default().to_owned();
        match type_name.as_str() {
            "MainComposition" => {
                fix_animation_container(object);
                if let Some(layers) = object.remove("layers") {
                    object.insert("shapes".to_owned(), layers);
                }
            }
            "ShapeLayer" => {
                fix_animation_container(object);
                object.insert(TYPE_KEY.to_owned(), Json::from("Layer"));
            }
            "EmptyLayer" => {
                fix_animation_container(object);
                object.insert(TYPE_KEY.to_owned(), Json::from("Layer"));
                object.insert("shapes".to_owned(), Json::Array(Vec::new()));
            }
            _ => {}
        }
    }

    pub fn load_object(&mut self, target: NodeId, mut object: JsonObject) {
        self.version_fixup(&mut object);

        let Some(target_object) = self.document.object(target) else {
            return;
        };
        let expected = target_object.type_name();
        let properties: Vec<PropertyInfo> = target_object
            .properties()
            .map(|prop| PropertyInfo {
                name: prop.name().to_owned(),
                traits: prop.traits(),
                sub_type: match prop.slot() {
                    Slot::Object { type_name, .. } => Some(*type_name),
                    _ => None,
                },
            })
            .collect();

        let found = object.get(TYPE_KEY).and_then(Json::as_str).unwrap_or_default();
        if found != expected {
            let message = format!("Wrong object type: expected '{}' but got '{}'", expected, found);
            self.error(message);
        }

        let mut failed = Vec::new();
        for info in &properties {
            let alias = self
                .document
                .object(target)
                .and_then(|o| o.property(&info.name))
                .and_then(|p| p.alias());
            let value = object
                .get(&info.name)
                .or_else(|| alias.and_then(|alias| object.get(alias)));
            let Some(value) = value else {
                continue;
            };
            if !self.load_property(target, info, value) {
                failed.push((info, value));
            }
        }

        // A validator may depend on a sibling loaded later in the pass
        // (first_frame against last_frame), so plain values get a second try
        for (info, value) in failed {
            let flags = info.traits.flags;
            let retry = info.sub_type.is_none()
                && !flags.contains(PropertyFlags::LIST)
                && !flags.contains(PropertyFlags::ANIMATED);
            if !(retry && self.load_property(target, info, value)) {
                let name = self.document.object_name(target);
                self.error(format!("Could not load {} for {}", info.name, name));
            }
        }

        for (key, value) in &object {
            if key == TYPE_KEY {
                continue;
            }
            let declared = self
                .document
                .object(target)
                .is_some_and(|o| o.find_property(key).is_some());
            if declared {
                continue;
            }
            if !self.document.set_property(target, key, json_to_value(value), true) {
                self.error(format!("Could not set property {}", key));
            }
        }
    }

    fn load_property(&mut self, target: NodeId, info: &PropertyInfo, value: &Json) -> bool {
        let traits = info.traits;
        let name = info.name.as_str();

        if traits.flags.contains(PropertyFlags::LIST) {
            let Some(items) = value.as_array() else {
                return false;
            };
            if traits.kind == PropertyType::Object {
                self.load_object_list(target, name, items);
                return true;
            }
            let values = items
                .iter()
                .map(|item| load_value(traits.kind, item).unwrap_or_default())
                .collect();
            return self.document.set(target, name, crate::model::Value::List(values));
        }

        if traits.flags.contains(PropertyFlags::ANIMATED) {
            return self.load_animated(target, name, traits.kind, value);
        }

        match traits.kind {
            PropertyType::ObjectReference => {
                if let Some(uuid) = value.as_str().and_then(|s| Uuid::parse_str(s).ok()) {
                    self.unresolved_references.push((target, name.to_owned(), uuid));
                }
                true
            }
            PropertyType::Uuid => {
                let Some(uuid) = value.as_str().and_then(|s| Uuid::parse_str(s).ok()) else {
                    return false;
                };
                if name == "uuid" {
                    self.document.restore_uuid(target, uuid)
                } else {
                    self.document.set(target, name, crate::model::Value::Uuid(uuid))
                }
            }
            PropertyType::Object => self.load_sub_object(target, name, info.sub_type, value),
            kind => match load_value(kind, value) {
                Some(loaded) => self.document.set(target, name, loaded),
                None => false,
            },
        }
    }

    fn load_animated(&mut self, target: NodeId, name: &str, kind: PropertyType, value: &Json) -> bool {
        let Some(object) = value.as_object() else {
            return load_value(kind, value).is_some_and(|v| self.document.set(target, name, v));
        };

        if let Some(static_value) = object.get("value") {
            return load_value(kind, static_value).is_some_and(|v| self.document.set(target, name, v));
        }

        let Some(keyframes) = object.get("keyframes") else {
            // Point and size values are objects too
            return load_value(kind, value).is_some_and(|v| self.document.set(target, name, v));
        };

        for entry in keyframes.as_array().map(Vec::as_slice).unwrap_or_default() {
            let keyframe: KeyframeData = match serde_json::from_value(entry.clone()) {
                Ok(keyframe) => keyframe,
                Err(err) => {
                    self.error(format!("Malformed keyframe: {}", err));
                    continue;
                }
            };
            let Some(time) = keyframe.time else {
                self.error("Keyframe must specify a time".to_owned());
                continue;
            };
            let Some(raw) = keyframe.value.as_ref() else {
                self.error("Keyframe must specify a value".to_owned());
                continue;
            };

            let transition = match (&keyframe.before, &keyframe.after) {
                (Some(before), Some(after)) => KeyframeTransition::new(
                    glam::DVec2::new(before.x, before.y),
                    glam::DVec2::new(after.x, after.y),
                ),
                _ => KeyframeTransition::hold(),
            };

            let added = load_value(kind, raw)
                .is_some_and(|v| set_keyframe_with(self.document, target, name, time, v, transition));
            if !added {
                self.error("Could not add keyframe".to_owned());
            }
        }
        true
    }

    fn load_sub_object(&mut self, target: NodeId, name: &str, sub_type: Option<&str>, value: &Json) -> bool {
        let Some(object) = value.as_object() else {
            return false;
        };
        let type_name = object.get(TYPE_KEY).and_then(Json::as_str);

        if let Some(existing) = self.document.sub_object(target, name) {
            let existing_type = self.document.object(existing).map(|o| o.type_name());
            if type_name.is_none() || type_name == existing_type || type_name == sub_type {
                self.load_object(existing, object.clone());
                return true;
            }
        }

        let Some(child) = self.create_object(type_name.or(sub_type).unwrap_or_default()) else {
            return false;
        };
        self.load_object(child, object.clone());
        if self.document.set_sub_object(target, name, child) {
            true
        } else {
            self.unwanted.push(child);
            false
        }
    }

    /// List items are built, cloned into place, and only then loaded.
    fn load_object_list(&mut self, target: NodeId, name: &str, items: &[Json]) {
        for (index, item) in items.iter().enumerate() {
            let Some(object) = item.as_object() else {
                let owner = self.document.object_name(target);
                self.error(format!("Item {} for {} in {} isn't an object", index, name, owner));
                continue;
            };
            let mut object = object.clone();
            self.version_fixup(&mut object);
            let type_name = object.get(TYPE_KEY).and_then(Json::as_str).unwrap_or_default().to_owned();
            let Some(built) = self.create_object(&type_name) else {
                continue;
            };
            self.deferred_loads.insert(built, object);

            match self.document.insert_clone(target, name, built, None) {
                Some(inserted) => {
                    if let Some(body) = self.deferred_loads.remove(&built) {
                        self.load_object(inserted, body);
                    }
                }
                None => {
                    let owner = self.document.object_name(target);
                    self.error(format!("Item {} for {} in {} is not acceptable", index, name, owner));
                }
            }
            self.deferred_loads.remove(&built);
            self.document.destroy(built);
        }
    }

    fn create_object(&mut self, type_name: &str) -> Option<NodeId> {
        if type_name == "MainComposition" {
            self.error(
                "Objects of type 'MainComposition' can only be at the top level of the document".to_owned(),
            );
            return None;
        }
        if let Some(id) = self.factory.build(type_name, self.document) {
            return Some(id);
        }
        self.error(format!("Unknown object of type '{}'", type_name));
        None
    }
}

/// Imports a parsed JSON document with a custom object factory.
pub fn import_json(
    top: &JsonObject,
    factory: &dyn ObjectFactory,
    diagnostics: &mut dyn Diagnostics,
) -> Document {
    let mut document = Document::new();
    {
        let mut state = ImportState::new(&mut document, factory, diagnostics);
        state.load_document(top);
    }
    document
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Value;
    use serde_json::json;
    use vecta_data::DiagnosticLog;

    fn import(json: Json) -> (Document, DiagnosticLog) {
        let mut log = DiagnosticLog::new();
        let top = json.as_object().cloned().unwrap();
        let doc = import_json(&top, &RegistryFactory, &mut log);
        (doc, log)
    }

    #[test]
    fn loads_static_and_animated_values() {
        let (doc, log) = import(json!({
            "format": {"format_version": 8},
            "animation": {
                "__type__": "MainComposition",
                "name": "Scene",
                "width": 320,
                "shapes": [{
                    "__type__": "Rect",
                    "name": "box",
                    "size": {"value": {"width": 10, "height": 20}},
                    "position": {"keyframes": [
                        {"time": 0, "value": {"x": 0, "y": 0}, "before": {"x": 0, "y": 0}, "after": {"x": 1, "y": 1}},
                        {"time": 10, "value": {"x": 10, "y": 0}}
                    ]}
                }]
            }
        }));
        assert!(log.is_empty(), "{:?}", log.entries());

        let main = doc.main();
        assert_eq!(doc.get(main, "name"), Some(Value::String("Scene".into())));
        assert_eq!(doc.get(main, "width").and_then(|v| v.as_f64()), Some(320.0));

        let rect = doc.items(main, "shapes")[0];
        assert_eq!(doc.object_name(rect), "box");
        let anim = doc.animatable(rect, "position").unwrap();
        assert_eq!(anim.keyframe_count(), 2);
        assert!(!anim.keyframe(0).unwrap().transition().is_hold());
        assert!(anim.keyframe(1).unwrap().transition().is_hold());
        let mid = doc.value_at(rect, "position", 5.0).and_then(|v| v.as_point()).unwrap();
        approx::assert_abs_diff_eq!(mid.x, 5.0, epsilon = 1e-6);
        approx::assert_abs_diff_eq!(mid.y, 0.0);
    }

    #[test]
    fn uuids_are_restored() {
        let uuid = Uuid::new_v4();
        let (doc, _) = import(json!({
            "animation": {
                "__type__": "MainComposition",
                "shapes": [{"__type__": "Group", "uuid": uuid.to_string()}]
            }
        }));
        let group = doc.items(doc.main(), "shapes")[0];
        assert_eq!(doc.uuid(group), Some(uuid));
    }

    #[test]
    fn unknown_types_and_nested_main_are_reported() {
        let (doc, log) = import(json!({
            "animation": {
                "__type__": "MainComposition",
                "shapes": [
                    {"__type__": "Teapot"},
                    {"__type__": "MainComposition"},
                    42,
                    {"__type__": "Ellipse"}
                ]
            }
        }));
        assert_eq!(doc.items(doc.main(), "shapes").len(), 1);
        let warnings: Vec<_> = log.warnings().collect();
        assert!(warnings.iter().any(|w| w.contains("Unknown object of type 'Teapot'")));
        assert!(warnings.iter().any(|w| w.contains("top level")));
        assert!(warnings.iter().any(|w| w.contains("isn't an object")));
    }

    #[test]
    fn unacceptable_list_items_are_dropped() {
        let (doc, log) = import(json!({
            "animation": {
                "__type__": "MainComposition",
                "shapes": [{"__type__": "NamedColor"}]
            }
        }));
        assert!(doc.items(doc.main(), "shapes").is_empty());
        assert!(log.warnings().any(|w| w.contains("is not acceptable")));
        // The temporary source is not left in the arena
        assert!(doc.find_by_type_name(doc.main(), "NamedColor", true).is_empty());
    }

    #[test]
    fn undeclared_keys_become_unknown_properties() {
        let (doc, log) = import(json!({
            "animation": {"__type__": "MainComposition", "custom": {"a": 1}}
        }));
        assert!(log.is_empty());
        assert!(doc.has(doc.main(), "custom"));
    }

    #[test]
    fn version_one_layout_is_migrated() {
        let (doc, log) = import(json!({
            "format": {"format_version": 1},
            "animation": {
                "__type__": "MainComposition",
                "first_frame": 5,
                "last_frame": 90,
                "layers": [
                    {"__type__": "ShapeLayer", "name": "a", "shapes": [{"__type__": "Ellipse"}]},
                    {"__type__": "EmptyLayer", "name": "b"}
                ]
            }
        }));
        assert!(log.is_empty(), "{:?}", log.entries());

        let main = doc.main();
        let animation = doc.sub_object(main, "animation").unwrap();
        assert_eq!(doc.get(animation, "first_frame").and_then(|v| v.as_f64()), Some(5.0));
        assert_eq!(doc.get(animation, "last_frame").and_then(|v| v.as_f64()), Some(90.0));

        let layers = doc.items(main, "shapes");
        assert_eq!(layers.len(), 2);
        assert_eq!(doc.object(layers[0]).unwrap().type_name(), "Layer");
        assert_eq!(doc.items(layers[0], "shapes").len(), 1);
        assert_eq!(doc.object(layers[1]).unwrap().type_name(), "Layer");
        assert!(doc.items(layers[1], "shapes").is_empty());
    }

    #[test]
    fn wrong_top_level_type_is_reported() {
        let (_, log) = import(json!({"animation": {"__type__": "Group"}}));
        assert!(log
            .warnings()
            .any(|w| w.contains("expected 'MainComposition' but got 'Group'")));
    }
}
