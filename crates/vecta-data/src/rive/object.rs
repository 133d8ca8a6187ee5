use super::type_def::{ObjectDefinition, PropertyDef, TypeId};
use std::collections::HashMap;

/// A decoded property value, tagged with its wire type.
#[derive(Debug, Clone, PartialEq)]
pub enum RiveValue {
    Uint(u64),
    Bool(bool),
    String(String),
    Bytes(Vec<u8>),
    Float(f32),
    /// 0xAARRGGBB
    Color(u32),
}

impl RiveValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            RiveValue::Float(v) => Some(f64::from(*v)),
            RiveValue::Uint(v) => Some(*v as f64),
            RiveValue::Bool(v) => Some(if *v { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            RiveValue::Uint(v) => Some(*v),
            RiveValue::Bool(v) => Some(u64::from(*v)),
            RiveValue::Float(v) if *v >= 0.0 => Some(*v as u64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            RiveValue::Bool(v) => Some(*v),
            RiveValue::Uint(v) => Some(*v != 0),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            RiveValue::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_color(&self) -> Option<u32> {
        match self {
            RiveValue::Color(v) => Some(*v),
            RiveValue::Uint(v) => u32::try_from(*v).ok(),
            _ => None,
        }
    }
}

/// Keyframe records attached to one property of an object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyAnimation {
    pub property_id: u64,
    /// Arena indices of keyframe records
    pub keyframes: Vec<usize>,
}

/// Decode-time record.
///
/// Records live in one flat arena for the whole decode; `children` and
/// keyframe lists are indices into that arena.
#[derive(Debug, Clone)]
pub struct RiveObject {
    pub type_id: TypeId,
    /// Most derived first
    pub definitions: Vec<&'static ObjectDefinition>,
    pub properties: HashMap<&'static str, RiveValue>,
    pub property_definitions: HashMap<u64, PropertyDef>,
    pub children: Vec<usize>,
    pub animations: Vec<PropertyAnimation>,
}

impl Default for RiveObject {
    fn default() -> Self {
        Self::placeholder()
    }
}

impl RiveObject {
    /// Stand-in for a record that failed to decode, so arena indices stay
    /// aligned with the file's object order.
    pub fn placeholder() -> Self {
        Self {
            type_id: TypeId::NO_TYPE,
            definitions: Vec::new(),
            properties: HashMap::new(),
            property_definitions: HashMap::new(),
            children: Vec::new(),
            animations: Vec::new(),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.type_id == TypeId::NO_TYPE
    }

    pub fn type_name(&self) -> &'static str {
        self.definitions.first().map_or("NoType", |d| d.name)
    }

    pub fn has_type(&self, id: TypeId) -> bool {
        self.type_id == id || self.definitions.iter().any(|d| d.type_id == id)
    }

    pub fn has_value(&self, name: &str) -> bool {
        self.properties.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&RiveValue> {
        self.properties.get(name)
    }

    pub fn get_f64(&self, name: &str, default: f64) -> f64 {
        self.get(name).and_then(RiveValue::as_f64).unwrap_or(default)
    }

    pub fn get_u64(&self, name: &str, default: u64) -> u64 {
        self.get(name).and_then(RiveValue::as_u64).unwrap_or(default)
    }

    pub fn get_bool(&self, name: &str, default: bool) -> bool {
        self.get(name).and_then(RiveValue::as_bool).unwrap_or(default)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(RiveValue::as_str)
    }

    pub fn get_color(&self, name: &str, default: u32) -> u32 {
        self.get(name).and_then(RiveValue::as_color).unwrap_or(default)
    }

    pub fn property_name(&self, id: u64) -> Option<&'static str> {
        self.property_definitions.get(&id).map(|p| p.name)
    }

    /// Appends a keyframe to the animation track of `property_id`, creating
    /// the track on first use.
    pub fn push_keyframe(&mut self, property_id: u64, keyframe: usize) {
        match self
            .animations
            .iter_mut()
            .find(|a| a.property_id == property_id)
        {
            Some(track) => track.keyframes.push(keyframe),
            None => self.animations.push(PropertyAnimation {
                property_id,
                keyframes: vec![keyframe],
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rive::DefinitionTable;

    #[test]
    fn has_type_follows_inheritance() {
        let (definitions, property_definitions) =
            DefinitionTable::global().gather(TypeId::RECTANGLE).unwrap();
        let object = RiveObject {
            type_id: TypeId::RECTANGLE,
            definitions,
            property_definitions,
            ..RiveObject::placeholder()
        };
        assert!(object.has_type(TypeId::PARAMETRIC_PATH));
        assert!(object.has_type(TypeId::COMPONENT));
        assert!(!object.has_type(TypeId::SHAPE));
        assert_eq!(object.type_name(), "Rectangle");
        assert_eq!(object.property_name(31), Some("cornerRadiusTL"));
    }

    #[test]
    fn getters_fall_back_to_defaults() {
        let mut object = RiveObject::placeholder();
        object.properties.insert("width", RiveValue::Float(12.5));
        object.properties.insert("points", RiveValue::Uint(6));
        assert_eq!(object.get_f64("width", 0.0), 12.5);
        assert_eq!(object.get_f64("height", 3.0), 3.0);
        assert_eq!(object.get_u64("points", 5), 6);
        assert!(object.get_bool("isVisible", true));
    }

    #[test]
    fn keyframes_group_by_property() {
        let mut object = RiveObject::placeholder();
        object.push_keyframe(13, 4);
        object.push_keyframe(14, 5);
        object.push_keyframe(13, 6);
        assert_eq!(object.animations.len(), 2);
        assert_eq!(object.animations[0].keyframes, vec![4, 6]);
    }
}
