//! Properties owned by an [`Object`].

use super::animatable::Animatable;
use super::document::Document;
use super::object::Object;
use super::registry::{Init, PropertyDecl};
use super::traits::{PropertyTraits, PropertyType};
use super::value::Value;
use super::NodeId;
use std::borrow::Cow;
use uuid::Uuid;

/// Extra acceptance check run before a scalar changes.
pub type Validator = fn(&Object, &Value) -> bool;

/// Capabilities a reference property uses to vet its targets.
#[derive(Clone, Copy)]
pub struct ReferencePolicy {
    pub valid_options: fn(&Document, NodeId) -> Vec<NodeId>,
    pub is_valid_option: fn(&Document, NodeId, NodeId) -> bool,
}

impl ReferencePolicy {
    /// Accepts any live node.
    pub const ANY: ReferencePolicy = ReferencePolicy {
        valid_options: any_options,
        is_valid_option: any_option,
    };
}

fn any_options(doc: &Document, _: NodeId) -> Vec<NodeId> {
    doc.node_ids().collect()
}

fn any_option(doc: &Document, _: NodeId, target: NodeId) -> bool {
    doc.node(target).is_some()
}

impl std::fmt::Debug for ReferencePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ReferencePolicy")
    }
}

#[derive(Debug, Clone)]
pub enum Slot {
    Scalar {
        value: Value,
        validator: Option<Validator>,
    },
    /// Not writable through the generic setters
    Fixed(Value),
    Animated(Animatable),
    Reference {
        target: Option<NodeId>,
        policy: ReferencePolicy,
    },
    /// Owned sub-object
    Object {
        node: Option<NodeId>,
        type_name: &'static str,
    },
    /// Owned children of a given type
    ObjectList {
        items: Vec<NodeId>,
        element: &'static str,
    },
    /// Extension property with no declaration
    Unknown(Value),
}

#[derive(Debug, Clone)]
pub struct Property {
    name: Cow<'static, str>,
    alias: Option<&'static str>,
    traits: PropertyTraits,
    slot: Slot,
}

impl Property {
    pub fn scalar(name: impl Into<Cow<'static, str>>, traits: PropertyTraits, value: Value) -> Self {
        Self {
            name: name.into(),
            alias: None,
            traits,
            slot: Slot::Scalar {
                value,
                validator: None,
            },
        }
    }

    pub fn unknown(name: impl Into<Cow<'static, str>>, value: Value) -> Self {
        Self {
            name: name.into(),
            alias: None,
            traits: PropertyTraits::default(),
            slot: Slot::Unknown(value),
        }
    }

    pub(crate) fn from_decl(decl: &PropertyDecl) -> Self {
        let slot = match &decl.init {
            Init::Scalar(value) => Slot::Scalar {
                value: value.clone(),
                validator: None,
            },
            Init::Validated(value, validator) => Slot::Scalar {
                value: value.clone(),
                validator: Some(*validator),
            },
            Init::Uuid => Slot::Fixed(Value::Uuid(Uuid::new_v4())),
            Init::Animated(value) => Slot::Animated(Animatable::new(decl.traits.kind, value.clone())),
            Init::Reference(policy) => Slot::Reference {
                target: None,
                policy: *policy,
            },
            Init::Object(type_name) => Slot::Object {
                node: None,
                type_name,
            },
            Init::ObjectList(element) => Slot::ObjectList {
                items: Vec::new(),
                element,
            },
        };
        Self {
            name: Cow::Borrowed(decl.name),
            alias: decl.alias,
            traits: decl.traits,
            slot,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Alternative key used by external formats.
    pub fn alias(&self) -> Option<&'static str> {
        self.alias
    }

    pub fn traits(&self) -> PropertyTraits {
        self.traits
    }

    pub fn kind(&self) -> PropertyType {
        self.traits.kind
    }

    pub fn slot(&self) -> &Slot {
        &self.slot
    }

    pub(crate) fn slot_mut(&mut self) -> &mut Slot {
        &mut self.slot
    }

    pub fn animatable(&self) -> Option<&Animatable> {
        match &self.slot {
            Slot::Animated(anim) => Some(anim),
            _ => None,
        }
    }

    pub fn animatable_mut(&mut self) -> Option<&mut Animatable> {
        match &mut self.slot {
            Slot::Animated(anim) => Some(anim),
            _ => None,
        }
    }

    pub fn value(&self) -> Value {
        match &self.slot {
            Slot::Scalar { value, .. } | Slot::Fixed(value) | Slot::Unknown(value) => value.clone(),
            Slot::Animated(anim) => anim.value().clone(),
            Slot::Reference { target, .. } => target.map_or(Value::Null, Value::Node),
            Slot::Object { node, .. } => node.map_or(Value::Null, Value::Node),
            Slot::ObjectList { items, .. } => {
                Value::List(items.iter().copied().map(Value::Node).collect())
            }
        }
    }

    /// Whether `set_value` would take `value`, ignoring validators.
    pub fn accepts(&self, value: &Value) -> bool {
        match &self.slot {
            Slot::Scalar { .. } => value.coerce(self.traits.kind).is_some(),
            Slot::Animated(anim) => anim.accepts(value),
            Slot::Unknown(_) => true,
            _ => false,
        }
    }

    /// Sets plain values. Node-valued slots go through the [`Document`].
    pub fn set_value(&mut self, new_value: Value) -> bool {
        let kind = self.traits.kind;
        match &mut self.slot {
            Slot::Scalar { value, .. } => match new_value.coerce(kind) {
                Some(coerced) => {
                    *value = coerced;
                    true
                }
                None => false,
            },
            Slot::Animated(anim) => anim.set_value(new_value),
            Slot::Unknown(value) => {
                *value = new_value;
                true
            }
            _ => false,
        }
    }

    /// Copies value or keyframes from a property with the same traits.
    pub fn assign_from(&mut self, other: &Property) -> bool {
        if other.traits != self.traits {
            return false;
        }
        match (&mut self.slot, &other.slot) {
            (Slot::Animated(anim), Slot::Animated(source)) => anim.assign_from(source),
            (Slot::Reference { target, .. }, Slot::Reference { target: source, .. }) => {
                *target = *source;
                true
            }
            (Slot::Object { .. }, _) | (Slot::ObjectList { .. }, _) => false,
            _ => self.set_value(other.value()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::traits::PropertyFlags;

    #[test]
    fn scalar_rejects_mismatch_without_change() {
        let mut prop = Property::scalar(
            "width",
            PropertyTraits::new(PropertyType::Float, PropertyFlags::VISUAL),
            Value::Float(1.0),
        );
        assert!(!prop.set_value(Value::from("wide")));
        assert_eq!(prop.value(), Value::Float(1.0));
        assert!(prop.set_value(Value::Int(3)));
        assert_eq!(prop.value(), Value::Float(3.0));
    }

    #[test]
    fn assign_requires_same_traits() {
        let traits = PropertyTraits::new(PropertyType::Float, PropertyFlags::empty());
        let mut a = Property::scalar("a", traits, Value::Float(1.0));
        let b = Property::scalar("b", traits, Value::Float(2.0));
        let c = Property::scalar(
            "c",
            PropertyTraits::new(PropertyType::Int, PropertyFlags::empty()),
            Value::Int(5),
        );
        assert!(a.assign_from(&b));
        assert_eq!(a.value(), Value::Float(2.0));
        assert!(!a.assign_from(&c));
        assert_eq!(a.value(), Value::Float(2.0));
    }
}
