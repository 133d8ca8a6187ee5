use super::property::{Property, Slot};
use super::registry::{ObjectKind, ObjectType};
use super::value::Value;
use indexmap::IndexMap;
use tracing::error;

/// A typed bag of properties, in declaration order.
#[derive(Debug, Clone)]
pub struct Object {
    type_info: &'static ObjectType,
    properties: IndexMap<String, Property>,
}

impl Object {
    pub(crate) fn new(type_info: &'static ObjectType) -> Self {
        let properties = type_info
            .properties
            .iter()
            .map(|decl| (decl.name.to_owned(), Property::from_decl(decl)))
            .collect();
        Self {
            type_info,
            properties,
        }
    }

    pub fn type_info(&self) -> &'static ObjectType {
        self.type_info
    }

    pub fn type_name(&self) -> &'static str {
        self.type_info.name
    }

    pub fn kind(&self) -> ObjectKind {
        self.type_info.kind
    }

    /// Whether the object's type is `type_name` or derives from it.
    pub fn is_instance(&self, type_name: &str) -> bool {
        self.type_info.is_instance(type_name)
    }

    pub fn properties(&self) -> impl Iterator<Item = &Property> {
        self.properties.values()
    }

    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.get(name)
    }

    pub(crate) fn property_mut(&mut self, name: &str) -> Option<&mut Property> {
        self.properties.get_mut(name)
    }

    pub(crate) fn properties_mut(&mut self) -> impl Iterator<Item = &mut Property> {
        self.properties.values_mut()
    }

    /// Looks a property up by name, then by alias.
    pub fn find_property(&self, key: &str) -> Option<&Property> {
        self.property(key)
            .or_else(|| self.properties.values().find(|p| p.alias() == Some(key)))
    }

    pub fn has(&self, name: &str) -> bool {
        self.properties.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.property(name).map(Property::value)
    }

    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.get(name)?.as_f64()
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name)?.as_bool()
    }

    pub fn name(&self) -> String {
        self.get("name")
            .and_then(|v| v.as_str().map(str::to_owned))
            .unwrap_or_default()
    }

    /// Sets a plain value, running the property's validator first.
    /// Returns false without changing anything on rejection.
    pub fn set_value(&mut self, name: &str, value: Value) -> bool {
        let Some(prop) = self.properties.get(name) else {
            return false;
        };
        if let Slot::Scalar {
            validator: Some(validator),
            ..
        } = prop.slot()
        {
            let Some(coerced) = value.coerce(prop.kind()) else {
                return false;
            };
            if !validator(self, &coerced) {
                return false;
            }
        }
        self.properties
            .get_mut(name)
            .is_some_and(|prop| prop.set_value(value))
    }

    /// Registers an extra property. Names are unique per object.
    pub fn add_property(&mut self, property: Property) -> bool {
        if self.properties.contains_key(property.name()) {
            error!(
                property = property.name(),
                object = self.type_name(),
                "Property registered twice"
            );
            return false;
        }
        self.properties.insert(property.name().to_owned(), property);
        true
    }
}
