//! Dynamically typed property values.

use super::traits::PropertyType;
use super::NodeId;
use crate::math::bezier::Bezier;
use glam::DVec2;
use kurbo::Size;
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// 8-bit RGBA color. Alpha 0 doubles as the "unset" sentinel for group colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r, g, b, 255)
    }

    /// From a packed `0xAARRGGBB` value.
    pub fn from_argb(argb: u32) -> Self {
        let [a, r, g, b] = argb.to_be_bytes();
        Self { r, g, b, a }
    }

    pub fn to_argb(self) -> u32 {
        u32::from_be_bytes([self.a, self.r, self.g, self.b])
    }

    /// Parses `#RGB`, `#RRGGBB` or `#RRGGBBAA`.
    pub fn from_hex(text: &str) -> Option<Self> {
        let hex = text.strip_prefix('#')?;
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        match hex.len() {
            3 => {
                let nibble = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok().map(|v| v * 17);
                Some(Color::rgb(nibble(0)?, nibble(1)?, nibble(2)?))
            }
            6 => Some(Color::rgb(byte(0)?, byte(2)?, byte(4)?)),
            8 => Some(Color::rgba(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
            _ => None,
        }
    }

    /// `#rrggbbaa`
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
    }

    /// Whether the color is set, as opposed to the transparent sentinel.
    pub fn is_valid(self) -> bool {
        self.a > 0
    }

    pub fn alpha_f(self) -> f64 {
        f64::from(self.a) / 255.0
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientStop {
    pub offset: f64,
    pub color: Color,
}

impl GradientStop {
    pub fn new(offset: f64, color: Color) -> Self {
        Self { offset, color }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Point(DVec2),
    Size(Size),
    Color(Color),
    String(String),
    Uuid(Uuid),
    Bezier(Bezier),
    Gradient(Vec<GradientStop>),
    Data(Vec<u8>),
    /// Owned sub-object or referenced node
    Node(NodeId),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Point(_) => "point",
            Value::Size(_) => "size",
            Value::Color(_) => "color",
            Value::String(_) => "string",
            Value::Uuid(_) => "uuid",
            Value::Bezier(_) => "bezier",
            Value::Gradient(_) => "gradient",
            Value::Data(_) => "data",
            Value::Node(_) => "node",
            Value::List(_) => "list",
            Value::Map(_) => "map",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Int(v) => Some(*v as f64),
            Value::Bool(v) => Some(if *v { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            Value::Float(v) if v.is_finite() => Some(v.round() as i64),
            Value::Bool(v) => Some(i64::from(*v)),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            Value::Int(v) => Some(*v != 0),
            _ => None,
        }
    }

    pub fn as_point(&self) -> Option<DVec2> {
        match self {
            Value::Point(p) => Some(*p),
            Value::Size(s) => Some(DVec2::new(s.width, s.height)),
            _ => None,
        }
    }

    pub fn as_size(&self) -> Option<Size> {
        match self {
            Value::Size(s) => Some(*s),
            Value::Point(p) => Some(Size::new(p.x, p.y)),
            _ => None,
        }
    }

    pub fn as_color(&self) -> Option<Color> {
        match self {
            Value::Color(c) => Some(*c),
            Value::String(s) => Color::from_hex(s),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_uuid(&self) -> Option<Uuid> {
        match self {
            Value::Uuid(u) => Some(*u),
            Value::String(s) => Uuid::parse_str(s).ok(),
            _ => None,
        }
    }

    pub fn as_bezier(&self) -> Option<&Bezier> {
        match self {
            Value::Bezier(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_gradient(&self) -> Option<&[GradientStop]> {
        match self {
            Value::Gradient(g) => Some(g),
            _ => None,
        }
    }

    pub fn as_node(&self) -> Option<NodeId> {
        match self {
            Value::Node(id) => Some(*id),
            _ => None,
        }
    }

    /// Converts to the representation a property of type `kind` stores.
    /// `None` means the value is unacceptable for that type.
    pub fn coerce(&self, kind: PropertyType) -> Option<Value> {
        match kind {
            PropertyType::Unknown => Some(self.clone()),
            PropertyType::Bool => self.as_bool().map(Value::Bool),
            PropertyType::Int | PropertyType::Enum => self.as_i64().map(Value::Int),
            PropertyType::Float => self.as_f64().map(Value::Float),
            PropertyType::Point => match self {
                Value::List(items) if items.len() == 2 => {
                    Some(Value::Point(DVec2::new(items[0].as_f64()?, items[1].as_f64()?)))
                }
                _ => self.as_point().map(Value::Point),
            },
            PropertyType::Size => self.as_size().map(Value::Size),
            PropertyType::Color => self.as_color().map(Value::Color),
            PropertyType::String => self.as_str().map(|s| Value::String(s.to_owned())),
            PropertyType::Uuid => self.as_uuid().map(Value::Uuid),
            PropertyType::Bezier => self.as_bezier().map(|b| Value::Bezier(b.clone())),
            PropertyType::Gradient => self.as_gradient().map(|g| Value::Gradient(g.to_vec())),
            PropertyType::Data => match self {
                Value::Data(d) => Some(Value::Data(d.clone())),
                _ => None,
            },
            PropertyType::Object | PropertyType::ObjectReference => match self {
                Value::Node(_) | Value::Null => Some(self.clone()),
                _ => None,
            },
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Int(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Point(p) => write!(f, "({}, {})", p.x, p.y),
            Value::Size(s) => write!(f, "{}x{}", s.width, s.height),
            Value::Color(c) => write!(f, "{}", c),
            Value::String(s) => f.write_str(s),
            Value::Uuid(u) => write!(f, "{}", u),
            Value::Bezier(b) => write!(
                f,
                "bezier({} points{})",
                b.len(),
                if b.closed() { ", closed" } else { "" }
            ),
            Value::Gradient(g) => write!(f, "gradient({} stops)", g.len()),
            Value::Data(d) => write!(f, "data({} bytes)", d.len()),
            Value::Node(id) => write!(f, "node#{}", id),
            Value::List(items) => write!(f, "list({})", items.len()),
            Value::Map(map) => write!(f, "map({})", map.len()),
        }
    }
}

macro_rules! value_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(impl From<$ty> for Value {
            fn from(value: $ty) -> Self {
                Value::$variant(value.into())
            }
        })*
    };
}

value_from! {
    bool => Bool,
    i32 => Int,
    i64 => Int,
    f64 => Float,
    f32 => Float,
    DVec2 => Point,
    Size => Size,
    Color => Color,
    String => String,
    &str => String,
    Uuid => Uuid,
    Bezier => Bezier,
    Vec<GradientStop> => Gradient,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_colors_parse_alpha_last() {
        assert_eq!(Color::from_hex("#ff000080"), Some(Color::rgba(255, 0, 0, 128)));
        assert_eq!(Color::from_hex("#00ff00"), Some(Color::rgb(0, 255, 0)));
        assert_eq!(Color::from_hex("#fff"), Some(Color::WHITE));
        assert_eq!(Color::from_hex("00ff00"), None);
        assert_eq!(Color::from_hex("#12345"), None);
        assert_eq!(Color::rgba(1, 2, 3, 4).to_hex(), "#01020304");
    }

    #[test]
    fn argb_packing() {
        let color = Color::from_argb(0x80ff7f00);
        assert_eq!(color, Color::rgba(255, 127, 0, 128));
        assert_eq!(color.to_argb(), 0x80ff7f00);
    }

    #[test]
    fn coercion_follows_property_type() {
        assert_eq!(Value::Int(3).coerce(PropertyType::Float), Some(Value::Float(3.0)));
        assert_eq!(Value::Float(2.6).coerce(PropertyType::Int), Some(Value::Int(3)));
        assert_eq!(
            Value::from("#00000000").coerce(PropertyType::Color),
            Some(Value::Color(Color::TRANSPARENT))
        );
        assert_eq!(Value::from("text").coerce(PropertyType::Float), None);
        assert_eq!(
            Value::List(vec![Value::Float(1.0), Value::Int(2)]).coerce(PropertyType::Point),
            Some(Value::Point(DVec2::new(1.0, 2.0)))
        );
        assert_eq!(Value::Float(1.0).coerce(PropertyType::ObjectReference), None);
    }
}
