use bitflags::bitflags;

bitflags! {
    /// Behavioural flags attached to a property declaration.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PropertyFlags: u16 {
        const LIST = 1 << 0;
        const ANIMATED = 1 << 1;
        /// Changing it affects rendering
        const VISUAL = 1 << 2;
        /// Float in 0..=1, shown to users as a percentage
        const PERCENT = 1 << 3;
        const OPTIONAL = 1 << 4;
        const HIDDEN = 1 << 5;
        const READ_ONLY = 1 << 6;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PropertyType {
    #[default]
    Unknown,
    /// Owned sub-object
    Object,
    ObjectReference,
    Bool,
    Int,
    Float,
    Point,
    Color,
    Size,
    String,
    Enum,
    Uuid,
    Bezier,
    Gradient,
    Data,
}

impl PropertyType {
    pub fn is_object(self) -> bool {
        matches!(self, PropertyType::Object | PropertyType::ObjectReference)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PropertyTraits {
    pub kind: PropertyType,
    pub flags: PropertyFlags,
}

impl PropertyTraits {
    pub const fn new(kind: PropertyType, flags: PropertyFlags) -> Self {
        Self { kind, flags }
    }

    pub fn is_animated(self) -> bool {
        self.flags.contains(PropertyFlags::ANIMATED)
    }

    pub fn is_list(self) -> bool {
        self.flags.contains(PropertyFlags::LIST)
    }

    pub fn is_visual(self) -> bool {
        self.flags.contains(PropertyFlags::VISUAL)
    }

    /// Whether a user interface may offer the property for editing.
    pub fn user_editable(self) -> bool {
        !self.flags.intersects(PropertyFlags::HIDDEN | PropertyFlags::READ_ONLY)
    }
}
