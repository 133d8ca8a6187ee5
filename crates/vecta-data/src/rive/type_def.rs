//! Static type-definition table for the rive binary format.
//!
//! The table is built once on first use and never mutated afterwards, so any
//! number of concurrent decodes can read it without locking.

use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

/// Numeric object type as it appears on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub u64);

impl TypeId {
    /// Placeholder type of records that could not be decoded.
    pub const NO_TYPE: TypeId = TypeId(0);
    pub const ARTBOARD: TypeId = TypeId(1);
    pub const NODE: TypeId = TypeId(2);
    pub const SHAPE: TypeId = TypeId(3);
    pub const ELLIPSE: TypeId = TypeId(4);
    pub const STRAIGHT_VERTEX: TypeId = TypeId(5);
    pub const CUBIC_DETACHED_VERTEX: TypeId = TypeId(6);
    pub const RECTANGLE: TypeId = TypeId(7);
    pub const TRIANGLE: TypeId = TypeId(8);
    pub const COMPONENT: TypeId = TypeId(10);
    pub const CONTAINER_COMPONENT: TypeId = TypeId(11);
    pub const PATH: TypeId = TypeId(12);
    pub const DRAWABLE: TypeId = TypeId(13);
    pub const PATH_VERTEX: TypeId = TypeId(14);
    pub const PARAMETRIC_PATH: TypeId = TypeId(15);
    pub const POINTS_PATH: TypeId = TypeId(16);
    pub const RADIAL_GRADIENT: TypeId = TypeId(17);
    pub const SOLID_COLOR: TypeId = TypeId(18);
    pub const GRADIENT_STOP: TypeId = TypeId(19);
    pub const FILL: TypeId = TypeId(20);
    pub const SHAPE_PAINT: TypeId = TypeId(21);
    pub const LINEAR_GRADIENT: TypeId = TypeId(22);
    pub const BACKBOARD: TypeId = TypeId(23);
    pub const STROKE: TypeId = TypeId(24);
    pub const KEYED_OBJECT: TypeId = TypeId(25);
    pub const KEYED_PROPERTY: TypeId = TypeId(26);
    pub const ANIMATION: TypeId = TypeId(27);
    pub const CUBIC_INTERPOLATOR: TypeId = TypeId(28);
    pub const KEY_FRAME: TypeId = TypeId(29);
    pub const KEY_FRAME_DOUBLE: TypeId = TypeId(30);
    pub const LINEAR_ANIMATION: TypeId = TypeId(31);
    pub const CUBIC_ASYMMETRIC_VERTEX: TypeId = TypeId(34);
    pub const CUBIC_MIRRORED_VERTEX: TypeId = TypeId(35);
    pub const CUBIC_VERTEX: TypeId = TypeId(36);
    pub const KEY_FRAME_COLOR: TypeId = TypeId(37);
    pub const TRANSFORM_COMPONENT: TypeId = TypeId(38);
    pub const SKELETAL_COMPONENT: TypeId = TypeId(39);
    pub const BONE: TypeId = TypeId(40);
    pub const ROOT_BONE: TypeId = TypeId(41);
    pub const CLIPPING_SHAPE: TypeId = TypeId(42);
    pub const TRIM_PATH: TypeId = TypeId(47);
    pub const KEY_FRAME_ID: TypeId = TypeId(50);
    pub const POLYGON: TypeId = TypeId(51);
    pub const STAR: TypeId = TypeId(52);
    pub const WORLD_TRANSFORM_COMPONENT: TypeId = TypeId(91);
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Wire encoding of a property value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PropertyType {
    VarUint,
    /// Single byte
    Bool,
    String,
    /// Length-prefixed raw bytes
    Bytes,
    /// 32-bit little endian float
    Float,
    /// 32-bit ARGB
    Color,
}

impl PropertyType {
    /// Maps the 2-bit field type used by the header's property table.
    pub fn from_field_type(field: u32) -> Self {
        match field & 3 {
            1 => PropertyType::String,
            2 => PropertyType::Float,
            3 => PropertyType::Color,
            _ => PropertyType::VarUint,
        }
    }

    pub fn field_type(self) -> u32 {
        match self {
            PropertyType::VarUint | PropertyType::Bool => 0,
            PropertyType::String | PropertyType::Bytes => 1,
            PropertyType::Float => 2,
            PropertyType::Color => 3,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PropertyDef {
    pub name: &'static str,
    pub kind: PropertyType,
}

#[derive(Clone, Debug)]
pub struct ObjectDefinition {
    pub name: &'static str,
    pub type_id: TypeId,
    pub extends: Option<TypeId>,
    pub properties: HashMap<u64, PropertyDef>,
}

pub struct DefinitionTable {
    objects: HashMap<TypeId, ObjectDefinition>,
    properties: HashMap<u64, PropertyDef>,
}

static TABLE: OnceLock<DefinitionTable> = OnceLock::new();

impl DefinitionTable {
    pub fn global() -> &'static DefinitionTable {
        TABLE.get_or_init(Self::build)
    }

    pub fn object(&self, type_id: TypeId) -> Option<&ObjectDefinition> {
        self.objects.get(&type_id)
    }

    /// Looks up a property key regardless of which type declares it.
    /// Keys are unique across the whole format.
    pub fn property(&self, id: u64) -> Option<&PropertyDef> {
        self.properties.get(&id)
    }

    /// Walks the inheritance chain of `type_id`, most derived first.
    ///
    /// Property ids are accumulated first-insert-wins, so a derived type's
    /// definition shadows a base definition with the same id.
    pub fn gather(
        &self,
        type_id: TypeId,
    ) -> Result<(Vec<&ObjectDefinition>, HashMap<u64, PropertyDef>), TypeId> {
        let mut definitions = Vec::new();
        let mut properties = HashMap::new();
        let mut current = Some(type_id);

        while let Some(id) = current {
            let def = self.objects.get(&id).ok_or(id)?;
            // Guard against a malformed chain looping back on itself
            if definitions.iter().any(|d: &&ObjectDefinition| d.type_id == id) {
                break;
            }
            for (key, prop) in &def.properties {
                properties.entry(*key).or_insert_with(|| prop.clone());
            }
            definitions.push(def);
            current = def.extends;
        }

        Ok((definitions, properties))
    }

    fn build() -> Self {
        use PropertyType::*;

        let mut table = DefinitionTable {
            objects: HashMap::new(),
            properties: HashMap::new(),
        };

        table.define("Component", TypeId::COMPONENT, None, &[(4, "name", String), (5, "parentId", VarUint)]);
        table.define("ContainerComponent", TypeId::CONTAINER_COMPONENT, Some(TypeId::COMPONENT), &[]);
        table.define(
            "Artboard",
            TypeId::ARTBOARD,
            Some(TypeId::CONTAINER_COMPONENT),
            &[
                (7, "width", Float),
                (8, "height", Float),
                (9, "x", Float),
                (10, "y", Float),
                (11, "originX", Float),
                (12, "originY", Float),
            ],
        );
        table.define("Backboard", TypeId::BACKBOARD, None, &[]);
        table.define(
            "WorldTransformComponent",
            TypeId::WORLD_TRANSFORM_COMPONENT,
            Some(TypeId::CONTAINER_COMPONENT),
            &[(18, "opacity", Float)],
        );
        table.define(
            "TransformComponent",
            TypeId::TRANSFORM_COMPONENT,
            Some(TypeId::WORLD_TRANSFORM_COMPONENT),
            &[(15, "rotation", Float), (16, "scaleX", Float), (17, "scaleY", Float)],
        );
        table.define("Node", TypeId::NODE, Some(TypeId::TRANSFORM_COMPONENT), &[(13, "x", Float), (14, "y", Float)]);
        table.define(
            "Drawable",
            TypeId::DRAWABLE,
            Some(TypeId::NODE),
            &[(23, "blendModeValue", VarUint), (129, "drawableFlags", VarUint)],
        );
        table.define("Shape", TypeId::SHAPE, Some(TypeId::DRAWABLE), &[]);
        table.define("Path", TypeId::PATH, Some(TypeId::NODE), &[(128, "pathFlags", VarUint)]);
        table.define(
            "ParametricPath",
            TypeId::PARAMETRIC_PATH,
            Some(TypeId::PATH),
            &[
                (20, "width", Float),
                (21, "height", Float),
                (123, "originX", Float),
                (124, "originY", Float),
            ],
        );
        table.define(
            "Rectangle",
            TypeId::RECTANGLE,
            Some(TypeId::PARAMETRIC_PATH),
            &[
                (31, "cornerRadiusTL", Float),
                (161, "cornerRadiusTR", Float),
                (162, "cornerRadiusBL", Float),
                (163, "cornerRadiusBR", Float),
                (164, "linkCornerRadius", Bool),
            ],
        );
        table.define("Ellipse", TypeId::ELLIPSE, Some(TypeId::PARAMETRIC_PATH), &[]);
        table.define("Triangle", TypeId::TRIANGLE, Some(TypeId::PARAMETRIC_PATH), &[]);
        table.define(
            "Polygon",
            TypeId::POLYGON,
            Some(TypeId::PARAMETRIC_PATH),
            &[(125, "points", VarUint), (126, "cornerRadius", Float)],
        );
        table.define("Star", TypeId::STAR, Some(TypeId::POLYGON), &[(127, "innerRadius", Float)]);
        table.define("PointsPath", TypeId::POINTS_PATH, Some(TypeId::PATH), &[(32, "isClosed", Bool)]);
        table.define(
            "PathVertex",
            TypeId::PATH_VERTEX,
            Some(TypeId::CONTAINER_COMPONENT),
            &[(24, "x", Float), (25, "y", Float)],
        );
        table.define("StraightVertex", TypeId::STRAIGHT_VERTEX, Some(TypeId::PATH_VERTEX), &[(26, "radius", Float)]);
        table.define("CubicVertex", TypeId::CUBIC_VERTEX, Some(TypeId::PATH_VERTEX), &[]);
        table.define(
            "CubicMirroredVertex",
            TypeId::CUBIC_MIRRORED_VERTEX,
            Some(TypeId::CUBIC_VERTEX),
            &[(82, "rotation", Float), (83, "distance", Float)],
        );
        table.define(
            "CubicAsymmetricVertex",
            TypeId::CUBIC_ASYMMETRIC_VERTEX,
            Some(TypeId::CUBIC_VERTEX),
            &[(79, "rotation", Float), (80, "inDistance", Float), (81, "outDistance", Float)],
        );
        table.define(
            "CubicDetachedVertex",
            TypeId::CUBIC_DETACHED_VERTEX,
            Some(TypeId::CUBIC_VERTEX),
            &[
                (84, "inRotation", Float),
                (85, "inDistance", Float),
                (86, "outRotation", Float),
                (87, "outDistance", Float),
            ],
        );
        table.define("ShapePaint", TypeId::SHAPE_PAINT, Some(TypeId::CONTAINER_COMPONENT), &[(41, "isVisible", Bool)]);
        table.define("Fill", TypeId::FILL, Some(TypeId::SHAPE_PAINT), &[(40, "fillRule", VarUint)]);
        table.define(
            "Stroke",
            TypeId::STROKE,
            Some(TypeId::SHAPE_PAINT),
            &[
                (47, "thickness", Float),
                (48, "cap", VarUint),
                (49, "join", VarUint),
                (50, "transformAffectsStroke", Bool),
            ],
        );
        table.define("SolidColor", TypeId::SOLID_COLOR, Some(TypeId::COMPONENT), &[(37, "colorValue", Color)]);
        table.define(
            "LinearGradient",
            TypeId::LINEAR_GRADIENT,
            Some(TypeId::CONTAINER_COMPONENT),
            &[
                (42, "startX", Float),
                (33, "startY", Float),
                (34, "endX", Float),
                (35, "endY", Float),
                (46, "opacity", Float),
            ],
        );
        table.define("RadialGradient", TypeId::RADIAL_GRADIENT, Some(TypeId::LINEAR_GRADIENT), &[]);
        table.define(
            "GradientStop",
            TypeId::GRADIENT_STOP,
            Some(TypeId::COMPONENT),
            &[(38, "colorValue", Color), (39, "position", Float)],
        );
        table.define(
            "TrimPath",
            TypeId::TRIM_PATH,
            Some(TypeId::COMPONENT),
            &[
                (114, "start", Float),
                (115, "end", Float),
                (116, "offset", Float),
                (117, "modeValue", VarUint),
            ],
        );
        table.define(
            "ClippingShape",
            TypeId::CLIPPING_SHAPE,
            Some(TypeId::COMPONENT),
            &[(92, "sourceId", VarUint), (93, "fillRule", VarUint), (94, "isVisible", Bool)],
        );
        table.define(
            "SkeletalComponent",
            TypeId::SKELETAL_COMPONENT,
            Some(TypeId::TRANSFORM_COMPONENT),
            &[],
        );
        table.define("Bone", TypeId::BONE, Some(TypeId::SKELETAL_COMPONENT), &[(89, "length", Float)]);
        table.define("RootBone", TypeId::ROOT_BONE, Some(TypeId::BONE), &[(90, "x", Float), (91, "y", Float)]);
        table.define("KeyedObject", TypeId::KEYED_OBJECT, None, &[(51, "objectId", VarUint)]);
        table.define("KeyedProperty", TypeId::KEYED_PROPERTY, None, &[(53, "propertyKey", VarUint)]);
        table.define("Animation", TypeId::ANIMATION, None, &[(55, "name", String)]);
        table.define(
            "LinearAnimation",
            TypeId::LINEAR_ANIMATION,
            Some(TypeId::ANIMATION),
            &[
                (56, "fps", VarUint),
                (57, "duration", VarUint),
                (58, "speed", Float),
                (59, "loopValue", VarUint),
                (60, "workStart", VarUint),
                (61, "workEnd", VarUint),
                (62, "enableWorkArea", Bool),
            ],
        );
        table.define(
            "CubicInterpolator",
            TypeId::CUBIC_INTERPOLATOR,
            None,
            &[(63, "x1", Float), (64, "y1", Float), (65, "x2", Float), (66, "y2", Float)],
        );
        table.define(
            "KeyFrame",
            TypeId::KEY_FRAME,
            None,
            &[
                (67, "frame", VarUint),
                (68, "interpolationType", VarUint),
                (69, "interpolatorId", VarUint),
            ],
        );
        table.define("KeyFrameDouble", TypeId::KEY_FRAME_DOUBLE, Some(TypeId::KEY_FRAME), &[(70, "value", Float)]);
        table.define("KeyFrameColor", TypeId::KEY_FRAME_COLOR, Some(TypeId::KEY_FRAME), &[(88, "value", Color)]);
        table.define("KeyFrameId", TypeId::KEY_FRAME_ID, Some(TypeId::KEY_FRAME), &[(122, "value", VarUint)]);

        table
    }

    fn define(
        &mut self,
        name: &'static str,
        type_id: TypeId,
        extends: Option<TypeId>,
        properties: &[(u64, &'static str, PropertyType)],
    ) {
        let properties: HashMap<u64, PropertyDef> = properties
            .iter()
            .map(|&(id, name, kind)| (id, PropertyDef { name, kind }))
            .collect();

        for (id, prop) in &properties {
            self.properties.insert(*id, prop.clone());
        }

        self.objects.insert(
            type_id,
            ObjectDefinition {
                name,
                type_id,
                extends,
                properties,
            },
        );
    }
}
