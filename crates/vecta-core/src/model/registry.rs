//! Built-in object types and their property declarations.
//!
//! The table is built once on first use and is read-only afterwards.

use super::document::Document;
use super::property::{ReferencePolicy, Validator};
use super::traits::{PropertyFlags, PropertyTraits, PropertyType};
use super::value::{Color, Value};
use super::NodeId;
use glam::DVec2;
use kurbo::Size;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Behaviour families shared by several types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Generic,
    Transform,
    AnimationContainer,
    Composition,
    Group,
    Layer,
    PreCompLayer,
    Rect,
    Ellipse,
    PolyStar,
    Path,
    Trim,
    Fill,
    Stroke,
    Assets,
    AssetList,
    NamedColor,
    GradientColors,
    Gradient,
}

impl ObjectKind {
    pub fn is_shape(self) -> bool {
        matches!(
            self,
            ObjectKind::Rect | ObjectKind::Ellipse | ObjectKind::PolyStar | ObjectKind::Path
        )
    }

    pub fn is_styler(self) -> bool {
        matches!(self, ObjectKind::Fill | ObjectKind::Stroke)
    }
}

#[derive(Debug, Clone)]
pub enum Init {
    Scalar(Value),
    Validated(Value, Validator),
    /// Fresh random uuid per instance
    Uuid,
    Animated(Value),
    Reference(ReferencePolicy),
    Object(&'static str),
    ObjectList(&'static str),
}

#[derive(Debug, Clone)]
pub struct PropertyDecl {
    pub name: &'static str,
    pub alias: Option<&'static str>,
    pub traits: PropertyTraits,
    pub init: Init,
}

impl PropertyDecl {
    fn new(name: &'static str, kind: PropertyType, flags: PropertyFlags, init: Init) -> Self {
        Self {
            name,
            alias: None,
            traits: PropertyTraits::new(kind, flags),
            init,
        }
    }

    pub fn alias(mut self, alias: &'static str) -> Self {
        self.alias = Some(alias);
        self
    }

    pub fn flags(mut self, flags: PropertyFlags) -> Self {
        self.traits.flags |= flags;
        self
    }
}

fn scalar(name: &'static str, kind: PropertyType, value: impl Into<Value>) -> PropertyDecl {
    PropertyDecl::new(name, kind, PropertyFlags::empty(), Init::Scalar(value.into()))
}

fn validated(
    name: &'static str,
    kind: PropertyType,
    value: impl Into<Value>,
    validator: Validator,
) -> PropertyDecl {
    PropertyDecl::new(
        name,
        kind,
        PropertyFlags::empty(),
        Init::Validated(value.into(), validator),
    )
}

fn animated(name: &'static str, kind: PropertyType, value: impl Into<Value>) -> PropertyDecl {
    PropertyDecl::new(
        name,
        kind,
        PropertyFlags::ANIMATED | PropertyFlags::VISUAL,
        Init::Animated(value.into()),
    )
}

fn reference(name: &'static str, policy: ReferencePolicy) -> PropertyDecl {
    PropertyDecl::new(
        name,
        PropertyType::ObjectReference,
        PropertyFlags::empty(),
        Init::Reference(policy),
    )
}

fn object(name: &'static str, type_name: &'static str) -> PropertyDecl {
    PropertyDecl::new(
        name,
        PropertyType::Object,
        PropertyFlags::empty(),
        Init::Object(type_name),
    )
}

fn list(name: &'static str, element: &'static str) -> PropertyDecl {
    PropertyDecl::new(
        name,
        PropertyType::Object,
        PropertyFlags::LIST,
        Init::ObjectList(element),
    )
}

/// How a node exposes its children for traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildAccess {
    None,
    /// Items of an object list property
    List(&'static str),
    /// Owned sub-objects, in order
    SubObjects(&'static [&'static str]),
}

/// What a node's group parent is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grouping {
    Tree,
    /// The layer named by the `parent` reference
    LayerParent,
}

#[derive(Debug, Clone)]
pub struct ObjectType {
    pub name: &'static str,
    pub extends: Option<&'static str>,
    pub kind: ObjectKind,
    pub is_abstract: bool,
    pub document_node: bool,
    /// Every property including inherited ones, base first
    pub properties: Vec<PropertyDecl>,
    pub children: ChildAccess,
    pub grouping: Grouping,
    ancestors: Vec<&'static str>,
}

impl ObjectType {
    pub fn is_instance(&self, type_name: &str) -> bool {
        type_name.is_empty() || self.name == type_name || self.ancestors.contains(&type_name)
    }

    pub fn property(&self, name: &str) -> Option<&PropertyDecl> {
        self.properties.iter().find(|p| p.name == name)
    }
}

struct TypeBuilder {
    name: &'static str,
    extends: Option<&'static str>,
    kind: Option<ObjectKind>,
    is_abstract: bool,
    document_node: bool,
    properties: Vec<PropertyDecl>,
    children: Option<ChildAccess>,
    grouping: Option<Grouping>,
}

fn ty(name: &'static str, extends: Option<&'static str>) -> TypeBuilder {
    TypeBuilder {
        name,
        extends,
        kind: None,
        is_abstract: false,
        document_node: false,
        properties: Vec::new(),
        children: None,
        grouping: None,
    }
}

impl TypeBuilder {
    fn kind(mut self, kind: ObjectKind) -> Self {
        self.kind = Some(kind);
        self
    }

    fn abstract_type(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    fn document_node(mut self) -> Self {
        self.document_node = true;
        self
    }

    fn props(mut self, properties: Vec<PropertyDecl>) -> Self {
        self.properties = properties;
        self
    }

    fn children(mut self, children: ChildAccess) -> Self {
        self.children = Some(children);
        self
    }

    fn grouping(mut self, grouping: Grouping) -> Self {
        self.grouping = Some(grouping);
        self
    }
}

pub struct Registry {
    types: HashMap<&'static str, ObjectType>,
}

impl Registry {
    pub fn global() -> &'static Registry {
        static REGISTRY: OnceLock<Registry> = OnceLock::new();
        REGISTRY.get_or_init(Registry::build)
    }

    pub fn get(&self, name: &str) -> Option<&ObjectType> {
        self.types.get(name)
    }

    pub fn is_instance(&self, type_name: &str, base: &str) -> bool {
        self.get(type_name).is_some_and(|t| t.is_instance(base))
    }

    pub fn types(&self) -> impl Iterator<Item = &ObjectType> {
        self.types.values()
    }

    fn build() -> Registry {
        let mut types: HashMap<&'static str, ObjectType> = HashMap::new();
        for builder in builtin_types() {
            let parent = builder.extends.and_then(|name| types.get(name));
            let mut properties = parent.map(|p| p.properties.clone()).unwrap_or_default();
            properties.extend(builder.properties);
            let mut ancestors = parent.map(|p| p.ancestors.clone()).unwrap_or_default();
            if let Some(parent) = parent {
                ancestors.push(parent.name);
            }
            let object_type = ObjectType {
                name: builder.name,
                extends: builder.extends,
                kind: builder
                    .kind
                    .or(parent.map(|p| p.kind))
                    .unwrap_or(ObjectKind::Generic),
                is_abstract: builder.is_abstract,
                document_node: builder.document_node || parent.is_some_and(|p| p.document_node),
                properties,
                children: builder
                    .children
                    .or(parent.map(|p| p.children))
                    .unwrap_or(ChildAccess::None),
                grouping: builder
                    .grouping
                    .or(parent.map(|p| p.grouping))
                    .unwrap_or(Grouping::Tree),
                ancestors,
            };
            types.insert(object_type.name, object_type);
        }
        Registry { types }
    }
}

/// Trim `multiple` values
pub const TRIM_SIMULTANEOUSLY: i64 = 1;
pub const TRIM_INDIVIDUALLY: i64 = 2;
/// PolyStar `type` values
pub const STAR: i64 = 1;
pub const POLYGON: i64 = 2;
/// Gradient `type` values
pub const LINEAR_GRADIENT: i64 = 1;
pub const RADIAL_GRADIENT: i64 = 2;
/// Fill `fill_rule` values
pub const NON_ZERO: i64 = 1;
pub const EVEN_ODD: i64 = 2;
/// Stroke `cap` and `join` values
pub const BUTT_CAP: i64 = 0;
pub const ROUND_CAP: i64 = 1;
pub const SQUARE_CAP: i64 = 2;
pub const MITER_JOIN: i64 = 0;
pub const ROUND_JOIN: i64 = 1;
pub const BEVEL_JOIN: i64 = 2;

fn builtin_types() -> Vec<TypeBuilder> {
    use PropertyType as T;
    let percent = PropertyFlags::PERCENT;

    vec![
        ty("Object", None).abstract_type(),
        ty("DocumentNode", Some("Object"))
            .abstract_type()
            .document_node()
            .props(vec![
                scalar("name", T::String, ""),
                scalar("group_color", T::Color, Color::TRANSPARENT),
                PropertyDecl::new("uuid", T::Uuid, PropertyFlags::READ_ONLY, Init::Uuid),
            ]),
        ty("VisualNode", Some("DocumentNode"))
            .abstract_type()
            .props(vec![
                scalar("visible", T::Bool, true).flags(PropertyFlags::VISUAL),
                scalar("locked", T::Bool, false),
            ]),
        ty("Transform", Some("Object"))
            .kind(ObjectKind::Transform)
            .props(vec![
                animated("anchor_point", T::Point, DVec2::ZERO),
                animated("position", T::Point, DVec2::ZERO),
                animated("scale", T::Point, DVec2::ONE),
                animated("rotation", T::Float, 0.0),
            ]),
        ty("AnimationContainer", Some("Object"))
            .kind(ObjectKind::AnimationContainer)
            .props(vec![
                validated("first_frame", T::Float, 0.0, valid_first_frame),
                validated("last_frame", T::Float, 180.0, valid_last_frame),
            ]),
        ty("Composition", Some("VisualNode"))
            .abstract_type()
            .kind(ObjectKind::Composition)
            .children(ChildAccess::List("shapes"))
            .props(vec![
                list("shapes", "ShapeElement").alias("layers"),
                object("animation", "AnimationContainer"),
                scalar("width", T::Int, 512),
                scalar("height", T::Int, 512),
                scalar("fps", T::Float, 60.0),
            ]),
        ty("MainComposition", Some("Composition")),
        ty("Precomposition", Some("Composition")),
        ty("ShapeElement", Some("VisualNode")).abstract_type(),
        ty("Shape", Some("ShapeElement"))
            .abstract_type()
            .props(vec![scalar("reversed", T::Bool, false).flags(PropertyFlags::VISUAL)]),
        ty("Rect", Some("Shape")).kind(ObjectKind::Rect).props(vec![
            animated("position", T::Point, DVec2::ZERO),
            animated("size", T::Size, Size::ZERO),
            animated("rounded", T::Float, 0.0),
        ]),
        ty("Ellipse", Some("Shape")).kind(ObjectKind::Ellipse).props(vec![
            animated("position", T::Point, DVec2::ZERO),
            animated("size", T::Size, Size::ZERO),
        ]),
        ty("PolyStar", Some("Shape"))
            .kind(ObjectKind::PolyStar)
            .props(vec![
                scalar("type", T::Enum, STAR)
                    .alias("star_type")
                    .flags(PropertyFlags::VISUAL),
                animated("position", T::Point, DVec2::ZERO),
                animated("outer_radius", T::Float, 0.0),
                animated("inner_radius", T::Float, 0.0),
                animated("outer_roundness", T::Float, 0.0).flags(percent),
                animated("inner_roundness", T::Float, 0.0).flags(percent),
                animated("angle", T::Float, 0.0),
                animated("points", T::Int, 5),
            ]),
        ty("Path", Some("Shape")).kind(ObjectKind::Path).props(vec![
            animated("shape", T::Bezier, Value::Bezier(Default::default())),
            scalar("closed", T::Bool, false).flags(PropertyFlags::VISUAL),
        ]),
        ty("Group", Some("ShapeElement"))
            .kind(ObjectKind::Group)
            .children(ChildAccess::List("shapes"))
            .props(vec![
                list("shapes", "ShapeElement"),
                object("transform", "Transform"),
                animated("opacity", T::Float, 1.0).flags(percent),
                scalar("auto_orient", T::Bool, false),
            ]),
        ty("Layer", Some("Group"))
            .kind(ObjectKind::Layer)
            .grouping(Grouping::LayerParent)
            .props(vec![
                object("animation", "AnimationContainer"),
                reference(
                    "parent",
                    ReferencePolicy {
                        valid_options: layer_parent_options,
                        is_valid_option: is_valid_layer_parent,
                    },
                ),
                scalar("render", T::Bool, true),
            ]),
        ty("PreCompLayer", Some("ShapeElement"))
            .kind(ObjectKind::PreCompLayer)
            .props(vec![
                reference(
                    "composition",
                    ReferencePolicy {
                        valid_options: precomp_options,
                        is_valid_option: is_valid_precomp,
                    },
                ),
                scalar("size", T::Size, Size::ZERO),
                object("transform", "Transform"),
                animated("opacity", T::Float, 1.0).flags(percent),
            ]),
        ty("Modifier", Some("ShapeElement")).abstract_type(),
        ty("Trim", Some("Modifier")).kind(ObjectKind::Trim).props(vec![
            animated("start", T::Float, 0.0).flags(percent),
            animated("end", T::Float, 1.0).flags(percent),
            animated("offset", T::Float, 0.0).flags(percent),
            scalar("multiple", T::Enum, TRIM_SIMULTANEOUSLY).flags(PropertyFlags::VISUAL),
        ]),
        ty("Styler", Some("ShapeElement")).abstract_type().props(vec![
            animated("color", T::Color, Color::BLACK),
            animated("opacity", T::Float, 1.0).flags(percent),
            reference(
                "use",
                ReferencePolicy {
                    valid_options: brush_options,
                    is_valid_option: is_valid_brush,
                },
            ),
        ]),
        ty("Fill", Some("Styler"))
            .kind(ObjectKind::Fill)
            .props(vec![scalar("fill_rule", T::Enum, NON_ZERO).flags(PropertyFlags::VISUAL)]),
        ty("Stroke", Some("Styler")).kind(ObjectKind::Stroke).props(vec![
            animated("width", T::Float, 1.0),
            scalar("cap", T::Enum, ROUND_CAP).flags(PropertyFlags::VISUAL),
            scalar("join", T::Enum, ROUND_JOIN).flags(PropertyFlags::VISUAL),
            scalar("miter_limit", T::Float, 0.0).flags(PropertyFlags::VISUAL),
        ]),
        ty("Assets", Some("DocumentNode"))
            .kind(ObjectKind::Assets)
            .children(ChildAccess::SubObjects(&[
                "colors",
                "gradient_colors",
                "gradients",
                "precompositions",
            ]))
            .props(vec![
                object("colors", "NamedColorList"),
                object("gradient_colors", "GradientColorsList"),
                object("gradients", "GradientList"),
                object("precompositions", "PrecompositionList"),
            ]),
        ty("AssetList", Some("DocumentNode"))
            .abstract_type()
            .kind(ObjectKind::AssetList)
            .children(ChildAccess::List("values")),
        ty("NamedColorList", Some("AssetList")).props(vec![list("values", "NamedColor")]),
        ty("GradientColorsList", Some("AssetList")).props(vec![list("values", "GradientColors")]),
        ty("GradientList", Some("AssetList")).props(vec![list("values", "Gradient")]),
        ty("PrecompositionList", Some("AssetList")).props(vec![list("values", "Precomposition")]),
        ty("Asset", Some("DocumentNode")).abstract_type(),
        ty("BrushStyle", Some("Asset")).abstract_type(),
        ty("NamedColor", Some("BrushStyle"))
            .kind(ObjectKind::NamedColor)
            .props(vec![animated("color", T::Color, Color::BLACK)]),
        ty("GradientColors", Some("Asset"))
            .kind(ObjectKind::GradientColors)
            .props(vec![animated("colors", T::Gradient, Value::Gradient(Vec::new()))]),
        ty("Gradient", Some("BrushStyle"))
            .kind(ObjectKind::Gradient)
            .props(vec![
                reference(
                    "colors",
                    ReferencePolicy {
                        valid_options: gradient_colors_options,
                        is_valid_option: is_valid_gradient_colors,
                    },
                ),
                scalar("type", T::Enum, LINEAR_GRADIENT).flags(PropertyFlags::VISUAL),
                animated("start_point", T::Point, DVec2::ZERO),
                animated("end_point", T::Point, DVec2::ZERO),
                animated("highlight", T::Point, DVec2::ZERO),
            ]),
    ]
}

fn valid_first_frame(object: &super::object::Object, value: &Value) -> bool {
    let Some(first) = value.as_f64() else {
        return false;
    };
    first >= 0.0 && object.get_f64("last_frame").map_or(true, |last| first < last)
}

fn valid_last_frame(object: &super::object::Object, value: &Value) -> bool {
    let Some(last) = value.as_f64() else {
        return false;
    };
    last >= 0.0 && object.get_f64("first_frame").map_or(true, |first| last > first)
}

fn layer_parent_options(doc: &Document, owner: NodeId) -> Vec<NodeId> {
    let Some(container) = doc.parent(owner) else {
        return Vec::new();
    };
    doc.children(container)
        .filter(|&layer| is_valid_layer_parent(doc, owner, layer))
        .collect()
}

/// Sibling layers that do not already descend from `owner`.
fn is_valid_layer_parent(doc: &Document, owner: NodeId, target: NodeId) -> bool {
    if target == owner || doc.parent(target) != doc.parent(owner) {
        return false;
    }
    if !doc.object(target).is_some_and(|o| o.is_instance("Layer")) {
        return false;
    }
    let mut cursor = doc.reference(target, "parent");
    let mut steps = 0;
    while let Some(ancestor) = cursor {
        if ancestor == owner || steps > doc.len() {
            return false;
        }
        cursor = doc.reference(ancestor, "parent");
        steps += 1;
    }
    true
}

fn asset_values(doc: &Document, list: &str) -> Vec<NodeId> {
    doc.sub_object(doc.assets(), list)
        .map(|list| doc.items(list, "values").to_vec())
        .unwrap_or_default()
}

fn brush_options(doc: &Document, _owner: NodeId) -> Vec<NodeId> {
    let mut options = asset_values(doc, "colors");
    options.extend(asset_values(doc, "gradients"));
    options
}

fn is_valid_brush(doc: &Document, owner: NodeId, target: NodeId) -> bool {
    brush_options(doc, owner).contains(&target)
}

fn gradient_colors_options(doc: &Document, _owner: NodeId) -> Vec<NodeId> {
    asset_values(doc, "gradient_colors")
}

fn is_valid_gradient_colors(doc: &Document, owner: NodeId, target: NodeId) -> bool {
    gradient_colors_options(doc, owner).contains(&target)
}

/// Precompositions that do not contain `owner`, so painting cannot recurse.
fn precomp_options(doc: &Document, owner: NodeId) -> Vec<NodeId> {
    asset_values(doc, "precompositions")
        .into_iter()
        .filter(|&comp| !doc.is_ancestor(comp, owner) && !uses_precomp(doc, comp, owner))
        .collect()
}

fn is_valid_precomp(doc: &Document, owner: NodeId, target: NodeId) -> bool {
    precomp_options(doc, owner).contains(&target)
}

/// Whether painting `comp` would reach the composition containing `owner`.
fn uses_precomp(doc: &Document, comp: NodeId, owner: NodeId) -> bool {
    let Some(owner_comp) = doc.composition_of(owner) else {
        return false;
    };
    let mut stack = vec![comp];
    let mut seen = Vec::new();
    while let Some(current) = stack.pop() {
        if current == owner_comp {
            return true;
        }
        if seen.contains(&current) {
            continue;
        }
        seen.push(current);
        for layer in doc.find_by_type_name(current, "PreCompLayer", false) {
            if let Some(target) = doc.reference(layer, "composition") {
                stack.push(target);
            }
        }
    }
    false
}
