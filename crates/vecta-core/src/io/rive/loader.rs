//! Builds a document from a decoded rive record arena.
//!
//! Pass one walks the arena in file order, attaching keyframes to their
//! keyed properties and children to their parents. Pass two turns every
//! artboard into a precomposition plus a layer showing it.

use super::animated::{AnimatedKeyframe, AnimatedProperties};
use crate::io::set_keyframe_with;
use crate::math::bezier::{Bezier, BezierPoint, PointType};
use crate::math::from_polar;
use crate::model::registry::{
    EVEN_ODD, LINEAR_GRADIENT, NON_ZERO, POLYGON, RADIAL_GRADIENT, STAR, TRIM_INDIVIDUALLY, TRIM_SIMULTANEOUSLY,
};
use crate::model::{Color, Document, GradientStop, KeyframeTransition, NodeId, Value};
use glam::{DAffine2, DVec2};
use kurbo::Size;
use std::collections::HashMap;
use vecta_data::rive::{RiveFile, RiveObject, RiveValue, TypeId};
use vecta_data::Diagnostics;

const DEFAULT_SOLID_COLOR: u32 = 0xff74_7474;

#[derive(Debug, Clone, Default)]
struct Artboard {
    /// Arena index of the artboard record; child ids count from here
    start: usize,
    timeline_duration: u64,
    keyframe_duration: u64,
    fps: Option<u64>,
}

impl Artboard {
    fn last_frame(&self) -> u64 {
        if self.timeline_duration == 0 {
            self.keyframe_duration
        } else {
            self.timeline_duration
        }
    }
}

pub struct RiveLoader<'d> {
    objects: Vec<RiveObject>,
    document: Document,
    diagnostics: &'d mut dyn Diagnostics,
    artboards: Vec<Artboard>,
    artboard: Option<usize>,
    keyed_object: Option<usize>,
    keyed_property: Option<(usize, u64)>,
    keyframe_artboard: HashMap<usize, usize>,
    visiting: Vec<usize>,
}

impl<'d> RiveLoader<'d> {
    pub fn new(file: RiveFile, diagnostics: &'d mut dyn Diagnostics) -> Self {
        Self {
            objects: file.objects,
            document: Document::new(),
            diagnostics,
            artboards: Vec::new(),
            artboard: None,
            keyed_object: None,
            keyed_property: None,
            keyframe_artboard: HashMap::new(),
            visiting: Vec::new(),
        }
    }

    pub fn load(mut self) -> Document {
        for index in 0..self.objects.len() {
            self.preprocess_object(index);
        }

        let artboards = std::mem::take(&mut self.artboards);
        for (i, artboard) in artboards.iter().enumerate() {
            self.process_artboard(artboard, i == 0);
        }
        tracing::debug!(
            artboards = artboards.len(),
            nodes = self.document.len(),
            "rive document loaded"
        );
        self.document
    }

    fn warning(&mut self, message: String) {
        self.diagnostics.warning(message);
    }

    fn artboard_child(&self, id: u64) -> Option<usize> {
        let start = self.artboards.get(self.artboard?)?.start;
        let index = start.checked_add(usize::try_from(id).ok()?)?;
        (index < self.objects.len()).then_some(index)
    }

    fn preprocess_object(&mut self, index: usize) {
        let object = &self.objects[index];
        if object.is_placeholder() {
            return;
        }
        let type_id = object.type_id;

        if type_id == TypeId::ARTBOARD {
            self.artboards.push(Artboard {
                start: index,
                ..Artboard::default()
            });
            self.artboard = Some(self.artboards.len() - 1);
            self.keyed_object = None;
            self.keyed_property = None;
        } else if type_id == TypeId::KEYED_OBJECT {
            if self.artboard.is_none() {
                self.warning("Unexpected Keyed Object".to_owned());
                return;
            }
            let id = object.get_u64("objectId", u64::MAX);
            self.keyed_property = None;
            self.keyed_object = self.artboard_child(id);
            if self.keyed_object.is_none() {
                self.warning(format!("Invalid Keyed Object id {}", id));
            }
        } else if type_id == TypeId::KEYED_PROPERTY {
            let Some(keyed_object) = self.keyed_object else {
                self.warning("Unexpected Keyed Property".to_owned());
                return;
            };
            let id = object.get_u64("propertyKey", 0);
            if self.objects[keyed_object].property_definitions.contains_key(&id) {
                self.keyed_property = Some((keyed_object, id));
            } else {
                self.keyed_property = None;
                self.warning(format!("Unknown Keyed Property id {}", id));
            }
        } else if type_id == TypeId::LINEAR_ANIMATION {
            let Some(artboard) = self.artboard else {
                self.warning("Unexpected Animation".to_owned());
                return;
            };
            let duration = object.get_u64("duration", 0);
            let fps = object.has_value("fps").then(|| object.get_u64("fps", 60));
            let artboard = &mut self.artboards[artboard];
            artboard.timeline_duration = artboard.timeline_duration.max(duration);
            if artboard.fps.is_none() {
                artboard.fps = fps;
            }
        } else if object.has_type(TypeId::KEY_FRAME) {
            let (Some((keyed_object, property)), Some(artboard)) = (self.keyed_property, self.artboard) else {
                self.warning("Unexpected Keyframe".to_owned());
                return;
            };
            let frame = object.get_u64("frame", 0);
            let artboard = &mut self.artboards[artboard];
            artboard.keyframe_duration = artboard.keyframe_duration.max(frame);
            let start = artboard.start;
            self.keyframe_artboard.insert(index, start);
            self.objects[keyed_object].push_keyframe(property, index);
        } else if object.has_value("parentId") {
            let parent_id = object.get_u64("parentId", 0);
            match self.artboard_child(parent_id) {
                Some(parent) => self.objects[parent].children.push(index),
                None => self.warning(format!("Could not find parent with id {}", parent_id)),
            }
        }
    }

    fn keyframe_transition(&self, keyframe: usize) -> KeyframeTransition {
        let object = &self.objects[keyframe];
        match object.get_u64("interpolationType", 1) {
            0 => KeyframeTransition::hold(),
            2 => {
                let interpolator = self.keyframe_artboard.get(&keyframe).and_then(|&start| {
                    let id = usize::try_from(object.get_u64("interpolatorId", u64::MAX)).ok()?;
                    self.objects
                        .get(start.checked_add(id)?)
                        .filter(|o| o.has_type(TypeId::CUBIC_INTERPOLATOR))
                });
                match interpolator {
                    Some(cubic) => KeyframeTransition::new(
                        DVec2::new(cubic.get_f64("x1", 0.42), cubic.get_f64("y1", 0.0)),
                        DVec2::new(cubic.get_f64("x2", 0.58), cubic.get_f64("y2", 1.0)),
                    ),
                    None => KeyframeTransition::default(),
                }
            }
            _ => KeyframeTransition::default(),
        }
    }

    fn load_animations(&self, index: usize) -> AnimatedProperties {
        let object = &self.objects[index];
        let mut props = AnimatedProperties::default();
        for track in &object.animations {
            let Some(name) = object.property_name(track.property_id) else {
                continue;
            };
            let prop = props.properties.entry(name).or_default();
            for &keyframe in &track.keyframes {
                let record = &self.objects[keyframe];
                prop.push(AnimatedKeyframe {
                    time: record.get_f64("frame", 0.0),
                    value: record.get("value").cloned(),
                    transition: self.keyframe_transition(keyframe),
                });
            }
        }
        props
    }

    fn process_artboard(&mut self, artboard: &Artboard, first: bool) {
        let index = artboard.start;
        let assets = self.document.assets();
        let Some(precompositions) = self.document.sub_object(assets, "precompositions") else {
            return;
        };
        let Some(comp) = self.document.create("Precomposition") else {
            return;
        };
        if !self.document.insert(precompositions, "values", comp, None) {
            self.document.destroy(comp);
            return;
        }

        let rive = &self.objects[index];
        let name = rive.get_str("name").unwrap_or_default().to_owned();
        let size = Size::new(rive.get_f64("width", 0.0), rive.get_f64("height", 0.0));
        self.document.set(comp, "name", Value::String(name.clone()));
        self.document.set(comp, "width", Value::Float(size.width));
        self.document.set(comp, "height", Value::Float(size.height));
        self.add_shapes(index, comp);

        let Some(layer) = self.document.create("PreCompLayer") else {
            return;
        };
        let main = self.document.main();
        if !self.document.insert(main, "shapes", layer, None) {
            self.document.destroy(layer);
            return;
        }
        self.document.set(layer, "name", Value::String(name.clone()));
        self.document.set(layer, "size", Value::Size(size));

        let animations = self.load_animations(index);
        let rive = &self.objects[index];
        if let Some(transform) = self.document.sub_object(layer, "transform") {
            load_transform(&mut self.document, rive, &animations, transform);
        }
        load_property(&mut self.document, rive, &animations, layer, "opacity", ["opacity"], [1.0], |[o]| {
            Value::Float(o)
        });
        if !self.document.set_reference(layer, "composition", Some(comp)) {
            self.warning(format!("Could not use artboard {} as a precomposition", name));
        }

        let last_frame = artboard.last_frame() as f64;
        if last_frame > 0.0 {
            if let Some(animation) = self.document.sub_object(comp, "animation") {
                self.document.set(animation, "last_frame", Value::Float(last_frame));
            }
            if let Some(animation) = self.document.sub_object(main, "animation") {
                let current = self
                    .document
                    .get(animation, "last_frame")
                    .and_then(|v| v.as_f64())
                    .unwrap_or(0.0);
                let last_frame = if first { last_frame } else { current.max(last_frame) };
                self.document.set(animation, "last_frame", Value::Float(last_frame));
            }
        }

        if first {
            self.document.set(main, "width", Value::Float(size.width));
            self.document.set(main, "height", Value::Float(size.height));
            if let Some(fps) = artboard.fps.filter(|&fps| fps > 0) {
                self.document.set(main, "fps", Value::Float(fps as f64));
                self.document.set(comp, "fps", Value::Float(fps as f64));
            }
        }
    }

    fn append(&mut self, owner: NodeId, child: NodeId) {
        if !self.document.insert(owner, "shapes", child, None) {
            let message = format!(
                "Could not add {} to {}",
                self.document.object_name(child),
                self.document.object_name(owner)
            );
            self.warning(message);
            self.document.destroy(child);
        }
    }

    /// Paths go last so stylers listed before them apply.
    fn add_shapes(&mut self, parent: usize, owner: NodeId) {
        self.visiting.push(parent);
        let children = self.objects[parent].children.clone();
        let mut paths = Vec::new();
        for child in children {
            if child == parent || self.visiting.contains(&child) {
                self.diagnostics.error("Parent circular reference detected".to_owned());
                continue;
            }
            let is_path = self.objects[child].has_type(TypeId::PATH);
            let shapes = self.load_shape(child);
            if is_path {
                paths.extend(shapes);
            } else {
                for shape in shapes {
                    self.append(owner, shape);
                }
            }
        }
        for shape in paths {
            self.append(owner, shape);
        }
        self.visiting.pop();
    }

    fn load_shape(&mut self, index: usize) -> Vec<NodeId> {
        let animations = self.load_animations(index);
        let type_id = self.objects[index].type_id;
        let shape = match type_id {
            TypeId::SHAPE => self.load_shape_layer(index, &animations),
            TypeId::RECTANGLE => self.load_rectangle(index, &animations),
            TypeId::ELLIPSE => self.load_ellipse(index, &animations),
            TypeId::FILL => self.load_fill(index, &animations),
            TypeId::STROKE => return self.load_stroke(index, &animations),
            TypeId::POLYGON => self.load_polygon(index, &animations, POLYGON),
            TypeId::STAR => self.load_polygon(index, &animations, STAR),
            TypeId::TRIANGLE => self.load_triangle(index, &animations),
            TypeId::POINTS_PATH => self.load_path(index, &animations),
            _ => {
                tracing::debug!(
                    type_id = type_id.0,
                    type_name = self.objects[index].type_name(),
                    "skipping unsupported rive object"
                );
                None
            }
        };
        shape.into_iter().collect()
    }

    fn load_shape_layer(&mut self, index: usize, animations: &AnimatedProperties) -> Option<NodeId> {
        let layer = self.document.create("Layer")?;
        self.load_shape_group(index, layer, animations);
        Some(layer)
    }

    fn load_shape_group(&mut self, index: usize, group: NodeId, animations: &AnimatedProperties) {
        let rive = &self.objects[index];
        load_property(&mut self.document, rive, animations, group, "opacity", ["opacity"], [1.0], |[o]| {
            Value::Float(o)
        });
        if let Some(transform) = self.document.sub_object(group, "transform") {
            load_transform(&mut self.document, rive, animations, transform);
        }
        set_name(&mut self.document, group, rive);
        self.add_shapes(index, group);
    }

    fn load_rectangle(&mut self, index: usize, animations: &AnimatedProperties) -> Option<NodeId> {
        let group = self.document.create("Group")?;
        let rect = self.document.create("Rect")?;
        let rive = &self.objects[index];
        set_name(&mut self.document, rect, rive);
        load_property(
            &mut self.document,
            rive,
            animations,
            rect,
            "rounded",
            ["cornerRadiusTL", "cornerRadiusBL", "cornerRadiusBR", "cornerRadiusTR"],
            [0.0; 4],
            |[tl, bl, br, tr]| Value::Float((tl + bl + br + tr) / 4.0),
        );
        load_property(
            &mut self.document,
            rive,
            animations,
            rect,
            "size",
            ["width", "height"],
            [0.0, 0.0],
            |[w, h]| Value::Size(Size::new(w, h)),
        );
        self.append(group, rect);
        self.load_shape_group(index, group, animations);
        Some(group)
    }

    fn load_ellipse(&mut self, index: usize, animations: &AnimatedProperties) -> Option<NodeId> {
        let group = self.document.create("Group")?;
        let ellipse = self.document.create("Ellipse")?;
        let rive = &self.objects[index];
        set_name(&mut self.document, ellipse, rive);
        load_property(
            &mut self.document,
            rive,
            animations,
            ellipse,
            "size",
            ["width", "height"],
            [0.0, 0.0],
            |[w, h]| Value::Size(Size::new(w, h)),
        );
        self.append(group, ellipse);
        self.load_shape_group(index, group, animations);
        Some(group)
    }

    fn load_fill(&mut self, index: usize, animations: &AnimatedProperties) -> Option<NodeId> {
        let fill = self.document.create("Fill")?;
        self.load_styler(index, fill, animations);
        let rule = match self.objects[index].get_u64("fillRule", 0) {
            1 => EVEN_ODD,
            _ => NON_ZERO,
        };
        self.document.set(fill, "fill_rule", Value::Int(rule));
        Some(fill)
    }

    /// A stroke, followed by any trim path attached to it.
    fn load_stroke(&mut self, index: usize, animations: &AnimatedProperties) -> Vec<NodeId> {
        let Some(stroke) = self.document.create("Stroke") else {
            return Vec::new();
        };
        self.load_styler(index, stroke, animations);

        let rive = &self.objects[index];
        load_property(&mut self.document, rive, animations, stroke, "width", ["thickness"], [1.0], |[w]| {
            Value::Float(w)
        });
        if rive.has_value("cap") {
            self.document.set(stroke, "cap", Value::Int(rive.get_u64("cap", 0).min(2) as i64));
        }
        if rive.has_value("join") {
            self.document.set(stroke, "join", Value::Int(rive.get_u64("join", 0).min(2) as i64));
        }

        let mut shapes = vec![stroke];
        let children = rive.children.clone();
        for child in children {
            if self.objects[child].type_id == TypeId::TRIM_PATH {
                shapes.extend(self.load_trim(child));
            }
        }
        shapes
    }

    fn load_trim(&mut self, index: usize) -> Option<NodeId> {
        let trim = self.document.create("Trim")?;
        let animations = self.load_animations(index);
        let rive = &self.objects[index];
        for (property, key, default) in [("start", "start", 0.0), ("end", "end", 1.0), ("offset", "offset", 0.0)] {
            load_property(&mut self.document, rive, &animations, trim, property, [key], [default], |[v]| {
                Value::Float(v)
            });
        }
        let multiple = match rive.get_u64("modeValue", 1) {
            1 => TRIM_INDIVIDUALLY,
            _ => TRIM_SIMULTANEOUSLY,
        };
        self.document.set(trim, "multiple", Value::Int(multiple));
        Some(trim)
    }

    fn load_styler(&mut self, index: usize, styler: NodeId, animations: &AnimatedProperties) {
        let rive = &self.objects[index];
        set_name(&mut self.document, styler, rive);
        self.document
            .set(styler, "visible", Value::Bool(rive.get_bool("isVisible", true)));
        load_property(&mut self.document, rive, animations, styler, "opacity", ["opacity"], [1.0], |[o]| {
            Value::Float(o)
        });

        let children = rive.children.clone();
        for child in children {
            let type_id = self.objects[child].type_id;
            if type_id == TypeId::SOLID_COLOR {
                let color_animations = self.load_animations(child);
                load_color(
                    &mut self.document,
                    &self.objects[child],
                    &color_animations,
                    styler,
                    "color",
                    "colorValue",
                    DEFAULT_SOLID_COLOR,
                );
            } else if type_id == TypeId::LINEAR_GRADIENT || type_id == TypeId::RADIAL_GRADIENT {
                let kind = if type_id == TypeId::RADIAL_GRADIENT {
                    RADIAL_GRADIENT
                } else {
                    LINEAR_GRADIENT
                };
                if let Some(gradient) = self.load_gradient(child, kind) {
                    self.document.set_reference(styler, "use", Some(gradient));
                }
            }
        }
    }

    /// Creates the gradient and its color stops as assets.
    fn load_gradient(&mut self, index: usize, kind: i64) -> Option<NodeId> {
        let assets = self.document.assets();
        let colors_list = self.document.sub_object(assets, "gradient_colors")?;
        let gradients_list = self.document.sub_object(assets, "gradients")?;

        let colors = self.document.create("GradientColors")?;
        if !self.document.insert(colors_list, "values", colors, None) {
            self.document.destroy(colors);
            return None;
        }
        let gradient = self.document.create("Gradient")?;
        if !self.document.insert(gradients_list, "values", gradient, None) {
            self.document.destroy(gradient);
            return None;
        }

        let animations = self.load_animations(index);
        let rive = &self.objects[index];
        set_name(&mut self.document, colors, rive);
        set_name(&mut self.document, gradient, rive);
        self.document.set_reference(gradient, "colors", Some(colors));
        self.document.set(gradient, "type", Value::Int(kind));

        let point = |[x, y]: [f64; 2]| Value::Point(DVec2::new(x, y));
        load_property(&mut self.document, rive, &animations, gradient, "start_point", ["startX", "startY"], [0.0, 0.0], point);
        load_property(&mut self.document, rive, &animations, gradient, "end_point", ["endX", "endY"], [0.0, 0.0], point);
        if kind == RADIAL_GRADIENT {
            load_property(&mut self.document, rive, &animations, gradient, "highlight", ["startX", "startY"], [0.0, 0.0], point);
        }

        let mut stops: Vec<GradientStop> = rive
            .children
            .iter()
            .map(|&child| &self.objects[child])
            .filter(|stop| stop.type_id == TypeId::GRADIENT_STOP)
            .map(|stop| {
                GradientStop::new(
                    stop.get_f64("position", 0.0),
                    Color::from_argb(stop.get_color("colorValue", 0xffff_ffff)),
                )
            })
            .collect();
        stops.sort_by(|a, b| a.offset.total_cmp(&b.offset));
        self.document.set(colors, "colors", Value::Gradient(stops));

        Some(gradient)
    }

    fn load_polygon(&mut self, index: usize, animations: &AnimatedProperties, star_type: i64) -> Option<NodeId> {
        let group = self.document.create("Group")?;
        self.load_shape_group(index, group, animations);

        let shape = self.document.create("PolyStar")?;
        let rive = &self.objects[index];
        set_name(&mut self.document, shape, rive);
        self.document.set(shape, "type", Value::Int(star_type));
        load_property(&mut self.document, rive, animations, shape, "points", ["points"], [5.0], |[p]| {
            Value::Float(p)
        });
        self.document.set(shape, "outer_radius", Value::Float(100.0));
        load_property(
            &mut self.document,
            rive,
            animations,
            shape,
            "inner_radius",
            ["innerRadius"],
            [0.5],
            |[ratio]| Value::Float(ratio * 100.0),
        );
        if let Some(transform) = self.document.sub_object(group, "transform") {
            load_property(
                &mut self.document,
                rive,
                animations,
                transform,
                "scale",
                ["scaleX", "scaleY", "width", "height"],
                [1.0, 1.0, 0.0, 0.0],
                |[sx, sy, w, h]| Value::Point(DVec2::new(w / 200.0 * sx, h / 200.0 * sy)),
            );
        }
        self.append(group, shape);
        Some(group)
    }

    fn load_triangle(&mut self, index: usize, animations: &AnimatedProperties) -> Option<NodeId> {
        let group = self.document.create("Group")?;
        let path = self.document.create("Path")?;
        let rive = &self.objects[index];
        set_name(&mut self.document, path, rive);
        self.document.set(path, "closed", Value::Bool(true));
        load_property(
            &mut self.document,
            rive,
            animations,
            path,
            "shape",
            ["width", "height"],
            [0.0, 0.0],
            |[w, h]| Value::Bezier(triangle(w, h)),
        );
        self.append(group, path);
        self.load_shape_group(index, group, animations);
        Some(group)
    }

    fn load_path(&mut self, index: usize, _animations: &AnimatedProperties) -> Option<NodeId> {
        let path = self.document.create("Path")?;
        let rive = &self.objects[index];
        set_name(&mut self.document, path, rive);
        let closed = rive.get_bool("isClosed", false);

        let mut bezier = Bezier::new();
        for &child in &rive.children {
            if let Some(point) = vertex_point(&self.objects[child]) {
                bezier.push(point);
            }
        }
        bezier.set_closed(closed);

        let matrix = DAffine2::from_scale_angle_translation(
            DVec2::new(rive.get_f64("scaleX", 1.0), rive.get_f64("scaleY", 1.0)),
            rive.get_f64("rotation", 0.0),
            DVec2::new(rive.get_f64("x", 0.0), rive.get_f64("y", 0.0)),
        );
        if matrix != DAffine2::IDENTITY {
            bezier = bezier.transformed(&matrix);
        }

        self.document.set(path, "closed", Value::Bool(closed));
        self.document.set(path, "shape", Value::Bezier(bezier));
        Some(path)
    }
}

fn set_name(doc: &mut Document, id: NodeId, rive: &RiveObject) {
    if let Some(name) = rive.get_str("name") {
        doc.set(id, "name", Value::String(name.to_owned()));
    }
}

/// Sets the static value from `names` and adds a keyframe wherever any of
/// them is animated, folding the components with `combine`.
#[allow(clippy::too_many_arguments)]
fn load_property<const N: usize>(
    doc: &mut Document,
    rive: &RiveObject,
    animations: &AnimatedProperties,
    target: NodeId,
    property: &str,
    names: [&str; N],
    defaults: [f64; N],
    combine: impl Fn([f64; N]) -> Value,
) {
    let statics: [f64; N] = std::array::from_fn(|i| rive.get_f64(names[i], defaults[i]));
    doc.set(target, property, combine(statics));

    for keyframe in animations.joined(&names) {
        let values: [f64; N] = std::array::from_fn(|i| {
            keyframe.values[i]
                .as_ref()
                .and_then(RiveValue::as_f64)
                .unwrap_or(statics[i])
        });
        set_keyframe_with(doc, target, property, keyframe.time, combine(values), keyframe.transition);
    }
}

fn load_color(
    doc: &mut Document,
    rive: &RiveObject,
    animations: &AnimatedProperties,
    target: NodeId,
    property: &str,
    name: &str,
    default: u32,
) {
    let fallback = rive.get_color(name, default);
    doc.set(target, property, Value::Color(Color::from_argb(fallback)));
    for keyframe in animations.joined(&[name]) {
        let argb = keyframe.values[0]
            .as_ref()
            .and_then(RiveValue::as_color)
            .unwrap_or(fallback);
        set_keyframe_with(
            doc,
            target,
            property,
            keyframe.time,
            Value::Color(Color::from_argb(argb)),
            keyframe.transition,
        );
    }
}

fn load_transform(doc: &mut Document, rive: &RiveObject, animations: &AnimatedProperties, transform: NodeId) {
    load_property(doc, rive, animations, transform, "position", ["x", "y"], [0.0, 0.0], |[x, y]| {
        Value::Point(DVec2::new(x, y))
    });
    load_property(doc, rive, animations, transform, "rotation", ["rotation"], [0.0], |[r]| {
        Value::Float(r.to_degrees())
    });
    load_property(
        doc,
        rive,
        animations,
        transform,
        "scale",
        ["scaleX", "scaleY"],
        [1.0, 1.0],
        |[x, y]| Value::Point(DVec2::new(x, y)),
    );
}

fn triangle(width: f64, height: f64) -> Bezier {
    let mut bezier = Bezier::new();
    bezier
        .add_point(DVec2::new(-width / 2.0, height / 2.0))
        .add_point(DVec2::new(0.0, -height / 2.0))
        .add_point(DVec2::new(width / 2.0, height / 2.0));
    bezier.set_closed(true);
    bezier
}

/// Converts a vertex record to a point with absolute tangents.
fn vertex_point(vertex: &RiveObject) -> Option<BezierPoint> {
    let pos = DVec2::new(vertex.get_f64("x", 0.0), vertex.get_f64("y", 0.0));
    let point = match vertex.type_id {
        TypeId::STRAIGHT_VERTEX => BezierPoint::corner(pos),
        TypeId::CUBIC_MIRRORED_VERTEX => {
            let tangent = from_polar(vertex.get_f64("distance", 0.0), vertex.get_f64("rotation", 0.0));
            BezierPoint::new(pos, pos - tangent, pos + tangent, PointType::Symmetrical)
        }
        TypeId::CUBIC_ASYMMETRIC_VERTEX => {
            let angle = vertex.get_f64("rotation", 0.0);
            BezierPoint::new(
                pos,
                pos - from_polar(vertex.get_f64("inDistance", 0.0), angle),
                pos + from_polar(vertex.get_f64("outDistance", 0.0), angle),
                PointType::Smooth,
            )
        }
        TypeId::CUBIC_DETACHED_VERTEX => BezierPoint::new(
            pos,
            pos + from_polar(vertex.get_f64("inDistance", 0.0), vertex.get_f64("inRotation", 0.0)),
            pos + from_polar(vertex.get_f64("outDistance", 0.0), vertex.get_f64("outRotation", 0.0)),
            PointType::Corner,
        ),
        _ => return None,
    };
    Some(point)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn vertex(type_id: TypeId, values: &[(&'static str, f32)]) -> RiveObject {
        let mut object = RiveObject {
            type_id,
            ..RiveObject::placeholder()
        };
        for &(name, value) in values {
            object.properties.insert(name, RiveValue::Float(value));
        }
        object
    }

    #[test]
    fn mirrored_vertex_has_symmetric_tangents() {
        let point = vertex_point(&vertex(
            TypeId::CUBIC_MIRRORED_VERTEX,
            &[("x", 10.0), ("y", 0.0), ("distance", 2.0), ("rotation", 0.0)],
        ))
        .unwrap();
        assert_eq!(point.kind, PointType::Symmetrical);
        assert_abs_diff_eq!(point.tan_in.x, 8.0, epsilon = 1e-9);
        assert_abs_diff_eq!(point.tan_out.x, 12.0, epsilon = 1e-9);
    }

    #[test]
    fn detached_vertex_uses_independent_angles() {
        let point = vertex_point(&vertex(
            TypeId::CUBIC_DETACHED_VERTEX,
            &[
                ("inDistance", 1.0),
                ("inRotation", std::f32::consts::PI),
                ("outDistance", 3.0),
                ("outRotation", 0.0),
            ],
        ))
        .unwrap();
        assert_eq!(point.kind, PointType::Corner);
        assert_abs_diff_eq!(point.tan_in.x, -1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(point.tan_out.x, 3.0, epsilon = 1e-6);
    }

    #[test]
    fn non_vertex_children_are_ignored() {
        assert!(vertex_point(&vertex(TypeId::FILL, &[])).is_none());
    }

    #[test]
    fn triangle_is_closed_and_centered() {
        let bezier = triangle(4.0, 2.0);
        assert!(bezier.closed());
        assert_eq!(bezier.len(), 3);
        assert_eq!(bezier.points()[1].pos, DVec2::new(0.0, -1.0));
    }
}
