//! Conversion between property values and their JSON encoding.

use crate::math::bezier::{Bezier, BezierPoint, PointType};
use crate::model::{Color, GradientStop, PropertyType, Value};
use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine as _};
use glam::DVec2;
use kurbo::Size;
use serde_json::{json, Map, Value as Json};
use uuid::Uuid;
use vecta_data::model::{BezierData, BezierPointData, GradientStopData, PointData};

pub(crate) fn load_2d(json: &Json, x: &str, y: &str) -> Option<(f64, f64)> {
    let object = json.as_object().filter(|o| !o.is_empty())?;
    let component = |key: &str| object.get(key).and_then(Json::as_f64).unwrap_or(0.0);
    Some((component(x), component(y)))
}

pub(crate) fn load_point(json: &Json) -> Option<DVec2> {
    load_2d(json, "x", "y").map(|(x, y)| DVec2::new(x, y))
}

/// Colors are stored as `#rrggbbaa`; shorter forms are opaque.
pub(crate) fn load_color(json: &Json) -> Option<Color> {
    json.as_str().and_then(Color::from_hex)
}

fn load_bezier(json: &Json) -> Option<Bezier> {
    let data: BezierData = serde_json::from_value(json.clone()).ok()?;
    let points = data
        .points
        .iter()
        .map(|p| {
            BezierPoint::new(
                point_from_data(p.pos),
                point_from_data(p.tan_in),
                point_from_data(p.tan_out),
                PointType::from_u8(p.kind),
            )
        })
        .collect();
    Some(Bezier::from_points(points, data.closed))
}

fn load_gradient(json: &Json) -> Option<Vec<GradientStop>> {
    let stops = json
        .as_array()?
        .iter()
        .filter_map(|stop| serde_json::from_value::<GradientStopData>(stop.clone()).ok())
        .map(|stop| {
            let color = Color::from_hex(&stop.color).unwrap_or(Color::BLACK);
            GradientStop::new(stop.offset, color)
        })
        .collect();
    Some(stops)
}

fn point_from_data(p: PointData) -> DVec2 {
    DVec2::new(p.x, p.y)
}

fn point_to_data(p: DVec2) -> PointData {
    PointData { x: p.x, y: p.y }
}

/// Decodes `json` as a value of `kind`. Object and reference kinds are
/// handled by the import state, not here.
pub fn load_value(kind: PropertyType, json: &Json) -> Option<Value> {
    match kind {
        PropertyType::Object | PropertyType::ObjectReference => None,
        PropertyType::Bool => json
            .as_bool()
            .or_else(|| json.as_f64().map(|v| v != 0.0))
            .map(Value::Bool),
        PropertyType::Int | PropertyType::Enum => json
            .as_i64()
            .or_else(|| json.as_f64().map(|v| v as i64))
            .map(Value::Int),
        PropertyType::Float => json.as_f64().map(Value::Float),
        PropertyType::Point => load_point(json).map(Value::Point),
        PropertyType::Size => load_2d(json, "width", "height").map(|(w, h)| Value::Size(Size::new(w, h))),
        PropertyType::Color => load_color(json).map(Value::Color),
        PropertyType::String => json.as_str().map(|s| Value::String(s.to_owned())),
        PropertyType::Uuid => json.as_str().and_then(|s| Uuid::parse_str(s).ok()).map(Value::Uuid),
        PropertyType::Bezier => load_bezier(json).map(Value::Bezier),
        PropertyType::Gradient => load_gradient(json).map(Value::Gradient),
        PropertyType::Data => json
            .as_str()
            .and_then(|s| BASE64_STANDARD.decode(s).ok())
            .map(Value::Data),
        PropertyType::Unknown => Some(json_to_value(json)),
    }
}

/// Untyped conversion used for properties the registry does not declare.
pub fn json_to_value(json: &Json) -> Value {
    match json {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::Bool(*b),
        Json::Number(n) => match n.as_i64() {
            Some(i) => Value::Int(i),
            None => Value::Float(n.as_f64().unwrap_or_default()),
        },
        Json::String(s) => Value::String(s.clone()),
        Json::Array(items) => Value::List(items.iter().map(json_to_value).collect()),
        Json::Object(map) => Value::Map(
            map.iter()
                .map(|(k, v)| (k.clone(), json_to_value(v)))
                .collect(),
        ),
    }
}

/// Encodes a plain value. Node links have no standalone encoding and
/// become `null`; the exporter writes them itself.
pub fn save_value(value: &Value) -> Json {
    match value {
        Value::Null | Value::Node(_) => Json::Null,
        Value::Bool(b) => json!(b),
        Value::Int(i) => json!(i),
        Value::Float(f) => json!(f),
        Value::Point(p) => json!({"x": p.x, "y": p.y}),
        Value::Size(s) => json!({"width": s.width, "height": s.height}),
        Value::Color(c) => json!(c.to_hex()),
        Value::String(s) => json!(s),
        Value::Uuid(u) => json!(u.to_string()),
        Value::Bezier(bezier) => {
            let data = BezierData {
                closed: bezier.closed(),
                points: bezier
                    .points()
                    .iter()
                    .map(|p| BezierPointData {
                        pos: point_to_data(p.pos),
                        tan_in: point_to_data(p.tan_in),
                        tan_out: point_to_data(p.tan_out),
                        kind: p.kind.as_u8(),
                    })
                    .collect(),
            };
            serde_json::to_value(data).unwrap_or(Json::Null)
        }
        Value::Gradient(stops) => Json::Array(
            stops
                .iter()
                .map(|stop| json!({"offset": stop.offset, "color": stop.color.to_hex()}))
                .collect(),
        ),
        Value::Data(bytes) => json!(BASE64_STANDARD.encode(bytes)),
        Value::List(items) => Json::Array(items.iter().map(save_value).collect()),
        Value::Map(map) => Json::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), save_value(v)))
                .collect::<Map<_, _>>(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colors_are_rgba_ordered() {
        let value = load_value(PropertyType::Color, &json!("#ff000080")).unwrap();
        assert_eq!(value, Value::Color(Color::rgba(255, 0, 0, 128)));
        assert_eq!(save_value(&value), json!("#ff000080"));

        let opaque = load_value(PropertyType::Color, &json!("#00ff00")).unwrap();
        assert_eq!(opaque, Value::Color(Color::rgb(0, 255, 0)));
    }

    #[test]
    fn empty_objects_are_not_points() {
        assert_eq!(load_value(PropertyType::Point, &json!({})), None);
        assert_eq!(
            load_value(PropertyType::Point, &json!({"x": 3})),
            Some(Value::Point(DVec2::new(3.0, 0.0)))
        );
        assert_eq!(
            load_value(PropertyType::Size, &json!({"width": 4, "height": 5})),
            Some(Value::Size(Size::new(4.0, 5.0)))
        );
    }

    #[test]
    fn bezier_from_json() {
        let value = load_value(
            PropertyType::Bezier,
            &json!({
                "closed": true,
                "points": [
                    {"pos": {"x": 0, "y": 0}, "tan_in": {"x": 0, "y": 0}, "tan_out": {"x": 1, "y": 0}, "type": 1},
                    {"pos": {"x": 5, "y": 5}}
                ]
            }),
        )
        .unwrap();
        let bezier = value.as_bezier().unwrap();
        assert!(bezier.closed());
        assert_eq!(bezier.len(), 2);
        assert_eq!(bezier.points()[0].kind, PointType::Smooth);
        assert_eq!(bezier.points()[0].tan_out, DVec2::new(1.0, 0.0));
        assert_eq!(bezier.points()[1].pos, DVec2::new(5.0, 5.0));
    }

    #[test]
    fn data_is_base64() {
        let value = load_value(PropertyType::Data, &json!("aGVsbG8=")).unwrap();
        assert_eq!(value, Value::Data(b"hello".to_vec()));
        assert_eq!(save_value(&value), json!("aGVsbG8="));
    }

    #[test]
    fn gradient_skips_malformed_stops() {
        let value = load_value(
            PropertyType::Gradient,
            &json!([{"offset": 0, "color": "#000000ff"}, "junk", {"offset": 1, "color": "#ffffffff"}]),
        )
        .unwrap();
        assert_eq!(value.as_gradient().map(<[GradientStop]>::len), Some(2));
    }

    #[test]
    fn untyped_values_keep_their_shape() {
        let json = json!({"a": [1, 2.5, "x"], "b": null});
        let value = json_to_value(&json);
        assert_eq!(save_value(&value), json);
    }
}
