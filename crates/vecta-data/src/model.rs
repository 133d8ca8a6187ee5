//! Serde structures for the generic JSON document format.
//!
//! Objects themselves stay as `serde_json::Map`s because their keys depend on
//! the runtime type registry; only the fixed-shape values live here.

use serde::{Deserialize, Serialize};

/// Key holding the type discriminator of every serialized object.
pub const TYPE_KEY: &str = "__type__";

/// Format version written by the exporter.
pub const FORMAT_VERSION: i64 = 8;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormatInfo {
    #[serde(default)]
    pub generator: String,
    #[serde(default)]
    pub generator_version: String,
    #[serde(default = "default_format_version")]
    pub format_version: i64,
}

impl Default for FormatInfo {
    fn default() -> Self {
        Self {
            generator: String::new(),
            generator_version: String::new(),
            format_version: FORMAT_VERSION,
        }
    }
}

fn default_format_version() -> i64 {
    FORMAT_VERSION
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PointData {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SizeData {
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BezierPointData {
    #[serde(default)]
    pub pos: PointData,
    #[serde(default)]
    pub tan_in: PointData,
    #[serde(default)]
    pub tan_out: PointData,
    /// 0 = corner, 1 = smooth, 2 = symmetrical
    #[serde(rename = "type", default)]
    pub kind: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BezierData {
    #[serde(default)]
    pub closed: bool,
    #[serde(default)]
    pub points: Vec<BezierPointData>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientStopData {
    pub offset: f64,
    pub color: String,
}

/// One entry of a `"keyframes"` array. `time` and `value` are optional here
/// so a malformed entry can be reported instead of failing the whole array.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyframeData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before: Option<PointData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after: Option<PointData>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn keyframe_allows_missing_fields() {
        let kf: KeyframeData = serde_json::from_value(json!({"time": 4})).unwrap();
        assert_eq!(kf.time, Some(4.0));
        assert!(kf.value.is_none());
        assert!(kf.before.is_none());
    }

    #[test]
    fn bezier_point_type_is_renamed() {
        let point: BezierPointData = serde_json::from_value(json!({
            "pos": {"x": 1, "y": 2},
            "tan_in": {"x": 0, "y": 2},
            "tan_out": {"x": 2, "y": 2},
            "type": 2
        }))
        .unwrap();
        assert_eq!(point.kind, 2);
        assert_eq!(point.pos, PointData { x: 1.0, y: 2.0 });
    }

    #[test]
    fn format_info_defaults_to_current_version() {
        let info: FormatInfo = serde_json::from_value(json!({"generator": "x"})).unwrap();
        assert_eq!(info.format_version, FORMAT_VERSION);
    }
}
