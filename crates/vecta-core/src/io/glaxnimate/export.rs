//! Writes documents in the generic JSON format.

use super::codec::save_value;
use crate::error::Result;
use crate::model::{Document, NodeId, Slot};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value as Json};
use std::path::Path;
use vecta_data::model::{FormatInfo, FORMAT_VERSION, TYPE_KEY};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    pub pretty: bool,
    /// Written to `format.generator`
    pub generator: String,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            pretty: false,
            generator: "vecta".to_owned(),
        }
    }
}

pub fn to_json(doc: &Document, options: &ExportOptions) -> Json {
    let format = FormatInfo {
        generator: options.generator.clone(),
        generator_version: env!("CARGO_PKG_VERSION").to_owned(),
        format_version: FORMAT_VERSION,
    };
    json!({
        "format": format,
        "metadata": Json::Object(doc.metadata().clone()),
        "animation": object_to_json(doc, doc.main()),
        "assets": object_to_json(doc, doc.assets()),
    })
}

pub fn to_string(doc: &Document, options: &ExportOptions) -> Result<String> {
    let json = to_json(doc, options);
    let text = if options.pretty {
        serde_json::to_string_pretty(&json)?
    } else {
        serde_json::to_string(&json)?
    };
    Ok(text)
}

pub fn save_document(doc: &Document, path: &Path, options: &ExportOptions) -> Result<()> {
    std::fs::write(path, to_string(doc, options)?)?;
    tracing::debug!(path = %path.display(), "saved document");
    Ok(())
}

fn uuid_json(doc: &Document, target: Option<NodeId>) -> Json {
    target
        .and_then(|id| doc.uuid(id))
        .map_or(Json::Null, |uuid| json!(uuid.to_string()))
}

pub fn object_to_json(doc: &Document, id: NodeId) -> Json {
    let Some(object) = doc.object(id) else {
        return Json::Null;
    };
    let mut map = Map::new();
    map.insert(TYPE_KEY.to_owned(), json!(object.type_name()));

    for prop in object.properties() {
        let value = match prop.slot() {
            Slot::Scalar { value, .. } | Slot::Fixed(value) | Slot::Unknown(value) => save_value(value),
            Slot::Animated(anim) if anim.is_animated() => {
                let keyframes: Vec<Json> = anim
                    .keyframes()
                    .iter()
                    .map(|kf| {
                        let mut entry = json!({"time": kf.time(), "value": save_value(kf.value())});
                        let transition = kf.transition();
                        if !transition.is_hold() {
                            let before = transition.before_handle();
                            let after = transition.after_handle();
                            entry["before"] = json!({"x": before.x, "y": before.y});
                            entry["after"] = json!({"x": after.x, "y": after.y});
                        }
                        entry
                    })
                    .collect();
                json!({ "keyframes": keyframes })
            }
            Slot::Animated(anim) => json!({ "value": save_value(anim.value()) }),
            Slot::Reference { target, .. } => uuid_json(doc, *target),
            Slot::Object { node, .. } => node.map_or(Json::Null, |child| object_to_json(doc, child)),
            Slot::ObjectList { items, .. } => {
                Json::Array(items.iter().map(|&item| object_to_json(doc, item)).collect())
            }
        };
        map.insert(prop.name().to_owned(), value);
    }
    Json::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Color, Value};

    #[test]
    fn writes_header_and_tree() {
        let mut doc = Document::new();
        let main = doc.main();
        let fill = doc.create("Fill").unwrap();
        doc.set(fill, "color", Value::Color(Color::rgb(255, 0, 0)));
        assert!(doc.insert(main, "shapes", fill, None));

        let json = to_json(&doc, &ExportOptions::default());
        assert_eq!(json["format"]["format_version"], json!(FORMAT_VERSION));
        assert_eq!(json["format"]["generator"], json!("vecta"));
        assert_eq!(json["animation"]["__type__"], json!("MainComposition"));
        assert_eq!(json["assets"]["__type__"], json!("Assets"));

        let shape = &json["animation"]["shapes"][0];
        assert_eq!(shape["__type__"], json!("Fill"));
        assert_eq!(shape["color"], json!({"value": "#ff0000ff"}));
        assert_eq!(shape["uuid"], json!(doc.uuid(fill).unwrap().to_string()));
    }

    #[test]
    fn keyframes_keep_their_handles() {
        let mut doc = Document::new();
        let main = doc.main();
        let ellipse = doc.create("Ellipse").unwrap();
        assert!(doc.insert(main, "shapes", ellipse, None));
        assert!(doc.set_keyframe(ellipse, "size", 0.0, Value::Size(kurbo::Size::new(1.0, 1.0))));
        assert!(doc.set_keyframe(ellipse, "size", 10.0, Value::Size(kurbo::Size::new(2.0, 2.0))));
        doc.set_keyframe_transition(ellipse, "size", 1, crate::model::KeyframeTransition::hold());

        let json = object_to_json(&doc, ellipse);
        let keyframes = json["size"]["keyframes"].as_array().unwrap();
        assert_eq!(keyframes.len(), 2);
        assert_eq!(keyframes[0]["before"], json!({"x": 0.0, "y": 0.0}));
        assert_eq!(keyframes[0]["after"], json!({"x": 1.0, "y": 1.0}));
        assert!(keyframes[1].get("before").is_none());
    }

    #[test]
    fn options_deserialize_with_defaults() {
        let options: ExportOptions = serde_json::from_value(json!({"pretty": true})).unwrap();
        assert!(options.pretty);
        assert_eq!(options.generator, "vecta");
    }
}
