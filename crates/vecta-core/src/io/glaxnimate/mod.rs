//! The generic JSON document format.

pub mod codec;
pub mod export;
pub mod import;

pub use export::{object_to_json, save_document, to_json, to_string, ExportOptions};
pub use import::{import_json, ImportState, ObjectFactory, RegistryFactory};

use crate::error::{LoadError, Result};
use crate::model::Document;
use vecta_data::Diagnostics;

/// Parses and imports a JSON document using the registry factory.
pub fn load(data: &[u8], diagnostics: &mut dyn Diagnostics) -> Result<Document> {
    let json: serde_json::Value = serde_json::from_slice(data)?;
    let serde_json::Value::Object(top) = json else {
        return Err(LoadError::Malformed("top level is not an object".to_owned()));
    };
    Ok(import_json(&top, &RegistryFactory, diagnostics))
}
