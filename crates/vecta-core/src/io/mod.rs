//! Format loaders and the JSON exporter.

pub mod glaxnimate;
pub mod rive;

use crate::error::{LoadError, Result};
use crate::model::{Document, KeyframeTransition, NodeId, Value};
use crate::FrameTime;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use vecta_data::rive::stream::MAGIC;
use vecta_data::Diagnostics;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatKind {
    /// Generic JSON document
    Glaxnimate,
    Rive,
}

impl FormatKind {
    /// Guesses the format from the first bytes of a file.
    pub fn detect(data: &[u8]) -> Option<Self> {
        if data.starts_with(MAGIC) {
            return Some(FormatKind::Rive);
        }
        let first = data.iter().copied().find(|b| !b.is_ascii_whitespace())?;
        (first == b'{').then_some(FormatKind::Glaxnimate)
    }

    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "json" | "rawr" => Some(FormatKind::Glaxnimate),
            "riv" => Some(FormatKind::Rive),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            FormatKind::Glaxnimate => "glaxnimate",
            FormatKind::Rive => "rive",
        }
    }
}

impl fmt::Display for FormatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FormatKind {
    type Err = LoadError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "glaxnimate" | "json" => Ok(FormatKind::Glaxnimate),
            "rive" | "riv" => Ok(FormatKind::Rive),
            _ => Err(LoadError::UnknownFormat),
        }
    }
}

/// Loads a document, detecting the format from content unless `format` is
/// given. Non-fatal problems are reported to `diagnostics`.
pub fn load(data: &[u8], format: Option<FormatKind>, diagnostics: &mut dyn Diagnostics) -> Result<Document> {
    let format = format
        .or_else(|| FormatKind::detect(data))
        .ok_or(LoadError::UnknownFormat)?;
    tracing::debug!(%format, bytes = data.len(), "loading document");
    match format {
        FormatKind::Glaxnimate => glaxnimate::load(data, diagnostics),
        FormatKind::Rive => rive::load(data, diagnostics),
    }
}

/// Reads and loads a file. Content detection wins over the extension.
pub fn load_file(path: &Path, format: Option<FormatKind>, diagnostics: &mut dyn Diagnostics) -> Result<Document> {
    let data = std::fs::read(path)?;
    let format = format.or_else(|| FormatKind::detect(&data)).or_else(|| {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(FormatKind::from_extension)
    });
    load(&data, format, diagnostics)
}

/// Adds a keyframe and gives it `transition`.
pub(crate) fn set_keyframe_with(
    doc: &mut Document,
    id: NodeId,
    name: &str,
    time: FrameTime,
    value: Value,
    transition: KeyframeTransition,
) -> bool {
    if !doc.set_keyframe(id, name, time, value) {
        return false;
    }
    let Some(index) = doc.animatable(id, name).map(|anim| anim.keyframe_index(time)) else {
        return false;
    };
    doc.set_keyframe_transition(id, name, index, transition)
}
