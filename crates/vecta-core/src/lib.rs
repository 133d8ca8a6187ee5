//! Vector animation document engine.
//!
//! [`model::Document`] owns a graph of typed objects whose properties can be
//! animated with keyframes. Documents are loaded from the generic JSON
//! format or from rive binaries through [`io`], and written back as JSON.

pub mod error;
pub mod io;
pub mod math;
pub mod model;
pub mod shapes;

/// Time in frames.
pub type FrameTime = f64;

pub use error::LoadError;
pub use io::{load, FormatKind};
pub use model::{Document, NodeId, Value};
pub use vecta_data::{DiagnosticLog, Diagnostics};
