//! Data-level structures for vecta documents.
//!
//! Nothing in this crate knows about the document model: it decodes bytes
//! and JSON into plain structures that `vecta-core` projects into its graph.

pub mod diagnostics;
pub mod model;
pub mod rive;

pub use diagnostics::{Diagnostic, DiagnosticLog, Diagnostics, Severity};
