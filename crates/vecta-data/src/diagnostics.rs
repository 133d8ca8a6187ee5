//! Diagnostics sink shared by every loader.
//!
//! Loaders never fail on schema problems. They report through a
//! [`Diagnostics`] implementation and keep going; only stream corruption is
//! returned as an error.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => f.write_str("warning"),
            Severity::Error => f.write_str("error"),
        }
    }
}

/// Receives non-fatal messages and progress from long operations.
pub trait Diagnostics {
    fn warning(&mut self, message: String);
    fn error(&mut self, message: String);

    /// Announces the range used by subsequent [`Diagnostics::progress`] calls.
    fn progress_max(&mut self, _max: usize) {}

    fn progress(&mut self, _value: usize) {}
}

#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
}

/// Collects diagnostics and mirrors them to `tracing`.
#[derive(Debug, Default, Clone)]
pub struct DiagnosticLog {
    entries: Vec<Diagnostic>,
    progress: usize,
    progress_max: usize,
}

impl DiagnosticLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn warnings(&self) -> impl Iterator<Item = &str> {
        self.by_severity(Severity::Warning)
    }

    pub fn errors(&self) -> impl Iterator<Item = &str> {
        self.by_severity(Severity::Error)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        self.entries.iter().any(|d| d.severity == Severity::Error)
    }

    /// Last reported progress as `(value, max)`.
    pub fn progress(&self) -> (usize, usize) {
        (self.progress, self.progress_max)
    }

    fn by_severity(&self, severity: Severity) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(move |d| d.severity == severity)
            .map(|d| d.message.as_str())
    }
}

impl Diagnostics for DiagnosticLog {
    fn warning(&mut self, message: String) {
        tracing::warn!("{}", message);
        self.entries.push(Diagnostic {
            severity: Severity::Warning,
            message,
        });
    }

    fn error(&mut self, message: String) {
        tracing::error!("{}", message);
        self.entries.push(Diagnostic {
            severity: Severity::Error,
            message,
        });
    }

    fn progress_max(&mut self, max: usize) {
        self.progress_max = max;
    }

    fn progress(&mut self, value: usize) {
        self.progress = value;
    }
}
