use thiserror::Error;
use vecta_data::rive::StreamError;

/// Failures that abort a whole load. Schema problems are diagnostics, not
/// errors.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("binary stream error: {0}")]
    Stream(#[from] StreamError),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not detect the file format")]
    UnknownFormat,

    #[error("malformed document: {0}")]
    Malformed(String),
}

impl LoadError {
    pub fn category(&self) -> &'static str {
        match self {
            LoadError::Stream(err) => err.category(),
            LoadError::Json(_) => "json",
            LoadError::Io(_) => "io",
            LoadError::UnknownFormat => "format",
            LoadError::Malformed(_) => "malformed",
        }
    }
}

pub type Result<T> = std::result::Result<T, LoadError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_follow_the_source() {
        let err: LoadError = StreamError::UnexpectedEof { offset: 3 }.into();
        assert_eq!(err.category(), "truncated");
        assert!(err.to_string().contains("byte 3"));

        let err: LoadError = serde_json::from_str::<serde_json::Value>("{").unwrap_err().into();
        assert_eq!(err.category(), "json");
        assert_eq!(LoadError::UnknownFormat.category(), "format");
    }
}
