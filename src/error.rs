use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelsLabError {
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Validation error: {field}: {message}")]
    ValidationError { field: String, message: String },
    #[error("Provider error: {0}")]
    ProviderError(String),
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("Path error: {0}")]
    PathError(String),
    #[error("IO error: {0}")]
    IoError(String),
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl ModelsLabError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        ModelsLabError::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Name of the offending field for validation failures.
    pub fn field(&self) -> Option<&str> {
        match self {
            ModelsLabError::ValidationError { field, .. } => Some(field),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ModelsLabError {
    fn from(err: std::io::Error) -> Self {
        ModelsLabError::IoError(err.to_string())
    }
}

impl From<serde_json::Error> for ModelsLabError {
    fn from(err: serde_json::Error) -> Self {
        ModelsLabError::SerializationError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ModelsLabError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_names_field() {
        let err = ModelsLabError::validation("width", "must be between 1 and 1024 (got 0)");
        assert_eq!(err.field(), Some("width"));
        assert_eq!(
            err.to_string(),
            "Validation error: width: must be between 1 and 1024 (got 0)"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: ModelsLabError = io.into();
        assert!(matches!(err, ModelsLabError::IoError(_)));
        assert_eq!(err.field(), None);
    }
}
