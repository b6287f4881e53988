//! Domain error types.

/// Top-level error type for eventbt.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    #[error("invalid order: {reason}")]
    InvalidOrder { reason: String },

    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("insufficient data: have {bars} bars, need {required}")]
    InsufficientData { bars: usize, required: usize },

    #[error("invalid bar series: {reason}")]
    InvalidSeries { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("data load error: {reason}")]
    DataLoad { reason: String },

    #[error("io error: {reason}")]
    Io { reason: String },
}

impl EngineError {
    pub fn invalid_order(reason: impl Into<String>) -> Self {
        EngineError::InvalidOrder {
            reason: reason.into(),
        }
    }

    pub fn invalid_parameter(name: impl Into<String>, reason: impl Into<String>) -> Self {
        EngineError::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        EngineError::Io {
            reason: err.to_string(),
        }
    }
}

impl From<&EngineError> for std::process::ExitCode {
    fn from(err: &EngineError) -> Self {
        let code: u8 = match err {
            EngineError::Io { .. } => 1,
            EngineError::ConfigParse { .. }
            | EngineError::ConfigMissing { .. }
            | EngineError::ConfigInvalid { .. } => 2,
            EngineError::DataLoad { .. } => 3,
            EngineError::InvalidParameter { .. } => 4,
            EngineError::InsufficientData { .. } | EngineError::InvalidSeries { .. } => 5,
            EngineError::InvalidOrder { .. } => 6,
        };
        std::process::ExitCode::from(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_invalid_parameter() {
        let err = EngineError::invalid_parameter("window", "must be positive");
        assert_eq!(err.to_string(), "invalid parameter window: must be positive");
    }

    #[test]
    fn display_insufficient_data() {
        let err = EngineError::InsufficientData {
            bars: 3,
            required: 10,
        };
        assert_eq!(err.to_string(), "insufficient data: have 3 bars, need 10");
    }

    #[test]
    fn io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: EngineError = io.into();
        assert!(matches!(err, EngineError::Io { .. }));
    }
}
