#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("io error: {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{format} config error: {message}")]
    Parse {
        format: &'static str,
        message: String,
    },

    #[error("unsupported config format '{path}' (expected one of: {expected})")]
    UnsupportedFormat { path: String, expected: String },
}

impl ConfigError {
    /// Add context to the error.
    ///
    /// For `Parse`, context is prepended to the message.
    /// Other variants already carry the offending path.
    pub fn with_context(self, ctx: impl std::fmt::Display) -> Self {
        match self {
            ConfigError::Parse { format, message } => ConfigError::Parse {
                format,
                message: format!("{ctx}: {message}"),
            },
            other => other,
        }
    }
}
