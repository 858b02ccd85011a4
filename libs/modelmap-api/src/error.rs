use std::fmt;

/// Error returned by transformers and by the resolution engine.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransformError {
    /// Registration rejected. Permanent, raised at startup.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// No registered transformer resolved for the pair.
    #[error("can not transform value of type \"{source_type}\" to type \"{target_type}\"")]
    UnsupportedTransformation {
        source_type: String,
        target_type: String,
    },

    /// A transformer's own failure.
    #[error("transformer '{transformer}' failed: {message}")]
    Conversion { transformer: String, message: String },
}

impl TransformError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn unsupported(source_type: impl Into<String>, target_type: impl Into<String>) -> Self {
        Self::UnsupportedTransformation {
            source_type: source_type.into(),
            target_type: target_type.into(),
        }
    }

    /// Failure raised by a concrete transformer.
    pub fn conversion(transformer: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Conversion {
            transformer: transformer.into(),
            message: msg.into(),
        }
    }

    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::UnsupportedTransformation { .. })
    }

    /// Add context to the error.
    ///
    /// Produces `"context: original message"` for message-bearing variants.
    /// `UnsupportedTransformation` is returned as-is so its fields stay literal.
    pub fn with_context(self, ctx: impl fmt::Display) -> Self {
        match self {
            Self::Configuration(msg) => Self::Configuration(format!("{ctx}: {msg}")),
            Self::Conversion {
                transformer,
                message,
            } => Self::Conversion {
                transformer,
                message: format!("{ctx}: {message}"),
            },
            other => other,
        }
    }
}
