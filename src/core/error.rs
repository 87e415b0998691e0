use crate::core::types::StatKind;
use thiserror::Error;

/// Errors produced by the statrank engine.
#[derive(Error, Debug)]
#[allow(missing_docs)]
pub enum StatError {
    #[error("metric '{alias}' has an empty component list")]
    EmptyComponentList { alias: String },

    #[error(
        "metric '{alias}': statistic '{statistic}' is declared {declared} but is intrinsically {intrinsic}"
    )]
    TypeMismatch {
        alias: String,
        statistic: String,
        declared: StatKind,
        intrinsic: StatKind,
    },

    #[error("metric '{alias}' references unknown statistic '{statistic}'")]
    UnknownStatistic { alias: String, statistic: String },

    #[error("metric '{alias}': invalid operator '{symbol}' (expected one of + - *)")]
    InvalidOperator { alias: String, symbol: char },

    #[error("metric '{alias}': total flag requires exactly one keyed component")]
    InvalidTotalFlag { alias: String },

    #[error("metric '{alias}': keyed statistic '{statistic}' needs a discriminator (or the total flag)")]
    MissingDiscriminator { alias: String, statistic: String },

    #[error("a computation for requester '{0}' is already running")]
    AlreadyRunning(String),

    #[error("quiesce timed out with {pending} computation(s) still in flight")]
    QuiesceTimeout { pending: usize },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("catalog error: {0}")]
    Catalog(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("async task join error: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("completion channel closed")]
    ChannelClosed,
}

/// Result type alias for statrank operations.
pub type Result<T> = std::result::Result<T, StatError>;

impl StatError {
    /// Creates a new configuration error.
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a new catalog error.
    pub fn catalog<S: Into<String>>(msg: S) -> Self {
        Self::Catalog(msg.into())
    }

    /// Returns true if this error is a definition (construction-time) error.
    ///
    /// Definition errors are fatal to one metric definition, never to the
    /// catalog as a whole: catalog loading skips the definition and continues.
    pub fn is_definition_error(&self) -> bool {
        matches!(
            self,
            Self::EmptyComponentList { .. }
                | Self::TypeMismatch { .. }
                | Self::UnknownStatistic { .. }
                | Self::InvalidOperator { .. }
                | Self::InvalidTotalFlag { .. }
                | Self::MissingDiscriminator { .. }
        )
    }

    /// Returns true if this error is a scheduling rejection rather than a
    /// failure (the caller may simply retry later).
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::AlreadyRunning(_))
    }

    /// Returns the error category for diagnostics and logging.
    pub fn category(&self) -> &'static str {
        match self {
            Self::EmptyComponentList { .. }
            | Self::TypeMismatch { .. }
            | Self::UnknownStatistic { .. }
            | Self::InvalidOperator { .. }
            | Self::InvalidTotalFlag { .. }
            | Self::MissingDiscriminator { .. } => "definition",
            Self::AlreadyRunning(_) | Self::QuiesceTimeout { .. } => "scheduling",
            Self::Config(_) => "config",
            Self::Catalog(_) => "catalog",
            Self::Io(_) => "io",
            Self::Join(_) => "async",
            Self::ChannelClosed => "channel",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_definition_error_classification() {
        let err = StatError::EmptyComponentList {
            alias: "deaths".into(),
        };
        assert!(err.is_definition_error());
        assert_eq!(err.category(), "definition");

        let err = StatError::AlreadyRunning("artemis".into());
        assert!(!err.is_definition_error());
        assert!(err.is_rejection());
        assert_eq!(err.category(), "scheduling");
    }

    #[test]
    fn test_error_messages() {
        let err = StatError::InvalidOperator {
            alias: "kd".into(),
            symbol: '/',
        };
        assert_eq!(err.to_string(), "metric 'kd': invalid operator '/' (expected one of + - *)");

        let err = StatError::config("bad threshold");
        assert_eq!(err.to_string(), "configuration error: bad threshold");
    }
}
