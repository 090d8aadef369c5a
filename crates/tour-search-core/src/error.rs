//! Error taxonomy for the search engine.
//!
//! Every variant here is a locally-recovered condition (see `spec.md` §7):
//! nothing produced by this crate's public API is meant to abort a tour or
//! propagate past the `Engine` facade. Callers that want the warning text
//! still get a `Result`; the facade itself degrades to an empty/partial
//! result and a logged `tracing::warn!` rather than unwinding.

use thiserror::Error;

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Abstract error kinds from the engine's error-handling design.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The merged configuration failed validation. The previous
    /// configuration is retained; this variant carries enough detail to
    /// render a host-page diagnostic.
    #[error("invalid configuration at `{path}`: {reason}")]
    Configuration {
        /// Dot-path of the offending field, e.g. `"filter.elementTypes.mode"`.
        path: String,
        reason: String,
    },

    /// The tour adapter never reached a ready state within the configured
    /// timeout. Search becomes inert until a later tour-load event re-arms it.
    #[error("tour adapter not ready after {waited_ms}ms")]
    TourNotReady {
        waited_ms: u64,
    },

    /// Business JSON or CSV failed to load or parse. The affected source is
    /// treated as empty; indexing continues from tour data alone.
    #[error("failed to load {source}: {reason}")]
    DataSourceLoadFailure {
        source: &'static str,
        reason: String,
    },

    /// An element's class could not be mapped unambiguously, or a sheets
    /// record matched more than one tour record with tied confidence.
    #[error("classification ambiguity: {0}")]
    ClassificationAmbiguity(String),

    /// Trigger-with-retry exhausted its retry budget.
    #[error("activation failed for `{target_id}` after {attempts} attempts")]
    ActivationFailure {
        target_id: String,
        attempts: u32,
    },

    /// A per-item exception during traversal. Carries enough context for the
    /// indexer to skip the offending node and keep building.
    #[error("indexing error at index {index:?} (parent {parent_index:?}): {reason}")]
    IndexingError {
        index: Option<i64>,
        parent_index: Option<i64>,
        reason: String,
    },

    /// Serialization/deserialization of a wire payload or persisted config.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// CSV parsing failure, surfaced as a `DataSourceLoadFailure` by callers
    /// but kept distinct here so the loader can report the exact row/column.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

impl EngineError {
    /// Stable machine-readable category, e.g. for a host-page diagnostics panel.
    #[must_use]
    pub const fn error_type(&self) -> &'static str {
        match self {
            Self::Configuration { .. } => "CONFIGURATION_ERROR",
            Self::TourNotReady { .. } => "TOUR_NOT_READY",
            Self::DataSourceLoadFailure { .. } => "DATA_SOURCE_LOAD_FAILURE",
            Self::ClassificationAmbiguity(_) => "CLASSIFICATION_AMBIGUITY",
            Self::ActivationFailure { .. } => "ACTIVATION_FAILURE",
            Self::IndexingError { .. } => "INDEXING_ERROR",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
            Self::Csv(_) => "DATA_SOURCE_LOAD_FAILURE",
        }
    }

    /// Whether a caller could reasonably retry the operation that produced
    /// this error (used by the navigation dispatcher's retry loop and by the
    /// live-config poller's error path).
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::TourNotReady { .. } | Self::ActivationFailure { .. } | Self::DataSourceLoadFailure { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_type_mapping_is_stable() {
        let e = EngineError::Configuration {
            path: "filter.mode".into(),
            reason: "unknown enum value".into(),
        };
        assert_eq!(e.error_type(), "CONFIGURATION_ERROR");
    }

    #[test]
    fn retryable_classification() {
        assert!(EngineError::TourNotReady { waited_ms: 20_000 }.is_retryable());
        assert!(EngineError::ActivationFailure {
            target_id: "x".into(),
            attempts: 5
        }
        .is_retryable());
        assert!(!EngineError::ClassificationAmbiguity("dup".into()).is_retryable());
    }

    #[test]
    fn display_all_non_empty() {
        let errors: Vec<EngineError> = vec![
            EngineError::Configuration {
                path: "a".into(),
                reason: "b".into(),
            },
            EngineError::TourNotReady { waited_ms: 1 },
            EngineError::DataSourceLoadFailure {
                source: "business",
                reason: "404".into(),
            },
            EngineError::ClassificationAmbiguity("tie".into()),
            EngineError::ActivationFailure {
                target_id: "id1".into(),
                attempts: 3,
            },
            EngineError::IndexingError {
                index: Some(2),
                parent_index: None,
                reason: "bad node".into(),
            },
        ];
        for e in errors {
            assert!(!e.to_string().is_empty());
        }
    }

    #[test]
    fn serialization_error_from_conversion() {
        let bad = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let wrapped: EngineError = bad.into();
        assert_eq!(wrapped.error_type(), "SERIALIZATION_ERROR");
    }
}
