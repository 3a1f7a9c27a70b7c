//! Outcome classification for lifecycle transitions.

use thiserror::Error;
use wp_core::error::WpError;

/// Why a lifecycle transition did not complete.
#[derive(Debug, Error)]
pub enum TransitionError {
    /// Refused before any side effect.
    #[error("{0}")]
    Rejected(WpError),

    /// Failed midway; every side effect was undone.
    #[error("{source}")]
    RolledBack { source: WpError },

    /// Failed midway and left state behind.
    #[error("{source}")]
    Partial { source: WpError, cleanup_hint: String },
}

impl TransitionError {
    pub fn partial(source: WpError, cleanup_hint: impl Into<String>) -> Self {
        TransitionError::Partial {
            source,
            cleanup_hint: cleanup_hint.into(),
        }
    }

    pub fn cleanup_hint(&self) -> Option<&str> {
        match self {
            TransitionError::Partial { cleanup_hint, .. } => Some(cleanup_hint),
            _ => None,
        }
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, TransitionError::Rejected(_))
    }

    pub fn into_source(self) -> WpError {
        match self {
            TransitionError::Rejected(source)
            | TransitionError::RolledBack { source }
            | TransitionError::Partial { source, .. } => source,
        }
    }
}

/// Errors raised before the first write are rejections.
impl From<WpError> for TransitionError {
    fn from(err: WpError) -> Self {
        TransitionError::Rejected(err)
    }
}

pub type TransitionResult<T> = std::result::Result<T, TransitionError>;
