pub use anyhow::bail;
use std::fmt::{self, Display, Formatter};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WpError {
    Validation(String),
    NotFound(String),
    AlreadyExists(String),
    Conflict(String),
    Engine(String),
    Command(String),
    Timeout(String),
    Config(String),
    Serialization(String),
    ConcurrentModification(String),
    Internal(String),
    Io(#[from] std::io::Error),
    Other(#[from] anyhow::Error),
}

impl WpError {
    /// Errors raised before any side effect took place.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            WpError::Validation(_) | WpError::NotFound(_) | WpError::AlreadyExists(_)
        )
    }
}

impl Display for WpError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            WpError::Validation(s) => write!(f, "{}", s),
            WpError::NotFound(s) => write!(f, "{}", s),
            WpError::AlreadyExists(s) => write!(f, "{}", s),
            WpError::Conflict(s) => write!(f, "Resource conflict: {}", s),
            WpError::Engine(s) => write!(f, "Container engine error: {}", s),
            WpError::Command(s) => write!(f, "Command failed: {}", s),
            WpError::Timeout(s) => write!(f, "Timed out: {}", s),
            WpError::Config(s) => write!(f, "Configuration error: {}", s),
            WpError::Serialization(s) => write!(f, "Serialization error: {}", s),
            WpError::ConcurrentModification(s) => {
                write!(f, "Workspace was modified concurrently: {}\n\n", s)?;
                write!(f, "Fix:\n")?;
                write!(f, "  • Re-run the command once the other invocation has finished")
            }
            WpError::Internal(s) => write!(f, "Internal error: {}", s),
            WpError::Io(e) => write!(f, "I/O error: {}", e),
            WpError::Other(e) => write!(f, "{}", e),
        }
    }
}

impl From<serde_json::Error> for WpError {
    fn from(err: serde_json::Error) -> Self {
        WpError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, WpError>;
