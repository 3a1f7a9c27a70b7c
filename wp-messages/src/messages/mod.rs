//! Central registry for all user-facing message templates.
//!
//! Organized by domain:
//! - `instance` - instance lifecycle messages (create, start, stop, remove, clone, list, info, logs)
//! - `workspace` - workspace messages (init, boot, shared services)
//! - `common` - shared/reusable messages across commands
//!
//! ```rust
//! use wp_messages::MESSAGES;
//!
//! let msg = MESSAGES.instance.create_success;
//! let msg = MESSAGES.workspace.init_success;
//! let msg = MESSAGES.common.error_generic;
//! ```

mod common;
mod instance;
mod workspace;

pub use common::{CommonMessages, COMMON_MESSAGES};
pub use instance::{InstanceMessages, INSTANCE_MESSAGES};
pub use workspace::{WorkspaceMessages, WORKSPACE_MESSAGES};

/// Unified messages struct containing all domain-specific message modules
pub struct Messages {
    pub instance: InstanceMessages,
    pub workspace: WorkspaceMessages,
    pub common: CommonMessages,
}

/// Global messages constant - main entry point for all message templates
pub const MESSAGES: Messages = Messages {
    instance: INSTANCE_MESSAGES,
    workspace: WORKSPACE_MESSAGES,
    common: COMMON_MESSAGES,
};
