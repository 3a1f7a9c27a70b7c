//! Workspace configuration for wp-dind.
//!
//! The workspace document (`wp-workspace.json`) is the source of truth for
//! which sites exist, which ports and networks they hold and which stack they
//! run. Credentials live in each site's metadata file instead.

pub mod metadata;
pub mod settings;
pub mod stack;
pub mod store;
pub mod workspace;

pub use metadata::{InstanceMetadata, METADATA_FILE};
pub use settings::{ManagerSettings, ReadinessPolicy};
pub use stack::{
    ImageVersions, MysqlVersion, PhpVersion, Resolved, SharedService, StackCatalog, StackSpec,
    WebServer,
};
pub use store::{WorkspaceLock, WorkspaceStore, WORKSPACE_FILE};
pub use workspace::{InstanceRecord, InstanceStatus, Workspace, WorkspaceType};
