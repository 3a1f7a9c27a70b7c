//! Instance Registry / Lifecycle Manager.
//!
//! Composes the port and network allocators, the workspace store and a
//! [`wp_provider::ContainerEngine`] into the create, start, stop, remove,
//! clone, list and info operations, plus workspace `init` and `boot`.

pub mod clone;
pub mod error;
pub mod layout;
pub mod manager;
pub mod mysql;
pub mod readiness;

pub use clone::CloneStrategy;
pub use error::{TransitionError, TransitionResult};
pub use layout::{InstanceLayout, TemplateSource};
pub use manager::{
    service_alias, BootOutcome, CloneOutcome, CreateOutcome, InstanceManager, InstanceView,
    LiveStatus, RemoveOutcome, StackRequest, StartOutcome, Substitution,
};
