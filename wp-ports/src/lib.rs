//! Port and network allocation.
//!
//! Both allocators are pure functions over persisted workspace state; the
//! caller holds the workspace lock while allocating and persisting.

pub mod network;
pub mod port;

pub use network::{NetworkAllocator, NetworkInfo, NetworkSpec, Subnet};
pub use port::{next_port, DEFAULT_RANGE_START, WORKSPACE_PORT};
