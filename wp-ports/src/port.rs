//! Host port allocation.
//!
//! Allocation is append-only: a new instance always receives a port above
//! every port currently assigned, so a removed instance's port is only handed
//! out again once no higher port remains in use.

use std::collections::BTreeSet;

use tracing::debug;
use wp_core::error::{Result, WpError};

/// First port handed to multi-instance sites.
pub const DEFAULT_RANGE_START: u16 = 8001;

/// Fixed port of the single site in workspace mode.
pub const WORKSPACE_PORT: u16 = 8000;

/// Smallest port `>= range_start` that is strictly greater than every
/// assigned port.
pub fn next_port(existing: &BTreeSet<u16>, range_start: u16) -> Result<u16> {
    let candidate = match existing.iter().next_back() {
        Some(&highest) => highest
            .checked_add(1)
            .ok_or_else(|| WpError::Conflict("No host ports left above 65535".to_string()))?
            .max(range_start),
        None => range_start,
    };

    debug!(
        "Allocated port {} (assigned: {:?}, range start: {})",
        candidate, existing, range_start
    );
    Ok(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ports(values: &[u16]) -> BTreeSet<u16> {
        values.iter().copied().collect()
    }

    #[test]
    fn test_first_port_is_range_start() {
        assert_eq!(next_port(&ports(&[]), 8001).unwrap(), 8001);
    }

    #[test]
    fn test_appends_after_highest() {
        assert_eq!(next_port(&ports(&[8001, 8002]), 8001).unwrap(), 8003);
    }

    #[test]
    fn test_does_not_fill_gaps() {
        // 8001 was released but 8002 is still assigned
        assert_eq!(next_port(&ports(&[8002]), 8001).unwrap(), 8003);
    }

    #[test]
    fn test_reuses_highest_when_released() {
        // Only lower ports remain; the released top value becomes next again
        assert_eq!(next_port(&ports(&[8001]), 8001).unwrap(), 8002);
    }

    #[test]
    fn test_ports_below_range_are_ignored_for_floor() {
        assert_eq!(next_port(&ports(&[8000]), 8001).unwrap(), 8001);
    }

    #[test]
    fn test_exhaustion_is_an_error() {
        assert!(next_port(&ports(&[u16::MAX]), 8001).is_err());
    }
}
