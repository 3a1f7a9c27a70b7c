//! Bridge network allocation.
//!
//! Every multi-instance site gets a private network `wp-network-{n}` with
//! subnet `172.20.{n}.0/24`. The ordinal `n` comes from a counter persisted in
//! the workspace document and never goes backwards, so removing a site cannot
//! cause its ordinal to be handed to a new site while an older one still
//! holds it. Ordinal 0 is reserved for the workspace-mode site.

use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::{debug, info};
use wp_core::error::{Result, WpError};

pub const NETWORK_PREFIX: &str = "wp-network";
pub const SHARED_NETWORK: &str = "wp-shared";
pub const WORKSPACE_NETWORK: &str = "wp-workspace";

/// First ordinal handed to multi-instance sites.
pub const FIRST_ORDINAL: u32 = 1;
/// Last usable third octet for a `/24` inside `172.20.0.0/16`.
pub const MAX_ORDINAL: u32 = 255;

/// An IPv4 CIDR block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subnet {
    pub base: Ipv4Addr,
    pub prefix: u8,
}

impl Subnet {
    pub fn new(base: Ipv4Addr, prefix: u8) -> Result<Self> {
        if prefix > 32 {
            return Err(WpError::Validation(format!(
                "Invalid prefix length /{}",
                prefix
            )));
        }
        let subnet = Self { base, prefix };
        Ok(Self {
            base: Ipv4Addr::from(u32::from(base) & subnet.mask()),
            prefix,
        })
    }

    fn mask(&self) -> u32 {
        if self.prefix == 0 {
            0
        } else {
            u32::MAX << (32 - u32::from(self.prefix))
        }
    }

    /// Whether two blocks share at least one address.
    pub fn overlaps(&self, other: &Subnet) -> bool {
        let prefix = self.prefix.min(other.prefix);
        let mask = if prefix == 0 {
            0
        } else {
            u32::MAX << (32 - u32::from(prefix))
        };
        (u32::from(self.base) & mask) == (u32::from(other.base) & mask)
    }

    /// First host address, used as the bridge gateway.
    pub fn gateway(&self) -> Ipv4Addr {
        Ipv4Addr::from(u32::from(self.base) + 1)
    }
}

impl fmt::Display for Subnet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.prefix)
    }
}

impl FromStr for Subnet {
    type Err = WpError;

    fn from_str(s: &str) -> Result<Self> {
        let (addr, prefix) = s
            .trim()
            .split_once('/')
            .ok_or_else(|| WpError::Validation(format!("Invalid subnet '{}'", s)))?;
        let base: Ipv4Addr = addr
            .parse()
            .map_err(|_| WpError::Validation(format!("Invalid subnet address '{}'", s)))?;
        let prefix: u8 = prefix
            .parse()
            .map_err(|_| WpError::Validation(format!("Invalid subnet prefix '{}'", s)))?;
        Subnet::new(base, prefix)
    }
}

impl Serialize for Subnet {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Subnet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// A named bridge network and its subnet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkSpec {
    pub name: String,
    pub subnet: Subnet,
}

impl NetworkSpec {
    /// Network shared by every site and the platform services.
    pub fn shared() -> Self {
        Self {
            name: SHARED_NETWORK.to_string(),
            subnet: Subnet {
                base: Ipv4Addr::new(172, 21, 0, 0),
                prefix: 16,
            },
        }
    }

    /// Fixed private network of the workspace-mode site.
    pub fn workspace() -> Self {
        Self {
            name: WORKSPACE_NETWORK.to_string(),
            subnet: Subnet {
                base: Ipv4Addr::new(172, 20, 0, 0),
                prefix: 24,
            },
        }
    }

    /// Private network for a multi-instance ordinal.
    pub fn for_ordinal(ordinal: u32) -> Result<Self> {
        if !(FIRST_ORDINAL..=MAX_ORDINAL).contains(&ordinal) {
            return Err(WpError::Conflict(format!(
                "Network ordinal {} is outside {}..={}; the workspace has run out of site networks",
                ordinal, FIRST_ORDINAL, MAX_ORDINAL
            )));
        }
        Ok(Self {
            name: format!("{}-{}", NETWORK_PREFIX, ordinal),
            subnet: Subnet {
                base: Ipv4Addr::new(172, 20, ordinal as u8, 0),
                prefix: 24,
            },
        })
    }

    /// Ordinal encoded in a `wp-network-{n}` name.
    pub fn ordinal(&self) -> Option<u32> {
        self.name
            .strip_prefix(NETWORK_PREFIX)
            .and_then(|rest| rest.strip_prefix('-'))
            .and_then(|n| n.parse().ok())
    }
}

/// A network as reported by the container engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkInfo {
    pub name: String,
    pub subnets: Vec<Subnet>,
}

/// Computes the next private network from the persisted counter and checks
/// the proposal against the engine's live networks.
#[derive(Debug, Clone, Copy)]
pub struct NetworkAllocator {
    counter: u32,
}

impl NetworkAllocator {
    /// `counter` is the last ordinal ever handed out (0 when none).
    pub fn new(counter: u32) -> Self {
        Self { counter }
    }

    /// Next ordinal: above the counter and above every ordinal still held.
    pub fn next_ordinal<'a>(&self, assigned: impl IntoIterator<Item = &'a NetworkSpec>) -> u32 {
        let highest_assigned = assigned
            .into_iter()
            .filter_map(NetworkSpec::ordinal)
            .max()
            .unwrap_or(0);
        self.counter.max(highest_assigned).max(FIRST_ORDINAL - 1) + 1
    }

    /// Propose the next network, failing hard if the engine already has a
    /// network with that name or an overlapping subnet.
    pub fn allocate<'a>(
        &self,
        assigned: impl IntoIterator<Item = &'a NetworkSpec>,
        live: &[NetworkInfo],
    ) -> Result<NetworkSpec> {
        let ordinal = self.next_ordinal(assigned);
        let spec = NetworkSpec::for_ordinal(ordinal)?;
        ensure_available(&spec, live)?;
        info!("Allocated network {} ({})", spec.name, spec.subnet);
        Ok(spec)
    }
}

/// Reject a proposed network that collides with a live one.
pub fn ensure_available(spec: &NetworkSpec, live: &[NetworkInfo]) -> Result<()> {
    for network in live {
        if network.name == spec.name {
            return Err(WpError::Conflict(format!(
                "Docker network '{}' already exists; remove it or repair the workspace before creating new sites",
                spec.name
            )));
        }
        if let Some(subnet) = network.subnets.iter().find(|s| s.overlaps(&spec.subnet)) {
            return Err(WpError::Conflict(format!(
                "Subnet {} for '{}' overlaps {} owned by Docker network '{}'",
                spec.subnet, spec.name, subnet, network.name
            )));
        }
    }
    debug!("Network {} is free", spec.name);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn live(name: &str, subnet: &str) -> NetworkInfo {
        NetworkInfo {
            name: name.to_string(),
            subnets: vec![subnet.parse().unwrap()],
        }
    }

    #[test]
    fn test_ordinal_naming() {
        let spec = NetworkSpec::for_ordinal(3).unwrap();
        assert_eq!(spec.name, "wp-network-3");
        assert_eq!(spec.subnet.to_string(), "172.20.3.0/24");
        assert_eq!(spec.ordinal(), Some(3));
        assert_eq!(spec.subnet.gateway(), Ipv4Addr::new(172, 20, 3, 1));
    }

    #[test]
    fn test_ordinal_out_of_range() {
        assert!(NetworkSpec::for_ordinal(0).is_err());
        assert!(NetworkSpec::for_ordinal(256).is_err());
    }

    #[test]
    fn test_first_allocation_uses_ordinal_one() {
        let allocator = NetworkAllocator::new(0);
        let spec = allocator.allocate(&[], &[]).unwrap();
        assert_eq!(spec.name, "wp-network-1");
    }

    #[test]
    fn test_counter_prevents_reuse_after_removal() {
        // Ordinals 1 and 2 were handed out, 2 removed: still move on to 3
        let held = vec![NetworkSpec::for_ordinal(1).unwrap()];
        let allocator = NetworkAllocator::new(2);
        assert_eq!(allocator.next_ordinal(&held), 3);
    }

    #[test]
    fn test_assigned_ordinal_beats_stale_counter() {
        let held = vec![NetworkSpec::for_ordinal(5).unwrap()];
        let allocator = NetworkAllocator::new(1);
        assert_eq!(allocator.next_ordinal(&held), 6);
    }

    #[test]
    fn test_name_collision_is_hard_failure() {
        let allocator = NetworkAllocator::new(0);
        let err = allocator
            .allocate(&[], &[live("wp-network-1", "10.99.0.0/24")])
            .unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }

    #[test]
    fn test_subnet_collision_is_hard_failure() {
        let allocator = NetworkAllocator::new(0);
        let err = allocator
            .allocate(&[], &[live("someone-else", "172.20.0.0/16")])
            .unwrap_err();
        assert!(err.to_string().contains("overlaps"));
    }

    #[test]
    fn test_shared_network_does_not_overlap_site_networks() {
        let shared = NetworkSpec::shared();
        for ordinal in [1, 100, 255] {
            let spec = NetworkSpec::for_ordinal(ordinal).unwrap();
            assert!(!shared.subnet.overlaps(&spec.subnet));
        }
        assert!(!shared.subnet.overlaps(&NetworkSpec::workspace().subnet));
    }

    #[test]
    fn test_subnet_parse_normalizes_host_bits() {
        let subnet: Subnet = "172.20.7.9/24".parse().unwrap();
        assert_eq!(subnet.to_string(), "172.20.7.0/24");
        assert!("nonsense".parse::<Subnet>().is_err());
        assert!("172.20.0.0/33".parse::<Subnet>().is_err());
    }

    #[test]
    fn test_subnet_serde_as_string() {
        let spec = NetworkSpec::for_ordinal(4).unwrap();
        let json = serde_json::to_string(&spec).unwrap();
        assert_eq!(json, r#"{"name":"wp-network-4","subnet":"172.20.4.0/24"}"#);
        let back: NetworkSpec = serde_json::from_str(&json).unwrap();
        assert_eq!(back, spec);
    }
}
