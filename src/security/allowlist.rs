//! Source-address admission.
//!
//! # Responsibilities
//! - Hold the process-wide allowed ranges (immutable after construction)
//! - Apply exempt-path overrides before the range check
//! - Classify every request as admitted or rejected, with the reason

use std::net::IpAddr;

use crate::config::SecurityConfig;
use crate::security::cidr::{CidrError, IpRange};

/// Policy attached to an exempt path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathPolicy {
    /// Reachable from any address, even an unparseable one.
    Public,
}

/// Why a request was turned away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// The source address could not be parsed.
    MalformedAddress,
    /// The address is outside every allowed range.
    OutsideRanges,
}

impl Rejection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rejection::MalformedAddress => "malformed_address",
            Rejection::OutsideRanges => "outside_ranges",
        }
    }
}

/// Outcome of an admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Admit,
    Reject(Rejection),
}

/// Errors building an allowlist from configuration.
#[derive(Debug, thiserror::Error)]
pub enum AllowlistError {
    #[error(transparent)]
    Range(#[from] CidrError),

    #[error("allowlist must contain at least one range")]
    Empty,
}

/// Allowed source ranges plus exact-path overrides.
#[derive(Debug, Clone)]
pub struct Allowlist {
    ranges: Vec<IpRange>,
    overrides: Vec<(String, PathPolicy)>,
}

impl Allowlist {
    /// Build an allowlist; fails when `ranges` is empty.
    pub fn new(
        ranges: Vec<IpRange>,
        overrides: Vec<(String, PathPolicy)>,
    ) -> Result<Self, AllowlistError> {
        if ranges.is_empty() {
            return Err(AllowlistError::Empty);
        }
        Ok(Self { ranges, overrides })
    }

    pub fn from_config(config: &SecurityConfig) -> Result<Self, AllowlistError> {
        let mut ranges = config
            .allowed_ranges
            .iter()
            .map(|r| r.parse::<IpRange>())
            .collect::<Result<Vec<_>, _>>()?;

        if config.allow_loopback {
            ranges.push(IpRange::host(IpAddr::from([127, 0, 0, 1])));
        }

        let overrides = config
            .exempt_paths
            .iter()
            .map(|p| (p.clone(), PathPolicy::Public))
            .collect();

        Self::new(ranges, overrides)
    }

    pub fn ranges(&self) -> &[IpRange] {
        &self.ranges
    }

    /// Policy override for an exact path, if any.
    pub fn override_for(&self, path: &str) -> Option<PathPolicy> {
        self.overrides
            .iter()
            .find(|(p, _)| p == path)
            .map(|(_, policy)| *policy)
    }

    /// Returns true if `addr` is inside any allowed range.
    ///
    /// IPv4-mapped IPv6 addresses are checked as IPv4.
    pub fn contains(&self, addr: IpAddr) -> bool {
        let addr = addr.to_canonical();
        self.ranges.iter().any(|r| r.contains(&addr))
    }

    /// Classify a request by its raw source address and path.
    pub fn check(&self, raw_addr: &str, path: &str) -> Admission {
        if let Some(PathPolicy::Public) = self.override_for(path) {
            return Admission::Admit;
        }

        match raw_addr.trim().parse::<IpAddr>() {
            Ok(addr) if self.contains(addr) => Admission::Admit,
            Ok(_) => Admission::Reject(Rejection::OutsideRanges),
            Err(_) => Admission::Reject(Rejection::MalformedAddress),
        }
    }
}
