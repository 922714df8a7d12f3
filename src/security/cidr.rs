//! CIDR network ranges.
//!
//! # Design Decisions
//! - A range is stored as its masked network address plus prefix length
//! - Families never cross: a v4 range never contains a v6 address
//! - Host bits past the prefix are masked off when parsing

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

use thiserror::Error;

/// Errors produced while parsing CIDR notation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CidrError {
    /// The address part is not a valid IPv4 or IPv6 address.
    #[error("invalid network address in {0:?}")]
    Address(String),

    /// The prefix part is missing, not a number, or too long for the family.
    #[error("invalid prefix length in {0:?}")]
    Prefix(String),
}

/// An IPv4 or IPv6 network with a prefix length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IpRange {
    V4 { network: Ipv4Addr, prefix: u8 },
    V6 { network: Ipv6Addr, prefix: u8 },
}

impl IpRange {
    /// A range covering exactly one address.
    pub fn host(addr: IpAddr) -> Self {
        match addr {
            IpAddr::V4(network) => IpRange::V4 { network, prefix: 32 },
            IpAddr::V6(network) => IpRange::V6 { network, prefix: 128 },
        }
    }

    pub fn prefix_len(&self) -> u8 {
        match self {
            IpRange::V4 { prefix, .. } | IpRange::V6 { prefix, .. } => *prefix,
        }
    }

    /// Returns true if `addr` lies inside this range.
    pub fn contains(&self, addr: &IpAddr) -> bool {
        match (self, addr) {
            (IpRange::V4 { network, prefix }, IpAddr::V4(ip)) => {
                let mask = v4_mask(*prefix);
                u32::from(*ip) & mask == u32::from(*network)
            }
            (IpRange::V6 { network, prefix }, IpAddr::V6(ip)) => {
                let mask = v6_mask(*prefix);
                u128::from(*ip) & mask == u128::from(*network)
            }
            _ => false,
        }
    }
}

fn v4_mask(prefix: u8) -> u32 {
    if prefix == 0 {
        0
    } else {
        u32::MAX << (32 - u32::from(prefix))
    }
}

fn v6_mask(prefix: u8) -> u128 {
    if prefix == 0 {
        0
    } else {
        u128::MAX << (128 - u32::from(prefix))
    }
}

impl FromStr for IpRange {
    type Err = CidrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (addr_part, prefix_part) = match s.split_once('/') {
            Some((a, p)) => (a, Some(p)),
            None => (s, None),
        };

        let addr: IpAddr = addr_part
            .parse()
            .map_err(|_| CidrError::Address(s.to_string()))?;

        let max = match addr {
            IpAddr::V4(_) => 32,
            IpAddr::V6(_) => 128,
        };
        let prefix = match prefix_part {
            Some(p) => p
                .parse::<u8>()
                .ok()
                .filter(|p| *p <= max)
                .ok_or_else(|| CidrError::Prefix(s.to_string()))?,
            None => max,
        };

        Ok(match addr {
            IpAddr::V4(ip) => IpRange::V4 {
                network: Ipv4Addr::from(u32::from(ip) & v4_mask(prefix)),
                prefix,
            },
            IpAddr::V6(ip) => IpRange::V6 {
                network: Ipv6Addr::from(u128::from(ip) & v6_mask(prefix)),
                prefix,
            },
        })
    }
}

impl fmt::Display for IpRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IpRange::V4 { network, prefix } => write!(f, "{}/{}", network, prefix),
            IpRange::V6 { network, prefix } => write!(f, "{}/{}", network, prefix),
        }
    }
}
