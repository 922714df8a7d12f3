//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → allowlist.rs (exempt path? else source address in allowed CIDR ranges)
//!     → auth.rs (protected routes only: Bearer token)
//!     → Pass to route handler
//! ```
//!
//! # Design Decisions
//! - Fail closed: reject on any security check failure
//! - Admission runs before authentication, for every request
//! - Both structures are built once at startup and never mutated

pub mod allowlist;
pub mod auth;
pub mod cidr;

pub use allowlist::{Admission, Allowlist, PathPolicy, Rejection};
pub use auth::{AuthFailure, BearerAuth};
pub use cidr::IpRange;
