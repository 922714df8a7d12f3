//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → tls.rs (optional TLS handshake via rustls)
//!     → Hand off to HTTP layer
//! ```
//!
//! Plain TCP is served by `axum::serve`; TLS by `axum-server`. Both carry
//! the peer address into the request for the admission filter.

pub mod tls;
