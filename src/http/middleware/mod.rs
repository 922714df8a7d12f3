//! Request middleware.
//!
//! # Order
//! ```text
//! request id → trace → timeout → body limit
//!     → admission (every path, exempt list honoured)
//!     → routing
//!     → metrics (matched routes)
//!     → bearer auth (protected routes only)
//!     → handler
//! ```

pub mod admission;
pub mod auth;
pub mod metrics;

pub use admission::admission_middleware;
pub use auth::bearer_auth_middleware;
pub use metrics::track_metrics;
