//! HTTP surface of the gateway.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, layers)
//!     → request.rs (request ID)
//!     → middleware/admission.rs (source allowlist)
//!     → middleware/auth.rs (bearer token, protected routes)
//!     → handlers.rs (proxy, scrape, tts, robots)
//!     → response.rs (upstream header filtering)
//!     → error.rs (failures as {"detail": ...})
//! ```

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod request;
pub mod response;
pub mod server;

pub use error::GatewayError;
pub use request::X_REQUEST_ID;
pub use server::{AppState, GatewayServer};
