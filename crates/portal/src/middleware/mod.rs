//! HTTP middleware stack for the portal.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layers (capture errors, per-request hub)
//! 2. `TraceLayer` (request tracing)
//! 3. Session layer (tower-sessions with in-memory store)
//! 4. [`ClientPortal`] extractor (per-client portal lookup)

pub mod portal;
pub mod session;

pub use portal::ClientPortal;
pub use session::{SESSION_IDLE_TIMEOUT, create_session_layer};
