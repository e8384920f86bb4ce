//! HTTP middleware stack.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. CORS
//! 5. Rate limiting (governor, auth routes only)
//!
//! Admin access is enforced per handler by the [`RequireAdmin`] extractor.

pub mod admin;
pub mod rate_limit;
pub mod request_id;

pub use admin::{AdminIdentity, RequireAdmin};
pub use rate_limit::auth_rate_limiter;
pub use request_id::request_id_middleware;
