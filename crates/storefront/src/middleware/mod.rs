//! HTTP middleware and extractors for storefront.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request tracing)
//! 3. Identity extractors (per-handler, not a layer)

pub mod identity;

pub use identity::{MaybeAdmin, RequireAdmin, RequireUser, ResolvedIdentity};
