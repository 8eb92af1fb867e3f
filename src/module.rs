//! Module trait for pluggable API modules.
//!
//! Each area of the API (admin console, teams, plans) is a module that
//! registers its routes on a shared [`Router`].
//!
//! # Example
//!
//! ```ignore
//! use planroom::{Module, Router};
//!
//! pub struct HealthModule;
//!
//! impl Module for HealthModule {
//!     fn name(&self) -> &'static str {
//!         "health"
//!     }
//!
//!     fn routes(&self, router: &mut Router) {
//!         router.get("/health", |_ctx| async move {
//!             planroom::response::ok(&serde_json::json!({ "status": "ok" }))
//!         });
//!     }
//! }
//! ```

use crate::router::Router;

/// A pluggable API module.
pub trait Module: Send + Sync {
    /// Module name for identification and logging.
    fn name(&self) -> &'static str;

    /// Register all of the module's routes.
    fn routes(&self, router: &mut Router);
}
