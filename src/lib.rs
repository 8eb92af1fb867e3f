//! Planroom - business-plan collaboration backend.
//!
//! Users create and share business plans, work together in teams, and
//! administrators manage users and the activity log. Every protected
//! operation is decided by the [`permission`] module:
//!
//! - **Permission**: system role and team role checks, plan ownership
//! - **Access**: bearer token to principal resolution (401 vs 403)
//! - **Store**: libsql user/team/plan directories and the activity log
//! - **Api**: admin, team and plan route modules
//! - **Config**: Layered configuration (file → env → CLI)
//! - **Server**: Hyper-based HTTP server
//!
//! # Example
//!
//! ```ignore
//! use planroom::config::{Loader, Overrides};
//!
//! #[tokio::main]
//! async fn main() -> planroom::Result<()> {
//!     let config = Loader::default().load(None, &Overrides::default())?;
//!     let db = planroom::db::open(&config.database.url).await?;
//!     let router = planroom::api::router();
//!     planroom::server::run(config, Some(db), router.into_handle()).await
//! }
//! ```

pub mod access;
pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod module;
pub mod permission;
pub mod response;
pub mod router;
pub mod server;
pub mod store;

pub use config::{Config, Loader};
pub use db::Handle as DbHandle;
pub use error::{Error, Result};
pub use module::Module;
pub use permission::{Action, PermissionChecker, Principal, SystemRole, TeamMembership, TeamRole};
pub use router::{Context, Router};
