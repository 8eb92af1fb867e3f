//! Route modules of the planroom API.

pub mod account;
pub mod admin;
pub mod plans;
pub mod teams;

use crate::module::Module;
use crate::router::Router;
use crate::{Error, Result};

/// Every module served by the planroom binary.
pub fn modules() -> Vec<Box<dyn Module>> {
    vec![
        Box::new(account::AccountModule),
        Box::new(admin::AdminModule),
        Box::new(teams::TeamsModule),
        Box::new(plans::PlansModule),
    ]
}

/// Build a router with all modules registered.
pub fn router() -> Router {
    let mut router = Router::new();
    for module in modules() {
        tracing::debug!("Registering module {}", module.name());
        module.routes(&mut router);
    }
    router
}

/// Trim a required free-text field and enforce a length limit.
pub(crate) fn required_text(field: &str, value: &str, max_chars: usize) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(Error::BadRequest(format!("{field} must not be empty")));
    }
    if value.chars().count() > max_chars {
        return Err(Error::BadRequest(format!(
            "{field} must be at most {max_chars} characters"
        )));
    }
    Ok(value.to_string())
}
