//! libsql-backed directories consumed by the access layer and route modules.
//!
//! - [`users`]: principals and their system roles
//! - [`teams`]: teams, memberships and invitations
//! - [`plans`]: plan ownership and sharing
//! - [`activity`]: the admin-visible activity log
//!
//! Every function takes a borrowed [`Connection`](libsql::Connection) so
//! callers decide connection lifetime and transaction scope.

pub mod activity;
pub mod plans;
pub mod teams;
pub mod users;

use libsql::{Row, Value};

use crate::{Error, Result};

pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Read a nullable TEXT column.
pub(crate) fn opt_text(row: &Row, idx: i32) -> Result<Option<String>> {
    match row.get_value(idx)? {
        Value::Null => Ok(None),
        Value::Text(s) => Ok(Some(s)),
        other => Err(Error::Internal(format!(
            "Expected text in column {idx}, found {other:?}"
        ))),
    }
}

/// Read an INTEGER 0/1 column.
pub(crate) fn flag(row: &Row, idx: i32) -> Result<bool> {
    Ok(row.get::<i64>(idx)? != 0)
}

pub(crate) fn opt_value(value: Option<&str>) -> Value {
    match value {
        Some(s) => Value::Text(s.to_string()),
        None => Value::Null,
    }
}

/// Normalise an email address for storage and comparison.
pub fn normalize_email(email: &str) -> Result<String> {
    let email = email.trim().to_ascii_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(email),
        _ => Err(Error::BadRequest(format!("Invalid email address: {email}"))),
    }
}
