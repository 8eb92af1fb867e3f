//! User directory.

use libsql::{Connection, Row, params};

use super::{flag, new_id, normalize_email};
use crate::permission::{Principal, SystemRole};
use crate::{Error, Result};

const COLUMNS: &str = "id, email, role, active";

fn from_row(row: &Row) -> Result<Principal> {
    Ok(Principal {
        id: row.get::<String>(0)?,
        email: row.get::<String>(1)?,
        role: row.get::<String>(2)?.parse()?,
        active: flag(row, 3)?,
    })
}

async fn query_one(conn: &Connection, sql: &str, key: &str) -> Result<Option<Principal>> {
    let mut rows = conn.query(sql, params![key]).await?;
    match rows.next().await? {
        Some(row) => Ok(Some(from_row(&row)?)),
        None => Ok(None),
    }
}

/// Register a new, active user. Fails with `Conflict` if the email is taken.
pub async fn create(conn: &Connection, email: &str, role: SystemRole) -> Result<Principal> {
    let email = normalize_email(email)?;
    if find_by_email(conn, &email).await?.is_some() {
        return Err(Error::Conflict(format!("User {email} already exists")));
    }

    let user = Principal {
        id: new_id(),
        email,
        role,
        active: true,
    };
    conn.execute(
        "INSERT INTO users (id, email, role, active, created_at) VALUES (?1, ?2, ?3, 1, ?4)",
        params![
            user.id.as_str(),
            user.email.as_str(),
            role.as_str(),
            crate::db::now()
        ],
    )
    .await?;

    tracing::info!(user = %user.id, role = %role, "user created");
    Ok(user)
}

/// Look up a user regardless of activation state.
pub async fn find(conn: &Connection, id: &str) -> Result<Option<Principal>> {
    let sql = format!("SELECT {COLUMNS} FROM users WHERE id = ?1");
    query_one(conn, &sql, id).await
}

pub async fn find_by_email(conn: &Connection, email: &str) -> Result<Option<Principal>> {
    let sql = format!("SELECT {COLUMNS} FROM users WHERE email = ?1");
    query_one(conn, &sql, &email.trim().to_ascii_lowercase()).await
}

/// Principal for an authenticated request. Unknown and inactive users both
/// resolve to `None`.
pub async fn find_active(conn: &Connection, id: &str) -> Result<Option<Principal>> {
    Ok(find(conn, id).await?.filter(|user| user.active))
}

pub async fn list(conn: &Connection) -> Result<Vec<Principal>> {
    let sql = format!("SELECT {COLUMNS} FROM users ORDER BY email");
    let mut rows = conn.query(&sql, ()).await?;
    let mut users = Vec::new();
    while let Some(row) = rows.next().await? {
        users.push(from_row(&row)?);
    }
    Ok(users)
}

/// Change the role and/or activation of a user and return the new state.
pub async fn update(
    conn: &Connection,
    id: &str,
    role: Option<SystemRole>,
    active: Option<bool>,
) -> Result<Principal> {
    let mut user = find(conn, id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("user {id}")))?;

    if let Some(role) = role {
        user.role = role;
    }
    if let Some(active) = active {
        user.active = active;
    }

    conn.execute(
        "UPDATE users SET role = ?1, active = ?2 WHERE id = ?3",
        params![user.role.as_str(), i64::from(user.active), id],
    )
    .await?;

    tracing::info!(user = %id, role = %user.role, active = user.active, "user updated");
    Ok(user)
}

pub async fn count(conn: &Connection) -> Result<u64> {
    let mut rows = conn.query("SELECT count(*) FROM users", ()).await?;
    match rows.next().await? {
        Some(row) => Ok(u64::try_from(row.get::<i64>(0)?).unwrap_or(0)),
        None => Ok(0),
    }
}
