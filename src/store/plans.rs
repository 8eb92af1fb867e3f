//! Plan ownership registry.
//!
//! Only the metadata needed for access decisions and listings is kept here;
//! plan section content lives with the document service.

use libsql::{Connection, Row, params};
use serde::Serialize;

use super::new_id;
use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Plan {
    pub id: String,
    pub owner_id: String,
    pub title: String,
    pub created_at: String,
    pub updated_at: String,
}

const COLUMNS: &str = "p.id, p.owner_id, p.title, p.created_at, p.updated_at";

fn from_row(row: &Row) -> Result<Plan> {
    Ok(Plan {
        id: row.get::<String>(0)?,
        owner_id: row.get::<String>(1)?,
        title: row.get::<String>(2)?,
        created_at: row.get::<String>(3)?,
        updated_at: row.get::<String>(4)?,
    })
}

pub async fn create(conn: &Connection, owner_id: &str, title: &str) -> Result<Plan> {
    let now = crate::db::now();
    let plan = Plan {
        id: new_id(),
        owner_id: owner_id.to_string(),
        title: title.to_string(),
        created_at: now.clone(),
        updated_at: now,
    };
    conn.execute(
        "INSERT INTO plans (id, owner_id, title, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            plan.id.as_str(),
            owner_id,
            title,
            plan.created_at.as_str(),
            plan.updated_at.as_str()
        ],
    )
    .await?;

    tracing::info!(plan = %plan.id, owner = %owner_id, "plan created");
    Ok(plan)
}

pub async fn find(conn: &Connection, id: &str) -> Result<Option<Plan>> {
    let sql = format!("SELECT {COLUMNS} FROM plans p WHERE p.id = ?1");
    let mut rows = conn.query(&sql, params![id]).await?;
    match rows.next().await? {
        Some(row) => Ok(Some(from_row(&row)?)),
        None => Ok(None),
    }
}

/// Owner of a plan, the only fact plan-scoped access decisions need.
pub async fn owner_of(conn: &Connection, id: &str) -> Result<Option<String>> {
    let mut rows = conn
        .query("SELECT owner_id FROM plans WHERE id = ?1", params![id])
        .await?;
    match rows.next().await? {
        Some(row) => Ok(Some(row.get::<String>(0)?)),
        None => Ok(None),
    }
}

/// Plans owned by or shared with `user_id`, most recently updated first.
pub async fn list_visible(conn: &Connection, user_id: &str) -> Result<Vec<Plan>> {
    let sql = format!(
        "SELECT {COLUMNS} FROM plans p
         WHERE p.owner_id = ?1
            OR EXISTS (SELECT 1 FROM plan_shares s WHERE s.plan_id = p.id AND s.user_id = ?1)
         ORDER BY p.updated_at DESC, p.id"
    );
    let mut rows = conn.query(&sql, params![user_id]).await?;
    let mut plans = Vec::new();
    while let Some(row) = rows.next().await? {
        plans.push(from_row(&row)?);
    }
    Ok(plans)
}

pub async fn rename(conn: &Connection, id: &str, title: &str) -> Result<Plan> {
    let changed = conn
        .execute(
            "UPDATE plans SET title = ?1, updated_at = ?2 WHERE id = ?3",
            params![title, crate::db::now(), id],
        )
        .await?;
    if changed == 0 {
        return Err(Error::NotFound(format!("plan {id}")));
    }
    find(conn, id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("plan {id}")))
}

pub async fn delete(conn: &Connection, id: &str) -> Result<()> {
    let tx = conn.transaction().await?;
    tx.execute("DELETE FROM plan_shares WHERE plan_id = ?1", params![id])
        .await?;
    let deleted = tx
        .execute("DELETE FROM plans WHERE id = ?1", params![id])
        .await?;
    if deleted == 0 {
        tx.rollback().await?;
        return Err(Error::NotFound(format!("plan {id}")));
    }
    tx.commit().await?;

    tracing::info!(plan = %id, "plan deleted");
    Ok(())
}

/// Share a plan with another user. Returns `false` if it was already shared.
pub async fn share(conn: &Connection, plan_id: &str, user_id: &str, shared_by: &str) -> Result<bool> {
    let inserted = conn
        .execute(
            "INSERT OR IGNORE INTO plan_shares (plan_id, user_id, shared_by, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![plan_id, user_id, shared_by, crate::db::now()],
        )
        .await?;
    Ok(inserted > 0)
}

pub async fn count(conn: &Connection) -> Result<u64> {
    let mut rows = conn.query("SELECT count(*) FROM plans", ()).await?;
    match rows.next().await? {
        Some(row) => Ok(u64::try_from(row.get::<i64>(0)?).unwrap_or(0)),
        None => Ok(0),
    }
}
