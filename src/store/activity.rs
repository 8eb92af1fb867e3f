//! Activity log shown in the admin console.

use libsql::{Connection, params};
use serde::Serialize;

use super::{new_id, opt_text, opt_value};
use crate::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    pub id: String,
    pub actor_id: Option<String>,
    pub action: String,
    pub target: Option<String>,
    pub created_at: String,
}

/// Append an entry. `actor_id` is `None` for system-initiated actions.
pub async fn record(
    conn: &Connection,
    actor_id: Option<&str>,
    action: &str,
    target: Option<&str>,
) -> Result<()> {
    conn.execute(
        "INSERT INTO activity_log (id, actor_id, action, target, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            new_id(),
            opt_value(actor_id),
            action,
            opt_value(target),
            crate::db::now()
        ],
    )
    .await?;
    Ok(())
}

/// Newest entries first.
pub async fn list(conn: &Connection, limit: u32) -> Result<Vec<Entry>> {
    let mut rows = conn
        .query(
            "SELECT id, actor_id, action, target, created_at FROM activity_log
             ORDER BY rowid DESC LIMIT ?1",
            params![i64::from(limit)],
        )
        .await?;
    let mut entries = Vec::new();
    while let Some(row) = rows.next().await? {
        entries.push(Entry {
            id: row.get::<String>(0)?,
            actor_id: opt_text(&row, 1)?,
            action: row.get::<String>(2)?,
            target: opt_text(&row, 3)?,
            created_at: row.get::<String>(4)?,
        });
    }
    Ok(entries)
}

/// Remove every entry, returning how many were deleted.
pub async fn clear(conn: &Connection) -> Result<u64> {
    let deleted = conn.execute("DELETE FROM activity_log", ()).await?;
    Ok(deleted)
}
