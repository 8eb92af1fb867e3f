//! Team directory: teams, memberships and invitations.

use libsql::{Connection, Row, TransactionBehavior, params};
use serde::Serialize;

use super::{flag, new_id, normalize_email, opt_text};
use crate::permission::{TeamMembership, TeamRole};
use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Team {
    pub id: String,
    pub name: String,
    pub created_at: String,
}

/// A membership joined with the member's email, for listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Member {
    pub user_id: String,
    pub email: String,
    pub role: TeamRole,
    pub joined_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Invitation {
    pub id: String,
    pub team_id: String,
    pub email: String,
    pub role: TeamRole,
    pub invited_by: String,
    pub created_at: String,
    pub accepted_at: Option<String>,
}

fn team_from_row(row: &Row) -> Result<Team> {
    Ok(Team {
        id: row.get::<String>(0)?,
        name: row.get::<String>(1)?,
        created_at: row.get::<String>(2)?,
    })
}

fn invitation_from_row(row: &Row) -> Result<Invitation> {
    Ok(Invitation {
        id: row.get::<String>(0)?,
        team_id: row.get::<String>(1)?,
        email: row.get::<String>(2)?,
        role: row.get::<String>(3)?.parse()?,
        invited_by: row.get::<String>(4)?,
        created_at: row.get::<String>(5)?,
        accepted_at: opt_text(row, 6)?,
    })
}

/// Create a team with `owner_id` as its first owner.
pub async fn create_team(conn: &Connection, name: &str, owner_id: &str) -> Result<Team> {
    let team = Team {
        id: new_id(),
        name: name.to_string(),
        created_at: crate::db::now(),
    };

    let tx = conn.transaction().await?;
    tx.execute(
        "INSERT INTO teams (id, name, created_at) VALUES (?1, ?2, ?3)",
        params![team.id.as_str(), team.name.as_str(), team.created_at.as_str()],
    )
    .await?;
    tx.execute(
        "INSERT INTO team_memberships (team_id, user_id, role, active, joined_at) VALUES (?1, ?2, ?3, 1, ?4)",
        params![
            team.id.as_str(),
            owner_id,
            TeamRole::Owner.as_str(),
            team.created_at.as_str()
        ],
    )
    .await?;
    tx.commit().await?;

    tracing::info!(team = %team.id, owner = %owner_id, "team created");
    Ok(team)
}

pub async fn find_team(conn: &Connection, id: &str) -> Result<Option<Team>> {
    let mut rows = conn
        .query(
            "SELECT id, name, created_at FROM teams WHERE id = ?1",
            params![id],
        )
        .await?;
    match rows.next().await? {
        Some(row) => Ok(Some(team_from_row(&row)?)),
        None => Ok(None),
    }
}

pub async fn rename_team(conn: &Connection, id: &str, name: &str) -> Result<Team> {
    let changed = conn
        .execute(
            "UPDATE teams SET name = ?1 WHERE id = ?2",
            params![name, id],
        )
        .await?;
    if changed == 0 {
        return Err(Error::NotFound(format!("team {id}")));
    }
    find_team(conn, id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("team {id}")))
}

/// Delete a team along with its memberships and pending invitations.
pub async fn delete_team(conn: &Connection, id: &str) -> Result<()> {
    let tx = conn.transaction().await?;
    tx.execute("DELETE FROM team_invitations WHERE team_id = ?1", params![id])
        .await?;
    tx.execute("DELETE FROM team_memberships WHERE team_id = ?1", params![id])
        .await?;
    let deleted = tx
        .execute("DELETE FROM teams WHERE id = ?1", params![id])
        .await?;
    if deleted == 0 {
        tx.rollback().await?;
        return Err(Error::NotFound(format!("team {id}")));
    }
    tx.commit().await?;

    tracing::info!(team = %id, "team deleted");
    Ok(())
}

pub async fn count_teams(conn: &Connection) -> Result<u64> {
    let mut rows = conn.query("SELECT count(*) FROM teams", ()).await?;
    match rows.next().await? {
        Some(row) => Ok(u64::try_from(row.get::<i64>(0)?).unwrap_or(0)),
        None => Ok(0),
    }
}

/// Active membership of `user_id` in `team_id`, or `None`.
pub async fn find_membership(
    conn: &Connection,
    team_id: &str,
    user_id: &str,
) -> Result<Option<TeamMembership>> {
    let mut rows = conn
        .query(
            "SELECT team_id, user_id, role, active FROM team_memberships
             WHERE team_id = ?1 AND user_id = ?2 AND active = 1",
            params![team_id, user_id],
        )
        .await?;
    match rows.next().await? {
        Some(row) => Ok(Some(TeamMembership {
            team_id: row.get::<String>(0)?,
            member_id: row.get::<String>(1)?,
            role: row.get::<String>(2)?.parse()?,
            active: flag(&row, 3)?,
        })),
        None => Ok(None),
    }
}

pub async fn list_members(conn: &Connection, team_id: &str) -> Result<Vec<Member>> {
    let mut rows = conn
        .query(
            "SELECT m.user_id, u.email, m.role, m.joined_at
             FROM team_memberships m JOIN users u ON u.id = m.user_id
             WHERE m.team_id = ?1 AND m.active = 1
             ORDER BY u.email",
            params![team_id],
        )
        .await?;
    let mut members = Vec::new();
    while let Some(row) = rows.next().await? {
        members.push(Member {
            user_id: row.get::<String>(0)?,
            email: row.get::<String>(1)?,
            role: row.get::<String>(2)?.parse()?,
            joined_at: row.get::<String>(3)?,
        });
    }
    Ok(members)
}

/// Owners of `team_id` whose accounts are still active.
pub async fn count_owners(conn: &Connection, team_id: &str) -> Result<u64> {
    let mut rows = conn
        .query(
            "SELECT count(*) FROM team_memberships m JOIN users u ON u.id = m.user_id
             WHERE m.team_id = ?1 AND m.role = ?2 AND m.active = 1 AND u.active = 1",
            params![team_id, TeamRole::Owner.as_str()],
        )
        .await?;
    match rows.next().await? {
        Some(row) => Ok(u64::try_from(row.get::<i64>(0)?).unwrap_or(0)),
        None => Ok(0),
    }
}

/// Fail with `Conflict` if taking the owner role away from `user_id` would
/// leave the team without an active owner.
async fn ensure_owner_remains(conn: &Connection, team_id: &str, user_id: &str) -> Result<()> {
    let mut rows = conn
        .query(
            "SELECT m.role, u.active FROM team_memberships m JOIN users u ON u.id = m.user_id
             WHERE m.team_id = ?1 AND m.user_id = ?2 AND m.active = 1",
            params![team_id, user_id],
        )
        .await?;
    let Some(row) = rows.next().await? else {
        return Err(Error::NotFound(format!("member {user_id} of team {team_id}")));
    };
    let role: TeamRole = row.get::<String>(0)?.parse()?;
    if role == TeamRole::Owner && flag(&row, 1)? && count_owners(conn, team_id).await? <= 1 {
        return Err(Error::Conflict(
            "A team must keep at least one active owner".to_string(),
        ));
    }
    Ok(())
}

/// Change the role of an active member. Demoting the last active owner is a
/// `Conflict`.
pub async fn set_member_role(
    conn: &Connection,
    team_id: &str,
    user_id: &str,
    role: TeamRole,
) -> Result<()> {
    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .await?;
    if role != TeamRole::Owner
        && let Err(e) = ensure_owner_remains(&tx, team_id, user_id).await
    {
        tx.rollback().await?;
        return Err(e);
    }
    let changed = tx
        .execute(
            "UPDATE team_memberships SET role = ?1 WHERE team_id = ?2 AND user_id = ?3 AND active = 1",
            params![role.as_str(), team_id, user_id],
        )
        .await?;
    if changed == 0 {
        tx.rollback().await?;
        return Err(Error::NotFound(format!("member {user_id} of team {team_id}")));
    }
    tx.commit().await?;

    tracing::info!(team = %team_id, member = %user_id, role = %role, "team role changed");
    Ok(())
}

/// Remove a member. Removing the last active owner is a `Conflict`.
pub async fn remove_member(conn: &Connection, team_id: &str, user_id: &str) -> Result<()> {
    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .await?;
    if let Err(e) = ensure_owner_remains(&tx, team_id, user_id).await {
        tx.rollback().await?;
        return Err(e);
    }
    tx.execute(
        "DELETE FROM team_memberships WHERE team_id = ?1 AND user_id = ?2",
        params![team_id, user_id],
    )
    .await?;
    tx.commit().await?;

    tracing::info!(team = %team_id, member = %user_id, "team member removed");
    Ok(())
}

pub async fn create_invitation(
    conn: &Connection,
    team_id: &str,
    email: &str,
    role: TeamRole,
    invited_by: &str,
) -> Result<Invitation> {
    let invitation = Invitation {
        id: new_id(),
        team_id: team_id.to_string(),
        email: normalize_email(email)?,
        role,
        invited_by: invited_by.to_string(),
        created_at: crate::db::now(),
        accepted_at: None,
    };
    conn.execute(
        "INSERT INTO team_invitations (id, team_id, email, role, invited_by, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            invitation.id.as_str(),
            invitation.team_id.as_str(),
            invitation.email.as_str(),
            role.as_str(),
            invited_by,
            invitation.created_at.as_str()
        ],
    )
    .await?;

    tracing::info!(team = %team_id, invitation = %invitation.id, role = %role, "invitation created");
    Ok(invitation)
}

pub async fn find_invitation(conn: &Connection, id: &str) -> Result<Option<Invitation>> {
    let mut rows = conn
        .query(
            "SELECT id, team_id, email, role, invited_by, created_at, accepted_at
             FROM team_invitations WHERE id = ?1",
            params![id],
        )
        .await?;
    match rows.next().await? {
        Some(row) => Ok(Some(invitation_from_row(&row)?)),
        None => Ok(None),
    }
}

/// Turn a pending invitation into a membership for `user_id`.
pub async fn accept_invitation(
    conn: &Connection,
    invitation: &Invitation,
    user_id: &str,
) -> Result<TeamMembership> {
    if invitation.accepted_at.is_some() {
        return Err(Error::Conflict("Invitation already accepted".to_string()));
    }
    if find_membership(conn, &invitation.team_id, user_id)
        .await?
        .is_some()
    {
        return Err(Error::Conflict("Already a member of this team".to_string()));
    }

    let now = crate::db::now();
    let tx = conn.transaction().await?;
    tx.execute(
        "INSERT OR REPLACE INTO team_memberships (team_id, user_id, role, active, joined_at)
         VALUES (?1, ?2, ?3, 1, ?4)",
        params![
            invitation.team_id.as_str(),
            user_id,
            invitation.role.as_str(),
            now.as_str()
        ],
    )
    .await?;
    tx.execute(
        "UPDATE team_invitations SET accepted_at = ?1 WHERE id = ?2",
        params![now.as_str(), invitation.id.as_str()],
    )
    .await?;
    tx.commit().await?;

    tracing::info!(team = %invitation.team_id, member = %user_id, "invitation accepted");
    Ok(TeamMembership {
        team_id: invitation.team_id.clone(),
        member_id: user_id.to_string(),
        role: invitation.role,
        active: true,
    })
}
