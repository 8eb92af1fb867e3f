//! Per-request identity resolution.
//!
//! Every protected handler starts with [`Session::resolve`], which turns the
//! bearer token into a fresh [`Principal`]. A request without a resolvable
//! principal fails with `Error::Unauthorized` (401) here and never reaches a
//! [`PermissionChecker`]; a resolved principal that fails a check gets
//! `Error::Forbidden` (403) from [`PermissionChecker::require`].

use libsql::Connection;

use crate::permission::{PermissionChecker, Principal, TeamMembership};
use crate::router::Context;
use crate::store::{activity, teams, users};
use crate::{Error, Result};

/// An authenticated request: the caller and a connection to act with.
pub struct Session {
    pub principal: Principal,
    pub conn: Connection,
}

impl Session {
    /// Authenticate the request and load the caller from the user directory.
    ///
    /// Unknown and deactivated users are treated as unauthenticated.
    pub async fn resolve(ctx: &Context) -> Result<Self> {
        let user_id = ctx.require_user_id()?;
        let conn = ctx.connection()?;
        let principal = users::find_active(&conn, &user_id).await?.ok_or_else(|| {
            tracing::debug!(user = %user_id, "token subject is unknown or inactive");
            Error::Unauthorized
        })?;
        Ok(Self { principal, conn })
    }

    /// Checker for system- and plan-level decisions.
    pub fn checker(&self) -> PermissionChecker<'_> {
        PermissionChecker::new(Some(&self.principal), None)
    }

    /// The caller's active membership in `team_id`.
    ///
    /// Fails with `NotFound` if the team does not exist; returns `None` if it
    /// exists but the caller is not a member.
    pub async fn membership(&self, team_id: &str) -> Result<Option<TeamMembership>> {
        if teams::find_team(&self.conn, team_id).await?.is_none() {
            return Err(Error::NotFound(format!("team {team_id}")));
        }
        teams::find_membership(&self.conn, team_id, &self.principal.id).await
    }

    /// Append to the activity log on behalf of the caller.
    ///
    /// Runs after the change it describes has committed, so a failure here
    /// is logged and never turns a completed request into an error.
    pub async fn record(&self, action: &str, target: Option<&str>) {
        if let Err(e) = activity::record(&self.conn, Some(&self.principal.id), action, target).await
        {
            tracing::error!(
                principal = %self.principal.id,
                action,
                error = %e,
                "failed to record activity"
            );
        }
    }
}

/// Checker for team-level decisions about `membership`.
pub fn team_checker<'a>(
    session: &'a Session,
    membership: Option<&'a TeamMembership>,
) -> PermissionChecker<'a> {
    PermissionChecker::new(Some(&session.principal), membership)
}
