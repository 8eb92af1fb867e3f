//! Teams, memberships and invitations.

use serde::Deserialize;

use crate::access::{Session, team_checker};
use crate::module::Module;
use crate::permission::{Action, PermissionChecker, TeamMembership, TeamRole};
use crate::response;
use crate::router::Router;
use crate::store::teams::{self, Invitation};
use crate::store::users;
use crate::{Error, Result};

const MAX_TEAM_NAME: usize = 120;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TeamName {
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Invite {
    email: String,
    #[serde(default = "member")]
    role: TeamRole,
}

fn member() -> TeamRole {
    TeamRole::Member
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ChangeRole {
    role: TeamRole,
}

/// Membership of `member_id`, or `NotFound`.
async fn target_membership(
    session: &Session,
    team_id: &str,
    member_id: &str,
) -> Result<TeamMembership> {
    teams::find_membership(&session.conn, team_id, member_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("member {member_id} of team {team_id}")))
}

/// Whether the inviter, as they stand in the team now, may still grant the
/// invited role. Pending invitations die with their inviter's rights.
async fn inviter_still_grants(session: &Session, invitation: &Invitation) -> Result<bool> {
    let Some(inviter) = users::find_active(&session.conn, &invitation.invited_by).await? else {
        return Ok(false);
    };
    let membership =
        teams::find_membership(&session.conn, &invitation.team_id, &inviter.id).await?;
    let checker = PermissionChecker::new(Some(&inviter), membership.as_ref());
    Ok(checker.allows(Action::InviteToTeam)
        && checker.allows(Action::AssignTeamRole {
            current: None,
            new: invitation.role,
        }))
}

pub struct TeamsModule;

impl Module for TeamsModule {
    fn name(&self) -> &'static str {
        "teams"
    }

    fn routes(&self, router: &mut Router) {
        router.post("/api/teams", |ctx| async move {
            let session = Session::resolve(&ctx).await?;
            let input: TeamName = ctx.json()?;
            let name = super::required_text("name", &input.name, MAX_TEAM_NAME)?;

            let team = teams::create_team(&session.conn, &name, &session.principal.id).await?;
            session.record("team.create", Some(&team.id)).await;
            response::created(&team)
        });

        router.get("/api/teams/{team_id}/members", |ctx| async move {
            let session = Session::resolve(&ctx).await?;
            let team_id = ctx.require_param("team_id")?;
            let membership = session.membership(team_id).await?;
            team_checker(&session, membership.as_ref()).require(Action::ViewTeam)?;

            response::ok(&teams::list_members(&session.conn, team_id).await?)
        });

        router.post("/api/teams/{team_id}/invitations", |ctx| async move {
            let session = Session::resolve(&ctx).await?;
            let team_id = ctx.require_param("team_id")?;
            let membership = session.membership(team_id).await?;
            let checker = team_checker(&session, membership.as_ref());
            checker.require(Action::InviteToTeam)?;

            let input: Invite = ctx.json()?;
            checker.require(Action::AssignTeamRole {
                current: None,
                new: input.role,
            })?;

            let invitation = teams::create_invitation(
                &session.conn,
                team_id,
                &input.email,
                input.role,
                &session.principal.id,
            )
            .await?;
            session.record("team.invite", Some(&invitation.id)).await;
            response::created(&invitation)
        });

        router.post("/api/invitations/{invitation_id}/accept", |ctx| async move {
            let session = Session::resolve(&ctx).await?;
            let invitation_id = ctx.require_param("invitation_id")?;
            let invitation = teams::find_invitation(&session.conn, invitation_id)
                .await?
                .ok_or_else(|| Error::NotFound(format!("invitation {invitation_id}")))?;

            if invitation.email != session.principal.email {
                tracing::warn!(
                    principal = %session.principal.id,
                    invitation = %invitation.id,
                    "invitation addressed to someone else"
                );
                return Err(Error::Forbidden {
                    resource: "invitation".to_string(),
                    action: "accept".to_string(),
                });
            }

            if !inviter_still_grants(&session, &invitation).await? {
                tracing::warn!(
                    invitation = %invitation.id,
                    inviter = %invitation.invited_by,
                    "inviter can no longer grant the invited role"
                );
                return Err(Error::Forbidden {
                    resource: "invitation".to_string(),
                    action: "accept".to_string(),
                });
            }

            let membership =
                teams::accept_invitation(&session.conn, &invitation, &session.principal.id)
                    .await?;
            session.record("team.join", Some(&membership.team_id)).await;
            response::ok(&membership)
        });

        router.patch("/api/teams/{team_id}/members/{member_id}", |ctx| async move {
            let session = Session::resolve(&ctx).await?;
            let team_id = ctx.require_param("team_id")?;
            let member_id = ctx.require_param("member_id")?;
            let membership = session.membership(team_id).await?;
            let checker = team_checker(&session, membership.as_ref());
            checker.require(Action::ManageTeamRoles)?;

            let input: ChangeRole = ctx.json()?;
            let mut target = target_membership(&session, team_id, member_id).await?;
            checker.require(Action::AssignTeamRole {
                current: Some(target.role),
                new: input.role,
            })?;

            teams::set_member_role(&session.conn, team_id, member_id, input.role).await?;
            session.record("team.role_change", Some(member_id)).await;
            target.role = input.role;
            response::ok(&target)
        });

        router.delete("/api/teams/{team_id}/members/{member_id}", |ctx| async move {
            let session = Session::resolve(&ctx).await?;
            let team_id = ctx.require_param("team_id")?;
            let member_id = ctx.require_param("member_id")?;
            let membership = session.membership(team_id).await?;
            let checker = team_checker(&session, membership.as_ref());

            let leaving = member_id == session.principal.id;
            if leaving {
                checker.require(Action::ViewTeam)?;
            } else {
                checker.require(Action::ManageTeamRoles)?;
            }
            let target = target_membership(&session, team_id, member_id).await?;
            if !leaving {
                checker.require(Action::RemoveTeamMember {
                    target: target.role,
                })?;
            }

            teams::remove_member(&session.conn, team_id, member_id).await?;
            let action = if leaving { "team.leave" } else { "team.remove_member" };
            session.record(action, Some(member_id)).await;
            Ok(response::no_content())
        });

        router.put("/api/teams/{team_id}/settings", |ctx| async move {
            let session = Session::resolve(&ctx).await?;
            let team_id = ctx.require_param("team_id")?;
            let membership = session.membership(team_id).await?;
            team_checker(&session, membership.as_ref()).require(Action::EditTeamSettings)?;

            let input: TeamName = ctx.json()?;
            let name = super::required_text("name", &input.name, MAX_TEAM_NAME)?;
            let team = teams::rename_team(&session.conn, team_id, &name).await?;
            session.record("team.settings", Some(team_id)).await;
            response::ok(&team)
        });

        router.delete("/api/teams/{team_id}", |ctx| async move {
            let session = Session::resolve(&ctx).await?;
            let team_id = ctx.require_param("team_id")?;
            let membership = session.membership(team_id).await?;
            team_checker(&session, membership.as_ref()).require(Action::DeleteTeam)?;

            teams::delete_team(&session.conn, team_id).await?;
            session.record("team.delete", Some(team_id)).await;
            Ok(response::no_content())
        });
    }
}
