//! Role and team-membership based access control.
//!
//! Two independent authority axes govern every request:
//!
//! - **System role** ([`SystemRole`]): platform-wide, decides access to the
//!   admin console, user management and the activity log.
//! - **Team role** ([`TeamRole`]): scoped to one team, decides invitations,
//!   role changes, settings and deletion for that team.
//!
//! Plan-scoped decisions use a third input, the plan owner's identifier.
//!
//! The axes never imply each other. A system administrator without a
//! membership has no team rights, and a team owner has no system rights.
//!
//! # Example
//!
//! ```ignore
//! use planroom::permission::{Action, PermissionChecker};
//!
//! let checker = PermissionChecker::new(Some(&principal), membership.as_ref());
//! checker.require(Action::DeleteTeam)?;  // Error::Forbidden when denied
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Platform-wide role of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SystemRole {
    Administrator,
    Regular,
}

impl SystemRole {
    pub const ALL: [SystemRole; 2] = [SystemRole::Administrator, SystemRole::Regular];

    pub fn as_str(self) -> &'static str {
        match self {
            SystemRole::Administrator => "administrator",
            SystemRole::Regular => "regular",
        }
    }
}

/// Role of a member within a single team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TeamRole {
    /// Sole holder of destructive authority over the team.
    Owner,
    Admin,
    Member,
    /// Read-only access to team resources.
    Viewer,
}

impl TeamRole {
    pub const ALL: [TeamRole; 4] = [
        TeamRole::Owner,
        TeamRole::Admin,
        TeamRole::Member,
        TeamRole::Viewer,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TeamRole::Owner => "owner",
            TeamRole::Admin => "admin",
            TeamRole::Member => "member",
            TeamRole::Viewer => "viewer",
        }
    }

    fn manages_team(self) -> bool {
        matches!(self, TeamRole::Owner | TeamRole::Admin)
    }
}

impl fmt::Display for SystemRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for TeamRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SystemRole {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "administrator" => Ok(SystemRole::Administrator),
            "regular" => Ok(SystemRole::Regular),
            other => Err(Error::BadRequest(format!("Unknown system role: {other}"))),
        }
    }
}

impl FromStr for TeamRole {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "owner" => Ok(TeamRole::Owner),
            "admin" => Ok(TeamRole::Admin),
            "member" => Ok(TeamRole::Member),
            "viewer" => Ok(TeamRole::Viewer),
            other => Err(Error::BadRequest(format!("Unknown team role: {other}"))),
        }
    }
}

/// The authenticated actor making a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: String,
    pub email: String,
    pub role: SystemRole,
    pub active: bool,
}

/// A principal's role within one team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMembership {
    pub team_id: String,
    pub member_id: String,
    pub role: TeamRole,
    pub active: bool,
}

/// A checked operation, used to turn a predicate into a `Result`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action<'a> {
    AccessAdmin,
    ManageUsers,
    ViewLogs,
    ViewTeam,
    InviteToTeam,
    ManageTeamRoles,
    AssignTeamRole {
        current: Option<TeamRole>,
        new: TeamRole,
    },
    RemoveTeamMember {
        target: TeamRole,
    },
    EditTeamSettings,
    DeleteTeam,
    EditPlan {
        owner_id: &'a str,
    },
    DeletePlan {
        owner_id: &'a str,
    },
    SharePlan {
        owner_id: &'a str,
    },
}

impl Action<'_> {
    /// Resource and verb reported in a `Forbidden` error.
    fn describe(&self) -> (&'static str, &'static str) {
        match self {
            Action::AccessAdmin => ("admin console", "access"),
            Action::ManageUsers => ("users", "manage"),
            Action::ViewLogs => ("logs", "view"),
            Action::ViewTeam => ("team", "view"),
            Action::InviteToTeam => ("team", "invite to"),
            Action::ManageTeamRoles => ("team roles", "manage"),
            Action::AssignTeamRole { .. } => ("team role", "assign"),
            Action::RemoveTeamMember { .. } => ("team member", "remove"),
            Action::EditTeamSettings => ("team settings", "edit"),
            Action::DeleteTeam => ("team", "delete"),
            Action::EditPlan { .. } => ("plan", "edit"),
            Action::DeletePlan { .. } => ("plan", "delete"),
            Action::SharePlan { .. } => ("plan", "share"),
        }
    }
}

/// Pure authorization predicates over a principal and an optional membership.
#[derive(Debug, Clone, Copy, Default)]
pub struct PermissionChecker<'a> {
    principal: Option<&'a Principal>,
    membership: Option<&'a TeamMembership>,
}

impl<'a> PermissionChecker<'a> {
    /// `membership` is `None` when the principal is not a member of the team
    /// in question.
    pub fn new(principal: Option<&'a Principal>, membership: Option<&'a TeamMembership>) -> Self {
        Self {
            principal,
            membership,
        }
    }

    fn active_principal(&self) -> Option<&'a Principal> {
        self.principal.filter(|p| p.active)
    }

    fn is_active_admin(&self) -> bool {
        self.active_principal()
            .is_some_and(|p| p.role == SystemRole::Administrator)
    }

    /// Team role of the current membership, if it grants anything at all.
    fn team_role(&self) -> Option<TeamRole> {
        let membership = self.membership.filter(|m| m.active)?;
        if let Some(principal) = self.principal
            && (!principal.active || principal.id != membership.member_id)
        {
            return None;
        }
        Some(membership.role)
    }

    pub fn can_access_admin(&self) -> bool {
        self.is_active_admin()
    }

    /// Administrators manage users; there is no finer granularity.
    pub fn can_manage_users(&self) -> bool {
        self.is_active_admin()
    }

    /// Regular users never see logs, not even their own entries.
    pub fn can_view_logs(&self) -> bool {
        self.is_active_admin()
    }

    pub fn can_view_team(&self) -> bool {
        self.team_role().is_some()
    }

    pub fn can_invite_to_team(&self) -> bool {
        self.team_role().is_some_and(TeamRole::manages_team)
    }

    pub fn can_manage_team_roles(&self) -> bool {
        self.team_role().is_some_and(TeamRole::manages_team)
    }

    /// Assign `new` to a member whose role is currently `current` (`None`
    /// for someone not yet in the team, e.g. an invitee).
    ///
    /// Only an owner may grant or revoke the owner role.
    pub fn can_assign_team_role(&self, current: Option<TeamRole>, new: TeamRole) -> bool {
        if !self.can_manage_team_roles() {
            return false;
        }
        let touches_owner = current == Some(TeamRole::Owner) || new == TeamRole::Owner;
        !touches_owner || self.team_role() == Some(TeamRole::Owner)
    }

    /// Remove another member holding `target`. Owners can only be removed by
    /// an owner.
    pub fn can_remove_team_member(&self, target: TeamRole) -> bool {
        self.can_manage_team_roles()
            && (target != TeamRole::Owner || self.team_role() == Some(TeamRole::Owner))
    }

    pub fn can_edit_team_settings(&self) -> bool {
        self.team_role().is_some_and(TeamRole::manages_team)
    }

    pub fn can_delete_team(&self) -> bool {
        self.team_role() == Some(TeamRole::Owner)
    }

    /// Owners edit their own plans; administrators edit any plan.
    pub fn can_edit_plan(&self, owner_id: &str) -> bool {
        self.active_principal()
            .is_some_and(|p| p.id == owner_id || p.role == SystemRole::Administrator)
    }

    pub fn can_delete_plan(&self, owner_id: &str) -> bool {
        self.can_edit_plan(owner_id)
    }

    pub fn can_share_plan(&self, owner_id: &str) -> bool {
        self.can_edit_plan(owner_id)
    }

    /// Evaluate the predicate matching `action`.
    pub fn allows(&self, action: Action<'_>) -> bool {
        match action {
            Action::AccessAdmin => self.can_access_admin(),
            Action::ManageUsers => self.can_manage_users(),
            Action::ViewLogs => self.can_view_logs(),
            Action::ViewTeam => self.can_view_team(),
            Action::InviteToTeam => self.can_invite_to_team(),
            Action::ManageTeamRoles => self.can_manage_team_roles(),
            Action::AssignTeamRole { current, new } => self.can_assign_team_role(current, new),
            Action::RemoveTeamMember { target } => self.can_remove_team_member(target),
            Action::EditTeamSettings => self.can_edit_team_settings(),
            Action::DeleteTeam => self.can_delete_team(),
            Action::EditPlan { owner_id } => self.can_edit_plan(owner_id),
            Action::DeletePlan { owner_id } => self.can_delete_plan(owner_id),
            Action::SharePlan { owner_id } => self.can_share_plan(owner_id),
        }
    }

    /// Like [`allows`](Self::allows), but a denial becomes `Error::Forbidden`.
    pub fn require(&self, action: Action<'_>) -> Result<()> {
        if self.allows(action) {
            return Ok(());
        }
        let (resource, verb) = action.describe();
        tracing::warn!(
            principal = self.principal.map(|p| p.id.as_str()),
            team = self.membership.map(|m| m.team_id.as_str()),
            "permission denied: cannot {verb} {resource}"
        );
        Err(Error::Forbidden {
            resource: resource.to_string(),
            action: verb.to_string(),
        })
    }
}
