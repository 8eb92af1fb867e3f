//! Admin console: platform overview, user management and the activity log.
//!
//! Every route requires an active administrator.

use serde::Deserialize;

use crate::access::Session;
use crate::module::Module;
use crate::permission::{Action, SystemRole};
use crate::response;
use crate::router::Router;
use crate::store::{activity, plans, teams, users};
use crate::{Error, Result};

const MAX_LOG_LIMIT: u32 = 1000;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CreateUser {
    email: String,
    #[serde(default = "regular")]
    role: SystemRole,
}

fn regular() -> SystemRole {
    SystemRole::Regular
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct UpdateUser {
    role: Option<SystemRole>,
    active: Option<bool>,
}

fn log_limit(raw: Option<&str>, default: u32) -> Result<u32> {
    let limit = match raw {
        Some(raw) => raw
            .parse::<u32>()
            .map_err(|_| Error::BadRequest(format!("Invalid limit: {raw}")))?,
        None => default,
    };
    Ok(limit.clamp(1, MAX_LOG_LIMIT))
}

pub struct AdminModule;

impl Module for AdminModule {
    fn name(&self) -> &'static str {
        "admin"
    }

    fn routes(&self, router: &mut Router) {
        router.get("/api/admin", |ctx| async move {
            let session = Session::resolve(&ctx).await?;
            session.checker().require(Action::AccessAdmin)?;

            let conn = &session.conn;
            response::ok(&serde_json::json!({
                "users": users::count(conn).await?,
                "teams": teams::count_teams(conn).await?,
                "plans": plans::count(conn).await?,
            }))
        });

        router.get("/api/admin/users", |ctx| async move {
            let session = Session::resolve(&ctx).await?;
            session.checker().require(Action::ManageUsers)?;

            response::ok(&users::list(&session.conn).await?)
        });

        router.post("/api/admin/users", |ctx| async move {
            let session = Session::resolve(&ctx).await?;
            session.checker().require(Action::ManageUsers)?;

            let input: CreateUser = ctx.json()?;
            let user = users::create(&session.conn, &input.email, input.role).await?;
            session.record("user.create", Some(&user.id)).await;
            response::created(&user)
        });

        router.patch("/api/admin/users/{user_id}", |ctx| async move {
            let session = Session::resolve(&ctx).await?;
            session.checker().require(Action::ManageUsers)?;

            let user_id = ctx.require_param("user_id")?;
            let input: UpdateUser = ctx.json()?;
            if input.role.is_none() && input.active.is_none() {
                return Err(Error::BadRequest("Nothing to update".to_string()));
            }
            let demotes_self = user_id == session.principal.id
                && (input.role == Some(SystemRole::Regular) || input.active == Some(false));
            if demotes_self {
                return Err(Error::Conflict(
                    "Administrators cannot demote or deactivate themselves".to_string(),
                ));
            }

            let user = users::update(&session.conn, user_id, input.role, input.active).await?;
            session.record("user.update", Some(user_id)).await;
            response::ok(&user)
        });

        router.get("/api/admin/logs", |ctx| async move {
            let session = Session::resolve(&ctx).await?;
            session.checker().require(Action::ViewLogs)?;

            let limit = log_limit(ctx.query("limit"), ctx.config.activity.default_limit)?;
            response::ok(&activity::list(&session.conn, limit).await?)
        });

        router.delete("/api/admin/logs", |ctx| async move {
            let session = Session::resolve(&ctx).await?;
            session.checker().require(Action::ViewLogs)?;

            let deleted = activity::clear(&session.conn).await?;
            session.record("logs.clear", None).await;
            response::ok(&serde_json::json!({ "deleted": deleted }))
        });
    }
}
