//! Plan ownership routes: create, list, rename, delete and share.

use serde::Deserialize;

use crate::access::Session;
use crate::module::Module;
use crate::permission::Action;
use crate::response;
use crate::router::Router;
use crate::store::{plans, users};
use crate::{Error, Result};

const MAX_TITLE: usize = 200;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PlanTitle {
    title: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Share {
    email: String,
}

async fn owner_of(session: &Session, plan_id: &str) -> Result<String> {
    plans::owner_of(&session.conn, plan_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("plan {plan_id}")))
}

pub struct PlansModule;

impl Module for PlansModule {
    fn name(&self) -> &'static str {
        "plans"
    }

    fn routes(&self, router: &mut Router) {
        router.post("/api/plans", |ctx| async move {
            let session = Session::resolve(&ctx).await?;
            let input: PlanTitle = ctx.json()?;
            let title = super::required_text("title", &input.title, MAX_TITLE)?;

            let plan = plans::create(&session.conn, &session.principal.id, &title).await?;
            session.record("plan.create", Some(&plan.id)).await;
            response::created(&plan)
        });

        router.get("/api/plans", |ctx| async move {
            let session = Session::resolve(&ctx).await?;
            response::ok(&plans::list_visible(&session.conn, &session.principal.id).await?)
        });

        router.put("/api/plans/{plan_id}", |ctx| async move {
            let session = Session::resolve(&ctx).await?;
            let plan_id = ctx.require_param("plan_id")?;
            let owner_id = owner_of(&session, plan_id).await?;
            session.checker().require(Action::EditPlan {
                owner_id: &owner_id,
            })?;

            let input: PlanTitle = ctx.json()?;
            let title = super::required_text("title", &input.title, MAX_TITLE)?;
            let plan = plans::rename(&session.conn, plan_id, &title).await?;
            session.record("plan.update", Some(plan_id)).await;
            response::ok(&plan)
        });

        router.delete("/api/plans/{plan_id}", |ctx| async move {
            let session = Session::resolve(&ctx).await?;
            let plan_id = ctx.require_param("plan_id")?;
            let owner_id = owner_of(&session, plan_id).await?;
            session.checker().require(Action::DeletePlan {
                owner_id: &owner_id,
            })?;

            plans::delete(&session.conn, plan_id).await?;
            session.record("plan.delete", Some(plan_id)).await;
            Ok(response::no_content())
        });

        router.post("/api/plans/{plan_id}/shares", |ctx| async move {
            let session = Session::resolve(&ctx).await?;
            let plan_id = ctx.require_param("plan_id")?;
            let owner_id = owner_of(&session, plan_id).await?;
            session.checker().require(Action::SharePlan {
                owner_id: &owner_id,
            })?;

            let input: Share = ctx.json()?;
            let recipient = users::find_by_email(&session.conn, &input.email)
                .await?
                .filter(|user| user.active)
                .ok_or_else(|| Error::NotFound(format!("user {}", input.email.trim())))?;
            if recipient.id == owner_id {
                return Err(Error::BadRequest(
                    "A plan cannot be shared with its owner".to_string(),
                ));
            }

            let newly_shared =
                plans::share(&session.conn, plan_id, &recipient.id, &session.principal.id)
                    .await?;
            if newly_shared {
                session.record("plan.share", Some(plan_id)).await;
            }
            response::ok(&serde_json::json!({
                "plan_id": plan_id,
                "user_id": recipient.id,
                "newly_shared": newly_shared,
            }))
        });
    }
}
