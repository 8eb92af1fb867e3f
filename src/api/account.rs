//! Health check and the caller's own account.

use crate::access::Session;
use crate::module::Module;
use crate::response;
use crate::router::Router;

pub struct AccountModule;

impl Module for AccountModule {
    fn name(&self) -> &'static str {
        "account"
    }

    fn routes(&self, router: &mut Router) {
        router.get("/health", |_ctx| async move {
            response::ok(&serde_json::json!({ "status": "ok" }))
        });

        router.get("/api/me", |ctx| async move {
            let session = Session::resolve(&ctx).await?;
            response::ok(&session.principal)
        });
    }
}
