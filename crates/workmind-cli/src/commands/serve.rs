use anyhow::Result;

use super::Context;

pub async fn run(ctx: &Context) -> Result<()> {
    if ctx.config.server.jwt_secret == workmind_core::config::ServerSettings::default().jwt_secret {
        tracing::warn!("server.jwt_secret is the default value; set your own before exposing the server");
    }
    workmind_web::start_web_server(&ctx.config.server).await
}
