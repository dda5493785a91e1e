use anyhow::Result;

use super::Context;

pub fn run(ctx: &Context, user_id: &str, email: &str) -> Result<()> {
    let token = workmind_auth::create_jwt(user_id, email, &ctx.config.server.jwt_secret)?;
    println!("{token}");
    Ok(())
}
