use crate::app::{prompt_new_password, prompt_username, AppContext};
use crate::cli::RegisterArgs;

pub async fn handle_register(ctx: &AppContext<'_>, args: &RegisterArgs) -> anyhow::Result<()> {
    let interactive = ctx.interactive();
    let given = args.username.as_deref().or(ctx.cli().user.as_deref());
    let username = prompt_username(given, interactive)?;
    let password = prompt_new_password(interactive)?;

    let queries = ctx.open()?;
    let registered = queries.register_user(&username, &password).await;
    ctx.finish(&queries).await?;
    let user = registered?;

    if ctx.json() {
        crate::output::print_json(&serde_json::json!({
            "user_id": user.get(),
            "username": username,
        }))?;
    } else if !ctx.quiet() {
        println!("Registered {} (id {})", username, user);
    }
    Ok(())
}
