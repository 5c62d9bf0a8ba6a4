use vitals_core::Queries;

use crate::app::AppContext;
use crate::cli::NutritionArgs;
use crate::output::{key_values, print_json, reading};

pub async fn handle_nutrition(ctx: &AppContext<'_>, args: &NutritionArgs) -> anyhow::Result<()> {
    let (queries, _user) = ctx.open_session().await?;
    let result = run(ctx, &queries, args).await;
    ctx.finish(&queries).await?;
    result
}

async fn run(ctx: &AppContext<'_>, queries: &Queries, args: &NutritionArgs) -> anyhow::Result<()> {
    if let Some(goal) = args.goal {
        queries.insert_goal_calories(goal).await?;
    }
    if let Some(consumed) = args.consumed {
        queries.insert_consumed_calories(consumed).await?;
    }

    let goal = queries.goal_calories().await?;
    let consumed = queries.consumed_calories().await?;
    let remaining = queries.remaining_calories().await?;

    if ctx.json() {
        return print_json(&serde_json::json!({
            "goal": goal,
            "consumed": consumed,
            "remaining": remaining,
        }));
    }
    if ctx.quiet() {
        println!("{}", reading(remaining));
        return Ok(());
    }
    println!(
        "{}",
        key_values(&[
            ("Goal", reading(goal)),
            ("Consumed", reading(consumed)),
            ("Remaining", reading(remaining)),
        ])
    );
    Ok(())
}
