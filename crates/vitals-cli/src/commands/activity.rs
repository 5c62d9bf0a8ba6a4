use vitals_core::{NewActivity, Queries};

use crate::app::AppContext;
use crate::cli::ActivityArgs;
use crate::output::{key_values, print_json, reading};

pub async fn handle_activity(ctx: &AppContext<'_>, args: &ActivityArgs) -> anyhow::Result<()> {
    let (queries, _user) = ctx.open_session().await?;
    let result = if args.is_empty() {
        show(ctx, &queries).await
    } else {
        record(ctx, &queries, args).await
    };
    ctx.finish(&queries).await?;
    result
}

async fn record(ctx: &AppContext<'_>, queries: &Queries, args: &ActivityArgs) -> anyhow::Result<()> {
    let id = queries
        .record_activity(NewActivity {
            steps: args.steps,
            distance: args.distance,
            time: args.minutes,
            activity: args.label.clone(),
            log: args.log.clone(),
        })
        .await?;
    if ctx.json() {
        print_json(&serde_json::json!({ "activity_id": id }))?;
    } else if !ctx.quiet() {
        println!("Recorded activity {}", id);
    }
    Ok(())
}

async fn show(ctx: &AppContext<'_>, queries: &Queries) -> anyhow::Result<()> {
    let steps = queries.current_steps().await?;
    let distance = queries.current_distance().await?;
    let minutes = queries.current_time().await?;
    let labels = queries.activity_labels().await?;
    let log = queries.activity_log().await?;

    if ctx.json() {
        return print_json(&serde_json::json!({
            "steps": steps,
            "distance": distance,
            "minutes": minutes,
            "activities": labels,
            "log": log,
        }));
    }

    println!(
        "{}",
        key_values(&[
            ("Steps", reading(steps)),
            ("Distance", reading(distance)),
            ("Active minutes", reading(minutes)),
            ("Activities", labels.join(", ")),
        ])
    );
    if !log.is_empty() && !ctx.quiet() {
        println!();
        for entry in &log {
            println!("- {}", entry);
        }
    }
    Ok(())
}
