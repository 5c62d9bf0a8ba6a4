use vitals_core::{HeartReadings, Queries};

use crate::app::AppContext;
use crate::cli::HeartArgs;
use crate::output::{key_values, print_json, reading};

pub async fn handle_heart(ctx: &AppContext<'_>, args: &HeartArgs) -> anyhow::Result<()> {
    let (queries, _user) = ctx.open_session().await?;
    let result = run(ctx, &queries, args).await;
    ctx.finish(&queries).await?;
    result
}

async fn run(ctx: &AppContext<'_>, queries: &Queries, args: &HeartArgs) -> anyhow::Result<()> {
    let readings = HeartReadings {
        rate: args.rate,
        resting: args.resting,
        recovery: args.recovery,
    };
    if readings != HeartReadings::default() {
        let recorded = queries.record_heart_readings(readings).await?;
        if !ctx.quiet() && !ctx.json() {
            println!("Recorded {} heart reading(s)", recorded);
        }
        return Ok(());
    }

    let rate = queries.current_heart_rate().await?;
    let peak = queries.peak_heart_rate().await?;
    let resting = queries.resting_heart_rate().await?;
    let recovery = queries.recovery_heart_rate().await?;

    if ctx.json() {
        return print_json(&serde_json::json!({
            "rate": rate,
            "peak": peak,
            "resting": resting,
            "recovery": recovery,
        }));
    }
    println!(
        "{}",
        key_values(&[
            ("Heart rate", reading(rate)),
            ("Peak", reading(peak)),
            ("Resting", reading(resting)),
            ("Recovery", reading(recovery)),
        ])
    );
    Ok(())
}
