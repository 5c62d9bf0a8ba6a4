use vitals_core::Queries;

use crate::app::AppContext;
use crate::output::{key_values, print_json, reading, text};

pub async fn handle_summary(ctx: &AppContext<'_>) -> anyhow::Result<()> {
    let (queries, _user) = ctx.open_session().await?;
    let result = summarize(ctx, &queries).await;
    ctx.finish(&queries).await?;
    result
}

async fn summarize(ctx: &AppContext<'_>, queries: &Queries) -> anyhow::Result<()> {
    let steps = queries.current_steps().await?;
    let distance = queries.current_distance().await?;
    let minutes = queries.current_time().await?;
    let rate = queries.current_heart_rate().await?;
    let peak = queries.peak_heart_rate().await?;
    let resting = queries.resting_heart_rate().await?;
    let recovery = queries.recovery_heart_rate().await?;
    let goal = queries.goal_calories().await?;
    let consumed = queries.consumed_calories().await?;
    let remaining = queries.remaining_calories().await?;
    let medications = queries.medications().await?;
    let history = queries.medical_history().await?;

    let pending = medications.iter().filter(|m| m.scheduled && !m.taken).count();
    let last_visit = history.first();

    if ctx.json() {
        return print_json(&serde_json::json!({
            "activity": { "steps": steps, "distance": distance, "minutes": minutes },
            "heart": { "rate": rate, "peak": peak, "resting": resting, "recovery": recovery },
            "nutrition": { "goal": goal, "consumed": consumed, "remaining": remaining },
            "medications": { "total": medications.len(), "scheduled_not_taken": pending },
            "last_visit": last_visit,
        }));
    }

    let visit = last_visit
        .map(|r| {
            format!(
                "{} {} ({})",
                r.date,
                text(r.doctor.as_deref()),
                text(r.diagnosis.as_deref())
            )
        })
        .unwrap_or_else(|| text(None));

    println!(
        "{}",
        key_values(&[
            ("Steps", reading(steps)),
            ("Distance", reading(distance)),
            ("Active minutes", reading(minutes)),
            ("Heart rate", reading(rate)),
            ("Peak heart rate", reading(peak)),
            ("Resting heart rate", reading(resting)),
            ("Recovery heart rate", reading(recovery)),
            ("Calorie goal", reading(goal)),
            ("Calories consumed", reading(consumed)),
            ("Calories remaining", reading(remaining)),
            (
                "Medications",
                format!("{} ({} scheduled, not taken)", medications.len(), pending)
            ),
            ("Last visit", visit),
        ])
    );
    Ok(())
}
