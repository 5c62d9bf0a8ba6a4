use chrono::NaiveDate;
use vitals_core::Queries;

use crate::app::AppContext;
use crate::cli::RecordsCommand;
use crate::errors::CliError;
use crate::output::{print_json, table, text};

pub async fn handle_records(
    ctx: &AppContext<'_>,
    command: Option<&RecordsCommand>,
) -> anyhow::Result<()> {
    // Reject a bad date before touching the store.
    let record = match command {
        Some(RecordsCommand::Add {
            date,
            doctor,
            diagnosis,
        }) => Some((parse_date(date)?, doctor.as_str(), diagnosis.as_str())),
        Some(RecordsCommand::List) | None => None,
    };

    let (queries, _user) = ctx.open_session().await?;
    let result = match record {
        Some((date, doctor, diagnosis)) => add(ctx, &queries, date, doctor, diagnosis).await,
        None => list(ctx, &queries).await,
    };
    ctx.finish(&queries).await?;
    result
}

fn parse_date(value: &str) -> anyhow::Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        CliError::invalid_input(format!("Invalid date {:?}; expected YYYY-MM-DD", value)).into()
    })
}

async fn add(
    ctx: &AppContext<'_>,
    queries: &Queries,
    date: NaiveDate,
    doctor: &str,
    diagnosis: &str,
) -> anyhow::Result<()> {
    let id = queries.insert_medical_record(date, doctor, diagnosis).await?;
    if ctx.json() {
        print_json(&serde_json::json!({ "record_id": id }))?;
    } else if !ctx.quiet() {
        println!("Added record {} for {}", id, date);
    }
    Ok(())
}

async fn list(ctx: &AppContext<'_>, queries: &Queries) -> anyhow::Result<()> {
    let history = queries.medical_history().await?;
    if ctx.json() {
        return print_json(&history);
    }
    if history.is_empty() {
        if !ctx.quiet() {
            println!("No medical records yet.");
        }
        return Ok(());
    }

    let rows: Vec<Vec<String>> = history
        .iter()
        .map(|r| {
            vec![
                r.date.to_string(),
                text(r.doctor.as_deref()),
                text(r.diagnosis.as_deref()),
            ]
        })
        .collect();
    println!("{}", table(&["DATE", "DOCTOR", "DIAGNOSIS"], &rows));
    Ok(())
}
