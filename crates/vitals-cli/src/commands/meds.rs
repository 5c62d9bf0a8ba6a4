use vitals_core::Queries;

use crate::app::AppContext;
use crate::cli::MedsCommand;
use crate::output::{print_json, table, text};

pub async fn handle_meds(ctx: &AppContext<'_>, command: Option<&MedsCommand>) -> anyhow::Result<()> {
    let (queries, _user) = ctx.open_session().await?;
    let result = run(ctx, &queries, command).await;
    ctx.finish(&queries).await?;
    result
}

async fn run(
    ctx: &AppContext<'_>,
    queries: &Queries,
    command: Option<&MedsCommand>,
) -> anyhow::Result<()> {
    match command {
        None | Some(MedsCommand::List) => list(ctx, queries).await,
        Some(MedsCommand::Add {
            name,
            description,
            scheduled,
        }) => {
            let id = queries
                .insert_medication(name, description.as_deref(), *scheduled)
                .await?;
            if ctx.json() {
                print_json(&serde_json::json!({ "med_id": id }))?;
            } else if !ctx.quiet() {
                println!("Added medication {} ({})", id, name);
            }
            Ok(())
        }
        Some(MedsCommand::Take { id }) => {
            queries.mark_medication_taken(*id).await?;
            if !ctx.quiet() && !ctx.json() {
                println!("Marked medication {} as taken", id);
            }
            Ok(())
        }
    }
}

async fn list(ctx: &AppContext<'_>, queries: &Queries) -> anyhow::Result<()> {
    let medications = queries.medications().await?;
    if ctx.json() {
        return print_json(&medications);
    }
    if medications.is_empty() {
        if !ctx.quiet() {
            println!("No medications yet. Add one with: vitals meds add <NAME>");
        }
        return Ok(());
    }

    let rows: Vec<Vec<String>> = medications
        .iter()
        .map(|m| {
            vec![
                m.id.to_string(),
                m.name.clone(),
                text(m.description.as_deref()),
                yes_no(m.scheduled).to_string(),
                yes_no(m.taken).to_string(),
            ]
        })
        .collect();
    println!(
        "{}",
        table(&["ID", "NAME", "DESCRIPTION", "SCHEDULED", "TAKEN"], &rows)
    );
    Ok(())
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}
