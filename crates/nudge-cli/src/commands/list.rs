use crate::app::App;
use crate::commands::common::format_line;
use crate::error::CliError;

pub async fn run_list(app: &App, all: bool, as_json: bool) -> Result<(), CliError> {
    let owner = app.current_owner().await?;
    let reminders = app.service.list(&owner).await?;
    let reminders: Vec<_> = reminders
        .into_iter()
        .filter(|r| all || !r.completed)
        .collect();

    if as_json {
        println!("{}", serde_json::to_string_pretty(&reminders)?);
        return Ok(());
    }

    if reminders.is_empty() {
        println!("No reminders. Add one with `nudge add`.");
        return Ok(());
    }

    for reminder in &reminders {
        println!("{}", format_line(reminder));
    }
    Ok(())
}
