use crate::app::App;
use crate::commands::common::resolve_reminder;
use crate::error::CliError;

pub async fn run_rm(app: &App, id: &str) -> Result<(), CliError> {
    let owner = app.current_owner().await?;
    let reminder = resolve_reminder(app, &owner, id).await?;
    app.service.delete(&reminder.id).await?;
    println!("Deleted '{}'", reminder.title);
    Ok(())
}
