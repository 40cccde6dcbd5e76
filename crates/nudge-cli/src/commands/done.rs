use crate::app::App;
use crate::commands::common::{format_line, resolve_reminder};
use crate::error::CliError;

pub async fn run_done(app: &App, id: &str) -> Result<(), CliError> {
    let owner = app.current_owner().await?;
    let reminder = resolve_reminder(app, &owner, id).await?;
    let toggled = app.service.toggle_complete(&reminder.id).await?;
    println!("{}", format_line(&toggled));
    Ok(())
}
