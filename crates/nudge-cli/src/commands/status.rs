use crate::app::App;
use crate::error::CliError;

pub async fn run_status(app: &App) -> Result<(), CliError> {
    let owner = app.current_owner().await?;
    let active = app.service.active_count(&owner).await?;
    let completed = app.service.completed_count(&owner).await?;

    if owner.is_guest() {
        println!("Owner: {owner} (guest, local-only)");
    } else {
        println!("Owner: {owner}");
    }
    println!("Active reminders: {active}");
    println!("Completed reminders: {completed}");

    match app.sync_service().await {
        Ok(sync) => {
            let pending = sync.pending_changes(&owner).await?;
            println!("Pending changes: {}", pending.queued);
            if pending.failed > 0 {
                println!("Failed changes: {} (kept locally)", pending.failed);
            }
        }
        Err(CliError::SyncNotConfigured) => {
            if !owner.is_guest() {
                println!("Sync: not configured");
            }
        }
        Err(error) => return Err(error),
    }

    Ok(())
}
