use crate::app::App;
use crate::error::CliError;

pub async fn run_sync(app: &App) -> Result<(), CliError> {
    let owner = app.current_owner().await?;
    if owner.is_guest() {
        println!("Guest data stays on this device. Run `nudge signin` to sync.");
        return Ok(());
    }

    let sync = app.sync_service().await?;
    let report = sync.full_sync(&owner).await?;

    // Remote changes may have added or removed records; bring trigger
    // registrations back in line with the store.
    app.service.restore(&owner).await?;

    println!(
        "Sync completed: pushed {}, pulled {}, removed {}",
        report.push.pushed, report.pull.applied, report.pull.removed
    );
    if report.push.deferred > 0 || report.push.failed > 0 {
        println!(
            "{} change(s) still queued, {} failed permanently",
            report.push.deferred, report.push.failed
        );
    }
    Ok(())
}
