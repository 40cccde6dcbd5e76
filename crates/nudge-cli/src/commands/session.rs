use nudge_core::OwnerId;

use crate::app::App;
use crate::error::CliError;

pub async fn run_signin(app: &App, owner: &str, token: &str) -> Result<(), CliError> {
    let account = OwnerId::new(owner.trim());
    if account.is_guest() || account.as_str().is_empty() {
        return Err(CliError::Core(nudge_core::Error::InvalidInput(
            "owner must be an authenticated account id".to_string(),
        )));
    }

    let previous = app.current_owner().await?;
    app.store_session(&account, token.trim()).await?;

    match app.sync_service().await {
        Ok(sync) => {
            let report = sync.on_sign_in(&previous, &account).await?;
            app.service.restore(&account).await?;
            println!(
                "Signed in as {account}: pushed {}, pulled {}",
                report.push.pushed, report.pull.applied
            );
        }
        Err(CliError::SyncNotConfigured) => {
            // Migrate locally anyway; the records push on the first
            // configured sync.
            if previous.is_guest() {
                let migrated = app.migrate_guest(&previous, &account).await?;
                println!(
                    "Signed in as {account} (sync not configured; {migrated} reminder(s) queued locally)"
                );
            } else {
                println!("Signed in as {account} (sync not configured)");
            }
        }
        Err(error) => return Err(error),
    }

    Ok(())
}

pub async fn run_signout(app: &App) -> Result<(), CliError> {
    let guest = app.clear_session().await?;
    println!("Signed out. Continuing as {guest}.");
    Ok(())
}
