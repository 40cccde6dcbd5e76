use nudge_core::models::{Recurrence, Trigger};
use nudge_core::service::NewReminder;

use crate::app::App;
use crate::cli::{CategoryArg, EdgeArg, PriorityArg};
use crate::commands::common::{format_line, parse_when};
use crate::error::CliError;

#[allow(clippy::too_many_arguments)]
pub async fn run_add(
    app: &App,
    title: Vec<String>,
    notes: Option<String>,
    priority: PriorityArg,
    category: CategoryArg,
    at: Option<String>,
    lat: Option<f64>,
    lng: Option<f64>,
    radius: f64,
    edge: EdgeArg,
    every_time: bool,
) -> Result<(), CliError> {
    let title = title.join(" ");
    if title.trim().is_empty() {
        return Err(CliError::EmptyTitle);
    }

    let trigger = match (at, lat, lng) {
        (Some(when), None, None) => Trigger::Time {
            fire_at: parse_when(&when)?,
            recurrence: Recurrence::none(),
        },
        (None, Some(latitude), Some(longitude)) => Trigger::Location {
            latitude,
            longitude,
            radius_m: radius,
            edge: edge.into(),
            every_time,
        },
        _ => return Err(CliError::MissingTrigger),
    };

    let owner = app.current_owner().await?;
    let reminder = app
        .service
        .create(NewReminder {
            owner,
            title,
            notes,
            priority: priority.into(),
            category: category.into(),
            trigger,
        })
        .await?;

    println!("{}", format_line(&reminder));
    Ok(())
}
