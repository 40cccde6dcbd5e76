use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use nudge_core::models::{Category, Priority, TriggerEdge};

#[derive(Parser)]
#[command(name = "nudge")]
#[command(about = "Time and location reminders that keep working offline")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Optional path to local database file
    #[arg(long, value_name = "PATH")]
    pub db_path: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new reminder
    #[command(alias = "new")]
    Add {
        /// Reminder title
        title: Vec<String>,
        /// Optional notes
        #[arg(long)]
        notes: Option<String>,
        /// Priority
        #[arg(long, value_enum, default_value_t = PriorityArg::Medium)]
        priority: PriorityArg,
        /// Category
        #[arg(long, value_enum, default_value_t = CategoryArg::Personal)]
        category: CategoryArg,
        /// Fire at this local date/time (e.g. "2026-03-01 09:30")
        #[arg(long, value_name = "WHEN", conflicts_with_all = ["lat", "lng"])]
        at: Option<String>,
        /// Latitude of a location trigger
        #[arg(long, requires = "lng")]
        lat: Option<f64>,
        /// Longitude of a location trigger
        #[arg(long, requires = "lat")]
        lng: Option<f64>,
        /// Geofence radius in meters
        #[arg(long, default_value_t = 200.0)]
        radius: f64,
        /// Boundary crossing that fires the trigger
        #[arg(long, value_enum, default_value_t = EdgeArg::Enter)]
        edge: EdgeArg,
        /// Keep the geofence armed after it fires
        #[arg(long)]
        every_time: bool,
    },
    /// List reminders
    List {
        /// Include completed reminders
        #[arg(short, long)]
        all: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Toggle completion of a reminder
    #[command(alias = "complete")]
    Done {
        /// Reminder ID or unique ID prefix
        id: String,
    },
    /// Delete a reminder
    #[command(alias = "delete")]
    Rm {
        /// Reminder ID or unique ID prefix
        id: String,
    },
    /// Push pending changes and pull remote updates
    Sync,
    /// Show owner, counts, and pending changes
    Status,
    /// Store an authenticated session and migrate guest data
    Signin {
        /// Authenticated owner id
        owner: String,
        /// Access token for the remote store
        #[arg(long, value_name = "TOKEN")]
        token: String,
    },
    /// Drop the session and return to a fresh guest owner
    Signout,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum PriorityArg {
    Low,
    Medium,
    High,
}

impl From<PriorityArg> for Priority {
    fn from(value: PriorityArg) -> Self {
        match value {
            PriorityArg::Low => Self::Low,
            PriorityArg::Medium => Self::Medium,
            PriorityArg::High => Self::High,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum CategoryArg {
    Personal,
    Work,
    Health,
    Shopping,
    Finance,
    Travel,
    Education,
    Other,
}

impl From<CategoryArg> for Category {
    fn from(value: CategoryArg) -> Self {
        match value {
            CategoryArg::Personal => Self::Personal,
            CategoryArg::Work => Self::Work,
            CategoryArg::Health => Self::Health,
            CategoryArg::Shopping => Self::Shopping,
            CategoryArg::Finance => Self::Finance,
            CategoryArg::Travel => Self::Travel,
            CategoryArg::Education => Self::Education,
            CategoryArg::Other => Self::Other,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum EdgeArg {
    Enter,
    Exit,
    Both,
}

impl From<EdgeArg> for TriggerEdge {
    fn from(value: EdgeArg) -> Self {
        match value {
            EdgeArg::Enter => Self::Enter,
            EdgeArg::Exit => Self::Exit,
            EdgeArg::Both => Self::Both,
        }
    }
}
