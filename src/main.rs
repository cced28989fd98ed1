mod commands;
mod render;
mod utils;

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use staygrid_core::Platform;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "staygrid")]
#[command(about = "Reconcile Airbnb and Booking calendars into one occupancy grid")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the occupancy grid of every property
    Grid {
        /// First day (YYYY-MM-DD), defaults to today
        #[arg(long)]
        start: Option<NaiveDate>,

        /// Number of days to show
        #[arg(long)]
        days: Option<u32>,

        /// Move by whole windows (-1 is the previous page)
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        page: i64,

        /// Do not count the checkout day as occupied
        #[arg(long)]
        exclusive_checkout: bool,
    },
    /// Print every stay, block and cleaning as JSON
    Reservations,
    /// Register a property's calendar feed in the config file
    AddFeed {
        /// ICS export URL (https or webcal)
        url: String,

        /// Property key, defaults to the next free `logement-<n>`
        #[arg(short, long)]
        property: Option<String>,

        /// Platform the feed comes from
        #[arg(long, default_value = "airbnb")]
        platform: Platform,
    },
    /// Set the display name of a property
    Rename { property: String, name: String },
    /// Assign the cleaning vendor of a property
    Assign {
        property: String,
        vendor: String,

        /// Delay after checkout, e.g. "3h" or "1d"
        #[arg(long)]
        offset: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "staygrid=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Grid {
            start,
            days,
            page,
            exclusive_checkout,
        } => commands::grid::run(start, days, page, exclusive_checkout).await,
        Commands::Reservations => commands::reservations::run().await,
        Commands::AddFeed {
            url,
            property,
            platform,
        } => commands::add_feed::run(&url, property.as_deref(), platform).await,
        Commands::Rename { property, name } => commands::rename::run(&property, &name).await,
        Commands::Assign {
            property,
            vendor,
            offset,
        } => commands::assign::run(&property, &vendor, offset.as_deref()).await,
    }
}
