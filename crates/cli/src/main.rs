//! Miraki CLI - drive the admin console data layer from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Sign in (password read from MIRAKI_PASSWORD when --password is omitted)
//! miraki login -e admin@miraki-art.com
//!
//! # Show the signed-in user and check a permission
//! miraki whoami
//! miraki can manage_orders
//!
//! # Browse and report
//! miraki artworks list --search monsoon --featured
//! miraki orders stats --from 2024-01-01 --to 2024-03-31
//!
//! # Move the first banner to second place
//! miraki banners reorder --from 0 --to 1
//!
//! # Sign out
//! miraki logout
//! ```
//!
//! # Environment Variables
//!
//! - `MIRAKI_API_BASE_URL`, `MIRAKI_STORAGE_PATH` and the other console settings
//! - `MIRAKI_LOG_JSON` - Emit JSON log lines instead of text
//! - `RUST_LOG` - Log filter (default: `miraki_console=info,miraki_cli=info`)

#![cfg_attr(not(test), forbid(unsafe_code))]

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "miraki")]
#[command(author, version, about = "Miraki admin console")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and persist the session
    Login {
        /// Account email address
        #[arg(short, long)]
        email: String,

        /// Account password
        #[arg(short, long, env = "MIRAKI_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Sign out and clear the stored session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Check whether the signed-in user holds a permission
    Can {
        /// Permission name, e.g. `manage_orders`
        permission: String,
    },
    /// Browse artworks
    Artworks {
        #[command(subcommand)]
        action: ArtworkAction,
    },
    /// Order reporting
    Orders {
        #[command(subcommand)]
        action: OrderAction,
    },
    /// Manage storefront banners
    Banners {
        #[command(subcommand)]
        action: BannerAction,
    },
}

#[derive(Subcommand)]
enum ArtworkAction {
    /// List one page of artworks
    List {
        #[arg(long, default_value_t = 1)]
        page: u32,

        #[arg(long, default_value_t = 20)]
        limit: u32,

        /// Free-text search
        #[arg(short, long)]
        search: Option<String>,

        #[arg(short, long)]
        category: Option<String>,

        /// Only featured artworks
        #[arg(long)]
        featured: bool,
    },
}

#[derive(Subcommand)]
enum OrderAction {
    /// Revenue and order counts, optionally for a date range
    Stats {
        /// First day included (YYYY-MM-DD)
        #[arg(long)]
        from: Option<NaiveDate>,

        /// Last day included (YYYY-MM-DD)
        #[arg(long)]
        to: Option<NaiveDate>,
    },
}

#[derive(Subcommand)]
enum BannerAction {
    /// List banners in display order
    List,
    /// Move a banner to a new position and persist the order
    Reorder {
        /// Current zero-based position
        #[arg(long)]
        from: usize,

        /// Target zero-based position
        #[arg(long)]
        to: usize,
    },
}

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

/// Text logs by default; JSON when `MIRAKI_LOG_JSON` is set.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "miraki_console=info,miraki_cli=info".into());

    let json = std::env::var_os("MIRAKI_LOG_JSON").is_some();
    let json_layer = json.then(|| tracing_subscriber::fmt::layer().json().flatten_event(true));
    let text_layer = (!json).then(tracing_subscriber::fmt::layer);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .init();
}

async fn run(cli: Cli) -> Result<(), commands::CliError> {
    let console = commands::open().await?;

    match cli.command {
        Commands::Login { email, password } => {
            commands::session::login(&console, &email, password).await?;
        }
        Commands::Logout => commands::session::logout(&console).await,
        Commands::Whoami => commands::session::whoami(&console).await?,
        Commands::Can { permission } => commands::session::can(&console, &permission).await,
        Commands::Artworks { action } => match action {
            ArtworkAction::List {
                page,
                limit,
                search,
                category,
                featured,
            } => {
                let params = miraki_console::models::ArtworkQuery {
                    page: Some(page),
                    limit: Some(limit),
                    search,
                    category,
                    featured: featured.then_some(true),
                    ..Default::default()
                };
                commands::catalog::list_artworks(&console, &params).await?;
            }
        },
        Commands::Orders { action } => match action {
            OrderAction::Stats { from, to } => {
                let range = miraki_console::models::DateRange {
                    from_date: from,
                    to_date: to,
                };
                commands::orders::stats(&console, range).await?;
            }
        },
        Commands::Banners { action } => match action {
            BannerAction::List => commands::banners::list(&console).await?,
            BannerAction::Reorder { from, to } => {
                commands::banners::reorder(&console, from, to).await?;
            }
        },
    }
    Ok(())
}
