use std::error::Error;
use std::process::exit;

use clap::Parser;
use time::OffsetDateTime;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use expense_tracker_server::auth::get_user_by_username;
use expense_tracker_server::constants::DEFAULT_DATA_PATH;
use expense_tracker_server::{AppState, database, seed};

/// Fills an empty expense tracker database with demo categories and
/// transactions for one existing user.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Name of the user who will own the demo transactions.
    #[arg(long, short)]
    username: String,

    /// Directory holding the database. Defaults to DATABASE_PATH or `data`.
    #[arg(long, short)]
    data_path: Option<String>,

    /// Seed for the amount and date generator. Defaults to the current time.
    #[arg(long, short)]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let data_path = args
        .data_path
        .or_else(|| std::env::var("DATABASE_PATH").ok())
        .unwrap_or_else(|| DEFAULT_DATA_PATH.to_string());
    let db = database::init_db(&data_path).await?;

    let Some(user) = get_user_by_username(&db, &args.username).await? else {
        eprintln!("No active user named '{}'", args.username);
        exit(1);
    };

    let now = OffsetDateTime::now_utc();
    let seed = args.seed.unwrap_or(now.unix_timestamp_nanos() as u64);

    let app_state = AppState::new(db);
    match seed::seed_demo_data(&app_state.service, &user.id, now.date(), seed).await? {
        Some(summary) => println!(
            "Created {} categories and {} transactions for {}",
            summary.categories, summary.transactions, user.username
        ),
        None => println!("Database already has categories, nothing to do"),
    }

    Ok(())
}
