use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use personnel_api::{config::load_settings, open_storage, run, ActionContext};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod console;

use console::ConsoleTerminal;

/// Interactive menu for departments, roles and employees.
#[derive(Parser, Debug)]
#[command(version)]
struct Args {
    /// Overrides the configured database url.
    #[arg(long)]
    database_url: Option<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let settings = load_settings()?.with_override(args.database_url);

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.log_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let database_url = settings.connection_url();
    let storage = open_storage(&database_url).await?;
    info!(%database_url, "connected");
    println!("Connected to the personnel database.");

    let ctx = ActionContext::new(Arc::new(storage.clone()));
    let mut terminal = ConsoleTerminal::new()?;
    let outcome = run(&ctx, &mut terminal).await;

    storage.close().await;
    outcome?;
    Ok(())
}
