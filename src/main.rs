use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use atbooking::cli::{Cli, Command};
use atbooking::config::Config;
use atbooking::{build_app, cli, db};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn")),
        )
        .init();

    let args = Cli::parse();
    let config = Config::load();
    let pool = db::init_pool(&config.database_url)
        .await
        .context("failed to open database")?;

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            let app = build_app(pool, &config)
                .await
                .context("failed to set up session store")?;

            let listener = TcpListener::bind(config.bind_addr)
                .await
                .with_context(|| format!("failed to bind {}", config.bind_addr))?;

            tracing::info!("listening on {}", config.bind_addr);
            axum::serve(listener, app).await?;
        }
        Command::CreateUser(args) => cli::create_user(&pool, args).await?,
    }

    Ok(())
}
