use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use bwebd::catalog::Catalog;
use bwebd::core::format;
use bwebd::users::UserStore;
use bwebd::web::WebServer;
use bwebd::{config, context, logging};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;

#[derive(Parser)]
#[command(name = "bwebd")]
#[command(about = "Backup catalog reporting dashboard", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the dashboard web server
    Serve(ServeArgs),
    /// Load the configuration and probe every catalog
    Check,
    /// Create a dashboard user or reset its password
    AddUser { username: String },
}

#[derive(Args, Serialize)]
struct ServeArgs {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[arg(long)]
    listen: Option<SocketAddr>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[arg(long)]
    verbose: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[arg(long)]
    log_json: Option<bool>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.command {
        Commands::Serve(args) => config::AppConfig::new(cli.config.as_deref(), Some(args))?,
        _ => config::AppConfig::new(cli.config.as_deref(), None::<&ServeArgs>)?,
    };

    match &cli.command {
        Commands::Serve(args) => {
            logging::init(logging::LogConfig {
                json: args.log_json.unwrap_or(false),
                verbose: args.verbose.unwrap_or(false),
            });
            run_server(config).await.context("Failed to run server")?
        }
        Commands::Check => run_check(config).await?,
        Commands::AddUser { username } => run_add_user(config, username).await?,
    }

    Ok(())
}

async fn run_server(config: config::AppConfig) -> Result<()> {
    let users = UserStore::open(&config.users_db)
        .await
        .context("Failed to open the user database")?;
    let listen = config.listen;
    let ctx = context::AppContext::new(config, users);

    let server = Arc::new(WebServer::new(ctx, listen));
    let shutdown_handle = server.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown signal received");
            shutdown_handle.shutdown();
        }
    });

    server.start().await
}

/// Print the resolved configuration and try each catalog in turn. Broken
/// catalogs are reported but do not stop the remaining probes.
async fn run_check(config: config::AppConfig) -> Result<()> {
    println!("listen:            {}", config.listen);
    println!("language:          {}", config.language);
    println!("users auth:        {}", config.enable_users_auth);
    println!("users db:          {}", config.users_db.display());
    println!("catalogs:          {}", config.catalogs.len());

    for (id, catalog_config) in config.catalogs.iter().enumerate() {
        match probe_catalog(catalog_config).await {
            Ok((version, usage)) => println!(
                "catalog {id} ({label}): OK, sqlite {version}, {usage} on volumes",
                label = catalog_config.label,
            ),
            Err(e) => println!(
                "catalog {id} ({label}): UNAVAILABLE, {e}",
                label = catalog_config.label,
            ),
        }
    }

    Ok(())
}

async fn probe_catalog(catalog_config: &config::CatalogConfig) -> Result<(String, String)> {
    let catalog = Catalog::connect(catalog_config).await?;
    let version = catalog.server_version().await?;
    let usage = format::human_size(catalog.disk_usage().await? as f64, 2);
    Ok((version, usage))
}

async fn run_add_user(config: config::AppConfig, username: &str) -> Result<()> {
    use std::io::{Write, stdin, stdout};

    let users = UserStore::open(&config.users_db)
        .await
        .context("Failed to open the user database")?;

    print!("Password for {username}: ");
    stdout().flush()?;
    let mut password = String::new();
    stdin()
        .read_line(&mut password)
        .context("Failed to read the password")?;
    let password = password.trim_end_matches(['\r', '\n']);
    anyhow::ensure!(!password.is_empty(), "Password must not be empty");

    users.upsert(username, password).await?;
    println!("User {username} saved");
    Ok(())
}
