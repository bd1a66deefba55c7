//! ---
//! cat_section: "01-core-functionality"
//! cat_subsection: "binary"
//! cat_type: "source"
//! cat_scope: "code"
//! cat_description: "Binary entrypoint for the Catalogo daemon."
//! cat_version: "v0.0.0-prealpha"
//! cat_owner: "tbd"
//! ---
use std::io::{self, BufRead};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use catalogo_api::{spawn_api_server, ApiState};
use catalogo_common::config::{AppConfig, LoadedAppConfig, StoreBackend};
use catalogo_common::logging::init_tracing;
use catalogo_security::hash_password;
use catalogo_store::open_store;
use clap::{Parser, Subcommand};
use tokio::signal;
use tracing::{debug, info, warn};

const SESSION_PURGE_INTERVAL: Duration = Duration::from_secs(600);

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Catalogo project listing daemon",
    long_about = None
)]
struct Cli {
    #[arg(long, value_name = "FILE", help = "Path to configuration file")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(about = "Serve the API and public assets")]
    Serve,
    #[command(about = "Load and validate configuration, then exit")]
    Validate,
    #[command(about = "Print an Argon2id hash for auth.admin_password_hash")]
    HashPassword {
        #[arg(long, help = "Password to hash; read from stdin when omitted")]
        password: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            let loaded = load_config(cli.config)?;
            init_tracing("catalogod", &loaded.config.logging)?;
            info!(config_path = %loaded.source.display(), "configuration loaded");
            serve(loaded.config).await?
        }
        Commands::Validate => {
            let loaded = load_config(cli.config)?;
            render_summary(&loaded);
        }
        Commands::HashPassword { password } => {
            let password = match password {
                Some(password) => password,
                None => read_password()?,
            };
            if password.is_empty() {
                bail!("password must not be empty");
            }
            println!("{}", hash_password(&password)?);
        }
    }

    Ok(())
}

fn load_config(explicit: Option<PathBuf>) -> Result<LoadedAppConfig> {
    let mut candidates = Vec::new();
    if let Some(path) = explicit {
        candidates.push(path);
    }
    candidates.push(PathBuf::from("configs/catalogo.toml"));
    candidates.push(PathBuf::from("configs/example.dev.toml"));
    AppConfig::load_with_source(&candidates)
}

async fn serve(config: AppConfig) -> Result<()> {
    let store = open_store(&config.store).context("failed to open document store")?;
    if matches!(config.store.backend, StoreBackend::Memory) {
        warn!("memory store selected; projects are lost on restart");
    }
    let state = Arc::new(ApiState::from_config(&config, store)?);

    let static_dir = config.api.static_dir.clone().and_then(|dir| {
        if dir.is_dir() {
            Some(dir)
        } else {
            warn!(
                static_dir = %dir.display(),
                "api static_dir not found; serving API without assets"
            );
            None
        }
    });
    let server = spawn_api_server(state.clone(), config.api.listen, static_dir)?;

    let purger = tokio::spawn({
        let state = state.clone();
        async move {
            let mut ticker = tokio::time::interval(SESSION_PURGE_INTERVAL);
            loop {
                ticker.tick().await;
                let purged = state.sessions().purge_expired();
                if purged > 0 {
                    debug!(purged, "expired sessions purged");
                }
            }
        }
    });

    info!(address = %server.addr(), "catalogod running; waiting for termination signal");
    signal::ctrl_c().await?;
    info!("ctrl-c received; shutting down");
    purger.abort();
    server.shutdown().await?;
    Ok(())
}

fn read_password() -> Result<String> {
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read password from stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_owned())
}

fn render_summary(loaded: &LoadedAppConfig) {
    let config = &loaded.config;
    println!("Config: {}", loaded.source.display());
    println!("Listen: {}", config.api.listen);
    println!(
        "Static: {}",
        config
            .api
            .static_dir
            .as_ref()
            .map(|dir| dir.display().to_string())
            .unwrap_or_else(|| "disabled".to_owned())
    );
    match config.store.backend {
        StoreBackend::Memory => println!("Store: memory"),
        StoreBackend::Firestore => {
            let firestore = &config.store.firestore;
            let auth = if firestore.token.is_some() {
                "token"
            } else if firestore.has_service_account() {
                "service-account"
            } else {
                "anonymous"
            };
            println!(
                "Store: firestore {} ({}/{}) auth={}",
                firestore.base_url, firestore.project_id, firestore.collection, auth
            );
        }
    }
    println!(
        "Session: cookie={} ttl={}s secret={}",
        config.session.cookie_name,
        config.session.ttl.as_secs(),
        if config.session.secret.is_some() {
            "configured"
        } else {
            "ephemeral"
        }
    );
    println!("Metrics: {}", config.metrics.enabled);
}
