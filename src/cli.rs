use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::app_state::AppState;
use crate::config_loader::{load_config, RegistryConfig};
use crate::did_peer::{derive_did_peer2, resolve_did_peer2, ServiceDescriptor};
use crate::logging::init_tracing;
use crate::registry_loader::load_registry;
use crate::trqp_web::build_router;

/// Top-level CLI interface for the trust registry
#[derive(Parser, Debug)]
#[command(
    name = "trqp_registry",
    version,
    about = "Trust registry answering TRQP recognition and authorization queries"
)]
pub struct Cli {
    /// Defaults to `serve` when omitted
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve the TRQP and admin HTTP API
    Serve(ServeArgs),

    /// Derive a did:peer:2 identifier from a JSON list of service descriptors
    DeriveDid {
        #[arg(short, long)]
        services: PathBuf,
    },

    /// Resolve a did:peer:2 identifier into its DID document
    ResolveDid { did: String },
}

/// Flags override `trqp.toml` and environment settings
#[derive(Args, Debug, Default, Clone)]
pub struct ServeArgs {
    /// Host/IP to bind
    #[arg(long)]
    pub host: Option<String>,
    /// Port to bind
    #[arg(long)]
    pub port: Option<u16>,
    #[arg(long)]
    pub base_url: Option<String>,
    #[arg(long)]
    pub registry_name: Option<String>,
    #[arg(long)]
    pub registry_path: Option<String>,
}

impl ServeArgs {
    pub fn apply(self, config: &mut RegistryConfig) {
        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(base_url) = self.base_url {
            config.base_url = base_url;
        }
        if let Some(registry_name) = self.registry_name {
            config.registry_name = registry_name;
        }
        if let Some(registry_path) = self.registry_path {
            config.registry_path = registry_path;
        }
    }
}

pub fn dispatch(cli: Cli) -> anyhow::Result<()> {
    match cli.command.unwrap_or(Commands::Serve(ServeArgs::default())) {
        Commands::Serve(args) => {
            let rt = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .context("failed to build Tokio runtime")?;
            rt.block_on(serve(args))
        }
        Commands::DeriveDid { services } => {
            let raw = std::fs::read_to_string(&services)
                .with_context(|| format!("reading {}", services.display()))?;
            let descriptors: Vec<ServiceDescriptor> = serde_json::from_str(&raw)
                .with_context(|| format!("parsing service descriptors in {}", services.display()))?;
            println!("{}", derive_did_peer2(&descriptors)?);
            Ok(())
        }
        Commands::ResolveDid { did } => {
            let doc = resolve_did_peer2(&did)?;
            println!("{}", serde_json::to_string_pretty(&doc)?);
            Ok(())
        }
    }
}

pub async fn serve(args: ServeArgs) -> anyhow::Result<()> {
    let mut config = load_config()?;
    args.apply(&mut config);
    config.validate()?;
    init_tracing(&config.log_level)?;

    let snapshot = load_registry(&config)?;
    let addr = config.bind_addr();
    let state = Arc::new(AppState::bootstrap(config, snapshot)?);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("TRQP registry listening on http://{addr}");
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
