use anyhow::Result;
use clap::Parser;
use cloudinary_gateway::coordinator::UploadCoordinator;
use cloudinary_gateway::models::Config;
use cloudinary_gateway::server::{self, AppState};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "cloudinary-gateway")]
#[command(about = "Upload, list and delete Cloudinary assets over a JSON API")]
struct CliArgs {
    /// Address to listen on; overrides BIND_ADDR.
    #[arg(long, value_name = "ADDR")]
    bind: Option<SocketAddr>,

    /// Keep assets in memory instead of calling Cloudinary.
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cloudinary_gateway=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = CliArgs::parse();

    let mut config = match Config::from_env_with_dry_run(args.dry_run) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }

    info!(
        "Starting cloudinary-gateway (folder: {}, delete order: {:?})",
        config.upload_folder, config.delete_order
    );

    let coordinator = UploadCoordinator::from_config(&config)?;
    let state = Arc::new(AppState {
        coordinator: Arc::new(coordinator),
        upload_folder: config.upload_folder.clone(),
    });

    if let Err(e) = server::serve(state, config.bind_addr).await {
        error!("Server failed: {}", e);
        std::process::exit(1);
    }
    Ok(())
}
