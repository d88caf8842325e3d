//! dev-server
//!
//! ```text
//!   dev-server develop                  dev-server serve
//!         │                                    │
//!         ▼                                    ▼
//!   ┌────────────┐   resolve → serve →   ┌────────────┐
//!   │ DevServer  │───  intercept over    │ ProdServer │── output dir
//!   └────────────┘   resource plugins    └────────────┘   + proxy table
//!         │                                    │
//!         └──────────── Shutdown ◀── SIGINT / SIGTERM
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tokio::net::TcpListener;

use dev_server::config::{self, ServerConfig};
use dev_server::lifecycle::{signals, Shutdown};
use dev_server::observability::{logging, metrics};
use dev_server::{Compilation, DevServer, ProdServer};

#[derive(Parser)]
#[command(name = "dev-server")]
#[command(about = "Development and production server for a static site workspace", long_about = None)]
struct Cli {
    /// Configuration file; defaults apply when it does not exist.
    #[arg(short, long, default_value = "devserver.toml")]
    config: PathBuf,

    /// Project directory the workspace and output paths are relative to.
    #[arg(short, long, default_value = ".")]
    project: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the workspace through the resource pipeline
    Develop,
    /// Serve the build output directory
    Serve,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = if cli.config.exists() {
        config::load_config(&cli.config)?
    } else {
        ServerConfig::default()
    };

    logging::init(&config.observability.log_level);
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %cli.config.display(),
        mode = ?config.mode,
        "dev-server starting"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let compilation = Compilation::new(&config, &cli.project)?;
    tracing::info!(
        workspace = %compilation.workspace_directory.display(),
        output = %compilation.output_directory.display(),
        proxies = config.dev_server.proxy.len(),
        "Compilation ready"
    );

    let shutdown = Shutdown::new();
    let signalled = shutdown.signalled();
    tokio::spawn(async move {
        signals::shutdown_signal().await;
        shutdown.trigger();
    });

    match cli.command {
        Commands::Develop => {
            let listener = TcpListener::bind(&config.dev_server.bind_address).await?;
            DevServer::new(&config, compilation)
                .run(listener, signalled)
                .await?;
        }
        Commands::Serve => {
            let listener = TcpListener::bind(&config.prod_server.bind_address).await?;
            ProdServer::new(&config, compilation)
                .run(listener, signalled)
                .await?;
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
