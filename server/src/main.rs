use clap::Parser;
use log::{error, info};
use pong_server::config::{NameStyle, ServerConfig};
use pong_server::network::Server;
use std::time::Duration;

// Command line arguments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server IP address to bind to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,
    /// Server port to listen on
    #[arg(short, long, default_value = "8080")]
    port: u16,
    /// Milliseconds between simulation ticks of each match
    #[arg(short, long, default_value = "16")]
    tick_ms: u64,
    /// How display names are assigned to new players
    #[arg(long, value_enum, default_value_t = NameStyle::Random)]
    names: NameStyle,
}

/// Main-method of the application.
/// Parses command-line arguments, binds the listener and serves until Ctrl+C.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    let config = ServerConfig::new(&args.host, args.port)
        .with_tick_interval(Duration::from_millis(args.tick_ms.max(1)))
        .with_names(args.names);

    info!(
        "Starting server on {} (tick {:?}, names {:?})",
        config.bind_addr, config.tick_interval, config.names
    );

    let server = Server::bind(&config).await?;

    tokio::select! {
        result = server.run() => {
            if let Err(e) = result {
                error!("Server stopped: {}", e);
                return Err(e.into());
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down gracefully...");
        }
    }

    Ok(())
}
