//! Command-line entry point: serves the wire protocol and logs requests.

use clap::Parser;
use kafka_wire::config::ServerConfig;
use kafka_wire::Server;

#[derive(Parser)]
#[command(name = "kafka-wire")]
#[command(about = "Length-prefixed wire protocol server")]
struct Cli {
    /// Optional JSON configuration file
    #[arg(long)]
    config: Option<String>,

    /// Address to listen on (overrides the configuration file)
    #[arg(long)]
    listen: Option<String>,

    /// Maximum message size in bytes, 0 for the default
    #[arg(long)]
    max_message_size: Option<usize>,

    /// Buffered reader capacity in bytes, 0 for the default
    #[arg(long)]
    read_buffer_size: Option<usize>,

    /// Log level or tracing filter directive
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn init_logging(level: &str) {
    tracing_subscriber::fmt().with_env_filter(level).init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    init_logging(&cli.log_level);

    let mut config = match &cli.config {
        Some(path) => ServerConfig::from_json_file(path)?,
        None => ServerConfig::default(),
    };
    if let Some(listen) = cli.listen {
        config.listen_address = listen;
    }
    if let Some(size) = cli.max_message_size {
        config.reader.max_message_size = size;
    }
    if let Some(size) = cli.read_buffer_size {
        config.reader.read_buffer_size = size;
    }

    let server = Server::builder().config(config).build()?;
    let listener = tokio::net::TcpListener::bind(server.listen_address()).await?;

    server
        .serve_with_shutdown(listener, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("failed to listen for shutdown signal: {}", e);
            }
        })
        .await?;

    Ok(())
}
