//! queuehubd - the QueueHub ticketing server binary

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use queuehub_ticket_engine::prelude::*;

#[derive(Parser, Debug)]
#[command(name = "queuehubd", about = "QueueHub queue-ticketing server", version)]
struct Args {
    /// SQLite database file; omit to run in memory
    #[arg(long)]
    database: Option<String>,

    /// Address for the REST API
    #[arg(long, default_value = "127.0.0.1:8080")]
    bind: std::net::SocketAddr,

    /// Fixed UTC offset of the service clock, in minutes
    #[arg(long, default_value_t = 0)]
    timezone_offset_minutes: i32,

    /// Seed a demo organization, branch, services and staff
    #[arg(long)]
    demo: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,queuehub_ticket_engine=debug")),
        )
        .init();

    let args = Args::parse();

    let mut config = TicketingConfig::default();
    config.general.database_path = args.database;
    config.general.timezone_offset_minutes = args.timezone_offset_minutes;
    config.api.bind_addr = args.bind;

    let mut server = TicketingServerBuilder::new().with_config(config).build().await?;

    if args.demo {
        let demo = server.create_demo_directory()?;
        info!(
            "🏗️ Demo branch {} ready with {} services",
            demo.branch_id,
            demo.service_ids.len()
        );
    }

    server.start().await?;
    server.run().await?;
    Ok(())
}
