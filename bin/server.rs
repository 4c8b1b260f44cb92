// Voter Lookup - Relay Server
// Messaging proxy + voter update relay

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use voter_lookup::{server, ServerConfig};

#[tokio::main]
async fn main() -> Result<()> {
    let config = ServerConfig::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("🌐 Voter Lookup - Relay Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("   Health: http://{}/api/health", config.bind);
    println!("   Send:   POST /api/whatsapp-send");
    println!("   Update: POST /api/voter/update_mobile");
    println!("\n   Press Ctrl+C to stop\n");

    server::serve(config).await
}
