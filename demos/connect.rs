//! Negotiates with a WebChannel bridge and fetches one symbol table.
//!
//! Usage: `cargo run --example connect -- [--debug] [debugName breakpadId]`

// ============================================================================
// Imports
// ============================================================================

use firefox_profiler_connection::{
    BridgeOptions, ConnectionOutcome, PendingServer, ProfileData, Result, establish_with_bridge,
};
use tracing_subscriber::EnvFilter;

// ============================================================================
// Functions
// ============================================================================

/// Initialize tracing/logging.
fn init_logging(debug: bool) {
    let filter = if debug {
        "firefox_profiler_connection=debug"
    } else {
        "firefox_profiler_connection=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    init_logging(args.iter().any(|a| a == "--debug"));

    let positional: Vec<&String> = args.iter().filter(|a| !a.starts_with("--")).collect();
    let (debug_name, breakpad_id) = match positional.as_slice() {
        [name, id, ..] => (name.as_str(), id.as_str()),
        _ => ("libxul.so", "ABCD1234"),
    };

    let server = PendingServer::bind(BridgeOptions::new().with_port(9120)).await?;
    println!("Waiting for bridge at {}", server.ws_url());

    let connection = match establish_with_bridge(server).await? {
        ConnectionOutcome::Established(connection) => connection,
        ConnectionOutcome::Denied { error } => {
            println!("{error}");
            return Ok(());
        }
        ConnectionOutcome::TimedOut => {
            println!("This Firefox does not support the profiler WebChannel.");
            return Ok(());
        }
        other => {
            println!("No connection: {}", other.status());
            return Ok(());
        }
    };

    if !connection.supports_direct_retrieval() {
        println!("Host is too old to serve profiles over the WebChannel.");
        return Ok(());
    }

    match connection.get_profile().await? {
        ProfileData::Bytes(bytes) => println!("Profile: {} bytes", bytes.len()),
        ProfileData::Object(_) => println!("Profile: JSON object"),
    }

    let table = connection.get_symbol_table(debug_name, breakpad_id).await?;
    println!("{debug_name} {breakpad_id}: {} symbols", table.len());

    Ok(())
}
