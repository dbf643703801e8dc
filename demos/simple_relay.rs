//! Simple broadcast relay server
//!
//! Run with: cargo run --example simple_relay [BIND_ADDR]
//!
//! Examples:
//!   cargo run --example simple_relay                    # binds to 0.0.0.0:4433
//!   cargo run --example simple_relay localhost          # binds to 127.0.0.1:4433
//!   cargo run --example simple_relay 127.0.0.1:4500     # binds to 127.0.0.1:4500
//!
//! On first run a self-signed certificate is written next to the binary
//! (`relay-cert.pem` / `relay-key.pem`); point chat clients at the
//! certificate file so they can trust the relay:
//!
//!   cargo run --example chat_client 127.0.0.1:4433 relay-cert.pem

use std::net::SocketAddr;
use std::path::Path;

use relay_rs::{tls, RelayServer, ServerConfig};

const CERT_FILE: &str = "relay-cert.pem";
const KEY_FILE: &str = "relay-key.pem";

/// Parse bind address from command line argument.
///
/// Accepts formats:
/// - "localhost" -> 127.0.0.1:4433
/// - "localhost:4500" -> 127.0.0.1:4500
/// - "127.0.0.1" -> 127.0.0.1:4433
/// - "0.0.0.0:4433" -> 0.0.0.0:4433
fn parse_bind_addr(arg: &str) -> Result<SocketAddr, String> {
    const DEFAULT_PORT: u16 = 4433;

    let normalized = arg.replace("localhost", "127.0.0.1");

    if let Ok(addr) = normalized.parse::<SocketAddr>() {
        return Ok(addr);
    }

    if let Ok(ip) = normalized.parse::<std::net::IpAddr>() {
        return Ok(SocketAddr::new(ip, DEFAULT_PORT));
    }

    Err(format!(
        "Invalid bind address: '{}'. Expected format: IP:PORT or IP or 'localhost'",
        arg
    ))
}

fn print_usage() {
    eprintln!("Usage: simple_relay [BIND_ADDR]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  BIND_ADDR    Address to bind to (default: 0.0.0.0:4433)");
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  simple_relay                     # binds to 0.0.0.0:4433");
    eprintln!("  simple_relay localhost           # binds to 127.0.0.1:4433");
    eprintln!("  simple_relay 127.0.0.1:4500      # binds to 127.0.0.1:4500");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return Ok(());
    }

    let bind_addr = match args.get(1) {
        Some(addr_str) => match parse_bind_addr(addr_str) {
            Ok(addr) => addr,
            Err(e) => {
                eprintln!("Error: {}", e);
                eprintln!();
                print_usage();
                std::process::exit(1);
            }
        },
        None => "0.0.0.0:4433".parse().unwrap(),
    };

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("relay_rs=debug".parse()?)
                .add_directive("simple_relay=debug".parse()?),
        )
        .init();

    // Persist a self-signed identity so clients have a certificate to pin.
    if !Path::new(CERT_FILE).exists() || !Path::new(KEY_FILE).exists() {
        tls::write_self_signed(Path::new(CERT_FILE), Path::new(KEY_FILE))?;
        println!("Wrote self-signed certificate to {} / {}", CERT_FILE, KEY_FILE);
    }

    let config = ServerConfig::with_addr(bind_addr)
        .certificate_files(CERT_FILE.into(), KEY_FILE.into());

    println!("Starting relay on {}", bind_addr);
    println!();
    println!("=== Join the chat ===");
    println!("cargo run --example chat_client {} {}", bind_addr, CERT_FILE);
    println!();

    let server = RelayServer::new(config);

    tokio::select! {
        result = server.run() => {
            if let Err(e) = result {
                eprintln!("Server error: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            println!("\nShutting down...");
        }
    }

    let stats = server.stats().snapshot();
    println!(
        "Stats: sessions={} messages={} delivered={} failed={}",
        stats.sessions_joined,
        stats.messages_received,
        stats.deliveries_attempted - stats.deliveries_failed,
        stats.deliveries_failed,
    );

    Ok(())
}
