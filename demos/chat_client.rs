//! Chat client for the broadcast relay
//!
//! Run with: cargo run --example chat_client SERVER_ADDR CERT_FILE
//!
//! Every line typed on stdin is sent to the relay; every broadcast from
//! other clients is printed.

use std::net::SocketAddr;

use tokio::io::{AsyncBufReadExt, BufReader};

use relay_rs::client::{ClientConfig, RelayClient};

fn print_usage() {
    eprintln!("Usage: chat_client SERVER_ADDR CERT_FILE");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  SERVER_ADDR  Relay address, e.g. 127.0.0.1:4433");
    eprintln!("  CERT_FILE    PEM certificate of the relay (e.g. relay-cert.pem)");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();

    if args.len() != 3 || args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        std::process::exit(1);
    }

    let server_addr: SocketAddr = args[1].parse()?;

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = ClientConfig::new(server_addr, args[2].clone().into());
    let (client, mut incoming) = RelayClient::connect(config).await?;
    println!("Connected to {}. Type to chat.", server_addr);

    tokio::spawn(async move {
        while let Some(message) = incoming.recv().await {
            match std::str::from_utf8(&message) {
                Ok(text) => println!("< {}", text),
                Err(_) => println!("< {} bytes (binary)", message.len()),
            }
        }
        println!("Relay closed the session.");
        std::process::exit(0);
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.is_empty() {
            continue;
        }
        client.send(line.as_bytes()).await?;
    }

    client.close().await;
    Ok(())
}
