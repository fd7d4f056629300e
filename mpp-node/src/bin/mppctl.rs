//! mppctl - operator console for an MPP fleet
//!
//! # Usage
//!
//! ```bash
//! # Ask a component for its registers and print the reply
//! mppctl send 4010 '{"read": true}' --wait-ms 200
//!
//! # Watch every belief committed across the fleet
//! mppctl listen 4000 --beliefs-only
//! ```

use anyhow::{anyhow, bail};
use clap::{Parser, Subcommand};
use mpp::{Channel, MppConfig, Outbound, Transport};
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;
use tokio::time::timeout;

#[derive(Parser)]
#[command(name = "mppctl")]
#[command(about = "Send envelopes to MPP components and watch shared ports", long_about = None)]
struct Cli {
    /// Path to configuration file (only the transport section is used)
    #[arg(short, long, global = true, value_name = "FILE", env = "MPP_CONFIG_PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Send one JSON envelope to a component's port
    Send {
        /// Destination port
        port: u16,
        /// Envelope as JSON text
        envelope: String,
        /// Wait this long for a reply and print it
        #[arg(long, default_value = "0")]
        wait_ms: u64,
    },

    /// Print every envelope arriving on a port, one per line
    Listen {
        /// Port to bind (shared with other listeners)
        port: u16,
        /// Only print belief announcements
        #[arg(long)]
        beliefs_only: bool,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => MppConfig::load(path)?,
        None => MppConfig::default(),
    };

    match cli.command {
        Command::Send {
            port,
            envelope,
            wait_ms,
        } => send(&config, port, &envelope, wait_ms).await,
        Command::Listen { port, beliefs_only } => listen(&config, port, beliefs_only).await,
    }
}

async fn send(config: &MppConfig, port: u16, envelope: &str, wait_ms: u64) -> anyhow::Result<()> {
    let envelope: Value =
        serde_json::from_str(envelope).map_err(|e| anyhow!("Invalid envelope JSON: {}", e))?;

    let mut transport = Transport::open(0, None, &config.transport)?;
    if !transport.send(&envelope, port) {
        bail!("Send to port {} failed", port);
    }

    if wait_ms == 0 {
        return Ok(());
    }

    let reply = timeout(Duration::from_millis(wait_ms), async {
        loop {
            transport.readable(Channel::Data).await?;
            if let Some(reply) = transport.poll(Channel::Data) {
                return Ok::<_, std::io::Error>(reply);
            }
        }
    })
    .await;

    match reply {
        Ok(reply) => println!("{}", reply?),
        Err(_) => eprintln!("no reply within {}ms", wait_ms),
    }
    Ok(())
}

async fn listen(config: &MppConfig, port: u16, beliefs_only: bool) -> anyhow::Result<()> {
    let mut transport = Transport::open(port, None, &config.transport)?;
    eprintln!("Listening on port {}...", port);

    loop {
        transport.readable(Channel::Data).await?;
        while let Some(envelope) = transport.poll(Channel::Data) {
            if is_listed(&envelope, beliefs_only) {
                println!("{}", envelope);
            }
        }
    }
}

/// Whether `listen` prints `envelope`; `--beliefs-only` keeps belief announcements.
fn is_listed(envelope: &Value, beliefs_only: bool) -> bool {
    !beliefs_only || envelope.get("belief").is_some_and(Value::is_object)
}
