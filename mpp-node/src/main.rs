//! MPP component process
//!
//! Runs one register-file component on the data port given as the single
//! positional argument:
//!
//! ```bash
//! mpp-node 4010
//! mpp-node 4010 --name NET --publish-ms 500 --listen-bus
//! ```
//!
//! Flags override the optional TOML config file, which overrides the fleet
//! defaults (bus 3999, belief sink 4000).

use clap::error::ErrorKind;
use clap::Parser;
use mpp::components::RegisterFile;
use mpp::{MppConfig, Node};
use std::path::PathBuf;
use tracing::warn;

#[derive(Parser, Debug)]
#[command(name = "mpp-node")]
#[command(about = "MPP component process")]
struct Args {
    /// Data port; also the component's address in the fleet
    port: u16,

    /// Path to node configuration file (TOML format)
    #[arg(long = "config", value_name = "FILE", env = "MPP_CONFIG_PATH")]
    config_path: Option<PathBuf>,

    /// Component identity, used as the belief subject prefix
    #[arg(long, env = "MPP_COMPONENT_NAME")]
    name: Option<String>,

    /// Snapshot publish period in milliseconds (0 disables publishing)
    #[arg(long, env = "MPP_PUBLISH_MS")]
    publish_ms: Option<u64>,

    /// Also listen on the shared bus port
    #[arg(long, env = "MPP_LISTEN_BUS")]
    listen_bus: bool,
}

impl Args {
    /// CLI arguments take precedence over config file values
    fn resolve_config(&self) -> anyhow::Result<MppConfig> {
        let mut config = match &self.config_path {
            Some(path) => MppConfig::load(path)?,
            None => MppConfig::default(),
        };

        if let Some(name) = &self.name {
            config.node.name = name.clone();
        }
        if let Some(publish_ms) = self.publish_ms {
            config.node.publish_period_ms = publish_ms;
        }
        if self.listen_bus {
            config.node.listen_bus = true;
        }
        Ok(config)
    }
}

fn parse_args() -> Args {
    match Args::try_parse() {
        Ok(args) => args,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = e.print();
            std::process::exit(0);
        }
        Err(_) => {
            let program = std::env::args()
                .next()
                .unwrap_or_else(|| "mpp-node".to_string());
            eprintln!("usage: {} <port>", program);
            std::process::exit(1);
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = parse_args();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("mpp=info".parse()?)
                .add_directive("mpp_node=info".parse()?),
        )
        .with_ansi(false)
        .init();

    let config = args.resolve_config()?;
    let component = RegisterFile::new(config.node.name.clone(), args.port);
    let mut node = Node::new(component, args.port, &config);
    node.run().await;

    if !node.is_healthy() {
        warn!("{} never entered its loop", config.node.name);
    }
    Ok(())
}
