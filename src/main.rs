mod config;
mod constants;
mod core_auth;
mod core_cli;
mod core_ftpcommand;
mod core_log;
mod core_network;
mod core_plugin;
mod core_stats;
mod core_vfs;
mod reply;
mod server;
mod session;
#[cfg(test)]
mod testutil;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use crate::config::Config;
use crate::core_cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    // Standalone helper: print a bcrypt hash for the config file and exit.
    if let Some(password) = args.hash_password {
        let hash = bcrypt::hash(password, bcrypt::DEFAULT_COST)
            .context("Failed to hash password")?;
        println!("{}", hash);
        return Ok(());
    }

    core_log::logger::init_logging(args.verbose);

    let default_config_path = if cfg!(target_os = "windows") {
        "C:\\ferroftpd\\etc\\ferroftpd.conf"
    } else {
        "/etc/ferroftpd.conf"
    };
    let config_path = if args.config.is_empty() {
        default_config_path
    } else {
        args.config.as_str()
    };

    let mut config = if args.config.is_empty() && !std::path::Path::new(config_path).exists() {
        info!("No configuration at {}; using built-in defaults", config_path);
        Config::default()
    } else {
        Config::load_from_file(config_path)?
    };

    if let Some(port) = args.port {
        config.server.listen_port = port;
    }

    server::run(config).await
}
