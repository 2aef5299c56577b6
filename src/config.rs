use std::net::IpAddr;

use anyhow::{bail, Context, Result};
use log::info;
use serde::Deserialize;

fn default_listen_address() -> String {
    String::from("0.0.0.0")
}

fn default_listen_port() -> u16 {
    2121
}

fn default_max_connections() -> usize {
    512
}

fn default_root_dir() -> String {
    String::from("/var/ftp")
}

fn default_welcome_message() -> String {
    String::from("Service ready for new user.")
}

fn default_data_timeout_seconds() -> u64 {
    30
}

fn default_anonymous_enabled() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen_address")]
    pub listen_address: String,
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,
    /// Live control connections accepted at once; further clients get 421.
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
    /// Root of the served tree; sessions cannot escape it.
    #[serde(default = "default_root_dir")]
    pub root_dir: String,
    #[serde(default = "default_welcome_message")]
    pub welcome_message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataConnectionConfig {
    /// First port of the passive listener range; 0 means ephemeral ports.
    #[serde(default)]
    pub passive_port_range_start: u16,
    /// Last port of the passive listener range, inclusive.
    #[serde(default)]
    pub passive_port_range_end: u16,
    /// Accept/connect timeout for the data channel.
    #[serde(default = "default_data_timeout_seconds")]
    pub timeout_seconds: u64,
    /// Address advertised in PASV replies when the server sits behind NAT.
    #[serde(default)]
    pub external_address: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserCredential {
    pub name: String,
    /// bcrypt hash, as produced by `ferroftpd --hash-password`.
    pub password_hash: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_anonymous_enabled")]
    pub anonymous_enabled: bool,
    #[serde(default)]
    pub users: Vec<UserCredential>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub data_connection: DataConnectionConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_address: default_listen_address(),
            listen_port: default_listen_port(),
            max_connections: default_max_connections(),
            root_dir: default_root_dir(),
            welcome_message: default_welcome_message(),
        }
    }
}

impl Default for DataConnectionConfig {
    fn default() -> Self {
        Self {
            passive_port_range_start: 0,
            passive_port_range_end: 0,
            timeout_seconds: default_data_timeout_seconds(),
            external_address: None,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            anonymous_enabled: default_anonymous_enabled(),
            users: Vec::new(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            data_connection: DataConnectionConfig::default(),
            auth: AuthConfig::default(),
        }
    }
}

impl Config {
    pub fn load_from_file(path: &str) -> Result<Self> {
        let config_str = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file: {}", path))?;
        let config: Config = toml::from_str(&config_str)
            .with_context(|| format!("Failed to parse configuration file: {}", path))?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects configurations the server could not honor at runtime.
    pub fn validate(&self) -> Result<()> {
        let dc = &self.data_connection;
        if dc.passive_port_range_start > dc.passive_port_range_end {
            bail!(
                "passive port range is inverted: {}..{}",
                dc.passive_port_range_start,
                dc.passive_port_range_end
            );
        }
        if (dc.passive_port_range_start == 0) != (dc.passive_port_range_end == 0) {
            bail!("passive port range must set both ends or neither");
        }
        if let Some(addr) = &dc.external_address {
            addr.parse::<IpAddr>()
                .with_context(|| format!("invalid external_address: {}", addr))?;
        }
        self.server
            .listen_address
            .parse::<IpAddr>()
            .with_context(|| format!("invalid listen_address: {}", self.server.listen_address))?;
        Ok(())
    }

    /// Parsed external address override, validated at startup.
    pub fn external_address(&self) -> Option<IpAddr> {
        self.data_connection
            .external_address
            .as_ref()
            .and_then(|addr| addr.parse().ok())
    }
}

pub fn log_config(config: &Config) {
    info!("  Listen Address: {}", config.server.listen_address);
    info!("  Listen Port: {}", config.server.listen_port);
    info!("  Max Connections: {}", config.server.max_connections);
    info!("  Root Directory: {}", config.server.root_dir);
    info!(
        "  Passive Port Range: {}..{}",
        config.data_connection.passive_port_range_start,
        config.data_connection.passive_port_range_end
    );
    info!(
        "  Data Connection Timeout: {}s",
        config.data_connection.timeout_seconds
    );
    if let Some(addr) = &config.data_connection.external_address {
        info!("  External Address: {}", addr);
    }
    info!(
        "  Anonymous Login: {}",
        if config.auth.anonymous_enabled {
            "enabled"
        } else {
            "disabled"
        }
    );
}
