use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use log::info;

use crate::config::Config;
use crate::core_auth::{Authenticator, ConfigAuthenticator};
use crate::core_ftpcommand::handlers::{initialize_command_handlers, CommandRegistry};
use crate::core_network::connection::ConnectionManager;
use crate::core_network::network;
use crate::core_plugin::PluginChain;
use crate::core_stats::FtpStatistics;
use crate::core_vfs::native::NativeFileSystemFactory;
use crate::core_vfs::FileSystemFactory;

/// Everything shared by all sessions. The registry and plugin chain are
/// immutable after startup; the statistics collector and connection
/// manager do their own synchronization.
pub struct ServerContext {
    pub config: Arc<Config>,
    pub registry: CommandRegistry,
    pub plugins: PluginChain,
    pub stats: Arc<FtpStatistics>,
    pub authenticator: Arc<dyn Authenticator>,
    pub fs_factory: Arc<dyn FileSystemFactory>,
    pub connections: ConnectionManager,
}

pub fn build_context(config: Config, plugins: PluginChain) -> Result<ServerContext> {
    let root = PathBuf::from(&config.server.root_dir);
    std::fs::create_dir_all(&root)
        .with_context(|| format!("Failed to create root directory: {:?}", root))?;
    let fs_factory = NativeFileSystemFactory::new(&root)?;
    let max_connections = config.server.max_connections;
    let authenticator = ConfigAuthenticator::new(config.auth.clone());

    Ok(ServerContext {
        config: Arc::new(config),
        registry: initialize_command_handlers(),
        plugins,
        stats: Arc::new(FtpStatistics::new()),
        authenticator: Arc::new(authenticator),
        fs_factory: Arc::new(fs_factory),
        connections: ConnectionManager::new(max_connections),
    })
}

/// Runs the FTP server until ctrl-c. Shutdown stops accepting, force-closes
/// every live session, and logs a final statistics snapshot.
pub async fn run(config: Config) -> Result<()> {
    crate::config::log_config(&config);
    let ctx = Arc::new(build_context(config, PluginChain::new())?);

    tokio::select! {
        result = network::start_server(Arc::clone(&ctx)) => result,
        _ = tokio::signal::ctrl_c() => {
            info!(
                "Shutdown requested; closing {} live connections",
                ctx.connections.active()
            );
            ctx.connections.close_all();
            let totals = ctx.stats.snapshot();
            info!(
                "Totals: {} connections, {} logins, {} uploads ({} bytes), {} downloads ({} bytes), {} deletes",
                totals.total_connections,
                totals.total_logins,
                totals.files_uploaded,
                totals.bytes_uploaded,
                totals.files_downloaded,
                totals.bytes_downloaded,
                totals.files_deleted
            );
            Ok(())
        }
    }
}
