use std::io;

use async_trait::async_trait;
use log::info;

use crate::core_ftpcommand::ftpcommand::FtpRequest;
use crate::core_ftpcommand::handlers::{CommandHandler, CommandOutcome};
use crate::reply::{code, Reply, ReplyWriter};
use crate::server::ServerContext;
use crate::session::Session;

/// Handles the QUIT FTP command: one 221 reply, then the dispatch loop
/// ends the session gracefully.
pub struct QuitHandler;

#[async_trait]
impl CommandHandler for QuitHandler {
    fn requires_login(&self) -> bool {
        false
    }

    async fn execute(
        &self,
        _ctx: &ServerContext,
        session: &mut Session,
        _request: &FtpRequest,
        reply: &mut ReplyWriter,
    ) -> io::Result<CommandOutcome> {
        info!("QUIT from {} ({})", session.remote_addr, session.display_user());
        reply
            .send(Reply::new(
                code::SERVICE_CLOSING,
                "Service closing control connection.",
            ))
            .await?;
        Ok(CommandOutcome::Quit)
    }
}
