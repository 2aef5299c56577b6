use std::io;

use async_trait::async_trait;

use crate::core_ftpcommand::ftpcommand::FtpRequest;
use crate::core_ftpcommand::handlers::{CommandHandler, CommandOutcome};
use crate::reply::{code, Reply, ReplyWriter};
use crate::server::ServerContext;
use crate::session::Session;

/// Handles the FEAT FTP command with a multi-line 211 listing the
/// extensions this server understands.
pub struct FeatHandler;

#[async_trait]
impl CommandHandler for FeatHandler {
    fn requires_login(&self) -> bool {
        false
    }

    async fn execute(
        &self,
        _ctx: &ServerContext,
        _session: &mut Session,
        _request: &FtpRequest,
        reply: &mut ReplyWriter,
    ) -> io::Result<CommandOutcome> {
        reply
            .send(Reply::new(
                code::SYSTEM_STATUS,
                "Extensions supported:\n SIZE\n MDTM\n REST STREAM\nEnd.",
            ))
            .await?;
        Ok(CommandOutcome::Success)
    }
}
