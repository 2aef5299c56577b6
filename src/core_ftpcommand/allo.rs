use std::io;

use async_trait::async_trait;

use crate::core_ftpcommand::ftpcommand::FtpRequest;
use crate::core_ftpcommand::handlers::{CommandHandler, CommandOutcome};
use crate::reply::{code, Reply, ReplyWriter};
use crate::server::ServerContext;
use crate::session::Session;

/// Handles the ALLO FTP command. Storage is not preallocated here, so the
/// command is acknowledged as superfluous per RFC 959.
pub struct AlloHandler;

#[async_trait]
impl CommandHandler for AlloHandler {
    async fn execute(
        &self,
        _ctx: &ServerContext,
        _session: &mut Session,
        _request: &FtpRequest,
        reply: &mut ReplyWriter,
    ) -> io::Result<CommandOutcome> {
        reply
            .send(Reply::new(
                code::COMMAND_SUPERFLUOUS,
                "ALLO command superfluous; taken as NOOP.",
            ))
            .await?;
        Ok(CommandOutcome::Success)
    }
}
