use std::io;

use async_trait::async_trait;

use crate::core_ftpcommand::ftpcommand::FtpRequest;
use crate::core_ftpcommand::handlers::{CommandHandler, CommandOutcome};
use crate::reply::{code, Reply, ReplyWriter};
use crate::server::ServerContext;
use crate::session::Session;

/// Handles the REST FTP command. The offset is a transient marker consumed
/// by the next RETR or STOR and cleared by anything else.
pub struct RestHandler;

#[async_trait]
impl CommandHandler for RestHandler {
    fn requires_argument(&self) -> bool {
        true
    }

    async fn execute(
        &self,
        _ctx: &ServerContext,
        session: &mut Session,
        request: &FtpRequest,
        reply: &mut ReplyWriter,
    ) -> io::Result<CommandOutcome> {
        let arg = request.argument().unwrap_or_default();
        let Ok(offset) = arg.parse::<u64>() else {
            reply.send(Reply::syntax_error()).await?;
            return Ok(CommandOutcome::Failure);
        };
        session.restart_offset = offset;
        reply
            .send(Reply::new(
                code::FILE_ACTION_PENDING,
                format!("Restarting at {}. Send RETR or STOR.", offset),
            ))
            .await?;
        Ok(CommandOutcome::Success)
    }
}
