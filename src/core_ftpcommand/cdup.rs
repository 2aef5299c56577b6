use std::io;

use async_trait::async_trait;

use crate::core_ftpcommand::ftpcommand::FtpRequest;
use crate::core_ftpcommand::handlers::{CommandHandler, CommandOutcome};
use crate::reply::{code, Reply, ReplyWriter};
use crate::server::ServerContext;
use crate::session::Session;

/// Handles the CDUP FTP command: CWD to the parent directory. At the root
/// this is a no-op that still succeeds.
pub struct CdupHandler;

#[async_trait]
impl CommandHandler for CdupHandler {
    async fn execute(
        &self,
        _ctx: &ServerContext,
        session: &mut Session,
        _request: &FtpRequest,
        reply: &mut ReplyWriter,
    ) -> io::Result<CommandOutcome> {
        if !session.fs.change_directory("..").await {
            reply.send(Reply::file_unavailable("..")).await?;
            return Ok(CommandOutcome::Failure);
        }
        let cwd = session.fs.current_directory().to_string();
        reply
            .send(Reply::new(
                code::FILE_ACTION_OKAY,
                format!("Directory changed to \"{}\".", cwd),
            ))
            .await?;
        Ok(CommandOutcome::Success)
    }
}
