use std::io;

use async_trait::async_trait;
use log::debug;

use crate::core_ftpcommand::ftpcommand::FtpRequest;
use crate::core_ftpcommand::handlers::{CommandHandler, CommandOutcome};
use crate::reply::{code, Reply, ReplyWriter};
use crate::server::ServerContext;
use crate::session::Session;

/// Handles the CWD FTP command. The filesystem view refuses targets that
/// do not exist or are not directories; either case is a 550.
pub struct CwdHandler;

#[async_trait]
impl CommandHandler for CwdHandler {
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
        let target = request.argument().unwrap_or_default();
        if !session.fs.change_directory(target).await {
            debug!("CWD to {} failed for {}", target, session.display_user());
            reply.send(Reply::file_unavailable(target)).await?;
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
