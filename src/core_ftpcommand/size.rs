use std::io;

use async_trait::async_trait;

use crate::core_ftpcommand::ftpcommand::FtpRequest;
use crate::core_ftpcommand::handlers::{CommandHandler, CommandOutcome};
use crate::reply::{code, Reply, ReplyWriter};
use crate::server::ServerContext;
use crate::session::Session;

/// Handles the SIZE FTP command. Only regular files have a meaningful
/// transfer size; directories are a 550.
pub struct SizeHandler;

#[async_trait]
impl CommandHandler for SizeHandler {
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

        let file = match session.fs.resolve(arg).await {
            Ok(file) => file,
            Err(_) => {
                reply.send(Reply::file_unavailable(arg)).await?;
                return Ok(CommandOutcome::Failure);
            }
        };

        if !file.exists() || !file.is_file() {
            reply.send(Reply::file_unavailable(file.full_name())).await?;
            return Ok(CommandOutcome::Failure);
        }

        reply
            .send(Reply::new(code::FILE_STATUS, file.size().to_string()))
            .await?;
        Ok(CommandOutcome::Success)
    }
}
