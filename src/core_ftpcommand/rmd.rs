use std::io;

use async_trait::async_trait;
use log::{debug, info};

use crate::core_ftpcommand::ftpcommand::FtpRequest;
use crate::core_ftpcommand::handlers::{CommandHandler, CommandOutcome};
use crate::reply::{code, Reply, ReplyWriter};
use crate::server::ServerContext;
use crate::session::Session;

/// Handles the RMD (Remove Directory) FTP command.
pub struct RmdHandler;

#[async_trait]
impl CommandHandler for RmdHandler {
    fn requires_argument(&self) -> bool {
        true
    }

    async fn execute(
        &self,
        ctx: &ServerContext,
        session: &mut Session,
        request: &FtpRequest,
        reply: &mut ReplyWriter,
    ) -> io::Result<CommandOutcome> {
        let arg = request.argument().unwrap_or_default();

        let dir = match session.fs.resolve(arg).await {
            Ok(dir) => dir,
            Err(err) => {
                debug!("RMD resolution failed for {}: {}", arg, err);
                reply.send(Reply::file_unavailable(arg)).await?;
                return Ok(CommandOutcome::Failure);
            }
        };
        let name = dir.full_name().to_string();

        if !dir.exists() || !dir.is_directory() {
            reply
                .send(Reply::new(
                    code::FILE_UNAVAILABLE,
                    format!("{}: not a directory.", name),
                ))
                .await?;
            return Ok(CommandOutcome::Failure);
        }

        if !dir.can_delete() {
            reply.send(Reply::action_not_taken(Some(&name))).await?;
            return Ok(CommandOutcome::Failure);
        }

        if !dir.delete().await {
            reply.send(Reply::action_not_taken(Some(&name))).await?;
            return Ok(CommandOutcome::Failure);
        }

        reply
            .send(Reply::file_action_okay(format!(
                "\"{}\" directory removed.",
                name
            )))
            .await?;
        info!("User {} removed directory {}", session.display_user(), name);
        ctx.stats.record_rmdir();
        Ok(CommandOutcome::Success)
    }
}
