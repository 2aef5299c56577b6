use std::io;

use async_trait::async_trait;
use log::{debug, info};

use crate::core_ftpcommand::ftpcommand::FtpRequest;
use crate::core_ftpcommand::handlers::{CommandHandler, CommandOutcome};
use crate::reply::{code, Reply, ReplyWriter};
use crate::server::ServerContext;
use crate::session::Session;

/// Handles the MKD (Make Directory) FTP command, following the same
/// resolve / capability / mutate / reply sequence as DELE.
pub struct MkdHandler;

#[async_trait]
impl CommandHandler for MkdHandler {
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
                debug!("MKD resolution failed for {}: {}", arg, err);
                reply.send(Reply::file_unavailable(arg)).await?;
                return Ok(CommandOutcome::Failure);
            }
        };
        let name = dir.full_name().to_string();

        if dir.exists() {
            reply
                .send(Reply::new(
                    code::FILE_UNAVAILABLE,
                    format!("{}: already exists.", name),
                ))
                .await?;
            return Ok(CommandOutcome::Failure);
        }

        if !dir.can_mkdir() {
            reply.send(Reply::action_not_taken(Some(&name))).await?;
            return Ok(CommandOutcome::Failure);
        }

        if !dir.mkdir().await {
            reply.send(Reply::action_not_taken(Some(&name))).await?;
            return Ok(CommandOutcome::Failure);
        }

        reply
            .send(Reply::new(
                code::PATHNAME_CREATED,
                format!("\"{}\" directory created.", name),
            ))
            .await?;
        info!("User {} created directory {}", session.display_user(), name);
        ctx.stats.record_mkdir();
        Ok(CommandOutcome::Success)
    }
}
