use std::io;

use async_trait::async_trait;
use log::{debug, info};

use crate::core_ftpcommand::ftpcommand::FtpRequest;
use crate::core_ftpcommand::handlers::{CommandHandler, CommandOutcome};
use crate::reply::{Reply, ReplyWriter};
use crate::server::ServerContext;
use crate::session::Session;

/// Handles the DELE (Delete File) FTP command.
///
/// The target is resolved fresh through the session's filesystem view; all
/// replies and log lines use the canonical resolved name rather than the
/// raw client argument, which may be relative. A path that does not
/// resolve is a 550; a missing delete capability or a failing delete
/// operation is a 450. Neither is an error as far as the session is
/// concerned: the loop keeps running. On success exactly one 250 is
/// written, one audit line is logged, and the delete counter is bumped
/// exactly once.
pub struct DeleHandler;

#[async_trait]
impl CommandHandler for DeleHandler {
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

        let file = match session.fs.resolve(arg).await {
            Ok(file) => file,
            Err(err) => {
                debug!("DELE resolution failed for {}: {}", arg, err);
                reply.send(Reply::file_unavailable(arg)).await?;
                return Ok(CommandOutcome::Failure);
            }
        };
        let name = file.full_name().to_string();

        if !file.exists() {
            reply.send(Reply::file_unavailable(&name)).await?;
            return Ok(CommandOutcome::Failure);
        }

        if !file.can_delete() {
            reply.send(Reply::action_not_taken(Some(&name))).await?;
            return Ok(CommandOutcome::Failure);
        }

        if !file.delete().await {
            reply.send(Reply::action_not_taken(Some(&name))).await?;
            return Ok(CommandOutcome::Failure);
        }

        reply
            .send(Reply::file_action_okay(format!("\"{}\" deleted.", name)))
            .await?;
        info!("User {} deleted {}", session.display_user(), name);
        ctx.stats.record_delete();
        Ok(CommandOutcome::Success)
    }
}
