use std::io;

use async_trait::async_trait;
use log::{debug, info};

use crate::core_ftpcommand::ftpcommand::FtpRequest;
use crate::core_ftpcommand::handlers::{CommandHandler, CommandOutcome};
use crate::reply::{code, Reply, ReplyWriter};
use crate::server::ServerContext;
use crate::session::Session;

/// Handles the RNTO (Rename To) FTP command. Consumes the rename marker
/// set by the immediately preceding RNFR; without one this is a 503. The
/// source is re-resolved fresh since the filesystem may have changed
/// between the two commands.
pub struct RntoHandler;

#[async_trait]
impl CommandHandler for RntoHandler {
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

        let Some(source_path) = session.take_rename_source() else {
            reply.send(Reply::bad_sequence("Send RNFR first.")).await?;
            return Ok(CommandOutcome::Failure);
        };

        let source = match session.fs.resolve(&source_path).await {
            Ok(source) if source.exists() => source,
            _ => {
                reply.send(Reply::file_unavailable(&source_path)).await?;
                return Ok(CommandOutcome::Failure);
            }
        };
        if !source.can_rename() {
            reply
                .send(Reply::action_not_taken(Some(&source_path)))
                .await?;
            return Ok(CommandOutcome::Failure);
        }

        let target = match session.fs.resolve(arg).await {
            Ok(target) => target,
            Err(err) => {
                debug!("RNTO resolution failed for {}: {}", arg, err);
                reply.send(Reply::file_unavailable(arg)).await?;
                return Ok(CommandOutcome::Failure);
            }
        };
        let target_name = target.full_name().to_string();

        if target.exists() {
            reply
                .send(Reply::new(
                    code::FILE_UNAVAILABLE,
                    format!("{}: already exists.", target_name),
                ))
                .await?;
            return Ok(CommandOutcome::Failure);
        }

        if !session.fs.rename(source.as_ref(), target.as_ref()).await {
            reply
                .send(Reply::action_not_taken(Some(&target_name)))
                .await?;
            return Ok(CommandOutcome::Failure);
        }

        reply
            .send(Reply::file_action_okay(format!(
                "Renamed \"{}\" to \"{}\".",
                source_path, target_name
            )))
            .await?;
        info!(
            "User {} renamed {} to {}",
            session.display_user(),
            source_path,
            target_name
        );
        ctx.stats.record_rename();
        Ok(CommandOutcome::Success)
    }
}
