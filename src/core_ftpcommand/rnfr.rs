use std::io;

use async_trait::async_trait;
use log::debug;

use crate::core_ftpcommand::ftpcommand::FtpRequest;
use crate::core_ftpcommand::handlers::{CommandHandler, CommandOutcome};
use crate::reply::{code, Reply, ReplyWriter};
use crate::server::ServerContext;
use crate::session::Session;

/// Handles the RNFR (Rename From) FTP command. Stores the canonical source
/// path in the session's rename marker; the marker survives only until the
/// next command, which must be RNTO to consume it.
pub struct RnfrHandler;

#[async_trait]
impl CommandHandler for RnfrHandler {
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
            Err(err) => {
                debug!("RNFR resolution failed for {}: {}", arg, err);
                reply.send(Reply::file_unavailable(arg)).await?;
                return Ok(CommandOutcome::Failure);
            }
        };
        let name = file.full_name().to_string();

        if !file.exists() {
            reply.send(Reply::file_unavailable(&name)).await?;
            return Ok(CommandOutcome::Failure);
        }

        if !file.can_rename() {
            reply.send(Reply::action_not_taken(Some(&name))).await?;
            return Ok(CommandOutcome::Failure);
        }

        session.rename_from = Some(name.clone());
        reply
            .send(Reply::new(
                code::FILE_ACTION_PENDING,
                format!("File action pending for \"{}\"; send RNTO.", name),
            ))
            .await?;
        Ok(CommandOutcome::Success)
    }
}
