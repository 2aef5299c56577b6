use std::io;

use async_trait::async_trait;
use log::{debug, info, warn};
use tokio::io::AsyncWriteExt;

use crate::core_ftpcommand::ftpcommand::FtpRequest;
use crate::core_ftpcommand::handlers::{CommandHandler, CommandOutcome};
use crate::reply::{code, Reply, ReplyWriter};
use crate::server::ServerContext;
use crate::session::Session;

/// Handles the STOR (Store) FTP command. Mirrors RETR with the stream
/// directions swapped; a REST offset turns the store into an append at
/// that position instead of a truncating overwrite.
pub struct StorHandler;

#[async_trait]
impl CommandHandler for StorHandler {
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
                debug!("STOR resolution failed for {}: {}", arg, err);
                reply.send(Reply::file_unavailable(arg)).await?;
                return Ok(CommandOutcome::Failure);
            }
        };
        let name = file.full_name().to_string();

        if file.is_directory() || !file.can_write() {
            reply.send(Reply::action_not_taken(Some(&name))).await?;
            return Ok(CommandOutcome::Failure);
        }

        let offset = session.take_restart_offset();
        let mut sink = match file.open_write(offset).await {
            Ok(sink) => sink,
            Err(err) => {
                warn!("STOR could not open {}: {}", name, err);
                reply.send(Reply::action_not_taken(Some(&name))).await?;
                return Ok(CommandOutcome::Failure);
            }
        };

        reply
            .send(Reply::new(
                code::FILE_STATUS_OKAY,
                format!("Opening data connection for {}.", name),
            ))
            .await?;

        let mut data = match session.data_channel.open().await {
            Ok(data) => data,
            Err(err) => {
                warn!("STOR data channel failed for {}: {}", name, err);
                reply.send(Reply::cant_open_data_connection()).await?;
                return Ok(CommandOutcome::Failure);
            }
        };

        match tokio::io::copy(&mut data, &mut sink).await {
            Ok(bytes) => {
                sink.flush().await.ok();
                reply
                    .send(Reply::new(
                        code::CLOSING_DATA_CONNECTION,
                        "Transfer complete.",
                    ))
                    .await?;
                info!(
                    "User {} uploaded {} ({} bytes)",
                    session.display_user(),
                    name,
                    bytes
                );
                ctx.stats.record_upload(bytes);
                Ok(CommandOutcome::Success)
            }
            Err(err) => {
                warn!("STOR transfer of {} aborted: {}", name, err);
                reply
                    .send(Reply::new(
                        code::TRANSFER_ABORTED,
                        "Connection closed; transfer aborted.",
                    ))
                    .await?;
                Ok(CommandOutcome::Failure)
            }
        }
    }
}
