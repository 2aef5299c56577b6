use std::io;

use async_trait::async_trait;
use log::{debug, info, warn};
use tokio::io::AsyncWriteExt;

use crate::core_ftpcommand::ftpcommand::FtpRequest;
use crate::core_ftpcommand::handlers::{CommandHandler, CommandOutcome};
use crate::reply::{code, Reply, ReplyWriter};
use crate::server::ServerContext;
use crate::session::Session;

/// Handles the RETR (Retrieve) FTP command.
///
/// The file is opened before the 150 preliminary reply so an unreadable
/// file fails cleanly without touching the data channel. The channel is
/// opened only after the 150, which is when the establishment timeout
/// starts counting; a client that connected to the passive listener
/// earlier is waiting in the kernel backlog. A REST offset set by the
/// previous command is consumed here.
pub struct RetrHandler;

#[async_trait]
impl CommandHandler for RetrHandler {
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
                debug!("RETR resolution failed for {}: {}", arg, err);
                reply.send(Reply::file_unavailable(arg)).await?;
                return Ok(CommandOutcome::Failure);
            }
        };
        let name = file.full_name().to_string();

        if !file.exists() || !file.is_file() {
            reply.send(Reply::file_unavailable(&name)).await?;
            return Ok(CommandOutcome::Failure);
        }

        if !file.can_read() {
            reply.send(Reply::action_not_taken(Some(&name))).await?;
            return Ok(CommandOutcome::Failure);
        }

        let offset = session.take_restart_offset();
        let mut source = match file.open_read(offset).await {
            Ok(source) => source,
            Err(err) => {
                warn!("RETR could not open {}: {}", name, err);
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
                warn!("RETR data channel failed for {}: {}", name, err);
                reply.send(Reply::cant_open_data_connection()).await?;
                return Ok(CommandOutcome::Failure);
            }
        };

        match tokio::io::copy(&mut source, &mut data).await {
            Ok(bytes) => {
                data.shutdown().await.ok();
                reply
                    .send(Reply::new(
                        code::CLOSING_DATA_CONNECTION,
                        "Transfer complete.",
                    ))
                    .await?;
                info!(
                    "User {} downloaded {} ({} bytes)",
                    session.display_user(),
                    name,
                    bytes
                );
                ctx.stats.record_download(bytes);
                Ok(CommandOutcome::Success)
            }
            Err(err) => {
                warn!("RETR transfer of {} aborted: {}", name, err);
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
