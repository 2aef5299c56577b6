use std::io;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, warn};
use tokio::io::AsyncWriteExt;

use crate::core_ftpcommand::ftpcommand::FtpRequest;
use crate::core_ftpcommand::handlers::{CommandHandler, CommandOutcome};
use crate::core_vfs::DirEntryInfo;
use crate::reply::{code, Reply, ReplyWriter};
use crate::server::ServerContext;
use crate::session::Session;

/// Handles the LIST FTP command: a unix-style long listing of the argument
/// directory (or the working directory), sent over the data channel.
pub struct ListHandler;

/// Handles the NLST FTP command: bare names only, one per line.
pub struct NlstHandler;

fn format_long_entry(entry: &DirEntryInfo) -> String {
    let kind = if entry.is_dir { 'd' } else { '-' };
    let date = entry
        .modified
        .map(|mtime| DateTime::<Utc>::from(mtime).format("%b %e %H:%M").to_string())
        .unwrap_or_else(|| String::from("Jan  1 00:00"));
    format!(
        "{}rw-r--r-- 1 ftp ftp {:>12} {} {}",
        kind, entry.size, date, entry.name
    )
}

fn format_name_entry(entry: &DirEntryInfo) -> String {
    entry.name.clone()
}

async fn send_listing(
    session: &mut Session,
    request: &FtpRequest,
    reply: &mut ReplyWriter,
    format: fn(&DirEntryInfo) -> String,
) -> io::Result<CommandOutcome> {
    let path = request.argument().unwrap_or(".");

    let dir = match session.fs.resolve(path).await {
        Ok(dir) => dir,
        Err(err) => {
            debug!("LIST resolution failed for {}: {}", path, err);
            reply.send(Reply::file_unavailable(path)).await?;
            return Ok(CommandOutcome::Failure);
        }
    };
    let name = dir.full_name().to_string();

    if !dir.exists() {
        reply.send(Reply::file_unavailable(&name)).await?;
        return Ok(CommandOutcome::Failure);
    }

    let entries = match dir.list().await {
        Ok(entries) => entries,
        Err(err) => {
            warn!("LIST could not read {}: {}", name, err);
            reply.send(Reply::action_not_taken(Some(&name))).await?;
            return Ok(CommandOutcome::Failure);
        }
    };

    reply
        .send(Reply::new(
            code::FILE_STATUS_OKAY,
            "Opening data connection for directory listing.",
        ))
        .await?;

    let mut data = match session.data_channel.open().await {
        Ok(data) => data,
        Err(err) => {
            warn!("LIST data channel failed for {}: {}", name, err);
            reply.send(Reply::cant_open_data_connection()).await?;
            return Ok(CommandOutcome::Failure);
        }
    };

    for entry in &entries {
        let line = format!("{}\r\n", format(entry));
        if let Err(err) = data.write_all(line.as_bytes()).await {
            warn!("LIST transfer of {} aborted: {}", name, err);
            reply
                .send(Reply::new(
                    code::TRANSFER_ABORTED,
                    "Connection closed; transfer aborted.",
                ))
                .await?;
            return Ok(CommandOutcome::Failure);
        }
    }
    data.shutdown().await.ok();

    reply
        .send(Reply::new(
            code::CLOSING_DATA_CONNECTION,
            "Transfer complete.",
        ))
        .await?;
    Ok(CommandOutcome::Success)
}

#[async_trait]
impl CommandHandler for ListHandler {
    async fn execute(
        &self,
        _ctx: &ServerContext,
        session: &mut Session,
        request: &FtpRequest,
        reply: &mut ReplyWriter,
    ) -> io::Result<CommandOutcome> {
        send_listing(session, request, reply, format_long_entry).await
    }
}

#[async_trait]
impl CommandHandler for NlstHandler {
    async fn execute(
        &self,
        _ctx: &ServerContext,
        session: &mut Session,
        request: &FtpRequest,
        reply: &mut ReplyWriter,
    ) -> io::Result<CommandOutcome> {
        send_listing(session, request, reply, format_name_entry).await
    }
}
