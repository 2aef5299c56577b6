use std::io;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use log::{debug, info};

use crate::core_ftpcommand::ftpcommand::FtpRequest;
use crate::core_ftpcommand::handlers::{CommandHandler, CommandOutcome};
use crate::reply::{code, Reply, ReplyWriter};
use crate::server::ServerContext;
use crate::session::Session;

const MDTM_FORMAT: &str = "%Y%m%d%H%M%S";

/// Handles the MDTM FTP command, in both of its customary forms:
/// `MDTM path` reports the modification time as `213 YYYYMMDDHHMMSS`, and
/// `MDTM YYYYMMDDHHMMSS path` sets it.
pub struct MdtmHandler;

fn looks_like_timestamp(token: &str) -> bool {
    token.len() == 14 && token.bytes().all(|b| b.is_ascii_digit())
}

fn parse_timestamp(token: &str) -> Option<SystemTime> {
    let parsed = NaiveDateTime::parse_from_str(token, MDTM_FORMAT).ok()?;
    let seconds = parsed.and_utc().timestamp();
    if seconds < 0 {
        return None;
    }
    Some(UNIX_EPOCH + Duration::from_secs(seconds as u64))
}

fn format_timestamp(mtime: SystemTime) -> String {
    DateTime::<Utc>::from(mtime).format(MDTM_FORMAT).to_string()
}

#[async_trait]
impl CommandHandler for MdtmHandler {
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

        let (timestamp, path) = match arg.split_once(' ') {
            Some((token, rest)) if looks_like_timestamp(token) => (Some(token), rest),
            _ => (None, arg),
        };

        let file = match session.fs.resolve(path).await {
            Ok(file) => file,
            Err(err) => {
                debug!("MDTM resolution failed for {}: {}", path, err);
                reply.send(Reply::file_unavailable(path)).await?;
                return Ok(CommandOutcome::Failure);
            }
        };
        let name = file.full_name().to_string();

        if !file.exists() {
            reply.send(Reply::file_unavailable(&name)).await?;
            return Ok(CommandOutcome::Failure);
        }

        match timestamp {
            None => {
                let Some(mtime) = file.modified() else {
                    reply.send(Reply::file_unavailable(&name)).await?;
                    return Ok(CommandOutcome::Failure);
                };
                reply
                    .send(Reply::new(code::FILE_STATUS, format_timestamp(mtime)))
                    .await?;
                Ok(CommandOutcome::Success)
            }
            Some(token) => {
                let Some(mtime) = parse_timestamp(token) else {
                    reply.send(Reply::syntax_error()).await?;
                    return Ok(CommandOutcome::Failure);
                };
                if !file.can_write() {
                    reply.send(Reply::action_not_taken(Some(&name))).await?;
                    return Ok(CommandOutcome::Failure);
                }
                if !file.set_modified(mtime).await {
                    reply.send(Reply::action_not_taken(Some(&name))).await?;
                    return Ok(CommandOutcome::Failure);
                }
                reply
                    .send(Reply::new(code::FILE_STATUS, "Modification time set."))
                    .await?;
                info!(
                    "User {} set modification time of {} to {}",
                    session.display_user(),
                    name,
                    token
                );
                Ok(CommandOutcome::Success)
            }
        }
    }
}
