use std::io;

use async_trait::async_trait;
use log::{info, warn};

use crate::core_auth::{is_anonymous, is_valid_username};
use crate::core_ftpcommand::ftpcommand::FtpRequest;
use crate::core_ftpcommand::handlers::{CommandHandler, CommandOutcome};
use crate::reply::{code, Reply, ReplyWriter};
use crate::server::ServerContext;
use crate::session::Session;

/// Handles the USER FTP command.
///
/// Records the offered user name and asks for the password. Nothing is
/// authenticated until PASS arrives; issuing USER again restarts the login
/// sequence.
pub struct UserHandler;

#[async_trait]
impl CommandHandler for UserHandler {
    fn requires_argument(&self) -> bool {
        true
    }

    fn requires_login(&self) -> bool {
        false
    }

    async fn execute(
        &self,
        _ctx: &ServerContext,
        session: &mut Session,
        request: &FtpRequest,
        reply: &mut ReplyWriter,
    ) -> io::Result<CommandOutcome> {
        let username = request.argument().unwrap_or_default();
        if !is_valid_username(username) {
            warn!("Rejected invalid user name from {}", session.remote_addr);
            reply
                .send(Reply::new(
                    code::SYNTAX_ERROR_IN_ARGUMENTS,
                    "Invalid user name.",
                ))
                .await?;
            return Ok(CommandOutcome::Failure);
        }

        session.pending_username = Some(username.to_string());
        let text = if is_anonymous(username) {
            "Anonymous login okay, send your complete email address as password."
        } else {
            "User name okay, need password."
        };
        info!("USER {} offered by {}", username, session.remote_addr);
        reply.send(Reply::new(code::NEED_PASSWORD, text)).await?;
        Ok(CommandOutcome::Success)
    }
}
