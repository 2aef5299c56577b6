use std::io;

use async_trait::async_trait;
use log::{info, warn};

use crate::constants::MAX_LOGIN_FAILURES;
use crate::core_ftpcommand::ftpcommand::FtpRequest;
use crate::core_ftpcommand::handlers::{CommandHandler, CommandOutcome};
use crate::reply::{code, Reply, ReplyWriter};
use crate::server::ServerContext;
use crate::session::Session;

/// Handles the PASS FTP command.
///
/// Completes the login sequence started by USER. A successful login gets a
/// fresh filesystem view so pre-login browsing state never leaks into the
/// account; repeated failures close the control connection with 421.
pub struct PassHandler;

#[async_trait]
impl CommandHandler for PassHandler {
    fn requires_login(&self) -> bool {
        false
    }

    async fn execute(
        &self,
        ctx: &ServerContext,
        session: &mut Session,
        request: &FtpRequest,
        reply: &mut ReplyWriter,
    ) -> io::Result<CommandOutcome> {
        // An anonymous password may legitimately be empty.
        let password = request.argument().unwrap_or_default();

        let Some(username) = session.pending_username.take() else {
            reply
                .send(Reply::bad_sequence("Login with USER first."))
                .await?;
            return Ok(CommandOutcome::Failure);
        };

        if !ctx.authenticator.authenticate(&username, password) {
            session.login_failures += 1;
            warn!(
                "Failed login for {} from {} (attempt {})",
                username, session.remote_addr, session.login_failures
            );
            if session.login_failures >= MAX_LOGIN_FAILURES {
                reply
                    .send(Reply::new(
                        code::SERVICE_NOT_AVAILABLE,
                        "Too many failed login attempts; closing control connection.",
                    ))
                    .await?;
                return Ok(CommandOutcome::Disconnect);
            }
            reply
                .send(Reply::new(code::NOT_LOGGED_IN, "Login incorrect."))
                .await?;
            return Ok(CommandOutcome::Failure);
        }

        let fs = match ctx.fs_factory.create_view(&username) {
            Ok(fs) => fs,
            Err(err) => {
                warn!("Could not create filesystem view for {}: {:#}", username, err);
                reply
                    .send(Reply::new(
                        code::SERVICE_NOT_AVAILABLE,
                        "Service not available, closing control connection.",
                    ))
                    .await?;
                return Ok(CommandOutcome::Disconnect);
            }
        };

        if session.is_authenticated() {
            ctx.stats.record_logout();
        }
        session.fs = fs;
        session.login_failures = 0;
        session.username = Some(username.clone());
        ctx.stats.record_login();
        info!("User {} logged in from {}", username, session.remote_addr);
        reply
            .send(Reply::new(
                code::USER_LOGGED_IN,
                format!("User {} logged in, proceed.", username),
            ))
            .await?;
        Ok(CommandOutcome::Success)
    }
}
