use std::io;

use async_trait::async_trait;

use crate::core_ftpcommand::ftpcommand::FtpRequest;
use crate::core_ftpcommand::handlers::{CommandHandler, CommandOutcome};
use crate::reply::{code, Reply, ReplyWriter};
use crate::server::ServerContext;
use crate::session::Session;

pub struct NoopHandler;

#[async_trait]
impl CommandHandler for NoopHandler {
    fn requires_login(&self) -> bool {
        false
    }

    async fn execute(
        &self,
        _ctx: &ServerContext,
        _session: &mut Session,
        _request: &FtpRequest,
        reply: &mut ReplyWriter,
    ) -> io::Result<CommandOutcome> {
        reply
            .send(Reply::new(code::COMMAND_OKAY, "NOOP command successful."))
            .await?;
        Ok(CommandOutcome::Success)
    }
}
