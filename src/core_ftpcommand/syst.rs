use std::io;

use async_trait::async_trait;

use crate::core_ftpcommand::ftpcommand::FtpRequest;
use crate::core_ftpcommand::handlers::{CommandHandler, CommandOutcome};
use crate::reply::{code, Reply, ReplyWriter};
use crate::server::ServerContext;
use crate::session::Session;

pub struct SystHandler;

#[async_trait]
impl CommandHandler for SystHandler {
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
            .send(Reply::new(code::SYSTEM_TYPE, "UNIX Type: L8"))
            .await?;
        Ok(CommandOutcome::Success)
    }
}
