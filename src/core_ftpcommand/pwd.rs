use std::io;

use async_trait::async_trait;

use crate::core_ftpcommand::ftpcommand::FtpRequest;
use crate::core_ftpcommand::handlers::{CommandHandler, CommandOutcome};
use crate::reply::{code, Reply, ReplyWriter};
use crate::server::ServerContext;
use crate::session::Session;

pub struct PwdHandler;

#[async_trait]
impl CommandHandler for PwdHandler {
    async fn execute(
        &self,
        _ctx: &ServerContext,
        session: &mut Session,
        _request: &FtpRequest,
        reply: &mut ReplyWriter,
    ) -> io::Result<CommandOutcome> {
        let cwd = session.fs.current_directory().to_string();
        reply
            .send(Reply::new(
                code::PATHNAME_CREATED,
                format!("\"{}\" is the current directory.", cwd),
            ))
            .await?;
        Ok(CommandOutcome::Success)
    }
}
