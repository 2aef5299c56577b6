use std::io;

use async_trait::async_trait;
use log::debug;

use crate::core_ftpcommand::ftpcommand::FtpRequest;
use crate::core_ftpcommand::handlers::{CommandHandler, CommandOutcome};
use crate::reply::{code, Reply, ReplyWriter};
use crate::server::ServerContext;
use crate::session::{Session, TransferType};

/// Handles the TYPE FTP command. Only the two representation types every
/// client actually uses are supported: A (ASCII) and I (binary image).
pub struct TypeHandler;

#[async_trait]
impl CommandHandler for TypeHandler {
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
        let arg = request.argument().unwrap_or_default().to_ascii_uppercase();
        let transfer_type = match arg.as_str() {
            "A" => TransferType::Ascii,
            "I" => TransferType::Binary,
            other => {
                debug!("Unsupported TYPE parameter: {}", other);
                reply
                    .send(Reply::new(
                        code::PARAMETER_NOT_IMPLEMENTED,
                        format!("Type {} not implemented.", other),
                    ))
                    .await?;
                return Ok(CommandOutcome::Failure);
            }
        };
        session.transfer_type = transfer_type;
        reply
            .send(Reply::new(
                code::COMMAND_OKAY,
                format!("Type set to {}.", arg),
            ))
            .await?;
        Ok(CommandOutcome::Success)
    }
}
