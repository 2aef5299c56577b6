use std::io;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

use async_trait::async_trait;
use log::debug;

use crate::core_ftpcommand::ftpcommand::FtpRequest;
use crate::core_ftpcommand::handlers::{CommandHandler, CommandOutcome};
use crate::reply::{code, Reply, ReplyWriter};
use crate::server::ServerContext;
use crate::session::Session;

/// Handles the PORT FTP command: parses the client-supplied
/// `h1,h2,h3,h4,p1,p2` endpoint and stores it as the session's active-mode
/// data-channel plan. The outbound connection is opened by the transfer
/// command, bounded by the configured timeout.
pub struct PortHandler;

/// Parses the RFC 959 host-port argument; None when it is malformed.
pub fn parse_port_argument(arg: &str) -> Option<SocketAddr> {
    let fields: Vec<u8> = arg
        .split(',')
        .map(|field| field.trim().parse::<u8>())
        .collect::<Result<_, _>>()
        .ok()?;
    if fields.len() != 6 {
        return None;
    }
    let ip = Ipv4Addr::new(fields[0], fields[1], fields[2], fields[3]);
    let port = u16::from(fields[4]) * 256 + u16::from(fields[5]);
    if port == 0 {
        return None;
    }
    Some(SocketAddr::V4(SocketAddrV4::new(ip, port)))
}

#[async_trait]
impl CommandHandler for PortHandler {
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
        let Some(target) = parse_port_argument(arg) else {
            debug!("Malformed PORT argument: {}", arg);
            reply.send(Reply::syntax_error()).await?;
            return Ok(CommandOutcome::Failure);
        };

        session.data_channel.set_active(target);
        reply
            .send(Reply::new(code::COMMAND_OKAY, "PORT command successful."))
            .await?;
        Ok(CommandOutcome::Success)
    }
}
