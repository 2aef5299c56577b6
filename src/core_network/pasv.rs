use std::io;
use std::net::{IpAddr, Ipv4Addr};

use async_trait::async_trait;
use log::{debug, warn};

use crate::core_ftpcommand::ftpcommand::FtpRequest;
use crate::core_ftpcommand::handlers::{CommandHandler, CommandOutcome};
use crate::core_network::data::bind_passive_listener;
use crate::reply::{code, Reply, ReplyWriter};
use crate::server::ServerContext;
use crate::session::Session;

/// Handles the PASV FTP command: binds a listener from the configured
/// passive port range, stores it as the session's data-channel plan, and
/// advertises the address/port pair. The one inbound connection is not
/// accepted here; the transfer command does that, bounded by the
/// configured timeout.
pub struct PasvHandler;

/// Renders the RFC 959 `(h1,h2,h3,h4,p1,p2)` reply text.
pub fn format_passive_reply(addr: Ipv4Addr, port: u16) -> String {
    let octets = addr.octets();
    format!(
        "Entering Passive Mode ({},{},{},{},{},{}).",
        octets[0],
        octets[1],
        octets[2],
        octets[3],
        port / 256,
        port % 256
    )
}

#[async_trait]
impl CommandHandler for PasvHandler {
    async fn execute(
        &self,
        ctx: &ServerContext,
        session: &mut Session,
        _request: &FtpRequest,
        reply: &mut ReplyWriter,
    ) -> io::Result<CommandOutcome> {
        let dc = &ctx.config.data_connection;
        let bind_ip = session.local_addr.ip();
        let listener = match bind_passive_listener(
            bind_ip,
            dc.passive_port_range_start,
            dc.passive_port_range_end,
        )
        .await
        {
            Ok(listener) => listener,
            Err(err) => {
                warn!("PASV could not bind a listener: {}", err);
                reply.send(Reply::cant_open_data_connection()).await?;
                return Ok(CommandOutcome::Failure);
            }
        };
        let port = listener.local_addr()?.port();

        // External override first (NAT), then the control socket's own
        // address. The PASV reply format only exists for IPv4.
        let advertised = match ctx.config.external_address().unwrap_or(bind_ip) {
            IpAddr::V4(v4) => v4,
            IpAddr::V6(v6) => {
                warn!("PASV unavailable on IPv6 control connection {}", v6);
                reply.send(Reply::cant_open_data_connection()).await?;
                return Ok(CommandOutcome::Failure);
            }
        };

        session.data_channel.set_passive(listener);
        debug!(
            "PASV listener for session {} on {}:{}",
            session.id, advertised, port
        );
        reply
            .send(Reply::new(
                code::ENTERING_PASSIVE_MODE,
                format_passive_reply(advertised, port),
            ))
            .await?;
        Ok(CommandOutcome::Success)
    }
}
