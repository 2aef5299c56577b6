use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use log::{debug, info, warn};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;

use crate::core_ftpcommand::ftpcommand::FtpRequest;
use crate::core_ftpcommand::handlers::CommandOutcome;
use crate::core_plugin::Verdict;
use crate::reply::{code, Reply, ReplyWriter};
use crate::server::ServerContext;
use crate::session::Session;

/// Why a session's dispatch loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The client sent QUIT.
    Quit,
    /// The peer closed the control connection.
    PeerClosed,
    /// The connection manager, a plugin verdict, or a 421-class condition
    /// closed the connection from the server side.
    ForcedClose,
}

/// What one processed command means for the loop.
enum CommandFlow {
    Continue,
    Quit,
    Disconnect,
}

/// Accept loop: one tokio task per control connection.
pub async fn start_server(ctx: Arc<ServerContext>) -> Result<()> {
    let bind = format!(
        "{}:{}",
        ctx.config.server.listen_address, ctx.config.server.listen_port
    );
    let listener = TcpListener::bind(&bind)
        .await
        .with_context(|| format!("Failed to bind control listener on {}", bind))?;
    info!("Server listening on {}", bind);

    loop {
        let (socket, addr) = listener.accept().await?;
        let ctx = Arc::clone(&ctx);
        tokio::spawn(async move {
            if let Err(err) = handle_connection(socket, addr, ctx).await {
                warn!("Connection error for {}: {:?}", addr, err);
            }
        });
    }
}

/// Owns one control connection from accept to close: registers it, greets
/// the client, runs the dispatch loop, and releases everything the session
/// held. All session resources go with this function's locals; a forced
/// close only has to make the loop return.
pub async fn handle_connection(
    socket: TcpStream,
    addr: SocketAddr,
    ctx: Arc<ServerContext>,
) -> Result<()> {
    let local_addr = socket.local_addr()?;
    let (read_half, write_half) = socket.into_split();
    let mut reply = ReplyWriter::new(Box::new(write_half));

    let Some((id, mut close_rx)) = ctx.connections.register() else {
        reply
            .send(Reply::new(
                code::SERVICE_NOT_AVAILABLE,
                "Too many connections; try again later.",
            ))
            .await
            .ok();
        return Ok(());
    };
    ctx.stats.record_open_connection();
    info!("Connection {} opened from {}", id, addr);

    let result = match ctx.fs_factory.create_view("") {
        Ok(fs) => {
            let mut session = Session::new(
                id,
                addr,
                local_addr,
                fs,
                Duration::from_secs(ctx.config.data_connection.timeout_seconds),
            );
            let mut reader = BufReader::new(read_half);
            match reply
                .send(Reply::service_ready(&ctx.config.server.welcome_message))
                .await
            {
                Ok(()) => {
                    let end =
                        drive_session(&mut reader, &mut reply, &mut session, &ctx, &mut close_rx)
                            .await;
                    if session.is_authenticated() {
                        ctx.stats.record_logout();
                    }
                    end.map(Some)
                }
                Err(err) => Err(err),
            }
        }
        Err(err) => {
            warn!("Could not create filesystem view: {:#}", err);
            reply
                .send(Reply::new(
                    code::SERVICE_NOT_AVAILABLE,
                    "Service not available, closing control connection.",
                ))
                .await
                .map(|()| None)
        }
    };

    ctx.connections.deregister(id);
    ctx.stats.record_close_connection();
    match &result {
        Ok(Some(end)) => info!("Connection {} closed ({:?})", id, end),
        Ok(None) => info!("Connection {} refused", id),
        Err(err) => warn!("Connection {} lost: {}", id, err),
    }
    result?;
    Ok(())
}

/// The session dispatch loop: read one line, parse, process, reply,
/// repeat. A malformed line gets a 500 and the loop continues; only QUIT,
/// peer EOF, a forced close, or a control-socket I/O error end it. Both
/// the blocking read and the in-flight command race against the close
/// signal so a forced disconnect is never stuck behind either.
pub async fn drive_session<R>(
    reader: &mut R,
    reply: &mut ReplyWriter,
    session: &mut Session,
    ctx: &ServerContext,
    close_rx: &mut watch::Receiver<bool>,
) -> io::Result<SessionEnd>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = Vec::new();
    loop {
        line.clear();
        let read = tokio::select! {
            _ = close_rx.changed() => return Ok(SessionEnd::ForcedClose),
            read = reader.read_until(b'\n', &mut line) => read?,
        };
        if read == 0 {
            return Ok(SessionEnd::PeerClosed);
        }

        // Decoded lossily: one bad byte must not kill the session.
        let text = String::from_utf8_lossy(&line);
        let request = match FtpRequest::parse(&text) {
            Ok(request) => request,
            Err(err) => {
                debug!("Unparseable line from {}: {}", session.remote_addr, err);
                reply.send(Reply::unrecognized()).await?;
                continue;
            }
        };
        debug!("Session {} <- {}", session.id, request.to_loggable());

        let flow = tokio::select! {
            _ = close_rx.changed() => return Ok(SessionEnd::ForcedClose),
            flow = process_command(ctx, session, &request, reply) => flow?,
        };
        match flow {
            CommandFlow::Continue => {}
            CommandFlow::Quit => return Ok(SessionEnd::Quit),
            CommandFlow::Disconnect => return Ok(SessionEnd::ForcedClose),
        }
    }
}

/// The handler-with-hooks protocol for one well-formed command: transient
/// state reset, registry lookup, login and argument gates, pre-hook chain,
/// handler body, post-hook chain. The gates reply before any hook runs;
/// the post-hook chain runs only after a successful handler, and its
/// Disconnect verdict closes the connection after the success reply has
/// already gone out.
async fn process_command(
    ctx: &ServerContext,
    session: &mut Session,
    request: &FtpRequest,
    reply: &mut ReplyWriter,
) -> io::Result<CommandFlow> {
    session.reset_transient_state(request.verb());

    let Some(handler) = ctx.registry.lookup(request.verb()) else {
        reply.send(Reply::not_implemented(request.verb())).await?;
        return Ok(CommandFlow::Continue);
    };

    if handler.requires_login() && !session.is_authenticated() {
        reply.send(Reply::not_logged_in()).await?;
        return Ok(CommandFlow::Continue);
    }

    if handler.requires_argument() && !request.has_argument() {
        reply.send(Reply::syntax_error()).await?;
        return Ok(CommandFlow::Continue);
    }

    match ctx.plugins.on_command_start(session, request, reply).await {
        Verdict::Continue => {}
        Verdict::Skip => {
            // The target was never resolved, so the reply names the raw
            // client argument.
            reply
                .send(Reply::action_not_taken(request.argument()))
                .await?;
            return Ok(CommandFlow::Continue);
        }
        Verdict::Disconnect => return Ok(CommandFlow::Disconnect),
    }

    let outcome = handler.execute(ctx, session, request, reply).await?;
    match outcome {
        CommandOutcome::Success => {
            match ctx.plugins.on_command_end(session, request, reply).await {
                Verdict::Disconnect => Ok(CommandFlow::Disconnect),
                // A post-hook Skip is not actionable; treated as Continue.
                Verdict::Continue | Verdict::Skip => Ok(CommandFlow::Continue),
            }
        }
        CommandOutcome::Failure => Ok(CommandFlow::Continue),
        CommandOutcome::Quit => Ok(CommandFlow::Quit),
        CommandOutcome::Disconnect => Ok(CommandFlow::Disconnect),
    }
}
