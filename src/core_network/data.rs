use std::io;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use log::debug;
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;

/// Failure to establish the secondary transfer channel. Transfer handlers
/// translate every variant into a 425-class reply; establishment is never
/// retried.
#[derive(Error, Debug)]
pub enum DataChannelError {
    #[error("no data connection negotiated; send PORT or PASV first")]
    NotNegotiated,
    #[error("data connection not established within {0:?}")]
    Timeout(Duration),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// How the next data connection will be established. Passive holds the
/// already-bound listener so the advertised port stays valid between the
/// PASV reply and the transfer command; active holds the client-supplied
/// endpoint from PORT.
enum DataChannelPlan {
    Passive(TcpListener),
    Active(SocketAddr),
}

/// Per-session data-connection state. At most one plan exists at a time;
/// negotiating a new one drops (and thereby closes) the previous listener.
/// `open` consumes the plan, so every established connection is single-use:
/// one transfer command, then gone.
pub struct DataChannel {
    plan: Option<DataChannelPlan>,
    timeout: Duration,
}

impl DataChannel {
    pub fn new(timeout: Duration) -> Self {
        DataChannel {
            plan: None,
            timeout,
        }
    }

    pub fn is_negotiated(&self) -> bool {
        self.plan.is_some()
    }

    pub fn set_passive(&mut self, listener: TcpListener) {
        self.plan = Some(DataChannelPlan::Passive(listener));
    }

    pub fn set_active(&mut self, target: SocketAddr) {
        self.plan = Some(DataChannelPlan::Active(target));
    }

    pub fn clear(&mut self) {
        self.plan = None;
    }

    /// Establishes the connection: accepts the one inbound client in
    /// passive mode, or connects out in active mode, either way bounded by
    /// the configured timeout. The kernel backlog holds a passive client
    /// that connected before the transfer command arrived.
    pub async fn open(&mut self) -> Result<TcpStream, DataChannelError> {
        let plan = self.plan.take().ok_or(DataChannelError::NotNegotiated)?;
        match plan {
            DataChannelPlan::Passive(listener) => {
                let (stream, peer) = timeout(self.timeout, listener.accept())
                    .await
                    .map_err(|_| DataChannelError::Timeout(self.timeout))??;
                debug!("Passive data connection accepted from {}", peer);
                Ok(stream)
            }
            DataChannelPlan::Active(target) => {
                let stream = timeout(self.timeout, TcpStream::connect(target))
                    .await
                    .map_err(|_| DataChannelError::Timeout(self.timeout))??;
                debug!("Active data connection opened to {}", target);
                Ok(stream)
            }
        }
    }
}

/// Binds a passive listener on `bind_ip`, walking the configured port range
/// in order. A range of 0..0 means any ephemeral port.
pub async fn bind_passive_listener(
    bind_ip: IpAddr,
    range_start: u16,
    range_end: u16,
) -> io::Result<TcpListener> {
    if range_start == 0 {
        return TcpListener::bind((bind_ip, 0)).await;
    }
    for port in range_start..=range_end {
        match TcpListener::bind((bind_ip, port)).await {
            Ok(listener) => return Ok(listener),
            Err(err) => debug!("Passive port {} unavailable: {}", port, err),
        }
    }
    Err(io::Error::new(
        io::ErrorKind::AddrInUse,
        format!("no free port in passive range {}..{}", range_start, range_end),
    ))
}
