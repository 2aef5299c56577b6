use std::net::SocketAddr;
use std::time::Duration;

use crate::core_network::data::DataChannel;
use crate::core_vfs::FileSystemView;

/// Transfer representation type set by the TYPE command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferType {
    Ascii,
    Binary,
}

/// Per-connection mutable state: authentication progress, working
/// directory (held by the filesystem view), transfer type, the transient
/// rename/restart markers, and the negotiated data channel. One session
/// exists per control connection and is owned by that connection's task;
/// nothing here is shared.
pub struct Session {
    pub id: u64,
    pub remote_addr: SocketAddr,
    /// Local address of the control socket, used as the advertised PASV
    /// address when no external override is configured.
    pub local_addr: SocketAddr,
    pub username: Option<String>,
    pub pending_username: Option<String>,
    pub login_failures: u32,
    pub transfer_type: TransferType,
    /// Canonical source path set by RNFR, consumed by the next RNTO.
    pub rename_from: Option<String>,
    /// Byte offset set by REST, consumed by the next RETR or STOR.
    pub restart_offset: u64,
    pub data_channel: DataChannel,
    pub fs: Box<dyn FileSystemView>,
}

impl Session {
    pub fn new(
        id: u64,
        remote_addr: SocketAddr,
        local_addr: SocketAddr,
        fs: Box<dyn FileSystemView>,
        data_timeout: Duration,
    ) -> Self {
        Session {
            id,
            remote_addr,
            local_addr,
            username: None,
            pending_username: None,
            login_failures: 0,
            transfer_type: TransferType::Ascii,
            rename_from: None,
            restart_offset: 0,
            data_channel: DataChannel::new(data_timeout),
            fs,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.username.is_some()
    }

    /// User name for audit log lines; "-" before login completes.
    pub fn display_user(&self) -> &str {
        self.username.as_deref().unwrap_or("-")
    }

    /// Clears the transient per-command markers at the start of every
    /// command, exempting only the follow-up verbs that consume them.
    /// This is the single place those markers are reset.
    pub fn reset_transient_state(&mut self, verb: &str) {
        if verb != "RNTO" {
            self.rename_from = None;
        }
        if verb != "RETR" && verb != "STOR" {
            self.restart_offset = 0;
        }
    }

    pub fn take_rename_source(&mut self) -> Option<String> {
        self.rename_from.take()
    }

    pub fn take_restart_offset(&mut self) -> u64 {
        std::mem::take(&mut self.restart_offset)
    }
}
