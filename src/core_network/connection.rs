use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use log::{info, warn};
use tokio::sync::watch;

/// Registry of live control connections. Sessions register on accept and
/// deregister on close; administrative operations (a plugin Disconnect
/// verdict, server shutdown) force-close a session from outside its own
/// task through the watch channel handed out at registration. The map is
/// mutex-protected because those administrative calls race with the
/// owning tasks.
pub struct ConnectionManager {
    max_connections: usize,
    next_id: AtomicU64,
    live: Mutex<HashMap<u64, watch::Sender<bool>>>,
}

impl ConnectionManager {
    pub fn new(max_connections: usize) -> Self {
        ConnectionManager {
            max_connections,
            next_id: AtomicU64::new(1),
            live: Mutex::new(HashMap::new()),
        }
    }

    /// Registers a new connection. Returns the connection id plus the
    /// close-signal receiver its dispatch loop must watch, or None when the
    /// global connection limit is reached.
    pub fn register(&self) -> Option<(u64, watch::Receiver<bool>)> {
        let mut live = self.live.lock().unwrap();
        if live.len() >= self.max_connections {
            warn!(
                "Connection limit of {} reached; rejecting new connection",
                self.max_connections
            );
            return None;
        }
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = watch::channel(false);
        live.insert(id, tx);
        Some((id, rx))
    }

    pub fn deregister(&self, id: u64) {
        self.live.lock().unwrap().remove(&id);
    }

    /// Signals the session owning `id` to close immediately. The signal
    /// unblocks a dispatch loop suspended on a control read and cancels an
    /// in-flight command. False when the connection is already gone.
    pub fn force_close(&self, id: u64) -> bool {
        match self.live.lock().unwrap().get(&id) {
            Some(tx) => {
                info!("Force-closing connection {}", id);
                tx.send(true).is_ok()
            }
            None => false,
        }
    }

    /// Force-closes every live connection; used at shutdown.
    pub fn close_all(&self) {
        for (id, tx) in self.live.lock().unwrap().iter() {
            if tx.send(true).is_err() {
                warn!("Connection {} was already gone at shutdown", id);
            }
        }
    }

    pub fn active(&self) -> usize {
        self.live.lock().unwrap().len()
    }
}
