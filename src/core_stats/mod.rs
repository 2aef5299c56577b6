use std::sync::atomic::{AtomicU64, Ordering};

/// Process-wide transfer and connection counters. Sessions record events
/// from their own tasks, so every counter is a relaxed atomic; recording
/// never blocks the calling session.
#[derive(Debug, Default)]
pub struct FtpStatistics {
    total_connections: AtomicU64,
    current_connections: AtomicU64,
    total_logins: AtomicU64,
    current_logins: AtomicU64,
    files_deleted: AtomicU64,
    files_uploaded: AtomicU64,
    files_downloaded: AtomicU64,
    dirs_created: AtomicU64,
    dirs_removed: AtomicU64,
    files_renamed: AtomicU64,
    bytes_uploaded: AtomicU64,
    bytes_downloaded: AtomicU64,
}

/// Point-in-time copy of every counter, for tests and shutdown logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatisticsSnapshot {
    pub total_connections: u64,
    pub current_connections: u64,
    pub total_logins: u64,
    pub current_logins: u64,
    pub files_deleted: u64,
    pub files_uploaded: u64,
    pub files_downloaded: u64,
    pub dirs_created: u64,
    pub dirs_removed: u64,
    pub files_renamed: u64,
    pub bytes_uploaded: u64,
    pub bytes_downloaded: u64,
}

impl FtpStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_open_connection(&self) {
        self.total_connections.fetch_add(1, Ordering::Relaxed);
        self.current_connections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_close_connection(&self) {
        self.current_connections.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn record_login(&self) {
        self.total_logins.fetch_add(1, Ordering::Relaxed);
        self.current_logins.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_logout(&self) {
        self.current_logins.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn record_delete(&self) {
        self.files_deleted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_mkdir(&self) {
        self.dirs_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rmdir(&self) {
        self.dirs_removed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rename(&self) {
        self.files_renamed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_upload(&self, bytes: u64) {
        self.files_uploaded.fetch_add(1, Ordering::Relaxed);
        self.bytes_uploaded.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn record_download(&self, bytes: u64) {
        self.files_downloaded.fetch_add(1, Ordering::Relaxed);
        self.bytes_downloaded.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatisticsSnapshot {
        StatisticsSnapshot {
            total_connections: self.total_connections.load(Ordering::Relaxed),
            current_connections: self.current_connections.load(Ordering::Relaxed),
            total_logins: self.total_logins.load(Ordering::Relaxed),
            current_logins: self.current_logins.load(Ordering::Relaxed),
            files_deleted: self.files_deleted.load(Ordering::Relaxed),
            files_uploaded: self.files_uploaded.load(Ordering::Relaxed),
            files_downloaded: self.files_downloaded.load(Ordering::Relaxed),
            dirs_created: self.dirs_created.load(Ordering::Relaxed),
            dirs_removed: self.dirs_removed.load(Ordering::Relaxed),
            files_renamed: self.files_renamed.load(Ordering::Relaxed),
            bytes_uploaded: self.bytes_uploaded.load(Ordering::Relaxed),
            bytes_downloaded: self.bytes_downloaded.load(Ordering::Relaxed),
        }
    }
}
