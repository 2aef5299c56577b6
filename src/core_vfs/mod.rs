pub mod native;

use std::io;
use std::time::SystemTime;

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};

/// Failure to resolve a path to a file object. Handlers translate these to
/// a 550 reply; resolution failures are never propagated as hard errors.
#[derive(Error, Debug)]
pub enum FsError {
    #[error("no such file or directory: {0}")]
    NotFound(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// One directory-listing entry, as produced by `FileObject::list`.
#[derive(Debug, Clone)]
pub struct DirEntryInfo {
    pub name: String,
    pub is_dir: bool,
    pub size: u64,
    pub modified: Option<SystemTime>,
}

/// A resolved path inside the served tree. Carries the canonical virtual
/// name, existence and kind flags, per-operation capability queries, and
/// the mutating operations themselves. Mutations report ordinary failure
/// through their `bool` return; they never panic the session.
///
/// Objects are resolved fresh for every command and never cached across
/// commands, since the underlying filesystem may change between them.
#[async_trait]
pub trait FileObject: Send + Sync {
    /// Canonical absolute virtual path, used for replies and logging
    /// instead of the raw client-supplied argument.
    fn full_name(&self) -> &str;

    fn exists(&self) -> bool;
    fn is_directory(&self) -> bool;
    fn is_file(&self) -> bool;

    fn can_read(&self) -> bool;
    fn can_write(&self) -> bool;
    fn can_delete(&self) -> bool;
    fn can_rename(&self) -> bool;
    fn can_mkdir(&self) -> bool;

    fn size(&self) -> u64;
    fn modified(&self) -> Option<SystemTime>;

    async fn delete(&self) -> bool;
    async fn mkdir(&self) -> bool;
    async fn set_modified(&self, mtime: SystemTime) -> bool;

    async fn open_read(&self, offset: u64) -> io::Result<Box<dyn AsyncRead + Send + Unpin>>;
    async fn open_write(&self, offset: u64) -> io::Result<Box<dyn AsyncWrite + Send + Unpin>>;
    async fn list(&self) -> io::Result<Vec<DirEntryInfo>>;
}

/// Session-scoped view of a hierarchical storage backend. Each session owns
/// exactly one view; views are never shared across sessions, so the view
/// itself needs no locking.
#[async_trait]
pub trait FileSystemView: Send {
    /// Current working directory as an absolute virtual path.
    fn current_directory(&self) -> &str;

    /// Changes the working directory; false when the target does not exist
    /// or is not a directory.
    async fn change_directory(&mut self, path: &str) -> bool;

    /// Resolves a client-supplied path (absolute or relative to the working
    /// directory) to a file object. A path that points at nothing valid
    /// still resolves, with `exists()` false, so handlers can distinguish
    /// "missing" from "cannot be created here".
    async fn resolve(&self, path: &str) -> Result<Box<dyn FileObject>, FsError>;

    /// Moves `source` to `target`; both were resolved through this view.
    async fn rename(&self, source: &dyn FileObject, target: &dyn FileObject) -> bool;
}

/// Creates one view per session. A fresh view is also created when a login
/// completes, so pre-login browsing state never leaks into the account.
pub trait FileSystemFactory: Send + Sync {
    fn create_view(&self, user: &str) -> anyhow::Result<Box<dyn FileSystemView>>;
}

/// Collapses `.` and `..` components lexically, anchored at the virtual
/// root. `..` at the root stays at the root, so a resolved virtual path can
/// never name anything above the served tree.
pub fn normalize_virtual_path(current_dir: &str, path: &str) -> String {
    let joined = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("{}/{}", current_dir.trim_end_matches('/'), path)
    };

    let mut parts: Vec<&str> = Vec::new();
    for component in joined.split('/') {
        match component {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            name => parts.push(name),
        }
    }

    if parts.is_empty() {
        String::from("/")
    } else {
        format!("/{}", parts.join("/"))
    }
}
