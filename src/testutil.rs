//! Shared fixtures for the test modules: an in-memory filesystem that
//! records every access, a hook that records its invocations, and a
//! driver that runs a command script through the real dispatch loop over
//! an in-memory control connection.

use std::collections::HashMap;
use std::io;
use std::sync::{Arc, Mutex};
use std::time::{Duration, UNIX_EPOCH};

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader, DuplexStream};
use tokio::sync::watch;

use crate::config::Config;
use crate::core_auth::{is_anonymous, Authenticator};
use crate::core_ftpcommand::ftpcommand::FtpRequest;
use crate::core_ftpcommand::handlers::initialize_command_handlers;
use crate::core_network::connection::ConnectionManager;
use crate::core_network::network::{drive_session, SessionEnd};
use crate::core_plugin::{PluginChain, PluginHook, Verdict};
use crate::core_stats::FtpStatistics;
use crate::core_vfs::{
    normalize_virtual_path, DirEntryInfo, FileObject, FileSystemFactory, FileSystemView, FsError,
};
use crate::reply::ReplyWriter;
use crate::server::ServerContext;
use crate::session::Session;

// ---------------------------------------------------------------------
// Mock filesystem

#[derive(Clone)]
pub struct MockEntry {
    pub is_dir: bool,
    pub can_delete: bool,
    pub delete_succeeds: bool,
    pub size: u64,
}

impl MockEntry {
    pub fn file() -> Self {
        MockEntry {
            is_dir: false,
            can_delete: true,
            delete_succeeds: true,
            size: 0,
        }
    }

    pub fn dir() -> Self {
        MockEntry {
            is_dir: true,
            ..MockEntry::file()
        }
    }

    pub fn protected(mut self) -> Self {
        self.can_delete = false;
        self
    }

    pub fn failing_delete(mut self) -> Self {
        self.delete_succeeds = false;
        self
    }
}

#[derive(Default)]
struct MockFsInner {
    files: HashMap<String, MockEntry>,
    resolves: Vec<String>,
    deleted: Vec<String>,
}

/// Shared state behind every view a `MockFileSystemFactory` hands out, so
/// tests can seed files and inspect what the handlers touched.
#[derive(Clone, Default)]
pub struct MockFsState {
    inner: Arc<Mutex<MockFsInner>>,
}

impl MockFsState {
    pub fn add(&self, path: &str, entry: MockEntry) {
        self.inner
            .lock()
            .unwrap()
            .files
            .insert(path.to_string(), entry);
    }

    pub fn contains(&self, path: &str) -> bool {
        self.inner.lock().unwrap().files.contains_key(path)
    }

    /// Every path the handlers asked to resolve, in order.
    pub fn resolves(&self) -> Vec<String> {
        self.inner.lock().unwrap().resolves.clone()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.inner.lock().unwrap().deleted.clone()
    }
}

pub struct MockFileSystemFactory {
    state: MockFsState,
}

impl MockFileSystemFactory {
    pub fn new(state: MockFsState) -> Self {
        MockFileSystemFactory { state }
    }
}

impl FileSystemFactory for MockFileSystemFactory {
    fn create_view(&self, _user: &str) -> anyhow::Result<Box<dyn FileSystemView>> {
        Ok(Box::new(MockFileSystem {
            state: self.state.clone(),
            current_dir: String::from("/"),
        }))
    }
}

pub struct MockFileSystem {
    state: MockFsState,
    current_dir: String,
}

#[async_trait]
impl FileSystemView for MockFileSystem {
    fn current_directory(&self) -> &str {
        &self.current_dir
    }

    async fn change_directory(&mut self, path: &str) -> bool {
        let target = normalize_virtual_path(&self.current_dir, path);
        let inner = self.state.inner.lock().unwrap();
        let ok = target == "/" || inner.files.get(&target).is_some_and(|e| e.is_dir);
        drop(inner);
        if ok {
            self.current_dir = target;
        }
        ok
    }

    async fn resolve(&self, path: &str) -> Result<Box<dyn FileObject>, FsError> {
        let full = normalize_virtual_path(&self.current_dir, path);
        let mut inner = self.state.inner.lock().unwrap();
        inner.resolves.push(full.clone());
        let entry = inner.files.get(&full).cloned();
        drop(inner);
        Ok(Box::new(MockFile {
            path: full,
            entry,
            state: self.state.clone(),
        }))
    }

    async fn rename(&self, source: &dyn FileObject, target: &dyn FileObject) -> bool {
        let mut inner = self.state.inner.lock().unwrap();
        match inner.files.remove(source.full_name()) {
            Some(entry) => {
                inner.files.insert(target.full_name().to_string(), entry);
                true
            }
            None => false,
        }
    }
}

pub struct MockFile {
    path: String,
    entry: Option<MockEntry>,
    state: MockFsState,
}

#[async_trait]
impl FileObject for MockFile {
    fn full_name(&self) -> &str {
        &self.path
    }

    fn exists(&self) -> bool {
        self.entry.is_some()
    }

    fn is_directory(&self) -> bool {
        self.entry.as_ref().is_some_and(|e| e.is_dir)
    }

    fn is_file(&self) -> bool {
        self.entry.as_ref().is_some_and(|e| !e.is_dir)
    }

    fn can_read(&self) -> bool {
        self.exists()
    }

    fn can_write(&self) -> bool {
        true
    }

    fn can_delete(&self) -> bool {
        self.entry.as_ref().is_some_and(|e| e.can_delete)
    }

    fn can_rename(&self) -> bool {
        self.can_delete()
    }

    fn can_mkdir(&self) -> bool {
        self.entry.is_none()
    }

    fn size(&self) -> u64 {
        self.entry.as_ref().map(|e| e.size).unwrap_or(0)
    }

    fn modified(&self) -> Option<std::time::SystemTime> {
        self.entry.as_ref().map(|_| UNIX_EPOCH)
    }

    async fn delete(&self) -> bool {
        let succeeds = self
            .entry
            .as_ref()
            .is_some_and(|e| e.delete_succeeds);
        if succeeds {
            let mut inner = self.state.inner.lock().unwrap();
            inner.files.remove(&self.path);
            inner.deleted.push(self.path.clone());
        }
        succeeds
    }

    async fn mkdir(&self) -> bool {
        self.state.add(&self.path, MockEntry::dir());
        true
    }

    async fn set_modified(&self, _mtime: std::time::SystemTime) -> bool {
        self.exists()
    }

    async fn open_read(&self, _offset: u64) -> io::Result<Box<dyn AsyncRead + Send + Unpin>> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "mock filesystem has no content",
        ))
    }

    async fn open_write(&self, _offset: u64) -> io::Result<Box<dyn AsyncWrite + Send + Unpin>> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "mock filesystem has no content",
        ))
    }

    async fn list(&self) -> io::Result<Vec<DirEntryInfo>> {
        Ok(Vec::new())
    }
}

// ---------------------------------------------------------------------
// Recording hook

/// Hook that appends `name:phase:VERB` to a shared event log and returns
/// a configurable verdict per phase.
pub struct RecordingHook {
    name: &'static str,
    events: Arc<Mutex<Vec<String>>>,
    start_verdict: Mutex<Verdict>,
    end_verdict: Mutex<Verdict>,
}

impl RecordingHook {
    pub fn new(name: &'static str) -> Self {
        RecordingHook {
            name,
            events: Arc::new(Mutex::new(Vec::new())),
            start_verdict: Mutex::new(Verdict::Continue),
            end_verdict: Mutex::new(Verdict::Continue),
        }
    }

    pub fn events(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.events)
    }

    pub fn set_start_verdict(&self, verdict: Verdict) {
        *self.start_verdict.lock().unwrap() = verdict;
    }

    pub fn set_end_verdict(&self, verdict: Verdict) {
        *self.end_verdict.lock().unwrap() = verdict;
    }

    /// Rebinds this hook to an event log shared with other hooks, so one
    /// log shows the interleaving across the whole chain.
    pub fn share_events(mut self, events: &Arc<Mutex<Vec<String>>>) -> Self {
        self.events = Arc::clone(events);
        self
    }
}

#[async_trait]
impl PluginHook for RecordingHook {
    async fn on_command_start(
        &self,
        _session: &mut Session,
        request: &FtpRequest,
        _reply: &mut ReplyWriter,
    ) -> anyhow::Result<Verdict> {
        self.events
            .lock()
            .unwrap()
            .push(format!("{}:start:{}", self.name, request.verb()));
        Ok(*self.start_verdict.lock().unwrap())
    }

    async fn on_command_end(
        &self,
        _session: &mut Session,
        request: &FtpRequest,
        _reply: &mut ReplyWriter,
    ) -> anyhow::Result<Verdict> {
        self.events
            .lock()
            .unwrap()
            .push(format!("{}:end:{}", self.name, request.verb()));
        Ok(*self.end_verdict.lock().unwrap())
    }
}

// ---------------------------------------------------------------------
// Context, session and dispatch-loop fixtures

struct TestAuthenticator;

impl Authenticator for TestAuthenticator {
    fn authenticate(&self, user: &str, password: &str) -> bool {
        is_anonymous(user) || (user == "alice" && password == "secret")
    }
}

pub fn test_context() -> ServerContext {
    test_context_with(MockFsState::default(), PluginChain::new())
}

pub fn test_context_with(state: MockFsState, plugins: PluginChain) -> ServerContext {
    ServerContext {
        config: Arc::new(Config::default()),
        registry: initialize_command_handlers(),
        plugins,
        stats: Arc::new(FtpStatistics::new()),
        authenticator: Arc::new(TestAuthenticator),
        fs_factory: Arc::new(MockFileSystemFactory::new(state)),
        connections: ConnectionManager::new(4),
    }
}

pub fn test_session() -> Session {
    test_session_with(MockFsState::default())
}

pub fn test_session_with(state: MockFsState) -> Session {
    Session::new(
        1,
        "127.0.0.1:40000".parse().unwrap(),
        "127.0.0.1:2121".parse().unwrap(),
        Box::new(MockFileSystem {
            state,
            current_dir: String::from("/"),
        }),
        Duration::from_secs(1),
    )
}

/// A reply writer over an in-memory stream, plus the peer end to read the
/// written replies from.
pub fn reply_pipe() -> (ReplyWriter, DuplexStream) {
    let (client, server) = tokio::io::duplex(4096);
    (ReplyWriter::new(Box::new(server)), client)
}

/// Feeds a command script through the real dispatch loop over an in-memory
/// control connection and returns how the loop ended plus everything the
/// server wrote. The 220 greeting is not part of the output; the loop
/// starts after it.
pub async fn run_session(
    ctx: &ServerContext,
    session: &mut Session,
    script: &str,
) -> (SessionEnd, String) {
    let (client, server) = tokio::io::duplex(16 * 1024);
    let (server_read, server_write) = tokio::io::split(server);
    let (mut client_read, mut client_write) = tokio::io::split(client);
    let mut reader = BufReader::new(server_read);
    let mut reply = ReplyWriter::new(Box::new(server_write));
    let (_close_tx, mut close_rx) = watch::channel(false);

    client_write.write_all(script.as_bytes()).await.unwrap();
    client_write.shutdown().await.unwrap();

    let end = drive_session(&mut reader, &mut reply, session, ctx, &mut close_rx)
        .await
        .unwrap();

    drop(reader);
    drop(reply);
    let mut output = String::new();
    client_read.read_to_string(&mut output).await.unwrap();
    (end, output)
}
