use async_trait::async_trait;
use log::warn;

use crate::core_ftpcommand::ftpcommand::FtpRequest;
use crate::reply::ReplyWriter;
use crate::session::Session;

/// Outcome of one hook invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Proceed with normal command processing.
    Continue,
    /// Abort this command with a "not taken" reply; the handler never runs.
    Skip,
    /// Abort this command and force-close the connection, with no reply.
    Disconnect,
}

/// Interception point run before and after every command. Implementations
/// are registered once at startup and invoked, in order, for every command
/// of every session; the request carries the verb. Hooks may write replies
/// of their own through the reply writer.
///
/// A hook that returns an error is treated exactly like a `Disconnect`
/// verdict: a defective plugin can cost the client its connection but can
/// never crash the server or corrupt another session.
#[async_trait]
pub trait PluginHook: Send + Sync {
    async fn on_command_start(
        &self,
        session: &mut Session,
        request: &FtpRequest,
        reply: &mut ReplyWriter,
    ) -> anyhow::Result<Verdict> {
        let _ = (session, request, reply);
        Ok(Verdict::Continue)
    }

    async fn on_command_end(
        &self,
        session: &mut Session,
        request: &FtpRequest,
        reply: &mut ReplyWriter,
    ) -> anyhow::Result<Verdict> {
        let _ = (session, request, reply);
        Ok(Verdict::Continue)
    }
}

/// Ordered hook list shared read-only by all sessions. The chain's verdict
/// is the first non-Continue verdict; later hooks are not invoked for that
/// phase. An empty chain always yields Continue.
#[derive(Default)]
pub struct PluginChain {
    hooks: Vec<Box<dyn PluginHook>>,
}

impl PluginChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, hook: Box<dyn PluginHook>) {
        self.hooks.push(hook);
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    pub async fn on_command_start(
        &self,
        session: &mut Session,
        request: &FtpRequest,
        reply: &mut ReplyWriter,
    ) -> Verdict {
        for (index, hook) in self.hooks.iter().enumerate() {
            match hook.on_command_start(session, request, reply).await {
                Ok(Verdict::Continue) => {}
                Ok(verdict) => return verdict,
                Err(err) => {
                    warn!(
                        "plugin hook {} failed in {} pre-hook: {:#}",
                        index,
                        request.verb(),
                        err
                    );
                    return Verdict::Disconnect;
                }
            }
        }
        Verdict::Continue
    }

    pub async fn on_command_end(
        &self,
        session: &mut Session,
        request: &FtpRequest,
        reply: &mut ReplyWriter,
    ) -> Verdict {
        for (index, hook) in self.hooks.iter().enumerate() {
            match hook.on_command_end(session, request, reply).await {
                Ok(Verdict::Continue) => {}
                Ok(verdict) => return verdict,
                Err(err) => {
                    warn!(
                        "plugin hook {} failed in {} post-hook: {:#}",
                        index,
                        request.verb(),
                        err
                    );
                    return Verdict::Disconnect;
                }
            }
        }
        Verdict::Continue
    }
}
