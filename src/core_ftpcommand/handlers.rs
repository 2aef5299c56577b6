use std::collections::HashMap;
use std::io;

use async_trait::async_trait;

use crate::core_ftpcommand::ftpcommand::FtpRequest;
use crate::reply::ReplyWriter;
use crate::server::ServerContext;
use crate::session::Session;

// The two connection-negotiation verbs live with the rest of the
// networking code.
use crate::core_network::{pasv, port};

/// What a handler's execution amounted to, as seen by the dispatch loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// The operation completed; the success reply was written and the
    /// post-hook chain runs.
    Success,
    /// A normal unsuccessful outcome (450/550-class reply already written).
    /// The session continues; the post-hook chain does not run.
    Failure,
    /// QUIT: the 221 reply was written and the session ends gracefully.
    Quit,
    /// The connection must be closed with nothing further written.
    Disconnect,
}

/// One FTP verb. Handlers are stateless unit structs built once at server
/// start; all per-command state lives in the session and the request. The
/// dispatch loop enforces `requires_login` and `requires_argument` before
/// any hook runs, so handler bodies can assume both.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    fn requires_argument(&self) -> bool {
        false
    }

    /// Verbs usable before login: USER, PASS, QUIT, NOOP, SYST, FEAT.
    fn requires_login(&self) -> bool {
        true
    }

    async fn execute(
        &self,
        ctx: &ServerContext,
        session: &mut Session,
        request: &FtpRequest,
        reply: &mut ReplyWriter,
    ) -> io::Result<CommandOutcome>;
}

/// Case-insensitive verb-to-handler map. Built once at startup, read-only
/// afterwards, shared by every session without locking.
pub struct CommandRegistry {
    handlers: HashMap<&'static str, Box<dyn CommandHandler>>,
}

impl CommandRegistry {
    pub fn lookup(&self, verb: &str) -> Option<&dyn CommandHandler> {
        self.handlers
            .get(verb.to_ascii_uppercase().as_str())
            .map(|handler| handler.as_ref())
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }
}

pub fn initialize_command_handlers() -> CommandRegistry {
    let mut handlers: HashMap<&'static str, Box<dyn CommandHandler>> = HashMap::new();

    handlers.insert("USER", Box::new(crate::core_ftpcommand::user::UserHandler));
    handlers.insert("PASS", Box::new(crate::core_ftpcommand::pass::PassHandler));
    handlers.insert("QUIT", Box::new(crate::core_ftpcommand::quit::QuitHandler));
    handlers.insert("NOOP", Box::new(crate::core_ftpcommand::noop::NoopHandler));
    handlers.insert("SYST", Box::new(crate::core_ftpcommand::syst::SystHandler));
    handlers.insert("FEAT", Box::new(crate::core_ftpcommand::feat::FeatHandler));
    handlers.insert("TYPE", Box::new(crate::core_ftpcommand::type_::TypeHandler));
    handlers.insert("PWD", Box::new(crate::core_ftpcommand::pwd::PwdHandler));
    handlers.insert("CWD", Box::new(crate::core_ftpcommand::cwd::CwdHandler));
    handlers.insert("CDUP", Box::new(crate::core_ftpcommand::cdup::CdupHandler));
    handlers.insert("MKD", Box::new(crate::core_ftpcommand::mkd::MkdHandler));
    handlers.insert("RMD", Box::new(crate::core_ftpcommand::rmd::RmdHandler));
    handlers.insert("DELE", Box::new(crate::core_ftpcommand::dele::DeleHandler));
    handlers.insert("RNFR", Box::new(crate::core_ftpcommand::rnfr::RnfrHandler));
    handlers.insert("RNTO", Box::new(crate::core_ftpcommand::rnto::RntoHandler));
    handlers.insert("SIZE", Box::new(crate::core_ftpcommand::size::SizeHandler));
    handlers.insert("MDTM", Box::new(crate::core_ftpcommand::mdtm::MdtmHandler));
    handlers.insert("REST", Box::new(crate::core_ftpcommand::rest::RestHandler));
    handlers.insert("ALLO", Box::new(crate::core_ftpcommand::allo::AlloHandler));
    handlers.insert("PASV", Box::new(pasv::PasvHandler));
    handlers.insert("PORT", Box::new(port::PortHandler));
    handlers.insert("RETR", Box::new(crate::core_ftpcommand::retr::RetrHandler));
    handlers.insert("STOR", Box::new(crate::core_ftpcommand::stor::StorHandler));
    handlers.insert("LIST", Box::new(crate::core_ftpcommand::list::ListHandler));
    handlers.insert("NLST", Box::new(crate::core_ftpcommand::list::NlstHandler));

    CommandRegistry { handlers }
}
