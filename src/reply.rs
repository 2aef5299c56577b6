use std::fmt;
use std::io;

use thiserror::Error;
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Three-digit FTP reply codes used by the command set.
pub mod code {
    pub const FILE_STATUS_OKAY: u16 = 150;
    pub const COMMAND_OKAY: u16 = 200;
    pub const COMMAND_SUPERFLUOUS: u16 = 202;
    pub const SYSTEM_STATUS: u16 = 211;
    pub const FILE_STATUS: u16 = 213;
    pub const SYSTEM_TYPE: u16 = 215;
    pub const SERVICE_READY: u16 = 220;
    pub const SERVICE_CLOSING: u16 = 221;
    pub const CLOSING_DATA_CONNECTION: u16 = 226;
    pub const ENTERING_PASSIVE_MODE: u16 = 227;
    pub const USER_LOGGED_IN: u16 = 230;
    pub const FILE_ACTION_OKAY: u16 = 250;
    pub const PATHNAME_CREATED: u16 = 257;
    pub const NEED_PASSWORD: u16 = 331;
    pub const FILE_ACTION_PENDING: u16 = 350;
    pub const SERVICE_NOT_AVAILABLE: u16 = 421;
    pub const CANT_OPEN_DATA_CONNECTION: u16 = 425;
    pub const TRANSFER_ABORTED: u16 = 426;
    pub const FILE_ACTION_NOT_TAKEN: u16 = 450;
    pub const COMMAND_UNRECOGNIZED: u16 = 500;
    pub const SYNTAX_ERROR_IN_ARGUMENTS: u16 = 501;
    pub const COMMAND_NOT_IMPLEMENTED: u16 = 502;
    pub const BAD_COMMAND_SEQUENCE: u16 = 503;
    pub const PARAMETER_NOT_IMPLEMENTED: u16 = 504;
    pub const NOT_LOGGED_IN: u16 = 530;
    pub const FILE_UNAVAILABLE: u16 = 550;
}

#[derive(Error, Debug)]
pub enum ReplyParseError {
    #[error("reply line is shorter than the three-digit code")]
    TooShort,
    #[error("invalid reply code: {0:?}")]
    InvalidCode(String),
}

/// One FTP control-channel reply: a three-digit status code plus a
/// human-readable message. The message may contain `\n` separators, in
/// which case the codec renders RFC 959 multi-line framing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    code: u16,
    text: String,
}

impl Reply {
    pub fn new(code: u16, text: impl Into<String>) -> Self {
        Reply {
            code,
            text: text.into(),
        }
    }

    pub fn code(&self) -> u16 {
        self.code
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// 220 greeting written when a session opens.
    pub fn service_ready(message: &str) -> Self {
        Reply::new(code::SERVICE_READY, message)
    }

    /// 500 for a line that could not be tokenized into verb and argument.
    pub fn unrecognized() -> Self {
        Reply::new(code::COMMAND_UNRECOGNIZED, "Syntax error, command unrecognized.")
    }

    /// 501 for a missing or malformed argument.
    pub fn syntax_error() -> Self {
        Reply::new(
            code::SYNTAX_ERROR_IN_ARGUMENTS,
            "Syntax error in parameters or arguments.",
        )
    }

    /// 502 for a verb with no registered handler.
    pub fn not_implemented(verb: &str) -> Self {
        Reply::new(
            code::COMMAND_NOT_IMPLEMENTED,
            format!("Command {} not implemented.", verb),
        )
    }

    /// 530 for commands issued before login completes.
    pub fn not_logged_in() -> Self {
        Reply::new(code::NOT_LOGGED_IN, "Not logged in.")
    }

    /// 450 transient failure, naming the resource when one is known.
    pub fn action_not_taken(target: Option<&str>) -> Self {
        match target {
            Some(name) if !name.is_empty() => Reply::new(
                code::FILE_ACTION_NOT_TAKEN,
                format!("{}: requested file action not taken.", name),
            ),
            _ => Reply::new(code::FILE_ACTION_NOT_TAKEN, "Requested file action not taken."),
        }
    }

    /// 550 for a path that did not resolve to a usable resource.
    pub fn file_unavailable(target: &str) -> Self {
        Reply::new(
            code::FILE_UNAVAILABLE,
            format!("{}: no such file or directory.", target),
        )
    }

    /// 250 success reply for completed file actions.
    pub fn file_action_okay(text: impl Into<String>) -> Self {
        Reply::new(code::FILE_ACTION_OKAY, text)
    }

    /// 503 for a command issued out of sequence (PASS before USER, RNTO
    /// before RNFR).
    pub fn bad_sequence(text: impl Into<String>) -> Self {
        Reply::new(code::BAD_COMMAND_SEQUENCE, text)
    }

    /// 425 for a data channel that could not be established.
    pub fn cant_open_data_connection() -> Self {
        Reply::new(code::CANT_OPEN_DATA_CONNECTION, "Can't open data connection.")
    }

    /// Renders the reply in control-connection wire format, CRLF terminated.
    /// Multi-line messages use `code-first` / `code last` continuation
    /// framing with the middle lines passed through verbatim.
    pub fn encode(&self) -> String {
        let lines: Vec<&str> = self.text.split('\n').collect();
        if lines.len() == 1 {
            return format!("{:03} {}\r\n", self.code, self.text);
        }
        let mut out = format!("{:03}-{}\r\n", self.code, lines[0]);
        for middle in &lines[1..lines.len() - 1] {
            out.push_str(middle);
            out.push_str("\r\n");
        }
        out.push_str(&format!("{:03} {}\r\n", self.code, lines[lines.len() - 1]));
        out
    }

    /// Parses a single reply line (`CODE SP MESSAGE`) back into a Reply.
    pub fn parse(line: &str) -> Result<Self, ReplyParseError> {
        let line = line.trim_end_matches(['\r', '\n']);
        if line.len() < 3 {
            return Err(ReplyParseError::TooShort);
        }
        let (code_str, rest) = line.split_at(3);
        let code: u16 = code_str
            .parse()
            .map_err(|_| ReplyParseError::InvalidCode(code_str.to_string()))?;
        if !(100..=599).contains(&code) {
            return Err(ReplyParseError::InvalidCode(code_str.to_string()));
        }
        Ok(Reply::new(code, rest.strip_prefix(' ').unwrap_or(rest)))
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:03} {}", self.code, self.text)
    }
}

/// Writes replies to the control connection. The sink is type-erased so the
/// dispatch loop and the tests can run over plain TCP halves or in-memory
/// duplex streams alike.
pub struct ReplyWriter {
    sink: Box<dyn AsyncWrite + Send + Unpin>,
}

impl ReplyWriter {
    pub fn new(sink: Box<dyn AsyncWrite + Send + Unpin>) -> Self {
        ReplyWriter { sink }
    }

    pub async fn send(&mut self, reply: Reply) -> io::Result<()> {
        self.sink.write_all(reply.encode().as_bytes()).await?;
        self.sink.flush().await
    }
}
