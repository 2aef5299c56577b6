use thiserror::Error;

/// Failure to tokenize a control-connection line into verb and argument.
/// The dispatch loop answers these with a 500 reply and keeps the session
/// alive; a malformed line never terminates the connection by itself.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ProtocolSyntaxError {
    #[error("empty command line")]
    EmptyLine,
    #[error("invalid command verb: {0:?}")]
    InvalidVerb(String),
}

/// One parsed FTP command: the uppercased verb token and the rest of the
/// line as a single optional argument. No structured sub-parsing happens at
/// this layer; verb-specific argument formats (PORT host-port strings,
/// MDTM timestamps) are the handler's business.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FtpRequest {
    verb: String,
    argument: Option<String>,
}

impl FtpRequest {
    /// Tokenizes one control-connection line. Verbs are 3 or 4 ASCII
    /// letters, matched case-insensitively per FTP convention.
    pub fn parse(line: &str) -> Result<Self, ProtocolSyntaxError> {
        let trimmed = line.trim_end_matches(['\r', '\n']).trim();
        if trimmed.is_empty() {
            return Err(ProtocolSyntaxError::EmptyLine);
        }

        let (verb_token, rest) = match trimmed.split_once(' ') {
            Some((verb, rest)) => (verb, Some(rest)),
            None => (trimmed, None),
        };

        if !(3..=4).contains(&verb_token.len())
            || !verb_token.bytes().all(|b| b.is_ascii_alphabetic())
        {
            return Err(ProtocolSyntaxError::InvalidVerb(verb_token.to_string()));
        }

        let argument = rest
            .map(str::trim)
            .filter(|rest| !rest.is_empty())
            .map(str::to_string);

        Ok(FtpRequest {
            verb: verb_token.to_ascii_uppercase(),
            argument,
        })
    }

    pub fn verb(&self) -> &str {
        &self.verb
    }

    pub fn argument(&self) -> Option<&str> {
        self.argument.as_deref()
    }

    pub fn has_argument(&self) -> bool {
        self.argument.is_some()
    }

    /// Rendering for the session log. PASS arguments are masked so
    /// passwords never land in log files.
    pub fn to_loggable(&self) -> String {
        match (self.verb.as_str(), &self.argument) {
            ("PASS", Some(_)) => "PASS ****".to_string(),
            (_, Some(argument)) => format!("{} {}", self.verb, argument),
            (_, None) => self.verb.clone(),
        }
    }
}
