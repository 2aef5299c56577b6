use log::warn;
use regex::Regex;

use crate::config::AuthConfig;
use crate::constants::USERNAME_REGEX;

/// Credential check at the USER/PASS boundary. The concrete store behind it
/// (config file, external database) is not this layer's business.
pub trait Authenticator: Send + Sync {
    fn authenticate(&self, user: &str, password: &str) -> bool;
}

/// Accepts the conventional anonymous account names with any password.
pub fn is_anonymous(user: &str) -> bool {
    user.eq_ignore_ascii_case("anonymous") || user.eq_ignore_ascii_case("ftp")
}

/// Rejects user names the server would not accept anywhere else either.
pub fn is_valid_username(user: &str) -> bool {
    Regex::new(USERNAME_REGEX)
        .map(|re| re.is_match(user))
        .unwrap_or(false)
}

/// Authenticator backed by the `[auth]` configuration section: optional
/// anonymous access plus named accounts with bcrypt password hashes.
pub struct ConfigAuthenticator {
    auth: AuthConfig,
}

impl ConfigAuthenticator {
    pub fn new(auth: AuthConfig) -> Self {
        ConfigAuthenticator { auth }
    }
}

impl Authenticator for ConfigAuthenticator {
    fn authenticate(&self, user: &str, password: &str) -> bool {
        if is_anonymous(user) {
            return self.auth.anonymous_enabled;
        }
        let Some(entry) = self.auth.users.iter().find(|u| u.name == user) else {
            return false;
        };
        match bcrypt::verify(password, &entry.password_hash) {
            Ok(matched) => matched,
            Err(err) => {
                warn!("Unusable password hash for user {}: {}", user, err);
                false
            }
        }
    }
}
