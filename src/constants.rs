// src/constants.rs

pub const USERNAME_REGEX: &str = r"^[a-zA-Z0-9]{1,32}$";

/// Login attempts allowed before the control connection is closed with 421.
pub const MAX_LOGIN_FAILURES: u32 = 3;
