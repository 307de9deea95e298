//! Error codes shared by clients and servers of the middleware.
//!
//! Codes are language independent; only the ones the request path reports are
//! listed here.

use std::error::Error as StdError;
use std::fmt;

pub const SUCCESS: i32 = 0;
pub const ERR_SYSTEM: i32 = 1;
pub const ERR_PANIC: i32 = 8888;
pub const ERR_UNKNOWN: i32 = 9999;

// client side
pub const ERR_CLIENT_READ_FRAME: i32 = 11;
pub const ERR_CLIENT_TIMEOUT: i32 = 12;
pub const ERR_CLIENT_CONNECT: i32 = 13;
pub const ERR_CLIENT_ENCODE: i32 = 14;
pub const ERR_CLIENT_DECODE: i32 = 15;
pub const ERR_CLIENT_ROUTE: i32 = 16;
pub const ERR_CLIENT_NET: i32 = 17;
pub const ERR_CLIENT_CANCELED: i32 = 18;
pub const ERR_CLIENT_NOT_INIT: i32 = 19;

// server side
pub const ERR_SERVER_READ_FRAME: i32 = 101;
pub const ERR_SERVER_DECOMPRESS: i32 = 102;
pub const ERR_SERVER_DECODE: i32 = 103;
pub const ERR_SERVER_ENCODE: i32 = 104;
pub const ERR_SERVER_NO_SERVICE: i32 = 105;
pub const ERR_SERVER_NO_FUNC: i32 = 106;
pub const ERR_SERVER_TIMEOUT: i32 = 107;
pub const ERR_SERVER_OVERLOAD: i32 = 108;

pub const ERR_AUTH_FAIL: i32 = 401;

#[repr(i8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorType {
    #[default]
    System = 0,
    Plugin = 1,
    Database = 2,
}

impl ErrorType {
    pub fn desc(self) -> &'static str {
        match self {
            ErrorType::System => "system",
            ErrorType::Plugin => "plugin",
            ErrorType::Database => "database",
        }
    }
}

/// Typed error returned to callers over the wire.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Error {
    pub etype: ErrorType,
    pub code: i32,
    pub msg: String,
    /// Statement that was executing when the error occurred, if any.
    pub sql: String,
}

impl Error {
    /// Creates a system error.
    pub fn new(code: i32, msg: impl Into<String>) -> Self {
        Self {
            etype: ErrorType::System,
            code,
            msg: msg.into(),
            sql: String::new(),
        }
    }

    pub fn database(code: i32, msg: impl Into<String>) -> Self {
        Self {
            etype: ErrorType::Database,
            ..Self::new(code, msg)
        }
    }

    /// Converts any error into an [`Error`]. Foreign errors become
    /// `system / ERR_UNKNOWN` with their display text as message.
    pub fn from_dyn(err: &(dyn StdError + Send + Sync + 'static)) -> Self {
        match err.downcast_ref::<Error>() {
            Some(e) => e.clone(),
            None => Self::new(ERR_UNKNOWN, err.to_string()),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "type:{}, code:{}, msg:{}",
            self.etype.desc(),
            self.code,
            self.msg
        )?;
        if !self.sql.is_empty() {
            write!(f, ", sql=[{}]", self.sql)?;
        }
        Ok(())
    }
}

impl StdError for Error {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_sql_only_when_set() {
        let mut err = Error::database(510, "syntax error");
        assert_eq!(err.to_string(), "type:database, code:510, msg:syntax error");

        err.sql = "SELECT 1".into();
        assert_eq!(
            err.to_string(),
            "type:database, code:510, msg:syntax error, sql=[SELECT 1]"
        );
    }

    #[test]
    fn foreign_errors_map_to_unknown() {
        let io = std::io::Error::other("disk gone");
        let err = Error::from_dyn(&io);
        assert_eq!(err.etype, ErrorType::System);
        assert_eq!(err.code, ERR_UNKNOWN);
        assert_eq!(err.msg, "disk gone");
    }
}
