//! Request-scoped logging.
//!
//! Handlers log through the helpers in this module with their [`Scope`]. Each
//! line gets the `seq` number of the request's message so interleaved lines of
//! one request can be told apart, plus the trace and request ids when set. The
//! message's own [`Logger`] is used when present, [`TracingLogger`] otherwise.
//!
//! Logging from inside [`MsgHandle::with`](crate::context::MsgHandle::with)
//! for the same message still emits the line, through [`TracingLogger`] and
//! without `seq` or ids.

use crate::context::{Scope, message};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Str(String),
    U64(u64),
    I64(i64),
    Bool(bool),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Str(s) => f.write_str(s),
            FieldValue::U64(v) => write!(f, "{v}"),
            FieldValue::I64(v) => write!(f, "{v}"),
            FieldValue::Bool(v) => write!(f, "{v}"),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Str(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Str(v)
    }
}

impl From<u64> for FieldValue {
    fn from(v: u64) -> Self {
        FieldValue::U64(v)
    }
}

impl From<u32> for FieldValue {
    fn from(v: u32) -> Self {
        FieldValue::U64(u64::from(v))
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::I64(v)
    }
}

impl From<i32> for FieldValue {
    fn from(v: i32) -> Self {
        FieldValue::I64(i64::from(v))
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Bool(v)
    }
}

/// Structured key/value attached to a log line.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub key: &'static str,
    pub value: FieldValue,
}

impl Field {
    pub fn new(key: &'static str, value: impl Into<FieldValue>) -> Self {
        Self {
            key,
            value: value.into(),
        }
    }
}

/// Sink for request log lines.
///
/// `fatal` records at the highest severity; it never terminates the process.
pub trait Logger: Send + Sync {
    fn debug(&self, msg: &str, fields: &[Field]);
    fn info(&self, msg: &str, fields: &[Field]);
    fn warn(&self, msg: &str, fields: &[Field]);
    fn error(&self, msg: &str, fields: &[Field]);
    fn fatal(&self, msg: &str, fields: &[Field]);
}

/// [`Logger`] that forwards to `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

fn render(fields: &[Field]) -> String {
    fields
        .iter()
        .map(|f| format!("{}={}", f.key, f.value))
        .collect::<Vec<_>>()
        .join(" ")
}

impl Logger for TracingLogger {
    fn debug(&self, msg: &str, fields: &[Field]) {
        tracing::debug!(fields = %render(fields), "{}", msg);
    }

    fn info(&self, msg: &str, fields: &[Field]) {
        tracing::info!(fields = %render(fields), "{}", msg);
    }

    fn warn(&self, msg: &str, fields: &[Field]) {
        tracing::warn!(fields = %render(fields), "{}", msg);
    }

    fn error(&self, msg: &str, fields: &[Field]) {
        tracing::error!(fields = %render(fields), "{}", msg);
    }

    fn fatal(&self, msg: &str, fields: &[Field]) {
        tracing::error!(fatal = true, fields = %render(fields), "{}", msg);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Level {
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
}

fn emit(scope: &Scope, level: Level, extra: &[Field], msg: &str) {
    let handle = message(scope);

    // The message is released before calling into the logger.
    let (logger, fields) = handle
        .try_with(|m| {
            let mut fields = extra.to_vec();
            fields.push(Field::new("seq", m.next_seq()));
            if !m.trace_id().is_empty() {
                fields.push(Field::new("trace_id", m.trace_id()));
            }
            if m.request_id() != 0 {
                fields.push(Field::new("request_id", m.request_id()));
            }
            (m.logger().cloned(), fields)
        })
        .unwrap_or_else(|| (None, extra.to_vec()));

    let logger = logger.unwrap_or_else(|| Arc::new(TracingLogger) as Arc<dyn Logger>);

    match level {
        Level::Debug => logger.debug(msg, &fields),
        Level::Info => logger.info(msg, &fields),
        Level::Warn => logger.warn(msg, &fields),
        Level::Error => logger.error(msg, &fields),
        Level::Fatal => logger.fatal(msg, &fields),
    }
}

pub fn debug(scope: &Scope, msg: &str) {
    emit(scope, Level::Debug, &[], msg);
}

pub fn info(scope: &Scope, msg: &str) {
    emit(scope, Level::Info, &[], msg);
}

pub fn warn(scope: &Scope, msg: &str) {
    emit(scope, Level::Warn, &[], msg);
}

/// Logs an error line tagged with an error `code` from [`crate::errs`].
pub fn error(scope: &Scope, code: i32, msg: &str) {
    emit(scope, Level::Error, &[Field::new("code", code)], msg);
}

pub fn fatal(scope: &Scope, msg: &str) {
    emit(scope, Level::Fatal, &[], msg);
}

pub fn debug_with(scope: &Scope, fields: &[Field], msg: &str) {
    emit(scope, Level::Debug, fields, msg);
}

pub fn info_with(scope: &Scope, fields: &[Field], msg: &str) {
    emit(scope, Level::Info, fields, msg);
}

pub fn warn_with(scope: &Scope, fields: &[Field], msg: &str) {
    emit(scope, Level::Warn, fields, msg);
}

pub fn error_with(scope: &Scope, code: i32, fields: &[Field], msg: &str) {
    let mut all = fields.to_vec();
    all.push(Field::new("code", code));
    emit(scope, Level::Error, &all, msg);
}
