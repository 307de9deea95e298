use horm_codec::context::{MsgPool, Scope};
use horm_codec::errs::ERR_SERVER_TIMEOUT;
use horm_codec::log::{self, Field, FieldValue, Logger};
use std::sync::{Arc, Mutex, mpsc};
use std::time::Duration;

#[derive(Default)]
struct CaptureLogger {
    lines: Mutex<Vec<(&'static str, String, Vec<Field>)>>,
}

impl CaptureLogger {
    fn push(&self, level: &'static str, msg: &str, fields: &[Field]) {
        self.lines
            .lock()
            .expect("lock")
            .push((level, msg.to_string(), fields.to_vec()));
    }

    fn field(&self, line: usize, key: &str) -> Option<FieldValue> {
        let lines = self.lines.lock().expect("lock");
        lines[line]
            .2
            .iter()
            .find(|f| f.key == key)
            .map(|f| f.value.clone())
    }
}

impl Logger for CaptureLogger {
    fn debug(&self, msg: &str, fields: &[Field]) {
        self.push("debug", msg, fields);
    }
    fn info(&self, msg: &str, fields: &[Field]) {
        self.push("info", msg, fields);
    }
    fn warn(&self, msg: &str, fields: &[Field]) {
        self.push("warn", msg, fields);
    }
    fn error(&self, msg: &str, fields: &[Field]) {
        self.push("error", msg, fields);
    }
    fn fatal(&self, msg: &str, fields: &[Field]) {
        self.push("fatal", msg, fields);
    }
}

#[test]
fn test_lines_carry_seq_and_ids_of_the_request() {
    let pool = MsgPool::new();
    let capture = Arc::new(CaptureLogger::default());
    let (scope, msg) = pool.acquire(&Scope::background());
    msg.with(|m| {
        m.set_logger(Some(capture.clone() as Arc<dyn Logger>));
        m.set_trace_id("trace-7");
        m.set_request_id(7);
    });

    log::info(&scope, "first");
    log::debug_with(&scope, &[Field::new("unit", "user")], "second");
    log::error(&scope, ERR_SERVER_TIMEOUT, "third");

    {
        let lines = capture.lines.lock().expect("lock");
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].0, "info");
        assert_eq!(lines[1].0, "debug");
        assert_eq!(lines[2].0, "error");
        assert_eq!(lines[2].1, "third");
    }

    assert_eq!(capture.field(0, "seq"), Some(FieldValue::U64(1)));
    assert_eq!(capture.field(1, "seq"), Some(FieldValue::U64(2)));
    assert_eq!(capture.field(2, "seq"), Some(FieldValue::U64(3)));
    assert_eq!(
        capture.field(0, "trace_id"),
        Some(FieldValue::Str("trace-7".into()))
    );
    assert_eq!(capture.field(0, "request_id"), Some(FieldValue::U64(7)));
    assert_eq!(capture.field(1, "unit"), Some(FieldValue::Str("user".into())));
    assert_eq!(
        capture.field(2, "code"),
        Some(FieldValue::I64(i64::from(ERR_SERVER_TIMEOUT)))
    );

    pool.release(msg);
}

#[test]
fn test_logging_outside_a_request_uses_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::TRACE)
        .try_init();

    let scope = Scope::background();
    log::info(&scope, "no request attached");
    log::warn_with(&scope, &[Field::new("retry", true)], "still fine");
    log::fatal(&scope, "does not exit");
}

#[test]
fn test_ids_are_omitted_when_unset() {
    let pool = MsgPool::new();
    let capture = Arc::new(CaptureLogger::default());
    let (scope, msg) = pool.acquire(&Scope::background());
    msg.with(|m| m.set_logger(Some(capture.clone() as Arc<dyn Logger>)));

    log::warn(&scope, "bare");

    assert_eq!(capture.field(0, "seq"), Some(FieldValue::U64(1)));
    assert_eq!(capture.field(0, "trace_id"), None);
    assert_eq!(capture.field(0, "request_id"), None);

    pool.release(msg);
}

#[test]
fn test_logging_while_handler_holds_msg() {
    let (tx, rx) = mpsc::channel();

    std::thread::spawn(move || {
        let pool = MsgPool::new();
        let capture = Arc::new(CaptureLogger::default());
        let (scope, msg) = pool.acquire(&Scope::background());

        msg.with(|m| {
            m.set_logger(Some(capture.clone() as Arc<dyn Logger>));
            m.set_trace_id("t");
            log::info(&scope, "handler line");
        });
        log::info(&scope, "after handler");

        let lines = capture.lines.lock().expect("lock").len();
        pool.release(msg);
        tx.send((lines, capture.field(0, "seq"))).expect("send");
    });

    let (lines, seq) = rx
        .recv_timeout(Duration::from_secs(3))
        .expect("log::info hung while the handler held the msg");
    // The line logged inside `with` went to tracing, the one after to the
    // message's own logger with the first seq.
    assert_eq!(lines, 1);
    assert_eq!(seq, Some(FieldValue::U64(1)));
}
