use crate::constants::MAX_LOG_SEQ;
use crate::context::{Scope, WeakScope};
use crate::errs;
use crate::log::Logger;
use std::any::Any;
use std::error::Error as StdError;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// Opaque protocol head (request or response package head) stored on a [`Msg`].
pub type Head = Arc<dyn Any + Send + Sync>;

/// Error stored in the server and client response slots.
pub type SharedError = Arc<dyn StdError + Send + Sync>;

/// Per-request metadata.
///
/// A `Msg` is owned by the task currently handling its request. It is handed
/// out by a [`MsgPool`](crate::context::MsgPool) and returned there once all
/// work referencing it has finished.
///
/// The scope back-reference is weak: the scope owns its message, never the
/// other way round.
#[derive(Default)]
pub struct Msg {
    scope: WeakScope,
    frame_codec: Option<Head>,
    request_timeout: Duration,
    serialization_type: i32,
    caller_service_name: String,
    caller_method: String,
    callee_service_name: String,
    callee_method: String,
    call_rpc_name: String,
    server_resp_error: Option<SharedError>,
    client_resp_error: Option<SharedError>,
    server_req_head: Option<Head>,
    server_resp_head: Option<Head>,
    client_req_head: Option<Head>,
    client_resp_head: Option<Head>,
    local_addr: Option<SocketAddr>,
    remote_addr: Option<SocketAddr>,
    logger: Option<Arc<dyn Logger>>,
    log_seq: u32,
    env: String,
    request_id: u64,
    span_id: u64,
    trace_id: String,
}

impl Msg {
    /// A message that belongs to no pool and only knows its scope.
    pub fn with_scope(scope: &Scope) -> Self {
        Self {
            scope: scope.downgrade(),
            ..Self::default()
        }
    }

    /// Zeroes every field, including the scope back-reference.
    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }

    pub(crate) fn set_scope(&mut self, scope: &Scope) {
        self.scope = scope.downgrade();
    }

    /// Scope this message is attached to. `None` once the message was
    /// released or the scope was dropped.
    pub fn scope(&self) -> Option<Scope> {
        self.scope.upgrade()
    }

    /// Copies every observable attribute of `src` into `self`.
    ///
    /// The scope back-reference of `self` is left untouched.
    pub fn copy_from(&mut self, src: &Msg) {
        self.frame_codec = src.frame_codec.clone();
        self.request_timeout = src.request_timeout;
        self.serialization_type = src.serialization_type;
        self.caller_service_name = src.caller_service_name.clone();
        self.caller_method = src.caller_method.clone();
        self.callee_service_name = src.callee_service_name.clone();
        self.callee_method = src.callee_method.clone();
        self.call_rpc_name = src.call_rpc_name.clone();
        self.server_resp_error = src.server_resp_error.clone();
        self.client_resp_error = src.client_resp_error.clone();
        self.server_req_head = src.server_req_head.clone();
        self.server_resp_head = src.server_resp_head.clone();
        self.client_req_head = src.client_req_head.clone();
        self.client_resp_head = src.client_resp_head.clone();
        self.local_addr = src.local_addr;
        self.remote_addr = src.remote_addr;
        self.logger = src.logger.clone();
        self.log_seq = src.log_seq;
        self.env = src.env.clone();
        self.request_id = src.request_id;
        self.span_id = src.span_id;
        self.trace_id = src.trace_id.clone();
    }

    fn snapshot(&self) -> Msg {
        let mut copy = Msg::default();
        copy.copy_from(self);
        copy
    }

    /// Next log line number for this request, starting at 1 and wrapping back
    /// to 1 after 999,999,999. Only meaningful within one message.
    pub fn next_seq(&mut self) -> u32 {
        self.log_seq += 1;
        if self.log_seq > MAX_LOG_SEQ {
            self.log_seq = 1;
        }
        self.log_seq
    }

    /// Last value returned by [`Msg::next_seq`], 0 if it was never called.
    pub fn log_seq(&self) -> u32 {
        self.log_seq
    }

    pub fn env(&self) -> &str {
        &self.env
    }

    pub fn set_env(&mut self, env: impl Into<String>) {
        self.env = env.into();
    }

    pub fn remote_addr(&self) -> Option<SocketAddr> {
        self.remote_addr
    }

    pub fn set_remote_addr(&mut self, addr: Option<SocketAddr>) {
        self.remote_addr = addr;
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    pub fn set_local_addr(&mut self, addr: Option<SocketAddr>) {
        self.local_addr = addr;
    }

    /// Timeout requested by the upstream protocol.
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    pub fn set_request_timeout(&mut self, timeout: Duration) {
        self.request_timeout = timeout;
    }

    pub fn frame_codec(&self) -> Option<&Head> {
        self.frame_codec.as_ref()
    }

    pub fn set_frame_codec(&mut self, codec: Option<Head>) {
        self.frame_codec = codec;
    }

    pub fn serialization_type(&self) -> i32 {
        self.serialization_type
    }

    pub fn set_serialization_type(&mut self, serialization_type: i32) {
        self.serialization_type = serialization_type;
    }

    pub fn caller_service_name(&self) -> &str {
        &self.caller_service_name
    }

    pub fn set_caller_service_name(&mut self, name: impl Into<String>) {
        self.caller_service_name = name.into();
    }

    pub fn caller_method(&self) -> &str {
        &self.caller_method
    }

    pub fn set_caller_method(&mut self, method: impl Into<String>) {
        self.caller_method = method.into();
    }

    pub fn callee_service_name(&self) -> &str {
        &self.callee_service_name
    }

    pub fn set_callee_service_name(&mut self, name: impl Into<String>) {
        self.callee_service_name = name.into();
    }

    pub fn callee_method(&self) -> &str {
        &self.callee_method
    }

    pub fn set_callee_method(&mut self, method: impl Into<String>) {
        self.callee_method = method.into();
    }

    pub fn call_rpc_name(&self) -> &str {
        &self.call_rpc_name
    }

    /// Sets the combined `service/method` name.
    ///
    /// The part before the first `/` becomes the callee service name and the
    /// rest the callee method. Without a `/` the whole name is the service and
    /// the method is cleared.
    pub fn set_call_rpc_name(&mut self, name: &str) {
        if self.call_rpc_name == name {
            return;
        }

        self.call_rpc_name = name.to_string();

        match name.split_once('/') {
            Some((service, method)) => {
                self.callee_service_name = service.to_string();
                self.callee_method = method.to_string();
            }
            None => {
                self.callee_service_name = name.to_string();
                self.callee_method.clear();
            }
        }
    }

    /// Server response error as a typed error. Errors of other types are
    /// reported as `system / ERR_UNKNOWN`.
    pub fn server_resp_error(&self) -> Option<errs::Error> {
        self.server_resp_error
            .as_deref()
            .map(errs::Error::from_dyn)
    }

    pub fn set_server_resp_error(&mut self, err: Option<SharedError>) {
        self.server_resp_error = err;
    }

    /// Error received when this request called downstream.
    pub fn client_resp_error(&self) -> Option<&SharedError> {
        self.client_resp_error.as_ref()
    }

    pub fn set_client_resp_error(&mut self, err: Option<SharedError>) {
        self.client_resp_error = err;
    }

    pub fn server_req_head(&self) -> Option<&Head> {
        self.server_req_head.as_ref()
    }

    pub fn set_server_req_head(&mut self, head: Option<Head>) {
        self.server_req_head = head;
    }

    pub fn server_resp_head(&self) -> Option<&Head> {
        self.server_resp_head.as_ref()
    }

    pub fn set_server_resp_head(&mut self, head: Option<Head>) {
        self.server_resp_head = head;
    }

    pub fn client_req_head(&self) -> Option<&Head> {
        self.client_req_head.as_ref()
    }

    pub fn set_client_req_head(&mut self, head: Option<Head>) {
        self.client_req_head = head;
    }

    pub fn client_resp_head(&self) -> Option<&Head> {
        self.client_resp_head.as_ref()
    }

    pub fn set_client_resp_head(&mut self, head: Option<Head>) {
        self.client_resp_head = head;
    }

    pub fn logger(&self) -> Option<&Arc<dyn Logger>> {
        self.logger.as_ref()
    }

    pub fn set_logger(&mut self, logger: Option<Arc<dyn Logger>>) {
        self.logger = logger;
    }

    pub fn request_id(&self) -> u64 {
        self.request_id
    }

    pub fn set_request_id(&mut self, id: u64) {
        self.request_id = id;
    }

    pub fn span_id(&self) -> u64 {
        self.span_id
    }

    pub fn set_span_id(&mut self, id: u64) {
        self.span_id = id;
    }

    pub fn trace_id(&self) -> &str {
        &self.trace_id
    }

    pub fn set_trace_id(&mut self, id: impl Into<String>) {
        self.trace_id = id.into();
    }
}

/// Shared handle to a [`Msg`].
///
/// The message is only reachable inside [`MsgHandle::with`], so no guard
/// outlives the call that needed it. Calling the logging helpers,
/// [`MsgPool::acquire_async`](crate::context::MsgPool::acquire_async) or
/// [`MsgPool::clone_scope`](crate::context::MsgPool::clone_scope) from inside
/// `with` does not block: logging drops the per-request fields and the clones
/// start out empty. Nesting `with` on the same handle deadlocks.
#[derive(Clone, Default)]
pub struct MsgHandle(Arc<MsgCell>);

#[derive(Default)]
struct MsgCell {
    msg: Mutex<Msg>,
    /// Key of the thread currently inside `with`, 0 when none.
    holder: AtomicU64,
}

fn thread_key() -> u64 {
    static NEXT_KEY: AtomicU64 = AtomicU64::new(1);
    thread_local! {
        static KEY: u64 = NEXT_KEY.fetch_add(1, Ordering::Relaxed);
    }
    KEY.with(|key| *key)
}

struct HolderReset<'a>(&'a AtomicU64);

impl Drop for HolderReset<'_> {
    fn drop(&mut self) {
        self.0.store(0, Ordering::Release);
    }
}

impl MsgHandle {
    pub fn new(msg: Msg) -> Self {
        Self(Arc::new(MsgCell {
            msg: Mutex::new(msg),
            holder: AtomicU64::new(0),
        }))
    }

    /// Runs `f` with exclusive access to the message.
    pub fn with<R>(&self, f: impl FnOnce(&mut Msg) -> R) -> R {
        let mut msg = self.0.msg.lock().unwrap_or_else(PoisonError::into_inner);
        self.0.holder.store(thread_key(), Ordering::Release);
        let _reset = HolderReset(&self.0.holder);
        f(&mut *msg)
    }

    /// Like [`MsgHandle::with`], but returns `None` instead of deadlocking
    /// when the calling thread is already inside `with` for this message.
    pub(crate) fn try_with<R>(&self, f: impl FnOnce(&mut Msg) -> R) -> Option<R> {
        if self.0.holder.load(Ordering::Acquire) == thread_key() {
            return None;
        }
        Some(self.with(f))
    }

    /// Whether both handles point at the same message instance.
    pub fn ptr_eq(&self, other: &MsgHandle) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl From<Msg> for MsgHandle {
    fn from(msg: Msg) -> Self {
        MsgHandle::new(msg)
    }
}

/// Copies `src` into `dst`. A missing side, or both sides being the same
/// instance, is a no-op.
///
/// `src` is snapshotted and unlocked before `dst` is locked, so the two are
/// never held together.
pub fn copy_msg(dst: Option<&MsgHandle>, src: Option<&MsgHandle>) {
    let (Some(dst), Some(src)) = (dst, src) else {
        return;
    };
    if dst.ptr_eq(src) {
        return;
    }

    let snapshot = src.with(|src| src.snapshot());
    dst.with(|dst| dst.copy_from(&snapshot));
}

/// [`copy_msg`] for internal callers that may run inside `src.with`.
/// Returns `false` when `src` could not be read.
pub(crate) fn try_copy_msg(dst: &MsgHandle, src: &MsgHandle) -> bool {
    if dst.ptr_eq(src) {
        return true;
    }
    match src.try_with(|src| src.snapshot()) {
        Some(snapshot) => {
            dst.with(|dst| dst.copy_from(&snapshot));
            true
        }
        None => false,
    }
}
