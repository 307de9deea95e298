use horm_codec::context::{MsgPool, Scope, ScopeError, clone_scope, message, new_message};
use std::sync::mpsc;
use std::time::Duration;
use tokio::time::{advance, timeout};

#[tokio::test(start_paused = true)]
async fn test_async_clone_outlives_original_deadline() {
    let pool = MsgPool::new();
    let (request_scope, _cancel) = Scope::background().with_timeout(Duration::from_secs(1));
    let (scope, msg) = pool.acquire(&request_scope);
    msg.with(|m| {
        m.set_trace_id("trace-async");
        m.set_call_rpc_name("horm.server/Find");
    });

    let (async_scope, async_cancel, async_msg) =
        pool.acquire_async(&scope, Duration::from_secs(5));
    assert!(!async_msg.ptr_eq(&msg));

    advance(Duration::from_millis(1500)).await;

    assert_eq!(scope.err(), Some(ScopeError::DeadlineExceeded));
    timeout(Duration::from_millis(1), scope.done())
        .await
        .expect("original scope should be done");

    // The handler returns and its message goes back to the pool.
    pool.release(msg);

    assert!(!async_scope.is_done());
    {
        let m = message(&async_scope);
        assert!(m.ptr_eq(&async_msg));
        m.with(|m| {
            assert_eq!(m.trace_id(), "trace-async");
            assert_eq!(m.callee_service_name(), "horm.server");
            assert_eq!(m.callee_method(), "Find");
        });
    }

    advance(Duration::from_millis(3400)).await;
    assert!(!async_scope.is_done());

    advance(Duration::from_millis(200)).await;
    assert_eq!(async_scope.err(), Some(ScopeError::DeadlineExceeded));

    async_cancel.cancel();
    pool.release(async_msg);
}

#[tokio::test(start_paused = true)]
async fn test_async_clone_ignores_parent_cancel_but_honors_its_own() {
    let pool = MsgPool::new();
    let (request_scope, cancel_request) = Scope::background().with_cancel();
    let (scope, msg) = pool.acquire(&request_scope);

    let (async_scope, async_cancel, async_msg) =
        pool.acquire_async(&scope, Duration::from_secs(5));

    cancel_request.cancel();
    assert_eq!(scope.err(), Some(ScopeError::Canceled));
    assert_eq!(async_scope.err(), None);

    async_cancel.cancel();
    assert_eq!(async_scope.err(), Some(ScopeError::Canceled));
    timeout(Duration::from_millis(1), async_scope.done())
        .await
        .expect("async scope should be done");

    pool.release(msg);
    pool.release(async_msg);
}

#[tokio::test(start_paused = true)]
async fn test_detached_scope_keeps_values_and_drops_cancellation() {
    let (request_scope, cancel) = Scope::background().with_timeout(Duration::from_secs(1));
    let (scope, msg) = new_message(&request_scope);
    msg.with(|m| m.set_request_id(99));

    let detached = scope.detach();
    assert!(detached.deadline().is_none());

    cancel.cancel();
    advance(Duration::from_secs(2)).await;

    assert!(scope.is_done());
    assert_eq!(detached.err(), None);
    assert!(
        timeout(Duration::from_secs(60), detached.done())
            .await
            .is_err(),
        "detached scope must never be done"
    );
    assert_eq!(message(&detached).with(|m| m.request_id()), 99);
}

#[tokio::test(start_paused = true)]
async fn test_cloned_scope_copies_msg_without_new_timeout() {
    let (request_scope, cancel) = Scope::background().with_timeout(Duration::from_secs(1));
    let (scope, msg) = new_message(&request_scope);
    msg.with(|m| m.set_env("prod"));

    let cloned = clone_scope(&scope);
    let cloned_msg = message(&cloned);
    assert!(!cloned_msg.ptr_eq(&msg));
    assert_eq!(cloned_msg.with(|m| m.env().to_string()), "prod");
    assert!(cloned.deadline().is_none());

    cancel.cancel();
    advance(Duration::from_secs(2)).await;
    assert!(scope.is_done());
    assert!(!cloned.is_done());
}

#[tokio::test(start_paused = true)]
async fn test_acquire_shares_parent_deadline() {
    let (parent, _cancel) = Scope::background().with_timeout(Duration::from_millis(200));
    let (scope, _msg) = MsgPool::new().acquire(&parent);

    assert_eq!(scope.deadline(), parent.deadline());
    advance(Duration::from_millis(250)).await;
    assert_eq!(scope.err(), Some(ScopeError::DeadlineExceeded));
}

#[test]
fn test_async_clone_while_handler_holds_msg() {
    let (tx, rx) = mpsc::channel();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .expect("runtime");
        let _guard = rt.enter();

        let pool = MsgPool::new();
        let (scope, msg) = pool.acquire(&Scope::background());
        msg.with(|m| m.set_env("prod"));

        let (async_scope, async_cancel, async_msg) =
            msg.with(|_| pool.acquire_async(&scope, Duration::from_secs(5)));
        let cloned = msg.with(|_| pool.clone_scope(&scope));

        let inside_env = async_msg.with(|m| m.env().to_string());
        let outside = pool.acquire_async(&scope, Duration::from_secs(5));
        let outside_env = outside.2.with(|m| m.env().to_string());

        assert!(!async_scope.is_done());
        assert!(!message(&cloned).ptr_eq(&msg));
        async_cancel.cancel();
        outside.1.cancel();
        pool.release(async_msg);
        pool.release(outside.2);
        pool.release(msg);
        tx.send((inside_env, outside_env)).expect("send");
    });

    let (inside_env, outside_env) = rx
        .recv_timeout(Duration::from_secs(3))
        .expect("acquire_async hung while the handler held the msg");
    assert_eq!(inside_env, "");
    assert_eq!(outside_env, "prod");
}
