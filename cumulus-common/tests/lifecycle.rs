//! 请求生命周期的端到端行为测试（不经过网络，Send 阶段用桩替换）

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use cumulus_common::pipeline::{Handle, Processor, Stage};
use cumulus_common::processors::{self, default_handlers};
use cumulus_common::request::{Body, HttpResponse, Operation};
use cumulus_common::retry::RetryPolicy;
use cumulus_common::{
    CancellationToken, ClientInfo, Endpoint, Handlers, Method, Request, codes, is_canceled,
};

fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn test_endpoint(host: &str) -> Endpoint {
    Endpoint {
        host: host.to_string(),
        client: reqwest::Client::new(),
        no_redirect: reqwest::Client::new(),
    }
}

fn test_info() -> ClientInfo {
    ClientInfo {
        service_id: "accounts".into(),
        api_version: "v1".into(),
    }
}

/// 失败 N 次后返回 200 的 Send 桩，记录每轮的请求体
struct StubSend {
    attempts: Arc<AtomicUsize>,
    fail_until: usize,
    bodies: Arc<std::sync::Mutex<Vec<Vec<u8>>>>,
}

#[async_trait]
impl Handle for StubSend {
    async fn handle(&self, req: &mut Request<'_>) {
        let n = self.attempts.fetch_add(1, Ordering::SeqCst);
        self.bodies
            .lock()
            .unwrap()
            .push(req.http.body.as_bytes().unwrap_or(&[]).to_vec());
        if n < self.fail_until {
            req.set_error(cumulus_common::ApiError::new(
                codes::REQUEST_ERROR,
                "stub transport failure",
            ));
            return;
        }
        req.response = Some(HttpResponse {
            status: 200,
            headers: Default::default(),
        });
        req.response_body = b"{}".to_vec();
    }
}

struct StubHarness {
    handlers: Handlers,
    attempts: Arc<AtomicUsize>,
    bodies: Arc<std::sync::Mutex<Vec<Vec<u8>>>>,
}

/// default_handlers，但 core.Send 换成桩
fn stubbed_handlers(fail_until: usize) -> StubHarness {
    let attempts = Arc::new(AtomicUsize::new(0));
    let bodies = Arc::new(std::sync::Mutex::new(Vec::new()));
    let mut handlers = default_handlers();
    handlers.using(Stage::Send).swap_named(Processor::new(
        processors::SEND,
        Arc::new(StubSend {
            attempts: Arc::clone(&attempts),
            fail_until,
            bodies: Arc::clone(&bodies),
        }),
    ));
    StubHarness {
        handlers,
        attempts,
        bodies,
    }
}

fn get_operation() -> Operation {
    Operation::new("GetThing", Method::GET, "/things/42")
}

#[tokio::test]
async fn test_build_runs_once() {
    struct CountBuild(Arc<AtomicUsize>);

    #[async_trait]
    impl Handle for CountBuild {
        async fn handle(&self, _req: &mut Request<'_>) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    let count = Arc::new(AtomicUsize::new(0));
    let mut handlers = Handlers::new();
    handlers.using(Stage::Build).push_back(Processor::new(
        "test.CountBuild",
        Arc::new(CountBuild(Arc::clone(&count))),
    ));

    let mut req = Request::new(
        test_info(),
        test_endpoint("https://api.example.com"),
        Arc::new(handlers),
        0,
        get_operation(),
        CancellationToken::new(),
        None,
        None,
    );
    req.build().await;
    req.build().await;
    req.sign().await;
    assert_eq!(count.load(Ordering::SeqCst), 1);
    assert!(req.is_built());
}

#[tokio::test]
async fn test_stop_on_error_short_circuits() {
    fn fail(req: &mut Request<'_>) {
        req.set_error(cumulus_common::ApiError::new(
            codes::SERIALIZATION,
            "bad input",
        ));
    }

    struct MarkRan(Arc<AtomicUsize>);

    #[async_trait]
    impl Handle for MarkRan {
        async fn handle(&self, _req: &mut Request<'_>) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    let ran = Arc::new(AtomicUsize::new(0));
    let mut handlers = Handlers::new();
    {
        let list = handlers.using(Stage::Build);
        list.after_each = Some(cumulus_common::pipeline::stop_on_error);
        list.push_back(Processor::from_fn("test.Fail", fail));
        list.push_back(Processor::new(
            "test.AfterFail",
            Arc::new(MarkRan(Arc::clone(&ran))),
        ));
    }

    let mut req = Request::new(
        test_info(),
        test_endpoint("https://api.example.com"),
        Arc::new(handlers),
        0,
        get_operation(),
        CancellationToken::new(),
        None,
        None,
    );
    req.build().await;
    assert_eq!(req.error().map(|e| e.code().to_string()).as_deref(), Some("Serialization"));
    assert_eq!(ran.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_missing_endpoint_fails_without_send() {
    let harness = stubbed_handlers(0);
    let mut req = Request::new(
        test_info(),
        test_endpoint(""),
        Arc::new(harness.handlers),
        2,
        get_operation(),
        CancellationToken::new(),
        None,
        None,
    );
    let err = req.send().await.unwrap_err();
    assert_eq!(err.code(), codes::MISSING_ENDPOINT);
    assert_eq!(harness.attempts.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_transport_failures_are_retried() {
    init_logs();
    let harness = stubbed_handlers(2);
    let mut handlers = harness.handlers;
    let policy = RetryPolicy::fixed(3, 1);
    handlers
        .using(Stage::Retry)
        .push_back(policy.clone().classify_processor());
    handlers
        .using(Stage::AfterRetry)
        .push_back(policy.backoff_processor());

    let mut req = Request::new(
        test_info(),
        test_endpoint("https://api.example.com"),
        Arc::new(handlers),
        2,
        get_operation(),
        CancellationToken::new(),
        None,
        None,
    );
    assert!(req.send().await.is_ok());
    assert_eq!(harness.attempts.load(Ordering::SeqCst), 3);
    assert_eq!(req.retry_count(), 2);
    assert_eq!(req.response.as_ref().map(|r| r.status), Some(200));
}

#[tokio::test]
async fn test_retries_exhaust_with_sticky_error() {
    let harness = stubbed_handlers(usize::MAX);
    let mut handlers = harness.handlers;
    let policy = RetryPolicy::fixed(2, 1);
    handlers
        .using(Stage::Retry)
        .push_back(policy.clone().classify_processor());
    handlers
        .using(Stage::AfterRetry)
        .push_back(policy.backoff_processor());

    let mut req = Request::new(
        test_info(),
        test_endpoint("https://api.example.com"),
        Arc::new(handlers),
        1,
        get_operation(),
        CancellationToken::new(),
        None,
        None,
    );
    let err = req.send().await.unwrap_err();
    assert_eq!(err.code(), codes::REQUEST_ERROR);
    assert_eq!(harness.attempts.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_body_is_replayed_identically_across_attempts() {
    let harness = stubbed_handlers(1);
    let mut handlers = harness.handlers;
    let policy = RetryPolicy {
        idempotent_only: false,
        ..RetryPolicy::fixed(3, 1)
    };
    handlers
        .using(Stage::Retry)
        .push_back(policy.clone().classify_processor());
    handlers
        .using(Stage::AfterRetry)
        .push_back(policy.backoff_processor());

    let mut req = Request::new(
        test_info(),
        test_endpoint("https://api.example.com"),
        Arc::new(handlers),
        2,
        Operation::new("CreateThing", Method::POST, "/things"),
        CancellationToken::new(),
        None,
        None,
    );
    req.http.body = Body::from(b"{\"name\":\"x\"}".to_vec());
    assert!(req.send().await.is_ok());

    let bodies = harness.bodies.lock().unwrap();
    assert_eq!(bodies.len(), 2);
    assert_eq!(bodies[0], b"{\"name\":\"x\"}");
    assert_eq!(bodies[0], bodies[1]);
}

#[tokio::test]
async fn test_post_is_not_retried_under_idempotent_only_policy() {
    let harness = stubbed_handlers(usize::MAX);
    let mut handlers = harness.handlers;
    let policy = RetryPolicy::fixed(3, 1);
    handlers
        .using(Stage::Retry)
        .push_back(policy.clone().classify_processor());
    handlers
        .using(Stage::AfterRetry)
        .push_back(policy.backoff_processor());

    let mut req = Request::new(
        test_info(),
        test_endpoint("https://api.example.com"),
        Arc::new(handlers),
        2,
        Operation::new("CreateThing", Method::POST, "/things"),
        CancellationToken::new(),
        None,
        None,
    );
    assert!(req.send().await.is_err());
    assert_eq!(harness.attempts.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_cancellation_yields_canceled_error() {
    init_logs();
    let harness = stubbed_handlers(usize::MAX);
    let mut handlers = harness.handlers;
    let policy = RetryPolicy::fixed(3, 1);
    handlers
        .using(Stage::Retry)
        .push_back(policy.clone().classify_processor());
    handlers
        .using(Stage::AfterRetry)
        .push_back(policy.backoff_processor());

    let cancel = CancellationToken::new();
    cancel.cancel();
    let mut req = Request::new(
        test_info(),
        test_endpoint("https://api.example.com"),
        Arc::new(handlers),
        2,
        get_operation(),
        cancel,
        None,
        None,
    );
    let err = req.send().await.unwrap_err();
    assert!(is_canceled(&err));
    assert!(!req.retryable);
    assert_eq!(harness.attempts.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_complete_stage_always_runs() {
    struct MarkComplete(Arc<AtomicUsize>);

    #[async_trait]
    impl Handle for MarkComplete {
        async fn handle(&self, _req: &mut Request<'_>) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    let completed = Arc::new(AtomicUsize::new(0));
    let harness = stubbed_handlers(0);
    let mut handlers = harness.handlers;
    handlers.using(Stage::Complete).push_back(Processor::new(
        "test.MarkComplete",
        Arc::new(MarkComplete(Arc::clone(&completed))),
    ));

    // 失败路径：端点缺失
    let mut failing = Request::new(
        test_info(),
        test_endpoint(""),
        Arc::new(handlers.copy()),
        0,
        get_operation(),
        CancellationToken::new(),
        None,
        None,
    );
    assert!(failing.send().await.is_err());
    assert_eq!(completed.load(Ordering::SeqCst), 1);

    // 成功路径
    let mut ok = Request::new(
        test_info(),
        test_endpoint("https://api.example.com"),
        Arc::new(handlers),
        0,
        get_operation(),
        CancellationToken::new(),
        None,
        None,
    );
    assert!(ok.send().await.is_ok());
    assert_eq!(completed.load(Ordering::SeqCst), 2);
}
