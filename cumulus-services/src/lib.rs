//! Cumulus 云控制面的类型化服务门面
//!
//! 每个模块对应一个平台服务（accounts、entitlements、events、
//! provisioning、saas-manager、reports）。门面在构造时从 [`Session`]
//! 取出服务配置并就地安装 JSON 编解码与重试处理器；配置缺失不会
//! 立刻报错，而是让门面上的每次调用都返回同一个错误（不发网络请求）。

pub mod accounts;
pub mod entitlements;
pub mod events;
pub mod provisioning;
pub mod reports;
pub mod saas;

use std::sync::Arc;

use cumulus_common::bind::{ApiInput, ApiOutput};
use cumulus_common::pipeline::{Handlers, Processor, Stage};
use cumulus_common::processors::{json, rest_build};
use cumulus_common::request::{ClientInfo, Operation, Request};
use cumulus_common::retry::RetryPolicy;
use cumulus_common::session::{Endpoint, Session};
use cumulus_common::{ApiError, CancellationToken};

pub const ENRICH_ERROR: &str = "cumulus.EnrichError";

/// 一个服务的已配置调用句柄
///
/// 持有端点、处理器注册表副本与取消令牌；`invoke` 为每次调用
/// 构造独立的 [`Request`] 并驱动其生命周期。
#[derive(Debug, Clone)]
pub struct ServiceHandle {
    info: ClientInfo,
    endpoint: Endpoint,
    handlers: Arc<Handlers>,
    max_retries: u8,
    cancel: CancellationToken,
}

impl ServiceHandle {
    /// 从会话实例化；未知服务标识或主机异常在此处浮出
    pub fn new(session: &Session, service_id: &str, api_version: &str) -> Result<Self, ApiError> {
        Self::new_aliased(session, service_id, service_id, api_version)
    }

    /// 端点标识与 URL 路径段分离的变体（events 走 cloud-management 端点时用）
    pub fn new_aliased(
        session: &Session,
        endpoint_id: &str,
        service_id: &str,
        api_version: &str,
    ) -> Result<Self, ApiError> {
        let mut sc = session.service_config(endpoint_id)?;
        install_json_defaults(&mut sc.handlers, sc.max_retries);
        Ok(Self {
            info: ClientInfo {
                service_id: service_id.to_string(),
                api_version: api_version.to_string(),
            },
            endpoint: sc.endpoint,
            handlers: Arc::new(sc.handlers),
            max_retries: sc.max_retries,
            cancel: CancellationToken::new(),
        })
    }

    /// 换上调用方的取消令牌
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn service_id(&self) -> &str {
        &self.info.service_id
    }

    /// 执行一次操作：构造请求、走完整生命周期
    pub async fn invoke<'a>(
        &self,
        operation: Operation,
        input: Option<&'a dyn ApiInput>,
        output: Option<&'a mut dyn ApiOutput>,
    ) -> Result<(), ApiError> {
        log::debug!(
            "invoking {} on service '{}'",
            operation.name,
            self.info.service_id
        );
        let mut req = Request::new(
            self.info.clone(),
            self.endpoint.clone(),
            Arc::clone(&self.handlers),
            self.max_retries,
            operation,
            self.cancel.clone(),
            input,
            output,
        );
        req.send().await
    }
}

/// 在核心默认值之上安装 JSON 编解码、错误信息增强与重试处理器
fn install_json_defaults(handlers: &mut Handlers, max_retries: u8) {
    let build = handlers.using(Stage::Build);
    build.push_back(json::build());
    build.push_back(rest_build());
    build.push_back(json::marshal());

    handlers.using(Stage::Unmarshal).push_back(json::unmarshal());
    handlers
        .using(Stage::UnmarshalMeta)
        .push_back(json::unmarshal_meta());

    let unmarshal_error = handlers.using(Stage::UnmarshalError);
    unmarshal_error.push_back(json::unmarshal_error());
    unmarshal_error.push_back(Processor::from_fn(ENRICH_ERROR, enrich_error_fn));

    if max_retries > 0 {
        let policy = RetryPolicy::exponential(max_retries as u32 + 1, 100);
        handlers
            .using(Stage::Retry)
            .push_back(policy.clone().classify_processor());
        handlers
            .using(Stage::AfterRetry)
            .push_back(policy.backoff_processor());
    }
}

/// 用响应体里的错误描述替换状态文本错误的笼统信息
///
/// 服务端惯例为 `{"error":"..."}` 或 `{"error":{"message":"..."}}`；
/// 解析不出来就保持原错误不动。
fn enrich_error_fn(req: &mut Request<'_>) {
    let Some(err) = req.error() else {
        return;
    };
    if req.response_body.is_empty() {
        return;
    }
    let Ok(value) = serde_json::from_slice::<serde_json::Value>(&req.response_body) else {
        return;
    };
    let detail = value.get("error").and_then(|e| {
        e.as_str()
            .map(str::to_string)
            .or_else(|| e.get("message").and_then(|m| m.as_str()).map(str::to_string))
    });
    if let Some(detail) = detail {
        let mut enriched = err.clone();
        enriched.set_message(format!("{}: {}", req.operation.name, detail));
        req.set_error(enriched);
    }
}

/// 门面共用的惰性失败存根：配置错误被记住，每次调用原样返回
pub(crate) fn ready(inner: &Result<ServiceHandle, ApiError>) -> Result<&ServiceHandle, ApiError> {
    inner.as_ref().map_err(Clone::clone)
}
