pub mod body;
pub mod operation;

pub use body::Body;
pub use operation::Operation;

use std::sync::Arc;
use std::time::SystemTime;

use reqwest::Method;
use reqwest::header::HeaderMap;
use tokio_util::sync::CancellationToken;

use crate::bind::path::{clean_path, encode_query};
use crate::bind::{ApiInput, ApiOutput, ResponseView};
use crate::error::{ApiError, codes};
use crate::pipeline::{Handlers, Stage};
use crate::session::Endpoint;

/// HTTP 状态码对应的规范文本；0 及未知码映射为 `UnknownError`
pub fn status_text(code: u16) -> &'static str {
    match reqwest::StatusCode::from_u16(code) {
        Ok(status) => status.canonical_reason().unwrap_or(codes::UNKNOWN),
        Err(_) => codes::UNKNOWN,
    }
}

/// 调用目标的服务信息
#[derive(Debug, Clone)]
pub struct ClientInfo {
    pub service_id: String,
    pub api_version: String,
}

/// 组装中的 HTTP 请求面
///
/// 构建一次后方法与 host 固定；路径/查询/header 由各阶段处理器填充。
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub host: String,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: HeaderMap,
    pub body: Body,
    pub content_length: Option<u64>,
}

impl HttpRequest {
    pub fn new(method: Method, host: String) -> Self {
        Self {
            method,
            host,
            path: String::new(),
            query: Vec::new(),
            headers: HeaderMap::new(),
            body: Body::None,
            content_length: None,
        }
    }

    /// 规范化路径并编码查询串，产出最终 URL
    pub fn full_url(&self) -> Result<url::Url, ApiError> {
        let host = self.host.trim_end_matches('/');
        let mut path = clean_path(&self.path);
        if !path.is_empty() && !path.starts_with('/') {
            path.insert(0, '/');
        }
        let mut full = format!("{host}{path}");
        let query = encode_query(&self.query);
        if !query.is_empty() {
            full.push('?');
            full.push_str(&query);
        }
        url::Url::parse(&full).map_err(|e| {
            ApiError::with_cause(
                codes::REQUEST_ERROR,
                format!("invalid request URL '{full}'"),
                e,
            )
        })
    }
}

/// 已收到的响应元数据；响应体单独全量缓冲在 Request 上
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// 合成响应允许为 0（传输错误且无法推断状态码时）
    pub status: u16,
    pub headers: HeaderMap,
}

/// 单次用户可见调用的状态机
///
/// 构建一次、带重试地发送；错误具有粘性——一旦置位，
/// 带 `stop_on_error` 谓词的阶段会短路后续处理器。
pub struct Request<'a> {
    pub operation: Operation,
    pub info: ClientInfo,
    pub endpoint: Endpoint,
    handlers: Arc<Handlers>,
    pub cancel: CancellationToken,

    pub creation_time: SystemTime,
    pub last_sign_time: Option<SystemTime>,
    pub attempt_time: SystemTime,

    pub max_retries: u8,
    retry_count: u8,

    pub input: Option<&'a dyn ApiInput>,
    pub output: Option<&'a mut dyn ApiOutput>,

    pub http: HttpRequest,
    pub response: Option<HttpResponse>,
    pub response_body: Vec<u8>,

    error: Option<ApiError>,
    pub retryable: bool,
    built: bool,
    pub disable_follow_redirects: bool,
}

impl<'a> Request<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        info: ClientInfo,
        endpoint: Endpoint,
        handlers: Arc<Handlers>,
        max_retries: u8,
        operation: Operation,
        cancel: CancellationToken,
        input: Option<&'a dyn ApiInput>,
        output: Option<&'a mut dyn ApiOutput>,
    ) -> Self {
        let path = if operation.path_as_is {
            operation.path.to_string()
        } else {
            let mut parts: Vec<&str> = Vec::new();
            for part in [info.service_id.as_str(), info.api_version.as_str()] {
                let trimmed = part.trim_matches('/');
                if !trimmed.is_empty() {
                    parts.push(trimmed);
                }
            }
            let op_path = operation.path.trim_start_matches('/');
            if !op_path.is_empty() {
                parts.push(op_path);
            }
            format!("/{}", parts.join("/"))
        };

        let mut http = HttpRequest::new(operation.method.clone(), endpoint.host.clone());
        http.path = path;

        let now = SystemTime::now();
        Self {
            operation,
            info,
            endpoint,
            handlers,
            cancel,
            creation_time: now,
            last_sign_time: None,
            attempt_time: now,
            max_retries,
            retry_count: 0,
            input,
            output,
            http,
            response: None,
            response_body: Vec::new(),
            error: None,
            retryable: false,
            built: false,
            disable_follow_redirects: false,
        }
    }

    pub fn error(&self) -> Option<&ApiError> {
        self.error.as_ref()
    }

    pub fn set_error(&mut self, err: ApiError) {
        self.error = Some(err);
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    pub fn is_built(&self) -> bool {
        self.built
    }

    pub fn retry_count(&self) -> u8 {
        self.retry_count
    }

    async fn run_stage(&mut self, stage: Stage) {
        let handlers = Arc::clone(&self.handlers);
        handlers.run(stage, self).await;
    }

    /// 构建阶段：至多执行一次
    ///
    /// 先跑 Validate，有错即浮出；再跑 Build（content-type、绑定器写请求、
    /// 编组请求体），随后置 built 标志。
    pub async fn build(&mut self) {
        if self.built {
            return;
        }
        self.run_stage(Stage::Validate).await;
        if self.error.is_some() {
            return;
        }
        self.run_stage(Stage::Build).await;
        self.built = true;
    }

    /// 签名阶段；Host header 清理发生在 Sign 列表之前
    pub async fn sign(&mut self) {
        self.build().await;
        if self.error.is_some() {
            return;
        }
        self.http.headers.remove(reqwest::header::HOST);
        self.run_stage(Stage::Sign).await;
        if self.error.is_none() {
            self.last_sign_time = Some(SystemTime::now());
        }
    }

    /// 发送：构建 + 重试循环 + 收尾
    ///
    /// 每轮重置错误、重跑 Validate（让配置问题每轮都浮出），随后进行一次
    /// 发送尝试；失败则交给 Retry / AfterRetry 阶段决定是否继续。
    /// 无论结果如何，非空输出都会回填响应面，Complete 阶段必然执行。
    pub async fn send(&mut self) -> Result<(), ApiError> {
        self.build().await;
        if self.error.is_none() {
            loop {
                self.clear_error();
                self.attempt_time = SystemTime::now();
                self.run_stage(Stage::Validate).await;
                if self.error.is_none() {
                    self.attempt().await;
                }
                if self.error.is_none() {
                    break;
                }
                self.run_stage(Stage::Retry).await;
                self.run_stage(Stage::AfterRetry).await;
                if !self.retryable || self.retry_count >= self.max_retries {
                    break;
                }
                if !self.prepare_retry() {
                    break;
                }
                log::debug!(
                    "retrying {} (attempt {})",
                    self.operation.name,
                    self.retry_count as u16 + 1
                );
            }
        }
        self.finish();
        self.run_stage(Stage::Complete).await;
        match &self.error {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }

    /// 单次发送尝试
    async fn attempt(&mut self) {
        // 默认不可重试，Retry 阶段可改写
        self.retryable = false;
        self.run_stage(Stage::Send).await;
        if self.cancel.is_cancelled() && self.error.is_some() {
            self.error = Some(ApiError::new(
                codes::CANCELED,
                format!("request canceled: {}", self.operation.name),
            ));
            self.retryable = false;
        }
        if self.error.is_some() {
            self.run_stage(Stage::CompleteAttempt).await;
            return;
        }
        self.run_stage(Stage::UnmarshalMeta).await;
        self.run_stage(Stage::ValidateResponse).await;
        if self.error.is_some() {
            self.run_stage(Stage::UnmarshalError).await;
        } else {
            self.run_stage(Stage::Unmarshal).await;
        }
        self.run_stage(Stage::CompleteAttempt).await;
    }

    /// 下一轮尝试前的清理；返回 false 表示致命，循环终止
    fn prepare_retry(&mut self) -> bool {
        if self.cancel.is_cancelled() {
            self.error = Some(ApiError::new(
                codes::CANCELED,
                format!("request canceled: {}", self.operation.name),
            ));
            self.retryable = false;
            return false;
        }
        self.response = None;
        self.response_body.clear();
        self.retry_count += 1;
        true
    }

    /// 收尾：把响应面（header / 状态 / 原始体）回填进非空输出
    fn finish(&mut self) {
        let Some(resp) = &self.response else {
            return;
        };
        if let Some(out) = self.output.as_deref_mut() {
            let view = ResponseView::new(resp.status, &resp.headers, &self.response_body);
            if let Err(e) = out.read_response(&view) {
                if self.error.is_none() {
                    self.error = Some(e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Endpoint;

    fn endpoint(host: &str) -> Endpoint {
        Endpoint {
            host: host.to_string(),
            client: reqwest::Client::new(),
            no_redirect: reqwest::Client::new(),
        }
    }

    fn request(host: &str, service: &str, version: &str, op: Operation) -> Request<'static> {
        Request::new(
            ClientInfo {
                service_id: service.to_string(),
                api_version: version.to_string(),
            },
            endpoint(host),
            Arc::new(Handlers::new()),
            0,
            op,
            CancellationToken::new(),
            None,
            None,
        )
    }

    #[test]
    fn test_url_composition_joins_components() {
        let req = request(
            "https://h",
            "accounts",
            "v1",
            Operation::new("GetSubaccount", Method::GET, "/subaccounts/{subaccountGUID}"),
        );
        assert_eq!(req.http.path, "/accounts/v1/subaccounts/{subaccountGUID}");
    }

    #[test]
    fn test_url_composition_elides_empty_components() {
        let req = request(
            "https://h",
            "accounts",
            "",
            Operation::new("X", Method::GET, "/globalAccount"),
        );
        assert_eq!(req.http.path, "/accounts/globalAccount");
    }

    #[test]
    fn test_url_composition_path_as_is() {
        let req = request(
            "https://h",
            "accounts",
            "v1",
            Operation::new("X", Method::GET, "/oauth/token").path_as_is(),
        );
        assert_eq!(req.http.path, "/oauth/token");
    }

    #[test]
    fn test_full_url_with_query() {
        let mut req = request(
            "https://h/",
            "accounts",
            "v1",
            Operation::new("X", Method::GET, "/subaccounts"),
        );
        req.http.query.push(("a".to_string(), "b c".to_string()));
        let url = req.http.full_url().unwrap();
        assert_eq!(url.as_str(), "https://h/accounts/v1/subaccounts?a=b%20c");
    }

    #[test]
    fn test_full_url_rejects_garbage_host() {
        let req = request(
            "not a url",
            "accounts",
            "v1",
            Operation::new("X", Method::GET, "/x"),
        );
        let err = req.http.full_url().unwrap_err();
        assert_eq!(err.code(), codes::REQUEST_ERROR);
    }

    #[test]
    fn test_status_text() {
        assert_eq!(status_text(404), "Not Found");
        assert_eq!(status_text(200), "OK");
        assert_eq!(status_text(0), "UnknownError");
        assert_eq!(status_text(599), "UnknownError");
    }
}
