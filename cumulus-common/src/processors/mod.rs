pub mod json;

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{CONTENT_LENGTH, HeaderMap, HeaderValue};

use crate::bind::RequestBinder;
use crate::bind::path::clean_path;
use crate::error::{ApiError, codes};
use crate::pipeline::{Handle, Handlers, Processor, Stage, stop_on_error};
use crate::request::{Body, HttpResponse, Request, status_text};

pub const VALIDATE_ENDPOINT: &str = "core.ValidateEndpoint";
pub const BUILD_CONTENT_LENGTH: &str = "core.BuildContentLength";
pub const VALIDATE_REQ_SIG: &str = "core.ValidateReqSig";
pub const SEND: &str = "core.Send";
pub const VALIDATE_RESPONSE: &str = "core.ValidateResponse";
pub const REST_BUILD: &str = "rest.Build";

/// 会话蓝图：核心处理器的默认注册
///
/// 格式相关的编组器（JSON 等）由各服务门面在此之上追加。
pub fn default_handlers() -> Handlers {
    let mut h = Handlers::new();
    for stage in [
        Stage::Validate,
        Stage::Build,
        Stage::Sign,
        Stage::Send,
        Stage::ValidateResponse,
        Stage::Unmarshal,
        Stage::UnmarshalMeta,
    ] {
        h.using(stage).after_each = Some(stop_on_error);
    }
    h.using(Stage::Validate).push_back(validate_endpoint());
    h.using(Stage::Sign).push_back(build_content_length());
    h.using(Stage::Send).push_back(validate_req_sig());
    h.using(Stage::Send).push_back(send());
    h.using(Stage::ValidateResponse).push_back(validate_response());
    h
}

/// Validate 阶段：端点主机为空时以 `MissingEndpoint` 失败
pub fn validate_endpoint() -> Processor {
    Processor::from_fn(VALIDATE_ENDPOINT, validate_endpoint_fn)
}

fn validate_endpoint_fn(req: &mut Request<'_>) {
    if req.endpoint.host.trim().is_empty() {
        req.set_error(ApiError::new(
            codes::MISSING_ENDPOINT,
            format!(
                "no endpoint host configured for service '{}'",
                req.info.service_id
            ),
        ));
    }
}

/// Sign 阶段：测算或解析 Content-Length
///
/// 已有 header 时解析它；否则量测请求体。大于 0 时写入 header 与请求字段，
/// 否则两者一并删除（无请求体的标记，避免传输层发出 chunked 编码）。
pub fn build_content_length() -> Processor {
    Processor::from_fn(BUILD_CONTENT_LENGTH, build_content_length_fn)
}

fn build_content_length_fn(req: &mut Request<'_>) {
    let preset = req
        .http
        .headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<i64>().ok());
    let length = match preset {
        Some(n) => n,
        None => req.http.body.len() as i64,
    };
    if length > 0 {
        req.http.content_length = Some(length as u64);
        req.http
            .headers
            .insert(CONTENT_LENGTH, HeaderValue::from(length as u64));
    } else {
        req.http.content_length = None;
        req.http.headers.remove(CONTENT_LENGTH);
    }
}

/// Send 阶段首位：委托回 `Request::sign`，让后续尝试在变更后重新签名
pub fn validate_req_sig() -> Processor {
    Processor::new(VALIDATE_REQ_SIG, Arc::new(ResignHandle))
}

struct ResignHandle;

#[async_trait]
impl Handle for ResignHandle {
    async fn handle(&self, req: &mut Request<'_>) {
        req.sign().await;
    }
}

/// Send 阶段：执行 HTTP 往返
pub fn send() -> Processor {
    Processor::new(SEND, Arc::new(SendHandle))
}

struct SendHandle;

#[async_trait]
impl Handle for SendHandle {
    async fn handle(&self, req: &mut Request<'_>) {
        let url = match req.http.full_url() {
            Ok(u) => u,
            Err(e) => {
                req.set_error(e);
                return;
            }
        };
        // 跟随重定向与仅传输两种发送器按请求开关二选一
        let client = if req.disable_follow_redirects {
            req.endpoint.no_redirect.clone()
        } else {
            req.endpoint.client.clone()
        };
        let mut builder = client
            .request(req.http.method.clone(), url.clone())
            .headers(req.http.headers.clone());
        if let Body::Bytes(bytes) = &req.http.body {
            builder = builder.body(bytes.clone());
        }
        let cancel = req.cancel.clone();
        log::debug!("{} {}", req.http.method, url);

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            result = builder.send() => Some(result),
        };
        let resp = match outcome {
            None => {
                req.set_error(canceled(req.operation.name));
                req.retryable = false;
                return;
            }
            Some(Err(e)) => {
                // 合成响应：从错误文本里尽量扒出一个状态码
                let status = infer_status(&e);
                req.response = Some(HttpResponse {
                    status,
                    headers: HeaderMap::new(),
                });
                req.response_body.clear();
                log::warn!("transport failure for {}: {e}", req.operation.name);
                req.set_error(ApiError::with_cause(
                    codes::REQUEST_ERROR,
                    format!("send failed: {}", req.operation.name),
                    e,
                ));
                return;
            }
            Some(Ok(resp)) => resp,
        };

        let status = resp.status().as_u16();
        let headers = resp.headers().clone();
        let body = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            result = resp.bytes() => Some(result),
        };
        match body {
            None => {
                req.response = Some(HttpResponse { status, headers });
                req.set_error(canceled(req.operation.name));
                req.retryable = false;
            }
            Some(Err(e)) => {
                req.response = Some(HttpResponse { status, headers });
                req.set_error(ApiError::with_cause(
                    codes::REQUEST_ERROR,
                    format!("failed to read response body: {}", req.operation.name),
                    e,
                ));
            }
            Some(Ok(bytes)) => {
                req.response = Some(HttpResponse { status, headers });
                req.response_body = bytes.to_vec();
            }
        }
    }
}

fn canceled(operation: &str) -> ApiError {
    ApiError::new(codes::CANCELED, format!("request canceled: {operation}"))
}

fn infer_status(e: &reqwest::Error) -> u16 {
    if let Some(status) = e.status() {
        return status.as_u16();
    }
    extract_status(&e.to_string())
}

/// 从传输错误文本中提取三位状态码（如 URL 错误里的 "301"）
fn extract_status(text: &str) -> u16 {
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i].is_ascii_digit() {
            let start = i;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
            if i - start == 3 {
                if let Ok(code) = text[start..i].parse::<u16>() {
                    if (100..=599).contains(&code) {
                        return code;
                    }
                }
            }
        } else {
            i += 1;
        }
    }
    0
}

/// ValidateResponse 阶段：状态码 0 或 ≥300 视为失败
///
/// 错误码取 HTTP 状态文本，信息为操作名；随后 UnmarshalError 阶段
/// 可用响应体进一步充实错误。
pub fn validate_response() -> Processor {
    Processor::from_fn(VALIDATE_RESPONSE, validate_response_fn)
}

fn validate_response_fn(req: &mut Request<'_>) {
    let status = req.response.as_ref().map(|r| r.status).unwrap_or(0);
    if status == 0 || status >= 300 {
        req.set_error(ApiError::new(status_text(status), req.operation.name));
    }
}

/// Build 阶段：绑定器写请求（路径占位符、查询、header），随后路径规范化
pub fn rest_build() -> Processor {
    Processor::from_fn(REST_BUILD, rest_build_fn)
}

fn rest_build_fn(req: &mut Request<'_>) {
    if let Some(input) = req.input {
        let mut binder = RequestBinder::new(&mut req.http);
        if let Err(e) = input.write_request(&mut binder) {
            req.set_error(e);
            return;
        }
    }
    req.http.path = clean_path(&req.http.path);
}
