//! JSON 编解码处理器
//!
//! 由服务门面安装在会话蓝图之上；`UnmarshalMeta` 按约定是空操作挂钩，
//! 调用方可按名替换。

use reqwest::header::{CONTENT_TYPE, HeaderValue};

use crate::error::ApiError;
use crate::pipeline::Processor;
use crate::request::{Body, Request};

pub const BUILD: &str = "json.Build";
pub const MARSHAL: &str = "json.Marshal";
pub const UNMARSHAL: &str = "json.Unmarshal";
pub const UNMARSHAL_META: &str = "json.UnmarshalMeta";
pub const UNMARSHAL_ERROR: &str = "json.UnmarshalError";

/// Build 阶段：未设置时补默认 `Content-Type: application/json`
pub fn build() -> Processor {
    Processor::from_fn(BUILD, build_fn)
}

fn build_fn(req: &mut Request<'_>) {
    if !req.http.headers.contains_key(CONTENT_TYPE) {
        req.http
            .headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    }
}

/// Build 阶段：把输入的请求体字段编组为 JSON 字节
pub fn marshal() -> Processor {
    Processor::from_fn(MARSHAL, marshal_fn)
}

fn marshal_fn(req: &mut Request<'_>) {
    let Some(input) = req.input else {
        return;
    };
    match input.body_json() {
        Ok(Some(value)) => match serde_json::to_vec(&value) {
            Ok(bytes) => req.http.body = Body::from(bytes),
            Err(e) => req.set_error(ApiError::serialization("body", e)),
        },
        Ok(None) => req.http.body = Body::None,
        Err(e) => req.set_error(e),
    }
}

/// Unmarshal 阶段：把响应字节解码进非空输出
pub fn unmarshal() -> Processor {
    Processor::from_fn(UNMARSHAL, unmarshal_fn)
}

fn unmarshal_fn(req: &mut Request<'_>) {
    if req.response_body.is_empty() {
        return;
    }
    if let Some(out) = req.output.as_deref_mut() {
        if let Err(e) = out.unmarshal_json(&req.response_body) {
            req.set_error(e);
        }
    }
}

/// UnmarshalMeta 阶段：空操作占位挂钩
pub fn unmarshal_meta() -> Processor {
    Processor::from_fn(UNMARSHAL_META, unmarshal_meta_fn)
}

fn unmarshal_meta_fn(_req: &mut Request<'_>) {}

/// UnmarshalError 阶段：尽力把错误响应体解码进输出
///
/// 解码失败不覆盖已置位的响应错误。
pub fn unmarshal_error() -> Processor {
    Processor::from_fn(UNMARSHAL_ERROR, unmarshal_error_fn)
}

fn unmarshal_error_fn(req: &mut Request<'_>) {
    if req.response_body.is_empty() {
        return;
    }
    if let Some(out) = req.output.as_deref_mut() {
        if let Err(e) = out.unmarshal_json(&req.response_body) {
            log::debug!("error body did not decode into output: {e}");
        }
    }
}
