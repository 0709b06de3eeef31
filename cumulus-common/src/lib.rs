//! cumulus-common：云平台控制面客户端的运行时核心
//!
//! 分层结构：
//! - [`pipeline`] 处理器列表与阶段注册表
//! - [`bind`] 声明式请求绑定与响应读取
//! - [`request`] 请求生命周期（构建、签名、发送、重试）
//! - [`processors`] 会话蓝图安装的默认处理器与 JSON 编解码
//! - [`retry`] 重试策略与退避处理器
//! - [`session`] 配置到运行时会话的物化
//!
//! 服务门面由 cumulus-services 提供，输入/输出派生宏在 cumulus-macro。

pub mod bind;
pub mod error;
pub mod pipeline;
pub mod processors;
pub mod request;
pub mod retry;
pub mod session;

pub use bind::{ApiInput, ApiOutput, RequestBinder, ResponseView, TimestampFormat};
pub use error::{ApiError, codes, is_canceled, is_dns_error, is_retryable};
pub use pipeline::{Handle, HandlerList, Handlers, Processor, Stage};
pub use request::{Body, ClientInfo, HttpRequest, HttpResponse, Operation, Request, status_text};
pub use retry::RetryPolicy;
pub use session::{
    Config, CredentialClient, Endpoint, EndpointConfig, OAuthConfig, PlainTransport, RuntimeConfig,
    ServiceConfig, Session,
};

// 下游统一从这里取 HTTP 基础类型与取消令牌
pub use reqwest::header::HeaderMap;
pub use reqwest::{Client, Method, StatusCode};
pub use tokio_util::sync::CancellationToken;

// 派生宏生成的代码经由这些再导出定位依赖
pub use chrono;
pub use serde_json;
