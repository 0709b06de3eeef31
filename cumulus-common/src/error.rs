use std::fmt;
use std::sync::Arc;

/// 核心使用的错误码常量
pub mod codes {
    /// 绑定器或编解码失败
    pub const SERIALIZATION: &str = "Serialization";
    /// 校验阶段发现服务端点主机为空
    pub const MISSING_ENDPOINT: &str = "MissingEndpoint";
    /// 发送阶段的传输层失败
    pub const REQUEST_ERROR: &str = "RequestError";
    /// 调用途中取消
    pub const CANCELED: &str = "CanceledError";
    /// 响应状态码为 0 时的兜底错误码
    pub const UNKNOWN: &str = "UnknownError";
}

/// 带错误码的错误值
///
/// 核心统一的错误载体：错误码 + 可读信息 + 可选的底层原因。
/// 响应校验会以 HTTP 状态文本（如 "Not Found"）作为错误码。
#[derive(Debug, Clone)]
pub struct ApiError {
    code: String,
    message: String,
    cause: Option<Arc<anyhow::Error>>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            cause: None,
        }
    }

    /// 附带底层原因的错误
    pub fn with_cause(
        code: impl Into<String>,
        message: impl Into<String>,
        cause: impl Into<anyhow::Error>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            cause: Some(Arc::new(cause.into())),
        }
    }

    /// 构造一个指明字段名的序列化错误
    pub fn serialization(field: &str, cause: impl Into<anyhow::Error>) -> Self {
        Self::with_cause(
            codes::SERIALIZATION,
            format!("failed to serialize field '{field}'"),
            cause,
        )
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn cause(&self) -> Option<&anyhow::Error> {
        self.cause.as_deref()
    }

    /// 替换可读信息，错误码与原因保持不变
    pub fn set_message(&mut self, message: impl Into<String>) {
        self.message = message.into();
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)?;
        if let Some(cause) = &self.cause {
            write!(f, " (caused by: {cause})")?;
        }
        Ok(())
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_ref()
            .map(|c| c.as_ref().as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// 判断错误是否由调用取消引起
pub fn is_canceled(err: &ApiError) -> bool {
    err.code() == codes::CANCELED
}

/// 判断错误是否为可重试的传输层失败
pub fn is_retryable(err: &ApiError) -> bool {
    err.code() == codes::REQUEST_ERROR
}

/// 识别底层原因是否为域名解析失败
///
/// 对原因链做文本匹配；边界上的调用方可据此替换为命名的 DNS 错误。
pub fn is_dns_error(err: &ApiError) -> bool {
    let Some(cause) = err.cause() else {
        return false;
    };
    cause.chain().any(|e| {
        let text = e.to_string();
        text.contains("dns error")
            || text.contains("failed to lookup address")
            || text.contains("Name or service not known")
            || text.contains("no such host")
    })
}
