use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;

use crate::error::{codes, is_canceled, is_retryable};
use crate::pipeline::{Handle, Processor};
use crate::request::Request;

pub const CLASSIFY: &str = "retry.Classify";
pub const BACKOFF: &str = "retry.Backoff";

/// 重试策略配置
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// 最大重试次数
    pub max_attempts: u32,
    /// 基础延迟时间（毫秒）
    pub base_delay_ms: u64,
    /// 最大延迟时间（毫秒）
    pub max_delay_ms: u64,
    /// 指数底数
    pub exponential_base: f64,
    /// 随机抖动比例 (0.0-1.0)
    pub jitter_ratio: f64,
    /// 仅对幂等方法重试
    pub idempotent_only: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 100,
            max_delay_ms: 30000, // 30秒
            exponential_base: 2.0,
            jitter_ratio: 0.1,
            idempotent_only: true,
        }
    }
}

impl RetryPolicy {
    /// 创建指数重试策略
    pub fn exponential(max_attempts: u32, base_delay_ms: u64) -> Self {
        Self {
            max_attempts,
            base_delay_ms,
            ..Default::default()
        }
    }

    /// 创建固定延迟重试策略
    pub fn fixed(max_attempts: u32, delay_ms: u64) -> Self {
        Self {
            max_attempts,
            base_delay_ms: delay_ms,
            max_delay_ms: delay_ms,
            exponential_base: 1.0,
            jitter_ratio: 0.0,
            idempotent_only: true,
        }
    }

    /// 计算重试延迟时间
    pub fn calculate_delay(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::from_millis(0);
        }

        // 指数退避: base_delay * exponential_base^(attempt-1)
        let exponential_delay =
            self.base_delay_ms as f64 * self.exponential_base.powi((attempt - 1) as i32);

        // 应用最大延迟限制
        let capped_delay = exponential_delay.min(self.max_delay_ms as f64);

        // 添加随机抖动
        let jitter = if self.jitter_ratio > 0.0 {
            let max_jitter = capped_delay * self.jitter_ratio;
            fastrand::f64() * max_jitter
        } else {
            0.0
        };

        Duration::from_millis((capped_delay + jitter) as u64)
    }

    /// 判断HTTP状态码是否应该重试
    pub fn should_retry_status(&self, status: u16) -> bool {
        match status {
            // 5xx 服务器错误 - 应该重试
            500..=599 => true,
            // 429 限流 - 应该重试
            429 => true,
            // 408 请求超时 - 应该重试
            408 => true,
            // 其他状态码不重试
            _ => false,
        }
    }

    /// 判断HTTP方法是否幂等
    pub fn is_idempotent_method(method: &Method) -> bool {
        matches!(
            *method,
            Method::GET | Method::HEAD | Method::PUT | Method::DELETE
        )
    }

    /// Retry 阶段处理器：按策略标记请求为可重试
    ///
    /// 传输层失败总在覆盖范围内；有响应状态码时按 `should_retry_status`
    /// 判断。取消过的请求绝不标记。
    pub fn classify_processor(self) -> Processor {
        Processor::new(CLASSIFY, Arc::new(ClassifyHandle { policy: self }))
    }

    /// AfterRetry 阶段处理器：按策略退避（可被取消打断）
    pub fn backoff_processor(self) -> Processor {
        Processor::new(BACKOFF, Arc::new(BackoffHandle { policy: self }))
    }

    /// 从字符串解析重试配置
    ///
    /// 支持格式:
    /// - "exponential(max_attempts=3, base_delay=100ms)"
    /// - "fixed(max_attempts=5, delay=200ms)"
    /// - "exponential(3, 100ms)" // 简化格式
    pub fn parse(config: &str) -> Result<Self, String> {
        let config = config.trim();

        if let Some(params) = config
            .strip_prefix("exponential(")
            .and_then(|s| s.strip_suffix(')'))
        {
            Self::parse_exponential_config(params)
        } else if let Some(params) = config
            .strip_prefix("fixed(")
            .and_then(|s| s.strip_suffix(')'))
        {
            Self::parse_fixed_config(params)
        } else {
            Err(format!("Unsupported retry config format: {config}"))
        }
    }

    fn parse_exponential_config(params: &str) -> Result<Self, String> {
        let mut policy = RetryPolicy::default();

        for param in params.split(',') {
            let param = param.trim();
            if param.is_empty() {
                continue;
            }

            if let Some((key, value)) = param.split_once('=') {
                let key = key.trim();
                let value = value.trim();

                match key {
                    "max_attempts" => {
                        policy.max_attempts = value
                            .parse()
                            .map_err(|_| format!("Invalid max_attempts: {value}"))?;
                    }
                    "base_delay" => {
                        policy.base_delay_ms = Self::parse_duration(value)?;
                    }
                    "max_delay" => {
                        policy.max_delay_ms = Self::parse_duration(value)?;
                    }
                    "exponential_base" => {
                        policy.exponential_base = value
                            .parse()
                            .map_err(|_| format!("Invalid exponential_base: {value}"))?;
                    }
                    "jitter_ratio" => {
                        policy.jitter_ratio = value
                            .parse()
                            .map_err(|_| format!("Invalid jitter_ratio: {value}"))?;
                    }
                    "idempotent_only" => {
                        policy.idempotent_only = value
                            .parse()
                            .map_err(|_| format!("Invalid idempotent_only: {value}"))?;
                    }
                    _ => return Err(format!("Unknown parameter: {key}")),
                }
            } else {
                // 简化格式：exponential(3, 100ms)
                let parts: Vec<&str> = params.split(',').map(|s| s.trim()).collect();
                if !parts.is_empty() {
                    policy.max_attempts = parts[0]
                        .parse()
                        .map_err(|_| format!("Invalid max_attempts: {}", parts[0]))?;
                }
                if parts.len() >= 2 {
                    policy.base_delay_ms = Self::parse_duration(parts[1])?;
                }
                break;
            }
        }

        Ok(policy)
    }

    fn parse_fixed_config(params: &str) -> Result<Self, String> {
        let mut policy = RetryPolicy {
            exponential_base: 1.0, // 固定延迟
            ..Default::default()
        };

        for param in params.split(',') {
            let param = param.trim();
            if param.is_empty() {
                continue;
            }

            if let Some((key, value)) = param.split_once('=') {
                let key = key.trim();
                let value = value.trim();

                match key {
                    "max_attempts" => {
                        policy.max_attempts = value
                            .parse()
                            .map_err(|_| format!("Invalid max_attempts: {value}"))?;
                    }
                    "delay" => {
                        let delay = Self::parse_duration(value)?;
                        policy.base_delay_ms = delay;
                        policy.max_delay_ms = delay;
                    }
                    _ => return Err(format!("Unknown parameter: {key}")),
                }
            }
        }

        Ok(policy)
    }

    fn parse_duration(duration_str: &str) -> Result<u64, String> {
        let duration_str = duration_str.trim();

        if let Some(ms) = duration_str.strip_suffix("ms") {
            ms.parse()
                .map_err(|_| format!("Invalid milliseconds: {duration_str}"))
        } else if let Some(s) = duration_str.strip_suffix('s') {
            let seconds: u64 = s
                .parse()
                .map_err(|_| format!("Invalid seconds: {duration_str}"))?;
            Ok(seconds * 1000)
        } else {
            // 默认按毫秒处理
            duration_str
                .parse()
                .map_err(|_| format!("Invalid duration (expected ms or s suffix): {duration_str}"))
        }
    }
}

struct ClassifyHandle {
    policy: RetryPolicy,
}

#[async_trait]
impl Handle for ClassifyHandle {
    async fn handle(&self, req: &mut Request<'_>) {
        let Some(err) = req.error() else {
            return;
        };
        if is_canceled(err) || req.cancel.is_cancelled() {
            req.retryable = false;
            return;
        }
        if self.policy.idempotent_only && !RetryPolicy::is_idempotent_method(&req.http.method) {
            req.retryable = false;
            return;
        }
        if is_retryable(err) {
            req.retryable = true;
            return;
        }
        // 响应分类失败：仅策略覆盖的状态码可重试
        if err.code() != codes::SERIALIZATION {
            if let Some(status) = req.response.as_ref().map(|r| r.status) {
                if self.policy.should_retry_status(status) {
                    req.retryable = true;
                }
            }
        }
    }
}

struct BackoffHandle {
    policy: RetryPolicy,
}

#[async_trait]
impl Handle for BackoffHandle {
    async fn handle(&self, req: &mut Request<'_>) {
        if !req.retryable {
            return;
        }
        let delay = self.policy.calculate_delay(req.retry_count() as u32 + 1);
        if delay.is_zero() {
            return;
        }
        let cancel = req.cancel.clone();
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                req.retryable = false;
            }
            _ = tokio::time::sleep(delay) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;

    #[test]
    fn test_retry_policy_default() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.base_delay_ms, 100);
        assert_eq!(policy.exponential_base, 2.0);
    }

    #[test]
    fn test_calculate_delay() {
        let policy = RetryPolicy::exponential(3, 100);

        assert_eq!(policy.calculate_delay(0), Duration::from_millis(0));
        assert!(policy.calculate_delay(1).as_millis() >= 100);
        assert!(policy.calculate_delay(2).as_millis() >= 200);
        assert!(policy.calculate_delay(3).as_millis() >= 400);
    }

    #[test]
    fn test_should_retry_status() {
        let policy = RetryPolicy::default();

        assert!(policy.should_retry_status(500));
        assert!(policy.should_retry_status(502));
        assert!(policy.should_retry_status(429));
        assert!(policy.should_retry_status(408));

        assert!(!policy.should_retry_status(200));
        assert!(!policy.should_retry_status(400));
        assert!(!policy.should_retry_status(404));
    }

    #[test]
    fn test_idempotent_methods() {
        assert!(RetryPolicy::is_idempotent_method(&Method::GET));
        assert!(RetryPolicy::is_idempotent_method(&Method::PUT));
        assert!(RetryPolicy::is_idempotent_method(&Method::DELETE));
        assert!(!RetryPolicy::is_idempotent_method(&Method::POST));
        assert!(!RetryPolicy::is_idempotent_method(&Method::PATCH));
    }

    #[test]
    fn test_parse_exponential_simple() {
        let result = RetryPolicy::parse("exponential(3, 100ms)").unwrap();

        assert_eq!(result.max_attempts, 3);
        assert_eq!(result.base_delay_ms, 100);
        assert_eq!(result.exponential_base, 2.0);
    }

    #[test]
    fn test_parse_exponential_detailed() {
        let result =
            RetryPolicy::parse("exponential(max_attempts=5, base_delay=200ms, max_delay=10s)")
                .unwrap();

        assert_eq!(result.max_attempts, 5);
        assert_eq!(result.base_delay_ms, 200);
        assert_eq!(result.max_delay_ms, 10000);
    }

    #[test]
    fn test_parse_fixed() {
        let result = RetryPolicy::parse("fixed(max_attempts=3, delay=500ms)").unwrap();

        assert_eq!(result.max_attempts, 3);
        assert_eq!(result.base_delay_ms, 500);
        assert_eq!(result.exponential_base, 1.0);
    }

    #[test]
    fn test_parse_rejects_unknown_format() {
        assert!(RetryPolicy::parse("linear(3)").is_err());
        assert!(RetryPolicy::parse("exponential(max_attempts=x)").is_err());
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(RetryPolicy::parse_duration("100ms").unwrap(), 100);
        assert_eq!(RetryPolicy::parse_duration("2s").unwrap(), 2000);
        assert_eq!(RetryPolicy::parse_duration("500").unwrap(), 500);
    }

    #[test]
    fn test_classification_is_pure_over_error_code() {
        // 传输错误可重试、取消不可重试的判定由 error 模块帮助函数承担
        let transport = ApiError::new(codes::REQUEST_ERROR, "send failed");
        assert!(is_retryable(&transport));
        let canceled = ApiError::new(codes::CANCELED, "canceled");
        assert!(!is_retryable(&canceled));
    }
}
