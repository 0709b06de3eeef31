//! 会话与端点注册表
//!
//! 把声明式的 [`Config`] 物化为可复用的运行时 [`Session`]：
//! 每个服务标识对应一个带认证传输的 [`Endpoint`]，处理器注册表
//! 从默认蓝图初始化。[`Session::service_config`] 返回的副本隔离了
//! 各服务门面的处理器安装。

pub mod oauth;

use std::collections::HashMap;

use log::{debug, info};

use crate::error::{ApiError, codes};
use crate::pipeline::Handlers;
use crate::processors::default_handlers;

pub use oauth::{AuthStyle, CredentialClient, GrantType, OAuthConfig, PlainTransport};

/// 单个端点的声明式配置
#[derive(Debug, Clone, Default)]
pub struct EndpointConfig {
    /// 形如 "https://api.example.com" 的基础地址
    pub host: String,
    /// 端点私有的 OAuth2 配置；缺省时回退到 [`Config::default_oauth`]
    pub oauth: Option<OAuthConfig>,
}

/// 会话的声明式配置
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub endpoints: HashMap<String, EndpointConfig>,
    pub default_oauth: Option<OAuthConfig>,
    pub max_retries: u8,
}

/// 运行时端点：基础地址 + 已认证的 HTTP 传输
///
/// `no_redirect` 是同配置、但不跟随重定向的传输，供请求按需选用。
#[derive(Debug, Clone)]
pub struct Endpoint {
    pub host: String,
    pub client: reqwest::Client,
    pub no_redirect: reqwest::Client,
}

/// 物化后的运行时配置
#[derive(Debug, Clone, Default)]
pub struct RuntimeConfig {
    pub endpoints: HashMap<String, Endpoint>,
    pub max_retries: u8,
}

/// 单个服务的运行时包：端点、处理器注册表副本、重试上限
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub endpoint: Endpoint,
    pub handlers: Handlers,
    pub max_retries: u8,
}

/// 配置好的、可复用的端点与处理器默认值持有者
#[derive(Debug)]
pub struct Session {
    runtime: RuntimeConfig,
    handlers: Handlers,
}

impl Session {
    /// 从配置构建会话，为每个端点获取传输
    pub async fn new(config: &Config, creds: &dyn CredentialClient) -> Result<Self, ApiError> {
        let mut session = Self {
            runtime: RuntimeConfig {
                endpoints: HashMap::new(),
                max_retries: config.max_retries,
            },
            handlers: default_handlers(),
        };
        session.hard_update(config, creds).await?;
        Ok(session)
    }

    /// 全量替换端点表
    ///
    /// 为新配置里的每个端点重新获取传输；运行时存在而新配置
    /// 不含的端点被删除。
    pub async fn hard_update(
        &mut self,
        config: &Config,
        creds: &dyn CredentialClient,
    ) -> Result<(), ApiError> {
        let mut endpoints = HashMap::with_capacity(config.endpoints.len());
        for (service_id, endpoint_config) in &config.endpoints {
            let endpoint =
                build_endpoint(service_id, endpoint_config, config.default_oauth.as_ref(), creds)
                    .await?;
            endpoints.insert(service_id.clone(), endpoint);
        }
        info!("session endpoints replaced: {} configured", endpoints.len());
        self.runtime.endpoints = endpoints;
        self.runtime.max_retries = config.max_retries;
        Ok(())
    }

    /// 增量安装端点：只添加新的，已有的保持不动，不删除任何端点
    pub async fn light_update(
        &mut self,
        config: &Config,
        creds: &dyn CredentialClient,
    ) -> Result<(), ApiError> {
        for (service_id, endpoint_config) in &config.endpoints {
            if self.runtime.endpoints.contains_key(service_id) {
                continue;
            }
            let endpoint =
                build_endpoint(service_id, endpoint_config, config.default_oauth.as_ref(), creds)
                    .await?;
            debug!("session endpoint installed: {service_id}");
            self.runtime.endpoints.insert(service_id.clone(), endpoint);
        }
        Ok(())
    }

    /// 取某个服务的运行时包
    ///
    /// 未知服务标识立即失败；非空但无法解析的主机同样失败。
    /// 空主机放行，由校验阶段的端点校验器报 `MissingEndpoint`。
    pub fn service_config(&self, service_id: &str) -> Result<ServiceConfig, ApiError> {
        let endpoint = self.runtime.endpoints.get(service_id).ok_or_else(|| {
            ApiError::new(
                codes::MISSING_ENDPOINT,
                format!("no endpoint configured for service '{service_id}'"),
            )
        })?;
        let host = endpoint.host.trim();
        if !host.is_empty() {
            url::Url::parse(host).map_err(|e| {
                ApiError::with_cause(
                    codes::REQUEST_ERROR,
                    format!("malformed endpoint host for service '{service_id}': {host:?}"),
                    e,
                )
            })?;
        }
        Ok(ServiceConfig {
            endpoint: endpoint.clone(),
            handlers: self.handlers.copy(),
            max_retries: self.runtime.max_retries,
        })
    }

    /// 已配置的服务标识集合
    pub fn service_ids(&self) -> Vec<&str> {
        self.runtime.endpoints.keys().map(String::as_str).collect()
    }
}

async fn build_endpoint(
    service_id: &str,
    endpoint_config: &EndpointConfig,
    default_oauth: Option<&OAuthConfig>,
    creds: &dyn CredentialClient,
) -> Result<Endpoint, ApiError> {
    let oauth = endpoint_config.oauth.as_ref().or(default_oauth).ok_or_else(|| {
        ApiError::new(
            codes::REQUEST_ERROR,
            format!("no oauth config for endpoint '{service_id}' and no default provided"),
        )
    })?;
    oauth.validate().map_err(|e| {
        ApiError::with_cause(
            codes::REQUEST_ERROR,
            format!("invalid oauth config for endpoint '{service_id}'"),
            e,
        )
    })?;
    let client = creds.transport(oauth, true).await.map_err(|e| {
        ApiError::with_cause(
            codes::REQUEST_ERROR,
            format!("failed to acquire transport for endpoint '{service_id}'"),
            e,
        )
    })?;
    let no_redirect = creds.transport(oauth, false).await.map_err(|e| {
        ApiError::with_cause(
            codes::REQUEST_ERROR,
            format!("failed to acquire no-redirect transport for endpoint '{service_id}'"),
            e,
        )
    })?;
    Ok(Endpoint {
        host: endpoint_config.host.clone(),
        client,
        no_redirect,
    })
}
