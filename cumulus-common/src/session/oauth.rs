use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;

/// OAuth2 授权模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantType {
    ClientCredentials,
    AuthorizationCode,
    Password,
}

/// 凭证在令牌请求中的投递方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStyle {
    /// client_id/client_secret 放入表单参数
    InParams,
    /// HTTP Basic 认证头
    InHeader,
}

/// 单个端点的 OAuth2 配置
#[derive(Debug, Clone, Default)]
pub struct OAuthConfig {
    pub grant_type: Option<GrantType>,
    pub client_id: String,
    pub client_secret: String,
    pub token_url: String,
    pub auth_url: Option<String>,
    pub redirect_url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub scopes: Vec<String>,
    pub endpoint_params: HashMap<String, Vec<String>>,
    pub auth_style: Option<AuthStyle>,
    pub timeout: Option<Duration>,
}

impl OAuthConfig {
    pub fn client_credentials(client_id: &str, client_secret: &str, token_url: &str) -> Self {
        Self {
            grant_type: Some(GrantType::ClientCredentials),
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            token_url: token_url.to_string(),
            ..Default::default()
        }
    }

    /// 校验配置完整性；缺项用 anyhow 报告具体字段
    pub fn validate(&self) -> Result<()> {
        let grant_type = match self.grant_type {
            Some(g) => g,
            None => bail!("oauth config: grant_type is required"),
        };
        if self.client_id.trim().is_empty() {
            bail!("oauth config: client_id is required");
        }
        if self.token_url.trim().is_empty() {
            bail!("oauth config: token_url is required");
        }
        url::Url::parse(&self.token_url)
            .with_context(|| format!("oauth config: invalid token_url {:?}", self.token_url))?;

        match grant_type {
            GrantType::ClientCredentials => {
                if self.client_secret.trim().is_empty() {
                    bail!("oauth config: client_secret is required for client_credentials");
                }
            }
            GrantType::AuthorizationCode => {
                let auth_url = self.auth_url.as_deref().unwrap_or("");
                if auth_url.trim().is_empty() {
                    bail!("oauth config: auth_url is required for authorization_code");
                }
                url::Url::parse(auth_url)
                    .with_context(|| format!("oauth config: invalid auth_url {auth_url:?}"))?;
            }
            GrantType::Password => {
                if self.username.as_deref().unwrap_or("").is_empty() {
                    bail!("oauth config: username is required for password grant");
                }
                if self.password.as_deref().unwrap_or("").is_empty() {
                    bail!("oauth config: password is required for password grant");
                }
            }
        }
        Ok(())
    }
}

/// 把 OAuth 配置变成可用的 HTTP 传输
///
/// 实现方负责令牌获取与刷新；运行时只关心拿到的 `reqwest::Client`
/// 已经带上了认证。测试可以注入不做认证的实现。
#[async_trait]
pub trait CredentialClient: Send + Sync {
    async fn transport(
        &self,
        config: &OAuthConfig,
        follow_redirects: bool,
    ) -> Result<reqwest::Client>;
}

/// 不附加认证的传输构造器
///
/// 尊重配置里的超时与重定向开关，其余 OAuth 字段忽略。适用于
/// 网关已处理认证、或测试场景。
#[derive(Debug, Default)]
pub struct PlainTransport;

#[async_trait]
impl CredentialClient for PlainTransport {
    async fn transport(
        &self,
        config: &OAuthConfig,
        follow_redirects: bool,
    ) -> Result<reqwest::Client> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        if !follow_redirects {
            builder = builder.redirect(reqwest::redirect::Policy::none());
        }
        builder.build().context("failed to build http transport")
    }
}
