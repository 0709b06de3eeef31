//! saas-manager 服务门面：多租户应用与订阅

use cumulus_common::request::Operation;
use cumulus_common::session::Session;
use cumulus_common::{ApiError, CancellationToken, Method};
use cumulus_macro::{ApiInput, ApiOutput};
use serde::Deserialize;

use crate::{ServiceHandle, ready};

pub const SERVICE_ID: &str = "saas-manager";
pub const API_VERSION: &str = "v1";

pub struct SaasManagerClient {
    inner: Result<ServiceHandle, ApiError>,
}

impl SaasManagerClient {
    pub fn new(session: &Session) -> Self {
        Self {
            inner: ServiceHandle::new(session, SERVICE_ID, API_VERSION),
        }
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.inner = self.inner.map(|h| h.with_cancellation(cancel));
        self
    }

    pub async fn get_application(&self) -> Result<Application, ApiError> {
        let handle = ready(&self.inner)?;
        let mut output = Application::default();
        handle
            .invoke(
                Operation::new("GetApplication", Method::GET, "/application"),
                None,
                Some(&mut output),
            )
            .await?;
        Ok(output)
    }

    pub async fn list_subscriptions(
        &self,
        input: &ListSubscriptionsInput,
    ) -> Result<SubscriptionList, ApiError> {
        let handle = ready(&self.inner)?;
        let mut output = SubscriptionList::default();
        handle
            .invoke(
                Operation::new(
                    "ListSubscriptions",
                    Method::GET,
                    "/application/subscriptions",
                ),
                Some(input),
                Some(&mut output),
            )
            .await?;
        Ok(output)
    }

    /// 注销一个租户的订阅；服务端异步处理
    pub async fn unsubscribe_tenant(&self, input: &UnsubscribeTenantInput) -> Result<(), ApiError> {
        let handle = ready(&self.inner)?;
        handle
            .invoke(
                Operation::new(
                    "UnsubscribeTenant",
                    Method::DELETE,
                    "/application/tenants/{tenantId}/subscriptions",
                ),
                Some(input),
                None,
            )
            .await
    }
}

#[derive(Debug, Clone, Default, ApiInput)]
pub struct ListSubscriptionsInput {
    /// 按订阅状态筛选（SUBSCRIBED、IN_PROCESS 等），同键多条目
    #[api(query = "state")]
    pub states: Vec<Option<String>>,
    #[api(query = "tenantId")]
    pub tenant_id: String,
}

#[derive(Debug, Clone, Default, ApiInput)]
pub struct UnsubscribeTenantInput {
    #[api(uri = "tenantId")]
    pub tenant_id: String,
}

#[derive(Debug, Clone, Default, Deserialize, ApiOutput)]
#[serde(rename_all = "camelCase", default)]
pub struct Application {
    pub app_id: String,
    pub app_name: String,
    pub commercial_app_name: String,
    pub global_account_id: String,
    pub app_urls: serde_json::Value,
}

#[derive(Debug, Clone, Default, Deserialize, ApiOutput)]
#[serde(rename_all = "camelCase", default)]
pub struct SubscriptionList {
    pub subscriptions: Vec<Subscription>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Subscription {
    pub app_name: String,
    pub consumer_tenant_id: String,
    pub consumer_subdomain: String,
    pub state: String,
    pub url: String,
    pub error: String,
}
