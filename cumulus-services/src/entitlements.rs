//! entitlements 服务门面：服务计划的查询与分配

use cumulus_common::request::Operation;
use cumulus_common::session::Session;
use cumulus_common::{ApiError, CancellationToken, Method};
use cumulus_macro::{ApiInput, ApiOutput};
use serde::Deserialize;

use crate::{ServiceHandle, ready};

pub const SERVICE_ID: &str = "entitlements";
pub const API_VERSION: &str = "v1";

pub struct EntitlementsClient {
    inner: Result<ServiceHandle, ApiError>,
}

impl EntitlementsClient {
    pub fn new(session: &Session) -> Self {
        Self {
            inner: ServiceHandle::new(session, SERVICE_ID, API_VERSION),
        }
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.inner = self.inner.map(|h| h.with_cancellation(cancel));
        self
    }

    pub async fn list_entitlements(
        &self,
        input: &ListEntitlementsInput,
    ) -> Result<Entitlements, ApiError> {
        let handle = ready(&self.inner)?;
        let mut output = Entitlements::default();
        handle
            .invoke(
                Operation::new("ListEntitlements", Method::GET, "/entitlements"),
                Some(input),
                Some(&mut output),
            )
            .await?;
        Ok(output)
    }

    /// 调整子账户的服务计划分配；服务端异步处理，仅返回受理状态
    pub async fn set_entitlements(&self, input: &SetEntitlementsInput) -> Result<(), ApiError> {
        let handle = ready(&self.inner)?;
        handle
            .invoke(
                Operation::new("SetEntitlements", Method::PUT, "/entitlements"),
                Some(input),
                None,
            )
            .await
    }
}

#[derive(Debug, Clone, Default, ApiInput)]
pub struct ListEntitlementsInput {
    #[api(query = "subaccountGUID")]
    pub subaccount_guid: String,
    /// 限定返回的服务名集合，逗号连接上线
    #[api(query = "services")]
    pub services: Vec<String>,
}

#[derive(Debug, Clone, Default, ApiInput)]
pub struct SetEntitlementsInput {
    /// 服务端文档定义的分配结构，按不透明 JSON 透传
    #[api(body, name = "subaccountServicePlans")]
    pub subaccount_service_plans: serde_json::Value,
}

#[derive(Debug, Clone, Default, Deserialize, ApiOutput)]
#[serde(rename_all = "camelCase", default)]
pub struct Entitlements {
    pub entitled_services: Vec<EntitledService>,
    pub assigned_services: Vec<EntitledService>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EntitledService {
    pub name: String,
    pub display_name: String,
    pub business_category: String,
    pub service_plans: Vec<ServicePlan>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServicePlan {
    pub name: String,
    pub display_name: String,
    pub amount: i64,
    pub remaining_amount: i64,
    pub unlimited: bool,
}
