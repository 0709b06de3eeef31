//! accounts 服务门面：全局账户与子账户管理

use cumulus_common::request::Operation;
use cumulus_common::session::Session;
use cumulus_common::{ApiError, CancellationToken, Method};
use cumulus_macro::{ApiInput, ApiOutput};
use serde::Deserialize;

use crate::{ServiceHandle, ready};

pub const SERVICE_ID: &str = "accounts";
pub const API_VERSION: &str = "v1";

pub struct AccountsClient {
    inner: Result<ServiceHandle, ApiError>,
}

impl AccountsClient {
    pub fn new(session: &Session) -> Self {
        Self {
            inner: ServiceHandle::new(session, SERVICE_ID, API_VERSION),
        }
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.inner = self.inner.map(|h| h.with_cancellation(cancel));
        self
    }

    pub async fn get_global_account(
        &self,
        input: &GetGlobalAccountInput,
    ) -> Result<GlobalAccount, ApiError> {
        let handle = ready(&self.inner)?;
        let mut output = GlobalAccount::default();
        handle
            .invoke(
                Operation::new("GetGlobalAccount", Method::GET, "/globalAccount"),
                Some(input),
                Some(&mut output),
            )
            .await?;
        Ok(output)
    }

    pub async fn update_global_account(
        &self,
        input: &UpdateGlobalAccountInput,
    ) -> Result<GlobalAccount, ApiError> {
        let handle = ready(&self.inner)?;
        let mut output = GlobalAccount::default();
        handle
            .invoke(
                Operation::new("UpdateGlobalAccount", Method::POST, "/globalAccount"),
                Some(input),
                Some(&mut output),
            )
            .await?;
        Ok(output)
    }

    pub async fn list_subaccounts(
        &self,
        input: &ListSubaccountsInput,
    ) -> Result<SubaccountList, ApiError> {
        let handle = ready(&self.inner)?;
        let mut output = SubaccountList::default();
        handle
            .invoke(
                Operation::new("ListSubaccounts", Method::GET, "/subaccounts"),
                Some(input),
                Some(&mut output),
            )
            .await?;
        Ok(output)
    }

    pub async fn get_subaccount(
        &self,
        input: &GetSubaccountInput,
    ) -> Result<Subaccount, ApiError> {
        let handle = ready(&self.inner)?;
        let mut output = Subaccount::default();
        handle
            .invoke(
                Operation::new(
                    "GetSubaccount",
                    Method::GET,
                    "/subaccounts/{subaccountGUID}",
                ),
                Some(input),
                Some(&mut output),
            )
            .await?;
        Ok(output)
    }

    pub async fn create_subaccount(
        &self,
        input: &CreateSubaccountInput,
    ) -> Result<Subaccount, ApiError> {
        let handle = ready(&self.inner)?;
        let mut output = Subaccount::default();
        handle
            .invoke(
                Operation::new("CreateSubaccount", Method::POST, "/subaccounts"),
                Some(input),
                Some(&mut output),
            )
            .await?;
        Ok(output)
    }

    pub async fn delete_subaccount(&self, input: &DeleteSubaccountInput) -> Result<(), ApiError> {
        let handle = ready(&self.inner)?;
        handle
            .invoke(
                Operation::new(
                    "DeleteSubaccount",
                    Method::DELETE,
                    "/subaccounts/{subaccountGUID}",
                ),
                Some(input),
                None,
            )
            .await
    }
}

#[derive(Debug, Clone, Default, ApiInput)]
pub struct GetGlobalAccountInput {
    /// 展开子层级（子账户、目录）
    #[api(query = "expand")]
    pub expand: Option<bool>,
}

#[derive(Debug, Clone, Default, ApiInput)]
pub struct UpdateGlobalAccountInput {
    #[api(body, name = "DisplayName")]
    pub display_name: String,
    #[api(body, name = "Description")]
    pub description: String,
}

#[derive(Debug, Clone, Default, ApiInput)]
pub struct ListSubaccountsInput {
    #[api(query = "derivedAuthorizations")]
    pub derived_authorizations: String,
    /// 按标签筛选，键值对原样上线
    #[api(query = "labels")]
    pub labels: Vec<String>,
}

#[derive(Debug, Clone, Default, ApiInput)]
pub struct GetSubaccountInput {
    #[api(uri = "subaccountGUID")]
    pub subaccount_guid: String,
    #[api(query = "derivedAuthorizations")]
    pub derived_authorizations: String,
}

#[derive(Debug, Clone, Default, ApiInput)]
pub struct CreateSubaccountInput {
    #[api(body, name = "displayName")]
    pub display_name: String,
    #[api(body, name = "description")]
    pub description: String,
    #[api(body, name = "region")]
    pub region: String,
    #[api(body, name = "subdomain")]
    pub subdomain: String,
    #[api(body, name = "parentGUID")]
    pub parent_guid: String,
    #[api(body, name = "usedForProduction")]
    pub used_for_production: bool,
}

#[derive(Debug, Clone, Default, ApiInput)]
pub struct DeleteSubaccountInput {
    #[api(uri = "subaccountGUID")]
    pub subaccount_guid: String,
}

#[derive(Debug, Clone, Default, Deserialize, ApiOutput)]
#[serde(rename_all = "camelCase", default)]
pub struct GlobalAccount {
    pub guid: String,
    pub display_name: String,
    pub description: String,
    pub commercial_model: String,
    pub state: String,
    #[serde(skip)]
    #[api(status)]
    pub status_code: u16,
}

#[derive(Debug, Clone, Default, Deserialize, ApiOutput)]
#[serde(rename_all = "camelCase", default)]
pub struct Subaccount {
    pub guid: String,
    pub display_name: String,
    pub description: String,
    pub region: String,
    pub subdomain: String,
    pub parent_guid: String,
    pub state: String,
    pub used_for_production: String,
    #[serde(skip)]
    #[api(status)]
    pub status_code: u16,
}

#[derive(Debug, Clone, Default, Deserialize, ApiOutput)]
#[serde(rename_all = "camelCase", default)]
pub struct SubaccountList {
    pub value: Vec<Subaccount>,
}
