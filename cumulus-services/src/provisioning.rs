//! provisioning 服务门面：环境实例的增删查

use cumulus_common::request::Operation;
use cumulus_common::session::Session;
use cumulus_common::{ApiError, CancellationToken, Method};
use cumulus_macro::{ApiInput, ApiOutput};
use serde::Deserialize;

use crate::{ServiceHandle, ready};

pub const SERVICE_ID: &str = "provisioning";
pub const API_VERSION: &str = "v1";

pub struct ProvisioningClient {
    inner: Result<ServiceHandle, ApiError>,
}

impl ProvisioningClient {
    pub fn new(session: &Session) -> Self {
        Self {
            inner: ServiceHandle::new(session, SERVICE_ID, API_VERSION),
        }
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.inner = self.inner.map(|h| h.with_cancellation(cancel));
        self
    }

    pub async fn list_environments(&self) -> Result<EnvironmentList, ApiError> {
        let handle = ready(&self.inner)?;
        let mut output = EnvironmentList::default();
        handle
            .invoke(
                Operation::new("ListEnvironments", Method::GET, "/environments"),
                None,
                Some(&mut output),
            )
            .await?;
        Ok(output)
    }

    pub async fn get_environment(
        &self,
        input: &GetEnvironmentInput,
    ) -> Result<EnvironmentInstance, ApiError> {
        let handle = ready(&self.inner)?;
        let mut output = EnvironmentInstance::default();
        handle
            .invoke(
                Operation::new(
                    "GetEnvironment",
                    Method::GET,
                    "/environments/{environmentInstanceId}",
                ),
                Some(input),
                Some(&mut output),
            )
            .await?;
        Ok(output)
    }

    pub async fn create_environment(
        &self,
        input: &CreateEnvironmentInput,
    ) -> Result<EnvironmentInstance, ApiError> {
        let handle = ready(&self.inner)?;
        let mut output = EnvironmentInstance::default();
        handle
            .invoke(
                Operation::new("CreateEnvironment", Method::POST, "/environments"),
                Some(input),
                Some(&mut output),
            )
            .await?;
        Ok(output)
    }

    pub async fn delete_environment(&self, input: &DeleteEnvironmentInput) -> Result<(), ApiError> {
        let handle = ready(&self.inner)?;
        handle
            .invoke(
                Operation::new(
                    "DeleteEnvironment",
                    Method::DELETE,
                    "/environments/{environmentInstanceId}",
                ),
                Some(input),
                None,
            )
            .await
    }
}

#[derive(Debug, Clone, Default, ApiInput)]
pub struct GetEnvironmentInput {
    #[api(uri = "environmentInstanceId")]
    pub environment_instance_id: String,
}

#[derive(Debug, Clone, Default, ApiInput)]
pub struct CreateEnvironmentInput {
    #[api(body, name = "environmentType")]
    pub environment_type: String,
    #[api(body, name = "name")]
    pub name: String,
    #[api(body, name = "planName")]
    pub plan_name: String,
    #[api(body, name = "serviceName")]
    pub service_name: String,
    /// 环境类型专有的创建参数，不透明 JSON
    #[api(body, name = "parameters")]
    pub parameters: serde_json::Value,
}

#[derive(Debug, Clone, Default, ApiInput)]
pub struct DeleteEnvironmentInput {
    #[api(uri = "environmentInstanceId")]
    pub environment_instance_id: String,
}

#[derive(Debug, Clone, Default, Deserialize, ApiOutput)]
#[serde(rename_all = "camelCase", default)]
pub struct EnvironmentInstance {
    pub id: String,
    pub name: String,
    pub environment_type: String,
    pub plan_name: String,
    pub service_name: String,
    pub state: String,
    pub dashboard_url: String,
    pub labels: String,
    #[serde(skip)]
    #[api(status)]
    pub status_code: u16,
}

#[derive(Debug, Clone, Default, Deserialize, ApiOutput)]
#[serde(rename_all = "camelCase", default)]
pub struct EnvironmentList {
    pub environment_instances: Vec<EnvironmentInstance>,
}
