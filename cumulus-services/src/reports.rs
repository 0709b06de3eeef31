//! reports 服务门面：用量报表的提交与获取

use cumulus_common::request::Operation;
use cumulus_common::session::Session;
use cumulus_common::{ApiError, CancellationToken, Method};
use cumulus_macro::{ApiInput, ApiOutput};
use serde::Deserialize;

use crate::{ServiceHandle, ready};

pub const SERVICE_ID: &str = "reports";
pub const API_VERSION: &str = "v1";

pub struct ReportsClient {
    inner: Result<ServiceHandle, ApiError>,
}

impl ReportsClient {
    pub fn new(session: &Session) -> Self {
        Self {
            inner: ServiceHandle::new(session, SERVICE_ID, API_VERSION),
        }
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.inner = self.inner.map(|h| h.with_cancellation(cancel));
        self
    }

    /// 提交一份报表；服务端受理后在 Location header 返回任务地址
    pub async fn submit_report(&self, input: &SubmitReportInput) -> Result<SubmitReceipt, ApiError> {
        let handle = ready(&self.inner)?;
        let mut output = SubmitReceipt::default();
        handle
            .invoke(
                Operation::new("SubmitReport", Method::POST, "/reports"),
                Some(input),
                Some(&mut output),
            )
            .await?;
        Ok(output)
    }

    pub async fn get_report(&self, input: &GetReportInput) -> Result<Report, ApiError> {
        let handle = ready(&self.inner)?;
        let mut output = Report::default();
        handle
            .invoke(
                Operation::new("GetReport", Method::GET, "/reports/{reportId}"),
                Some(input),
                Some(&mut output),
            )
            .await?;
        Ok(output)
    }
}

#[derive(Debug, Clone, Default, ApiInput)]
pub struct SubmitReportInput {
    #[api(body, name = "name")]
    pub name: String,
    #[api(body, name = "timeRange")]
    pub time_range: String,
    /// 报表模板专有参数，不透明 JSON
    #[api(body, name = "parameters")]
    pub parameters: serde_json::Value,
}

#[derive(Debug, Clone, Default, ApiInput)]
pub struct GetReportInput {
    #[api(uri = "reportId")]
    pub report_id: String,
}

#[derive(Debug, Clone, Default, Deserialize, ApiOutput)]
#[serde(default)]
pub struct SubmitReceipt {
    #[serde(skip)]
    #[api(header = "Location")]
    pub location: String,
    #[serde(skip)]
    #[api(status)]
    pub status_code: u16,
}

#[derive(Debug, Clone, Default, Deserialize, ApiOutput)]
#[serde(rename_all = "camelCase", default)]
pub struct Report {
    pub id: String,
    pub name: String,
    pub state: String,
    pub created_at: i64,
    /// 原始响应体，供调用方自行解析非标准字段
    #[serde(skip)]
    #[api(body)]
    pub raw: Vec<u8>,
}
