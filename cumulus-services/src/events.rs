//! events 服务门面：平台审计事件查询
//!
//! events 没有独立配置时回退到 cloud-management 端点（两者等价），
//! URL 路径段保持 "events" 不变。

use cumulus_common::chrono::{DateTime, Utc};
use cumulus_common::request::Operation;
use cumulus_common::session::Session;
use cumulus_common::{ApiError, CancellationToken, Method, codes};
use cumulus_macro::{ApiInput, ApiOutput};
use serde::Deserialize;

use crate::{ServiceHandle, ready};

pub const SERVICE_ID: &str = "events";
pub const FALLBACK_ENDPOINT_ID: &str = "cloud-management";
pub const API_VERSION: &str = "v1";

pub struct EventsClient {
    inner: Result<ServiceHandle, ApiError>,
}

impl EventsClient {
    pub fn new(session: &Session) -> Self {
        let inner = match ServiceHandle::new(session, SERVICE_ID, API_VERSION) {
            Err(e) if e.code() == codes::MISSING_ENDPOINT => {
                ServiceHandle::new_aliased(session, FALLBACK_ENDPOINT_ID, SERVICE_ID, API_VERSION)
            }
            other => other,
        };
        Self { inner }
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.inner = self.inner.map(|h| h.with_cancellation(cancel));
        self
    }

    pub async fn list_events(&self, input: &ListEventsInput) -> Result<EventPage, ApiError> {
        let handle = ready(&self.inner)?;
        let mut output = EventPage::default();
        handle
            .invoke(
                Operation::new("ListEvents", Method::GET, "/events"),
                Some(input),
                Some(&mut output),
            )
            .await?;
        Ok(output)
    }
}

#[derive(Debug, Clone, Default, ApiInput)]
pub struct ListEventsInput {
    #[api(query = "entityId")]
    pub entity_id: String,
    #[api(query = "entityType")]
    pub entity_type: String,
    /// 起始时间，按 Unix 秒上线
    #[api(query = "fromActionTime", ts = "unix")]
    pub from_action_time: Option<DateTime<Utc>>,
    #[api(query = "pageNum")]
    pub page_num: Option<i32>,
    #[api(query = "pageSize")]
    pub page_size: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize, ApiOutput)]
#[serde(rename_all = "camelCase", default)]
pub struct EventPage {
    pub events: Vec<Event>,
    pub total: i64,
    pub total_pages: i64,
    pub page_num: i64,
    pub more_pages: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Event {
    pub id: i64,
    pub action_time: i64,
    pub entity_id: String,
    pub entity_type: String,
    pub event_origin: String,
    pub event_type: String,
    pub details: serde_json::Value,
}
