use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{ListParams, wire_enum};
use crate::envelope::PagedResult;
use crate::error::ApiError;
use crate::gateway::Gateway;
use crate::sync::{Identified, ListRequest, ListSource};

const PATH: &str = "/sessions";
const UNINVOICED_PATH: &str = "/sessions/uninvoice";

const LIST_PARAMS: ListParams = ListParams {
    page: "page",
    texts: &["search"],
    sortable: true,
    status: None,
};

wire_enum! {
    pub enum SessionStatus {
        Stopped => "Stopped",
        Active => "Active",
        Paused => "Paused",
    }
}

/// One charging session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargingSession {
    pub id: String,
    pub user_id: String,
    #[serde(default)]
    pub user_email: String,
    #[serde(default)]
    pub user_full_name: String,
    pub connector_id: String,
    pub start_time: String,
    pub end_time: Option<String>,
    pub status: SessionStatus,
    #[serde(default)]
    pub status_display: String,
    pub energy_kwh: f64,
    pub cost: f64,
    pub created_at: String,
    pub updated_at: Option<String>,
}

impl Identified for ChargingSession {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Charging sessions, either all of them or only those not yet invoiced.
#[derive(Clone)]
pub struct SessionsApi {
    gateway: Gateway,
    uninvoiced: bool,
}

impl SessionsApi {
    pub fn new(gateway: Gateway) -> Self {
        Self {
            gateway,
            uninvoiced: false,
        }
    }

    /// Makes [`ListSource::fetch_page`] list uninvoiced sessions only.
    pub fn uninvoiced(self) -> Self {
        Self {
            uninvoiced: true,
            ..self
        }
    }

    pub async fn list(
        &self,
        request: &ListRequest,
    ) -> Result<PagedResult<ChargingSession>, ApiError> {
        self.gateway
            .call(&LIST_PARAMS.request(PATH, request), "Fetch sessions failed")
            .await
    }

    pub async fn list_uninvoiced(
        &self,
        request: &ListRequest,
    ) -> Result<PagedResult<ChargingSession>, ApiError> {
        self.gateway
            .call(
                &LIST_PARAMS.request(UNINVOICED_PATH, request),
                "Fetch uninvoiced sessions failed",
            )
            .await
    }
}

#[async_trait]
impl ListSource for SessionsApi {
    type Item = ChargingSession;

    fn resource(&self) -> &'static str {
        if self.uninvoiced {
            "uninvoiced sessions"
        } else {
            "sessions"
        }
    }

    async fn fetch_page(
        &self,
        request: &ListRequest,
    ) -> Result<PagedResult<ChargingSession>, ApiError> {
        if self.uninvoiced {
            self.list_uninvoiced(request).await
        } else {
            self.list(request).await
        }
    }
}
