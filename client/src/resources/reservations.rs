use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{ConnectorType, ListParams, confirmed, wire_enum};
use crate::envelope::PagedResult;
use crate::error::ApiError;
use crate::gateway::{Gateway, RequestDescriptor};
use crate::sync::{Identified, ListRequest, ListSource};

const PATH: &str = "/reservations";

const LIST_PARAMS: ListParams = ListParams {
    page: "pageNumber",
    texts: &["userId"],
    sortable: false,
    status: Some("status"),
};

wire_enum! {
    pub enum ReservationStatus {
        Pending => "Pending",
        Confirmed => "Confirmed",
        Cancelled => "Cancelled",
        Completed => "Completed",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connector {
    pub connector_id: String,
    pub connector_type: ConnectorType,
    pub power_kw: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StationInfo {
    pub station_id: String,
    pub name: String,
    #[serde(default)]
    pub connectors: Vec<Connector>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    pub id: String,
    pub user: String,
    pub status: ReservationStatus,
    pub start_time: String,
    pub end_time: String,
    pub created_at: String,
    pub station: StationInfo,
}

impl Identified for Reservation {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Summary returned by the create call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedReservation {
    pub id: String,
    pub user: String,
    pub station_name: String,
    pub connector_type: ConnectorType,
    pub min_power_kw: f64,
    pub status: ReservationStatus,
    pub start_time: String,
    pub end_time: String,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationDraft {
    pub station_id: String,
    pub connector_id: String,
    pub start_time: String,
    pub end_time: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationUpdate {
    #[serde(flatten)]
    pub slot: ReservationDraft,
    pub status: ReservationStatus,
}

#[derive(Clone)]
pub struct ReservationsApi {
    gateway: Gateway,
}

impl ReservationsApi {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    pub async fn list(&self, request: &ListRequest) -> Result<PagedResult<Reservation>, ApiError> {
        self.gateway
            .call(
                &LIST_PARAMS.request(PATH, request),
                "Fetch reservations failed",
            )
            .await
    }

    pub async fn get(&self, id: &str) -> Result<Reservation, ApiError> {
        let request = RequestDescriptor::get(format!("{PATH}/{id}"));
        self.gateway.call(&request, "Get reservation failed").await
    }

    pub async fn create(&self, draft: &ReservationDraft) -> Result<CreatedReservation, ApiError> {
        let request = RequestDescriptor::post(PATH).with_json(draft)?;
        self.gateway.call(&request, "Create reservation failed").await
    }

    pub async fn update(
        &self,
        id: &str,
        update: &ReservationUpdate,
    ) -> Result<Reservation, ApiError> {
        let request = RequestDescriptor::put(format!("{PATH}/{id}")).with_json(update)?;
        self.gateway.call(&request, "Update reservation failed").await
    }

    pub async fn cancel(&self, id: &str) -> Result<(), ApiError> {
        const FAILURE: &str = "Cancel reservation failed";

        let request = RequestDescriptor::post(format!("{PATH}/{id}/cancel"));
        let acknowledged: bool = self.gateway.call(&request, FAILURE).await?;
        confirmed(acknowledged, FAILURE)
    }
}

#[async_trait]
impl ListSource for ReservationsApi {
    type Item = Reservation;

    fn resource(&self) -> &'static str {
        "reservations"
    }

    async fn fetch_page(
        &self,
        request: &ListRequest,
    ) -> Result<PagedResult<Reservation>, ApiError> {
        self.list(request).await
    }
}
