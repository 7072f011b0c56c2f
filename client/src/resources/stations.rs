use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{ListParams, wire_enum};
use crate::envelope::PagedResult;
use crate::error::ApiError;
use crate::gateway::{Gateway, RequestDescriptor};
use crate::sync::{Identified, ListRequest, ListSource};

const PATH: &str = "/stations";

const LIST_PARAMS: ListParams = ListParams {
    page: "pageNumber",
    texts: &["search"],
    sortable: true,
    status: Some("status"),
};

wire_enum! {
    pub enum StationStatus {
        Online => "Online",
        Offline => "Offline",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Station {
    pub id: String,
    pub name: String,
    pub location_id: String,
    pub status: StationStatus,
}

impl Identified for Station {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Body of create and update calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StationDraft {
    pub name: String,
    pub location_id: String,
    pub status: StationStatus,
}

#[derive(Clone)]
pub struct StationsApi {
    gateway: Gateway,
}

impl StationsApi {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    pub async fn list(&self, request: &ListRequest) -> Result<PagedResult<Station>, ApiError> {
        self.gateway
            .call(&LIST_PARAMS.request(PATH, request), "Fetch stations failed")
            .await
    }

    pub async fn create(&self, draft: &StationDraft) -> Result<Station, ApiError> {
        let request = RequestDescriptor::post(PATH).with_json(draft)?;
        self.gateway.call(&request, "Create station failed").await
    }

    pub async fn update(&self, id: &str, draft: &StationDraft) -> Result<Station, ApiError> {
        let request = RequestDescriptor::put(format!("{PATH}/{id}")).with_json(draft)?;
        self.gateway.call(&request, "Update station failed").await
    }

    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        let request = RequestDescriptor::delete(format!("{PATH}/{id}"));
        self.gateway
            .call::<serde_json::Value>(&request, "Delete station failed")
            .await
            .map(drop)
    }
}

#[async_trait]
impl ListSource for StationsApi {
    type Item = Station;

    fn resource(&self) -> &'static str {
        "stations"
    }

    async fn fetch_page(&self, request: &ListRequest) -> Result<PagedResult<Station>, ApiError> {
        self.list(request).await
    }
}
