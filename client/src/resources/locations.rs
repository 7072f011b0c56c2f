use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::ListParams;
use crate::envelope::PagedResult;
use crate::error::ApiError;
use crate::gateway::Gateway;
use crate::sync::{Identified, ListRequest, ListSource};

const PATH: &str = "/locations";

const LIST_PARAMS: ListParams = ListParams {
    page: "pageNumber",
    texts: &["city"],
    sortable: false,
    status: None,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub id: String,
    pub name: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub city: String,
    #[serde(default)]
    pub state_province: String,
    pub country: String,
    #[serde(default)]
    pub timezone: String,
    pub created_at: String,
}

impl Identified for Location {
    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Clone)]
pub struct LocationsApi {
    gateway: Gateway,
}

impl LocationsApi {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    pub async fn list(&self, request: &ListRequest) -> Result<PagedResult<Location>, ApiError> {
        self.gateway
            .call(&LIST_PARAMS.request(PATH, request), "Fetch locations failed")
            .await
    }
}

#[async_trait]
impl ListSource for LocationsApi {
    type Item = Location;

    fn resource(&self) -> &'static str {
        "locations"
    }

    async fn fetch_page(&self, request: &ListRequest) -> Result<PagedResult<Location>, ApiError> {
        self.list(request).await
    }
}
