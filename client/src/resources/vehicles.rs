use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{ConnectorType, ListParams, confirmed};
use crate::envelope::PagedResult;
use crate::error::ApiError;
use crate::gateway::{Gateway, RequestDescriptor};
use crate::sync::{Identified, ListRequest, ListSource};

// Singular, and answered with bare JSON instead of the envelope.
const PATH: &str = "/vehicle";

const LIST_PARAMS: ListParams = ListParams {
    page: "page",
    texts: &["model", "brand"],
    sortable: false,
    status: Some("connectorType"),
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    #[serde(rename = "huyPDID")]
    pub id: String,
    #[serde(flatten)]
    pub details: VehicleDraft,
}

impl Identified for Vehicle {
    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleDraft {
    pub make: String,
    pub model: String,
    pub year: u16,
    pub license_plate: String,
    pub connector_type: ConnectorType,
}

#[derive(Deserialize)]
struct Acknowledgement {
    #[serde(default)]
    message: String,
    #[serde(default)]
    data: bool,
}

#[derive(Clone)]
pub struct VehiclesApi {
    gateway: Gateway,
}

impl VehiclesApi {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    pub async fn list(&self, request: &ListRequest) -> Result<PagedResult<Vehicle>, ApiError> {
        self.gateway
            .call_plain(&LIST_PARAMS.request(PATH, request))
            .await
    }

    pub async fn get(&self, id: &str) -> Result<Vehicle, ApiError> {
        let request = RequestDescriptor::get(format!("{PATH}/{id}"));
        self.gateway.call_plain(&request).await
    }

    pub async fn create(&self, draft: &VehicleDraft) -> Result<(), ApiError> {
        const FAILURE: &str = "Create vehicle failed";

        let request = RequestDescriptor::post(PATH).with_json(draft)?;
        let ack: Acknowledgement = self.gateway.call_plain(&request).await?;
        if !ack.data {
            tracing::debug!(message = ack.message, "vehicle not created");
        }
        confirmed(ack.data, FAILURE)
    }

    pub async fn update(&self, id: &str, draft: &VehicleDraft) -> Result<(), ApiError> {
        let request = RequestDescriptor::put(format!("{PATH}/{id}")).with_json(draft)?;
        self.gateway.call_unit(&request).await
    }

    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        let request = RequestDescriptor::delete(format!("{PATH}/{id}"));
        self.gateway.call_unit(&request).await
    }
}

#[async_trait]
impl ListSource for VehiclesApi {
    type Item = Vehicle;

    fn resource(&self) -> &'static str {
        "vehicles"
    }

    async fn fetch_page(&self, request: &ListRequest) -> Result<PagedResult<Vehicle>, ApiError> {
        self.list(request).await
    }
}
