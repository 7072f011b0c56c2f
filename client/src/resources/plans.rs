use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{ListParams, confirmed};
use crate::envelope::PagedResult;
use crate::error::ApiError;
use crate::gateway::{Gateway, RequestDescriptor};
use crate::sync::{Identified, ListRequest, ListSource};

const PATH: &str = "/plans";

const LIST_PARAMS: ListParams = ListParams {
    page: "page",
    texts: &["search"],
    sortable: true,
    status: None,
};

/// Subscription plan. `kind` is free-form (`Prepaid`, `Postpaid`, `VIP`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    #[serde(rename = "hoaHTTID")]
    pub id: String,
    #[serde(flatten)]
    pub details: PlanDraft,
}

impl Identified for Plan {
    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanDraft {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub price: f64,
    pub max_daily_kwh: Option<f64>,
}

#[derive(Clone)]
pub struct PlansApi {
    gateway: Gateway,
}

impl PlansApi {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    pub async fn list(&self, request: &ListRequest) -> Result<PagedResult<Plan>, ApiError> {
        self.gateway
            .call(&LIST_PARAMS.request(PATH, request), "Fetch plans failed")
            .await
    }

    pub async fn get(&self, id: &str) -> Result<Plan, ApiError> {
        let request = RequestDescriptor::get(format!("{PATH}/{id}"));
        self.gateway.call(&request, "Get plan failed").await
    }

    pub async fn create(&self, draft: &PlanDraft) -> Result<Plan, ApiError> {
        let request = RequestDescriptor::post(PATH).with_json(draft)?;
        self.gateway.call(&request, "Create plan failed").await
    }

    /// The backend answers without the id, so it is carried over.
    pub async fn update(&self, id: &str, draft: &PlanDraft) -> Result<Plan, ApiError> {
        let request = RequestDescriptor::put(format!("{PATH}/{id}")).with_json(draft)?;
        let details: PlanDraft = self.gateway.call(&request, "Update plan failed").await?;
        Ok(Plan {
            id: id.to_owned(),
            details,
        })
    }

    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        const FAILURE: &str = "Delete plan failed";

        let request = RequestDescriptor::delete(format!("{PATH}/{id}"));
        let acknowledged: bool = self.gateway.call(&request, FAILURE).await?;
        confirmed(acknowledged, FAILURE)
    }
}

#[async_trait]
impl ListSource for PlansApi {
    type Item = Plan;

    fn resource(&self) -> &'static str {
        "plans"
    }

    async fn fetch_page(&self, request: &ListRequest) -> Result<PagedResult<Plan>, ApiError> {
        self.list(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_reads_backend_field_names() {
        let plan: Plan = serde_json::from_value(serde_json::json!({
            "hoaHTTID": "p-1",
            "name": "Night owl",
            "description": "Off-peak charging",
            "type": "Prepaid",
            "price": 9.5,
            "maxDailyKwh": null,
        }))
        .unwrap();

        assert_eq!(plan.id, "p-1");
        assert_eq!(plan.details.kind, "Prepaid");
        assert_eq!(plan.details.max_daily_kwh, None);
    }
}
