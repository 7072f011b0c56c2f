use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{ListParams, wire_enum};
use crate::envelope::PagedResult;
use crate::error::ApiError;
use crate::gateway::{Gateway, RequestDescriptor};
use crate::sync::{Identified, ListRequest, ListSource};

const PATH: &str = "/invoices";

const LIST_PARAMS: ListParams = ListParams {
    page: "page",
    texts: &["search"],
    sortable: true,
    status: Some("status"),
};

wire_enum! {
    /// Invoice lifecycle. The list filter accepts every value but `Overdue`.
    pub enum InvoiceStatus {
        Outstanding => "Outstanding",
        Paid => "Paid",
        Overdue => "Overdue",
        Canceled => "Canceled",
    }
}

impl InvoiceStatus {
    pub fn is_filterable(&self) -> bool {
        !matches!(self, InvoiceStatus::Overdue)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: String,
    pub user_id: String,
    #[serde(default)]
    pub user_email: String,
    #[serde(default)]
    pub user_full_name: String,
    pub session_id: String,
    pub period_start: String,
    pub period_end: String,
    pub status: InvoiceStatus,
    #[serde(default)]
    pub status_display: String,
    pub subtotal_amount: f64,
    pub tax_amount: f64,
    pub total_amount: f64,
    pub amount_paid: f64,
    pub amount_due: f64,
    pub due_date: String,
    pub issued_at: String,
    #[serde(default)]
    pub is_overdue: bool,
    pub created_at: String,
    pub updated_at: Option<String>,
}

impl Identified for Invoice {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Parameters for billing one charging session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInvoicing {
    pub session_id: String,
    pub tax_rate: f64,
    pub due_days: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceUpdate {
    pub period_start: String,
    pub period_end: String,
    pub status: InvoiceStatus,
    pub subtotal_amount: f64,
    pub tax_amount: f64,
    pub amount_paid: f64,
    pub due_date: String,
}

#[derive(Clone)]
pub struct InvoicesApi {
    gateway: Gateway,
}

impl InvoicesApi {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    pub async fn list(&self, request: &ListRequest) -> Result<PagedResult<Invoice>, ApiError> {
        self.gateway
            .call(&LIST_PARAMS.request(PATH, request), "Fetch invoices failed")
            .await
    }

    pub async fn create_from_session(
        &self,
        invoicing: &SessionInvoicing,
    ) -> Result<Invoice, ApiError> {
        let request = RequestDescriptor::post(format!("{PATH}/from-session")).with_json(invoicing)?;
        self.gateway.call(&request, "Create invoice failed").await
    }

    pub async fn update(&self, id: &str, update: &InvoiceUpdate) -> Result<Invoice, ApiError> {
        let request = RequestDescriptor::put(format!("{PATH}/{id}")).with_json(update)?;
        self.gateway.call(&request, "Update invoice failed").await
    }

    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        let request = RequestDescriptor::delete(format!("{PATH}/{id}"));
        self.gateway
            .call::<serde_json::Value>(&request, "Delete invoice failed")
            .await
            .map(drop)
    }

    /// Records a payment. The amount travels in the query string.
    pub async fn pay(&self, id: &str, amount_paid: f64) -> Result<Invoice, ApiError> {
        let request = RequestDescriptor::post(format!("{PATH}/{id}/pay"))
            .with_query([("amountPaid", amount_paid.to_string())]);
        self.gateway.call(&request, "Pay invoice failed").await
    }

    pub async fn cancel(&self, id: &str) -> Result<Invoice, ApiError> {
        let request = RequestDescriptor::post(format!("{PATH}/{id}/cancel"));
        self.gateway.call(&request, "Cancel invoice failed").await
    }
}

#[async_trait]
impl ListSource for InvoicesApi {
    type Item = Invoice;

    fn resource(&self) -> &'static str {
        "invoices"
    }

    async fn fetch_page(&self, request: &ListRequest) -> Result<PagedResult<Invoice>, ApiError> {
        self.list(request).await
    }
}
