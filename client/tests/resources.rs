use std::time::Duration;

use evadmin_client::ApiError;
use evadmin_client::resources::{ConnectorType, InvoiceStatus, StationStatus};
use evadmin_client::sync::{ListController, ListRequest, LoadStatus, Sort};

use self::common::{harness, valid_pair};

mod common;

fn has(query: &[(String, String)], key: &str, value: &str) -> bool {
    query.iter().any(|(k, v)| k == key && v == value)
}

fn keys(query: &[(String, String)]) -> Vec<&str> {
    let mut keys: Vec<&str> = query.iter().map(|(k, _)| k.as_str()).collect();
    keys.sort_unstable();
    keys
}

#[tokio::test]
async fn stations_use_page_number_and_omit_unset_filters() {
    let h = harness(Some(valid_pair())).await;
    let stations = h.gateway.stations();

    stations.list(&ListRequest::new(1, 5)).await.unwrap();
    assert_eq!(keys(&h.backend.last_query()), ["pageNumber", "pageSize"]);

    let mut request = ListRequest::new(2, 5);
    request.texts.insert("search".to_owned(), "harbour".to_owned());
    request.sort = Some(Sort::descending("name"));
    request.status = Some(StationStatus::Offline.to_string());
    let page = stations.list(&request).await.unwrap();

    let query = h.backend.last_query();
    assert!(has(&query, "pageNumber", "2"));
    assert!(has(&query, "pageSize", "5"));
    assert!(has(&query, "search", "harbour"));
    assert!(has(&query, "sortBy", "name"));
    assert!(has(&query, "isDescending", "true"));
    assert!(has(&query, "status", "Offline"));

    // Unknown payload fields are tolerated.
    assert_eq!(page.items[0].id, "station-2");
    assert_eq!(page.items[0].status, StationStatus::Online);
    assert!(page.info.has_previous);
}

#[tokio::test]
async fn vehicles_read_bare_json_with_their_own_parameters() {
    let h = harness(Some(valid_pair())).await;

    let mut request = ListRequest::new(1, 10);
    request.texts.insert("model".to_owned(), "VF".to_owned());
    request.texts.insert("brand".to_owned(), "VinFast".to_owned());
    request.status = Some(ConnectorType::Ccs.to_string());
    let page = h.gateway.vehicles().list(&request).await.unwrap();

    let query = h.backend.last_query();
    assert_eq!(
        keys(&query),
        ["brand", "connectorType", "model", "page", "pageSize"]
    );
    assert!(has(&query, "connectorType", "CCS"));

    let vehicle = &page.items[0];
    assert_eq!(vehicle.id, "veh-1");
    assert_eq!(vehicle.details.connector_type, ConnectorType::Ccs);
    assert!(!page.info.has_next);
}

#[tokio::test]
async fn plan_delete_requires_acknowledgement() {
    let h = harness(Some(valid_pair())).await;
    let plans = h.gateway.plans();

    plans.delete("disposable").await.unwrap();

    let err = plans.delete("flagship").await.unwrap_err();
    assert!(
        matches!(&err, ApiError::Logical(message) if message == "Delete plan failed"),
        "{err:?}"
    );
}

#[tokio::test]
async fn invoice_payment_travels_in_the_query() {
    let h = harness(Some(valid_pair())).await;

    let invoice = h.gateway.invoices().pay("inv-7", 42.5).await.unwrap();

    assert!(has(&h.backend.last_query(), "amountPaid", "42.5"));
    assert_eq!(invoice.id, "inv-7");
    assert_eq!(invoice.status, InvoiceStatus::Paid);
    assert_eq!(invoice.amount_paid, 42.5);
}

#[tokio::test]
async fn controller_settles_typing_into_one_first_page_fetch() {
    let h = harness(Some(valid_pair())).await;
    let mut list = ListController::new(h.gateway.stations(), 5, Duration::from_millis(50));

    assert_eq!(list.mount().await, 1);
    assert_eq!(list.next_page().await, 1);
    assert_eq!(list.view().page().map(|p| p.current_page), Some(2));

    list.input_text("search", "h");
    list.input_text("search", "ha");
    list.input_text("search", "harb");
    assert_eq!(list.next_debounced().await, 1);

    assert_eq!(h.backend.query_count(), 3);
    let query = h.backend.last_query();
    assert!(has(&query, "pageNumber", "1"));
    assert!(has(&query, "search", "harb"));
    assert_eq!(list.view().status(), LoadStatus::Succeeded);
    assert_eq!(list.view().items()[0].id, "station-1");
}

#[tokio::test]
async fn controller_reports_generic_failure() {
    let h = harness(Some(valid_pair())).await;
    let mut list = ListController::new(h.gateway.stations(), 5, Duration::from_millis(50));
    list.mount().await;

    h.backend.reject_everything();
    list.refresh().await;

    assert_eq!(list.view().status(), LoadStatus::Failed);
    assert_eq!(list.view().error(), Some("Fetch stations failed"));
    assert_eq!(list.view().items().len(), 1);
}
