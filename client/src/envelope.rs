use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Uniform wrapper the backend puts around every response body.
///
/// ```json
/// { "isSuccess": true, "value": { "code": "200", "message": "OK", "data": {} }, "error": null }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T> {
    pub is_success: bool,
    pub value: Option<EnvelopeValue<T>>,
    #[serde(default)]
    pub error: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvelopeValue<T> {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
    pub data: T,
}

impl<T> Envelope<T> {
    /// Unwraps the payload, turning a logical failure into
    /// [`ApiError::Logical`] carrying `failure` as a generic message.
    ///
    /// Backend-provided details are only logged.
    pub fn into_data(self, failure: &str) -> Result<T, ApiError> {
        match self.value {
            Some(value) if self.is_success => Ok(value.data),
            value => {
                tracing::debug!(
                    code = value.as_ref().map(|v| v.code.as_str()),
                    message = value.as_ref().map(|v| v.message.as_str()),
                    error = ?self.error,
                    "backend reported logical failure"
                );
                Err(ApiError::Logical(failure.to_owned()))
            }
        }
    }
}

/// One page of a listing as returned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagedResult<T> {
    pub items: Vec<T>,
    #[serde(flatten)]
    pub info: PageInfo,
}

/// Everything in a [`PagedResult`] except the items.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub current_page: u32,
    pub total_pages: u32,
    pub page_size: u32,
    pub total_count: u64,
    pub has_previous: bool,
    pub has_next: bool,
}

impl<T> PagedResult<T> {
    pub fn into_parts(self) -> (Vec<T>, PageInfo) {
        (self.items, self.info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unwraps_successful_envelope() {
        let raw = r#"{
            "isSuccess": true,
            "value": { "code": "200", "message": "OK", "data": 42 },
            "error": null
        }"#;
        let envelope: Envelope<u32> = serde_json::from_str(raw).unwrap();
        assert_eq!(envelope.into_data("Fetch failed").unwrap(), 42);
    }

    #[test]
    fn logical_failure_carries_generic_message() {
        let raw = r#"{
            "isSuccess": false,
            "value": null,
            "error": { "code": "Station.NotFound", "description": "no such station" }
        }"#;
        let envelope: Envelope<u32> = serde_json::from_str(raw).unwrap();
        let err = envelope.into_data("Delete station failed").unwrap_err();
        assert!(matches!(err, ApiError::Logical(ref msg) if msg == "Delete station failed"));
    }

    #[test]
    fn missing_value_is_a_logical_failure() {
        let raw = r#"{ "isSuccess": false, "error": "Invalid refresh token" }"#;
        let envelope: Envelope<Vec<String>> = serde_json::from_str(raw).unwrap();
        assert!(envelope.value.is_none());
        let err = envelope.into_data("Refresh failed").unwrap_err();
        assert!(matches!(err, ApiError::Logical(ref msg) if msg == "Refresh failed"));
    }

    #[test]
    fn failure_flag_wins_over_present_value() {
        let raw = r#"{ "isSuccess": false, "value": { "code": "400", "message": "bad", "data": 1 } }"#;
        let envelope: Envelope<u32> = serde_json::from_str(raw).unwrap();
        assert!(envelope.into_data("Update plan failed").is_err());
    }

    #[test]
    fn paged_result_reads_flat_page_info() {
        let raw = r#"{
            "items": ["a", "b"],
            "currentPage": 2,
            "totalPages": 4,
            "pageSize": 2,
            "totalCount": 7,
            "hasPrevious": true,
            "hasNext": true
        }"#;
        let page: PagedResult<String> = serde_json::from_str(raw).unwrap();
        let (items, info) = page.into_parts();
        assert_eq!(items, vec!["a".to_owned(), "b".to_owned()]);
        assert_eq!(info.current_page, 2);
        assert_eq!(info.total_count, 7);
        assert!(info.has_previous && info.has_next);
    }
}
