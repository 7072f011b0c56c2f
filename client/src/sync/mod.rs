//! Paginated list synchronization.
//!
//! [`ListQueryState`] is the pure state machine, [`Debouncer`] turns
//! keystrokes into committed text filters and [`ListController`] ties both
//! to a [`ListSource`] so that every settled filter state costs exactly one
//! fetch.

use async_trait::async_trait;

pub use self::controller::{ListController, ListView, LoadStatus};
pub use self::debounce::Debouncer;
pub use self::state::{Evaluation, ListQueryState, ListRequest, Sort};

use crate::envelope::PagedResult;
use crate::error::ApiError;

mod controller;
mod debounce;
mod state;

/// Backend listing of one resource.
#[async_trait]
pub trait ListSource: Send + Sync {
    type Item: Send;

    /// Plural resource name used in messages, e.g. `"stations"`.
    fn resource(&self) -> &'static str;

    /// Fetches one page, translating the generic request into the
    /// resource's own parameter names.
    async fn fetch_page(&self, request: &ListRequest)
    -> Result<PagedResult<Self::Item>, ApiError>;
}

/// Items that can be located in a list view by id.
pub trait Identified {
    fn id(&self) -> &str;
}
