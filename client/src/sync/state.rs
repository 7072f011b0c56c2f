use std::collections::BTreeMap;

use crate::envelope::PageInfo;

/// Sort order applied to a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    pub field: String,
    pub descending: bool,
}

impl Sort {
    pub fn ascending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: false,
        }
    }

    pub fn descending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: true,
        }
    }
}

/// Parameters of one page fetch. Unset filters are absent, never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRequest {
    pub page: u32,
    pub page_size: u32,
    /// Trimmed, non-blank text filters keyed by field.
    pub texts: BTreeMap<String, String>,
    pub sort: Option<Sort>,
    pub status: Option<String>,
}

impl ListRequest {
    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.max(1),
            texts: BTreeMap::new(),
            sort: None,
            status: None,
        }
    }

    pub fn text(&self, field: &str) -> Option<&str> {
        self.texts.get(field).map(String::as_str)
    }
}

/// Outcome of one evaluation of a [`ListQueryState`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Evaluation {
    /// Issue exactly this fetch.
    Fetch(ListRequest),
    /// Filters changed while away from the first page. The page was moved to
    /// 1 and no fetch must be issued; the next evaluation fetches.
    PageReset,
}

/// Values that drive a fetch, apart from the page index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Filters {
    texts: BTreeMap<String, String>,
    sort: Option<Sort>,
    status: Option<String>,
}

/// Reconciles user-editable filters with the page index.
///
/// Mutators only mark the state dirty when something that affects the fetch
/// changed; [`ListQueryState::poll`] then decides between fetching and
/// resetting the page. Filter changes are detected against the last
/// committed filters rather than the previous evaluation, so moving between
/// pages never looks like a filter change.
#[derive(Debug, Clone)]
pub struct ListQueryState {
    page: u32,
    page_size: u32,
    raw_texts: BTreeMap<String, String>,
    live: Filters,
    committed: Filters,
    last_page: Option<PageInfo>,
    dirty: bool,
}

impl ListQueryState {
    /// Creates the state of a freshly mounted list. The first poll fetches
    /// page 1.
    pub fn new(page_size: u32) -> Self {
        Self {
            page: 1,
            page_size: page_size.max(1),
            raw_texts: BTreeMap::new(),
            live: Filters::default(),
            committed: Filters::default(),
            last_page: None,
            dirty: true,
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn raw_text(&self, field: &str) -> &str {
        self.raw_texts.get(field).map(String::as_str).unwrap_or_default()
    }

    pub fn debounced_text(&self, field: &str) -> Option<&str> {
        self.live.texts.get(field).map(String::as_str)
    }

    pub fn sort(&self) -> Option<&Sort> {
        self.live.sort.as_ref()
    }

    pub fn status(&self) -> Option<&str> {
        self.live.status.as_deref()
    }

    pub fn has_active_filters(&self) -> bool {
        self.raw_texts.values().any(|t| !t.trim().is_empty())
            || self.live.sort.is_some()
            || self.live.status.is_some()
    }

    /// Records a keystroke. Returns `true` if the raw text changed, in which
    /// case the caller should (re)arm the debounce timer for `field`.
    pub fn set_raw_text(&mut self, field: &str, text: &str) -> bool {
        match self.raw_texts.get(field) {
            Some(current) if current == text => false,
            _ => {
                self.raw_texts.insert(field.to_owned(), text.to_owned());
                true
            }
        }
    }

    /// Promotes the raw text of `field` to its debounced value.
    pub fn commit_text(&mut self, field: &str) {
        let value = self.raw_text(field).trim().to_owned();

        let changed = if value.is_empty() {
            self.live.texts.remove(field).is_some()
        } else {
            self.live.texts.insert(field.to_owned(), value.clone()) != Some(value)
        };
        self.dirty |= changed;
    }

    /// Sets and commits a text filter in one step, bypassing the debounce.
    pub fn set_text(&mut self, field: &str, text: &str) {
        self.set_raw_text(field, text);
        self.commit_text(field);
    }

    /// Column-header behaviour: picking the active field flips the
    /// direction, picking another field sorts it ascending.
    pub fn select_sort(&mut self, field: &str) {
        let sort = match &self.live.sort {
            Some(current) if current.field == field => Sort {
                field: current.field.clone(),
                descending: !current.descending,
            },
            _ => Sort::ascending(field),
        };
        self.set_sort(Some(sort));
    }

    pub fn set_sort(&mut self, sort: Option<Sort>) {
        let sort = sort.filter(|s| !s.field.trim().is_empty());
        if self.live.sort != sort {
            self.live.sort = sort;
            self.dirty = true;
        }
    }

    pub fn set_status(&mut self, status: Option<&str>) {
        let status = status
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_owned);
        if self.live.status != status {
            self.live.status = status;
            self.dirty = true;
        }
    }

    /// Drops every filter at once. Text filters are committed immediately.
    pub fn clear_filters(&mut self) {
        self.raw_texts.clear();
        if self.live != Filters::default() {
            self.live = Filters::default();
            self.dirty = true;
        }
    }

    /// Moves to `page` (clamped to 1). Returns `true` if the page changed.
    pub fn go_to_page(&mut self, page: u32) -> bool {
        let page = page.max(1);
        if self.page == page {
            return false;
        }
        self.page = page;
        self.dirty = true;
        true
    }

    /// Advances one page if the last fetched page reported a successor.
    pub fn next_page(&mut self) -> bool {
        match self.last_page {
            Some(info) if info.has_next => self.go_to_page(self.page + 1),
            _ => false,
        }
    }

    pub fn previous_page(&mut self) -> bool {
        self.page > 1 && self.go_to_page(self.page - 1)
    }

    /// Forces the next poll to refetch the current page.
    pub fn invalidate(&mut self) {
        self.dirty = true;
    }

    /// Stores the metadata of the page the backend returned.
    pub fn record_page(&mut self, info: PageInfo) {
        self.last_page = Some(info);
    }

    /// Evaluates the state once. Returns `None` when nothing changed since
    /// the last fetch.
    pub fn poll(&mut self) -> Option<Evaluation> {
        if !self.dirty {
            return None;
        }

        let filters_changed = self.live != self.committed;
        self.committed = self.live.clone();

        if filters_changed && self.page != 1 {
            // Still dirty: the page change drives the next evaluation.
            self.page = 1;
            return Some(Evaluation::PageReset);
        }

        self.dirty = false;
        Some(Evaluation::Fetch(self.request()))
    }

    /// The request matching the current page and filters.
    pub fn request(&self) -> ListRequest {
        ListRequest {
            page: self.page,
            page_size: self.page_size,
            texts: self.live.texts.clone(),
            sort: self.live.sort.clone(),
            status: self.live.status.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Polls until settled and returns the fetches that would be issued.
    fn settle(state: &mut ListQueryState) -> Vec<ListRequest> {
        let mut fetches = Vec::new();
        while let Some(evaluation) = state.poll() {
            if let Evaluation::Fetch(request) = evaluation {
                fetches.push(request);
            }
        }
        fetches
    }

    fn with_more_pages(state: &mut ListQueryState) {
        state.record_page(PageInfo {
            current_page: state.page(),
            total_pages: 10,
            page_size: state.page_size(),
            total_count: 50,
            has_previous: state.page() > 1,
            has_next: true,
        });
    }

    #[test]
    fn mount_fetches_first_page_once() {
        let mut state = ListQueryState::new(5);
        let fetches = settle(&mut state);
        assert_eq!(fetches, vec![ListRequest::new(1, 5)]);
        assert!(settle(&mut state).is_empty());
    }

    #[test]
    fn search_on_first_page_fetches_once() {
        let mut state = ListQueryState::new(5);
        settle(&mut state);

        assert!(state.set_raw_text("search", "abc"));
        // Raw text alone never triggers a fetch.
        assert!(settle(&mut state).is_empty());

        state.commit_text("search");
        let fetches = settle(&mut state);
        assert_eq!(fetches.len(), 1);
        assert_eq!(fetches[0].page, 1);
        assert_eq!(fetches[0].text("search"), Some("abc"));
    }

    #[test]
    fn search_away_from_first_page_resets_then_fetches_once() {
        let mut state = ListQueryState::new(5);
        settle(&mut state);
        state.go_to_page(2);
        settle(&mut state);

        state.set_text("search", "xyz");
        assert_eq!(state.poll(), Some(Evaluation::PageReset));
        assert_eq!(state.page(), 1);

        let fetches = settle(&mut state);
        assert_eq!(fetches.len(), 1);
        assert_eq!(fetches[0].page, 1);
        assert_eq!(fetches[0].text("search"), Some("xyz"));
    }

    #[test]
    fn sort_toggles_fetch_once_each_and_reset_page() {
        let mut state = ListQueryState::new(5);
        settle(&mut state);

        state.select_sort("name");
        let fetches = settle(&mut state);
        assert_eq!(fetches.len(), 1);
        assert_eq!(fetches[0].sort, Some(Sort::ascending("name")));

        with_more_pages(&mut state);
        assert!(state.next_page());
        assert_eq!(settle(&mut state).len(), 1);
        assert_eq!(state.page(), 2);

        state.select_sort("name");
        let fetches = settle(&mut state);
        assert_eq!(fetches.len(), 1);
        assert_eq!(fetches[0].page, 1);
        assert_eq!(fetches[0].sort, Some(Sort::descending("name")));
    }

    #[test]
    fn selecting_another_field_sorts_ascending() {
        let mut state = ListQueryState::new(5);
        state.set_sort(Some(Sort::descending("price")));
        state.select_sort("name");
        assert_eq!(state.sort(), Some(&Sort::ascending("name")));
    }

    #[test]
    fn paging_keeps_filters_and_never_resets() {
        let mut state = ListQueryState::new(5);
        state.set_text("search", "abc");
        state.set_status(Some("Paid"));
        settle(&mut state);

        with_more_pages(&mut state);
        state.next_page();
        let fetches = settle(&mut state);
        assert_eq!(fetches.len(), 1);
        assert_eq!(fetches[0].page, 2);
        assert_eq!(fetches[0].text("search"), Some("abc"));
        assert_eq!(fetches[0].status.as_deref(), Some("Paid"));

        state.previous_page();
        let fetches = settle(&mut state);
        assert_eq!(fetches.len(), 1);
        assert_eq!(fetches[0].page, 1);
        assert_eq!(fetches[0].text("search"), Some("abc"));
    }

    #[test]
    fn clearing_filters_on_third_page_fetches_unfiltered_first_page() {
        let mut state = ListQueryState::new(5);
        state.set_text("search", "abc");
        state.select_sort("name");
        state.set_status(Some("Pending"));
        settle(&mut state);
        state.go_to_page(3);
        settle(&mut state);

        state.clear_filters();
        let fetches = settle(&mut state);
        assert_eq!(fetches, vec![ListRequest::new(1, 5)]);
        assert!(!state.has_active_filters());
    }

    #[test]
    fn blank_search_is_no_filter() {
        let mut state = ListQueryState::new(5);
        state.set_text("search", "   ");
        let fetches = settle(&mut state);
        assert_eq!(fetches[0].text("search"), None);
        assert!(fetches[0].texts.is_empty());

        // Going from "abc" back to blank is a filter change.
        state.set_text("search", "abc");
        settle(&mut state);
        state.set_text("search", "");
        let fetches = settle(&mut state);
        assert_eq!(fetches.len(), 1);
        assert!(fetches[0].texts.is_empty());
    }

    #[test]
    fn committing_same_trimmed_text_is_not_a_change() {
        let mut state = ListQueryState::new(5);
        state.set_text("search", "abc");
        settle(&mut state);

        state.set_text("search", " abc ");
        assert!(settle(&mut state).is_empty());
    }

    #[test]
    fn next_page_requires_known_successor() {
        let mut state = ListQueryState::new(5);
        settle(&mut state);
        assert!(!state.next_page());
        assert!(!state.previous_page());

        state.record_page(PageInfo {
            current_page: 1,
            total_pages: 1,
            page_size: 5,
            total_count: 3,
            has_previous: false,
            has_next: false,
        });
        assert!(!state.next_page());
    }

    #[test]
    fn invalidate_refetches_current_page() {
        let mut state = ListQueryState::new(5);
        settle(&mut state);
        state.go_to_page(4);
        settle(&mut state);

        state.invalidate();
        let fetches = settle(&mut state);
        assert_eq!(fetches.len(), 1);
        assert_eq!(fetches[0].page, 4);
    }

    #[test]
    fn multiple_text_fields_are_independent() {
        let mut state = ListQueryState::new(10);
        state.set_raw_text("model", "Model 3");
        state.set_raw_text("brand", "Tesla");
        state.commit_text("model");

        let fetches = settle(&mut state);
        assert_eq!(fetches[0].text("model"), Some("Model 3"));
        assert_eq!(fetches[0].text("brand"), None);
        assert_eq!(state.raw_text("brand"), "Tesla");
    }
}
