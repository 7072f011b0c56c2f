use std::time::Duration;

use super::{Debouncer, Evaluation, Identified, ListQueryState, ListRequest, ListSource, Sort};
use crate::envelope::{PageInfo, PagedResult};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoadStatus {
    #[default]
    Idle,
    Loading,
    Succeeded,
    Failed,
}

/// What a list screen renders: the last fetched page plus load status.
///
/// A failed fetch keeps the previously shown items.
#[derive(Debug, Clone)]
pub struct ListView<T> {
    items: Vec<T>,
    page: Option<PageInfo>,
    status: LoadStatus,
    error: Option<String>,
}

impl<T> Default for ListView<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            page: None,
            status: LoadStatus::Idle,
            error: None,
        }
    }
}

impl<T> ListView<T> {
    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn page(&self) -> Option<&PageInfo> {
        self.page.as_ref()
    }

    pub fn status(&self) -> LoadStatus {
        self.status
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Shows a freshly created item on top of the current page.
    pub fn prepend(&mut self, item: T) {
        self.items.insert(0, item);
    }

    fn begin(&mut self) {
        self.status = LoadStatus::Loading;
        self.error = None;
    }

    fn succeed(&mut self, page: PagedResult<T>) {
        let (items, info) = page.into_parts();
        self.items = items;
        self.page = Some(info);
        self.status = LoadStatus::Succeeded;
    }

    fn fail(&mut self, message: String) {
        self.status = LoadStatus::Failed;
        self.error = Some(message);
    }
}

impl<T: Identified> ListView<T> {
    pub fn get(&self, id: &str) -> Option<&T> {
        self.items.iter().find(|item| item.id() == id)
    }

    /// Replaces the item with the same id. Returns `false` if it is not on
    /// the current page.
    pub fn replace(&mut self, item: T) -> bool {
        match self.items.iter_mut().find(|current| current.id() == item.id()) {
            Some(current) => {
                *current = item;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: &str) -> Option<T> {
        let index = self.items.iter().position(|item| item.id() == id)?;
        Some(self.items.remove(index))
    }
}

/// Drives one list screen.
///
/// Every action applies the user's change to the [`ListQueryState`] and
/// then settles it, issuing at most one fetch. Each method returns the
/// number of fetches it issued.
pub struct ListController<S: ListSource> {
    source: S,
    state: ListQueryState,
    debouncer: Debouncer<String>,
    view: ListView<S::Item>,
}

impl<S: ListSource> ListController<S> {
    pub fn new(source: S, page_size: u32, debounce: Duration) -> Self {
        Self {
            source,
            state: ListQueryState::new(page_size),
            debouncer: Debouncer::new(debounce),
            view: ListView::default(),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn state(&self) -> &ListQueryState {
        &self.state
    }

    pub fn view(&self) -> &ListView<S::Item> {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut ListView<S::Item> {
        &mut self.view
    }

    /// Initial load.
    pub async fn mount(&mut self) -> usize {
        self.settle().await
    }

    /// Records a keystroke in `field` and (re)arms its debounce timer.
    pub fn input_text(&mut self, field: &str, text: &str) {
        if self.state.set_raw_text(field, text) {
            self.debouncer.schedule(field.to_owned());
        }
    }

    pub fn has_pending_input(&self) -> bool {
        self.debouncer.has_pending()
    }

    /// Waits for the next debounce timer and returns its field.
    ///
    /// Never completes while no input is pending. Cancel safe, so it can be
    /// raced against other input; pass the field to
    /// [`ListController::commit_input`] afterwards.
    pub async fn debounced(&mut self) -> String {
        self.debouncer.fired().await
    }

    /// Commits the typed text of `field` and settles.
    pub async fn commit_input(&mut self, field: &str) -> usize {
        self.debouncer.cancel(&field.to_owned());
        self.state.commit_text(field);
        self.settle().await
    }

    /// [`ListController::debounced`] followed by
    /// [`ListController::commit_input`].
    pub async fn next_debounced(&mut self) -> usize {
        let field = self.debounced().await;
        self.commit_input(&field).await
    }

    /// Commits all pending input right away.
    pub async fn flush_input(&mut self) -> usize {
        for field in self.debouncer.drain_pending() {
            self.state.commit_text(&field);
        }
        self.settle().await
    }

    pub async fn select_sort(&mut self, field: &str) -> usize {
        self.state.select_sort(field);
        self.settle().await
    }

    pub async fn set_sort(&mut self, sort: Option<Sort>) -> usize {
        self.state.set_sort(sort);
        self.settle().await
    }

    pub async fn set_status(&mut self, status: Option<&str>) -> usize {
        self.state.set_status(status);
        self.settle().await
    }

    pub async fn clear_filters(&mut self) -> usize {
        self.debouncer.cancel_all();
        self.state.clear_filters();
        self.settle().await
    }

    pub async fn go_to_page(&mut self, page: u32) -> usize {
        self.state.go_to_page(page);
        self.settle().await
    }

    pub async fn next_page(&mut self) -> usize {
        self.state.next_page();
        self.settle().await
    }

    pub async fn previous_page(&mut self) -> usize {
        self.state.previous_page();
        self.settle().await
    }

    /// Refetches the current page, e.g. after a create or update.
    pub async fn refresh(&mut self) -> usize {
        self.state.invalidate();
        self.settle().await
    }

    async fn settle(&mut self) -> usize {
        let mut fetches = 0;
        while let Some(evaluation) = self.state.poll() {
            match evaluation {
                Evaluation::PageReset => {
                    tracing::debug!(
                        resource = self.source.resource(),
                        "filters changed, back to first page"
                    );
                }
                Evaluation::Fetch(request) => {
                    fetches += 1;
                    self.fetch(request).await;
                }
            }
        }
        fetches
    }

    async fn fetch(&mut self, request: ListRequest) {
        let resource = self.source.resource();
        self.view.begin();

        match self.source.fetch_page(&request).await {
            Ok(page) => {
                tracing::debug!(
                    resource,
                    page = page.info.current_page,
                    total = page.info.total_count,
                    "list page loaded"
                );
                self.state.record_page(page.info);
                self.view.succeed(page);
            }
            Err(e) => {
                tracing::warn!(resource, page = request.page, "list fetch failed: {e}");
                self.view.fail(format!("Fetch {resource} failed"));
            }
        }
    }
}
