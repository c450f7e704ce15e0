//! Paginated feed state and the per-item selection overlay.
//!
//! [`FeedController`] is a synchronous state machine. Loading a page is split
//! into [`begin_load`](FeedController::begin_load), which hands out a
//! [`PageRequest`] tagged with the current epoch, and
//! [`complete_load`](FeedController::complete_load), which applies the result
//! only if the epoch still matches. The UI runs the fetch in a background task
//! between the two calls; [`load_more`](FeedController::load_more) composes
//! them for callers that can simply await.
//!
//! Invalidation bumps the epoch and resets the state, so a page that was in
//! flight at reset time is dropped when it finally arrives.

use super::source::FeedSource;
use super::types::{DatasetInfo, FetchError, Item, ItemId, Page};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Default number of items per page.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Errors surfaced by [`FeedController::complete_load`].
#[derive(Debug, Error)]
pub enum FeedError {
    /// The source failed to deliver a page. Feed state is unchanged, so the
    /// same page is requested again on retry.
    #[error("Failed to load page {page}: {source}")]
    Fetch {
        page: u32,
        #[source]
        source: FetchError,
    },
}

// ============================================================================
// Feed State
// ============================================================================

/// Snapshot of the loaded collection.
///
/// Readers get an `Arc<FeedState>`; the controller replaces it copy-on-write
/// on every transition.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedState {
    /// True until the first page of the current epoch has been applied.
    pub initial_load: bool,
    /// Whether another page is expected from the source.
    pub has_more: bool,
    /// Items in page arrival order. Append-only within an epoch.
    pub items: Vec<Item>,
    /// Next page to request (1-based).
    pub next_page: u32,
}

impl FeedState {
    fn initial() -> Self {
        Self {
            initial_load: true,
            has_more: true,
            items: Vec::new(),
            next_page: 1,
        }
    }
}

impl Default for FeedState {
    fn default() -> Self {
        Self::initial()
    }
}

/// What the grid should show.
#[derive(Debug, Clone)]
pub enum FeedView {
    /// No dataset is loaded; nothing can be requested.
    NoDataset,
    /// A dataset is loaded; items may still be empty.
    Ready(Arc<FeedState>),
}

/// A page fetch handed out by [`FeedController::begin_load`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub epoch: u64,
}

/// Result of applying a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The page was appended.
    Appended { added: usize },
    /// The page belonged to an earlier epoch and was dropped.
    Stale,
    /// Nothing to load (no dataset, no more pages, or a request in flight).
    Idle,
}

// ============================================================================
// Selection
// ============================================================================

/// Per-session selection flags. Absent ids are unselected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionMap {
    flags: HashMap<ItemId, bool>,
}

impl SelectionMap {
    pub fn is_selected(&self, id: &ItemId) -> bool {
        self.flags.get(id).copied().unwrap_or(false)
    }

    /// Flip `id` and return its new state.
    pub fn toggle(&mut self, id: &ItemId) -> bool {
        let flag = self.flags.entry(id.clone()).or_insert(false);
        *flag = !*flag;
        *flag
    }

    pub fn selected_count(&self) -> usize {
        self.flags.values().filter(|&&selected| selected).count()
    }

    /// Selected ids in id order.
    pub fn selected_ids(&self) -> Vec<&ItemId> {
        let mut ids: Vec<&ItemId> = self
            .flags
            .iter()
            .filter_map(|(id, &selected)| selected.then_some(id))
            .collect();
        ids.sort();
        ids
    }

    pub fn clear(&mut self) {
        self.flags.clear();
    }
}

/// A selection toggle to forward to the selection transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionChange {
    pub id: ItemId,
    pub selected: bool,
}

// ============================================================================
// Controller
// ============================================================================

/// Owns the feed state, its epoch, and the selection map for one view session.
pub struct FeedController {
    page_size: u32,
    dataset: Option<DatasetInfo>,
    state: Arc<FeedState>,
    epoch: u64,
    in_flight: Option<PageRequest>,
    selection: SelectionMap,
}

impl FeedController {
    /// Create a controller with no dataset. A zero page size is treated as one.
    pub fn new(page_size: u32) -> Self {
        Self {
            page_size: page_size.max(1),
            dataset: None,
            state: Arc::new(FeedState::initial()),
            epoch: 0,
            in_flight: None,
            selection: SelectionMap::default(),
        }
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn dataset(&self) -> Option<&DatasetInfo> {
        self.dataset.as_ref()
    }

    /// Current state snapshot, regardless of dataset presence.
    pub fn state(&self) -> Arc<FeedState> {
        Arc::clone(&self.state)
    }

    pub fn items(&self) -> &[Item] {
        &self.state.items
    }

    pub fn view(&self) -> FeedView {
        match self.dataset {
            None => FeedView::NoDataset,
            Some(_) => FeedView::Ready(Arc::clone(&self.state)),
        }
    }

    /// False when no dataset is loaded, even though the reset state says otherwise.
    pub fn has_more(&self) -> bool {
        self.dataset.is_some() && self.state.has_more
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Install the dataset reported by the source.
    ///
    /// A different dataset (or its disappearance) resets the feed. The same
    /// generation only refreshes the reported count. Returns whether a reset
    /// happened.
    pub fn set_dataset(&mut self, dataset: Option<DatasetInfo>) -> bool {
        let same = match (&self.dataset, &dataset) {
            (Some(current), Some(next)) => current.same_generation(next),
            (None, None) => true,
            _ => false,
        };
        self.dataset = dataset;
        if !same {
            self.invalidate();
        }
        !same
    }

    /// Reset to the initial state and start a new epoch.
    ///
    /// Any request in flight is forgotten; its result will be [`LoadOutcome::Stale`].
    pub fn invalidate(&mut self) {
        self.epoch = self.epoch.wrapping_add(1);
        self.in_flight = None;
        self.state = Arc::new(FeedState::initial());
        tracing::debug!(epoch = self.epoch, "Feed invalidated");
    }

    /// Claim the next page to fetch.
    ///
    /// Returns `None` if there is no dataset, no more pages, or a request is
    /// already outstanding.
    pub fn begin_load(&mut self) -> Option<PageRequest> {
        if self.dataset.is_none() || !self.state.has_more || self.in_flight.is_some() {
            return None;
        }
        let request = PageRequest {
            page: self.state.next_page,
            epoch: self.epoch,
        };
        self.in_flight = Some(request);
        tracing::debug!(page = request.page, epoch = request.epoch, "Requesting page");
        Some(request)
    }

    /// Apply the result of a request obtained from [`begin_load`](Self::begin_load).
    pub fn complete_load(
        &mut self,
        request: PageRequest,
        result: Result<Page, FetchError>,
    ) -> Result<LoadOutcome, FeedError> {
        if request.epoch != self.epoch {
            tracing::debug!(
                expected = self.epoch,
                got = request.epoch,
                page = request.page,
                "Ignoring stale page (epoch mismatch)"
            );
            return Ok(LoadOutcome::Stale);
        }
        if self.in_flight == Some(request) {
            self.in_flight = None;
        }

        let page = result.map_err(|source| FeedError::Fetch {
            page: request.page,
            source,
        })?;

        let added = page.items.len();
        let has_more = u64::from(request.page) * u64::from(self.page_size) < page.total_count;

        let state = Arc::make_mut(&mut self.state);
        state.items.extend(page.items);
        state.next_page = request.page.saturating_add(1);
        state.has_more = has_more;
        state.initial_load = false;

        if let Some(dataset) = self.dataset.as_mut() {
            dataset.count = page.total_count;
        }

        tracing::debug!(
            page = request.page,
            added,
            total = page.total_count,
            has_more,
            "Page applied"
        );
        Ok(LoadOutcome::Appended { added })
    }

    /// Fetch and apply the next page from `source`.
    ///
    /// Holding `&mut self` across the fetch means nothing can invalidate in
    /// between; callers that must react to invalidation while a page is in
    /// flight use the begin/complete pair instead.
    pub async fn load_more<S>(&mut self, source: &S) -> Result<LoadOutcome, FeedError>
    where
        S: FeedSource + ?Sized,
    {
        let Some(request) = self.begin_load() else {
            return Ok(LoadOutcome::Idle);
        };
        let result = source.fetch_page(request.page).await;
        self.complete_load(request, result)
    }

    // ------------------------------------------------------------------------
    // Selection
    // ------------------------------------------------------------------------

    pub fn selection(&self) -> &SelectionMap {
        &self.selection
    }

    pub fn is_selected(&self, id: &ItemId) -> bool {
        self.selection.is_selected(id)
    }

    pub fn selected_count(&self) -> usize {
        self.selection.selected_count()
    }

    /// Flip the selection of `id`. Independent of the feed epoch.
    pub fn toggle_selection(&mut self, id: &ItemId) -> SelectionChange {
        let selected = self.selection.toggle(id);
        tracing::debug!(id = %id, selected, "Selection toggled");
        SelectionChange {
            id: id.clone(),
            selected,
        }
    }

    /// End of session: forget every selection.
    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn find_item(&self, id: &ItemId) -> Option<&Item> {
        self.state.items.iter().find(|item| &item.id == id)
    }
}

/// Partition `items` into display rows of `columns` entries.
///
/// The last row may be shorter. A zero column count is treated as one.
pub fn chunk_rows<T>(items: &[T], columns: usize) -> std::slice::Chunks<'_, T> {
    items.chunks(columns.max(1))
}

/// Number of rows [`chunk_rows`] produces.
pub fn row_count(len: usize, columns: usize) -> usize {
    len.div_ceil(columns.max(1))
}
