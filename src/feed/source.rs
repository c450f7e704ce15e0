use super::types::{DatasetInfo, FetchError, ItemId, Page, SelectionAck};
use futures::future::BoxFuture;

/// Boundary to whatever serves the dataset: page fetches, the dataset
/// identity used for invalidation, and the selection transport.
///
/// Object safe so the application can hold an `Arc<dyn FeedSource>` and
/// swap the HTTP client for the in-memory dataset.
pub trait FeedSource: Send + Sync {
    /// The dataset currently served, or `None` if nothing is loaded.
    fn dataset(&self) -> BoxFuture<'_, Result<Option<DatasetInfo>, FetchError>>;

    /// Fetch page `page` (1-based).
    fn fetch_page(&self, page: u32) -> BoxFuture<'_, Result<Page, FetchError>>;

    /// Report that `id` was selected or deselected.
    fn notify_selection_changed<'a>(
        &'a self,
        id: &'a ItemId,
        selected: bool,
    ) -> BoxFuture<'a, Result<SelectionAck, FetchError>>;
}
