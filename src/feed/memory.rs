//! In-memory dataset used by `--demo` and by tests.

use super::source::FeedSource;
use super::types::{DatasetInfo, Detection, FetchError, Item, ItemId, Label, Page, SelectionAck};
use futures::future::{self, BoxFuture, FutureExt};
use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Object classes cycled through by generated samples.
const DEMO_CLASSES: &[&str] = &["person", "car", "dog", "bicycle", "cat", "traffic light"];

struct MemoryDataset {
    info: Option<DatasetInfo>,
    items: Vec<Item>,
    selected: HashSet<ItemId>,
    failing: bool,
}

/// A [`FeedSource`] backed by a `Vec<Item>`.
///
/// Replacing or clearing the dataset bumps the revision, which is what the
/// dataset watcher observes as an invalidation.
pub struct MemoryFeedSource {
    page_size: u32,
    inner: Mutex<MemoryDataset>,
}

impl MemoryFeedSource {
    /// An empty source with no dataset loaded.
    pub fn empty(page_size: u32) -> Self {
        Self {
            page_size: page_size.max(1),
            inner: Mutex::new(MemoryDataset {
                info: None,
                items: Vec::new(),
                selected: HashSet::new(),
                failing: false,
            }),
        }
    }

    /// A source holding `name` with the given items.
    pub fn with_items(name: &str, items: Vec<Item>, page_size: u32) -> Self {
        let source = Self::empty(page_size);
        source.replace_dataset(name, items);
        source
    }

    /// A deterministic dataset of `count` generated samples.
    pub fn demo(count: usize, page_size: u32) -> Self {
        Self::with_items("demo", demo_items(count), page_size)
    }

    fn lock(&self) -> MutexGuard<'_, MemoryDataset> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Swap in a new dataset. Bumps the revision and clears server-side selection.
    pub fn replace_dataset(&self, name: &str, items: Vec<Item>) {
        let mut inner = self.lock();
        let revision = inner.info.as_ref().map_or(1, |info| info.revision + 1);
        inner.info = Some(DatasetInfo {
            name: name.to_string(),
            count: items.len() as u64,
            revision,
        });
        inner.items = items;
        inner.selected.clear();
        tracing::debug!(name, revision, "Memory dataset replaced");
    }

    /// Unload the dataset.
    pub fn clear_dataset(&self) {
        let mut inner = self.lock();
        inner.info = None;
        inner.items.clear();
        inner.selected.clear();
    }

    /// Make subsequent page fetches and selection notifications fail until reset.
    pub fn set_failing(&self, failing: bool) {
        self.lock().failing = failing;
    }

    pub fn current_dataset(&self) -> Option<DatasetInfo> {
        self.lock().info.clone()
    }

    pub fn selected_count(&self) -> usize {
        self.lock().selected.len()
    }

    fn page(&self, page: u32) -> Result<Page, FetchError> {
        let inner = self.lock();
        if inner.info.is_none() {
            return Err(FetchError::Unavailable("no dataset loaded".into()));
        }
        if inner.failing {
            return Err(FetchError::Unavailable("page fetch disabled".into()));
        }
        if page == 0 {
            return Err(FetchError::Unavailable("page numbers start at 1".into()));
        }
        let page_size = self.page_size as usize;
        let start = (page as usize - 1).saturating_mul(page_size);
        let items = inner
            .items
            .iter()
            .skip(start)
            .take(page_size)
            .cloned()
            .collect();
        Ok(Page {
            items,
            total_count: inner.items.len() as u64,
        })
    }

    fn select(&self, id: &ItemId, selected: bool) -> Result<SelectionAck, FetchError> {
        let mut inner = self.lock();
        if inner.failing {
            return Err(FetchError::Unavailable("selection sync disabled".into()));
        }
        if selected {
            inner.selected.insert(id.clone());
        } else {
            inner.selected.remove(id);
        }
        Ok(SelectionAck {
            selected_count: inner.selected.len() as u64,
        })
    }
}

impl FeedSource for MemoryFeedSource {
    fn dataset(&self) -> BoxFuture<'_, Result<Option<DatasetInfo>, FetchError>> {
        future::ready(Ok(self.current_dataset())).boxed()
    }

    fn fetch_page(&self, page: u32) -> BoxFuture<'_, Result<Page, FetchError>> {
        future::ready(self.page(page)).boxed()
    }

    fn notify_selection_changed<'a>(
        &'a self,
        id: &'a ItemId,
        selected: bool,
    ) -> BoxFuture<'a, Result<SelectionAck, FetchError>> {
        future::ready(self.select(id, selected)).boxed()
    }
}

/// Generate `count` samples with one to three boxes each.
pub fn demo_items(count: usize) -> Vec<Item> {
    (0..count)
        .map(|i| {
            let boxes = 1 + i % 3;
            let detections = (0..boxes)
                .map(|j| {
                    let step = ((i + j) % 5) as f64 * 0.1;
                    Detection {
                        label: DEMO_CLASSES[(i + j) % DEMO_CLASSES.len()].to_string(),
                        bounding_box: [0.05 + step, 0.1 + step * 0.5, 0.25, 0.3],
                        confidence: Some(0.5 + ((i * 7 + j) % 50) as f64 / 100.0),
                    }
                })
                .collect();
            Item {
                id: ItemId::new(format!("sample-{i:05}")),
                filepath: format!("/data/demo/{i:05}.jpg"),
                labels: vec![Label {
                    field: Some("ground_truth".to_string()),
                    detections,
                }],
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_pages_cover_dataset() {
        let source = MemoryFeedSource::demo(45, 20);
        let p1 = source.fetch_page(1).await.unwrap();
        let p3 = source.fetch_page(3).await.unwrap();
        let p4 = source.fetch_page(4).await.unwrap();

        assert_eq!(p1.items.len(), 20);
        assert_eq!(p1.total_count, 45);
        assert_eq!(p3.items.len(), 5);
        assert_eq!(p3.items[0].id, ItemId::new("sample-00040"));
        assert!(p4.items.is_empty());
    }

    #[tokio::test]
    async fn test_page_zero_rejected() {
        let source = MemoryFeedSource::demo(5, 20);
        assert!(matches!(
            source.fetch_page(0).await,
            Err(FetchError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_empty_source_has_no_dataset() {
        let source = MemoryFeedSource::empty(20);
        assert!(source.dataset().await.unwrap().is_none());
        assert!(source.fetch_page(1).await.is_err());
    }

    #[tokio::test]
    async fn test_replace_bumps_revision_and_clears_selection() {
        let source = MemoryFeedSource::demo(3, 20);
        let id = ItemId::new("sample-00001");
        let ack = source.notify_selection_changed(&id, true).await.unwrap();
        assert_eq!(ack.selected_count, 1);

        let before = source.current_dataset().unwrap();
        source.replace_dataset("demo", demo_items(4));
        let after = source.current_dataset().unwrap();

        assert_eq!(after.revision, before.revision + 1);
        assert_eq!(after.count, 4);
        assert_eq!(source.selected_count(), 0);
    }

    #[tokio::test]
    async fn test_failing_source_errors_until_reset() {
        let source = MemoryFeedSource::demo(3, 20);
        source.set_failing(true);
        assert!(source.fetch_page(1).await.is_err());
        source.set_failing(false);
        assert_eq!(source.fetch_page(1).await.unwrap().items.len(), 3);
    }

    #[test]
    fn test_demo_items_are_deterministic() {
        assert_eq!(demo_items(10), demo_items(10));
        let items = demo_items(3);
        assert_eq!(items[0].labels[0].detections.len(), 1);
        assert_eq!(items[2].labels[0].detections.len(), 3);
    }
}
