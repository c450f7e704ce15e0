use super::source::FeedSource;
use super::types::DatasetInfo;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

/// True if `a` and `b` describe the same dataset generation (or both none).
fn same_dataset(a: &Option<DatasetInfo>, b: &Option<DatasetInfo>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a.same_generation(b),
        (None, None) => true,
        _ => false,
    }
}

/// Poll `source` for its dataset identity and report changes.
///
/// Sends `on_change(current)` whenever the `(name, revision)` pair differs
/// from the last one seen, starting from `known`. Poll failures are logged
/// and retried on the next tick. Returns when the receiver is dropped.
pub async fn watch_dataset<E, F>(
    source: Arc<dyn FeedSource>,
    interval: Duration,
    known: Option<DatasetInfo>,
    event_tx: mpsc::Sender<E>,
    on_change: F,
) where
    F: Fn(Option<DatasetInfo>) -> E,
{
    let mut last = known;
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately; the caller already knows the
    // current dataset.
    ticker.tick().await;

    loop {
        ticker.tick().await;
        match source.dataset().await {
            Ok(current) => {
                if same_dataset(&last, &current) {
                    continue;
                }
                tracing::info!(
                    previous = ?last.as_ref().map(|d| (&d.name, d.revision)),
                    current = ?current.as_ref().map(|d| (&d.name, d.revision)),
                    "Dataset changed"
                );
                last = current.clone();
                if event_tx.send(on_change(current)).await.is_err() {
                    tracing::debug!("Dataset watcher stopping (receiver dropped)");
                    return;
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Dataset poll failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::memory::demo_items;
    use crate::feed::MemoryFeedSource;
    use std::convert::identity;

    #[tokio::test(start_paused = true)]
    async fn test_reports_replacement_once() {
        let source = Arc::new(MemoryFeedSource::demo(10, 20));
        let known = source.current_dataset();
        let (tx, mut rx) = mpsc::channel(8);

        let handle = tokio::spawn(watch_dataset(
            source.clone(),
            Duration::from_secs(5),
            known,
            tx,
            identity,
        ));

        tokio::time::sleep(Duration::from_secs(12)).await;
        assert!(rx.try_recv().is_err(), "unchanged dataset must not be reported");

        source.replace_dataset("demo", demo_items(3));
        let event = rx.recv().await.unwrap();
        let info = event.expect("dataset should be present");
        assert_eq!(info.count, 3);
        assert_eq!(info.revision, 2);

        tokio::time::sleep(Duration::from_secs(12)).await;
        assert!(rx.try_recv().is_err());
        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_reports_unload() {
        let source = Arc::new(MemoryFeedSource::demo(10, 20));
        let known = source.current_dataset();
        let (tx, mut rx) = mpsc::channel(8);
        let handle = tokio::spawn(watch_dataset(
            source.clone(),
            Duration::from_secs(1),
            known,
            tx,
            identity,
        ));

        source.clear_dataset();
        assert_eq!(rx.recv().await, Some(None));
        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_when_receiver_dropped() {
        let source = Arc::new(MemoryFeedSource::empty(20));
        let (tx, rx) = mpsc::channel(8);
        let handle = tokio::spawn(watch_dataset(
            source.clone(),
            Duration::from_secs(1),
            None,
            tx,
            identity,
        ));

        drop(rx);
        source.replace_dataset("late", demo_items(1));
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("watcher should exit")
            .unwrap();
    }
}
