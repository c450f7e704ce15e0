//! Background task spawning shared by input and event handling.

use crate::app::{App, AppEvent};
use crate::feed::{FetchError, SelectionChange};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Wraps a future to catch panics and convert them to errors.
///
/// Returns `Err(panic_message)` if the future panics, so the spawning code
/// can report it as [`AppEvent::TaskPanicked`] instead of the task vanishing.
pub(super) async fn catch_task_panic<F, T>(future: F) -> Result<T, String>
where
    F: std::future::Future<Output = T>,
{
    AssertUnwindSafe(future)
        .catch_unwind()
        .await
        .map_err(|panic| {
            if let Some(s) = panic.downcast_ref::<&'static str>() {
                s.to_string()
            } else if let Some(s) = panic.downcast_ref::<String>() {
                s.clone()
            } else {
                "non-string panic payload".to_string()
            }
        })
}

/// Start the next page fetch if the grid wants one. Returns whether a fetch
/// was started.
pub(super) fn maybe_load_more(app: &mut App, event_tx: &mpsc::Sender<AppEvent>) -> bool {
    if !app.needs_more() {
        return false;
    }
    spawn_page_load(app, event_tx)
}

/// Claim the next page from the controller and fetch it in the background.
///
/// The result comes back as [`AppEvent::PageLoaded`] carrying the request,
/// so a reset in the meantime turns it stale.
pub(super) fn spawn_page_load(app: &mut App, event_tx: &mpsc::Sender<AppEvent>) -> bool {
    let Some(request) = app.feed.begin_load() else {
        return false;
    };

    let source = Arc::clone(&app.source);
    let tx = event_tx.clone();

    app.page_load_handle = Some(tokio::spawn(async move {
        let result = match catch_task_panic(source.fetch_page(request.page)).await {
            Ok(result) => result,
            Err(panic_msg) => {
                tracing::error!(page = request.page, error = %panic_msg, "Page load task panicked");
                let _ = tx
                    .send(AppEvent::TaskPanicked {
                        task: "page_load",
                        error: panic_msg.clone(),
                    })
                    .await;
                // Still complete the request so the controller stops waiting.
                Err(FetchError::Unavailable(format!("page task panicked: {panic_msg}")))
            }
        };

        if let Err(e) = tx.send(AppEvent::PageLoaded { request, result }).await {
            tracing::warn!(error = %e, "Failed to send page result (receiver dropped)");
        }
    }));
    true
}

/// Clear a previous load failure and request the failed page again.
pub(super) fn retry_load(app: &mut App, event_tx: &mpsc::Sender<AppEvent>) {
    if app.last_load_error.take().is_none() {
        app.set_status("Nothing to retry");
        return;
    }
    if spawn_page_load(app, event_tx) {
        app.set_status("Retrying...");
    }
}

/// Forward a selection toggle to the source.
pub(super) fn spawn_selection_notify(
    app: &App,
    change: SelectionChange,
    event_tx: &mpsc::Sender<AppEvent>,
) {
    let source = Arc::clone(&app.source);
    let tx = event_tx.clone();

    tokio::spawn(async move {
        let SelectionChange { id, selected } = change;
        let outcome = catch_task_panic(source.notify_selection_changed(&id, selected)).await;
        let event = match outcome {
            Ok(Ok(ack)) => AppEvent::SelectionAcked { id, selected, ack },
            Ok(Err(e)) => AppEvent::SelectionSyncFailed {
                id,
                selected,
                error: e.to_string(),
            },
            Err(panic_msg) => {
                tracing::error!(error = %panic_msg, "Selection notify task panicked");
                AppEvent::TaskPanicked {
                    task: "selection_notify",
                    error: panic_msg,
                }
            }
        };
        if let Err(e) = tx.send(event).await {
            tracing::warn!(error = %e, "Failed to send selection result (receiver dropped)");
        }
    });
}

/// Start polling the source for dataset changes. No-op when `interval` is `None`.
pub fn spawn_dataset_watch(
    app: &mut App,
    interval: Option<Duration>,
    event_tx: &mpsc::Sender<AppEvent>,
) {
    let Some(interval) = interval else {
        tracing::debug!("Dataset polling disabled");
        return;
    };
    if let Some(handle) = app.watch_handle.take() {
        handle.abort();
    }

    let source = Arc::clone(&app.source);
    let known = app.feed.dataset().cloned();
    let tx = event_tx.clone();

    app.watch_handle = Some(tokio::spawn(async move {
        let panic_tx = tx.clone();
        let watch =
            crate::feed::watch_dataset(source, interval, known, tx, AppEvent::DatasetChanged);
        if let Err(panic_msg) = catch_task_panic(watch).await {
            tracing::error!(error = %panic_msg, "Dataset watcher panicked");
            let _ = panic_tx
                .send(AppEvent::TaskPanicked {
                    task: "dataset_watch",
                    error: panic_msg,
                })
                .await;
        }
    }));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::feed::{ItemId, MemoryFeedSource};

    fn demo_app(count: usize) -> (App, Arc<MemoryFeedSource>) {
        let source = Arc::new(MemoryFeedSource::demo(count, 20));
        let mut app = App::new(source.clone(), &Config::default());
        app.apply_dataset(source.current_dataset());
        (app, source)
    }

    #[tokio::test]
    async fn test_catch_task_panic_ok() {
        assert_eq!(catch_task_panic(async { 7 }).await, Ok(7));
    }

    #[tokio::test]
    async fn test_catch_task_panic_message() {
        let result = catch_task_panic(async {
            panic!("exploded");
        })
        .await;
        assert_eq!(result, Err::<(), _>("exploded".to_string()));
    }

    #[tokio::test]
    async fn test_page_load_reports_result() {
        let (mut app, _source) = demo_app(45);
        let (tx, mut rx) = mpsc::channel(8);

        assert!(maybe_load_more(&mut app, &tx));
        assert!(app.feed.is_loading());
        // Single outstanding request.
        assert!(!spawn_page_load(&mut app, &tx));

        match rx.recv().await {
            Some(AppEvent::PageLoaded { request, result }) => {
                assert_eq!(request.page, 1);
                assert_eq!(result.unwrap().items.len(), 20);
            }
            other => panic!("expected PageLoaded, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_retry_requires_previous_failure() {
        let (mut app, _source) = demo_app(45);
        let (tx, _rx) = mpsc::channel(8);
        retry_load(&mut app, &tx);
        assert!(!app.feed.is_loading());

        app.last_load_error = Some("HTTP error: status 503".into());
        retry_load(&mut app, &tx);
        assert!(app.feed.is_loading());
        assert!(app.last_load_error.is_none());
    }

    #[tokio::test]
    async fn test_selection_notify_acks() {
        let (app, source) = demo_app(5);
        let (tx, mut rx) = mpsc::channel(8);
        let change = SelectionChange {
            id: ItemId::new("sample-00000"),
            selected: true,
        };
        spawn_selection_notify(&app, change, &tx);

        match rx.recv().await {
            Some(AppEvent::SelectionAcked { ack, selected, .. }) => {
                assert!(selected);
                assert_eq!(ack.selected_count, 1);
            }
            other => panic!("expected SelectionAcked, got {other:?}"),
        }
        assert_eq!(source.selected_count(), 1);
    }

    #[tokio::test]
    async fn test_selection_notify_failure() {
        let (app, source) = demo_app(5);
        source.set_failing(true);
        let (tx, mut rx) = mpsc::channel(8);
        let change = SelectionChange {
            id: ItemId::new("sample-00000"),
            selected: true,
        };
        spawn_selection_notify(&app, change, &tx);
        assert!(matches!(
            rx.recv().await,
            Some(AppEvent::SelectionSyncFailed { .. })
        ));
    }

    #[tokio::test]
    async fn test_watch_disabled_without_interval() {
        let (mut app, _source) = demo_app(5);
        let (tx, _rx) = mpsc::channel(8);
        spawn_dataset_watch(&mut app, None, &tx);
        assert!(app.watch_handle.is_none());
    }
}
