//! Application event handling.
//!
//! Applies results reported by background tasks: pages, dataset changes,
//! resolved gestures and selection acknowledgements.

use crate::app::{App, AppEvent};
use crate::feed::LoadOutcome;
use tokio::sync::mpsc;

use super::helpers::{maybe_load_more, spawn_selection_notify};

/// Handle one event from a background task.
pub(super) fn handle_app_event(
    app: &mut App,
    event: AppEvent,
    event_tx: &mpsc::Sender<AppEvent>,
) {
    match event {
        AppEvent::PageLoaded { request, result } => {
            match app.feed.complete_load(request, result) {
                Ok(LoadOutcome::Appended { added }) => {
                    tracing::debug!(page = request.page, added, "Grid extended");
                    // Keep going until the screen is filled.
                    maybe_load_more(app, event_tx);
                }
                Ok(LoadOutcome::Stale) | Ok(LoadOutcome::Idle) => {}
                Err(e) => {
                    tracing::warn!(error = %e, "Page load failed");
                    app.set_status(format!("{e} (press r to retry)"));
                    app.last_load_error = Some(e.to_string());
                }
            }
        }

        AppEvent::DatasetChanged(dataset) => {
            if app.apply_dataset(dataset) {
                maybe_load_more(app, event_tx);
            }
        }

        AppEvent::Gesture { id, gesture } => {
            tracing::debug!(id = %id, ?gesture, "Gesture resolved");
            if let Some(change) = app.apply_gesture(&id, gesture) {
                spawn_selection_notify(app, change, event_tx);
            }
        }

        AppEvent::SelectionAcked { id, selected, ack } => {
            tracing::debug!(id = %id, selected, count = ack.selected_count, "Selection acknowledged");
            app.remote_selected_count = Some(ack.selected_count);
        }

        AppEvent::SelectionSyncFailed {
            id,
            selected,
            error,
        } => {
            tracing::warn!(id = %id, selected, error = %error, "Selection sync failed");
            app.set_status(format!("Could not sync selection of {id}: {error}"));
        }

        AppEvent::GestureFailed { id, error } => {
            app.set_status(format!("Click on {id} was lost: {error}"));
        }

        AppEvent::TaskPanicked { task, error } => {
            tracing::error!(task, error = %error, "Background task panicked");
            app.set_status(format!("Internal error in {task}: {error}"));
        }
    }
}
