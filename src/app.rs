use crate::config::Config;
use crate::feed::{
    row_count, DatasetInfo, FeedController, FeedSource, FetchError, Item, ItemId, Page,
    PageRequest, SelectionAck, SelectionChange,
};
use crate::gesture::{ClickOutcome, Gesture, GestureDisambiguator};
use crate::theme::{StyleMap, ThemeVariant};
use lru::LruCache;
use ratatui::layout::Rect;
use ratatui::style::Style;
use std::borrow::Cow;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Height of one card row in terminal lines, borders included.
pub const CARD_HEIGHT: u16 = 5;

/// Rows loaded ahead of what is on screen.
pub const PREFETCH_ROWS: usize = 2;

/// How many per-card disambiguators are kept alive.
pub const GESTURE_CACHE_CAPACITY: NonZeroUsize = match NonZeroUsize::new(256) {
    Some(n) => n,
    None => panic!("gesture cache capacity must be non-zero"),
};

const STATUS_TTL: Duration = Duration::from_secs(3);

// ============================================================================
// View and Event Types
// ============================================================================

/// Current view mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// Card grid over the loaded items.
    Grid,
    /// One item with its annotation boxes.
    Focus,
}

/// Events sent from background tasks to the main loop.
#[derive(Debug)]
pub enum AppEvent {
    /// A page fetch finished. `request` carries the epoch it was issued in.
    PageLoaded {
        request: PageRequest,
        result: Result<Page, FetchError>,
    },
    /// The source reports a different dataset (or none).
    DatasetChanged(Option<DatasetInfo>),
    /// A card's click sequence resolved.
    Gesture { id: ItemId, gesture: Gesture },
    /// The server acknowledged a selection change.
    SelectionAcked {
        id: ItemId,
        selected: bool,
        ack: SelectionAck,
    },
    /// The selection change could not be delivered. Local state is kept.
    SelectionSyncFailed {
        id: ItemId,
        selected: bool,
        error: String,
    },
    /// A click's disambiguation wait failed.
    GestureFailed { id: ItemId, error: String },
    /// A background task panicked.
    ///
    /// Fields:
    /// - `task`: Name of the task that panicked (e.g., "page_load")
    /// - `error`: The panic message extracted from the panic payload
    TaskPanicked { task: &'static str, error: String },
}

// ============================================================================
// App
// ============================================================================

/// Central application state
pub struct App {
    pub source: Arc<dyn FeedSource>,
    pub feed: FeedController,

    /// One disambiguator per clicked card, least recently clicked evicted first.
    gestures: LruCache<ItemId, GestureDisambiguator>,
    pub double_click_window: Duration,

    // Theme
    pub theme_variant: ThemeVariant,
    pub theme: StyleMap,

    // Grid
    pub view: View,
    pub columns: usize,
    /// Index of the cursor card in `feed.items()`.
    pub cursor: usize,
    /// First card row on screen.
    pub scroll_row: usize,
    /// Card rows that fit in `grid_area`. Updated on every render.
    pub visible_rows: usize,
    /// Inner area of the grid block as last rendered, for mouse hit-testing.
    pub grid_area: Rect,

    // Focus view
    pub focused: Option<Item>,
    pub focus_scroll: usize,

    // Status
    pub status_message: Option<(Cow<'static, str>, Instant)>,
    /// Selection count last reported by the server.
    pub remote_selected_count: Option<u64>,
    /// Set when a page failed; automatic loading pauses until retried.
    pub last_load_error: Option<String>,
    pub show_help: bool,

    /// Render only when something changed.
    pub needs_redraw: bool,

    pub page_load_handle: Option<JoinHandle<()>>,
    pub watch_handle: Option<JoinHandle<()>>,
}

impl App {
    pub fn new(source: Arc<dyn FeedSource>, config: &Config) -> Self {
        let theme_variant = ThemeVariant::from_str_name(&config.theme).unwrap_or_else(|| {
            tracing::warn!(theme = %config.theme, "Unknown theme, using dark");
            ThemeVariant::Dark
        });

        Self {
            source,
            feed: FeedController::new(config.page_size),
            gestures: LruCache::new(GESTURE_CACHE_CAPACITY),
            double_click_window: config.double_click_window(),
            theme_variant,
            theme: StyleMap::from_palette(&theme_variant.palette()),
            view: View::Grid,
            columns: config.columns.max(1),
            cursor: 0,
            scroll_row: 0,
            visible_rows: 1,
            grid_area: Rect::default(),
            focused: None,
            focus_scroll: 0,
            status_message: None,
            remote_selected_count: None,
            last_load_error: None,
            show_help: false,
            needs_redraw: true,
            page_load_handle: None,
            watch_handle: None,
        }
    }

    // ------------------------------------------------------------------------
    // Status
    // ------------------------------------------------------------------------

    pub fn set_status(&mut self, msg: impl Into<Cow<'static, str>>) {
        self.status_message = Some((msg.into(), Instant::now()));
    }

    /// Clear the status message once it is older than three seconds.
    /// Returns true if a message was cleared.
    pub fn clear_expired_status(&mut self) -> bool {
        if let Some((_, time)) = &self.status_message {
            if time.elapsed() >= STATUS_TTL {
                self.status_message = None;
                return true;
            }
        }
        false
    }

    /// Resolve a theme role to its style.
    pub fn style(&self, role: &str) -> Style {
        self.theme.resolve(role)
    }

    pub fn cycle_theme(&mut self) {
        self.theme_variant = self.theme_variant.next();
        self.theme = StyleMap::from_palette(&self.theme_variant.palette());
        self.set_status(format!("Theme: {}", self.theme_variant.name()));
    }

    // ------------------------------------------------------------------------
    // Dataset
    // ------------------------------------------------------------------------

    /// Install the dataset reported by the source. Returns true if the feed
    /// was reset.
    ///
    /// A reset puts the grid back at the top, leaves the focus view (its item
    /// belongs to the old data) and drops every disambiguator, cancelling
    /// clicks that were still waiting.
    pub fn apply_dataset(&mut self, dataset: Option<DatasetInfo>) -> bool {
        let present = dataset.is_some();
        if !self.feed.set_dataset(dataset) {
            return false;
        }

        self.cursor = 0;
        self.scroll_row = 0;
        self.last_load_error = None;
        self.gestures.clear();
        if self.view == View::Focus {
            self.exit_focus();
        }

        if present {
            self.set_status("Dataset changed, reloading");
        } else {
            self.set_status("Dataset unloaded");
        }
        true
    }

    /// Whether the grid wants another page right now.
    ///
    /// True while fewer rows are loaded than the screen plus a prefetch
    /// margin below the cursor, unless a request is already out or the last
    /// one failed.
    pub fn needs_more(&self) -> bool {
        if !self.feed.has_more() || self.feed.is_loading() || self.last_load_error.is_some() {
            return false;
        }
        let loaded_rows = row_count(self.feed.items().len(), self.columns);
        let cursor_row = self.cursor / self.columns;
        let wanted = (self.scroll_row + self.visible_rows).max(cursor_row + 1) + PREFETCH_ROWS;
        loaded_rows < wanted
    }

    // ------------------------------------------------------------------------
    // Grid navigation
    // ------------------------------------------------------------------------

    pub fn current_item(&self) -> Option<&Item> {
        self.feed.items().get(self.cursor)
    }

    /// Move the cursor by `delta` cards, clamped to the loaded items.
    pub fn move_cursor(&mut self, delta: isize) {
        let len = self.feed.items().len();
        if len == 0 {
            self.cursor = 0;
            return;
        }
        self.cursor = self.cursor.saturating_add_signed(delta).min(len - 1);
        self.ensure_cursor_visible();
    }

    pub fn move_rows(&mut self, rows: isize) {
        self.move_cursor(rows.saturating_mul(self.columns as isize));
    }

    pub fn page_down(&mut self) {
        self.move_rows(self.visible_rows.max(1) as isize);
    }

    pub fn page_up(&mut self) {
        self.move_rows(-(self.visible_rows.max(1) as isize));
    }

    pub fn jump_to_start(&mut self) {
        self.cursor = 0;
        self.ensure_cursor_visible();
    }

    pub fn jump_to_end(&mut self) {
        self.cursor = self.feed.items().len().saturating_sub(1);
        self.ensure_cursor_visible();
    }

    /// Scroll so the cursor row is on screen.
    pub fn ensure_cursor_visible(&mut self) {
        let cursor_row = self.cursor / self.columns;
        let visible = self.visible_rows.max(1);
        if cursor_row < self.scroll_row {
            self.scroll_row = cursor_row;
        } else if cursor_row >= self.scroll_row + visible {
            self.scroll_row = cursor_row + 1 - visible;
        }
    }

    /// Record where the grid was drawn and how many rows fit.
    pub fn set_grid_area(&mut self, area: Rect) {
        self.grid_area = area;
        self.visible_rows = usize::from(area.height / CARD_HEIGHT).max(1);
        self.ensure_cursor_visible();
    }

    /// Index of the card under terminal cell (`column`, `row`), if any.
    pub fn card_at(&self, column: u16, row: u16) -> Option<usize> {
        let area = self.grid_area;
        if area.width == 0
            || column < area.x
            || column >= area.x + area.width
            || row < area.y
            || row >= area.y + area.height
        {
            return None;
        }
        let card_width = (area.width / self.columns as u16).max(1);
        let col = usize::from((column - area.x) / card_width);
        if col >= self.columns {
            return None;
        }
        let grid_row = self.scroll_row + usize::from((row - area.y) / CARD_HEIGHT);
        let index = grid_row * self.columns + col;
        (index < self.feed.items().len()).then_some(index)
    }

    // ------------------------------------------------------------------------
    // Clicks and gestures
    // ------------------------------------------------------------------------

    /// Number of cards with a live disambiguator.
    pub fn tracked_gestures(&self) -> usize {
        self.gestures.len()
    }

    fn disambiguator(
        &mut self,
        id: &ItemId,
        event_tx: &mpsc::Sender<AppEvent>,
    ) -> &GestureDisambiguator {
        let window = self.double_click_window;
        let tx = event_tx.clone();
        let target = id.clone();
        self.gestures.get_or_insert(id.clone(), move || {
            GestureDisambiguator::new(window, move |gesture| {
                let event = AppEvent::Gesture {
                    id: target.clone(),
                    gesture,
                };
                match tx.try_send(event) {
                    Ok(()) => {}
                    // A resolved gesture must reach the loop; wait for room.
                    Err(TrySendError::Full(event)) => {
                        tracing::debug!(id = %target, "Event channel full, deferring gesture");
                        let tx = tx.clone();
                        tokio::spawn(async move {
                            if tx.send(event).await.is_err() {
                                tracing::debug!("Gesture dropped (receiver closed)");
                            }
                        });
                    }
                    Err(TrySendError::Closed(_)) => {
                        tracing::debug!(id = %target, "Gesture dropped (receiver closed)");
                    }
                }
            })
        })
    }

    /// Register a single physical click on the card `id`.
    ///
    /// The resolved gesture arrives later as [`AppEvent::Gesture`]. A watcher
    /// task reports a failed wait as [`AppEvent::GestureFailed`].
    pub fn click_item(&mut self, id: &ItemId, event_tx: &mpsc::Sender<AppEvent>) {
        let pending = self.disambiguator(id, event_tx).on_click();
        if pending.is_resolved() {
            return;
        }

        let tx = event_tx.clone();
        let id = id.clone();
        tokio::spawn(async move {
            match pending.wait().await {
                Ok(ClickOutcome::Superseded) => {
                    tracing::trace!(id = %id, "Click superseded");
                }
                Ok(outcome) => {
                    tracing::trace!(id = %id, ?outcome, "Click resolved");
                }
                Err(e) => {
                    tracing::error!(id = %id, error = %e, "Click disambiguation failed");
                    let _ = tx
                        .send(AppEvent::GestureFailed {
                            id,
                            error: e.to_string(),
                        })
                        .await;
                }
            }
        });
    }

    /// Register a native double click on the card `id`.
    pub fn double_click_item(&mut self, id: &ItemId, event_tx: &mpsc::Sender<AppEvent>) -> bool {
        self.disambiguator(id, event_tx).on_double_click()
    }

    /// Act on a resolved gesture.
    ///
    /// `Activate` toggles the selection and returns the change to forward to
    /// the server. `Open` switches to the focus view. Gestures for items that
    /// are no longer loaded are ignored.
    pub fn apply_gesture(&mut self, id: &ItemId, gesture: Gesture) -> Option<SelectionChange> {
        if self.feed.find_item(id).is_none() {
            tracing::debug!(id = %id, ?gesture, "Ignoring gesture for unloaded item");
            return None;
        }
        match gesture {
            Gesture::Activate => Some(self.feed.toggle_selection(id)),
            Gesture::Open => {
                self.open_item(id);
                None
            }
        }
    }

    // ------------------------------------------------------------------------
    // Focus view
    // ------------------------------------------------------------------------

    /// Show `id` in the focus view. Returns false if it is not loaded.
    pub fn open_item(&mut self, id: &ItemId) -> bool {
        let Some(index) = self.feed.items().iter().position(|item| &item.id == id) else {
            return false;
        };
        self.cursor = index;
        self.ensure_cursor_visible();
        self.focused = Some(self.feed.items()[index].clone());
        self.focus_scroll = 0;
        self.show_help = false;
        self.view = View::Focus;
        tracing::debug!(id = %id, "Opened item");
        true
    }

    pub fn exit_focus(&mut self) {
        self.view = View::Grid;
        self.focused = None;
        self.focus_scroll = 0;
    }
}

impl Drop for App {
    fn drop(&mut self) {
        if let Some(handle) = self.page_load_handle.take() {
            handle.abort();
            tracing::debug!("Aborted page load task on App drop");
        }
        if let Some(handle) = self.watch_handle.take() {
            handle.abort();
            tracing::debug!("Aborted dataset watcher on App drop");
        }
        self.gestures.clear();
    }
}
