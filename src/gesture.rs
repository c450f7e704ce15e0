//! Single/double click disambiguation for one interactive target.
//!
//! A click on a card must not select it until it is certain that a second
//! click is not about to arrive. Each click starts a cancellable timed wait
//! (a [`PendingWait`]); a second click inside the window cancels the wait and
//! is reported as [`Gesture::Open`] instead. If the window elapses untouched,
//! the wait resolves and [`Gesture::Activate`] is emitted.
//!
//! One [`GestureDisambiguator`] exists per target. Its wait bookkeeping is an
//! owned field, so clicks on one card never interfere with another card.
//!
//! All timing goes through `tokio::time`, which lets tests drive the window
//! with paused time.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Default disambiguation window.
pub const DEFAULT_WINDOW: Duration = Duration::from_millis(300);

/// Semantic result of a click sequence on one target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    /// Single click: the window elapsed without a second click.
    Activate,
    /// Double click.
    Open,
}

/// How a single call to [`GestureDisambiguator::on_click`] ended.
///
/// Only `Activated` and `Promoted` correspond to an emission; the other two
/// are bookkeeping for the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    /// The window elapsed and `Activate` was emitted.
    Activated,
    /// A later click cancelled this wait before it resolved.
    Superseded,
    /// This click arrived inside a live window and emitted `Open`.
    Promoted,
    /// This click belonged to a gesture that had already emitted `Open`.
    Absorbed,
}

/// Errors surfaced through a [`PendingClick`].
///
/// Cancellation is deliberately absent: a superseded wait resolves to
/// `Ok(ClickOutcome::Superseded)`.
#[derive(Debug, Error)]
pub enum GestureError {
    /// An uncancelled wait resolved but was no longer tracked.
    #[error("Disambiguation wait {wait_id} resolved without a tracked entry")]
    InvalidState { wait_id: u64 },
    /// The timer task panicked or was aborted.
    #[error("Disambiguation timer failed: {0}")]
    TimerFailed(String),
}

/// One outstanding timed disambiguation window.
struct PendingWait {
    id: u64,
    deadline: Instant,
    cancelled: Arc<AtomicBool>,
}

impl PendingWait {
    fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }
}

/// Per-target bookkeeping, guarded by the disambiguator's mutex.
#[derive(Default)]
struct TargetState {
    pending: Vec<PendingWait>,
    next_wait_id: u64,
    /// Clicks before this instant belong to a gesture that already emitted `Open`.
    open_until: Option<Instant>,
}

impl TargetState {
    /// Cancel every tracked wait. Returns how many were cancelled.
    fn cancel_all(&mut self) -> usize {
        let count = self.pending.len();
        for wait in self.pending.drain(..) {
            wait.cancel();
        }
        count
    }

    /// Cancel the waits whose window is still open at `now`.
    ///
    /// A wait past its deadline has already been decided as a single click;
    /// its timer task removes it when it runs.
    fn cancel_live(&mut self, now: Instant) -> usize {
        let mut cancelled = 0;
        self.pending.retain(|wait| {
            if now < wait.deadline {
                wait.cancel();
                cancelled += 1;
                false
            } else {
                true
            }
        });
        cancelled
    }

    fn in_open_gesture(&self, now: Instant) -> bool {
        self.open_until.is_some_and(|until| now < until)
    }
}

fn lock_state(state: &Mutex<TargetState>) -> MutexGuard<'_, TargetState> {
    // The guard is never held across the callback, so a poisoned lock only
    // means a panic inside our own bookkeeping; the data is still coherent.
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

type GestureCallback = Arc<dyn Fn(Gesture) + Send + Sync>;

/// Handle returned by [`GestureDisambiguator::on_click`].
///
/// Awaiting it is optional; emission happens through the callback whether or
/// not anybody waits.
#[must_use = "dropping the handle is fine, but the outcome is only observable by awaiting it"]
pub struct PendingClick {
    inner: PendingInner,
}

enum PendingInner {
    Resolved(ClickOutcome),
    Waiting(JoinHandle<Result<ClickOutcome, GestureError>>),
}

impl PendingClick {
    fn resolved(outcome: ClickOutcome) -> Self {
        Self {
            inner: PendingInner::Resolved(outcome),
        }
    }

    /// True if the click was decided synchronously (promoted or absorbed).
    pub fn is_resolved(&self) -> bool {
        matches!(self.inner, PendingInner::Resolved(_))
    }

    /// Wait for this click's window to resolve.
    pub async fn wait(self) -> Result<ClickOutcome, GestureError> {
        match self.inner {
            PendingInner::Resolved(outcome) => Ok(outcome),
            PendingInner::Waiting(handle) => match handle.await {
                Ok(result) => result,
                Err(e) => Err(GestureError::TimerFailed(e.to_string())),
            },
        }
    }
}

/// Classifies clicks on one target into exactly one `Activate` or `Open`.
///
/// Must be used from within a tokio runtime: each click that opens a window
/// spawns a timer task.
pub struct GestureDisambiguator {
    window: Duration,
    on_gesture: GestureCallback,
    state: Arc<Mutex<TargetState>>,
}

impl GestureDisambiguator {
    /// Create a disambiguator that reports resolved gestures to `on_gesture`.
    ///
    /// The callback is never invoked while internal state is locked, so it may
    /// call back into this disambiguator.
    pub fn new<F>(window: Duration, on_gesture: F) -> Self
    where
        F: Fn(Gesture) + Send + Sync + 'static,
    {
        Self {
            window,
            on_gesture: Arc::new(on_gesture),
            state: Arc::new(Mutex::new(TargetState::default())),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Number of waits currently tracked (live or awaiting their timer task).
    pub fn pending_waits(&self) -> usize {
        lock_state(&self.state).pending.len()
    }

    /// Register one physical click.
    ///
    /// - Inside a gesture that already opened: absorbed, extends that gesture.
    /// - Inside a live window: cancels the wait and emits `Open` now.
    /// - Otherwise: starts a new window; `Activate` follows if nothing
    ///   supersedes it.
    pub fn on_click(&self) -> PendingClick {
        let now = Instant::now();
        let mut state = lock_state(&self.state);

        if state.in_open_gesture(now) {
            state.open_until = Some(now + self.window);
            tracing::trace!("Click absorbed into an opened gesture");
            return PendingClick::resolved(ClickOutcome::Absorbed);
        }
        state.open_until = None;

        if state.cancel_live(now) > 0 {
            state.open_until = Some(now + self.window);
            drop(state);
            tracing::debug!("Second click inside window, emitting open");
            (self.on_gesture)(Gesture::Open);
            return PendingClick::resolved(ClickOutcome::Promoted);
        }

        let wait_id = state.next_wait_id;
        state.next_wait_id = state.next_wait_id.wrapping_add(1);
        let deadline = now + self.window;
        let cancelled = Arc::new(AtomicBool::new(false));
        state.pending.push(PendingWait {
            id: wait_id,
            deadline,
            cancelled: Arc::clone(&cancelled),
        });
        drop(state);

        tracing::trace!(wait_id, "Started disambiguation window");
        let handle = tokio::spawn(resolve_wait(
            wait_id,
            deadline,
            cancelled,
            Arc::clone(&self.state),
            Arc::clone(&self.on_gesture),
        ));
        PendingClick {
            inner: PendingInner::Waiting(handle),
        }
    }

    /// Register a native double-click notification.
    ///
    /// Cancels any pending wait and emits `Open`, unless the current gesture
    /// already emitted `Open` (e.g. the second raw click was promoted first).
    /// Returns whether `Open` was emitted.
    pub fn on_double_click(&self) -> bool {
        let now = Instant::now();
        let mut state = lock_state(&self.state);

        if state.in_open_gesture(now) {
            tracing::trace!("Double click already reported for this gesture");
            return false;
        }

        state.cancel_all();
        state.open_until = Some(now + self.window);
        drop(state);

        (self.on_gesture)(Gesture::Open);
        true
    }

    /// Cancel every pending wait without emitting anything.
    pub fn cancel(&self) -> usize {
        lock_state(&self.state).cancel_all()
    }
}

impl Drop for GestureDisambiguator {
    fn drop(&mut self) {
        let cancelled = self.cancel();
        if cancelled > 0 {
            tracing::debug!(cancelled, "Cancelled pending clicks on disambiguator drop");
        }
    }
}

/// Timer body for one wait: sleep until the deadline, then emit `Activate`
/// unless the wait was cancelled in the meantime.
async fn resolve_wait(
    wait_id: u64,
    deadline: Instant,
    cancelled: Arc<AtomicBool>,
    state: Arc<Mutex<TargetState>>,
    on_gesture: GestureCallback,
) -> Result<ClickOutcome, GestureError> {
    tokio::time::sleep_until(deadline).await;

    {
        // Cancellation is only ever set under this lock, so the check and the
        // removal below cannot interleave with a new click.
        let mut state = lock_state(&state);
        if cancelled.load(Ordering::SeqCst) {
            tracing::trace!(wait_id, "Wait superseded");
            return Ok(ClickOutcome::Superseded);
        }
        let Some(pos) = state.pending.iter().position(|w| w.id == wait_id) else {
            debug_assert!(false, "wait {wait_id} resolved without a tracked entry");
            tracing::error!(wait_id, "Disambiguation wait resolved without a tracked entry");
            return Err(GestureError::InvalidState { wait_id });
        };
        state.pending.remove(pos);
    }

    tracing::debug!(wait_id, "Window elapsed, emitting activate");
    on_gesture(Gesture::Activate);
    Ok(ClickOutcome::Activated)
}
