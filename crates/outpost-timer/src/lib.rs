//! Cancellable delayed tasks for Outpost.
//!
//! The server's execution context owns all mutable state, so a timer must
//! never run game logic itself. Instead, when a [`ScheduledTask`] fires,
//! the [`Scheduler`] *posts* its [`TaskId`] back onto the context's queue
//! and the context decides what to do with it.
//!
//! # Cancellation
//!
//! Each task carries a shared state flag. [`ScheduledTask::cancel`] flips
//! it (idempotently) and aborts the sleeper; the sleeper checks the flag
//! before posting, and the context calls [`ScheduledTask::claim`] when the
//! posted id arrives. A task that was cancelled after it had already been
//! posted is therefore still rejected at claim time:
//!
//! ```ignore
//! match task {
//!     ControlTask::Timer(id) => {
//!         if pending.id() == id && pending.claim() {
//!             start_next_round();
//!         }
//!     }
//! }
//! ```

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time;
use tracing::{debug, trace};

// ---------------------------------------------------------------------------
// TaskId
// ---------------------------------------------------------------------------

/// Identifier of a scheduled task, unique per [`Scheduler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(pub u64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// ScheduledTask
// ---------------------------------------------------------------------------

const PENDING: u8 = 0;
const CANCELLED: u8 = 1;
const CLAIMED: u8 = 2;

/// Handle to one pending delayed task.
///
/// Dropping the handle does *not* cancel the task; call
/// [`cancel`](Self::cancel) explicitly.
#[derive(Debug)]
pub struct ScheduledTask {
    id: TaskId,
    delay: Duration,
    state: Arc<AtomicU8>,
    sleeper: JoinHandle<()>,
}

impl ScheduledTask {
    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Cancels the task. Safe to call any number of times.
    ///
    /// Returns `true` only for the call that actually cancelled it.
    pub fn cancel(&self) -> bool {
        let cancelled = self
            .state
            .compare_exchange(PENDING, CANCELLED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if cancelled {
            self.sleeper.abort();
            debug!(task = %self.id, "scheduled task cancelled");
        }
        cancelled
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.load(Ordering::Acquire) == CANCELLED
    }

    /// Neither cancelled nor claimed yet.
    pub fn is_pending(&self) -> bool {
        self.state.load(Ordering::Acquire) == PENDING
    }

    /// Marks the task as run. Returns `true` at most once, and never after
    /// [`cancel`](Self::cancel).
    pub fn claim(&self) -> bool {
        self.state
            .compare_exchange(PENDING, CLAIMED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Callback used to post a fired task id onto the owner's queue.
pub type Post = Arc<dyn Fn(TaskId) + Send + Sync>;

/// Creates [`ScheduledTask`]s that post their id through `post` when due.
///
/// Sleepers run on the Tokio runtime, so [`schedule`](Self::schedule) must
/// be called from within one.
pub struct Scheduler {
    post: Post,
    next_id: u64,
}

impl Scheduler {
    pub fn new(post: impl Fn(TaskId) + Send + Sync + 'static) -> Self {
        Self {
            post: Arc::new(post),
            next_id: 1,
        }
    }

    /// Schedules a task that fires once after `delay`.
    pub fn schedule(&mut self, delay: Duration) -> ScheduledTask {
        let id = TaskId(self.next_id);
        self.next_id += 1;

        let state = Arc::new(AtomicU8::new(PENDING));
        let sleeper = {
            let state = Arc::clone(&state);
            let post = Arc::clone(&self.post);
            tokio::spawn(async move {
                time::sleep(delay).await;
                if state.load(Ordering::Acquire) == PENDING {
                    trace!(task = %id, "scheduled task due");
                    post(id);
                }
            })
        };

        debug!(task = %id, delay_secs = delay.as_secs_f64(), "task scheduled");
        ScheduledTask {
            id,
            delay,
            state,
            sleeper,
        }
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler").field("next_id", &self.next_id).finish()
    }
}
