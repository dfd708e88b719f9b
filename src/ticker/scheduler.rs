//! Repeating task scheduling
//!
//! [`TokioScheduler`] drives real ticks on a tokio runtime. [`ManualScheduler`]
//! runs tasks against virtual time so lifecycle behavior can be tested
//! without wall-clock waits.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::AbortHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Work run on every firing of a repeating schedule
pub type Task = Box<dyn FnMut() + Send>;

/// Cancellable handle to a repeating task
pub trait TaskHandle: Send + Sync {
    /// Prevent future firings; a firing already in progress completes
    fn cancel(&self);
    fn is_cancelled(&self) -> bool;
}

/// Something that can run a task repeatedly
pub trait Scheduler: Send + Sync {
    /// Run `task` every `interval`, first firing one interval from now
    fn schedule_repeating(&self, interval: Duration, task: Task) -> Box<dyn TaskHandle>;
}

/// Scheduler backed by a tokio runtime
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    handle: Handle,
}

impl TokioScheduler {
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Use the runtime the caller is running on
    pub fn current() -> anyhow::Result<Self> {
        let handle = Handle::try_current()
            .map_err(|e| anyhow::anyhow!("No tokio runtime available: {}", e))?;
        Ok(Self::new(handle))
    }
}

struct TokioTaskHandle {
    abort: AbortHandle,
    cancelled: Arc<AtomicBool>,
}

impl TaskHandle for TokioTaskHandle {
    fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.abort.abort();
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

impl Scheduler for TokioScheduler {
    fn schedule_repeating(&self, interval: Duration, mut task: Task) -> Box<dyn TaskHandle> {
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = cancelled.clone();

        let join = self.handle.spawn(async move {
            let mut ticks = interval_at(Instant::now() + interval, interval);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticks.tick().await;
                if flag.load(Ordering::SeqCst) {
                    break;
                }
                task();
            }
        });

        Box::new(TokioTaskHandle {
            abort: join.abort_handle(),
            cancelled,
        })
    }
}

struct ManualTask {
    interval: Duration,
    next_due: Duration,
    task: Arc<Mutex<Task>>,
    cancelled: Arc<AtomicBool>,
}

#[derive(Default)]
struct ManualInner {
    now: Duration,
    tasks: Vec<ManualTask>,
}

/// Scheduler driven by explicit calls to [`ManualScheduler::advance`]
#[derive(Clone, Default)]
pub struct ManualScheduler {
    inner: Arc<Mutex<ManualInner>>,
}

struct ManualTaskHandle {
    cancelled: Arc<AtomicBool>,
}

impl TaskHandle for ManualTaskHandle {
    fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Virtual time elapsed since creation
    pub fn now(&self) -> Duration {
        self.inner.lock().now
    }

    /// Number of schedules that have not been cancelled
    pub fn active(&self) -> usize {
        self.inner
            .lock()
            .tasks
            .iter()
            .filter(|t| !t.cancelled.load(Ordering::SeqCst))
            .count()
    }

    /// Move virtual time forward, firing every task that falls due
    ///
    /// Tasks fire in due-time order and run without the scheduler lock held,
    /// so they may schedule or cancel work themselves. Returns the number of
    /// firings.
    pub fn advance(&self, by: Duration) -> usize {
        let target = self.inner.lock().now + by;
        let mut fired = 0;

        loop {
            let due = {
                let mut inner = self.inner.lock();
                inner.tasks.retain(|t| !t.cancelled.load(Ordering::SeqCst));
                let next = inner
                    .tasks
                    .iter_mut()
                    .filter(|t| t.next_due <= target)
                    .min_by_key(|t| t.next_due);
                match next {
                    Some(t) => {
                        let at = t.next_due;
                        t.next_due += t.interval;
                        let job = (t.task.clone(), t.cancelled.clone());
                        inner.now = at;
                        Some(job)
                    }
                    None => None,
                }
            };

            let Some((task, cancelled)) = due else {
                break;
            };
            if cancelled.load(Ordering::SeqCst) {
                continue;
            }
            let mut job = task.lock();
            (*job)();
            drop(job);
            fired += 1;
        }

        self.inner.lock().now = target;
        fired
    }
}

impl Scheduler for ManualScheduler {
    fn schedule_repeating(&self, interval: Duration, task: Task) -> Box<dyn TaskHandle> {
        let cancelled = Arc::new(AtomicBool::new(false));
        let mut inner = self.inner.lock();
        let next_due = inner.now + interval;
        inner.tasks.push(ManualTask {
            interval,
            next_due,
            task: Arc::new(Mutex::new(task)),
            cancelled: cancelled.clone(),
        });
        Box::new(ManualTaskHandle { cancelled })
    }
}

impl std::fmt::Debug for ManualScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManualScheduler")
            .field("now", &self.now())
            .field("active", &self.active())
            .finish()
    }
}
