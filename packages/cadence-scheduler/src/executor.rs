use crate::config::SchedulerConfig;
use crate::error::{Result, SchedulerError, check_span};
use crate::priority::Priority;
use crate::queue::TaskQueue;
use crate::task::{Task, TaskId, TaskMeta, TaskStatus};
use crate::{TimerHandle, TimerService};
use std::cell::Cell;
use std::rc::{Rc, Weak};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ExecutorStats {
    /// Tasks that got their slice.
    pub executed: u64,
    /// Tasks dropped because they expired before starting.
    pub expired: u64,
    /// Callback invocations across all slices.
    pub invocations: u64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Driver {
    Idle,
    Running,
    /// Pausing between slices so the host loop gets a turn.
    Yielding(TimerHandle),
    /// Booked to run once the head task becomes eligible.
    Waiting { handle: TimerHandle, due: f64 },
}

/// Runs prioritized tasks in bounded slices, handing control back to the host
/// loop between slices.
pub struct TimeSlicedExecutor {
    host: Rc<dyn TimerService>,
    config: SchedulerConfig,
    queue: TaskQueue,
    driver: Cell<Driver>,
    next_id: Cell<u64>,
    stats: Cell<ExecutorStats>,
    this: Weak<Self>,
}

impl TimeSlicedExecutor {
    pub fn new(host: Rc<dyn TimerService>, config: SchedulerConfig) -> Rc<Self> {
        Rc::new_cyclic(|this| Self {
            host,
            config,
            queue: TaskQueue::new(),
            driver: Cell::new(Driver::Idle),
            next_id: Cell::new(0),
            stats: Cell::new(ExecutorStats::default()),
            this: this.clone(),
        })
    }

    /// Queue `callback` to run no earlier than `delay` from now.
    /// If it has not started within `timeout` of that point it is dropped.
    pub fn schedule_callback(
        &self,
        priority: Priority,
        delay: f64,
        timeout: Option<f64>,
        callback: impl FnMut() -> TaskStatus + 'static,
    ) -> Result<TaskId> {
        let delay = check_span(delay, SchedulerError::InvalidDelay)?;
        let timeout = check_span(
            timeout.unwrap_or(self.config.default_timeout),
            SchedulerError::InvalidTimeout,
        )?;

        let now = self.host.now();
        let id = TaskId(self.next_id.get());
        self.next_id.set(id.0 + 1);

        let meta = TaskMeta {
            id,
            priority,
            start_time: now + delay,
            expiration_time: now + delay + timeout,
        };
        self.queue.push(Task::new(meta, Box::new(callback)));
        tracing::debug!(
            ?id,
            ?priority,
            start = meta.start_time,
            expires = meta.expiration_time,
            pending = self.queue.len(),
            "task scheduled"
        );

        match self.driver.get() {
            Driver::Idle => self.wait_for(meta.start_time),
            Driver::Waiting { handle, due } if meta.start_time < due => {
                self.host.cancel(handle);
                self.wait_for(meta.start_time);
            }
            _ => {}
        }
        Ok(id)
    }

    /// Remove a task that has not started yet.
    pub fn cancel_task(&self, id: TaskId) -> bool {
        let removed = self.queue.remove(id).is_some();
        if removed && self.queue.is_empty() {
            if let Driver::Waiting { handle, .. } = self.driver.get() {
                self.host.cancel(handle);
                self.driver.set(Driver::Idle);
            }
        }
        removed
    }

    /// Drive the queue now: drop expired heads, give the first eligible head
    /// one slice, then yield or wait.
    pub fn run(&self) {
        match self.driver.get() {
            Driver::Running => return,
            Driver::Yielding(handle) | Driver::Waiting { handle, .. } => self.host.cancel(handle),
            Driver::Idle => {}
        }
        self.driver.set(Driver::Running);

        loop {
            let now = self.host.now();
            let Some(head) = self.queue.head() else {
                tracing::trace!("task queue empty, driver stopping");
                self.driver.set(Driver::Idle);
                return;
            };

            if head.is_expired(now) {
                self.queue.pop();
                self.bump(|stats| stats.expired += 1);
                tracing::debug!(id = ?head.id, priority = ?head.priority, "task expired before starting");
                continue;
            }

            if !head.is_eligible(now) {
                tracing::trace!(id = ?head.id, start = head.start_time, "head task not yet eligible");
                self.wait_for(head.start_time);
                return;
            }

            if let Some(mut task) = self.queue.pop() {
                self.run_slice(&mut task);
            }
            self.yield_to_host();
            return;
        }
    }

    fn run_slice(&self, task: &mut Task) {
        let started = self.host.now();
        let mut invocations = 0;
        loop {
            invocations += 1;
            if task.invoke() == TaskStatus::Complete {
                break;
            }
            if self.host.now() - started >= self.config.slice_budget {
                break;
            }
        }
        self.bump(|stats| {
            stats.executed += 1;
            stats.invocations += invocations;
        });
        tracing::debug!(
            id = ?task.meta.id,
            priority = ?task.meta.priority,
            invocations,
            elapsed = self.host.now() - started,
            "task slice finished"
        );
    }

    fn yield_to_host(&self) {
        let handle = self.host.after(self.config.yield_delay, self.driver_callback());
        self.driver.set(Driver::Yielding(handle));
    }

    fn wait_for(&self, start_time: f64) {
        let delay = (start_time - self.host.now()).max(0.0);
        let handle = self.host.after(delay, self.driver_callback());
        self.driver.set(Driver::Waiting {
            handle,
            due: self.host.now() + delay,
        });
    }

    fn driver_callback(&self) -> Box<dyn FnOnce()> {
        let this = self.this.clone();
        Box::new(move || {
            if let Some(executor) = this.upgrade() {
                executor.driver.set(Driver::Idle);
                executor.run();
            }
        })
    }

    fn bump(&self, f: impl FnOnce(&mut ExecutorStats)) {
        let mut stats = self.stats.get();
        f(&mut stats);
        self.stats.set(stats);
    }

    pub fn stats(&self) -> ExecutorStats {
        self.stats.get()
    }

    pub fn pending(&self) -> Vec<TaskMeta> {
        self.queue.snapshot()
    }

    pub fn is_idle(&self) -> bool {
        self.driver.get() == Driver::Idle
    }
}
