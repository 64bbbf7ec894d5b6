use crate::priority::Priority;

/// What a task callback reports back after one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    /// More work remains; invoke again if the slice budget allows.
    Yield,
    /// Nothing left to do.
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(pub(crate) u64);

/// Scheduling metadata of a task, without its callback.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TaskMeta {
    pub id: TaskId,
    pub priority: Priority,
    /// Earliest time the task may run.
    pub start_time: f64,
    /// Past this point an unstarted task is dropped.
    pub expiration_time: f64,
}

impl TaskMeta {
    pub fn is_expired(&self, now: f64) -> bool {
        self.expiration_time < now
    }

    pub fn is_eligible(&self, now: f64) -> bool {
        self.start_time <= now && !self.is_expired(now)
    }
}

pub struct Task {
    pub meta: TaskMeta,
    callback: Box<dyn FnMut() -> TaskStatus>,
}

impl Task {
    pub fn new(meta: TaskMeta, callback: Box<dyn FnMut() -> TaskStatus>) -> Self {
        Self { meta, callback }
    }

    pub fn invoke(&mut self) -> TaskStatus {
        (self.callback)()
    }
}

impl std::fmt::Debug for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Task").field("meta", &self.meta).finish_non_exhaustive()
    }
}
