pub mod config;
pub mod error;
pub mod executor;
pub mod host;
pub mod priority;
pub mod queue;
pub mod sync;
pub mod task;

use slotmap::new_key_type;

new_key_type! {
    /// Handle to a callback booked with a [`TimerService`].
    pub struct TimerHandle;
}

/// The host loop as seen by the scheduler.
/// Anything that can run a callback later and read a monotonic clock qualifies:
/// a browser event loop, a winit loop, or the virtual [`HostLoop`] used in tests.
pub trait TimerService {
    /// Current time in milliseconds (monotonic).
    fn now(&self) -> f64;

    /// Run `callback` once, no earlier than `delay` milliseconds from now.
    /// A delay of zero means "on the next turn of the loop", never synchronously.
    fn after(&self, delay: f64, callback: Box<dyn FnOnce()>) -> TimerHandle;

    /// Cancel a booking. Idempotent; a no-op once the callback has fired.
    fn cancel(&self, handle: TimerHandle);
}

pub use config::SchedulerConfig;
pub use error::{Result, SchedulerError};
pub use executor::{ExecutorStats, TimeSlicedExecutor};
pub use host::{Clock, HostLoop, ManualClock, SystemClock};
pub use priority::{Priority, infer_priority};
pub use queue::TaskQueue;
pub use sync::SyncQueue;
pub use task::{Task, TaskId, TaskMeta, TaskStatus};
