pub mod context;
pub mod error;
pub mod runtime;
pub mod state;
pub mod updates;

pub use context::{Booking, Decision, Phase, Route, SchedulerContext, decide};
pub use error::{ActionError, CoreError};
pub use runtime::{PassSummary, Profiling, Runtime};
pub use state::{Action, State};
pub use updates::{Update, UpdateKey, UpdateQueue};
