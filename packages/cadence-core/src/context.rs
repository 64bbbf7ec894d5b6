//! Scheduler bookkeeping as a plain value.
//!
//! Every transition takes a [`SchedulerContext`] and returns the next one, so
//! the runtime's decisions can be exercised without a host loop.

use cadence_scheduler::{Priority, TimerHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// No processing pass is running; dispatches are queued.
    #[default]
    Idle,
    /// A processing pass is applying updates; dispatches apply immediately.
    Draining,
}

/// How a booking reaches the host loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Route {
    /// Queued on the zero-delay sync batch. Cannot be withdrawn, only outdated.
    Sync,
    Timer(TimerHandle),
}

/// The single pending callback the runtime holds with the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Booking {
    pub priority: Priority,
    pub route: Route,
    /// Identifies the booking; a callback carrying an older epoch is stale.
    pub epoch: u64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Decision {
    /// The existing booking is at least as urgent; leave it alone.
    Keep,
    Book {
        priority: Priority,
        delay: f64,
        sync: bool,
        /// Booking to withdraw first, if any.
        replaces: Option<Booking>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SchedulerContext {
    pub booking: Option<Booking>,
    pub phase: Phase,
    epoch: u64,
}

/// Decide whether work at `priority`, due in `delay`, needs a new booking.
///
/// An existing booking of equal or greater urgency wins; only strictly more
/// urgent work preempts it. Immediate or zero-delay work goes through the sync path.
pub fn decide(ctx: &SchedulerContext, priority: Priority, delay: f64) -> Decision {
    if let Some(existing) = ctx.booking {
        if existing.priority >= priority {
            return Decision::Keep;
        }
    }
    Decision::Book {
        priority,
        delay: delay.max(0.0),
        sync: priority == Priority::Immediate || delay <= 0.0,
        replaces: ctx.booking,
    }
}

impl SchedulerContext {
    pub fn is_draining(&self) -> bool {
        self.phase == Phase::Draining
    }

    /// Epoch to hand out with the next booking.
    pub fn next_epoch(&self) -> u64 {
        self.epoch + 1
    }

    pub fn booked(self, booking: Booking) -> Self {
        Self {
            booking: Some(booking),
            epoch: booking.epoch,
            ..self
        }
    }

    /// The booking with `epoch` fired. `None` if it was replaced meanwhile.
    pub fn fired(self, epoch: u64) -> Option<Self> {
        match self.booking {
            Some(booking) if booking.epoch == epoch => Some(Self {
                booking: None,
                ..self
            }),
            _ => None,
        }
    }

    pub fn begin_pass(self) -> Self {
        Self {
            phase: Phase::Draining,
            ..self
        }
    }

    pub fn end_pass(self) -> Self {
        Self {
            phase: Phase::Idle,
            ..self
        }
    }
}
