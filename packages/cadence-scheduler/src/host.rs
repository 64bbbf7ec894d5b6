use crate::{TimerHandle, TimerService};
use slotmap::SlotMap;
use std::cell::{Cell, RefCell};
use std::time::{Duration, Instant};

/// Monotonic millisecond clock driving a [`HostLoop`].
pub trait Clock {
    fn now(&self) -> f64;

    /// Block (or jump) until `deadline`. Never moves time backwards.
    fn sleep_until(&self, deadline: f64);
}

/// Real time, measured from construction.
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }

    fn sleep_until(&self, deadline: f64) {
        let remaining = deadline - self.now();
        if remaining > 0.0 {
            std::thread::sleep(Duration::from_secs_f64(remaining / 1000.0));
        }
    }
}

/// Virtual time. Only moves when told to, which makes scheduling deterministic in tests.
#[derive(Default)]
pub struct ManualClock {
    now: Cell<f64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, delta: f64) {
        if delta > 0.0 {
            self.now.set(self.now.get() + delta);
        }
    }

    pub fn set(&self, time: f64) {
        if time > self.now.get() {
            self.now.set(time);
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        self.now.get()
    }

    fn sleep_until(&self, deadline: f64) {
        self.set(deadline);
    }
}

struct Booked {
    due: f64,
    seq: u64,
    callback: Box<dyn FnOnce()>,
}

/// A single-threaded timer loop.
/// Bookings fire in `(due, booking order)` order, one per [`turn`](HostLoop::turn).
pub struct HostLoop<C: Clock = ManualClock> {
    clock: C,
    timers: RefCell<SlotMap<TimerHandle, Booked>>,
    seq: Cell<u64>,
}

impl HostLoop<ManualClock> {
    pub fn manual() -> Self {
        Self::new(ManualClock::new())
    }

    /// Fire everything due within the next `delta` milliseconds, moving the clock as it goes.
    pub fn advance(&self, delta: f64) -> usize {
        self.run_until(self.clock.now() + delta)
    }

    /// Move the clock without firing anything, as if the host was busy.
    /// Timers that became due meanwhile fire late, on the next turn.
    pub fn stall(&self, delta: f64) {
        self.clock.advance(delta);
    }
}

impl HostLoop<SystemClock> {
    pub fn system() -> Self {
        Self::new(SystemClock::new())
    }
}

impl<C: Clock> HostLoop<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            timers: RefCell::new(SlotMap::with_key()),
            seq: Cell::new(0),
        }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn pending(&self) -> usize {
        self.timers.borrow().len()
    }

    pub fn is_idle(&self) -> bool {
        self.timers.borrow().is_empty()
    }

    fn next_due(&self) -> Option<(TimerHandle, f64)> {
        self.timers
            .borrow()
            .iter()
            .min_by(|(_, a), (_, b)| a.due.total_cmp(&b.due).then(a.seq.cmp(&b.seq)))
            .map(|(handle, booked)| (handle, booked.due))
    }

    fn fire(&self, handle: TimerHandle) -> bool {
        // The borrow must end before the callback runs: callbacks book and cancel timers.
        let booked = self.timers.borrow_mut().remove(handle);
        match booked {
            Some(booked) => {
                tracing::trace!(due = booked.due, now = self.clock.now(), "timer fired");
                (booked.callback)();
                true
            }
            None => false,
        }
    }

    /// Fire the earliest timer if it is due. Returns whether anything ran.
    pub fn turn(&self) -> bool {
        match self.next_due() {
            Some((handle, due)) if due <= self.clock.now() => self.fire(handle),
            _ => false,
        }
    }

    /// Fire every timer that is due right now, including ones booked along the way.
    pub fn run_due(&self) -> usize {
        let mut fired = 0;
        while self.turn() {
            fired += 1;
        }
        fired
    }

    /// Run the loop until `deadline`, sleeping between timers.
    pub fn run_until(&self, deadline: f64) -> usize {
        let mut fired = 0;
        while let Some((handle, due)) = self.next_due() {
            if due > deadline {
                break;
            }
            self.clock.sleep_until(due);
            if self.fire(handle) {
                fired += 1;
            }
        }
        self.clock.sleep_until(deadline);
        fired
    }

    /// Run the loop until no bookings remain.
    pub fn run_until_idle(&self) -> usize {
        let mut fired = 0;
        while let Some((handle, due)) = self.next_due() {
            self.clock.sleep_until(due);
            if self.fire(handle) {
                fired += 1;
            }
        }
        fired
    }
}

impl<C: Clock> TimerService for HostLoop<C> {
    fn now(&self) -> f64 {
        self.clock.now()
    }

    fn after(&self, delay: f64, callback: Box<dyn FnOnce()>) -> TimerHandle {
        let delay = if delay.is_finite() { delay.max(0.0) } else { 0.0 };
        let seq = self.seq.get();
        self.seq.set(seq + 1);
        let due = self.clock.now() + delay;
        self.timers.borrow_mut().insert(Booked { due, seq, callback })
    }

    fn cancel(&self, handle: TimerHandle) {
        self.timers.borrow_mut().remove(handle);
    }
}
