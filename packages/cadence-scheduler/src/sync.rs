use crate::{TimerHandle, TimerService};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

/// Zero-delay batch of callbacks, flushed in FIFO order on a single booking.
pub struct SyncQueue {
    host: Rc<dyn TimerService>,
    callbacks: RefCell<VecDeque<Box<dyn FnOnce()>>>,
    booking: Cell<Option<TimerHandle>>,
    flushing: Cell<bool>,
    this: Weak<Self>,
}

/// Clears the flushing flag even if a callback unwinds.
struct FlushGuard<'a>(&'a Cell<bool>);

impl Drop for FlushGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl SyncQueue {
    pub fn new(host: Rc<dyn TimerService>) -> Rc<Self> {
        Rc::new_cyclic(|this| Self {
            host,
            callbacks: RefCell::new(VecDeque::new()),
            booking: Cell::new(None),
            flushing: Cell::new(false),
            this: this.clone(),
        })
    }

    /// Append `callback` to the batch, booking a flush if none is pending.
    pub fn schedule_sync(&self, callback: impl FnOnce() + 'static) {
        self.callbacks.borrow_mut().push_back(Box::new(callback));

        if self.booking.get().is_none() && !self.flushing.get() {
            let this = self.this.clone();
            let handle = self.host.after(
                0.0,
                Box::new(move || {
                    if let Some(queue) = this.upgrade() {
                        queue.booking.set(None);
                        queue.flush_sync();
                    }
                }),
            );
            self.booking.set(Some(handle));
        }
    }

    /// Run callbacks until the batch is empty, including any appended while
    /// flushing. Returns how many ran. A nested call from inside a callback is
    /// a no-op; the outer flush drains it.
    pub fn flush_sync(&self) -> usize {
        if self.flushing.get() {
            return 0;
        }
        self.flushing.set(true);
        let _guard = FlushGuard(&self.flushing);

        let mut ran = 0;
        loop {
            // Pop one at a time and release the borrow: callbacks append.
            let next = self.callbacks.borrow_mut().pop_front();
            let Some(callback) = next else { break };
            callback();
            ran += 1;
        }

        if let Some(handle) = self.booking.take() {
            self.host.cancel(handle);
        }
        if ran > 0 {
            tracing::trace!(ran, "sync batch flushed");
        }
        ran
    }

    pub fn len(&self) -> usize {
        self.callbacks.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.borrow().is_empty()
    }

    /// Whether a flush is booked or in progress.
    pub fn is_pending(&self) -> bool {
        self.booking.get().is_some() || self.flushing.get()
    }
}
