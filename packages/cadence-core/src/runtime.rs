use crate::context::{Booking, Decision, Route, SchedulerContext, decide};
use crate::error::{ActionError, CoreError};
use crate::state::{Action, State};
use crate::updates::UpdateQueue;
use cadence_scheduler::{SchedulerConfig, SyncQueue, TimerService, infer_priority};
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Profiling {
    pub pass_count: u64,
    pub applied_count: u64,
    pub immediate_count: u64,
    pub render_count: u64,
    pub booking_count: u64,
    pub preemption_count: u64,
}

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassSummary {
    pub applied: usize,
    pub rendered: bool,
}

/// Puts the context back to `Idle` when a pass ends, even by unwinding.
struct PassGuard<'a>(&'a Cell<SchedulerContext>);

impl Drop for PassGuard<'_> {
    fn drop(&mut self) {
        self.0.set(self.0.get().end_pass());
    }
}

/// Owns application state and the pending updates to it, and books
/// processing passes with the host loop.
pub struct Runtime<S: State> {
    host: Rc<dyn TimerService>,
    sync: Rc<SyncQueue>,
    config: SchedulerConfig,
    state: RefCell<S>,
    updates: RefCell<UpdateQueue<Action<S>>>,
    context: Cell<SchedulerContext>,
    render: RefCell<Box<dyn FnMut(&S)>>,
    profiling: Cell<Profiling>,
    this: Weak<Self>,
}

impl<S: State> Runtime<S> {
    pub fn new(
        host: Rc<dyn TimerService>,
        config: SchedulerConfig,
        initial: S,
        render: impl FnMut(&S) + 'static,
    ) -> Result<Rc<Self>, CoreError> {
        let sync = SyncQueue::new(host.clone());
        Self::with_sync_queue(host, sync, config, initial, render)
    }

    /// Like [`Runtime::new`], sharing an existing sync batch with other users.
    pub fn with_sync_queue(
        host: Rc<dyn TimerService>,
        sync: Rc<SyncQueue>,
        config: SchedulerConfig,
        initial: S,
        render: impl FnMut(&S) + 'static,
    ) -> Result<Rc<Self>, CoreError> {
        let config = config.validate()?;
        Ok(Rc::new_cyclic(|this| Self {
            host,
            sync,
            config,
            state: RefCell::new(initial),
            updates: RefCell::new(UpdateQueue::new()),
            context: Cell::new(SchedulerContext::default()),
            render: RefCell::new(Box::new(render)),
            profiling: Cell::new(Profiling::default()),
            this: this.clone(),
        }))
    }

    /// Request a state transition.
    ///
    /// Outside a processing pass the update is queued and a pass is booked.
    /// Inside one (an action dispatching) it is applied and rendered before
    /// this returns, so the only error is the action's own.
    pub fn dispatch(&self, action: impl FnOnce(&S) -> S::Patch + 'static) -> Result<(), ActionError> {
        self.try_dispatch(move |state| Ok(action(state)))
    }

    pub fn try_dispatch(
        &self,
        action: impl FnOnce(&S) -> Result<S::Patch, ActionError> + 'static,
    ) -> Result<(), ActionError> {
        if self.context.get().is_draining() {
            return self.apply_immediately(Box::new(action));
        }

        let expiration_time = self.host.now() + self.config.update_window;
        let pending = {
            let mut updates = self.updates.borrow_mut();
            updates.enqueue(Box::new(action), expiration_time);
            updates.len()
        };
        tracing::trace!(expiration_time, pending, "update queued");

        self.ensure_scheduled();
        Ok(())
    }

    fn apply_immediately(&self, action: Action<S>) -> Result<(), ActionError> {
        let snapshot = self.state.borrow().clone();
        let patch = action(&snapshot)?;
        self.commit(patch);
        self.bump(|p| p.immediate_count += 1);
        tracing::trace!("update applied during pass");
        self.render();
        Ok(())
    }

    /// Book (or rebook) a processing pass for the most urgent pending update.
    pub fn ensure_scheduled(&self) {
        let most_urgent = self
            .updates
            .borrow()
            .peek_most_urgent()
            .map(|update| update.expiration_time);
        let Some(expiration_time) = most_urgent else {
            return;
        };

        let now = self.host.now();
        let priority = infer_priority(expiration_time, now, self.config.urgent_threshold);
        let ctx = self.context.get();

        let (priority, delay, sync, replaces) = match decide(&ctx, priority, expiration_time - now) {
            Decision::Keep => {
                tracing::trace!(?priority, "existing booking is at least as urgent");
                return;
            }
            Decision::Book {
                priority,
                delay,
                sync,
                replaces,
            } => (priority, delay, sync, replaces),
        };

        if let Some(old) = replaces {
            if let Route::Timer(handle) = old.route {
                self.host.cancel(handle);
            }
            self.bump(|p| p.preemption_count += 1);
            tracing::debug!(from = ?old.priority, to = ?priority, "preempting booked pass");
        }

        let epoch = ctx.next_epoch();
        let callback = self.booking_callback(epoch);
        let route = if sync {
            self.sync.schedule_sync(callback);
            Route::Sync
        } else {
            Route::Timer(self.host.after(delay, callback))
        };

        self.context.set(ctx.booked(Booking {
            priority,
            route,
            epoch,
        }));
        self.bump(|p| p.booking_count += 1);
        tracing::debug!(?priority, delay, sync, "processing pass booked");
    }

    fn booking_callback(&self, epoch: u64) -> Box<dyn FnOnce()> {
        let this = self.this.clone();
        Box::new(move || {
            if let Some(runtime) = this.upgrade() {
                runtime.on_booking_fired(epoch);
            }
        })
    }

    fn on_booking_fired(&self, epoch: u64) {
        let Some(ctx) = self.context.get().fired(epoch) else {
            tracing::trace!(epoch, "stale booking ignored");
            return;
        };
        self.context.set(ctx);

        if let Err(err) = self.perform_work() {
            tracing::error!(error = %err, "processing pass failed");
        }
    }

    /// Apply every pending update in arrival order, then render once.
    ///
    /// If an action fails, updates applied before it stay applied (and are
    /// rendered); the remainder of the batch is discarded.
    pub fn perform_work(&self) -> Result<PassSummary, CoreError> {
        if self.context.get().is_draining() {
            return Ok(PassSummary::default());
        }

        let guard = {
            self.context.set(self.context.get().begin_pass());
            PassGuard(&self.context)
        };

        let batch = self.updates.borrow_mut().drain_in_order();
        let total = batch.len();
        let mut applied = 0;
        let mut failure = None;

        for update in batch {
            let snapshot = self.state.borrow().clone();
            match (update.action)(&snapshot) {
                Ok(patch) => {
                    self.commit(patch);
                    applied += 1;
                }
                Err(source) => {
                    failure = Some(source);
                    break;
                }
            }
        }
        drop(guard);

        self.bump(|p| {
            p.pass_count += 1;
            p.applied_count += applied as u64;
        });

        let rendered = applied > 0;
        if rendered {
            self.render();
        }
        tracing::debug!(applied, total, "processing pass finished");

        match failure {
            Some(source) => Err(CoreError::ActionFailed {
                applied,
                discarded: total - applied - 1,
                source,
            }),
            None => Ok(PassSummary { applied, rendered }),
        }
    }

    /// Merge a patch into the state as it is now, which includes anything a
    /// nested dispatch applied while the action ran.
    fn commit(&self, patch: S::Patch) {
        let next = self.state.borrow().merge(patch);
        self.state.replace(next);
    }

    fn render(&self) {
        let snapshot = self.state.borrow().clone();
        match self.render.try_borrow_mut() {
            Ok(mut render) => {
                render(&snapshot);
                self.bump(|p| p.render_count += 1);
            }
            Err(_) => tracing::warn!("render re-entered from itself, skipping"),
        }
    }

    fn bump(&self, f: impl FnOnce(&mut Profiling)) {
        let mut profiling = self.profiling.get();
        f(&mut profiling);
        self.profiling.set(profiling);
    }

    pub fn state(&self) -> S {
        self.state.borrow().clone()
    }

    pub fn with_state<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&self.state.borrow())
    }

    /// Updates waiting for the next pass.
    pub fn pending(&self) -> usize {
        self.updates.borrow().len()
    }

    pub fn is_draining(&self) -> bool {
        self.context.get().is_draining()
    }

    pub fn context(&self) -> SchedulerContext {
        self.context.get()
    }

    pub fn profiling(&self) -> Profiling {
        self.profiling.get()
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn sync_queue(&self) -> &Rc<SyncQueue> {
        &self.sync
    }
}
