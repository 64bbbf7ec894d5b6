use cadence_core::{Runtime, State};
use cadence_scheduler::{
    HostLoop, Priority, SchedulerConfig, TaskStatus, TimeSlicedExecutor, TimerService,
};
use std::rc::Rc;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Default)]
struct Counter {
    count: i64,
}

struct CounterPatch {
    count: Option<i64>,
}

impl State for Counter {
    type Patch = CounterPatch;

    fn merge(&self, patch: CounterPatch) -> Self {
        Counter {
            count: patch.count.unwrap_or(self.count),
        }
    }
}

fn load_config() -> Result<SchedulerConfig, Box<dyn std::error::Error>> {
    match std::env::var("CADENCE_CONFIG") {
        Ok(path) => Ok(SchedulerConfig::from_json(&std::fs::read_to_string(path)?)?),
        Err(_) => Ok(SchedulerConfig::default()),
    }
}

/// Stands in for work that keeps the thread busy.
fn busy_work(duration: Duration) {
    let start = Instant::now();
    while start.elapsed() < duration {
        std::hint::spin_loop();
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
        .init();

    let config = load_config()?;
    let host = Rc::new(HostLoop::system());

    let runtime = Runtime::new(host.clone(), config, Counter::default(), |state: &Counter| {
        tracing::info!(count = state.count, "render");
    })?;

    for _ in 0..3 {
        runtime.dispatch(|prev: &Counter| CounterPatch {
            count: Some(prev.count + 1),
        })?;
    }

    runtime
        .sync_queue()
        .schedule_sync(|| tracing::info!("sync callback"));

    let executor = TimeSlicedExecutor::new(host.clone(), config);
    for (priority, delay, timeout) in [(Priority::Low, 200.0, 5000.0), (Priority::Normal, 300.0, 4000.0)] {
        executor.schedule_callback(priority, delay, Some(timeout), move || {
            busy_work(Duration::from_millis(10));
            tracing::info!(level = priority.level(), "task ran");
            TaskStatus::Complete
        })?;
    }

    let fired = host.run_until_idle();
    tracing::info!(
        fired,
        elapsed_ms = host.now(),
        count = runtime.state().count,
        stats = ?executor.stats(),
        "host loop idle"
    );
    Ok(())
}
