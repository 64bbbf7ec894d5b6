use crate::task::{Task, TaskId, TaskMeta};
use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::VecDeque;

/// Pending tasks, kept sorted by priority (highest first) then start time.
/// Equal keys keep arrival order.
/// Since the executor is single-threaded, we use RefCell<VecDeque>.
#[derive(Default)]
pub struct TaskQueue {
    queue: RefCell<VecDeque<Task>>,
}

fn run_order(a: &TaskMeta, b: &TaskMeta) -> Ordering {
    b.priority
        .cmp(&a.priority)
        .then(a.start_time.total_cmp(&b.start_time))
}

impl TaskQueue {
    pub fn new() -> Self {
        Self {
            queue: RefCell::new(VecDeque::new()),
        }
    }

    pub fn push(&self, task: Task) {
        let mut queue = self.queue.borrow_mut();
        // Insert after every task that sorts equal, so arrival order breaks ties.
        let at = queue.partition_point(|queued| run_order(&queued.meta, &task.meta) != Ordering::Greater);
        queue.insert(at, task);
    }

    pub fn head(&self) -> Option<TaskMeta> {
        self.queue.borrow().front().map(|task| task.meta)
    }

    pub fn pop(&self) -> Option<Task> {
        self.queue.borrow_mut().pop_front()
    }

    pub fn remove(&self, id: TaskId) -> Option<Task> {
        let mut queue = self.queue.borrow_mut();
        let at = queue.iter().position(|task| task.meta.id == id)?;
        queue.remove(at)
    }

    /// Metadata of every pending task, in run order.
    pub fn snapshot(&self) -> Vec<TaskMeta> {
        self.queue.borrow().iter().map(|task| task.meta).collect()
    }

    pub fn len(&self) -> usize {
        self.queue.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.borrow().is_empty()
    }
}
