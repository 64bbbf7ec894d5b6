use cadence_scheduler::{
    HostLoop, Priority, SchedulerConfig, Task, TaskQueue, TaskStatus, TimeSlicedExecutor,
    TimerService,
};
use std::cell::RefCell;
use std::rc::Rc;

fn create_executor() -> (Rc<HostLoop>, Rc<TimeSlicedExecutor>) {
    let host = Rc::new(HostLoop::manual());
    let executor = TimeSlicedExecutor::new(host.clone(), SchedulerConfig::default());
    (host, executor)
}

fn record(log: &Rc<RefCell<Vec<&'static str>>>, name: &'static str) -> Box<dyn FnMut() -> TaskStatus> {
    let log = log.clone();
    Box::new(move || {
        log.borrow_mut().push(name);
        TaskStatus::Complete
    })
}

#[test]
fn test_queue_sorted_by_priority_then_start() {
    let (_host, executor) = create_executor();

    executor
        .schedule_callback(Priority::Low, 10.0, None, || TaskStatus::Complete)
        .unwrap();
    executor
        .schedule_callback(Priority::Immediate, 30.0, None, || TaskStatus::Complete)
        .unwrap();
    executor
        .schedule_callback(Priority::Normal, 20.0, None, || TaskStatus::Complete)
        .unwrap();
    executor
        .schedule_callback(Priority::Immediate, 5.0, None, || TaskStatus::Complete)
        .unwrap();

    let order: Vec<_> = executor
        .pending()
        .iter()
        .map(|meta| (meta.priority, meta.start_time))
        .collect();
    assert_eq!(
        order,
        vec![
            (Priority::Immediate, 5.0),
            (Priority::Immediate, 30.0),
            (Priority::Normal, 20.0),
            (Priority::Low, 10.0),
        ]
    );
}

#[test]
fn test_equal_keys_keep_arrival_order() {
    let (_host, executor) = create_executor();

    let first = executor
        .schedule_callback(Priority::Normal, 10.0, None, || TaskStatus::Complete)
        .unwrap();
    let second = executor
        .schedule_callback(Priority::Normal, 10.0, None, || TaskStatus::Complete)
        .unwrap();
    let third = executor
        .schedule_callback(Priority::Normal, 10.0, None, || TaskStatus::Complete)
        .unwrap();

    let ids: Vec<_> = executor.pending().iter().map(|meta| meta.id).collect();
    assert_eq!(ids, vec![first, second, third]);
}

#[test]
fn test_higher_priority_runs_first_once_both_eligible() {
    let (host, executor) = create_executor();
    let log = Rc::new(RefCell::new(Vec::new()));

    executor
        .schedule_callback(Priority::Normal, 200.0, Some(5000.0), record(&log, "level-2"))
        .unwrap();
    executor
        .schedule_callback(Priority::Low, 300.0, Some(4000.0), record(&log, "level-1"))
        .unwrap();

    host.run_until_idle();

    assert_eq!(*log.borrow(), vec!["level-2", "level-1"]);
    assert_eq!(executor.stats().executed, 2);
    assert!(executor.is_idle());
}

#[test]
fn test_ineligible_head_blocks_queue() {
    // The higher priority task starts later; the eligible low priority task
    // behind it waits until the head has run.
    let (host, executor) = create_executor();
    let log = Rc::new(RefCell::new(Vec::new()));

    executor
        .schedule_callback(Priority::Low, 200.0, Some(5000.0), record(&log, "low"))
        .unwrap();
    executor
        .schedule_callback(Priority::Normal, 300.0, Some(4000.0), record(&log, "normal"))
        .unwrap();

    host.advance(250.0);
    assert!(log.borrow().is_empty());

    host.advance(50.0);
    assert_eq!(*log.borrow(), vec!["normal"]);

    host.run_until_idle();
    assert_eq!(*log.borrow(), vec!["normal", "low"]);
    assert_eq!(host.now(), 310.0);
}

#[test]
fn test_task_queue_remove_by_id() {
    let (_host, executor) = create_executor();
    let keep = executor
        .schedule_callback(Priority::Normal, 10.0, None, || TaskStatus::Complete)
        .unwrap();
    let dropped = executor
        .schedule_callback(Priority::Normal, 20.0, None, || TaskStatus::Complete)
        .unwrap();

    assert!(executor.cancel_task(dropped));
    assert!(!executor.cancel_task(dropped));

    let ids: Vec<_> = executor.pending().iter().map(|meta| meta.id).collect();
    assert_eq!(ids, vec![keep]);
}

#[test]
fn test_bare_task_queue_pop_order() {
    let (_host, executor) = create_executor();
    // Borrow metadata from a scheduled task to build standalone entries.
    executor
        .schedule_callback(Priority::Low, 0.0, None, || TaskStatus::Complete)
        .unwrap();
    let template = executor.pending()[0];

    let queue = TaskQueue::new();
    let mut low = template;
    low.priority = Priority::Low;
    let mut high = template;
    high.priority = Priority::Immediate;

    queue.push(Task::new(low, Box::new(|| TaskStatus::Complete)));
    queue.push(Task::new(high, Box::new(|| TaskStatus::Complete)));

    assert_eq!(queue.len(), 2);
    assert_eq!(queue.pop().map(|task| task.meta.priority), Some(Priority::Immediate));
    assert_eq!(queue.pop().map(|task| task.meta.priority), Some(Priority::Low));
    assert!(queue.is_empty());
}
