use cadence_core::UpdateQueue;

fn ring_closes(queue: &UpdateQueue<&'static str>) -> bool {
    let Some(head) = queue.head() else {
        return queue.is_empty() && queue.len() == 0;
    };
    let mut cursor = head;
    for step in 1..=queue.len() {
        match queue.next(cursor) {
            Some(next) => cursor = next,
            None => return false,
        }
        if cursor == head {
            return step == queue.len();
        }
    }
    false
}

#[test]
fn test_empty_queue() {
    let mut queue: UpdateQueue<&'static str> = UpdateQueue::new();
    assert!(queue.is_empty());
    assert!(queue.head().is_none());
    assert!(queue.peek_most_urgent().is_none());
    assert!(queue.drain_in_order().is_empty());
}

#[test]
fn test_singleton_ring_points_at_itself() {
    let mut queue = UpdateQueue::new();
    let key = queue.enqueue("only", 10.0);

    assert_eq!(queue.head(), Some(key));
    assert_eq!(queue.next(key), Some(key));
    assert!(ring_closes(&queue));
}

#[test]
fn test_ring_stays_closed_as_it_grows() {
    let mut queue = UpdateQueue::new();
    for (i, name) in ["a", "b", "c", "d", "e"].into_iter().enumerate() {
        queue.enqueue(name, i as f64);
        assert_eq!(queue.len(), i + 1);
        assert!(ring_closes(&queue));
    }
}

#[test]
fn test_drain_is_fifo_regardless_of_expiration() {
    let mut queue = UpdateQueue::new();
    queue.enqueue("late", 300.0);
    queue.enqueue("early", 10.0);
    queue.enqueue("middle", 100.0);
    queue.enqueue("earliest", 1.0);

    let drained: Vec<_> = queue.drain_in_order().into_iter().map(|u| u.action).collect();
    assert_eq!(drained, vec!["late", "early", "middle", "earliest"]);
    assert!(queue.is_empty());
    assert!(queue.head().is_none());
}

#[test]
fn test_peek_most_urgent_is_minimum() {
    let mut queue = UpdateQueue::new();
    queue.enqueue("b", 40.0);
    queue.enqueue("a", 15.0);
    queue.enqueue("c", 90.0);

    let urgent = queue.peek_most_urgent().unwrap();
    assert_eq!(urgent.action, "a");
    assert!(queue.iter().all(|u| urgent.expiration_time <= u.expiration_time));
}

#[test]
fn test_peek_ties_go_to_oldest() {
    let mut queue = UpdateQueue::new();
    queue.enqueue("first", 20.0);
    queue.enqueue("second", 5.0);
    queue.enqueue("third", 5.0);

    assert_eq!(queue.peek_most_urgent().map(|u| u.action), Some("second"));
}

#[test]
fn test_queue_reusable_after_drain() {
    let mut queue = UpdateQueue::new();
    queue.enqueue("x", 1.0);
    queue.enqueue("y", 2.0);
    queue.drain_in_order();

    queue.enqueue("z", 3.0);
    queue.enqueue("w", 4.0);
    assert!(ring_closes(&queue));
    let order: Vec<_> = queue.iter().map(|u| u.action).collect();
    assert_eq!(order, vec!["z", "w"]);
}
