use std::cell::Cell;
use std::rc::Rc;

use deferred_task::{Completion, DeferredTask, MicrotaskQueue, Settled};

#[test]
fn catch_recovers_from_a_rejection() {
  let mut queue = MicrotaskQueue::new();
  let task = DeferredTask::<i32, String>::rejected(&mut queue, "boom".to_string());
  let recovered = task.catch(&mut queue, |error| Completion::Value(error.len() as i32));
  queue.perform_microtask_checkpoint();
  assert_eq!(recovered.settled(), Some(Settled::Fulfilled(4)));
}

#[test]
fn catch_passes_a_fulfillment_through_unchanged() {
  let mut queue = MicrotaskQueue::new();
  let task = DeferredTask::<i32, String>::fulfilled(5);
  let derived = task.catch(&mut queue, |_error| Completion::Value(0));
  queue.perform_microtask_checkpoint();
  assert_eq!(derived.settled(), Some(Settled::Fulfilled(5)));
}

#[test]
fn then_passes_a_rejection_through_unchanged() {
  let mut queue = MicrotaskQueue::new();
  let task = DeferredTask::<i32, String>::rejected(&mut queue, "boom".to_string());
  let derived = task.then(&mut queue, |n| Completion::Value(n + 1));
  queue.perform_microtask_checkpoint();
  assert_eq!(derived.settled(), Some(Settled::Rejected("boom".to_string())));
}

#[test]
fn catch_can_rethrow_and_reject_the_derived_task() {
  let mut queue = MicrotaskQueue::new();
  let task = DeferredTask::<i32, String>::rejected(&mut queue, "boom".to_string());
  let derived = task.catch(&mut queue, |error| Completion::Throw(format!("wrapped: {error}")));
  queue.perform_microtask_checkpoint();
  assert_eq!(
    derived.settled(),
    Some(Settled::Rejected("wrapped: boom".to_string()))
  );
}

#[test]
fn then_or_else_routes_each_outcome_to_its_handler() {
  let mut queue = MicrotaskQueue::new();

  let fulfilled = DeferredTask::<i32, String>::fulfilled(2);
  let doubled = fulfilled.then_or_else(
    &mut queue,
    |n| Completion::Value(n * 2),
    |_error| Completion::Value(-1),
  );

  let rejected = DeferredTask::<i32, String>::rejected(&mut queue, "boom".to_string());
  let defaulted = rejected.then_or_else(
    &mut queue,
    |n| Completion::Value(n * 2),
    |_error| Completion::Value(-1),
  );

  queue.perform_microtask_checkpoint();
  assert_eq!(doubled.settled(), Some(Settled::Fulfilled(4)));
  assert_eq!(defaulted.settled(), Some(Settled::Fulfilled(-1)));
}

#[test]
fn finally_runs_exactly_once_on_fulfillment_and_passes_the_value_through() {
  let mut queue = MicrotaskQueue::new();
  let runs = Rc::new(Cell::new(0u32));

  let task = DeferredTask::<i32, String>::fulfilled(5);
  let derived = {
    let runs = Rc::clone(&runs);
    task.finally(&mut queue, move || {
      runs.set(runs.get() + 1);
      Ok(())
    })
  };
  queue.perform_microtask_checkpoint();

  assert_eq!(runs.get(), 1);
  assert_eq!(derived.settled(), Some(Settled::Fulfilled(5)));
}

#[test]
fn finally_runs_exactly_once_on_rejection_and_passes_the_error_through() {
  let mut queue = MicrotaskQueue::new();
  let runs = Rc::new(Cell::new(0u32));

  let task = DeferredTask::<i32, String>::rejected(&mut queue, "boom".to_string());
  let derived = {
    let runs = Rc::clone(&runs);
    task.finally(&mut queue, move || {
      runs.set(runs.get() + 1);
      Ok(())
    })
  };
  queue.perform_microtask_checkpoint();

  assert_eq!(runs.get(), 1);
  assert_eq!(derived.settled(), Some(Settled::Rejected("boom".to_string())));
}

#[test]
fn finally_error_supersedes_the_original_outcome() {
  let mut queue = MicrotaskQueue::new();

  let fulfilled = DeferredTask::<i32, String>::fulfilled(5);
  let from_fulfilled =
    fulfilled.finally(&mut queue, || Err("cleanup failed".to_string()));

  let rejected = DeferredTask::<i32, String>::rejected(&mut queue, "boom".to_string());
  let from_rejected = rejected.finally(&mut queue, || Err("cleanup failed".to_string()));

  queue.perform_microtask_checkpoint();
  assert_eq!(
    from_fulfilled.settled(),
    Some(Settled::Rejected("cleanup failed".to_string()))
  );
  assert_eq!(
    from_rejected.settled(),
    Some(Settled::Rejected("cleanup failed".to_string()))
  );
}
