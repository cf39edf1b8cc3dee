use std::{rc::Rc, time::Instant};

use futures::executor::LocalSpawner;

use super::{timer::spawn_delayed, ScheduledWork, Scheduler, SchedulerCore};

/// Runs every action on its own timer task of a local executor.
///
/// Cancelling an action aborts its timer. When a timer fires, its work joins
/// the queue and the queue is flushed.
#[derive(Clone)]
pub struct AsyncScheduler(Rc<AsyncInner>);

struct AsyncInner {
  core: SchedulerCore,
  spawner: LocalSpawner,
  origin: Instant,
}

impl AsyncScheduler {
  pub fn new(spawner: LocalSpawner) -> Self {
    AsyncScheduler(Rc::new(AsyncInner {
      core: SchedulerCore::default(),
      spawner,
      origin: Instant::now(),
    }))
  }
}

impl Scheduler for AsyncScheduler {
  fn now(&self) -> u64 { u64::try_from(self.0.origin.elapsed().as_millis()).unwrap_or(u64::MAX) }

  fn enqueue(&self, work: ScheduledWork) {
    let scheduler = self.clone();
    let (delay, token) = (work.delay(), work.token().clone());
    spawn_delayed(&self.0.spawner, delay, &token, move || {
      scheduler.0.core.queue.push(scheduler.now(), work);
      scheduler.flush();
    });
  }

  fn flush(&self) {
    let Some(_guard) = self.0.core.begin_flush() else { return };
    while let Some((due, work)) = self.0.core.queue.pop_due(u64::MAX) {
      tracing::trace!(scheduler = "async", due, "execute action");
      work.execute();
    }
  }
}

#[cfg(test)]
mod test {
  use std::{cell::RefCell, rc::Rc};

  use futures::executor::LocalPool;

  use crate::prelude::*;

  #[test]
  fn fires_in_delay_order() {
    let mut pool = LocalPool::new();
    let scheduler = AsyncScheduler::new(pool.spawner());
    let log = Rc::new(RefCell::new(vec![]));
    for delay in [30, 10, 20] {
      let c_log = log.clone();
      scheduler.schedule(move |_, d: u64| c_log.borrow_mut().push(d), delay, delay);
    }
    assert!(log.borrow().is_empty());

    pool.run();
    assert_eq!(*log.borrow(), vec![10, 20, 30]);
  }

  #[test]
  fn cancel_aborts_timer() {
    let mut pool = LocalPool::new();
    let scheduler = AsyncScheduler::new(pool.spawner());
    let hit = Rc::new(RefCell::new(false));
    let c_hit = hit.clone();
    let handle = scheduler.schedule(move |_, _: ()| *c_hit.borrow_mut() = true, 10, ());
    handle.unsubscribe();
    pool.run();
    assert!(!*hit.borrow());
  }

  #[test]
  fn interval_on_async_scheduler() {
    let mut pool = LocalPool::new();
    let scheduler = AsyncScheduler::new(pool.spawner());
    let seen = Rc::new(RefCell::new(vec![]));
    let c_seen = seen.clone();
    observable::interval(1, scheduler)
      .take(3)
      .subscribe(move |v| c_seen.borrow_mut().push(v));
    pool.run();
    assert_eq!(*seen.borrow(), vec![0, 1, 2]);
  }
}
