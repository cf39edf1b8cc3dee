use std::{rc::Rc, time::Instant};

#[cfg(feature = "futures-scheduler")]
use futures::executor::LocalSpawner;

use super::{ScheduledWork, Scheduler, SchedulerCore};

/// Runs work synchronously on the calling thread, trampolined.
///
/// Scheduling outside a flush runs the work immediately. Scheduling from
/// inside running work appends to the queue and returns; the outer flush
/// picks it up once the current work is done, so recursion never grows the
/// stack.
///
/// A flush only runs work that is due, it never waits. Delayed work goes to a
/// timer on the local executor when the scheduler was built with
/// [`QueueScheduler::with_spawner`]; otherwise it stays queued and runs on the
/// first flush after it became due.
#[derive(Clone)]
pub struct QueueScheduler(Rc<QueueInner>);

struct QueueInner {
  core: SchedulerCore,
  origin: Instant,
  #[cfg(feature = "futures-scheduler")]
  spawner: Option<LocalSpawner>,
}

impl QueueScheduler {
  pub fn new() -> Self {
    QueueScheduler(Rc::new(QueueInner {
      core: SchedulerCore::default(),
      origin: Instant::now(),
      #[cfg(feature = "futures-scheduler")]
      spawner: None,
    }))
  }

  /// A queue scheduler whose delayed work waits on timers of `spawner`'s
  /// executor and is flushed when they fire.
  #[cfg(feature = "futures-scheduler")]
  pub fn with_spawner(spawner: LocalSpawner) -> Self {
    QueueScheduler(Rc::new(QueueInner {
      core: SchedulerCore::default(),
      origin: Instant::now(),
      spawner: Some(spawner),
    }))
  }

  /// Number of executions waiting in the queue.
  pub fn len(&self) -> usize { self.0.core.queue.len() }

  pub fn is_empty(&self) -> bool { self.0.core.queue.is_empty() }

  fn push_due(&self, due: u64, work: ScheduledWork) {
    self.0.core.queue.push(due, work);
    self.flush();
  }

  /// Hands delayed work to a timer of the executor, or gives it back when
  /// it has to go into the queue.
  #[cfg(feature = "futures-scheduler")]
  fn start_timer(&self, work: ScheduledWork) -> Option<ScheduledWork> {
    let Some(spawner) = self.0.spawner.as_ref().filter(|_| work.delay() > 0) else {
      return Some(work);
    };
    let scheduler = self.clone();
    let (delay, token) = (work.delay(), work.token().clone());
    super::timer::spawn_delayed(spawner, delay, &token, move || {
      scheduler.push_due(scheduler.now(), work)
    });
    None
  }

  #[cfg(not(feature = "futures-scheduler"))]
  fn start_timer(&self, work: ScheduledWork) -> Option<ScheduledWork> { Some(work) }
}

impl Default for QueueScheduler {
  fn default() -> Self { Self::new() }
}

impl Scheduler for QueueScheduler {
  fn now(&self) -> u64 { u64::try_from(self.0.origin.elapsed().as_millis()).unwrap_or(u64::MAX) }

  fn enqueue(&self, work: ScheduledWork) {
    let Some(work) = self.start_timer(work) else { return };
    let due = self.now().saturating_add(work.delay());
    self.push_due(due, work);
  }

  fn flush(&self) {
    let Some(_guard) = self.0.core.begin_flush() else { return };
    while let Some((due, work)) = self.0.core.queue.pop_due(self.now()) {
      tracing::trace!(scheduler = "queue", due, "execute action");
      work.execute();
    }
  }
}

#[cfg(test)]
mod test {
  use std::{
    cell::RefCell,
    panic::{catch_unwind, AssertUnwindSafe},
    rc::Rc,
    time::{Duration, Instant},
  };

  use crate::prelude::*;

  #[test]
  fn runs_immediately() {
    let scheduler = QueueScheduler::new();
    let hit = Rc::new(RefCell::new(false));
    let c_hit = hit.clone();
    scheduler.schedule(move |_, _: ()| *c_hit.borrow_mut() = true, 0, ());
    assert!(*hit.borrow());
  }

  #[test]
  fn nested_work_is_trampolined() {
    let scheduler = QueueScheduler::new();
    let log = Rc::new(RefCell::new(vec![]));
    let c_log = log.clone();
    let c_scheduler = scheduler.clone();
    scheduler.schedule(
      move |_, _: ()| {
        c_log.borrow_mut().push("outer start");
        let c_log2 = c_log.clone();
        c_scheduler.schedule(move |_, _: ()| c_log2.borrow_mut().push("inner"), 0, ());
        c_log.borrow_mut().push("outer end");
      },
      0,
      (),
    );
    assert_eq!(*log.borrow(), vec!["outer start", "outer end", "inner"]);
  }

  #[test]
  fn delayed_work_runs_on_a_later_flush() {
    let scheduler = QueueScheduler::new();
    let log = Rc::new(RefCell::new(vec![]));
    let c_log = log.clone();
    let c_scheduler = scheduler.clone();
    scheduler.schedule(
      move |_, _: ()| {
        for (delay, name) in [(20, "late"), (0, "now"), (5, "soon")] {
          let c_log = c_log.clone();
          c_scheduler.schedule(move |_, _: ()| c_log.borrow_mut().push(name), delay, ());
        }
      },
      0,
      (),
    );
    assert_eq!(*log.borrow(), vec!["now"]);
    assert_eq!(scheduler.len(), 2);

    std::thread::sleep(Duration::from_millis(30));
    scheduler.flush();
    assert_eq!(*log.borrow(), vec!["now", "soon", "late"]);
    assert!(scheduler.is_empty());
  }

  #[test]
  fn delayed_timer_does_not_block_subscribe() {
    let scheduler = QueueScheduler::new();
    let seen = Rc::new(RefCell::new(vec![]));
    let c_seen = seen.clone();
    let started = Instant::now();
    let subscription =
      observable::timer(300, scheduler.clone()).subscribe(move |v| c_seen.borrow_mut().push(v));

    assert!(started.elapsed() < Duration::from_millis(100));
    assert!(seen.borrow().is_empty());
    subscription.unsubscribe();
    assert!(scheduler.is_empty());
  }

  #[cfg(feature = "futures-scheduler")]
  #[test]
  fn delayed_work_fires_on_the_executor() {
    let mut pool = futures::executor::LocalPool::new();
    let scheduler = QueueScheduler::with_spawner(pool.spawner());
    let seen = Rc::new(RefCell::new(vec![]));
    let c_seen = seen.clone();
    observable::interval(1, scheduler)
      .take(3)
      .subscribe(move |v| c_seen.borrow_mut().push(v));
    assert!(seen.borrow().is_empty());

    pool.run();
    assert_eq!(*seen.borrow(), vec![0, 1, 2]);
  }
  #[test]
  fn recursive_action_does_not_grow_stack() {
    let scheduler = QueueScheduler::new();
    let count = Rc::new(RefCell::new(0));
    let c_count = count.clone();
    scheduler.schedule(
      move |action: &Action<u32>, n| {
        *c_count.borrow_mut() += 1;
        if n < 100_000 {
          action.schedule(n + 1, 0);
        }
      },
      0,
      0,
    );
    assert_eq!(*count.borrow(), 100_001);
  }

  #[test]
  fn panic_resets_active_flag() {
    let scheduler = QueueScheduler::new();
    let c_scheduler = scheduler.clone();
    let skipped = Rc::new(RefCell::new(false));
    let c_skipped = skipped.clone();
    let result = catch_unwind(AssertUnwindSafe(|| {
      scheduler.schedule(
        move |_, _: ()| {
          let c_skipped = c_skipped.clone();
          c_scheduler.schedule(move |_, _: ()| *c_skipped.borrow_mut() = true, 0, ());
          panic!("action failed");
        },
        0,
        (),
      );
    }));
    assert!(result.is_err());
    assert!(!*skipped.borrow());

    let hit = Rc::new(RefCell::new(false));
    let c_hit = hit.clone();
    scheduler.schedule(move |_, _: ()| *c_hit.borrow_mut() = true, 0, ());
    assert!(*hit.borrow());
  }
}
