use std::{rc::Rc, time::Instant};

use futures::{executor::LocalSpawner, task::LocalSpawnExt};

use super::{timer::spawn_delayed, ScheduledWork, Scheduler, SchedulerCore};

/// Defers work to the next turn of a local executor.
///
/// The first work queued while the scheduler is idle spawns exactly one flush
/// task; work queued before that task runs just joins the queue and is
/// drained by the same flush. Delayed work waits on a timer first and then
/// joins the queue.
#[derive(Clone)]
pub struct AsapScheduler(Rc<AsapInner>);

struct AsapInner {
  core: SchedulerCore,
  spawner: LocalSpawner,
  origin: Instant,
}

impl AsapScheduler {
  pub fn new(spawner: LocalSpawner) -> Self {
    AsapScheduler(Rc::new(AsapInner {
      core: SchedulerCore::default(),
      spawner,
      origin: Instant::now(),
    }))
  }

  fn push_now(&self, work: ScheduledWork) {
    self.0.core.queue.push(self.now(), work);
    self.request_flush();
  }

  fn request_flush(&self) {
    if !self.0.core.mark_scheduled() {
      return;
    }
    let scheduler = self.clone();
    if let Err(err) = self.0.spawner.spawn_local(async move { scheduler.flush() }) {
      self.0.core.clear_scheduled();
      tracing::warn!(%err, "executor is gone, asap flush not scheduled");
    }
  }
}

impl Scheduler for AsapScheduler {
  fn now(&self) -> u64 { u64::try_from(self.0.origin.elapsed().as_millis()).unwrap_or(u64::MAX) }

  fn enqueue(&self, work: ScheduledWork) {
    if work.delay() == 0 {
      self.push_now(work);
      return;
    }
    let scheduler = self.clone();
    let (delay, token) = (work.delay(), work.token().clone());
    spawn_delayed(&self.0.spawner, delay, &token, move || scheduler.push_now(work));
  }

  fn flush(&self) {
    self.0.core.clear_scheduled();
    let Some(_guard) = self.0.core.begin_flush() else { return };
    while let Some((due, work)) = self.0.core.queue.pop_due(u64::MAX) {
      tracing::trace!(scheduler = "asap", due, "execute action");
      work.execute();
    }
  }
}
