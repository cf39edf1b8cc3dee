use std::{cell::Cell, rc::Rc};

use super::{ScheduledWork, Scheduler, SchedulerCore};

/// A scheduler whose clock is a frame counter.
///
/// Nothing runs on its own: work waits in the queue until [`Scheduler::flush`]
/// or one of the `advance_*` methods drives the clock forward. Work is
/// executed in due-frame order, work due on the same frame in the order it
/// was scheduled, and `now()` reports the frame of the work being executed.
///
/// `flush` never runs work due after `max_frames`, which bounds runaway
/// recursive scheduling.
#[derive(Clone)]
pub struct VirtualTimeScheduler(Rc<VirtualInner>);

struct VirtualInner {
  core: SchedulerCore,
  frame: Cell<u64>,
  max_frames: u64,
}

impl VirtualTimeScheduler {
  pub fn new() -> Self { Self::with_max_frames(u64::MAX) }

  pub fn with_max_frames(max_frames: u64) -> Self {
    VirtualTimeScheduler(Rc::new(VirtualInner {
      core: SchedulerCore::default(),
      frame: Cell::new(0),
      max_frames,
    }))
  }

  #[inline]
  pub fn max_frames(&self) -> u64 { self.0.max_frames }

  /// Number of executions still queued.
  pub fn pending(&self) -> usize { self.0.core.queue.len() }

  pub fn is_empty(&self) -> bool { self.0.core.queue.is_empty() }

  /// Runs everything due up to `frame` and moves the clock there.
  pub fn advance_to(&self, frame: u64) {
    let Some(_guard) = self.0.core.begin_flush() else { return };
    self.run_until(frame.min(self.0.max_frames));
    if self.0.frame.get() < frame {
      tracing::trace!(from = self.0.frame.get(), to = frame, "advance virtual clock");
      self.0.frame.set(frame);
    }
  }

  pub fn advance_by(&self, frames: u64) { self.advance_to(self.0.frame.get().saturating_add(frames)) }

  fn run_until(&self, limit: u64) {
    while let Some((due, work)) = self.0.core.queue.pop_due(limit) {
      self.0.frame.set(due);
      tracing::trace!(scheduler = "virtual", frame = due, "execute action");
      work.execute();
    }
  }
}

impl Default for VirtualTimeScheduler {
  fn default() -> Self { Self::new() }
}

impl Scheduler for VirtualTimeScheduler {
  #[inline]
  fn now(&self) -> u64 { self.0.frame.get() }

  fn enqueue(&self, work: ScheduledWork) {
    let due = self.0.frame.get().saturating_add(work.delay());
    self.0.core.queue.push(due, work);
  }

  fn flush(&self) {
    let Some(_guard) = self.0.core.begin_flush() else { return };
    self.run_until(self.0.max_frames);
    if let Some(due) = self.0.core.queue.peek_due() {
      tracing::debug!(
        next_due = due,
        max_frames = self.0.max_frames,
        "virtual flush stopped at max frames"
      );
    }
  }
}
