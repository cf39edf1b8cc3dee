use futures::executor::{LocalPool, LocalSpawner};

use super::{AsapScheduler, AsyncScheduler};

/// A single-threaded executor hosting the deferred schedulers.
///
/// Schedulers only queue tasks on the loop; nothing runs until the loop is
/// driven with [`EventLoop::run`] or [`EventLoop::run_until_stalled`].
#[derive(Default)]
pub struct EventLoop {
  pool: LocalPool,
}

impl EventLoop {
  pub fn new() -> Self { Self::default() }

  pub fn spawner(&self) -> LocalSpawner { self.pool.spawner() }

  pub fn asap_scheduler(&self) -> AsapScheduler { AsapScheduler::new(self.spawner()) }

  pub fn async_scheduler(&self) -> AsyncScheduler { AsyncScheduler::new(self.spawner()) }

  /// Runs until every spawned task, timers included, has completed.
  pub fn run(&mut self) { self.pool.run() }

  /// Runs every task that can make progress without waiting.
  pub fn run_until_stalled(&mut self) { self.pool.run_until_stalled() }
}
