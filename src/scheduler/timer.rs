use std::{
  future::Future,
  pin::Pin,
  task::{Context, Poll},
};

use futures::{
  future::{abortable, FutureExt},
  task::{LocalSpawn, LocalSpawnExt},
};
use futures_time::task::Sleep;
use pin_project_lite::pin_project;

use crate::subscription::Subscription;

pin_project! {
  /// Runs a callback once its delay has elapsed. A zero delay runs it on the
  /// first poll.
  pub(crate) struct Delay<F> {
    #[pin]
    sleep: Option<Sleep>,
    callback: Option<F>,
  }
}

impl<F: FnOnce()> Delay<F> {
  pub(crate) fn new(delay_ms: u64, callback: F) -> Self {
    let sleep = (delay_ms > 0)
      .then(|| futures_time::task::sleep(std::time::Duration::from_millis(delay_ms).into()));
    Delay { sleep, callback: Some(callback) }
  }
}

impl<F: FnOnce()> Future for Delay<F> {
  type Output = ();

  fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
    let this = self.project();
    if let Some(sleep) = this.sleep.as_pin_mut() {
      if sleep.poll(cx).is_pending() {
        return Poll::Pending;
      }
    }
    if let Some(callback) = this.callback.take() {
      callback();
    }
    Poll::Ready(())
  }
}

/// Spawns `callback` to run after `delay_ms` on `spawner`. Closing `token`
/// aborts the pending task.
pub(crate) fn spawn_delayed(
  spawner: &impl LocalSpawn, delay_ms: u64, token: &Subscription, callback: impl FnOnce() + 'static,
) {
  let (task, handle) = abortable(Delay::new(delay_ms, callback));
  token.add_fn(move || handle.abort());
  if let Err(err) = spawner.spawn_local(task.map(|_| ())) {
    tracing::warn!(%err, "executor is gone, scheduled work dropped");
  }
}
