use crate::{
  observable::Observable,
  scheduler::{Action, SchedulerExt},
};

/// Creates an observable which will fire every `period` ticks of
/// `scheduler`, emitting an increasing sequence number starting at 0.
pub fn interval<S: SchedulerExt>(period: u64, scheduler: S) -> Observable<usize> {
  Observable::new(move |subscriber| {
    let c_subscriber = subscriber.clone();
    let handle = scheduler.schedule(
      move |action: &Action<usize>, seq| {
        if c_subscriber.is_stopped() {
          return;
        }
        c_subscriber.next(seq);
        action.schedule(seq + 1, period);
      },
      period,
      0,
    );
    subscriber.add(handle);
  })
}
