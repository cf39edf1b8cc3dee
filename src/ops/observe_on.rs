use crate::{
  notification::Notification,
  observable::Observable,
  observer::Observer,
  ops::Operator,
  scheduler::{Action, SchedulerExt},
  subscriber::Subscriber,
};

/// Re-emits all notifications from the source Observable on the given
/// scheduler, each as its own action.
#[derive(Clone)]
pub struct ObserveOnOp<S> {
  scheduler: S,
}

pub struct ObserveOnObserver<S, Item, Err> {
  scheduler: S,
  destination: Subscriber<Item, Err>,
}

impl<S, Item, Err> ObserveOnObserver<S, Item, Err>
where
  S: SchedulerExt,
  Item: 'static,
  Err: 'static,
{
  fn schedule(&self, notification: Notification<Item, Err>) {
    let destination = self.destination.clone();
    let handle = self.scheduler.schedule(
      move |_: &Action<Notification<Item, Err>>, notification| {
        notification.observe(&mut destination.clone())
      },
      0,
      notification,
    );
    self.destination.add(handle);
  }
}

impl<S, Item, Err> Operator<Item, Item, Err> for ObserveOnOp<S>
where
  S: SchedulerExt,
  Item: 'static,
  Err: 'static,
{
  fn call(&self, destination: Subscriber<Item, Err>) -> Subscriber<Item, Err> {
    let observer =
      ObserveOnObserver { scheduler: self.scheduler.clone(), destination: destination.clone() };
    Subscriber::chained(&destination, observer)
  }
}

impl<S, Item, Err> Observer<Item, Err> for ObserveOnObserver<S, Item, Err>
where
  S: SchedulerExt,
  Item: 'static,
  Err: 'static,
{
  fn next(&mut self, value: Item) { self.schedule(Notification::Next(value)) }

  fn error(&mut self, err: Err) { self.schedule(Notification::Error(err)) }

  fn complete(&mut self) { self.schedule(Notification::Complete) }
}

impl<Item: 'static, Err: 'static> Observable<Item, Err> {
  pub fn observe_on<S: SchedulerExt>(&self, scheduler: S) -> Observable<Item, Err> {
    self.lift(ObserveOnOp { scheduler })
  }
}
