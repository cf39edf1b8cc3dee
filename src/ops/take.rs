use crate::{
  observable::Observable, observer::Observer, ops::Operator, subscriber::Subscriber,
};

/// Emits only the first `count` values emitted by the source Observable.
///
/// If the source emits fewer than `count` values then all of its values are
/// emitted. After that, it completes, regardless if the source completes, and
/// the source is unsubscribed.
#[derive(Clone)]
pub struct TakeOp {
  count: usize,
}

pub struct TakeObserver<Item, Err> {
  remaining: usize,
  destination: Subscriber<Item, Err>,
}

impl<Item: 'static, Err: 'static> Operator<Item, Item, Err> for TakeOp {
  fn call(&self, destination: Subscriber<Item, Err>) -> Subscriber<Item, Err> {
    if self.count == 0 {
      destination.complete();
    }
    let observer = TakeObserver { remaining: self.count, destination: destination.clone() };
    Subscriber::chained(&destination, observer)
  }
}

impl<Item, Err> Observer<Item, Err> for TakeObserver<Item, Err> {
  fn next(&mut self, value: Item) {
    if self.remaining == 0 {
      return;
    }
    self.remaining -= 1;
    self.destination.next(value);
    if self.remaining == 0 {
      self.destination.complete();
    }
  }

  fn error(&mut self, err: Err) { self.destination.error(err) }

  fn complete(&mut self) { self.destination.complete() }
}

impl<Item: 'static, Err: 'static> Observable<Item, Err> {
  pub fn take(&self, count: usize) -> Observable<Item, Err> { self.lift(TakeOp { count }) }
}
