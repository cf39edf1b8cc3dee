use crate::{
  observable::Observable, observer::Observer, ops::Operator, subscriber::Subscriber,
};

/// Emit only those items from an Observable that pass a predicate test.
#[derive(Clone)]
pub struct FilterOp<F> {
  filter: F,
}

pub struct FilterObserver<F, Item, Err> {
  filter: F,
  destination: Subscriber<Item, Err>,
}

impl<Item, Err, F> Operator<Item, Item, Err> for FilterOp<F>
where
  Item: 'static,
  Err: 'static,
  F: FnMut(&Item) -> bool + Clone + 'static,
{
  fn call(&self, destination: Subscriber<Item, Err>) -> Subscriber<Item, Err> {
    let observer = FilterObserver { filter: self.filter.clone(), destination: destination.clone() };
    Subscriber::chained(&destination, observer)
  }
}

impl<Item, Err, F> Observer<Item, Err> for FilterObserver<F, Item, Err>
where
  F: FnMut(&Item) -> bool,
{
  fn next(&mut self, value: Item) {
    if (self.filter)(&value) {
      self.destination.next(value)
    }
  }

  fn error(&mut self, err: Err) { self.destination.error(err) }

  fn complete(&mut self) { self.destination.complete() }
}

impl<Item: 'static, Err: 'static> Observable<Item, Err> {
  pub fn filter(&self, filter: impl FnMut(&Item) -> bool + Clone + 'static) -> Observable<Item, Err> {
    self.lift(FilterOp { filter })
  }
}
