use crate::{
  observable::Observable, observer::Observer, ops::Operator, subscriber::Subscriber,
};

/// Creates a new stream which calls a closure on each element and uses its
/// return as the value.
#[derive(Clone)]
pub struct MapOp<F> {
  func: F,
}

pub struct MapObserver<F, Out, Err> {
  func: F,
  destination: Subscriber<Out, Err>,
}

impl<Item, Out, Err, F> Operator<Item, Out, Err> for MapOp<F>
where
  Item: 'static,
  Out: 'static,
  Err: 'static,
  F: FnMut(Item) -> Out + Clone + 'static,
{
  fn call(&self, destination: Subscriber<Out, Err>) -> Subscriber<Item, Err> {
    let observer = MapObserver { func: self.func.clone(), destination: destination.clone() };
    Subscriber::chained(&destination, observer)
  }
}

impl<Item, Out, Err, F> Observer<Item, Err> for MapObserver<F, Out, Err>
where
  F: FnMut(Item) -> Out,
{
  fn next(&mut self, value: Item) { self.destination.next((self.func)(value)) }

  fn error(&mut self, err: Err) { self.destination.error(err) }

  fn complete(&mut self) { self.destination.complete() }
}

/// Like [`MapOp`], but the projection can fail; its error terminates the
/// stream.
#[derive(Clone)]
pub struct TryMapOp<F> {
  func: F,
}

pub struct TryMapObserver<F, Out, Err> {
  func: F,
  destination: Subscriber<Out, Err>,
}

impl<Item, Out, Err, F> Operator<Item, Out, Err> for TryMapOp<F>
where
  Item: 'static,
  Out: 'static,
  Err: 'static,
  F: FnMut(Item) -> Result<Out, Err> + Clone + 'static,
{
  fn call(&self, destination: Subscriber<Out, Err>) -> Subscriber<Item, Err> {
    let observer = TryMapObserver { func: self.func.clone(), destination: destination.clone() };
    Subscriber::chained(&destination, observer)
  }
}

impl<Item, Out, Err, F> Observer<Item, Err> for TryMapObserver<F, Out, Err>
where
  F: FnMut(Item) -> Result<Out, Err>,
{
  fn next(&mut self, value: Item) {
    match (self.func)(value) {
      Ok(v) => self.destination.next(v),
      Err(err) => self.destination.error(err),
    }
  }

  fn error(&mut self, err: Err) { self.destination.error(err) }

  fn complete(&mut self) { self.destination.complete() }
}

impl<Item: 'static, Err: 'static> Observable<Item, Err> {
  pub fn map<Out: 'static>(
    &self, func: impl FnMut(Item) -> Out + Clone + 'static,
  ) -> Observable<Out, Err> {
    self.lift(MapOp { func })
  }

  pub fn try_map<Out: 'static>(
    &self, func: impl FnMut(Item) -> Result<Out, Err> + Clone + 'static,
  ) -> Observable<Out, Err> {
    self.lift(TryMapOp { func })
  }
}
