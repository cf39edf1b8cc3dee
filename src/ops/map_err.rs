use crate::{
  observable::{Observable, Subscribable},
  observer::Observer,
  subscriber::Subscriber,
};

/// Converts the error type of a stream.
///
/// Infallible streams can take on any error type with
/// `.map_err(|e| match e {})`.
pub struct MapErrObserver<F, Item, Err> {
  func: F,
  destination: Subscriber<Item, Err>,
}

impl<Item, Err, ErrOut, F> Observer<Item, Err> for MapErrObserver<F, Item, ErrOut>
where
  F: FnMut(Err) -> ErrOut,
{
  fn next(&mut self, value: Item) { self.destination.next(value) }

  fn error(&mut self, err: Err) { self.destination.error((self.func)(err)) }

  fn complete(&mut self) { self.destination.complete() }
}

impl<Item: 'static, Err: 'static> Observable<Item, Err> {
  pub fn map_err<ErrOut: 'static>(
    &self, func: impl FnMut(Err) -> ErrOut + Clone + 'static,
  ) -> Observable<Item, ErrOut> {
    let source = self.clone();
    Observable::new(move |destination: Subscriber<Item, ErrOut>| {
      let observer = MapErrObserver { func: func.clone(), destination: destination.clone() };
      source.subscribe_with(Subscriber::chained(&destination, observer));
    })
  }
}
