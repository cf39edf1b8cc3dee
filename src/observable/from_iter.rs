use crate::observable::Observable;

/// Creates an observable that emits every item of `iter` and then completes.
///
/// Emission stops early once the subscriber is stopped, so an unbounded
/// iterator is fine behind `take`.
pub fn from_iter<I>(iter: I) -> Observable<I::Item>
where
  I: IntoIterator + Clone + 'static,
  I::Item: 'static,
{
  Observable::new(move |subscriber| {
    for v in iter.clone() {
      if subscriber.is_stopped() {
        return;
      }
      subscriber.next(v);
    }
    subscriber.complete();
  })
}

/// Creates an observable producing a single value.
pub fn of<Item: Clone + 'static>(v: Item) -> Observable<Item> { from_iter(std::iter::once(v)) }
