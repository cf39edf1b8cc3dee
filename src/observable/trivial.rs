use crate::observable::Observable;

/// Creates an observable that produces no values and completes immediately.
pub fn empty<Item: 'static>() -> Observable<Item> { Observable::new(|subscriber| subscriber.complete()) }

/// Creates an observable that never emits anything, not even a terminal.
pub fn never<Item: 'static>() -> Observable<Item> { Observable::new(|_| {}) }

/// Creates an observable that emits no items and terminates with `err`.
pub fn throw_err<Item: 'static, Err: Clone + 'static>(err: Err) -> Observable<Item, Err> {
  Observable::new(move |subscriber| subscriber.error(err.clone()))
}
