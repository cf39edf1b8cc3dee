use crate::{observable::Observable, subscriber::Subscriber};

/// Creates an observable from a subscribe function.
///
/// The function runs once per subscription. Resources it acquires should be
/// attached to the subscriber (`subscriber.subscription().add_fn(..)`) so
/// they are released on unsubscribe or on a terminal notification.
pub fn create<Item: 'static, Err: 'static>(
  subscribe: impl Fn(Subscriber<Item, Err>) + 'static,
) -> Observable<Item, Err> {
  Observable::create(subscribe)
}

impl<Item: 'static, Err: 'static> Observable<Item, Err> {
  #[inline]
  pub fn create(subscribe: impl Fn(Subscriber<Item, Err>) + 'static) -> Self {
    Observable::new(subscribe)
  }
}
