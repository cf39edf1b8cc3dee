use crate::{observable::Observable, observer::Observer};

/// The kind of a [`Notification`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NotificationKind {
  Next,
  Error,
  Complete,
}

/// A reified `next`/`error`/`complete` event.
///
/// Notifications are what replaying and virtual-time recording pass around:
/// they can be stored, compared and later replayed onto any observer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notification<Item, Err> {
  Next(Item),
  Error(Err),
  Complete,
}

impl<Item, Err> Notification<Item, Err> {
  pub fn kind(&self) -> NotificationKind {
    match self {
      Notification::Next(_) => NotificationKind::Next,
      Notification::Error(_) => NotificationKind::Error,
      Notification::Complete => NotificationKind::Complete,
    }
  }

  #[inline]
  pub fn is_terminal(&self) -> bool { !matches!(self, Notification::Next(_)) }

  pub fn value(&self) -> Option<&Item> {
    match self {
      Notification::Next(v) => Some(v),
      _ => None,
    }
  }

  pub fn err(&self) -> Option<&Err> {
    match self {
      Notification::Error(e) => Some(e),
      _ => None,
    }
  }

  /// Delivers this notification to `observer`.
  pub fn observe<O>(self, observer: &mut O)
  where
    O: Observer<Item, Err> + ?Sized,
  {
    match self {
      Notification::Next(v) => observer.next(v),
      Notification::Error(e) => observer.error(e),
      Notification::Complete => observer.complete(),
    }
  }

  /// Dispatches to the callback matching this notification's kind.
  pub fn accept<R>(
    self, next: impl FnOnce(Item) -> R, error: impl FnOnce(Err) -> R, complete: impl FnOnce() -> R,
  ) -> R {
    match self {
      Notification::Next(v) => next(v),
      Notification::Error(e) => error(e),
      Notification::Complete => complete(),
    }
  }
}

impl<Item, Err> Notification<Item, Err>
where
  Item: Clone + 'static,
  Err: Clone + 'static,
{
  /// An observable that emits this notification to each subscriber. A `Next`
  /// is followed by a completion.
  pub fn into_observable(self) -> Observable<Item, Err> {
    Observable::new(move |subscriber| match self.clone() {
      Notification::Next(v) => {
        subscriber.next(v);
        subscriber.complete();
      }
      Notification::Error(e) => subscriber.error(e),
      Notification::Complete => subscriber.complete(),
    })
  }
}
