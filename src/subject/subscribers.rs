use smallvec::SmallVec;

use crate::subscriber::Subscriber;

/// The observers of a subject, in subscription order.
///
/// Each entry carries an id so it can be removed when its subscription is
/// torn down. Fan-out always works on a snapshot taken with
/// [`Subscribers::snapshot`], so observers added or removed during delivery do
/// not affect the delivery in progress.
pub(crate) struct Subscribers<Item, Err> {
  entries: SmallVec<[(usize, Subscriber<Item, Err>); 2]>,
  next_id: usize,
}

impl<Item, Err> Default for Subscribers<Item, Err> {
  fn default() -> Self { Self { entries: SmallVec::new(), next_id: 0 } }
}

impl<Item, Err> Subscribers<Item, Err> {
  /// Adds a subscriber and returns its id.
  pub(crate) fn add(&mut self, subscriber: Subscriber<Item, Err>) -> usize {
    let id = self.next_id;
    self.next_id += 1;
    self.entries.push((id, subscriber));
    id
  }

  pub(crate) fn remove(&mut self, id: usize) { self.entries.retain(|(i, _)| *i != id); }

  #[inline]
  pub(crate) fn len(&self) -> usize { self.entries.len() }

  pub(crate) fn snapshot(&self) -> Snapshot<Item, Err> {
    self.entries.iter().map(|(_, s)| s.clone()).collect()
  }

  /// Empties the list, handing back its subscribers.
  pub(crate) fn take(&mut self) -> Snapshot<Item, Err> {
    std::mem::take(&mut self.entries)
      .into_iter()
      .map(|(_, s)| s)
      .collect()
  }
}

pub(crate) type Snapshot<Item, Err> = SmallVec<[Subscriber<Item, Err>; 2]>;

/// Delivers `value` to every subscriber of `snapshot`. The value is cloned for
/// all but the last subscriber, which receives it by move.
pub(crate) fn broadcast_value<Item: Clone, Err>(snapshot: Snapshot<Item, Err>, value: Item) {
  let mut iter = snapshot.into_iter().peekable();
  while let Some(subscriber) = iter.next() {
    if iter.peek().is_some() {
      subscriber.next(value.clone());
    } else {
      subscriber.next(value);
      break;
    }
  }
}

pub(crate) fn broadcast_error<Item, Err: Clone>(snapshot: Snapshot<Item, Err>, err: Err) {
  let mut iter = snapshot.into_iter().peekable();
  while let Some(subscriber) = iter.next() {
    if iter.peek().is_some() {
      subscriber.error(err.clone());
    } else {
      subscriber.error(err);
      break;
    }
  }
}

pub(crate) fn broadcast_complete<Item, Err>(snapshot: Snapshot<Item, Err>) {
  for subscriber in snapshot {
    subscriber.complete();
  }
}
