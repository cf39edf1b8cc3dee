use std::{
  cell::{Cell, RefCell},
  collections::VecDeque,
  rc::Rc,
};

use super::ScheduledWork;

struct Slot {
  seq: u64,
  work: ScheduledWork,
}

#[derive(Default)]
struct QueueState {
  slots: Vec<Option<Slot>>,
  free: Vec<usize>,
  /// `(due, seq, slot)` sorted by due time, then by scheduling order.
  order: VecDeque<(u64, u64, usize)>,
  next_seq: u64,
}

/// Arena of pending work with a sorted index list.
///
/// Entries are addressed by slot index; the index list is kept sorted by
/// `(due, seq)` where `seq` strictly increases with every push, so work due
/// at the same time runs in the order it was scheduled. Closing an entry's
/// token removes it from the queue.
#[derive(Clone, Default)]
pub(crate) struct ActionQueue(Rc<RefCell<QueueState>>);

impl ActionQueue {
  pub(crate) fn push(&self, due: u64, work: ScheduledWork) {
    let token = work.token().clone();
    let (seq, index) = {
      let mut state = self.0.borrow_mut();
      let seq = state.next_seq;
      state.next_seq += 1;
      let slot = Some(Slot { seq, work });
      let index = match state.free.pop() {
        Some(index) => {
          state.slots[index] = slot;
          index
        }
        None => {
          state.slots.push(slot);
          state.slots.len() - 1
        }
      };
      order_insert(&mut state.order, (due, seq, index));
      (seq, index)
    };

    let weak = Rc::downgrade(&self.0);
    token.add_fn(move || {
      let Some(state) = weak.upgrade() else { return };
      // A busy queue keeps the entry; it is skipped when popped.
      let removed = match state.try_borrow_mut() {
        Ok(mut state) => state.cancel(due, seq, index),
        Err(_) => None,
      };
      drop(removed);
    });
  }

  pub(crate) fn peek_due(&self) -> Option<u64> { self.0.borrow().order.front().map(|e| e.0) }

  /// Pops the earliest entry if it is due at or before `limit`.
  pub(crate) fn pop_due(&self, limit: u64) -> Option<(u64, ScheduledWork)> {
    let mut state = self.0.borrow_mut();
    let &(due, _, index) = state.order.front()?;
    if due > limit {
      return None;
    }
    state.order.pop_front();
    state.free.push(index);
    state.slots[index].take().map(|slot| (due, slot.work))
  }

  pub(crate) fn len(&self) -> usize { self.0.borrow().order.len() }

  pub(crate) fn is_empty(&self) -> bool { self.0.borrow().order.is_empty() }

  /// Removes every pending entry.
  pub(crate) fn drain(&self) -> Vec<ScheduledWork> {
    let mut state = self.0.borrow_mut();
    let QueueState { slots, free, order, .. } = &mut *state;
    order
      .drain(..)
      .filter_map(|(_, _, index)| {
        free.push(index);
        slots[index].take().map(|slot| slot.work)
      })
      .collect()
  }
}

impl QueueState {
  fn cancel(&mut self, due: u64, seq: u64, index: usize) -> Option<ScheduledWork> {
    if !matches!(self.slots.get(index), Some(Some(slot)) if slot.seq == seq) {
      return None;
    }
    if let Ok(pos) = self
      .order
      .binary_search_by(|probe| (probe.0, probe.1).cmp(&(due, seq)))
    {
      self.order.remove(pos);
    }
    self.free.push(index);
    self.slots[index].take().map(|slot| slot.work)
  }
}

fn order_insert(order: &mut VecDeque<(u64, u64, usize)>, entry: (u64, u64, usize)) {
  let position = order
    .make_contiguous()
    .binary_search_by(|probe| (probe.0, probe.1).cmp(&(entry.0, entry.1)));
  let position = match position {
    Ok(p) => p,
    Err(p) => p,
  };
  order.insert(position, entry);
}

/// Queue plus the flags every scheduler flush is guarded by.
#[derive(Default)]
pub(crate) struct SchedulerCore {
  pub(crate) queue: ActionQueue,
  active: Cell<bool>,
  scheduled: Cell<bool>,
}

impl SchedulerCore {
  /// Marks a flush as running, or returns `None` if one already is.
  pub(crate) fn begin_flush(&self) -> Option<FlushGuard<'_>> {
    if self.active.replace(true) { None } else { Some(FlushGuard(self)) }
  }

  #[cfg(feature = "futures-scheduler")]
  pub(crate) fn mark_scheduled(&self) -> bool { !self.scheduled.replace(true) }

  #[cfg(feature = "futures-scheduler")]
  pub(crate) fn clear_scheduled(&self) { self.scheduled.set(false) }
}

/// Resets the `active` flag when a flush ends. If the flush is unwinding
/// from a panicking action, every still-queued entry is cancelled too.
pub(crate) struct FlushGuard<'a>(&'a SchedulerCore);

impl Drop for FlushGuard<'_> {
  fn drop(&mut self) {
    self.0.active.set(false);
    if std::thread::panicking() {
      self.0.scheduled.set(false);
      for work in self.0.queue.drain() {
        work.token().unsubscribe();
      }
    }
  }
}
