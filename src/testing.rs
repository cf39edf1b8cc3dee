//! Virtual-time test harness.
//!
//! Streams are described as lists of [`Recorded`] notifications and played
//! back on a [`VirtualTimeScheduler`]; a [`TestObserver`] records what it
//! receives together with the frame it arrived on. Both kinds of test
//! observable keep a [`SubscriptionLog`] per subscription.

use std::rc::Rc;

use crate::{
  notification::Notification,
  observable::{Observable, Subscribable},
  observer::Observer,
  rc::MutRc,
  scheduler::{Scheduler, SchedulerExt, VirtualTimeScheduler},
  subject::Subject,
  subscriber::Subscriber,
  subscription::Subscription,
};

/// A notification stamped with the frame it happens on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Recorded<Item, Err> {
  pub frame: u64,
  pub notification: Notification<Item, Err>,
}

impl<Item, Err> Recorded<Item, Err> {
  pub fn next(frame: u64, value: Item) -> Self {
    Recorded { frame, notification: Notification::Next(value) }
  }

  pub fn error(frame: u64, err: Err) -> Self {
    Recorded { frame, notification: Notification::Error(err) }
  }

  pub fn complete(frame: u64) -> Self { Recorded { frame, notification: Notification::Complete } }
}

/// When a subscription to a test observable started and, if it did, ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SubscriptionLog {
  pub subscribed: u64,
  pub unsubscribed: Option<u64>,
}

impl SubscriptionLog {
  pub fn new(subscribed: u64, unsubscribed: Option<u64>) -> Self {
    SubscriptionLog { subscribed, unsubscribed }
  }
}

#[derive(Clone)]
struct SubscriptionLogs {
  scheduler: VirtualTimeScheduler,
  logs: MutRc<Vec<SubscriptionLog>>,
}

impl SubscriptionLogs {
  fn new(scheduler: &VirtualTimeScheduler) -> Self {
    SubscriptionLogs { scheduler: scheduler.clone(), logs: MutRc::own(vec![]) }
  }

  /// Logs the start of `subscription` now and its end whenever it happens.
  fn track(&self, subscription: &Subscription) {
    let index = {
      let mut logs = self.logs.rc_deref_mut();
      logs.push(SubscriptionLog::new(self.scheduler.now(), None));
      logs.len() - 1
    };
    let this = self.clone();
    subscription.add_fn(move || {
      let now = this.scheduler.now();
      this.logs.rc_deref_mut()[index].unsubscribed = Some(now);
    });
  }

  fn snapshot(&self) -> Vec<SubscriptionLog> { self.logs.rc_deref().clone() }
}

/// Plays its messages for every subscriber, with frames relative to the
/// moment of subscription.
pub struct ColdObservable<Item, Err> {
  scheduler: VirtualTimeScheduler,
  messages: Rc<Vec<Recorded<Item, Err>>>,
  logs: SubscriptionLogs,
}

impl<Item, Err> Clone for ColdObservable<Item, Err> {
  fn clone(&self) -> Self {
    ColdObservable {
      scheduler: self.scheduler.clone(),
      messages: self.messages.clone(),
      logs: self.logs.clone(),
    }
  }
}

impl<Item: Clone + 'static, Err: Clone + 'static> ColdObservable<Item, Err> {
  pub fn new(scheduler: &VirtualTimeScheduler, messages: Vec<Recorded<Item, Err>>) -> Self {
    ColdObservable {
      scheduler: scheduler.clone(),
      messages: Rc::new(messages),
      logs: SubscriptionLogs::new(scheduler),
    }
  }

  pub fn subscriptions(&self) -> Vec<SubscriptionLog> { self.logs.snapshot() }
}

impl<Item: Clone + 'static, Err: Clone + 'static> Subscribable<Item, Err>
  for ColdObservable<Item, Err>
{
  fn subscribe_with(&self, subscriber: Subscriber<Item, Err>) -> Subscription {
    self.logs.track(subscriber.subscription());
    for message in self.messages.iter() {
      let c_subscriber = subscriber.clone();
      let handle = self.scheduler.schedule(
        move |_, notification: Notification<Item, Err>| {
          notification.observe(&mut c_subscriber.clone())
        },
        message.frame,
        message.notification.clone(),
      );
      subscriber.add(handle);
    }
    subscriber.subscription().clone()
  }

  fn as_observable(&self) -> Observable<Item, Err> {
    let cold = self.clone();
    Observable::new(move |subscriber| {
      cold.subscribe_with(subscriber);
    })
  }
}

/// Plays its messages once, at frames relative to its creation, whether or
/// not anybody is subscribed.
pub struct HotObservable<Item, Err> {
  subject: Subject<Item, Err>,
  logs: SubscriptionLogs,
}

impl<Item, Err> Clone for HotObservable<Item, Err> {
  fn clone(&self) -> Self { HotObservable { subject: self.subject.clone(), logs: self.logs.clone() } }
}

impl<Item: Clone + 'static, Err: Clone + 'static> HotObservable<Item, Err> {
  pub fn new(scheduler: &VirtualTimeScheduler, messages: Vec<Recorded<Item, Err>>) -> Self {
    let subject = Subject::new();
    for message in messages {
      let c_subject = subject.clone();
      scheduler.schedule(
        move |_, notification: Notification<Item, Err>| {
          notification.observe(&mut c_subject.clone())
        },
        message.frame,
        message.notification,
      );
    }
    HotObservable { subject, logs: SubscriptionLogs::new(scheduler) }
  }

  pub fn subscriptions(&self) -> Vec<SubscriptionLog> { self.logs.snapshot() }
}

impl<Item: Clone + 'static, Err: Clone + 'static> Subscribable<Item, Err>
  for HotObservable<Item, Err>
{
  fn subscribe_with(&self, subscriber: Subscriber<Item, Err>) -> Subscription {
    self.logs.track(subscriber.subscription());
    self.subject.subscribe_with(subscriber)
  }

  fn as_observable(&self) -> Observable<Item, Err> {
    let hot = self.clone();
    Observable::new(move |subscriber| {
      hot.subscribe_with(subscriber);
    })
  }
}

/// Records every notification with the frame it arrived on.
pub struct TestObserver<Item, Err> {
  scheduler: VirtualTimeScheduler,
  messages: MutRc<Vec<Recorded<Item, Err>>>,
}

impl<Item, Err> Clone for TestObserver<Item, Err> {
  fn clone(&self) -> Self {
    TestObserver { scheduler: self.scheduler.clone(), messages: self.messages.clone() }
  }
}

impl<Item: Clone, Err: Clone> TestObserver<Item, Err> {
  pub fn new(scheduler: &VirtualTimeScheduler) -> Self {
    TestObserver { scheduler: scheduler.clone(), messages: MutRc::own(vec![]) }
  }

  pub fn messages(&self) -> Vec<Recorded<Item, Err>> { self.messages.rc_deref().clone() }

  fn record(&self, notification: Notification<Item, Err>) {
    let frame = self.scheduler.now();
    self.messages.rc_deref_mut().push(Recorded { frame, notification });
  }
}

impl<Item: Clone, Err: Clone> Observer<Item, Err> for TestObserver<Item, Err> {
  fn next(&mut self, value: Item) { self.record(Notification::Next(value)) }

  fn error(&mut self, err: Err) { self.record(Notification::Error(err)) }

  fn complete(&mut self) { self.record(Notification::Complete) }
}

/// Builds the observable with `factory`, subscribes to it at `subscribe_at`,
/// unsubscribes at `unsubscribe_at` and flushes `scheduler`.
///
/// Returns the observer the notifications were recorded into.
pub fn start<Item, Err>(
  scheduler: &VirtualTimeScheduler, subscribe_at: u64, unsubscribe_at: u64,
  factory: impl FnOnce() -> Observable<Item, Err> + 'static,
) -> TestObserver<Item, Err>
where
  Item: Clone + 'static,
  Err: Clone + 'static,
{
  let observer = TestObserver::new(scheduler);
  let subscription = MutRc::own(None::<Subscription>);

  let mut factory = Some(factory);
  let (c_observer, c_subscription) = (observer.clone(), subscription.clone());
  scheduler.schedule(
    move |_, _: ()| {
      if let Some(factory) = factory.take() {
        let handle = factory().subscribe_observer(c_observer.clone());
        *c_subscription.rc_deref_mut() = Some(handle);
      }
    },
    subscribe_at.saturating_sub(scheduler.now()),
    (),
  );
  scheduler.schedule(
    move |_, _: ()| {
      let handle = subscription.rc_deref_mut().take();
      if let Some(handle) = handle {
        handle.unsubscribe();
      }
    },
    unsubscribe_at.saturating_sub(scheduler.now()),
    (),
  );

  scheduler.flush();
  observer
}
