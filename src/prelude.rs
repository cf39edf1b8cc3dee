//! Prelude module for convenient imports
//!
//! This module re-exports commonly used types and traits for easy access.

pub use std::convert::Infallible;

// Core types and traits
pub use crate::{
  error::{BoxError, UnsubscriptionError},
  notification::{Notification, NotificationKind},
  observable::{self, *},
  observer::{BoxObserver, FnObserver, Observer},
  subscriber::Subscriber,
  subscription::{Subscription, SubscriptionGuard},
};
// Operators
pub use crate::ops::{combine_latest, try_combine_latest, try_zip, zip, Operator};
// Schedulers
pub use crate::scheduler::{
  Action, QueueScheduler, ScheduledWork, Scheduler, SchedulerExt, VirtualTimeScheduler,
};
#[cfg(feature = "futures-scheduler")]
pub use crate::scheduler::{AsapScheduler, AsyncScheduler, EventLoop};
// Subjects
pub use crate::subject::{AsyncSubject, BehaviorSubject, ReplaySubject, Subject, SubjectLike};
// Virtual-time harness
pub use crate::testing::{ColdObservable, HotObservable, Recorded, SubscriptionLog, TestObserver};
