//! # rxcore: a push-based reactive stream runtime
//!
//! Observables, observers and subscriptions, the scheduler abstraction (with
//! a virtual-time scheduler for deterministic tests), the subject family,
//! connectable/ref-counted sharing and the concurrency operators `merge_all`,
//! `combine_latest` and `zip`.
//!
//! ## Quick Start
//!
//! ```rust
//! use rxcore::prelude::*;
//!
//! observable::from_iter(0..10)
//!   .filter(|v| v % 2 == 0)
//!   .map(|v| v * 2)
//!   .subscribe(|v| println!("Value: {}", v));
//! ```
//!
//! ## Key Concepts
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Observable`] | A lazy, cold description of a stream |
//! | [`Observer`] | Consumes `next`, `error`, and `complete` events |
//! | [`Subscriber`] | Enforces the protocol in front of an observer |
//! | [`Subscription`] | Handle to cancel an active subscription |
//! | [`Scheduler`] | Decides when queued work runs |
//! | [`Subject`] | Multicasts what is pushed into it |
//!
//! Everything is single-threaded: handles are `Rc` based and cheap to clone.
//!
//! ## Feature Flags
//!
//! - **`futures-scheduler`** (default): `AsapScheduler`, `AsyncScheduler` and
//!   `EventLoop` on a futures `LocalPool`
//! - **`timer`**: delayed work for the executor-backed schedulers
//!
//! [`Observable`]: observable::Observable
//! [`Observer`]: observer::Observer
//! [`Subscriber`]: subscriber::Subscriber
//! [`Subscription`]: subscription::Subscription
//! [`Scheduler`]: scheduler::Scheduler
//! [`Subject`]: subject::Subject

pub mod error;
pub mod notification;
pub mod observable;
pub mod observer;
pub mod ops;
pub mod prelude;
pub mod rc;
pub mod scheduler;
pub mod subject;
pub mod subscriber;
pub mod subscription;
pub mod testing;

pub use prelude::*;
