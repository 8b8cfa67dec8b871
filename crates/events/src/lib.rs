//! Notification fan-out for evently.
//!
//! - [`sinks`]: the realtime and push sink traits the dispatcher writes to.
//! - [`NotificationDispatcher`]: delivers a resolved [`FanOut`] to both
//!   sinks without blocking the caller. Failures are logged and dropped.
//! - [`apns`]: the Apple push provider client, or [`DisabledPush`] when it
//!   is not configured.
//! - [`ChangeTriggers`]: reloads the entity graph after a committed
//!   mutation, resolves its audience and hands it to the dispatcher.
//!
//! [`FanOut`]: evently_core::audience::FanOut

pub mod apns;
pub mod dispatcher;
pub mod sinks;
pub mod triggers;

pub use apns::{ApnsClient, ApnsConfig, DisabledPush};
pub use dispatcher::{DispatchReport, NotificationDispatcher};
pub use sinks::{notify_users, PushError, PushSink, RealtimeSink};
pub use triggers::{ChangeTriggers, Dispatched};
