//! Reminder subsystem: delivery channels, snooze timers, the dispatcher
//! state machine and the session loop that drives it.

pub mod channels;
pub mod delayed;
pub mod dispatcher;
pub mod session;

pub use channels::{CapabilitySet, ChannelError, ChannelKind, DeliveryChannel, DeliveryReport, ReminderAlert};
pub use delayed::DelayedReminderScheduler;
pub use dispatcher::{Announcement, DispatchError, ReminderDispatcher, Resolution};
pub use session::{ReminderSession, SessionEvent, UserCommand};
