//! User-facing error channel and analytics hooks.
//!
//! The share workflow and the refresh scheduler never render anything
//! themselves: they hand human-readable messages to an [`ErrorReporter`]
//! and share events to an [`Analytics`] sink. The CLI collects notices in a
//! [`NoticeQueue`] and prints them once a command finishes.

mod hooks;
mod notice;

pub use hooks::{Analytics, ErrorReporter, QueueReporter, TracingAnalytics};
pub use notice::{Notice, NoticeQueue};
