//! Notification sinks for Verdant.
//!
//! - [`LogNotifier`] — records deliveries to tracing and an inspection ring;
//!   the development default.
//! - [`HttpNotifier`] — Resend-style JSON mail API client.
//! - [`RecordingNotifier`] — test double capturing every delivery.

pub mod http;
pub mod log;
pub mod recording;

pub use http::HttpNotifier;
pub use log::LogNotifier;
pub use recording::RecordingNotifier;
