//! # oikos-core
//!
//! Form intake for the Oikos Orchard & Farm website.
//!
//! This crate provides:
//! - Configuration from environment variables
//! - Contact, booking and "get started" form validation
//! - Flat-file submission storage (text logs and `bookings.json`)
//! - Notification channels: email over SMTP, Twilio SMS, carrier SMS
//!   gateways, Firebase push and a spreadsheet webhook
//! - The intake service that runs one submission end to end
//! - A sliding-window rate limiter

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod config;
mod error;
pub mod form;
pub mod intake;
pub mod notify;
pub mod ratelimit;
pub mod storage;

pub use config::{AppConfig, ConfigError};
pub use error::{Error, Result};
pub use form::{BookingForm, ContactForm, GetStartedForm, ValidationError};
pub use intake::{Channels, IntakeService, Receipt};
pub use notify::{Channel, Delivery, NotifyError};
pub use ratelimit::RateLimiter;
pub use storage::{BookingRecord, SubmissionStore};
