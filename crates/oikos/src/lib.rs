//! # oikos
//!
//! HTTP endpoints for the Oikos Orchard & Farm website forms.
//!
//! | Method | Path | Body |
//! |--------|------|------|
//! | `POST` | `/api/contact` | `name`, `email`, `phone`, `body` |
//! | `POST` | `/api/booking` | `fullName`, `email`, `phone`, `checkinDate`, `guests`, `packageName`, `packagePrice?`, `specialRequests?` |
//! | `POST` | `/api/get-started` | `name`, `email`, `phone`, `interested` |
//! | `GET` | `/health` | |
//!
//! Bodies are JSON or `application/x-www-form-urlencoded`. Every response is
//! `{ "success": bool, "message": string, "data"?: object }`.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod app;
pub mod error;
pub mod extract;
pub mod handler;
pub mod middleware;

pub use app::{AppState, router};
