//! GuestList Platform
//!
//! Core platform providing:
//! - Venue, event, guest and ticket management
//! - Signed-QR ticket issuance and check-in validation
//! - Account registration and credential handling
//! - REST API with OpenAPI documentation

pub mod api;
pub mod error;
pub mod repository;
pub mod service;

pub use error::{PlatformError, Result};
