//! Business Services

pub mod password;
pub mod rules;
pub mod validation;

pub use password::PasswordService;
pub use validation::{TicketValidation, TicketValidationService};
