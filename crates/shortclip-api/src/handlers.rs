//! Request handlers.

pub mod conversion_requests;
pub mod health;

pub use conversion_requests::*;
pub use health::*;
