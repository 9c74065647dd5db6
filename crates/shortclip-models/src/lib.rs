//! Shared data models for the ShortClip backend.
//!
//! This crate provides Serde-serializable types for:
//! - Conversion requests and their lifecycle status
//! - API input types with validation rules

pub mod conversion_request;
pub mod status;

// Re-export common types
pub use conversion_request::{
    ConversionRequest, CreateConversionRequestInput, ListConversionRequestsQuery,
    UpdateConversionStatusInput, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE,
};
pub use status::ConversionStatus;
