//! Conversion request entity and API input types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::status::ConversionStatus;

/// Default page size for request listings.
pub const DEFAULT_PAGE_SIZE: i64 = 20;
/// Maximum page size a client may request.
pub const MAX_PAGE_SIZE: i64 = 100;

/// One user-submitted job to turn a source video into a short clip.
///
/// Created once with `status = pending` and mutated only through the
/// status-update operation; rows are never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ConversionRequest {
    /// Server-generated identifier, immutable for the row's lifetime
    pub id: i64,
    /// Source video URL, immutable after creation
    pub original_url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    /// Current lifecycle status
    pub status: ConversionStatus,
    /// Progress percentage (0-100)
    pub progress_percentage: i32,
    /// Error message, set on the failure path
    pub error_message: Option<String>,
    /// Result clip URL, set on the success path
    pub short_video_url: Option<String>,
    /// Downloadable result URL, set on the success path
    pub download_url: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Bumped on every mutation
    pub updated_at: DateTime<Utc>,
    /// Set whenever status becomes completed; never cleared afterwards
    pub completed_at: Option<DateTime<Utc>>,
}

/// Input for creating a conversion request.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateConversionRequestInput {
    #[validate(url(message = "original_url must be a well-formed URL"))]
    pub original_url: String,
    pub title: Option<String>,
    pub description: Option<String>,
}

/// Input for updating a request's status.
///
/// Optional fields follow patch semantics: a field absent from the body
/// leaves the stored value unchanged. The request id travels in the URL
/// path, not the body.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateConversionStatusInput {
    pub status: ConversionStatus,
    pub error_message: Option<String>,
    #[validate(url(message = "short_video_url must be a well-formed URL"))]
    pub short_video_url: Option<String>,
    #[validate(url(message = "download_url must be a well-formed URL"))]
    pub download_url: Option<String>,
    #[validate(range(min = 0, max = 100, message = "progress_percentage must be within 0-100"))]
    pub progress_percentage: Option<i32>,
}

/// Query parameters for listing conversion requests.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ListConversionRequestsQuery {
    pub status: Option<ConversionStatus>,
    #[validate(range(min = 1, max = 100, message = "limit must be within 1-100"))]
    pub limit: Option<i64>,
    #[validate(range(min = 0, message = "offset must be non-negative"))]
    pub offset: Option<i64>,
}

impl ListConversionRequestsQuery {
    /// Effective page size with the default applied.
    pub fn effective_limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_PAGE_SIZE)
    }

    /// Effective offset with the default applied.
    pub fn effective_offset(&self) -> i64 {
        self.offset.unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_input_rejects_malformed_url() {
        let input = CreateConversionRequestInput {
            original_url: "not-a-url".to_string(),
            title: None,
            description: None,
        };
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_create_input_accepts_valid_url() {
        let input = CreateConversionRequestInput {
            original_url: "https://example.com/video.mp4".to_string(),
            title: Some("My video".to_string()),
            description: None,
        };
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_update_input_rejects_out_of_range_progress() {
        let input = UpdateConversionStatusInput {
            status: ConversionStatus::Processing,
            error_message: None,
            short_video_url: None,
            download_url: None,
            progress_percentage: Some(101),
        };
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_update_input_absent_fields_pass_validation() {
        let input = UpdateConversionStatusInput {
            status: ConversionStatus::Completed,
            error_message: None,
            short_video_url: None,
            download_url: None,
            progress_percentage: None,
        };
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_list_query_defaults() {
        let query = ListConversionRequestsQuery::default();
        assert_eq!(query.effective_limit(), DEFAULT_PAGE_SIZE);
        assert_eq!(query.effective_offset(), 0);
        assert!(query.validate().is_ok());
    }

    #[test]
    fn test_list_query_rejects_oversized_limit() {
        let query = ListConversionRequestsQuery {
            status: None,
            limit: Some(MAX_PAGE_SIZE + 1),
            offset: None,
        };
        assert!(query.validate().is_err());
    }

    #[test]
    fn test_conversion_request_serde_round_trip() {
        let row = ConversionRequest {
            id: 7,
            original_url: "https://example.com/video.mp4".to_string(),
            title: None,
            description: None,
            status: ConversionStatus::Pending,
            progress_percentage: 0,
            error_message: None,
            short_video_url: None,
            download_url: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            completed_at: None,
        };

        let json = serde_json::to_string(&row).unwrap();
        let parsed: ConversionRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, row);
        assert!(json.contains("\"status\":\"pending\""));
    }
}
