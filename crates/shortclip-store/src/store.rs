//! Request store over a SQLite pool.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::QueryBuilder;
use tracing::info;

use shortclip_models::{ConversionRequest, ConversionStatus, DEFAULT_PAGE_SIZE};

use crate::error::{StoreError, StoreResult};

/// Draft row for insertion. Lifecycle fields (id, status, progress,
/// timestamps) are assigned by the store, not the caller.
#[derive(Debug, Clone)]
pub struct NewConversionRequest {
    pub original_url: String,
    pub title: Option<String>,
    pub description: Option<String>,
}

/// Partial field patch for an update.
///
/// `None` means "leave the stored value unchanged"; there is no way to
/// clear a field back to NULL through a patch.
#[derive(Debug, Clone, Default)]
pub struct RequestPatch {
    pub status: Option<ConversionStatus>,
    pub progress_percentage: Option<i32>,
    pub error_message: Option<String>,
    pub short_video_url: Option<String>,
    pub download_url: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Listing filter with pagination.
#[derive(Debug, Clone)]
pub struct RequestFilter {
    pub status: Option<ConversionStatus>,
    pub limit: i64,
    pub offset: i64,
}

impl Default for RequestFilter {
    fn default() -> Self {
        Self {
            status: None,
            limit: DEFAULT_PAGE_SIZE,
            offset: 0,
        }
    }
}

/// Repository for `conversion_requests` rows.
#[derive(Clone)]
pub struct RequestStore {
    pool: SqlitePool,
}

impl RequestStore {
    /// Open a database at `url` (e.g. `sqlite://shortclip.db`) and run
    /// pending migrations.
    pub async fn connect(url: &str) -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;
        let store = Self { pool };
        store.migrate().await?;
        info!("Request store ready at {}", url);
        Ok(store)
    }

    /// Open an isolated in-memory database for tests.
    ///
    /// A `:memory:` database exists per connection, so the pool is capped
    /// at a single connection.
    pub async fn in_memory() -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;
        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> StoreResult<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Connectivity probe for readiness checks.
    pub async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Insert a draft row, assigning id and timestamps and applying
    /// lifecycle defaults (status pending, progress 0). Returns the full
    /// stored row.
    pub async fn insert(&self, draft: &NewConversionRequest) -> StoreResult<ConversionRequest> {
        let now = Utc::now();
        let row = sqlx::query_as::<_, ConversionRequest>(
            r#"
            INSERT INTO conversion_requests
                (original_url, title, description, status, progress_percentage, created_at, updated_at)
            VALUES (?, ?, ?, ?, 0, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&draft.original_url)
        .bind(&draft.title)
        .bind(&draft.description)
        .bind(ConversionStatus::Pending)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    /// Point lookup. A missing row is an expected outcome, not an error.
    pub async fn get(&self, id: i64) -> StoreResult<Option<ConversionRequest>> {
        let row = sqlx::query_as::<_, ConversionRequest>(
            "SELECT * FROM conversion_requests WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// List rows newest-first, optionally filtered by status, with ties
    /// on `created_at` kept in insertion order.
    pub async fn list(&self, filter: &RequestFilter) -> StoreResult<Vec<ConversionRequest>> {
        let rows = match filter.status {
            Some(status) => {
                sqlx::query_as::<_, ConversionRequest>(
                    r#"
                    SELECT * FROM conversion_requests
                    WHERE status = ?
                    ORDER BY created_at DESC, id ASC
                    LIMIT ? OFFSET ?
                    "#,
                )
                .bind(status)
                .bind(filter.limit)
                .bind(filter.offset)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, ConversionRequest>(
                    r#"
                    SELECT * FROM conversion_requests
                    ORDER BY created_at DESC, id ASC
                    LIMIT ? OFFSET ?
                    "#,
                )
                .bind(filter.limit)
                .bind(filter.offset)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(rows)
    }

    /// Apply a partial patch to a row, always bumping `updated_at`.
    /// Fails with [`StoreError::NotFound`] when the id does not exist.
    pub async fn update(&self, id: i64, patch: &RequestPatch) -> StoreResult<ConversionRequest> {
        let now = Utc::now();

        let mut query = QueryBuilder::<sqlx::Sqlite>::new(
            "UPDATE conversion_requests SET updated_at = ",
        );
        query.push_bind(now);

        if let Some(status) = patch.status {
            query.push(", status = ").push_bind(status);
        }
        if let Some(progress) = patch.progress_percentage {
            query.push(", progress_percentage = ").push_bind(progress);
        }
        if let Some(error_message) = &patch.error_message {
            query.push(", error_message = ").push_bind(error_message);
        }
        if let Some(short_video_url) = &patch.short_video_url {
            query.push(", short_video_url = ").push_bind(short_video_url);
        }
        if let Some(download_url) = &patch.download_url {
            query.push(", download_url = ").push_bind(download_url);
        }
        if let Some(completed_at) = patch.completed_at {
            query.push(", completed_at = ").push_bind(completed_at);
        }

        query.push(" WHERE id = ").push_bind(id);
        query.push(" RETURNING *");

        let row = query
            .build_query_as::<ConversionRequest>()
            .fetch_optional(&self.pool)
            .await?;

        row.ok_or(StoreError::NotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(url: &str) -> NewConversionRequest {
        NewConversionRequest {
            original_url: url.to_string(),
            title: None,
            description: None,
        }
    }

    #[tokio::test]
    async fn test_insert_applies_lifecycle_defaults() {
        let store = RequestStore::in_memory().await.unwrap();

        let row = store
            .insert(&draft("https://example.com/video.mp4"))
            .await
            .unwrap();

        assert!(row.id > 0);
        assert_eq!(row.status, ConversionStatus::Pending);
        assert_eq!(row.progress_percentage, 0);
        assert!(row.title.is_none());
        assert!(row.description.is_none());
        assert!(row.error_message.is_none());
        assert!(row.short_video_url.is_none());
        assert!(row.download_url.is_none());
        assert!(row.completed_at.is_none());
        assert!(row.created_at <= row.updated_at);
    }

    #[tokio::test]
    async fn test_insert_assigns_unique_ids() {
        let store = RequestStore::in_memory().await.unwrap();

        let first = store.insert(&draft("https://example.com/a.mp4")).await.unwrap();
        let second = store.insert(&draft("https://example.com/b.mp4")).await.unwrap();

        assert_ne!(first.id, second.id);
        assert!(second.id > first.id);
    }

    #[tokio::test]
    async fn test_get_round_trips_created_row() {
        let store = RequestStore::in_memory().await.unwrap();

        let mut new = draft("https://example.com/video.mp4");
        new.title = Some("A title".to_string());
        new.description = Some("A description".to_string());

        let created = store.insert(&new).await.unwrap();
        let fetched = store.get(created.id).await.unwrap().unwrap();

        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn test_get_missing_row_returns_none() {
        let store = RequestStore::in_memory().await.unwrap();
        assert!(store.get(9999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_returns_newest_first() {
        let store = RequestStore::in_memory().await.unwrap();

        let first = store.insert(&draft("https://example.com/1.mp4")).await.unwrap();
        let second = store.insert(&draft("https://example.com/2.mp4")).await.unwrap();
        let third = store.insert(&draft("https://example.com/3.mp4")).await.unwrap();

        let rows = store.list(&RequestFilter::default()).await.unwrap();
        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![third.id, second.id, first.id]);
    }

    #[tokio::test]
    async fn test_list_caps_at_limit() {
        let store = RequestStore::in_memory().await.unwrap();

        for i in 0..25 {
            store
                .insert(&draft(&format!("https://example.com/{i}.mp4")))
                .await
                .unwrap();
        }

        let rows = store.list(&RequestFilter::default()).await.unwrap();
        assert_eq!(rows.len() as i64, DEFAULT_PAGE_SIZE);
    }

    #[tokio::test]
    async fn test_list_applies_limit_and_offset() {
        let store = RequestStore::in_memory().await.unwrap();

        let mut ids = Vec::new();
        for i in 0..10 {
            let row = store
                .insert(&draft(&format!("https://example.com/{i}.mp4")))
                .await
                .unwrap();
            ids.push(row.id);
        }

        let filter = RequestFilter {
            status: None,
            limit: 5,
            offset: 3,
        };
        let rows = store.list(&filter).await.unwrap();
        let got: Vec<i64> = rows.iter().map(|r| r.id).collect();

        // Newest-first, skip 3: rows 4 through 8 from the top.
        let expected: Vec<i64> = ids.iter().rev().skip(3).take(5).copied().collect();
        assert_eq!(got, expected);
    }

    #[tokio::test]
    async fn test_list_filters_by_status() {
        let store = RequestStore::in_memory().await.unwrap();

        let a = store.insert(&draft("https://example.com/a.mp4")).await.unwrap();
        let b = store.insert(&draft("https://example.com/b.mp4")).await.unwrap();
        store
            .update(
                b.id,
                &RequestPatch {
                    status: Some(ConversionStatus::Completed),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let filter = RequestFilter {
            status: Some(ConversionStatus::Completed),
            ..Default::default()
        };
        let rows = store.list(&filter).await.unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, b.id);
        assert_ne!(rows[0].id, a.id);
    }

    #[tokio::test]
    async fn test_list_empty_store_is_ok() {
        let store = RequestStore::in_memory().await.unwrap();
        let rows = store.list(&RequestFilter::default()).await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_update_applies_partial_patch() {
        let store = RequestStore::in_memory().await.unwrap();
        let created = store.insert(&draft("https://example.com/video.mp4")).await.unwrap();

        let patch = RequestPatch {
            status: Some(ConversionStatus::Processing),
            progress_percentage: Some(40),
            ..Default::default()
        };
        let updated = store.update(created.id, &patch).await.unwrap();

        assert_eq!(updated.status, ConversionStatus::Processing);
        assert_eq!(updated.progress_percentage, 40);
        // Untouched fields survive the patch.
        assert_eq!(updated.original_url, created.original_url);
        assert!(updated.error_message.is_none());
        assert_eq!(updated.created_at, created.created_at);
    }

    #[tokio::test]
    async fn test_update_bumps_updated_at_monotonically() {
        let store = RequestStore::in_memory().await.unwrap();
        let created = store.insert(&draft("https://example.com/video.mp4")).await.unwrap();

        let patch = RequestPatch {
            status: Some(ConversionStatus::Processing),
            ..Default::default()
        };
        let first = store.update(created.id, &patch).await.unwrap();
        let second = store.update(created.id, &patch).await.unwrap();

        assert!(first.updated_at > created.updated_at);
        assert!(second.updated_at > first.updated_at);
        assert!(second.created_at <= second.updated_at);
    }

    #[tokio::test]
    async fn test_update_missing_row_is_not_found() {
        let store = RequestStore::in_memory().await.unwrap();

        let err = store
            .update(9999, &RequestPatch::default())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
