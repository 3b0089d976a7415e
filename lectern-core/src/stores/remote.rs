//! Remote progress store port and its HTTP adapter.
//!
//! The backend persists per-(user, lecture) progress and recomputes course
//! aggregates server-side. Every call may fail independently; callers treat
//! failures as log-and-drop, never as a reason to block playback.

use async_trait::async_trait;
use lectern_model::{
    ApiResponse, CourseId, CourseProgressResponse, LectureId, LectureProgress,
    UpsertProgressRequest, UserId,
};
use reqwest::{Client, StatusCode};
use tracing::debug;

use crate::error::{CoreError, Result};

#[async_trait]
pub trait ProgressStore: Send + Sync {
    /// One-shot liveness probe. Until this has returned `true` once, every
    /// remote write is suppressed.
    async fn check_reachable(&self) -> bool;

    /// Record the latest playback position; leaves completion untouched.
    async fn upsert_position(
        &self,
        user: UserId,
        lecture: &LectureId,
        position_secs: u32,
    ) -> Result<()>;

    /// Mark the lecture completed. `completed_at` is stamped server-side,
    /// once, on the first completion.
    async fn upsert_completion(&self, user: UserId, lecture: &LectureId) -> Result<()>;

    /// Every progress row the user has for the course.
    async fn fetch_course_progress(
        &self,
        user: UserId,
        course: CourseId,
    ) -> Result<Vec<LectureProgress>>;
}

/// [`ProgressStore`] over the Lectern REST API
#[derive(Debug, Clone)]
pub struct HttpProgressStore {
    client: Client,
    base_url: String,
}

impl HttpProgressStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn put_progress(
        &self,
        user: UserId,
        lecture: &LectureId,
        body: &UpsertProgressRequest,
    ) -> Result<()> {
        let url = self.url(&format!("progress/{}/lectures/{}", user, lecture));
        let response = self.client.put(url).json(body).send().await?;

        match response.status() {
            status if status.is_success() => Ok(()),
            status => {
                let text = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "unknown error".to_string());
                Err(CoreError::RemoteRejected(format!("{}: {}", status, text)))
            }
        }
    }
}

#[async_trait]
impl ProgressStore for HttpProgressStore {
    async fn check_reachable(&self) -> bool {
        match self.client.get(self.url("health")).send().await {
            Ok(response) => response.status() == StatusCode::OK,
            Err(e) => {
                debug!("Progress backend unreachable: {}", e);
                false
            }
        }
    }

    async fn upsert_position(
        &self,
        user: UserId,
        lecture: &LectureId,
        position_secs: u32,
    ) -> Result<()> {
        self.put_progress(
            user,
            lecture,
            &UpsertProgressRequest {
                last_position: position_secs as i32,
                completed: false,
            },
        )
        .await
    }

    async fn upsert_completion(&self, user: UserId, lecture: &LectureId) -> Result<()> {
        self.put_progress(
            user,
            lecture,
            &UpsertProgressRequest {
                last_position: 0,
                completed: true,
            },
        )
        .await
    }

    async fn fetch_course_progress(
        &self,
        user: UserId,
        course: CourseId,
    ) -> Result<Vec<LectureProgress>> {
        let url = self.url(&format!("progress/{}/courses/{}", user, course));
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(CoreError::RemoteRejected(format!(
                "progress fetch failed with status {}",
                response.status()
            )));
        }

        let envelope: ApiResponse<CourseProgressResponse> = response.json().await?;
        match envelope.data {
            Some(data) => Ok(data.lecture_progress),
            None => Err(CoreError::RemoteRejected(
                envelope
                    .error
                    .unwrap_or_else(|| "empty response from server".to_string()),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_building_normalizes_slashes() {
        let store = HttpProgressStore::new("http://localhost:3000/");
        assert_eq!(store.url("health"), "http://localhost:3000/api/health");
        assert_eq!(
            store.url("/progress/1/courses/1"),
            "http://localhost:3000/api/progress/1/courses/1"
        );
    }
}
