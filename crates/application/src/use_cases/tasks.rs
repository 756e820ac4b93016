//! Task use cases.

use std::sync::Arc;

use datacake_domain::endpoints;
use datacake_domain::{ApiRequest, ChecklistItem, DomainError, Task, TaskDraft, TaskFilter};
use serde_json::json;
use tracing::debug;

use crate::client::ApiClient;
use crate::error::ApiResult;

/// Task operations over an [`ApiClient`].
#[derive(Debug, Clone)]
pub struct TasksApi {
    client: Arc<ApiClient>,
}

impl TasksApi {
    /// Creates the use case.
    #[must_use]
    pub const fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    /// Lists tasks matching `filter`.
    ///
    /// # Errors
    ///
    /// Fails like [`ApiClient::fetch`].
    pub async fn list(&self, filter: &TaskFilter) -> ApiResult<Vec<Task>> {
        let mut request = ApiRequest::get(endpoints::TASKS);
        request.query = filter.query_pairs();
        self.client.fetch(&request).await
    }

    /// Creates a task.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Domain` for a blank title without calling the
    /// backend; otherwise fails like [`ApiClient::fetch`].
    pub async fn create(&self, draft: &TaskDraft) -> ApiResult<Task> {
        let draft = validated(draft)?;
        let task: Task = self.client.post(endpoints::TASKS, &draft).await?;
        debug!(id = task.id, "task created");
        Ok(task)
    }

    /// Replaces the editable fields of a task.
    ///
    /// # Errors
    ///
    /// Same as [`Self::create`].
    pub async fn update(&self, id: i64, draft: &TaskDraft) -> ApiResult<Task> {
        let draft = validated(draft)?;
        self.client.patch(&endpoints::task(id), &draft).await
    }

    /// Saves only the checklist of a task.
    ///
    /// # Errors
    ///
    /// Fails like [`ApiClient::fetch`].
    pub async fn update_checklist(&self, id: i64, items: &[ChecklistItem]) -> ApiResult<Task> {
        let items: Vec<ChecklistItem> = items
            .iter()
            .enumerate()
            .map(|(index, item)| ChecklistItem {
                order: u32::try_from(index).unwrap_or(u32::MAX),
                ..item.clone()
            })
            .collect();
        self.client
            .patch(&endpoints::task(id), &json!({ "checklist_items": items }))
            .await
    }

    /// Flips a task between pending and done.
    ///
    /// # Errors
    ///
    /// Fails like [`ApiClient::fetch`].
    pub async fn toggle(&self, id: i64) -> ApiResult<Task> {
        self.client
            .fetch(&ApiRequest::post(endpoints::task_toggle(id)))
            .await
    }

    /// Deletes a task.
    ///
    /// # Errors
    ///
    /// Fails like [`ApiClient::send`].
    pub async fn delete(&self, id: i64) -> ApiResult<()> {
        self.client.delete(&endpoints::task(id)).await
    }
}

fn validated(draft: &TaskDraft) -> ApiResult<TaskDraft> {
    if draft.is_missing_title() {
        return Err(DomainError::InvalidTask("title is required".to_string()).into());
    }
    Ok(draft.normalized())
}
