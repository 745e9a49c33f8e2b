use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Represents the status of a task.
/// Corresponds to the `task_status` SQL enum.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum TaskStatus {
    /// Task is yet to be started.
    #[default]
    Todo,
    /// Task is currently being worked on.
    Doing,
    /// Task is completed.
    Done,
}

/// Represents a task entity as stored in the database and returned by the API.
///
/// A task carries its own `user_id`; access checks use it directly rather than going
/// through the parent project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub status: TaskStatus,
    pub project_id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of `POST /api/tasks`.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskInput {
    pub project_id: Uuid,
    #[validate(length(min = 1, max = 120, message = "Title must be between 1 and 120 characters"))]
    pub title: String,
    pub status: Option<TaskStatus>,
}

/// Body of `PATCH /api/tasks/{id}`. At least one field must be present.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_task_changes"))]
pub struct UpdateTaskInput {
    #[validate(length(min = 1, max = 120, message = "Title must be between 1 and 120 characters"))]
    pub title: Option<String>,
    pub status: Option<TaskStatus>,
}

fn validate_task_changes(input: &UpdateTaskInput) -> Result<(), ValidationError> {
    if input.title.is_none() && input.status.is_none() {
        let mut err = ValidationError::new("empty_update");
        err.message = Some("At least one field must be provided".into());
        return Err(err);
    }
    Ok(())
}

/// Query string of `GET /api/tasks`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskQuery {
    pub project_id: Option<Uuid>,
    pub status: Option<TaskStatus>,
}

/// Insert payload; `user_id` always comes from the verified principal.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub project_id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub status: TaskStatus,
}

impl NewTask {
    pub fn new(input: CreateTaskInput, user_id: Uuid) -> Self {
        Self {
            project_id: input.project_id,
            user_id,
            title: input.title,
            status: input.status.unwrap_or_default(),
        }
    }
}
