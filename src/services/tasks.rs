use std::sync::Arc;

use uuid::Uuid;

use crate::error::AppError;
use crate::models::{CreateTaskInput, NewTask, Task, TaskQuery, UpdateTaskInput};
use crate::repository::{ProjectRepository, TaskRepository};

fn task_not_found() -> AppError {
    AppError::NotFound("Task not found".into())
}

/// Task CRUD scoped to the task's own `user_id`.
pub struct TaskService {
    tasks: Arc<dyn TaskRepository>,
    projects: Arc<dyn ProjectRepository>,
}

impl TaskService {
    pub fn new(tasks: Arc<dyn TaskRepository>, projects: Arc<dyn ProjectRepository>) -> Self {
        Self { tasks, projects }
    }

    /// Creates a task in a project the caller owns.
    ///
    /// Ownership is checked before the insert; a project deleted in between is caught by
    /// the foreign key.
    pub async fn create(&self, user_id: Uuid, input: CreateTaskInput) -> Result<Task, AppError> {
        if self
            .projects
            .find_owned(user_id, input.project_id)
            .await?
            .is_none()
        {
            return Err(AppError::NotFound("Project not found".into()));
        }
        self.tasks.create(NewTask::new(input, user_id)).await
    }

    pub async fn list(&self, user_id: Uuid, query: &TaskQuery) -> Result<Vec<Task>, AppError> {
        self.tasks.list_for_user(user_id, query).await
    }

    pub async fn get(&self, user_id: Uuid, id: Uuid) -> Result<Task, AppError> {
        self.tasks
            .find_for_user(user_id, id)
            .await?
            .ok_or_else(task_not_found)
    }

    pub async fn update(
        &self,
        user_id: Uuid,
        id: Uuid,
        changes: &UpdateTaskInput,
    ) -> Result<Task, AppError> {
        self.tasks
            .update_for_user(user_id, id, changes)
            .await?
            .ok_or_else(task_not_found)
    }

    pub async fn remove(&self, user_id: Uuid, id: Uuid) -> Result<(), AppError> {
        if self.tasks.delete_for_user(user_id, id).await? {
            Ok(())
        } else {
            Err(task_not_found())
        }
    }
}
