use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{ProjectRepository, TaskRepository, UserRepository};
use crate::error::AppError;
use crate::models::{
    NewTask, NewUser, Project, ProjectFilter, PublicUser, Task, TaskQuery, UpdateTaskInput, User,
};

const PROJECT_COLUMNS: &str = "id, name, owner_id, created_at, updated_at";
const TASK_COLUMNS: &str = "id, title, status, project_id, user_id, created_at, updated_at";

/// `%term%` for `ILIKE ... ESCAPE '\'`, with the term's own wildcards escaped.
fn contains_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, password_hash, name, created_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<PublicUser>, AppError> {
        let user = sqlx::query_as::<_, PublicUser>(
            "SELECT id, email, name, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn create(&self, user: NewUser) -> Result<PublicUser, AppError> {
        sqlx::query_as::<_, PublicUser>(
            "INSERT INTO users (id, email, password_hash, name) VALUES ($1, $2, $3, $4)
             RETURNING id, email, name, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            // Two concurrent registrations can both pass the existence check.
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::EmailAlreadyInUse
            }
            other => other.into(),
        })
    }
}

pub struct PgProjectRepository {
    pool: PgPool,
}

impl PgProjectRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProjectRepository for PgProjectRepository {
    async fn create(&self, owner_id: Uuid, name: &str) -> Result<Project, AppError> {
        let sql = format!(
            "INSERT INTO projects (id, name, owner_id) VALUES ($1, $2, $3) RETURNING {}",
            PROJECT_COLUMNS
        );
        let project = sqlx::query_as::<_, Project>(&sql)
            .bind(Uuid::new_v4())
            .bind(name)
            .bind(owner_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(project)
    }

    async fn find_owned(&self, owner_id: Uuid, id: Uuid) -> Result<Option<Project>, AppError> {
        let sql = format!(
            "SELECT {} FROM projects WHERE id = $1 AND owner_id = $2",
            PROJECT_COLUMNS
        );
        let project = sqlx::query_as::<_, Project>(&sql)
            .bind(id)
            .bind(owner_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(project)
    }

    async fn list(&self, filter: &ProjectFilter) -> Result<Vec<Project>, AppError> {
        // Sort column and direction come from closed enums, never from raw input.
        let sql = format!(
            r"SELECT {} FROM projects
              WHERE owner_id = $1 AND ($2::text IS NULL OR name ILIKE $2 ESCAPE '\')
              ORDER BY {} {}, id
              LIMIT $3 OFFSET $4",
            PROJECT_COLUMNS,
            filter.sort_by.column(),
            filter.sort_order.sql()
        );
        let projects = sqlx::query_as::<_, Project>(&sql)
            .bind(filter.owner_id)
            .bind(filter.search.as_deref().map(contains_pattern))
            .bind(filter.limit)
            .bind(filter.offset)
            .fetch_all(&self.pool)
            .await?;
        Ok(projects)
    }

    async fn count(&self, owner_id: Uuid, search: Option<&str>) -> Result<i64, AppError> {
        let total = sqlx::query_scalar::<_, i64>(
            r"SELECT COUNT(*) FROM projects
              WHERE owner_id = $1 AND ($2::text IS NULL OR name ILIKE $2 ESCAPE '\')",
        )
        .bind(owner_id)
        .bind(search.map(contains_pattern))
        .fetch_one(&self.pool)
        .await?;
        Ok(total)
    }

    async fn update_owned(
        &self,
        owner_id: Uuid,
        id: Uuid,
        name: Option<&str>,
    ) -> Result<Option<Project>, AppError> {
        let sql = format!(
            "UPDATE projects SET name = COALESCE($3, name), updated_at = now()
             WHERE id = $1 AND owner_id = $2
             RETURNING {}",
            PROJECT_COLUMNS
        );
        let project = sqlx::query_as::<_, Project>(&sql)
            .bind(id)
            .bind(owner_id)
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(project)
    }

    async fn delete_owned(&self, owner_id: Uuid, id: Uuid) -> Result<bool, AppError> {
        // tasks.project_id is ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM projects WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

pub struct PgTaskRepository {
    pool: PgPool,
}

impl PgTaskRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TaskRepository for PgTaskRepository {
    async fn create(&self, task: NewTask) -> Result<Task, AppError> {
        let sql = format!(
            "INSERT INTO tasks (id, title, status, project_id, user_id)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {}",
            TASK_COLUMNS
        );
        let task = sqlx::query_as::<_, Task>(&sql)
            .bind(Uuid::new_v4())
            .bind(&task.title)
            .bind(task.status)
            .bind(task.project_id)
            .bind(task.user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(task)
    }

    async fn find_for_user(&self, user_id: Uuid, id: Uuid) -> Result<Option<Task>, AppError> {
        let sql = format!(
            "SELECT {} FROM tasks WHERE id = $1 AND user_id = $2",
            TASK_COLUMNS
        );
        let task = sqlx::query_as::<_, Task>(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(task)
    }

    async fn list_for_user(
        &self,
        user_id: Uuid,
        query: &TaskQuery,
    ) -> Result<Vec<Task>, AppError> {
        let sql = format!(
            "SELECT {} FROM tasks
             WHERE user_id = $1
               AND ($2::uuid IS NULL OR project_id = $2)
               AND ($3::task_status IS NULL OR status = $3)
             ORDER BY created_at DESC",
            TASK_COLUMNS
        );
        let tasks = sqlx::query_as::<_, Task>(&sql)
            .bind(user_id)
            .bind(query.project_id)
            .bind(query.status)
            .fetch_all(&self.pool)
            .await?;
        Ok(tasks)
    }

    async fn update_for_user(
        &self,
        user_id: Uuid,
        id: Uuid,
        changes: &UpdateTaskInput,
    ) -> Result<Option<Task>, AppError> {
        let sql = format!(
            "UPDATE tasks
             SET title = COALESCE($3, title), status = COALESCE($4, status), updated_at = now()
             WHERE id = $1 AND user_id = $2
             RETURNING {}",
            TASK_COLUMNS
        );
        let task = sqlx::query_as::<_, Task>(&sql)
            .bind(id)
            .bind(user_id)
            .bind(changes.title.as_deref())
            .bind(changes.status)
            .fetch_optional(&self.pool)
            .await?;
        Ok(task)
    }

    async fn delete_for_user(&self, user_id: Uuid, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("web"), "%web%");
        assert_eq!(contains_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(contains_pattern("a\\b"), "%a\\\\b%");
    }
}
