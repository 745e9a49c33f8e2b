//! Persistence interface.
//!
//! Services depend on these traits only. Every project query is scoped by `owner_id` and
//! every task query by `user_id` inside the repository itself, so a lookup for another
//! user's resource is indistinguishable from a lookup for a missing one.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{
    NewTask, NewUser, Project, ProjectFilter, PublicUser, Task, TaskQuery, UpdateTaskInput, User,
};

pub use memory::InMemoryStore;
pub use postgres::{PgProjectRepository, PgTaskRepository, PgUserRepository};

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Looks up by normalized email, including the password digest.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<PublicUser>, AppError>;

    /// Inserts the user and returns its public fields.
    ///
    /// Fails with `EmailAlreadyInUse` when the email is taken.
    async fn create(&self, user: NewUser) -> Result<PublicUser, AppError>;
}

#[async_trait]
pub trait ProjectRepository: Send + Sync {
    async fn create(&self, owner_id: Uuid, name: &str) -> Result<Project, AppError>;

    async fn find_owned(&self, owner_id: Uuid, id: Uuid) -> Result<Option<Project>, AppError>;

    async fn list(&self, filter: &ProjectFilter) -> Result<Vec<Project>, AppError>;

    async fn count(&self, owner_id: Uuid, search: Option<&str>) -> Result<i64, AppError>;

    /// Applies the changes only when `(id, owner_id)` match; `None` otherwise.
    async fn update_owned(
        &self,
        owner_id: Uuid,
        id: Uuid,
        name: Option<&str>,
    ) -> Result<Option<Project>, AppError>;

    /// Deletes the project and its tasks. Returns `false` when nothing matched.
    async fn delete_owned(&self, owner_id: Uuid, id: Uuid) -> Result<bool, AppError>;
}

#[async_trait]
pub trait TaskRepository: Send + Sync {
    async fn create(&self, task: NewTask) -> Result<Task, AppError>;

    async fn find_for_user(&self, user_id: Uuid, id: Uuid) -> Result<Option<Task>, AppError>;

    /// Newest first.
    async fn list_for_user(&self, user_id: Uuid, query: &TaskQuery)
        -> Result<Vec<Task>, AppError>;

    async fn update_for_user(
        &self,
        user_id: Uuid,
        id: Uuid,
        changes: &UpdateTaskInput,
    ) -> Result<Option<Task>, AppError>;

    async fn delete_for_user(&self, user_id: Uuid, id: Uuid) -> Result<bool, AppError>;
}

/// The set of repositories the services are built from.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub projects: Arc<dyn ProjectRepository>,
    pub tasks: Arc<dyn TaskRepository>,
}

impl Repositories {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            users: Arc::new(PgUserRepository::new(pool.clone())),
            projects: Arc::new(PgProjectRepository::new(pool.clone())),
            tasks: Arc::new(PgTaskRepository::new(pool)),
        }
    }

    /// All three repositories backed by one shared [`InMemoryStore`].
    pub fn in_memory() -> Self {
        let store = Arc::new(InMemoryStore::default());
        Self {
            users: store.clone(),
            projects: store.clone(),
            tasks: store,
        }
    }
}
