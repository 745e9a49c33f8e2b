//! Process-local store used by the test suite and for running without a database.

use async_trait::async_trait;
use chrono::Utc;
use std::cmp::Ordering;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use super::{ProjectRepository, TaskRepository, UserRepository};
use crate::error::AppError;
use crate::models::{
    NewTask, NewUser, Project, ProjectFilter, ProjectSortBy, PublicUser, SortOrder, Task,
    TaskQuery, UpdateTaskInput, User,
};

#[derive(Default)]
pub struct InMemoryStore {
    users: Mutex<Vec<User>>,
    projects: Mutex<Vec<Project>>,
    tasks: Mutex<Vec<Task>>,
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, AppError> {
    mutex
        .lock()
        .map_err(|_| AppError::InternalServerError("In-memory store lock poisoned".into()))
}

fn name_matches(project: &Project, search: Option<&str>) -> bool {
    match search {
        Some(term) => project
            .name
            .to_lowercase()
            .contains(&term.to_lowercase()),
        None => true,
    }
}

fn compare_projects(a: &Project, b: &Project, sort_by: ProjectSortBy) -> Ordering {
    match sort_by {
        ProjectSortBy::CreatedAt => a.created_at.cmp(&b.created_at),
        ProjectSortBy::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        ProjectSortBy::Name => a.name.cmp(&b.name),
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let users = lock(&self.users)?;
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<PublicUser>, AppError> {
        let users = lock(&self.users)?;
        Ok(users
            .iter()
            .find(|u| u.id == id)
            .cloned()
            .map(PublicUser::from))
    }

    async fn create(&self, user: NewUser) -> Result<PublicUser, AppError> {
        let mut users = lock(&self.users)?;
        if users.iter().any(|u| u.email == user.email) {
            return Err(AppError::EmailAlreadyInUse);
        }
        let record = User {
            id: Uuid::new_v4(),
            email: user.email,
            password_hash: user.password_hash,
            name: user.name,
            created_at: Utc::now(),
        };
        users.push(record.clone());
        Ok(record.into())
    }
}

#[async_trait]
impl ProjectRepository for InMemoryStore {
    async fn create(&self, owner_id: Uuid, name: &str) -> Result<Project, AppError> {
        let now = Utc::now();
        let project = Project {
            id: Uuid::new_v4(),
            name: name.to_string(),
            owner_id,
            created_at: now,
            updated_at: now,
        };
        lock(&self.projects)?.push(project.clone());
        Ok(project)
    }

    async fn find_owned(&self, owner_id: Uuid, id: Uuid) -> Result<Option<Project>, AppError> {
        let projects = lock(&self.projects)?;
        Ok(projects
            .iter()
            .find(|p| p.id == id && p.owner_id == owner_id)
            .cloned())
    }

    async fn list(&self, filter: &ProjectFilter) -> Result<Vec<Project>, AppError> {
        let projects = lock(&self.projects)?;
        let mut matching: Vec<Project> = projects
            .iter()
            .filter(|p| p.owner_id == filter.owner_id)
            .filter(|p| name_matches(p, filter.search.as_deref()))
            .cloned()
            .collect();
        matching.sort_by(|a, b| {
            let ord = compare_projects(a, b, filter.sort_by);
            let ord = match filter.sort_order {
                SortOrder::Asc => ord,
                SortOrder::Desc => ord.reverse(),
            };
            ord.then_with(|| a.id.cmp(&b.id))
        });
        Ok(matching
            .into_iter()
            .skip(filter.offset.max(0) as usize)
            .take(filter.limit.max(0) as usize)
            .collect())
    }

    async fn count(&self, owner_id: Uuid, search: Option<&str>) -> Result<i64, AppError> {
        let projects = lock(&self.projects)?;
        let total = projects
            .iter()
            .filter(|p| p.owner_id == owner_id && name_matches(p, search))
            .count();
        Ok(total as i64)
    }

    async fn update_owned(
        &self,
        owner_id: Uuid,
        id: Uuid,
        name: Option<&str>,
    ) -> Result<Option<Project>, AppError> {
        let mut projects = lock(&self.projects)?;
        let Some(project) = projects
            .iter_mut()
            .find(|p| p.id == id && p.owner_id == owner_id)
        else {
            return Ok(None);
        };
        if let Some(name) = name {
            project.name = name.to_string();
        }
        project.updated_at = Utc::now();
        Ok(Some(project.clone()))
    }

    async fn delete_owned(&self, owner_id: Uuid, id: Uuid) -> Result<bool, AppError> {
        let mut projects = lock(&self.projects)?;
        let before = projects.len();
        projects.retain(|p| !(p.id == id && p.owner_id == owner_id));
        let deleted = projects.len() < before;
        drop(projects);

        if deleted {
            lock(&self.tasks)?.retain(|t| t.project_id != id);
        }
        Ok(deleted)
    }
}

#[async_trait]
impl TaskRepository for InMemoryStore {
    async fn create(&self, task: NewTask) -> Result<Task, AppError> {
        let now = Utc::now();
        let task = Task {
            id: Uuid::new_v4(),
            title: task.title,
            status: task.status,
            project_id: task.project_id,
            user_id: task.user_id,
            created_at: now,
            updated_at: now,
        };
        lock(&self.tasks)?.push(task.clone());
        Ok(task)
    }

    async fn find_for_user(&self, user_id: Uuid, id: Uuid) -> Result<Option<Task>, AppError> {
        let tasks = lock(&self.tasks)?;
        Ok(tasks
            .iter()
            .find(|t| t.id == id && t.user_id == user_id)
            .cloned())
    }

    async fn list_for_user(
        &self,
        user_id: Uuid,
        query: &TaskQuery,
    ) -> Result<Vec<Task>, AppError> {
        let tasks = lock(&self.tasks)?;
        let mut matching: Vec<Task> = tasks
            .iter()
            .filter(|t| t.user_id == user_id)
            .filter(|t| query.project_id.map_or(true, |p| t.project_id == p))
            .filter(|t| query.status.map_or(true, |s| t.status == s))
            .cloned()
            .collect();
        // Insertion order breaks ties between tasks created within the same instant.
        matching.reverse();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matching)
    }

    async fn update_for_user(
        &self,
        user_id: Uuid,
        id: Uuid,
        changes: &UpdateTaskInput,
    ) -> Result<Option<Task>, AppError> {
        let mut tasks = lock(&self.tasks)?;
        let Some(task) = tasks
            .iter_mut()
            .find(|t| t.id == id && t.user_id == user_id)
        else {
            return Ok(None);
        };
        if let Some(title) = &changes.title {
            task.title = title.clone();
        }
        if let Some(status) = changes.status {
            task.status = status;
        }
        task.updated_at = Utc::now();
        Ok(Some(task.clone()))
    }

    async fn delete_for_user(&self, user_id: Uuid, id: Uuid) -> Result<bool, AppError> {
        let mut tasks = lock(&self.tasks)?;
        let before = tasks.len();
        tasks.retain(|t| !(t.id == id && t.user_id == user_id));
        Ok(tasks.len() < before)
    }
}
