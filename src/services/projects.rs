use std::sync::Arc;

use uuid::Uuid;

use crate::error::AppError;
use crate::models::{
    CreateProjectInput, Project, ProjectFilter, ProjectListQuery, ProjectPage, UpdateProjectInput,
};
use crate::repository::ProjectRepository;

fn project_not_found() -> AppError {
    AppError::NotFound("Project not found".into())
}

/// Project CRUD scoped to a single owner.
///
/// Inputs reach this layer already validated and normalized.
pub struct ProjectService {
    projects: Arc<dyn ProjectRepository>,
}

impl ProjectService {
    pub fn new(projects: Arc<dyn ProjectRepository>) -> Self {
        Self { projects }
    }

    pub async fn create(
        &self,
        owner_id: Uuid,
        input: CreateProjectInput,
    ) -> Result<Project, AppError> {
        self.projects.create(owner_id, &input.name).await
    }

    pub async fn list(
        &self,
        owner_id: Uuid,
        query: ProjectListQuery,
    ) -> Result<ProjectPage, AppError> {
        let page = query.page.max(1);
        let page_size = query.page_size.max(1);
        let filter = ProjectFilter {
            owner_id,
            search: query.search,
            sort_by: query.sort_by,
            sort_order: query.sort_order,
            offset: (i64::from(page) - 1) * i64::from(page_size),
            limit: i64::from(page_size),
        };

        let (items, total) = futures::try_join!(
            self.projects.list(&filter),
            self.projects.count(owner_id, filter.search.as_deref()),
        )?;

        let size = i64::from(page_size);
        Ok(ProjectPage {
            items,
            page,
            page_size,
            total,
            total_pages: (total + size - 1) / size,
        })
    }

    pub async fn get_by_id(&self, owner_id: Uuid, id: Uuid) -> Result<Project, AppError> {
        self.projects
            .find_owned(owner_id, id)
            .await?
            .ok_or_else(project_not_found)
    }

    pub async fn update(
        &self,
        owner_id: Uuid,
        id: Uuid,
        input: UpdateProjectInput,
    ) -> Result<Project, AppError> {
        self.projects
            .update_owned(owner_id, id, input.name.as_deref())
            .await?
            .ok_or_else(project_not_found)
    }

    /// Deletes the project together with its tasks.
    pub async fn remove(&self, owner_id: Uuid, id: Uuid) -> Result<(), AppError> {
        if self.projects.delete_owned(owner_id, id).await? {
            Ok(())
        } else {
            Err(project_not_found())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryStore;

    fn service() -> ProjectService {
        ProjectService::new(Arc::new(InMemoryStore::default()))
    }

    fn named(name: &str) -> CreateProjectInput {
        CreateProjectInput { name: name.into() }
    }

    #[actix_rt::test]
    async fn test_list_reports_totals() {
        let projects = service();
        let owner = Uuid::new_v4();
        for i in 0..5 {
            projects
                .create(owner, named(&format!("Project {}", i)))
                .await
                .unwrap();
        }

        let page = projects
            .list(
                owner,
                ProjectListQuery {
                    page: 3,
                    page_size: 2,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(page.total, 5);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.items.len(), 1);

        let empty = projects
            .list(Uuid::new_v4(), ProjectListQuery::default())
            .await
            .unwrap();
        assert_eq!(empty.total, 0);
        assert_eq!(empty.total_pages, 0);
        assert!(empty.items.is_empty());
    }

    #[actix_rt::test]
    async fn test_foreign_project_is_not_found() {
        let projects = service();
        let owner = Uuid::new_v4();
        let stranger = Uuid::new_v4();
        let project = projects.create(owner, named("Mine")).await.unwrap();

        let err = projects.get_by_id(stranger, project.id).await.unwrap_err();
        assert_eq!(err.public_message(), "Project not found");

        let rename = UpdateProjectInput {
            name: Some("Theirs".into()),
        };
        assert!(projects.update(stranger, project.id, rename).await.is_err());
        assert!(projects.remove(stranger, project.id).await.is_err());

        let unchanged = projects.get_by_id(owner, project.id).await.unwrap();
        assert_eq!(unchanged.name, "Mine");
    }
}
