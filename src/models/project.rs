use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// A project owned by exactly one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of `POST /api/projects`.
#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct CreateProjectInput {
    #[validate(length(min = 2, max = 80, message = "Name must be between 2 and 80 characters"))]
    pub name: String,
}

impl CreateProjectInput {
    pub fn normalized(self) -> Self {
        Self {
            name: self.name.trim().to_string(),
        }
    }
}

/// Body of `PATCH /api/projects/{id}`. At least one field must be present.
#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
#[validate(schema(function = "validate_project_changes"))]
pub struct UpdateProjectInput {
    #[validate(length(min = 2, max = 80, message = "Name must be between 2 and 80 characters"))]
    pub name: Option<String>,
}

impl UpdateProjectInput {
    pub fn normalized(self) -> Self {
        Self {
            name: self.name.map(|n| n.trim().to_string()),
        }
    }
}

fn validate_project_changes(input: &UpdateProjectInput) -> Result<(), ValidationError> {
    if input.name.is_none() {
        let mut err = ValidationError::new("empty_update");
        err.message = Some("At least one field must be provided".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProjectSortBy {
    #[default]
    CreatedAt,
    UpdatedAt,
    Name,
}

impl ProjectSortBy {
    pub fn column(&self) -> &'static str {
        match self {
            ProjectSortBy::CreatedAt => "created_at",
            ProjectSortBy::UpdatedAt => "updated_at",
            ProjectSortBy::Name => "name",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

fn default_page() -> u32 {
    1
}

fn default_page_size() -> u32 {
    10
}

/// Query string of `GET /api/projects`.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ProjectListQuery {
    #[serde(default = "default_page")]
    #[validate(range(min = 1, message = "Page must be at least 1"))]
    pub page: u32,
    #[serde(default = "default_page_size")]
    #[validate(range(min = 1, max = 50, message = "Page size must be between 1 and 50"))]
    pub page_size: u32,
    #[validate(length(min = 1, max = 80, message = "Search must be between 1 and 80 characters"))]
    pub search: Option<String>,
    #[serde(default)]
    pub sort_by: ProjectSortBy,
    #[serde(default)]
    pub sort_order: SortOrder,
}

impl Default for ProjectListQuery {
    fn default() -> Self {
        Self {
            page: default_page(),
            page_size: default_page_size(),
            search: None,
            sort_by: ProjectSortBy::default(),
            sort_order: SortOrder::default(),
        }
    }
}

impl ProjectListQuery {
    pub fn normalized(self) -> Self {
        Self {
            search: self.search.map(|s| s.trim().to_string()),
            ..self
        }
    }
}

/// Repository-level listing parameters, always scoped to one owner.
#[derive(Debug, Clone)]
pub struct ProjectFilter {
    pub owner_id: Uuid,
    pub search: Option<String>,
    pub sort_by: ProjectSortBy,
    pub sort_order: SortOrder,
    pub offset: i64,
    pub limit: i64,
}

/// One page of projects plus totals.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectPage {
    pub items: Vec<Project>,
    pub page: u32,
    pub page_size: u32,
    pub total: i64,
    pub total_pages: i64,
}
