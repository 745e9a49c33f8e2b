pub mod project;
pub mod task;
pub mod user;

pub use project::{
    CreateProjectInput, Project, ProjectFilter, ProjectListQuery, ProjectPage, ProjectSortBy,
    SortOrder, UpdateProjectInput,
};
pub use task::{CreateTaskInput, NewTask, Task, TaskQuery, TaskStatus, UpdateTaskInput};
pub use user::{normalize_email, NewUser, PublicUser, User};
