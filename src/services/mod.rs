//! Domain services. Every operation takes the caller's id as its first argument.

pub mod projects;
pub mod tasks;

pub use projects::ProjectService;
pub use tasks::TaskService;
