use crate::{
    auth::Principal,
    error::AppError,
    models::{CreateTaskInput, TaskQuery, UpdateTaskInput},
    services::TaskService,
};
use actix_web::{delete, get, patch, post, web, HttpResponse, Responder};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

/// Retrieves the authenticated user's tasks, newest first.
///
/// ## Query Parameters:
/// - `projectId` (optional): only tasks of this project.
/// - `status` (optional): `TODO`, `DOING` or `DONE`.
///
/// ## Responses:
/// - `200 OK`: a JSON array of tasks.
/// - `401 Unauthorized`: missing or invalid access token.
#[get("")]
pub async fn get_tasks(
    service: web::Data<TaskService>,
    principal: Principal,
    query: web::Query<TaskQuery>,
) -> Result<impl Responder, AppError> {
    let tasks = service.list(principal.id, &query).await?;
    Ok(HttpResponse::Ok().json(tasks))
}

/// Creates a task in one of the caller's projects.
///
/// ## Responses:
/// - `201 Created`: the new task; `status` defaults to `TODO`.
/// - `400 Bad Request`: invalid body.
/// - `404 Not Found`: the project does not exist or belongs to someone else.
#[post("")]
pub async fn create_task(
    service: web::Data<TaskService>,
    principal: Principal,
    body: web::Json<CreateTaskInput>,
) -> Result<impl Responder, AppError> {
    let input = body.into_inner();
    input.validate()?;

    let task = service.create(principal.id, input).await?;
    Ok(HttpResponse::Created().json(task))
}

#[get("/{id}")]
pub async fn get_task(
    service: web::Data<TaskService>,
    principal: Principal,
    path: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let task = service.get(principal.id, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(task))
}

/// Partially updates a task. At least one of `title` and `status` is required.
#[patch("/{id}")]
pub async fn update_task(
    service: web::Data<TaskService>,
    principal: Principal,
    path: web::Path<Uuid>,
    body: web::Json<UpdateTaskInput>,
) -> Result<impl Responder, AppError> {
    body.validate()?;

    let task = service
        .update(principal.id, path.into_inner(), &body)
        .await?;
    Ok(HttpResponse::Ok().json(task))
}

#[delete("/{id}")]
pub async fn delete_task(
    service: web::Data<TaskService>,
    principal: Principal,
    path: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    service.remove(principal.id, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "deleted": true })))
}
