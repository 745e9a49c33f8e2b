use crate::{
    auth::Principal,
    error::AppError,
    models::{CreateProjectInput, ProjectListQuery, UpdateProjectInput},
    services::ProjectService,
};
use actix_web::{delete, get, patch, post, web, HttpResponse, Responder};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

/// Creates a project owned by the caller.
///
/// ## Responses:
/// - `201 Created`: `{ "project": ... }`.
/// - `400 Bad Request`: name missing or outside 2..80 characters.
#[post("")]
pub async fn create_project(
    service: web::Data<ProjectService>,
    principal: Principal,
    body: web::Json<CreateProjectInput>,
) -> Result<impl Responder, AppError> {
    let input = body.into_inner().normalized();
    input.validate()?;

    let project = service.create(principal.id, input).await?;
    Ok(HttpResponse::Created().json(json!({ "project": project })))
}

/// Lists the caller's projects, one page at a time.
///
/// ## Query Parameters:
/// - `page`, `pageSize`: 1-based page and size (max 50).
/// - `search`: case-insensitive substring of the name.
/// - `sortBy`: `createdAt`, `updatedAt` or `name`; `sortOrder`: `asc` or `desc`.
#[get("")]
pub async fn list_projects(
    service: web::Data<ProjectService>,
    principal: Principal,
    query: web::Query<ProjectListQuery>,
) -> Result<impl Responder, AppError> {
    let query = query.into_inner().normalized();
    query.validate()?;

    let page = service.list(principal.id, query).await?;
    Ok(HttpResponse::Ok().json(page))
}

#[get("/{id}")]
pub async fn get_project(
    service: web::Data<ProjectService>,
    principal: Principal,
    path: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let project = service.get_by_id(principal.id, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "project": project })))
}

#[patch("/{id}")]
pub async fn update_project(
    service: web::Data<ProjectService>,
    principal: Principal,
    path: web::Path<Uuid>,
    body: web::Json<UpdateProjectInput>,
) -> Result<impl Responder, AppError> {
    let input = body.into_inner().normalized();
    input.validate()?;

    let project = service
        .update(principal.id, path.into_inner(), input)
        .await?;
    Ok(HttpResponse::Ok().json(json!({ "project": project })))
}

/// Deletes the project and all of its tasks.
#[delete("/{id}")]
pub async fn delete_project(
    service: web::Data<ProjectService>,
    principal: Principal,
    path: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    service.remove(principal.id, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "ok": true })))
}
