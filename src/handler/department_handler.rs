// src/handler/department_handler.rs
use std::sync::Arc;

use axum::{
    extract::Path,
    handler::Handler,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
    Extension, Json, Router,
};
use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::departmentdb::DepartmentExt,
    dtos::departmentdtos::*,
    error::{map_sqlx_error, ErrorMessage, HttpError},
    middleware::role_check,
    models::{departmentmodel::Category, usermodel::UserRole},
    AppState,
};

pub fn department_handler() -> Router {
    let super_admin_only =
        |state, req, next| role_check(state, req, next, vec![UserRole::SuperAdmin]);

    Router::new()
        .route(
            "/",
            get(get_departments)
                .post(create_department.layer(middleware::from_fn(super_admin_only))),
        )
        .route(
            "/:department_id",
            get(get_department)
                .put(update_department.layer(middleware::from_fn(super_admin_only)))
                .delete(delete_department.layer(middleware::from_fn(super_admin_only))),
        )
        .route(
            "/:department_id/categories",
            post(add_category).layer(middleware::from_fn(super_admin_only)),
        )
}

pub async fn get_departments(
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let departments = app_state
        .db_client
        .get_departments()
        .await
        .map_err(|e| map_sqlx_error(e, &app_state.env.environment))?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": departments
    })))
}

pub async fn get_department(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(department_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let department = app_state
        .db_client
        .get_department(department_id)
        .await
        .map_err(|e| map_sqlx_error(e, &app_state.env.environment))?
        .ok_or_else(|| HttpError::not_found(ErrorMessage::DepartmentNotFound.to_string()))?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": department
    })))
}

pub async fn create_department(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<CreateDepartmentDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let categories = body
        .categories
        .into_iter()
        .map(new_category)
        .collect::<Vec<_>>();

    let department = app_state
        .db_client
        .create_department(body.name.trim().to_string(), body.description, categories)
        .await
        .map_err(|e| map_sqlx_error(e, &app_state.env.environment))?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "status": "success",
            "data": department
        })),
    ))
}

pub async fn update_department(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(department_id): Path<Uuid>,
    Json(body): Json<UpdateDepartmentDto>,
) -> Result<impl IntoResponse, HttpError> {
    let department = app_state
        .db_client
        .update_department(department_id, body.name, body.description)
        .await
        .map_err(|e| map_sqlx_error(e, &app_state.env.environment))?
        .ok_or_else(|| HttpError::not_found(ErrorMessage::DepartmentNotFound.to_string()))?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": department
    })))
}

pub async fn delete_department(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(department_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let deleted = app_state
        .db_client
        .delete_department(department_id)
        .await
        .map_err(|e| map_sqlx_error(e, &app_state.env.environment))?;

    if deleted == 0 {
        return Err(HttpError::not_found(
            ErrorMessage::DepartmentNotFound.to_string(),
        ));
    }

    Ok(Json(serde_json::json!({
        "status": "success",
        "message": "Department deleted successfully"
    })))
}

pub async fn add_category(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(department_id): Path<Uuid>,
    Json(body): Json<CreateCategoryDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let department = app_state
        .db_client
        .add_category(department_id, new_category(body))
        .await
        .map_err(|e| map_sqlx_error(e, &app_state.env.environment))?
        .ok_or_else(|| HttpError::not_found(ErrorMessage::DepartmentNotFound.to_string()))?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": department
    })))
}

fn new_category(dto: CreateCategoryDto) -> Category {
    Category {
        id: Uuid::new_v4(),
        name: dto.name.trim().to_string(),
        description: dto.description,
        sub_categories: dto.sub_categories,
        created_at: Utc::now(),
    }
}
