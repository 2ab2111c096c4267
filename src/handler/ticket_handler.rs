// src/handler/ticket_handler.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, patch, post},
    Extension, Json, Router,
};
use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::{departmentdb::DepartmentExt, ticketdb::NewTicket, ticketdb::TicketExt},
    dtos::ticketdtos::*,
    error::{map_sqlx_error, ErrorMessage, HttpError},
    middleware::{role_check, JWTAuthMiddleware},
    models::{
        ticketmodel::{Attachment, Feedback, Ticket},
        usermodel::UserRole,
    },
    service::{
        lifecycle::{self, StatusChange},
        notification::TicketEvent,
        scoping,
    },
    AppState,
};

pub fn ticket_handler() -> Router {
    let staff_only = |state, req, next| {
        role_check(
            state,
            req,
            next,
            vec![UserRole::Admin, UserRole::SuperAdmin],
        )
    };

    Router::new()
        .route("/", get(get_tickets).post(create_ticket))
        // JSON alias kept for client compatibility; same handler either way.
        .route("/json", post(create_ticket))
        .route("/dashboard/stats", get(get_ticket_stats))
        .route("/:ticket_id", get(get_ticket).delete(delete_ticket))
        .route(
            "/:ticket_id/status",
            patch(update_ticket_status).layer(middleware::from_fn(staff_only)),
        )
        .route(
            "/:ticket_id/remarks",
            post(add_remark).layer(middleware::from_fn(staff_only)),
        )
        .route(
            "/:ticket_id/assign",
            post(assign_ticket).layer(middleware::from_fn(staff_only)),
        )
        .route(
            "/:ticket_id/feedback",
            post(submit_feedback).get(get_feedback),
        )
}

pub async fn create_ticket(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddleware>,
    Json(body): Json<CreateTicketDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let title = body.title.trim().to_string();
    let description = body.description.trim().to_string();
    if title.is_empty() {
        return Err(HttpError::bad_request("Title is required"));
    }
    if description.is_empty() {
        return Err(HttpError::bad_request("Description is required"));
    }

    let department_field = body
        .department
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| HttpError::bad_request("Department is required"))?
        .to_string();

    // A malformed or unknown department id falls back to the general bucket
    // rather than failing the request.
    let department = match Uuid::parse_str(&department_field) {
        Ok(id) => app_state
            .db_client
            .get_department(id)
            .await
            .map_err(|e| map_sqlx_error(e, &app_state.env.environment))?,
        Err(_) => None,
    };

    let ticket_number = app_state.allocator.allocate(department.as_ref()).await?;

    let now = Utc::now();
    let attachments = body
        .attachments
        .into_iter()
        .map(|a| Attachment {
            filename: a.filename,
            url: a.url,
            uploaded_at: now,
        })
        .collect();

    let created = app_state
        .db_client
        .create_ticket(NewTicket {
            ticket_number,
            title,
            description,
            priority: body.priority.unwrap_or_default(),
            category: body.category,
            sub_category: body.sub_category,
            department: department.as_ref().map(|d| d.id),
            created_by: auth.user.id,
            attachments,
        })
        .await
        .map_err(|e| map_sqlx_error(e, &app_state.env.environment))?;

    tracing::info!("ticket {} created by {}", created.ticket_number, auth.user.id);

    // Queued only after the row is durably committed.
    app_state.notifications.notify(TicketEvent::Created {
        to: auth.user.email.clone(),
        ticket: created.clone(),
        department_name: department.map(|d| d.name),
    });

    let ticket = fetch_with_refs(&app_state, created.id).await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "status": "success",
            "data": ticket
        })),
    ))
}

pub async fn get_tickets(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddleware>,
    Query(params): Query<TicketListQuery>,
) -> Result<impl IntoResponse, HttpError> {
    let scope = scoping::scope_filter(&auth.user);

    let tickets = app_state
        .db_client
        .list_tickets(&scope, params.status, params.priority)
        .await
        .map_err(|e| map_sqlx_error(e, &app_state.env.environment))?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": tickets
    })))
}

pub async fn get_ticket(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddleware>,
    Path(ticket_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let ticket = fetch_with_refs(&app_state, ticket_id).await?;

    scoping::ensure_can_view(&auth.user, &ticket.ticket)?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": ticket
    })))
}

pub async fn update_ticket_status(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddleware>,
    Path(ticket_id): Path<Uuid>,
    Json(body): Json<UpdateTicketStatusDto>,
) -> Result<impl IntoResponse, HttpError> {
    let ticket = fetch_ticket(&app_state, ticket_id).await?;

    scoping::ensure_can_mutate(&auth.user, &ticket)?;

    let update = lifecycle::apply_status_change(
        &ticket,
        StatusChange {
            status: body.status,
            solution: body.solution,
            remark: body.remarks,
        },
        &auth.user,
        Utc::now(),
    )?;

    let persisted = app_state
        .db_client
        .apply_ticket_update(ticket_id, &update)
        .await
        .map_err(|e| map_sqlx_error(e, &app_state.env.environment))?
        .ok_or_else(|| HttpError::not_found(ErrorMessage::TicketNotFound.to_string()))?;

    let updated = fetch_with_refs(&app_state, ticket_id).await?;

    // The store keeps the first resolver's fields; only the writer whose
    // resolution landed notifies the filer.
    if lifecycle::resolution_landed(&update, &persisted) {
        app_state.notifications.notify(TicketEvent::Resolved {
            to: updated.created_by_email.clone(),
            ticket: updated.ticket.clone(),
            resolver_name: auth.user.name.clone(),
        });
    }

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": updated
    })))
}

pub async fn add_remark(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddleware>,
    Path(ticket_id): Path<Uuid>,
    Json(body): Json<AddRemarkDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let ticket = fetch_ticket(&app_state, ticket_id).await?;

    scoping::ensure_can_mutate(&auth.user, &ticket)?;

    let remark = lifecycle::build_remark(Some(&body.text), &auth.user, Utc::now())
        .ok_or_else(|| HttpError::bad_request("Remark text is required"))?;

    app_state
        .db_client
        .append_remark(ticket_id, remark)
        .await
        .map_err(|e| map_sqlx_error(e, &app_state.env.environment))?
        .ok_or_else(|| HttpError::not_found(ErrorMessage::TicketNotFound.to_string()))?;

    let updated = fetch_with_refs(&app_state, ticket_id).await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": updated
    })))
}

pub async fn assign_ticket(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddleware>,
    Path(ticket_id): Path<Uuid>,
    Json(body): Json<AssignTicketDto>,
) -> Result<impl IntoResponse, HttpError> {
    let ticket = fetch_ticket(&app_state, ticket_id).await?;

    scoping::ensure_can_mutate(&auth.user, &ticket)?;

    app_state
        .db_client
        .assign_ticket(ticket_id, body.assigned_to)
        .await
        .map_err(|e| map_sqlx_error(e, &app_state.env.environment))?
        .ok_or_else(|| HttpError::not_found(ErrorMessage::TicketNotFound.to_string()))?;

    let updated = fetch_with_refs(&app_state, ticket_id).await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": updated
    })))
}

pub async fn submit_feedback(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddleware>,
    Path(ticket_id): Path<Uuid>,
    Json(body): Json<SubmitFeedbackDto>,
) -> Result<impl IntoResponse, HttpError> {
    let ticket = fetch_ticket(&app_state, ticket_id).await?;

    lifecycle::validate_feedback(&ticket, &auth.user, body.rating)?;

    let feedback = Feedback {
        rating: body.rating,
        comment: body
            .comment
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty()),
        submitted_at: Utc::now(),
    };

    // The guarded write re-checks status and prior feedback against the
    // persisted row, so a concurrent duplicate loses here rather than
    // overwriting.
    app_state
        .db_client
        .set_feedback(ticket_id, feedback)
        .await
        .map_err(|e| map_sqlx_error(e, &app_state.env.environment))?
        .ok_or_else(|| {
            HttpError::bad_request(ErrorMessage::FeedbackAlreadySubmitted.to_string())
        })?;

    let updated = fetch_with_refs(&app_state, ticket_id).await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": updated
    })))
}

pub async fn get_feedback(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddleware>,
    Path(ticket_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let ticket = fetch_ticket(&app_state, ticket_id).await?;

    if !scoping::can_view_feedback(&auth.user, &ticket) {
        return Err(HttpError::forbidden(
            ErrorMessage::PermissionDenied.to_string(),
        ));
    }

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": ticket.feedback
    })))
}

pub async fn get_ticket_stats(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddleware>,
) -> Result<impl IntoResponse, HttpError> {
    let scope = scoping::scope_filter(&auth.user);

    let tickets = app_state
        .db_client
        .list_tickets_plain(&scope)
        .await
        .map_err(|e| map_sqlx_error(e, &app_state.env.environment))?;

    let stats = TicketStatsDto::from_tickets(&tickets);

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": stats
    })))
}

pub async fn delete_ticket(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddleware>,
    Path(ticket_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    scoping::ensure_super_admin(&auth.user)?;

    let deleted = app_state
        .db_client
        .delete_ticket(ticket_id)
        .await
        .map_err(|e| map_sqlx_error(e, &app_state.env.environment))?;

    if deleted == 0 {
        return Err(HttpError::not_found(ErrorMessage::TicketNotFound.to_string()));
    }

    Ok(Json(serde_json::json!({
        "status": "success",
        "message": "Ticket deleted successfully"
    })))
}

async fn fetch_ticket(app_state: &AppState, ticket_id: Uuid) -> Result<Ticket, HttpError> {
    app_state
        .db_client
        .get_ticket(ticket_id)
        .await
        .map_err(|e| map_sqlx_error(e, &app_state.env.environment))?
        .ok_or_else(|| HttpError::not_found(ErrorMessage::TicketNotFound.to_string()))
}

async fn fetch_with_refs(
    app_state: &AppState,
    ticket_id: Uuid,
) -> Result<crate::models::ticketmodel::TicketWithRefs, HttpError> {
    app_state
        .db_client
        .get_ticket_with_refs(ticket_id)
        .await
        .map_err(|e| map_sqlx_error(e, &app_state.env.environment))?
        .ok_or_else(|| HttpError::not_found(ErrorMessage::TicketNotFound.to_string()))
}
