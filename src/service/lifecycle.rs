// src/service/lifecycle.rs
//
// Pure transition logic: given the current ticket row and a requested change,
// compute the field writes. Persistence and notification stay outside.
use chrono::{DateTime, Utc};

use crate::error::{ErrorMessage, HttpError};
use crate::models::ticketmodel::{Remark, Ticket, TicketStatus, TicketUpdate};
use crate::models::usermodel::User;

/// Requested change from a PATCH /tickets/:id/status call. All parts are
/// optional and independent: a solution or remark may accompany any status,
/// or arrive with no status change at all.
#[derive(Debug, Clone, Default)]
pub struct StatusChange {
    pub status: Option<TicketStatus>,
    pub solution: Option<String>,
    pub remark: Option<String>,
}

/// Validates the transition and derives the resolution fields.
///
/// Any status value change is allowed from any non-terminal state, including
/// pending -> resolved directly. The first transition into resolved freezes
/// `solved_at`, `solved_by` and `time_to_solve`; a later re-resolution keeps
/// the original values (they are set exactly once) and emits no second
/// notification.
pub fn apply_status_change(
    ticket: &Ticket,
    change: StatusChange,
    actor: &User,
    now: DateTime<Utc>,
) -> Result<TicketUpdate, HttpError> {
    let mut update = TicketUpdate::default();

    if let Some(new_status) = change.status {
        if ticket.status.is_terminal() && new_status != ticket.status {
            return Err(HttpError::bad_request("Ticket is closed"));
        }

        update.status = Some(new_status);

        if new_status == TicketStatus::Resolved && ticket.solved_at.is_none() {
            let elapsed_ms = (now - ticket.created_at).num_milliseconds().max(0);
            update.solved_at = Some(now);
            update.solved_by = Some(actor.id);
            update.time_to_solve = Some(elapsed_ms);
            update.resolved_now = true;
        }
    }

    if let Some(solution) = change.solution {
        let solution = solution.trim();
        if !solution.is_empty() {
            update.solution = Some(solution.to_string());
        }
    }

    // Empty remark text is silently dropped, matching remark-add semantics.
    if let Some(remark) = build_remark(change.remark.as_deref(), actor, now) {
        update.remark = Some(remark);
    }

    if update.status.is_none()
        && update.solution.is_none()
        && update.remark.is_none()
    {
        return Err(HttpError::bad_request("Nothing to update"));
    }

    Ok(update)
}

/// True when this transition's resolution write actually landed: the
/// persisted row carries this actor's `solved_at`/`solved_by` rather than a
/// concurrent first resolver's. Drives the resolved notification so the
/// losing writer sends no second email.
pub fn resolution_landed(update: &TicketUpdate, persisted: &Ticket) -> bool {
    update.resolved_now
        && persisted.solved_at == update.solved_at
        && persisted.solved_by == update.solved_by
}

pub fn build_remark(text: Option<&str>, actor: &User, now: DateTime<Utc>) -> Option<Remark> {
    let text = text?.trim();
    if text.is_empty() {
        return None;
    }
    Some(Remark {
        text: text.to_string(),
        added_by: actor.id,
        added_at: now,
    })
}

/// Feedback preconditions, each with its own rejection so the caller can tell
/// them apart: invalid rating (400), not the creator (403), not resolved
/// (400), already submitted (400). The store re-checks the last two against
/// the persisted row at write time.
pub fn validate_feedback(ticket: &Ticket, actor: &User, rating: i32) -> Result<(), HttpError> {
    if !(1..=5).contains(&rating) {
        return Err(HttpError::bad_request(
            ErrorMessage::InvalidRating.to_string(),
        ));
    }

    if ticket.created_by != actor.id {
        return Err(HttpError::forbidden(
            ErrorMessage::FeedbackNotOwner.to_string(),
        ));
    }

    if ticket.status != TicketStatus::Resolved {
        return Err(HttpError::bad_request(
            ErrorMessage::FeedbackNotResolved.to_string(),
        ));
    }

    if ticket.feedback.is_some() {
        return Err(HttpError::bad_request(
            ErrorMessage::FeedbackAlreadySubmitted.to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ticketmodel::{Feedback, TicketPriority};
    use crate::models::usermodel::UserRole;
    use axum::http::StatusCode;
    use chrono::Duration;
    use sqlx::types::Json;
    use uuid::Uuid;

    fn actor(role: UserRole) -> User {
        User {
            id: Uuid::new_v4(),
            name: "Admin".to_string(),
            email: "admin@example.com".to_string(),
            password: None,
            role,
            department: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn pending_ticket(created_at: DateTime<Utc>) -> Ticket {
        Ticket {
            id: Uuid::new_v4(),
            ticket_number: "T250614I007".to_string(),
            title: "Printer down".to_string(),
            description: "no toner".to_string(),
            status: TicketStatus::Pending,
            priority: TicketPriority::High,
            category: None,
            sub_category: None,
            department: None,
            created_by: Uuid::new_v4(),
            assigned_to: None,
            solved_by: None,
            solved_at: None,
            time_to_solve: None,
            solution: None,
            remarks: Json(vec![]),
            attachments: Json(vec![]),
            feedback: None,
            created_at,
            updated_at: created_at,
        }
    }

    #[test]
    fn resolving_sets_resolution_fields_once() {
        let created = Utc::now() - Duration::hours(2);
        let ticket = pending_ticket(created);
        let admin = actor(UserRole::Admin);
        let now = Utc::now();

        let change = StatusChange {
            status: Some(TicketStatus::Resolved),
            solution: Some("Replaced the toner".to_string()),
            remark: None,
        };
        let update = apply_status_change(&ticket, change, &admin, now).unwrap();

        assert_eq!(update.status, Some(TicketStatus::Resolved));
        assert_eq!(update.solved_by, Some(admin.id));
        assert_eq!(update.solved_at, Some(now));
        assert_eq!(
            update.time_to_solve,
            Some((now - created).num_milliseconds())
        );
        assert!(update.time_to_solve.unwrap() >= 0);
        assert!(update.resolved_now);
        assert_eq!(update.solution.as_deref(), Some("Replaced the toner"));
    }

    #[test]
    fn pending_straight_to_resolved_is_allowed() {
        let ticket = pending_ticket(Utc::now());
        let change = StatusChange {
            status: Some(TicketStatus::Resolved),
            ..Default::default()
        };
        assert!(apply_status_change(&ticket, change, &actor(UserRole::Admin), Utc::now()).is_ok());
    }

    #[test]
    fn re_resolution_does_not_recompute() {
        let mut ticket = pending_ticket(Utc::now() - Duration::hours(1));
        let first_solved_at = Utc::now() - Duration::minutes(30);
        ticket.status = TicketStatus::InProgress; // reopened after a resolve
        ticket.solved_at = Some(first_solved_at);
        ticket.solved_by = Some(Uuid::new_v4());
        ticket.time_to_solve = Some(1_800_000);

        let change = StatusChange {
            status: Some(TicketStatus::Resolved),
            ..Default::default()
        };
        let update =
            apply_status_change(&ticket, change, &actor(UserRole::Admin), Utc::now()).unwrap();

        assert_eq!(update.status, Some(TicketStatus::Resolved));
        // Frozen: COALESCE in the store keeps the original values.
        assert_eq!(update.solved_at, None);
        assert_eq!(update.solved_by, None);
        assert_eq!(update.time_to_solve, None);
        assert!(!update.resolved_now);
    }

    #[test]
    fn concurrent_second_resolver_loses_and_sends_no_email() {
        let created = Utc::now() - Duration::hours(1);
        let ticket = pending_ticket(created);
        let loser = actor(UserRole::Admin);
        let now = Utc::now();

        // Both resolvers saw solved_at unset and computed resolution fields.
        let change = StatusChange {
            status: Some(TicketStatus::Resolved),
            ..Default::default()
        };
        let update = apply_status_change(&ticket, change, &loser, now).unwrap();
        assert!(update.resolved_now);

        // The store kept the first writer's values, so this writer's
        // resolution did not land.
        let winner_id = Uuid::new_v4();
        let mut persisted = ticket.clone();
        persisted.status = TicketStatus::Resolved;
        persisted.solved_at = Some(now - Duration::milliseconds(5));
        persisted.solved_by = Some(winner_id);
        persisted.time_to_solve = Some(3_595_000);

        assert!(!resolution_landed(&update, &persisted));

        // The winner's own write matches the persisted row.
        let mut won = persisted.clone();
        won.solved_at = update.solved_at;
        won.solved_by = update.solved_by;
        assert!(resolution_landed(&update, &won));
    }

    #[test]
    fn non_resolution_update_never_notifies() {
        let ticket = pending_ticket(Utc::now());
        let change = StatusChange {
            status: Some(TicketStatus::InProgress),
            ..Default::default()
        };
        let update =
            apply_status_change(&ticket, change, &actor(UserRole::Admin), Utc::now()).unwrap();

        let mut persisted = ticket.clone();
        persisted.status = TicketStatus::InProgress;
        assert!(!resolution_landed(&update, &persisted));
    }

    #[test]
    fn closed_tickets_reject_status_changes() {
        let mut ticket = pending_ticket(Utc::now());
        ticket.status = TicketStatus::Closed;

        let change = StatusChange {
            status: Some(TicketStatus::InProgress),
            ..Default::default()
        };
        let err =
            apply_status_change(&ticket, change, &actor(UserRole::Admin), Utc::now()).unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn empty_change_is_rejected() {
        let ticket = pending_ticket(Utc::now());
        let err = apply_status_change(
            &ticket,
            StatusChange::default(),
            &actor(UserRole::Admin),
            Utc::now(),
        )
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn blank_remark_is_dropped_but_status_still_applies() {
        let ticket = pending_ticket(Utc::now());
        let change = StatusChange {
            status: Some(TicketStatus::InProgress),
            solution: None,
            remark: Some("   ".to_string()),
        };
        let update =
            apply_status_change(&ticket, change, &actor(UserRole::Admin), Utc::now()).unwrap();
        assert_eq!(update.status, Some(TicketStatus::InProgress));
        assert!(update.remark.is_none());
        assert!(!update.resolved_now);
    }

    #[test]
    fn remark_is_trimmed_and_attributed() {
        let admin = actor(UserRole::Admin);
        let now = Utc::now();
        let remark = build_remark(Some("  escalating to network team  "), &admin, now).unwrap();
        assert_eq!(remark.text, "escalating to network team");
        assert_eq!(remark.added_by, admin.id);
        assert_eq!(remark.added_at, now);
    }

    #[test]
    fn feedback_rating_out_of_range_is_rejected() {
        let mut ticket = pending_ticket(Utc::now());
        ticket.status = TicketStatus::Resolved;
        let owner = actor(UserRole::User);
        let mut ticket_owned = ticket.clone();
        ticket_owned.created_by = owner.id;

        for bad in [0, 6, -1] {
            let err = validate_feedback(&ticket_owned, &owner, bad).unwrap_err();
            assert_eq!(err.status, StatusCode::BAD_REQUEST);
            assert_eq!(err.message, ErrorMessage::InvalidRating.to_string());
        }
    }

    #[test]
    fn feedback_requires_ownership() {
        let mut ticket = pending_ticket(Utc::now());
        ticket.status = TicketStatus::Resolved;
        let stranger = actor(UserRole::User);

        let err = validate_feedback(&ticket, &stranger, 5).unwrap_err();
        assert_eq!(err.status, StatusCode::FORBIDDEN);
    }

    #[test]
    fn feedback_requires_resolved_status() {
        let owner = actor(UserRole::User);
        let mut ticket = pending_ticket(Utc::now());
        ticket.created_by = owner.id;

        let err = validate_feedback(&ticket, &owner, 4).unwrap_err();
        assert_eq!(err.message, ErrorMessage::FeedbackNotResolved.to_string());
    }

    #[test]
    fn second_feedback_submission_is_rejected() {
        let owner = actor(UserRole::User);
        let mut ticket = pending_ticket(Utc::now());
        ticket.created_by = owner.id;
        ticket.status = TicketStatus::Resolved;

        assert!(validate_feedback(&ticket, &owner, 5).is_ok());

        ticket.feedback = Some(Json(Feedback {
            rating: 5,
            comment: None,
            submitted_at: Utc::now(),
        }));
        let err = validate_feedback(&ticket, &owner, 3).unwrap_err();
        assert_eq!(
            err.message,
            ErrorMessage::FeedbackAlreadySubmitted.to_string()
        );
    }
}
