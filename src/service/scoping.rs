// src/service/scoping.rs
//
// The single place role and department visibility rules live. Handlers never
// compare role strings themselves; they ask this policy.
use crate::error::{ErrorMessage, HttpError};
use crate::models::ticketmodel::Ticket;
use crate::models::usermodel::{User, UserRole};

/// Query fragment restricting which tickets a caller may list.
#[derive(Debug, Clone, PartialEq)]
pub enum TicketScope {
    /// Super-admins see everything.
    All,
    /// Admins see their own department; an admin without a department sees
    /// the general bucket.
    Department(Option<uuid::Uuid>),
    /// Users see only tickets they filed.
    Creator(uuid::Uuid),
}

pub fn scope_filter(actor: &User) -> TicketScope {
    match actor.role {
        UserRole::SuperAdmin => TicketScope::All,
        UserRole::Admin => TicketScope::Department(actor.department),
        UserRole::User => TicketScope::Creator(actor.id),
    }
}

pub fn can_view(actor: &User, ticket: &Ticket) -> bool {
    match actor.role {
        UserRole::SuperAdmin => true,
        UserRole::Admin => ticket.department == actor.department,
        UserRole::User => ticket.created_by == actor.id,
    }
}

/// Staff mutations: status changes, remarks, solution, assignment.
/// Users mutate nothing through this path (feedback has its own ownership
/// check in the lifecycle).
pub fn can_mutate(actor: &User, ticket: &Ticket) -> bool {
    match actor.role {
        UserRole::SuperAdmin => true,
        UserRole::Admin => ticket.department == actor.department,
        UserRole::User => false,
    }
}

pub fn ensure_can_view(actor: &User, ticket: &Ticket) -> Result<(), HttpError> {
    if can_view(actor, ticket) {
        Ok(())
    } else {
        Err(HttpError::forbidden(
            ErrorMessage::PermissionDenied.to_string(),
        ))
    }
}

pub fn ensure_can_mutate(actor: &User, ticket: &Ticket) -> Result<(), HttpError> {
    if can_mutate(actor, ticket) {
        Ok(())
    } else {
        Err(HttpError::forbidden(
            ErrorMessage::DepartmentAccessDenied.to_string(),
        ))
    }
}

/// Hard delete is the super-admin's exclusive right.
pub fn ensure_super_admin(actor: &User) -> Result<(), HttpError> {
    if actor.role == UserRole::SuperAdmin {
        Ok(())
    } else {
        Err(HttpError::forbidden(
            ErrorMessage::PermissionDenied.to_string(),
        ))
    }
}

/// Feedback is visible to the ticket's creator and to staff.
pub fn can_view_feedback(actor: &User, ticket: &Ticket) -> bool {
    ticket.created_by == actor.id || actor.role.is_staff()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ticketmodel::{TicketPriority, TicketStatus};
    use chrono::Utc;
    use sqlx::types::Json;
    use uuid::Uuid;

    fn user(role: UserRole, department: Option<Uuid>) -> User {
        User {
            id: Uuid::new_v4(),
            name: "Test User".to_string(),
            email: "test@example.com".to_string(),
            password: None,
            role,
            department,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn ticket(created_by: Uuid, department: Option<Uuid>) -> Ticket {
        let now = Utc::now();
        Ticket {
            id: Uuid::new_v4(),
            ticket_number: "T250614G001".to_string(),
            title: "Printer down".to_string(),
            description: "no toner".to_string(),
            status: TicketStatus::Pending,
            priority: TicketPriority::Medium,
            category: None,
            sub_category: None,
            department,
            created_by,
            assigned_to: None,
            solved_by: None,
            solved_at: None,
            time_to_solve: None,
            solution: None,
            remarks: Json(vec![]),
            attachments: Json(vec![]),
            feedback: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn user_scope_is_own_tickets_only() {
        let actor = user(UserRole::User, None);
        assert_eq!(scope_filter(&actor), TicketScope::Creator(actor.id));

        let own = ticket(actor.id, None);
        let foreign = ticket(Uuid::new_v4(), None);
        assert!(can_view(&actor, &own));
        assert!(!can_view(&actor, &foreign));
        assert!(!can_mutate(&actor, &own));
    }

    #[test]
    fn admin_scope_is_own_department() {
        let dept = Uuid::new_v4();
        let actor = user(UserRole::Admin, Some(dept));
        assert_eq!(scope_filter(&actor), TicketScope::Department(Some(dept)));

        let in_dept = ticket(Uuid::new_v4(), Some(dept));
        let other_dept = ticket(Uuid::new_v4(), Some(Uuid::new_v4()));
        assert!(can_mutate(&actor, &in_dept));
        assert!(!can_mutate(&actor, &other_dept));
        assert!(ensure_can_mutate(&actor, &other_dept).is_err());
    }

    #[test]
    fn admin_without_department_gets_general_bucket() {
        let actor = user(UserRole::Admin, None);
        assert_eq!(scope_filter(&actor), TicketScope::Department(None));
        assert!(can_mutate(&actor, &ticket(Uuid::new_v4(), None)));
        assert!(!can_mutate(&actor, &ticket(Uuid::new_v4(), Some(Uuid::new_v4()))));
    }

    #[test]
    fn super_admin_is_unrestricted() {
        let actor = user(UserRole::SuperAdmin, None);
        assert_eq!(scope_filter(&actor), TicketScope::All);
        assert!(can_mutate(&actor, &ticket(Uuid::new_v4(), Some(Uuid::new_v4()))));
        assert!(ensure_super_admin(&actor).is_ok());
    }

    #[test]
    fn only_super_admin_may_delete() {
        assert!(ensure_super_admin(&user(UserRole::Admin, None)).is_err());
        assert!(ensure_super_admin(&user(UserRole::User, None)).is_err());
    }

    #[test]
    fn feedback_visible_to_owner_and_staff() {
        let owner = user(UserRole::User, None);
        let stranger = user(UserRole::User, None);
        let admin = user(UserRole::Admin, None);
        let t = ticket(owner.id, None);

        assert!(can_view_feedback(&owner, &t));
        assert!(!can_view_feedback(&stranger, &t));
        assert!(can_view_feedback(&admin, &t));
    }
}
