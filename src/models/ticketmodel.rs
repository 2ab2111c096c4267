use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "ticket_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    Pending,
    Assigned,
    InProgress,
    Resolved,
    Closed,
}

impl TicketStatus {
    pub fn to_str(&self) -> &str {
        match self {
            TicketStatus::Pending => "pending",
            TicketStatus::Assigned => "assigned",
            TicketStatus::InProgress => "in_progress",
            TicketStatus::Resolved => "resolved",
            TicketStatus::Closed => "closed",
        }
    }

    /// Closed is the only terminal state; resolved tickets still accept
    /// feedback from their creator.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TicketStatus::Closed)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "ticket_priority", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TicketPriority {
    Low,
    Medium,
    High,
}

impl Default for TicketPriority {
    fn default() -> Self {
        TicketPriority::Medium
    }
}

/// Append-only audit-trail entry. Remarks are never edited or removed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Remark {
    pub text: String,
    pub added_by: Uuid,
    pub added_at: DateTime<Utc>,
}

/// Attachment metadata captured at creation. The files themselves live in an
/// external upload store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attachment {
    pub filename: String,
    pub url: String,
    pub uploaded_at: DateTime<Utc>,
}

/// One-time rating the creator leaves on a resolved ticket.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Feedback {
    pub rating: i32,
    pub comment: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Ticket {
    pub id: Uuid,
    /// Human-readable identifier, `T{YY}{MM}{DD}{DeptInitial}{seq}`.
    /// Unique and immutable once assigned.
    pub ticket_number: String,
    pub title: String,
    pub description: String,
    pub status: TicketStatus,
    pub priority: TicketPriority,
    pub category: Option<String>,
    pub sub_category: Option<String>,
    pub department: Option<Uuid>,
    pub created_by: Uuid,
    pub assigned_to: Option<Uuid>,
    pub solved_by: Option<Uuid>,
    pub solved_at: Option<DateTime<Utc>>,
    /// Milliseconds from created_at to solved_at, set on first resolution.
    pub time_to_solve: Option<i64>,
    pub solution: Option<String>,
    pub remarks: Json<Vec<Remark>>,
    pub attachments: Json<Vec<Attachment>>,
    pub feedback: Option<Json<Feedback>>,

    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,

    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

/// Field writes computed by the lifecycle state machine for one transition.
/// Applied in a single UPDATE so the resolution fields land atomically with
/// the status change.
#[derive(Debug, Clone, Default)]
pub struct TicketUpdate {
    pub status: Option<TicketStatus>,
    pub solution: Option<String>,
    pub solved_at: Option<DateTime<Utc>>,
    pub solved_by: Option<Uuid>,
    pub time_to_solve: Option<i64>,
    pub remark: Option<Remark>,
    /// True only on the first transition into resolved; drives the
    /// resolved notification.
    pub resolved_now: bool,
}

/// Ticket with its user/department references resolved into display fields.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TicketWithRefs {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub ticket: Ticket,
    pub created_by_name: String,
    pub created_by_email: String,
    pub assigned_to_name: Option<String>,
    pub solved_by_name: Option<String>,
    pub department_name: Option<String>,
}
