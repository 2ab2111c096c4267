// src/dtos/ticketdtos.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::ticketmodel::{Ticket, TicketPriority, TicketStatus};

#[derive(Debug, Deserialize, Validate, Default, Clone)]
pub struct CreateTicketDto {
    #[validate(length(min = 1, max = 200, message = "Title is required"))]
    pub title: String,

    #[validate(length(min = 1, max = 5000, message = "Description is required"))]
    pub description: String,

    pub priority: Option<TicketPriority>,

    /// Department id. Required, but a value that does not parse or resolve
    /// falls back to the general bucket, matching the numbering rules.
    pub department: Option<String>,

    pub category: Option<String>,
    pub sub_category: Option<String>,

    /// Metadata only; the files themselves live in the external upload store.
    #[serde(default)]
    pub attachments: Vec<AttachmentDto>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AttachmentDto {
    pub filename: String,
    pub url: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct UpdateTicketStatusDto {
    pub status: Option<TicketStatus>,
    pub solution: Option<String>,
    pub remarks: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AddRemarkDto {
    #[validate(length(min = 1, max = 2000, message = "Remark text is required"))]
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct AssignTicketDto {
    pub assigned_to: Uuid,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SubmitFeedbackDto {
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: i32,
    pub comment: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct TicketListQuery {
    pub status: Option<TicketStatus>,
    pub priority: Option<TicketPriority>,
}

#[derive(Debug, Serialize)]
pub struct RecentTicketDto {
    pub id: Uuid,
    pub ticket_number: String,
    pub title: String,
    pub status: TicketStatus,
    pub priority: TicketPriority,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Default)]
pub struct PriorityCounts {
    pub low: usize,
    pub medium: usize,
    pub high: usize,
}

/// Aggregate counts for the dashboard, computed over the caller's scope.
#[derive(Debug, Serialize)]
pub struct TicketStatsDto {
    pub total: usize,
    pub pending: usize,
    pub assigned: usize,
    pub in_progress: usize,
    pub resolved: usize,
    pub closed: usize,
    pub by_priority: PriorityCounts,
    /// Average over resolved tickets with a recorded solve time, in minutes.
    pub avg_resolution_time: i64,
    pub recent_tickets: Vec<RecentTicketDto>,
}

impl TicketStatsDto {
    /// `tickets` must already be scoped and sorted newest first.
    pub fn from_tickets(tickets: &[Ticket]) -> Self {
        let count_status =
            |s: TicketStatus| tickets.iter().filter(|t| t.status == s).count();
        let count_priority =
            |p: TicketPriority| tickets.iter().filter(|t| t.priority == p).count();

        let solve_times: Vec<i64> = tickets
            .iter()
            .filter(|t| t.status == TicketStatus::Resolved)
            .filter_map(|t| t.time_to_solve)
            .collect();

        let avg_resolution_time = if solve_times.is_empty() {
            0
        } else {
            let total: i64 = solve_times.iter().sum();
            let avg_ms = total as f64 / solve_times.len() as f64;
            (avg_ms / 60_000.0).round() as i64
        };

        let recent_tickets = tickets
            .iter()
            .take(10)
            .map(|t| RecentTicketDto {
                id: t.id,
                ticket_number: t.ticket_number.clone(),
                title: t.title.clone(),
                status: t.status,
                priority: t.priority,
                created_at: t.created_at,
            })
            .collect();

        TicketStatsDto {
            total: tickets.len(),
            pending: count_status(TicketStatus::Pending),
            assigned: count_status(TicketStatus::Assigned),
            in_progress: count_status(TicketStatus::InProgress),
            resolved: count_status(TicketStatus::Resolved),
            closed: count_status(TicketStatus::Closed),
            by_priority: PriorityCounts {
                low: count_priority(TicketPriority::Low),
                medium: count_priority(TicketPriority::Medium),
                high: count_priority(TicketPriority::High),
            },
            avg_resolution_time,
            recent_tickets,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::types::Json;
    use validator::Validate;

    fn ticket(status: TicketStatus, priority: TicketPriority, solve_ms: Option<i64>) -> Ticket {
        let now = Utc::now();
        Ticket {
            id: Uuid::new_v4(),
            ticket_number: "T250614G001".to_string(),
            title: "t".to_string(),
            description: "d".to_string(),
            status,
            priority,
            category: None,
            sub_category: None,
            department: None,
            created_by: Uuid::new_v4(),
            assigned_to: None,
            solved_by: None,
            solved_at: None,
            time_to_solve: solve_ms,
            solution: None,
            remarks: Json(vec![]),
            attachments: Json(vec![]),
            feedback: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn stats_count_statuses_and_priorities() {
        let tickets = vec![
            ticket(TicketStatus::Pending, TicketPriority::High, None),
            ticket(TicketStatus::Pending, TicketPriority::Low, None),
            ticket(TicketStatus::InProgress, TicketPriority::Medium, None),
            ticket(TicketStatus::Resolved, TicketPriority::High, Some(120_000)),
            ticket(TicketStatus::Closed, TicketPriority::Medium, Some(60_000)),
        ];

        let stats = TicketStatsDto::from_tickets(&tickets);
        assert_eq!(stats.total, 5);
        assert_eq!(stats.pending, 2);
        assert_eq!(stats.in_progress, 1);
        assert_eq!(stats.resolved, 1);
        assert_eq!(stats.closed, 1);
        assert_eq!(stats.by_priority.high, 2);
        assert_eq!(stats.by_priority.medium, 2);
        assert_eq!(stats.by_priority.low, 1);
    }

    #[test]
    fn avg_resolution_only_counts_resolved_with_solve_time() {
        let tickets = vec![
            // 2 and 4 minutes resolved; the closed one is excluded.
            ticket(TicketStatus::Resolved, TicketPriority::Low, Some(120_000)),
            ticket(TicketStatus::Resolved, TicketPriority::Low, Some(240_000)),
            ticket(TicketStatus::Closed, TicketPriority::Low, Some(600_000)),
            ticket(TicketStatus::Resolved, TicketPriority::Low, None),
        ];

        let stats = TicketStatsDto::from_tickets(&tickets);
        assert_eq!(stats.avg_resolution_time, 3);
    }

    #[test]
    fn avg_resolution_is_zero_without_resolved_tickets() {
        let tickets = vec![ticket(TicketStatus::Pending, TicketPriority::Low, None)];
        assert_eq!(TicketStatsDto::from_tickets(&tickets).avg_resolution_time, 0);
    }

    #[test]
    fn recent_tickets_are_capped_at_ten() {
        let tickets: Vec<Ticket> = (0..15)
            .map(|_| ticket(TicketStatus::Pending, TicketPriority::Low, None))
            .collect();
        assert_eq!(TicketStatsDto::from_tickets(&tickets).recent_tickets.len(), 10);
    }

    #[test]
    fn create_dto_requires_title_and_description() {
        let dto = CreateTicketDto {
            title: "".to_string(),
            description: "broken".to_string(),
            ..Default::default()
        };
        assert!(dto.validate().is_err());

        let dto = CreateTicketDto {
            title: "Printer down".to_string(),
            description: "no toner".to_string(),
            ..Default::default()
        };
        assert!(dto.validate().is_ok());
    }

    #[test]
    fn feedback_dto_rejects_out_of_range_rating() {
        let dto = SubmitFeedbackDto {
            rating: 6,
            comment: None,
        };
        assert!(dto.validate().is_err());

        let dto = SubmitFeedbackDto {
            rating: 5,
            comment: Some("great".to_string()),
        };
        assert!(dto.validate().is_ok());
    }
}
