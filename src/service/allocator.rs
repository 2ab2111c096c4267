// src/service/allocator.rs
use std::sync::Arc;

use chrono::{NaiveDate, Utc};

use crate::db::db::DBClient;
use crate::db::ticketdb::TicketExt;
use crate::error::{map_sqlx_error, HttpError};
use crate::models::departmentmodel::Department;

/// Assigns the human-readable ticket number: `T{YY}{MM}{DD}{DeptInitial}{seq}`,
/// e.g. `T250614I007`. The sequence is per calendar day and department, taken
/// from an atomic upsert-and-increment counter row, so concurrent creations
/// never compute the same number. The unique index on `tickets.ticket_number`
/// remains the backstop: if a duplicate ever reaches the store it fails as a
/// retryable conflict instead of persisting silently.
#[derive(Debug, Clone)]
pub struct TicketNumberAllocator {
    db_client: Arc<DBClient>,
    environment: String,
}

impl TicketNumberAllocator {
    pub fn new(db_client: Arc<DBClient>, environment: String) -> Self {
        TicketNumberAllocator {
            db_client,
            environment,
        }
    }

    /// Tickets without a department (or whose department reference did not
    /// resolve) fall into the general bucket, code `G`. If the counter query
    /// fails the whole creation fails; no ticket is persisted without a
    /// number.
    pub async fn allocate(&self, department: Option<&Department>) -> Result<String, HttpError> {
        let today = Utc::now().date_naive();
        let initial = department.map(|d| d.number_code()).unwrap_or('G');

        let seq = self
            .db_client
            .next_ticket_sequence(today, department.map(|d| d.id))
            .await
            .map_err(|e| map_sqlx_error(e, &self.environment))?;

        Ok(format_ticket_number(today, initial, seq))
    }
}

/// Zero-pads to three digits; a department that files more than 999 tickets
/// in one day simply gets a wider number. Accepted behavior.
pub fn format_ticket_number(day: NaiveDate, dept_initial: char, seq: i64) -> String {
    format!("T{}{}{:03}", day.format("%y%m%d"), dept_initial, seq)
}
