// src/db/ticketdb.rs
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::types::Json;
use sqlx::{Error, QueryBuilder};
use uuid::Uuid;

use super::db::DBClient;
use crate::models::ticketmodel::{
    Attachment, Feedback, Remark, Ticket, TicketPriority, TicketStatus, TicketUpdate,
    TicketWithRefs,
};
use crate::service::scoping::TicketScope;

/// Fields persisted at creation. The ticket number is allocated before this
/// struct is built; everything here is immutable by the filer afterwards.
#[derive(Debug, Clone)]
pub struct NewTicket {
    pub ticket_number: String,
    pub title: String,
    pub description: String,
    pub priority: TicketPriority,
    pub category: Option<String>,
    pub sub_category: Option<String>,
    pub department: Option<Uuid>,
    pub created_by: Uuid,
    pub attachments: Vec<Attachment>,
}

const TICKET_WITH_REFS_SELECT: &str = r#"
SELECT t.*,
       cu.name  AS created_by_name,
       cu.email AS created_by_email,
       au.name  AS assigned_to_name,
       su.name  AS solved_by_name,
       d.name   AS department_name
FROM tickets t
JOIN users cu ON t.created_by = cu.id
LEFT JOIN users au ON t.assigned_to = au.id
LEFT JOIN users su ON t.solved_by = su.id
LEFT JOIN departments d ON t.department = d.id
"#;

#[async_trait]
pub trait TicketExt {
    /// Atomic per-(day, department) sequence. The general bucket is keyed by
    /// the nil uuid. The upsert-and-increment runs as a single statement, so
    /// two concurrent creations can never observe the same value.
    async fn next_ticket_sequence(
        &self,
        day: NaiveDate,
        department: Option<Uuid>,
    ) -> Result<i64, Error>;

    async fn create_ticket(&self, new_ticket: NewTicket) -> Result<Ticket, Error>;

    async fn get_ticket(&self, ticket_id: Uuid) -> Result<Option<Ticket>, Error>;

    async fn get_ticket_with_refs(&self, ticket_id: Uuid)
        -> Result<Option<TicketWithRefs>, Error>;

    async fn list_tickets(
        &self,
        scope: &TicketScope,
        status: Option<TicketStatus>,
        priority: Option<TicketPriority>,
    ) -> Result<Vec<TicketWithRefs>, Error>;

    /// Scoped rows without reference population, for stats aggregation.
    async fn list_tickets_plain(&self, scope: &TicketScope) -> Result<Vec<Ticket>, Error>;

    /// The resolution columns keep their first value even here: the UPDATE
    /// prefers the existing `solved_at`/`solved_by`/`time_to_solve`, so a
    /// concurrent second resolver cannot overwrite them. The returned row
    /// shows whose write landed.
    async fn apply_ticket_update(
        &self,
        ticket_id: Uuid,
        update: &TicketUpdate,
    ) -> Result<Option<Ticket>, Error>;

    /// Atomic append to the remarks array; concurrent appends are never lost.
    async fn append_remark(&self, ticket_id: Uuid, remark: Remark)
        -> Result<Option<Ticket>, Error>;

    /// Guarded write: succeeds only while the row is resolved and has no
    /// feedback yet, evaluated against the persisted state at write time.
    async fn set_feedback(
        &self,
        ticket_id: Uuid,
        feedback: Feedback,
    ) -> Result<Option<Ticket>, Error>;

    async fn assign_ticket(
        &self,
        ticket_id: Uuid,
        assigned_to: Uuid,
    ) -> Result<Option<Ticket>, Error>;

    async fn delete_ticket(&self, ticket_id: Uuid) -> Result<u64, Error>;
}

#[async_trait]
impl TicketExt for DBClient {
    async fn next_ticket_sequence(
        &self,
        day: NaiveDate,
        department: Option<Uuid>,
    ) -> Result<i64, Error> {
        let seq: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO ticket_counters (day, department, seq)
            VALUES ($1, $2, 1)
            ON CONFLICT (day, department)
            DO UPDATE SET seq = ticket_counters.seq + 1
            RETURNING seq
            "#,
        )
        .bind(day)
        .bind(department.unwrap_or(Uuid::nil()))
        .fetch_one(&self.pool)
        .await?;

        Ok(seq)
    }

    async fn create_ticket(&self, new_ticket: NewTicket) -> Result<Ticket, Error> {
        let ticket = sqlx::query_as::<_, Ticket>(
            r#"
            INSERT INTO tickets
                (ticket_number, title, description, priority, category,
                 sub_category, department, created_by, attachments, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 'pending')
            RETURNING *
            "#,
        )
        .bind(new_ticket.ticket_number)
        .bind(new_ticket.title)
        .bind(new_ticket.description)
        .bind(new_ticket.priority)
        .bind(new_ticket.category)
        .bind(new_ticket.sub_category)
        .bind(new_ticket.department)
        .bind(new_ticket.created_by)
        .bind(Json(new_ticket.attachments))
        .fetch_one(&self.pool)
        .await?;

        Ok(ticket)
    }

    async fn get_ticket(&self, ticket_id: Uuid) -> Result<Option<Ticket>, Error> {
        let ticket = sqlx::query_as::<_, Ticket>(
            r#"
            SELECT * FROM tickets
            WHERE id = $1
            "#,
        )
        .bind(ticket_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(ticket)
    }

    async fn get_ticket_with_refs(
        &self,
        ticket_id: Uuid,
    ) -> Result<Option<TicketWithRefs>, Error> {
        let query = format!("{} WHERE t.id = $1", TICKET_WITH_REFS_SELECT);

        let ticket = sqlx::query_as::<_, TicketWithRefs>(&query)
            .bind(ticket_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(ticket)
    }

    async fn list_tickets(
        &self,
        scope: &TicketScope,
        status: Option<TicketStatus>,
        priority: Option<TicketPriority>,
    ) -> Result<Vec<TicketWithRefs>, Error> {
        let mut qb = QueryBuilder::new(TICKET_WITH_REFS_SELECT);
        qb.push(" WHERE TRUE");

        push_scope(&mut qb, scope);

        if let Some(status) = status {
            qb.push(" AND t.status = ").push_bind(status);
        }
        if let Some(priority) = priority {
            qb.push(" AND t.priority = ").push_bind(priority);
        }

        qb.push(" ORDER BY t.created_at DESC");

        let tickets = qb
            .build_query_as::<TicketWithRefs>()
            .fetch_all(&self.pool)
            .await?;

        Ok(tickets)
    }

    async fn list_tickets_plain(&self, scope: &TicketScope) -> Result<Vec<Ticket>, Error> {
        let mut qb = QueryBuilder::new("SELECT t.* FROM tickets t WHERE TRUE");

        push_scope(&mut qb, scope);
        qb.push(" ORDER BY t.created_at DESC");

        let tickets = qb.build_query_as::<Ticket>().fetch_all(&self.pool).await?;

        Ok(tickets)
    }

    async fn apply_ticket_update(
        &self,
        ticket_id: Uuid,
        update: &TicketUpdate,
    ) -> Result<Option<Ticket>, Error> {
        let remark = update.remark.clone().map(Json);

        let ticket = sqlx::query_as::<_, Ticket>(
            r#"
            UPDATE tickets
            SET status        = COALESCE($2, status),
                solution      = COALESCE($3, solution),
                solved_at     = COALESCE(solved_at, $4),
                solved_by     = COALESCE(solved_by, $5),
                time_to_solve = COALESCE(time_to_solve, $6),
                remarks       = CASE WHEN $7::jsonb IS NULL
                                     THEN remarks
                                     ELSE remarks || $7::jsonb END,
                updated_at    = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(ticket_id)
        .bind(update.status)
        .bind(update.solution.clone())
        .bind(update.solved_at)
        .bind(update.solved_by)
        .bind(update.time_to_solve)
        .bind(remark)
        .fetch_optional(&self.pool)
        .await?;

        Ok(ticket)
    }

    async fn append_remark(
        &self,
        ticket_id: Uuid,
        remark: Remark,
    ) -> Result<Option<Ticket>, Error> {
        let ticket = sqlx::query_as::<_, Ticket>(
            r#"
            UPDATE tickets
            SET remarks = remarks || $2,
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(ticket_id)
        .bind(Json(remark))
        .fetch_optional(&self.pool)
        .await?;

        Ok(ticket)
    }

    async fn set_feedback(
        &self,
        ticket_id: Uuid,
        feedback: Feedback,
    ) -> Result<Option<Ticket>, Error> {
        let ticket = sqlx::query_as::<_, Ticket>(
            r#"
            UPDATE tickets
            SET feedback = $2,
                updated_at = now()
            WHERE id = $1
              AND status = 'resolved'
              AND feedback IS NULL
            RETURNING *
            "#,
        )
        .bind(ticket_id)
        .bind(Json(feedback))
        .fetch_optional(&self.pool)
        .await?;

        Ok(ticket)
    }

    async fn assign_ticket(
        &self,
        ticket_id: Uuid,
        assigned_to: Uuid,
    ) -> Result<Option<Ticket>, Error> {
        let ticket = sqlx::query_as::<_, Ticket>(
            r#"
            UPDATE tickets
            SET assigned_to = $2,
                status = CASE WHEN status = 'pending' THEN 'assigned'::ticket_status
                              ELSE status END,
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(ticket_id)
        .bind(assigned_to)
        .fetch_optional(&self.pool)
        .await?;

        Ok(ticket)
    }

    async fn delete_ticket(&self, ticket_id: Uuid) -> Result<u64, Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM tickets
            WHERE id = $1
            "#,
        )
        .bind(ticket_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}

fn push_scope(qb: &mut QueryBuilder<'_, sqlx::Postgres>, scope: &TicketScope) {
    match scope {
        TicketScope::All => {}
        TicketScope::Creator(user_id) => {
            qb.push(" AND t.created_by = ").push_bind(*user_id);
        }
        TicketScope::Department(Some(department_id)) => {
            qb.push(" AND t.department = ").push_bind(*department_id);
        }
        TicketScope::Department(None) => {
            qb.push(" AND t.department IS NULL");
        }
    }
}
