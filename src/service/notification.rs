// src/service/notification.rs
use crate::config::Config;
use crate::mail::mails::{send_ticket_created_email, send_ticket_resolved_email};
use crate::mail::sendmail::Mailer;
use crate::models::ticketmodel::Ticket;

/// Lifecycle event handed to the dispatcher after the state change has been
/// durably committed. Carries everything the mail layer needs so the spawned
/// task owns its data.
#[derive(Debug, Clone)]
pub enum TicketEvent {
    Created {
        to: String,
        ticket: Ticket,
        department_name: Option<String>,
    },
    Resolved {
        to: String,
        ticket: Ticket,
        resolver_name: String,
    },
}

/// Fire-and-forget dispatch. Invoked exactly once per transition, strictly
/// after commit; a failure is logged and never reaches the HTTP caller.
#[derive(Debug, Clone)]
pub struct NotificationService {
    mailer: Mailer,
}

impl NotificationService {
    pub fn new(config: &Config) -> Self {
        NotificationService {
            mailer: Mailer::from_config(config),
        }
    }

    pub fn notify(&self, event: TicketEvent) {
        let mailer = self.mailer.clone();

        tokio::spawn(async move {
            let (kind, ticket_number, result) = match event {
                TicketEvent::Created {
                    to,
                    ticket,
                    department_name,
                } => (
                    "created",
                    ticket.ticket_number.clone(),
                    send_ticket_created_email(&mailer, &to, &ticket, department_name.as_deref())
                        .await,
                ),
                TicketEvent::Resolved {
                    to,
                    ticket,
                    resolver_name,
                } => (
                    "resolved",
                    ticket.ticket_number.clone(),
                    send_ticket_resolved_email(&mailer, &to, &ticket, &resolver_name).await,
                ),
            };

            if let Err(e) = result {
                tracing::error!(
                    "Failed to send '{}' email for ticket {}: {}",
                    kind,
                    ticket_number,
                    e
                );
            }
        });
    }
}
