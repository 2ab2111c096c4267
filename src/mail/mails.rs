use super::sendmail::{send_email, Mailer};
use crate::models::ticketmodel::Ticket;

/// Confirmation sent to the filer right after creation.
pub async fn send_ticket_created_email(
    mailer: &Mailer,
    to_email: &str,
    ticket: &Ticket,
    department_name: Option<&str>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let subject = format!("Ticket Created: {}", ticket.ticket_number);
    let template_path = "src/mail/templates/Ticket-Created.html";

    let priority = format!("{:?}", ticket.priority).to_lowercase();
    let placeholders = vec![
        ("{{ticket_number}}".to_string(), ticket.ticket_number.clone()),
        ("{{title}}".to_string(), ticket.title.clone()),
        ("{{description}}".to_string(), ticket.description.clone()),
        ("{{priority}}".to_string(), priority),
        ("{{status}}".to_string(), ticket.status.to_str().to_string()),
        (
            "{{created_at}}".to_string(),
            ticket.created_at.format("%B %d, %Y at %H:%M").to_string(),
        ),
        (
            "{{department}}".to_string(),
            department_name.unwrap_or("General").to_string(),
        ),
        ("{{dashboard_url}}".to_string(), dashboard_url(mailer)),
    ];

    send_email(mailer, to_email, &subject, template_path, &placeholders).await
}

/// Resolution notice asking the filer to review and leave feedback.
pub async fn send_ticket_resolved_email(
    mailer: &Mailer,
    to_email: &str,
    ticket: &Ticket,
    resolver_name: &str,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let subject = format!("Ticket Resolved: {} - Please Review", ticket.ticket_number);
    let template_path = "src/mail/templates/Ticket-Resolved.html";

    let solved_at = ticket
        .solved_at
        .map(|t| t.format("%B %d, %Y at %H:%M").to_string())
        .unwrap_or_default();

    let placeholders = vec![
        ("{{ticket_number}}".to_string(), ticket.ticket_number.clone()),
        ("{{title}}".to_string(), ticket.title.clone()),
        ("{{solved_by}}".to_string(), resolver_name.to_string()),
        ("{{solved_at}}".to_string(), solved_at),
        (
            "{{solution}}".to_string(),
            ticket.solution.clone().unwrap_or_default(),
        ),
        ("{{dashboard_url}}".to_string(), dashboard_url(mailer)),
    ];

    send_email(mailer, to_email, &subject, template_path, &placeholders).await
}

fn dashboard_url(mailer: &Mailer) -> String {
    format!("{}/dashboard", mailer.app_url)
}
