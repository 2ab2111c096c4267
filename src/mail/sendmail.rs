use serde_json::json;
use std::fs;
use tokio::time::{sleep, Duration};

use crate::config::Config;

const MAX_RETRIES: u32 = 3;
const RETRY_DELAY_MS: u64 = 1000;

/// Mail settings lifted out of `Config` once at startup so spawned send tasks
/// own their configuration.
#[derive(Debug, Clone)]
pub struct Mailer {
    pub resend_api_key: String,
    pub from_email: String,
    pub app_url: String,
}

impl Mailer {
    pub fn from_config(config: &Config) -> Self {
        Mailer {
            resend_api_key: config.resend_api_key.clone(),
            from_email: config.from_email.clone(),
            app_url: config.app_url.clone(),
        }
    }
}

pub async fn send_email(
    mailer: &Mailer,
    to_email: &str,
    subject: &str,
    template_path: &str,
    placeholders: &[(String, String)],
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    if to_email.is_empty() {
        return Err("Email recipient cannot be empty".into());
    }
    if !to_email.contains('@') {
        return Err(format!("Invalid email address: {}", to_email).into());
    }

    let mut html_template = match fs::read_to_string(template_path) {
        Ok(content) => content,
        Err(e) => {
            tracing::error!("Failed to read email template {}: {}", template_path, e);
            return Err(format!("Template not found: {}", template_path).into());
        }
    };

    for (key, value) in placeholders {
        html_template = html_template.replace(key, value);
    }

    send_with_retries(mailer, to_email, subject, &html_template).await
}

async fn send_with_retries(
    mailer: &Mailer,
    to_email: &str,
    subject: &str,
    html_body: &str,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut last_error = None;

    for attempt in 1..=MAX_RETRIES {
        match send_via_resend(mailer, to_email, subject, html_body).await {
            Ok(()) => {
                tracing::info!("Email sent to {}", to_email);
                return Ok(());
            }
            Err(e) => {
                last_error = Some(e);
                if attempt < MAX_RETRIES {
                    let delay = RETRY_DELAY_MS * (2_u64.pow(attempt - 1));
                    tracing::warn!(
                        "Email send attempt {} failed for {}. Retrying in {}ms...",
                        attempt,
                        to_email,
                        delay
                    );
                    sleep(Duration::from_millis(delay)).await;
                }
            }
        }
    }

    let error_msg = last_error
        .map(|e| format!("Failed after {} retries: {}", MAX_RETRIES, e))
        .unwrap_or_else(|| "Unknown email sending error".to_string());

    Err(error_msg.into())
}

async fn send_via_resend(
    mailer: &Mailer,
    to_email: &str,
    subject: &str,
    html_body: &str,
) -> Result<(), String> {
    if mailer.resend_api_key.is_empty() {
        return Err("RESEND_API_KEY is not configured".to_string());
    }

    let client = reqwest::Client::new();
    let response = client
        .post("https://api.resend.com/emails")
        .header("Authorization", format!("Bearer {}", mailer.resend_api_key))
        .header("Content-Type", "application/json")
        .json(&json!({
            "from": mailer.from_email,
            "to": to_email,
            "subject": subject,
            "html": html_body,
        }))
        .send()
        .await
        .map_err(|e| format!("Network error: {}", e))?;

    let status = response.status();
    if status.is_success() {
        Ok(())
    } else {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "No response body".to_string());
        Err(format!("Resend API error ({}): {}", status.as_u16(), body))
    }
}
