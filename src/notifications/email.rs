use sendgrid::SGClient;
use sendgrid::{Destination, Mail};
use tracing::{error, info, warn};

/// Email delivery through SendGrid. Without an API key every send is mocked
/// and only logged.
#[derive(Clone)]
pub struct EmailSender {
    sendgrid_client: Option<SGClient>,
    email_from: String,
}

impl EmailSender {
    pub fn new(api_key: Option<String>, email_from: String) -> Self {
        let sendgrid_client = api_key.map(SGClient::new);
        if sendgrid_client.is_none() {
            warn!("SendGrid API key not found. Email notifications will be mocked.");
        }
        Self {
            sendgrid_client,
            email_from,
        }
    }

    pub fn mocked(email_from: impl Into<String>) -> Self {
        Self {
            sendgrid_client: None,
            email_from: email_from.into(),
        }
    }

    pub fn is_mocked(&self) -> bool {
        self.sendgrid_client.is_none()
    }

    pub async fn send_email(
        &self,
        to_email: &str,
        to_name: &str,
        subject: &str,
        body: &str,
    ) -> Result<(), String> {
        if to_email.trim().is_empty() {
            return Err("recipient has no email address".to_string());
        }

        let Some(client) = &self.sendgrid_client else {
            info!("(Mock) Would send email to: {}", to_email);
            info!("(Mock) Subject: {}", subject);
            info!("(Mock) Body length: {} chars", body.len());
            return Ok(());
        };

        // The SendGrid client blocks; owned copies move into the worker thread.
        let client = client.clone();
        let to_email = to_email.to_string();
        let to_name = to_name.to_string();
        let subject = subject.to_string();
        let body = body.to_string();
        let email_from = self.email_from.clone();
        let to_email_log = to_email.clone();

        match tokio::task::spawn_blocking(move || {
            let mail = Mail::new()
                .add_to(Destination {
                    address: &to_email,
                    name: &to_name,
                })
                .add_from(&email_from)
                .add_subject(&subject)
                .add_html(&body);

            client.send(mail)
        })
        .await
        {
            Ok(Ok(_)) => {
                info!("Email sent successfully to {}", to_email_log);
                Ok(())
            }
            Ok(Err(e)) => {
                error!("Failed to send email to {}: {}", to_email_log, e);
                Err(format!("SendGrid Error: {}", e))
            }
            Err(e) => Err(format!("Task Join Error: {}", e)),
        }
    }
}
