//! Email delivery over SMTP.

use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, MultiPart},
    transport::smtp::authentication::Credentials,
};
use mwb_common::{AppError, AppResult, config::EmailConfig};

/// Email message to be sent.
#[derive(Debug, Clone)]
pub struct EmailMessage {
    /// Recipient email address
    pub to: String,
    /// Subject line
    pub subject: String,
    /// Plain text body
    pub text_body: String,
    /// HTML body (optional)
    pub html_body: Option<String>,
}

/// Email service.
///
/// Without an SMTP host the service logs each message instead of sending it,
/// which is what local development runs with.
#[derive(Clone)]
pub struct EmailService {
    config: EmailConfig,
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
}

impl EmailService {
    /// Create a new email service.
    pub fn new(config: EmailConfig) -> AppResult<Self> {
        let transport = match config.smtp_host.as_deref() {
            Some(host) => {
                let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
                    .map_err(|e| AppError::Config(format!("Invalid SMTP host: {e}")))?
                    .port(config.smtp_port);
                if let (Some(username), Some(password)) =
                    (&config.smtp_username, &config.smtp_password)
                {
                    builder = builder.credentials(Credentials::new(
                        username.clone(),
                        password.clone(),
                    ));
                }
                Some(builder.build())
            }
            None => None,
        };

        Ok(Self { config, transport })
    }

    /// Check if email service actually delivers mail.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.transport.is_some()
    }

    /// Address that receives admin copies.
    #[must_use]
    pub fn admin_address(&self) -> &str {
        &self.config.admin_address
    }

    /// Send an email.
    pub async fn send(&self, message: EmailMessage) -> AppResult<()> {
        let Some(transport) = &self.transport else {
            tracing::info!(
                to = %message.to,
                subject = %message.subject,
                "SMTP not configured, email not sent"
            );
            return Ok(());
        };

        let email = self.build_message(message)?;
        transport
            .send(email)
            .await
            .map_err(|e| AppError::ExternalService(format!("SMTP delivery failed: {e}")))?;

        Ok(())
    }

    fn build_message(&self, message: EmailMessage) -> AppResult<Message> {
        let from = format!("{} <{}>", self.config.from_name, self.config.from_address)
            .parse::<Mailbox>()
            .map_err(|e| AppError::Config(format!("Invalid sender address: {e}")))?;
        let to = message
            .to
            .parse::<Mailbox>()
            .map_err(|e| AppError::Validation(format!("Invalid recipient address: {e}")))?;

        let builder = Message::builder().from(from).to(to).subject(message.subject);

        let built = match message.html_body {
            Some(html) => {
                builder.multipart(MultiPart::alternative_plain_html(message.text_body, html))
            }
            None => builder.body(message.text_body),
        };

        built.map_err(|e| AppError::Internal(format!("Failed to build email: {e}")))
    }
}

/// Wrap HTML content in the shared email layout.
#[must_use]
pub fn wrap_html(content: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <style>
        body {{ font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; line-height: 1.6; color: #333; max-width: 600px; margin: 0 auto; padding: 20px; }}
        table {{ border-collapse: collapse; }}
        td {{ padding: 4px 12px 4px 0; vertical-align: top; }}
    </style>
</head>
<body>
    {content}
    <hr style="margin-top: 40px; border: none; border-top: 1px solid #e9ecef;">
    <p style="font-size: 12px; color: #6c757d;">
        Email ini dikirim otomatis oleh panitia Movement With Benefit.
    </p>
</body>
</html>"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message() -> EmailMessage {
        EmailMessage {
            to: "siti@example.com".to_string(),
            subject: "Pendaftaran diterima".to_string(),
            text_body: "Halo".to_string(),
            html_body: Some("<p>Halo</p>".to_string()),
        }
    }

    #[tokio::test]
    async fn test_unconfigured_service_only_logs() {
        let service = EmailService::new(EmailConfig::default()).unwrap();
        assert!(!service.is_enabled());
        assert!(service.send(message()).await.is_ok());
    }

    #[test]
    fn test_build_message_rejects_bad_recipient() {
        let service = EmailService::new(EmailConfig::default()).unwrap();
        let mut msg = message();
        msg.to = "not an address".to_string();

        assert!(matches!(
            service.build_message(msg),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_build_message_multipart() {
        let service = EmailService::new(EmailConfig::default()).unwrap();
        let built = service.build_message(message()).unwrap();
        let raw = String::from_utf8(built.formatted()).unwrap();

        assert!(raw.contains("multipart/alternative"));
        assert!(raw.contains("Subject: Pendaftaran diterima"));
    }

    #[test]
    fn test_wrap_html_embeds_content() {
        let html = wrap_html("<p>isi</p>");
        assert!(html.contains("<p>isi</p>"));
        assert!(html.starts_with("<!DOCTYPE html>"));
    }
}
