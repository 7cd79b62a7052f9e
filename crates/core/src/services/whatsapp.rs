//! WhatsApp delivery through an HTTP gateway.

use std::time::Duration;

use mwb_common::{AppError, AppResult, config::WhatsAppConfig};

/// Client for a Fonnte-style gateway (`target` + `message` form fields,
/// token in the `Authorization` header).
#[derive(Clone)]
pub struct WhatsAppService {
    config: WhatsAppConfig,
    http_client: reqwest::Client,
}

impl WhatsAppService {
    /// Create a new WhatsApp service.
    pub fn new(config: WhatsAppConfig) -> AppResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            config,
            http_client,
        })
    }

    /// Check if messages are actually sent.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.config.api_key.is_some()
    }

    /// Admin contact number.
    #[must_use]
    pub fn admin_number(&self) -> &str {
        &self.config.admin_number
    }

    /// Send a text message to `number`.
    pub async fn send(&self, number: &str, message: &str) -> AppResult<()> {
        let target = normalize_whatsapp_number(number)
            .ok_or_else(|| AppError::Validation(format!("Invalid WhatsApp number: {number}")))?;

        let Some(api_key) = &self.config.api_key else {
            tracing::info!(target = %target, "WhatsApp gateway not configured, message not sent");
            return Ok(());
        };

        let response = self
            .http_client
            .post(&self.config.api_url)
            .header("Authorization", api_key)
            .form(&[("target", target.as_str()), ("message", message)])
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("WhatsApp request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalService(format!(
                "WhatsApp gateway error: {status} - {body}"
            )));
        }

        tracing::debug!(target = %target, "WhatsApp message sent");
        Ok(())
    }
}

/// Normalize an Indonesian mobile number to international form without `+`.
///
/// `0812…`, `+62 812…`, `62812…` and `812…` all become `62812…`. Returns `None`
/// when no plausible number remains.
#[must_use]
pub fn normalize_whatsapp_number(raw: &str) -> Option<String> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();

    let normalized = if let Some(rest) = digits.strip_prefix('0') {
        format!("62{rest}")
    } else if digits.starts_with("62") {
        digits
    } else if digits.starts_with('8') {
        format!("62{digits}")
    } else {
        digits
    };

    (normalized.len() >= 10).then_some(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_local_prefix() {
        assert_eq!(
            normalize_whatsapp_number("082315660007").as_deref(),
            Some("6282315660007")
        );
    }

    #[test]
    fn test_normalize_international_forms() {
        assert_eq!(
            normalize_whatsapp_number("+62 823-1566-0007").as_deref(),
            Some("6282315660007")
        );
        assert_eq!(
            normalize_whatsapp_number("6282315660007").as_deref(),
            Some("6282315660007")
        );
        assert_eq!(
            normalize_whatsapp_number("82315660007").as_deref(),
            Some("6282315660007")
        );
    }

    #[test]
    fn test_normalize_rejects_short_numbers() {
        assert_eq!(normalize_whatsapp_number(""), None);
        assert_eq!(normalize_whatsapp_number("0812"), None);
        assert_eq!(normalize_whatsapp_number("abc"), None);
    }

    #[tokio::test]
    async fn test_unconfigured_gateway_only_logs() {
        let service = WhatsAppService::new(WhatsAppConfig::default()).unwrap();
        assert!(!service.is_enabled());
        assert!(service.send("081234567890", "Halo").await.is_ok());
    }

    #[tokio::test]
    async fn test_invalid_number_is_rejected_before_sending() {
        let service = WhatsAppService::new(WhatsAppConfig::default()).unwrap();
        assert!(matches!(
            service.send("12", "Halo").await,
            Err(AppError::Validation(_))
        ));
    }
}
