//! Event publisher service.
//!
//! Provides an abstraction for pushing registration events to the admin
//! dashboard. The actual implementation lives in the api crate's streaming
//! module.

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use mwb_common::AppResult;
use mwb_db::entities::registration::{self, Category, PaymentStatus};
use serde::Serialize;
use std::sync::Arc;

/// Registration fields shown on the admin dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationSummary {
    pub id: String,
    pub registration_number: String,
    pub full_name: String,
    pub email: String,
    pub whatsapp_number: String,
    pub category: Category,
    pub province: String,
    pub invoice_id: String,
    pub participant_number: String,
    pub invoice_amount: i64,
    pub payment_status: PaymentStatus,
    pub is_minor: bool,
    pub created_at: DateTime<FixedOffset>,
}

impl From<&registration::Model> for RegistrationSummary {
    fn from(model: &registration::Model) -> Self {
        Self {
            id: model.id.clone(),
            registration_number: model.registration_number.clone(),
            full_name: model.full_name.clone(),
            email: model.email.clone(),
            whatsapp_number: model.whatsapp_number.clone(),
            category: model.category,
            province: model.province.clone(),
            invoice_id: model.invoice_id.clone(),
            participant_number: model.participant_number.clone(),
            invoice_amount: model.invoice_amount,
            payment_status: model.payment_status,
            is_minor: model.is_minor,
            created_at: model.created_at,
        }
    }
}

/// Events pushed to the admin room.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "body", rename_all = "camelCase")]
pub enum AdminEvent {
    /// A registration was just stored.
    NewRegistration(RegistrationSummary),
    /// A registration's payment status changed.
    PaymentStatusUpdated(RegistrationSummary),
    /// Other registration fields changed, e.g. document URLs.
    RegistrationUpdated(RegistrationSummary),
}

/// Trait for publishing admin events.
///
/// This allows the core services to publish events
/// without depending on the transport that delivers them.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish a new registration event.
    async fn publish_new_registration(&self, registration: &registration::Model) -> AppResult<()>;

    /// Publish a payment status change.
    async fn publish_payment_status_updated(
        &self,
        registration: &registration::Model,
    ) -> AppResult<()>;

    /// Publish any other registration change.
    async fn publish_registration_updated(
        &self,
        registration: &registration::Model,
    ) -> AppResult<()>;
}

/// A no-op implementation of `EventPublisher` for tests or when nobody listens.
#[derive(Clone, Default)]
pub struct NoOpEventPublisher;

#[async_trait]
impl EventPublisher for NoOpEventPublisher {
    async fn publish_new_registration(&self, _registration: &registration::Model) -> AppResult<()> {
        Ok(())
    }

    async fn publish_payment_status_updated(
        &self,
        _registration: &registration::Model,
    ) -> AppResult<()> {
        Ok(())
    }

    async fn publish_registration_updated(
        &self,
        _registration: &registration::Model,
    ) -> AppResult<()> {
        Ok(())
    }
}

/// Wrapper for boxed `EventPublisher` trait object.
pub type EventPublisherService = Arc<dyn EventPublisher>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_fixtures::sample_registration;

    #[test]
    fn test_admin_event_wire_format() {
        let model = sample_registration();
        let event = AdminEvent::NewRegistration(RegistrationSummary::from(&model));
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["type"], "newRegistration");
        assert_eq!(json["body"]["registrationNumber"], model.registration_number);
        assert_eq!(json["body"]["invoiceId"], "MWB-V.250.0111");
        assert_eq!(json["body"]["paymentStatus"], "pending");
        assert_eq!(json["body"]["category"], "Vocal");
    }

    #[test]
    fn test_payment_status_event_tag() {
        let model = sample_registration();
        let event = AdminEvent::PaymentStatusUpdated(RegistrationSummary::from(&model));
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["type"], "paymentStatusUpdated");
    }
}
