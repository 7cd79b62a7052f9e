//! Business logic services.

#![allow(missing_docs)]

pub mod email;
pub mod event_publisher;
pub mod notification;
pub mod registration;
pub mod voting;
pub mod whatsapp;

#[cfg(test)]
mod test_fixtures;

pub use email::{EmailMessage, EmailService};
pub use event_publisher::{
    AdminEvent, EventPublisher, EventPublisherService, NoOpEventPublisher, RegistrationSummary,
};
pub use notification::{
    Notice, NoticeKind, NotificationChannel, NotificationService, Recipient, format_rupiah,
};
pub use registration::{
    CreateRegistrationInput, DocumentUpload, Reconciliation, RegistrationService,
    RegistrationStats,
};
pub use voting::{
    ContestantDetail, ContestantStanding, PromoteContestantInput, SaweriaWebhookPayload,
    VoteLink, VoteLinkInput, VoteSummary, VotingService, WebhookOutcome, parse_vote_message,
    sign_saweria_payload, verify_saweria_signature, vote_message,
};
pub use whatsapp::{WhatsAppService, normalize_whatsapp_number};
