//! Public voting round.
//!
//! Verified registrations are promoted to contestants. Votes are bought on
//! Saweria; the payment message names the contestant and the quantity, and the
//! Saweria webhook credits them once per transaction.

use std::sync::LazyLock;

use chrono::{DateTime, FixedOffset, Utc};
use hmac::{Hmac, Mac};
use mwb_common::{AppError, AppResult, IdGenerator, config::PaymentConfig};
use mwb_db::{
    entities::{
        contestant::{self, ContestantStatus},
        registration::{Category, PaymentStatus},
        vote,
    },
    repositories::{ContestantRepository, RegistrationRepository, VoteRepository},
};
use regex::Regex;
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use validator::Validate;

use crate::eligibility::today_in_jakarta;

type HmacSha256 = Hmac<Sha256>;

/// Number of recent votes shown on a contestant page.
const RECENT_VOTES_LIMIT: u64 = 20;

#[allow(clippy::unwrap_used)]
static VOTE_MESSAGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Vote untuk (.+) \(([^()]+)\) - (\d+) votes?").unwrap()
});

/// Input for promoting a registration to contestant.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PromoteContestantInput {
    #[validate(length(min = 1))]
    pub registration_number: String,
    #[validate(length(max = 2048))]
    pub bio: Option<String>,
}

/// Input for building a vote payment link.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct VoteLinkInput {
    pub contestant_id: String,
    #[validate(range(min = 1, max = 10000))]
    pub vote_quantity: u32,
}

/// A contestant with its share of the votes in the listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContestantStanding {
    #[serde(flatten)]
    pub contestant: contestant::Model,
    /// Percentage of all votes in the listing, 0 when nobody has voted yet.
    pub percentage: f64,
}

/// Public view of a credited vote.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteSummary {
    pub voter_name: String,
    pub vote_quantity: i32,
    pub message: Option<String>,
    pub created_at: DateTime<FixedOffset>,
}

impl From<vote::Model> for VoteSummary {
    fn from(vote: vote::Model) -> Self {
        Self {
            voter_name: vote.voter_name,
            vote_quantity: vote.vote_quantity,
            message: vote.message,
            created_at: vote.created_at,
        }
    }
}

/// Contestant page.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContestantDetail {
    pub contestant: contestant::Model,
    pub recent_votes: Vec<VoteSummary>,
}

/// Payment link for a number of votes.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteLink {
    pub contestant_id: String,
    pub contestant_name: String,
    pub contestant_number: String,
    pub vote_quantity: u32,
    pub amount: i64,
    pub saweria_link: String,
}

/// Saweria donation callback body.
#[derive(Debug, Clone, Deserialize)]
pub struct SaweriaWebhookPayload {
    pub id: String,
    pub amount: i64,
    #[serde(default)]
    pub amount_raw: Option<i64>,
    #[serde(default)]
    pub donator_name: Option<String>,
    #[serde(default)]
    pub donator_email: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    pub created_at: String,
    pub status: String,
}

/// Fields covered by the webhook signature, in signing order.
#[derive(Serialize)]
struct SignedFields<'a> {
    id: &'a str,
    amount: i64,
    message: Option<&'a str>,
    created_at: &'a str,
}

/// Result reported back to Saweria.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookOutcome {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contestant_number: Option<String>,
}

impl WebhookOutcome {
    fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            receipt_number: None,
            contestant_number: None,
        }
    }

    fn credited(message: &str, vote: &vote::Model, contestant_number: &str) -> Self {
        Self {
            success: true,
            message: message.to_string(),
            receipt_number: Some(vote.receipt_number.clone()),
            contestant_number: Some(contestant_number.to_string()),
        }
    }
}

/// Contestant and quantity named in a vote payment message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteMessage {
    pub name: String,
    pub contestant_number: String,
    pub quantity: u32,
}

/// Message embedded in a vote payment link.
#[must_use]
pub fn vote_message(name: &str, contestant_number: &str, quantity: u32) -> String {
    let unit = if quantity == 1 { "vote" } else { "votes" };
    format!("Vote untuk {name} ({contestant_number}) - {quantity} {unit}")
}

/// Parse a vote payment message. Saweria may prepend or append text, so the
/// pattern is searched for anywhere in the message.
#[must_use]
pub fn parse_vote_message(message: &str) -> Option<VoteMessage> {
    let caps = VOTE_MESSAGE_RE.captures(message)?;
    let quantity: u32 = caps[3].parse().ok()?;
    if quantity == 0 {
        return None;
    }

    Some(VoteMessage {
        name: caps[1].trim().to_string(),
        contestant_number: caps[2].trim().to_string(),
        quantity,
    })
}

fn payload_mac(secret: &str, payload: &SaweriaWebhookPayload) -> AppResult<HmacSha256> {
    let signed = serde_json::to_string(&SignedFields {
        id: &payload.id,
        amount: payload.amount,
        message: payload.message.as_deref(),
        created_at: &payload.created_at,
    })
    .map_err(|e| AppError::Internal(format!("Failed to serialize payload: {e}")))?;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| AppError::Internal(format!("Invalid HMAC key: {e}")))?;
    mac.update(signed.as_bytes());
    Ok(mac)
}

/// Hex HMAC-SHA256 signature of a webhook payload.
pub fn sign_saweria_payload(secret: &str, payload: &SaweriaWebhookPayload) -> AppResult<String> {
    Ok(hex::encode(payload_mac(secret, payload)?.finalize().into_bytes()))
}

/// Check a webhook signature in constant time.
pub fn verify_saweria_signature(
    secret: &str,
    payload: &SaweriaWebhookPayload,
    signature: &str,
) -> AppResult<bool> {
    let Ok(expected) = hex::decode(signature.trim()) else {
        return Ok(false);
    };
    Ok(payload_mac(secret, payload)?.verify_slice(&expected).is_ok())
}

fn percentage(votes: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    let raw = votes as f64 / total as f64 * 100.0;
    (raw * 100.0).round() / 100.0
}

/// Voting service.
#[derive(Clone)]
pub struct VotingService {
    contestant_repo: ContestantRepository,
    vote_repo: VoteRepository,
    registration_repo: RegistrationRepository,
    payment: PaymentConfig,
    id_gen: IdGenerator,
}

impl VotingService {
    /// Create a new voting service.
    #[must_use]
    pub const fn new(
        contestant_repo: ContestantRepository,
        vote_repo: VoteRepository,
        registration_repo: RegistrationRepository,
        payment: PaymentConfig,
    ) -> Self {
        Self {
            contestant_repo,
            vote_repo,
            registration_repo,
            payment,
            id_gen: IdGenerator::new(),
        }
    }

    /// Promote a verified registration to contestant.
    ///
    /// The contestant number is the participant number issued at registration.
    pub async fn promote(&self, input: PromoteContestantInput) -> AppResult<contestant::Model> {
        input.validate()?;

        let registration = self
            .registration_repo
            .find_by_registration_number(&input.registration_number)
            .await?
            .ok_or_else(|| AppError::RegistrationNotFound(input.registration_number.clone()))?;

        if registration.payment_status != PaymentStatus::Verified {
            return Err(AppError::BadRequest(
                "Only registrations with a verified payment can be promoted".to_string(),
            ));
        }

        if self
            .contestant_repo
            .find_by_registration_id(&registration.id)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(format!(
                "{} is already a contestant",
                registration.registration_number
            )));
        }

        let model = contestant::ActiveModel {
            id: Set(self.id_gen.generate()),
            registration_id: Set(registration.id.clone()),
            contestant_number: Set(registration.participant_number.clone()),
            name: Set(registration.full_name.clone()),
            category: Set(registration.category),
            province: Set(registration.province.clone()),
            photo_url: Set(registration.photo_url.clone()),
            bio: Set(input.bio.filter(|b| !b.trim().is_empty())),
            vote_count: Set(0),
            status: Set(ContestantStatus::Active),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };

        let created = self.contestant_repo.create(model).await?;
        tracing::info!(
            contestant_number = %created.contestant_number,
            registration_number = %registration.registration_number,
            "Contestant promoted"
        );
        Ok(created)
    }

    /// Active contestants with their vote share, most votes first.
    pub async fn list_contestants(
        &self,
        category: Option<Category>,
    ) -> AppResult<Vec<ContestantStanding>> {
        let contestants = self.contestant_repo.find_active(category).await?;
        let total: i64 = contestants.iter().map(|c| c.vote_count).sum();

        Ok(contestants
            .into_iter()
            .map(|contestant| ContestantStanding {
                percentage: percentage(contestant.vote_count, total),
                contestant,
            })
            .collect())
    }

    /// A contestant with recent votes.
    pub async fn get_contestant(&self, id: &str) -> AppResult<ContestantDetail> {
        let contestant = self
            .contestant_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::ContestantNotFound(id.to_string()))?;

        let recent_votes = self
            .vote_repo
            .find_by_contestant(id, RECENT_VOTES_LIMIT)
            .await?
            .into_iter()
            .map(VoteSummary::from)
            .collect();

        Ok(ContestantDetail {
            contestant,
            recent_votes,
        })
    }

    /// Build the Saweria payment link for `vote_quantity` votes.
    pub async fn vote_link(&self, input: VoteLinkInput) -> AppResult<VoteLink> {
        input.validate()?;

        let contestant = self
            .contestant_repo
            .find_by_id(&input.contestant_id)
            .await?
            .ok_or_else(|| AppError::ContestantNotFound(input.contestant_id.clone()))?;

        if contestant.status != ContestantStatus::Active {
            return Err(AppError::BadRequest(
                "Contestant is not accepting votes".to_string(),
            ));
        }

        let amount = i64::from(input.vote_quantity) * self.payment.vote_price;
        let message = vote_message(
            &contestant.name,
            &contestant.contestant_number,
            input.vote_quantity,
        );
        let saweria_link = format!(
            "https://saweria.co/{}?amount={amount}&message={}",
            self.payment.saweria_username,
            urlencoding::encode(&message)
        );

        Ok(VoteLink {
            contestant_id: contestant.id,
            contestant_name: contestant.name,
            contestant_number: contestant.contestant_number,
            vote_quantity: input.vote_quantity,
            amount,
            saweria_link,
        })
    }

    /// Credit the votes paid for by a Saweria donation.
    ///
    /// Signature failures are errors. Payments that cannot be credited are
    /// reported in the outcome so Saweria does not keep retrying them.
    pub async fn handle_saweria_webhook(
        &self,
        payload: SaweriaWebhookPayload,
        signature: Option<&str>,
    ) -> AppResult<WebhookOutcome> {
        if let Some(secret) = &self.payment.saweria_webhook_secret {
            let valid = match signature {
                Some(sig) => verify_saweria_signature(secret, &payload, sig)?,
                None => false,
            };
            if !valid {
                tracing::warn!(transaction_id = %payload.id, "Rejected Saweria webhook with bad signature");
                return Err(AppError::Unauthorized);
            }
        }

        if payload.status != "success" {
            return Ok(WebhookOutcome {
                success: true,
                message: format!("Payment status {} is not successful, skipped", payload.status),
                receipt_number: None,
                contestant_number: None,
            });
        }

        let Some(parsed) = payload.message.as_deref().and_then(parse_vote_message) else {
            tracing::warn!(transaction_id = %payload.id, "Saweria payment without a vote message");
            return Ok(WebhookOutcome::rejected("Unknown payment type"));
        };

        let Some(contestant) = self
            .contestant_repo
            .find_by_number(&parsed.contestant_number)
            .await?
        else {
            return Ok(WebhookOutcome::rejected(format!(
                "Contestant {} not found",
                parsed.contestant_number
            )));
        };

        if contestant.status != ContestantStatus::Active {
            return Ok(WebhookOutcome::rejected(format!(
                "Contestant {} is not accepting votes",
                contestant.contestant_number
            )));
        }

        let required = i64::from(parsed.quantity) * self.payment.vote_price;
        let paid = payload.amount_raw.unwrap_or(payload.amount);
        if paid < required {
            tracing::warn!(
                transaction_id = %payload.id,
                paid,
                required,
                "Insufficient vote payment"
            );
            return Ok(WebhookOutcome::rejected(format!(
                "Insufficient payment amount: {paid} < {required}"
            )));
        }

        if let Some(existing) = self.vote_repo.find_by_transaction_id(&payload.id).await? {
            return Ok(WebhookOutcome::credited(
                "Vote already recorded",
                &existing,
                &contestant.contestant_number,
            ));
        }

        let quantity = i32::try_from(parsed.quantity)
            .map_err(|_| AppError::BadRequest("Vote quantity too large".to_string()))?;
        let model = vote::ActiveModel {
            id: Set(self.id_gen.generate()),
            receipt_number: Set(self.id_gen.receipt_number(today_in_jakarta())),
            contestant_id: Set(contestant.id.clone()),
            voter_name: Set(payload
                .donator_name
                .clone()
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| "Anonim".to_string())),
            voter_email: Set(payload.donator_email.clone()),
            amount: Set(paid),
            vote_quantity: Set(quantity),
            transaction_id: Set(payload.id.clone()),
            message: Set(payload.message.clone()),
            created_at: Set(Utc::now().into()),
        };

        match self.vote_repo.record(model).await {
            Ok(recorded) => {
                tracing::info!(
                    transaction_id = %payload.id,
                    contestant_number = %contestant.contestant_number,
                    quantity = parsed.quantity,
                    "Votes credited"
                );
                Ok(WebhookOutcome::credited(
                    "Vote recorded successfully",
                    &recorded,
                    &contestant.contestant_number,
                ))
            }
            // A concurrent delivery of the same donation won the insert.
            Err(AppError::Conflict(_)) => {
                let existing = self
                    .vote_repo
                    .find_by_transaction_id(&payload.id)
                    .await?
                    .ok_or_else(|| AppError::Internal("conflicting vote vanished".to_string()))?;
                Ok(WebhookOutcome::credited(
                    "Vote already recorded",
                    &existing,
                    &contestant.contestant_number,
                ))
            }
            Err(e) => Err(e),
        }
    }
}
