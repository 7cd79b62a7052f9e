//! Public voting endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use mwb_common::AppResult;
use mwb_core::{ContestantDetail, ContestantStanding, VoteLink, VoteLinkInput, VoteSummary};
use mwb_db::entities::{
    contestant::{self, ContestantStatus},
    registration::Category,
};
use serde::{Deserialize, Serialize};

use crate::{middleware::AppState, response::ApiResponse};

/// Contestant response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContestantResponse {
    pub id: String,
    pub contestant_number: String,
    pub name: String,
    pub category: Category,
    pub province: String,
    pub photo_url: Option<String>,
    pub bio: Option<String>,
    pub vote_count: i64,
    pub status: ContestantStatus,
    pub created_at: String,
}

impl From<contestant::Model> for ContestantResponse {
    fn from(c: contestant::Model) -> Self {
        Self {
            id: c.id,
            contestant_number: c.contestant_number,
            name: c.name,
            category: c.category,
            province: c.province,
            photo_url: c.photo_url,
            bio: c.bio,
            vote_count: c.vote_count,
            status: c.status,
            created_at: c.created_at.to_rfc3339(),
        }
    }
}

/// A contestant in the leaderboard.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StandingResponse {
    #[serde(flatten)]
    pub contestant: ContestantResponse,
    pub percentage: f64,
}

impl From<ContestantStanding> for StandingResponse {
    fn from(standing: ContestantStanding) -> Self {
        Self {
            contestant: standing.contestant.into(),
            percentage: standing.percentage,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteResponse {
    pub voter_name: String,
    pub vote_quantity: i32,
    pub message: Option<String>,
    pub created_at: String,
}

impl From<VoteSummary> for VoteResponse {
    fn from(vote: VoteSummary) -> Self {
        Self {
            voter_name: vote.voter_name,
            vote_quantity: vote.vote_quantity,
            message: vote.message,
            created_at: vote.created_at.to_rfc3339(),
        }
    }
}

/// Contestant page response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContestantDetailResponse {
    #[serde(flatten)]
    pub contestant: ContestantResponse,
    pub recent_votes: Vec<VoteResponse>,
}

impl From<ContestantDetail> for ContestantDetailResponse {
    fn from(detail: ContestantDetail) -> Self {
        Self {
            contestant: detail.contestant.into(),
            recent_votes: detail.recent_votes.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListContestantsQuery {
    pub category: Option<Category>,
}

/// Active contestants, most votes first.
async fn list_contestants(
    State(state): State<AppState>,
    Query(query): Query<ListContestantsQuery>,
) -> AppResult<ApiResponse<Vec<StandingResponse>>> {
    let standings = state.voting_service.list_contestants(query.category).await?;
    Ok(ApiResponse::ok(
        standings.into_iter().map(Into::into).collect(),
    ))
}

async fn get_contestant(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<ContestantDetailResponse>> {
    let detail = state.voting_service.get_contestant(&id).await?;
    Ok(ApiResponse::ok(detail.into()))
}

/// Build the payment link for a number of votes.
async fn vote_link(
    State(state): State<AppState>,
    Json(input): Json<VoteLinkInput>,
) -> AppResult<ApiResponse<VoteLink>> {
    let link = state.voting_service.vote_link(input).await?;
    Ok(ApiResponse::ok(link))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/contestants", get(list_contestants))
        .route("/contestants/{id}", get(get_contestant))
        .route("/vote-link", post(vote_link))
}
