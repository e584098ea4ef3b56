//! Health check and statistics endpoints.

use std::time::Duration;

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::group::{GroupStats, MemberInfo, RegistryStats};
use crate::server::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub groups: usize,
    pub members: usize,
}

#[derive(Debug, Serialize)]
pub struct GroupDetailsResponse {
    #[serde(flatten)]
    pub stats: GroupStats,
    pub members: Vec<MemberResponse>,
}

#[derive(Debug, Serialize)]
pub struct MemberResponse {
    pub id: String,
    pub name: String,
    pub joined_at: DateTime<Utc>,
}

impl From<MemberInfo> for MemberResponse {
    fn from(info: MemberInfo) -> Self {
        Self {
            id: info.id.to_string(),
            name: info.name,
            joined_at: info.joined_at,
        }
    }
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let registry = state.registry.stats();

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        groups: registry.total_groups,
        members: registry.total_members,
    })
}

/// GET /stats - per-group counters
pub async fn stats(State(state): State<AppState>) -> Json<RegistryStats> {
    Json(state.registry.stats())
}

/// GET /stats/groups/{name} - one group with its current members
pub async fn group_details(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<GroupDetailsResponse>> {
    let group = state
        .registry
        .get(&name)
        .ok_or_else(|| AppError::NotFound(format!("Group '{}' not found", name)))?;

    let timeout = Duration::from_millis(state.settings.groups.snapshot_timeout_ms);
    let mut members: Vec<MemberResponse> = group
        .members_within(timeout)
        .await?
        .into_iter()
        .map(MemberResponse::from)
        .collect();
    members.sort_by(|a, b| a.joined_at.cmp(&b.joined_at));

    Ok(Json(GroupDetailsResponse {
        stats: group.stats(),
        members,
    }))
}
