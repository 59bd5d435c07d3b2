use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ApiError, AppState};
use crate::db::{CURSOR_END, FindAllPage, StoreError};
use crate::models::{Client, ClientPatch, NewClient};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub cursor: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub items: Vec<Client>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<u64>,
}

fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|err| ApiError::InvalidInput(format!("client id {raw:?}: {err}")))
}

fn parse_cursor(raw: Option<&str>) -> Result<u64, ApiError> {
    match raw {
        None | Some("") => Ok(CURSOR_END),
        Some(text) => text
            .parse()
            .map_err(|err| ApiError::InvalidInput(format!("cursor {text:?}: {err}"))),
    }
}

pub async fn create(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<Client>), ApiError> {
    let new: NewClient = serde_json::from_slice(&body)
        .map_err(|err| ApiError::InvalidInput(format!("client body: {err}")))?;

    let client = Client::create(new);

    state.repo.insert(&client).await.map_err(|err| match err {
        // The id was generated here, so a collision is our fault, not the caller's.
        StoreError::AlreadyExists => {
            ApiError::Internal(anyhow::anyhow!("generated client id {} already in use", client.id))
        }
        other => other.into(),
    })?;

    Ok((StatusCode::CREATED, Json(client)))
}

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListResponse>, ApiError> {
    let offset = parse_cursor(query.cursor.as_deref())?;

    let res = state
        .repo
        .find_all(FindAllPage {
            offset,
            size: state.page_size,
        })
        .await?;

    Ok(Json(ListResponse {
        items: res.clients,
        next: (res.cursor != CURSOR_END).then_some(res.cursor),
    }))
}

pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Client>, ApiError> {
    let id = parse_id(&id)?;

    Ok(Json(state.repo.find_by_id(id).await?))
}

pub async fn update_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<Client>, ApiError> {
    let id = parse_id(&id)?;

    let patch: ClientPatch = if body.is_empty() {
        ClientPatch::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|err| ApiError::InvalidInput(format!("client patch: {err}")))?
    };

    let mut client = state.repo.find_by_id(id).await?;
    client.apply(patch);
    state.repo.update(&client).await?;

    Ok(Json(client))
}

pub async fn delete_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;

    state.repo.delete_by_id(id).await?;

    Ok(StatusCode::NO_CONTENT)
}
