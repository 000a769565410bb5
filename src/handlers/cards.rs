use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::db::models::{CardInsert, CardSummary};
use crate::error::{CardError, CardResult};
use crate::llm::media::decode_data_url;
use crate::models::SaveCardRequest;
use crate::state::AppState;

pub async fn save_card(
    State(state): State<AppState>,
    Json(request): Json<SaveCardRequest>,
) -> CardResult<Json<Value>> {
    request.validate()?;

    let (_, bytes) = decode_data_url(&request.image)
        .filter(|(mime_type, _)| mime_type.starts_with("image/"))
        .ok_or_else(|| {
            CardError::Validation("image must be a base64 image data URL".to_string())
        })?;

    let card = CardInsert {
        id: Uuid::new_v4().to_string(),
        name: request.name.trim().to_string(),
        title: request.title.trim().to_string(),
        skills: request.skills.clone(),
        stats: request.stats.clone(),
        photo_url: request.photo_url.clone(),
        created_at: Utc::now(),
    };

    state.db.insert_card(&card).await?;
    state.images.save(&card.id, &bytes).await?;

    Ok(Json(json!({ "id": card.id })))
}

pub async fn list_cards(State(state): State<AppState>) -> CardResult<Json<Vec<CardSummary>>> {
    Ok(Json(state.db.list_cards().await?))
}

pub async fn get_card(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> CardResult<Json<Value>> {
    let row = state
        .db
        .get_card(&id)
        .await?
        .ok_or(CardError::CardNotFound)?;

    Ok(Json(json!({
        "id": row.id,
        "name": row.name,
        "title": row.title,
        "skills": parse_json_column(&row.skills),
        "stats": parse_json_column(&row.stats),
        "photo_url": row.photo_url,
        "created_at": row.created_at,
    })))
}

pub async fn card_image(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> CardResult<Response> {
    // Ids are uuids; anything else stays out of the storage directory.
    if Uuid::parse_str(&id).is_err() {
        return Err(CardError::CardNotFound);
    }

    let bytes = state
        .images
        .load(&id)
        .await?
        .ok_or(CardError::CardNotFound)?;
    Ok(([(header::CONTENT_TYPE, "image/png")], bytes).into_response())
}

fn parse_json_column(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| json!([]))
}
