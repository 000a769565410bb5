use axum::extract::{Path, State};
use axum::Json;
use serde_json::{json, Value};

use crate::error::{CardError, CardResult};
use crate::models::{EnhanceRequest, FanoutRequest, PortraitRequest, StatsRequest};
use crate::pipeline::session::PortraitSession;
use crate::pipeline::{fanout, portrait, stats};
use crate::state::{AppState, Capabilities};

pub async fn health(State(state): State<AppState>) -> Json<Capabilities> {
    Json(state.capabilities())
}

pub async fn generate_stats(
    State(state): State<AppState>,
    Json(request): Json<StatsRequest>,
) -> CardResult<Json<Value>> {
    let stats = stats::generate_stats(state.model(), &request).await?;
    Ok(Json(json!({ "stats": stats })))
}

pub async fn generate_image(
    State(state): State<AppState>,
    Json(request): Json<PortraitRequest>,
) -> CardResult<Json<Value>> {
    request.validate()?;

    let Some(model) = state.model() else {
        return Ok(Json(json!({
            "image": null,
            "message": "AI not available. Please upload a photo instead.",
        })));
    };

    let image = portrait::synthesize_portrait(model, &request).await?;
    Ok(Json(json!({ "image": image })))
}

pub async fn enhance_photo(
    State(state): State<AppState>,
    Json(request): Json<EnhanceRequest>,
) -> CardResult<Json<Value>> {
    request.validate()?;

    let Some(model) = state.model() else {
        return Ok(Json(json!({ "image": null })));
    };

    let image = portrait::enhance_portrait(model, &request).await?;
    Ok(Json(json!({ "image": image })))
}

pub async fn generate_portraits(
    State(state): State<AppState>,
    Json(request): Json<FanoutRequest>,
) -> CardResult<Json<Value>> {
    request.validate()?;

    let model = state.model_handle().ok_or(CardError::CapabilityUnavailable)?;
    let images = fanout::generate_portraits(model, &request).await?;

    let session = PortraitSession::new(
        images,
        request.name.trim().to_string(),
        request.title.trim().to_string(),
        request.skills.clone(),
    );
    let session_id = state.sessions.insert(session);
    Ok(Json(json!({ "sessionId": session_id })))
}

pub async fn get_portraits(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> CardResult<Json<Value>> {
    let session = state.sessions.take(&session_id)?;
    Ok(Json(json!({
        "images": session.images,
        "name": session.name,
        "title": session.title,
        "skills": session.skills,
    })))
}
