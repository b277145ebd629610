//! Channel binding API endpoints
//!
//! Only the binding is served here; message transport lives elsewhere.

use api_types::channel::{ChannelOpen, ChannelView};
use axum::{
    Extension, Json,
    extract::{Path, State},
};
use chrono::Utc;
use uuid::Uuid;

use crate::{ServerError, server::ServerState};
use engine::{EngineError, TradeRef, users};

pub async fn open(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<ChannelOpen>,
) -> Result<Json<ChannelView>, ServerError> {
    if payload.peer == user.username {
        return Err(ServerError::Generic(
            "cannot open a channel with yourself".to_string(),
        ));
    }

    let id = state
        .engine
        .open_channel(payload.good_id, &user.username, &payload.peer, Utc::now())
        .await?;
    Ok(Json(ChannelView {
        id,
        good_id: payload.good_id,
        user_a: user.username,
        user_b: payload.peer,
        created_at: Utc::now(),
    }))
}

pub async fn get(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path((kind, id)): Path<(String, Uuid)>,
) -> Result<Json<ChannelView>, ServerError> {
    let kind = engine::TradeKind::try_from(kind.as_str())?;
    let channel = state.engine.channel_for(TradeRef::new(kind, id)).await?;

    if channel.user_a != user.username && channel.user_b != user.username {
        return Err(EngineError::Forbidden("not a party to this trade".to_string()).into());
    }

    Ok(Json(ChannelView {
        id: channel.id,
        good_id: channel.good_id,
        user_a: channel.user_a,
        user_b: channel.user_b,
        created_at: channel.created_at,
    }))
}
