//! Notifications API endpoints

use api_types::notification::{
    NotificationListQuery, NotificationListResponse, NotificationView,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use uuid::Uuid;

use crate::{ServerError, server::ServerState};
use engine::users;

pub async fn list(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Query(query): Query<NotificationListQuery>,
) -> Result<Json<NotificationListResponse>, ServerError> {
    let unread_only = query.unread_only.unwrap_or(false);
    let notifications = state
        .engine
        .notifications(&user.username, unread_only)
        .await?;

    let notifications = notifications
        .into_iter()
        .map(|n| NotificationView {
            id: n.id,
            kind: n.kind,
            title: n.title,
            body: n.body,
            link: n.link,
            created_at: n.created_at,
            read_at: n.read_at,
        })
        .collect();
    Ok(Json(NotificationListResponse { notifications }))
}

pub async fn mark_read(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .mark_notification_read(&user.username, id, Utc::now())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
