//! Goods API endpoints

use api_types::good::{GoodCreated, GoodNew, GoodView};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use uuid::Uuid;

use crate::{ServerError, server::ServerState};
use engine::{Good, GoodNewCmd, users};

fn map_listing(listing: api_types::ListingKind) -> engine::ListingKind {
    match listing {
        api_types::ListingKind::RentalOnly => engine::ListingKind::RentalOnly,
        api_types::ListingKind::SaleOnly => engine::ListingKind::SaleOnly,
        api_types::ListingKind::Both => engine::ListingKind::Both,
    }
}

fn map_listing_back(listing: engine::ListingKind) -> api_types::ListingKind {
    match listing {
        engine::ListingKind::RentalOnly => api_types::ListingKind::RentalOnly,
        engine::ListingKind::SaleOnly => api_types::ListingKind::SaleOnly,
        engine::ListingKind::Both => api_types::ListingKind::Both,
    }
}

fn view(good: Good) -> GoodView {
    GoodView {
        id: good.id,
        owner_id: good.owner_id,
        title: good.title,
        description: good.description,
        category: good.category,
        condition: good.condition,
        listing: map_listing_back(good.listing),
        price_per_day: good.price_per_day,
        price_buy: good.price_buy,
        min_rental_days: good.min_rental_days,
        max_rental_days: good.max_rental_days,
        stock_quantity: good.stock_quantity,
        available_quantity: good.available_quantity,
        status: good.status.as_str().to_string(),
        created_at: good.created_at,
    }
}

pub async fn create(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<GoodNew>,
) -> Result<Json<GoodCreated>, ServerError> {
    let mut cmd = GoodNewCmd::new(
        &user.username,
        payload.title,
        map_listing(payload.listing),
        Utc::now(),
    );
    cmd.description = payload.description;
    cmd.category = payload.category;
    cmd.condition = payload.condition;
    cmd.owner_notes = payload.owner_notes;
    cmd.price_per_day = payload.price_per_day;
    cmd.price_buy = payload.price_buy;
    if let Some(min) = payload.min_rental_days {
        cmd.min_rental_days = min;
    }
    if let Some(max) = payload.max_rental_days {
        cmd.max_rental_days = max;
    }
    if let Some(stock) = payload.stock_quantity {
        cmd.stock_quantity = stock;
    }
    if let Some(track) = payload.track_availability {
        cmd.track_availability = track;
    }

    let id = state.engine.new_good(cmd).await?;
    Ok(Json(GoodCreated { id }))
}

pub async fn get(
    Extension(_user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<GoodView>, ServerError> {
    let good = state.engine.good(id).await?;
    Ok(Json(view(good)))
}

pub async fn archive(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state.engine.archive_good(id, &user.username).await?;
    Ok(StatusCode::NO_CONTENT)
}
