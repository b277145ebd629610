//! Trades API endpoints

use api_types::trade::{
    BuyoutNew, BuyoutQuote, TradeCreated, TradeListQuery, TradeListResponse, TradeNew, TradeView,
    TransitionRequest,
};
use api_types::shipment::{ContactView, ShipmentListResponse, ShipmentView};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use chrono::Utc;
use uuid::Uuid;

use crate::{ServerError, server::ServerState};
use engine::{
    BuyoutCmd, TradeListCmd, TradeNewCmd, TradeRef, TransitionCmd, users,
};

fn map_kind(kind: api_types::TradeKind) -> engine::TradeKind {
    match kind {
        api_types::TradeKind::Rental => engine::TradeKind::Rental,
        api_types::TradeKind::Purchase => engine::TradeKind::Purchase,
        api_types::TradeKind::Application => engine::TradeKind::Application,
    }
}

fn map_kind_back(kind: engine::TradeKind) -> api_types::TradeKind {
    match kind {
        engine::TradeKind::Rental => api_types::TradeKind::Rental,
        engine::TradeKind::Purchase => api_types::TradeKind::Purchase,
        engine::TradeKind::Application => api_types::TradeKind::Application,
    }
}

fn map_action(action: api_types::TradeAction) -> engine::TradeAction {
    match action {
        api_types::TradeAction::Approve => engine::TradeAction::Approve,
        api_types::TradeAction::Reject => engine::TradeAction::Reject,
        api_types::TradeAction::Ship => engine::TradeAction::Ship,
        api_types::TradeAction::Receive => engine::TradeAction::Receive,
        api_types::TradeAction::ShipBack => engine::TradeAction::ShipBack,
        api_types::TradeAction::Confirm => engine::TradeAction::Confirm,
        api_types::TradeAction::Cancel => engine::TradeAction::Cancel,
        api_types::TradeAction::Hide => engine::TradeAction::Hide,
        api_types::TradeAction::RequestReturn => engine::TradeAction::RequestReturn,
        api_types::TradeAction::ApproveReturn => engine::TradeAction::ApproveReturn,
        api_types::TradeAction::RejectReturn => engine::TradeAction::RejectReturn,
        api_types::TradeAction::ShipReturn => engine::TradeAction::ShipReturn,
        api_types::TradeAction::ReceiveReturn => engine::TradeAction::ReceiveReturn,
    }
}

fn map_side(side: api_types::TradeSide) -> engine::TradeSide {
    match side {
        api_types::TradeSide::Mine => engine::TradeSide::Mine,
        api_types::TradeSide::Received => engine::TradeSide::Received,
    }
}

fn map_application_kind(kind: api_types::ApplicationKind) -> engine::ApplicationKind {
    match kind {
        api_types::ApplicationKind::Rental => engine::ApplicationKind::Rental,
        api_types::ApplicationKind::Purchase => engine::ApplicationKind::Purchase,
    }
}

fn view(trade: engine::TradeView) -> TradeView {
    TradeView {
        kind: map_kind_back(trade.kind),
        id: trade.id,
        good_id: trade.good_id,
        owner_id: trade.owner_id,
        counterparty_id: trade.counterparty_id,
        quantity: trade.quantity,
        total_price: trade.total_price,
        status: trade.status,
        return_status: trade.return_status,
        payment_method: trade.payment_method,
        message: trade.message,
        created_at: trade.created_at,
    }
}

/// Parse the `{kind}/{id}` path segments into a trade reference.
fn trade_ref(kind: &str, id: Uuid) -> Result<TradeRef, ServerError> {
    let kind = engine::TradeKind::try_from(kind)?;
    Ok(TradeRef::new(kind, id))
}

pub async fn create(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<TradeNew>,
) -> Result<Json<TradeCreated>, ServerError> {
    let mut cmd = TradeNewCmd::new(
        map_kind(payload.kind),
        payload.good_id,
        &user.username,
        Utc::now(),
    );
    if let Some(quantity) = payload.quantity {
        cmd.quantity = quantity;
    }
    cmd.start_date = payload.start_date;
    cmd.end_date = payload.end_date;
    cmd.application_kind = payload.application_kind.map(map_application_kind);
    cmd.meta.postal_code = payload.postal_code;
    cmd.meta.address = payload.address;
    cmd.meta.payment_method = payload.payment_method;
    cmd.meta.message = payload.message;

    let id = state.engine.create_trade(cmd).await?;
    Ok(Json(TradeCreated { id }))
}

pub async fn list(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Query(query): Query<TradeListQuery>,
) -> Result<Json<TradeListResponse>, ServerError> {
    let mut cmd = TradeListCmd::new(&user.username, map_side(query.side));
    cmd.status = query.status;
    cmd.include_hidden = query.include_hidden.unwrap_or(false);

    let trades = state.engine.list_trades(cmd).await?;
    Ok(Json(TradeListResponse {
        trades: trades.into_iter().map(view).collect(),
    }))
}

pub async fn get(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path((kind, id)): Path<(String, Uuid)>,
) -> Result<Json<TradeView>, ServerError> {
    let trade = trade_ref(&kind, id)?;
    let found = state.engine.trade(trade, &user.username).await?;
    Ok(Json(view(found)))
}

pub async fn transition(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path((kind, id)): Path<(String, Uuid)>,
    Json(payload): Json<TransitionRequest>,
) -> Result<Json<TradeView>, ServerError> {
    let trade = trade_ref(&kind, id)?;
    let mut cmd = TransitionCmd::new(trade, map_action(payload.action), &user.username, Utc::now());
    cmd.tracking_number = payload.tracking_number;

    state.engine.transition(cmd).await?;
    let updated = state.engine.trade(trade, &user.username).await?;
    Ok(Json(view(updated)))
}

pub async fn shipments(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path((kind, id)): Path<(String, Uuid)>,
) -> Result<Json<ShipmentListResponse>, ServerError> {
    let trade = trade_ref(&kind, id)?;
    let shipments = state.engine.shipments_for(trade, &user.username).await?;

    let shipments = shipments
        .into_iter()
        .map(|s| ShipmentView {
            id: s.id,
            direction: s.direction.as_str().to_string(),
            sender: ContactView {
                name: s.sender.name,
                phone: s.sender.phone,
                address: s.sender.address,
            },
            recipient: ContactView {
                name: s.recipient.name,
                phone: s.recipient.phone,
                address: s.recipient.address,
            },
            tracking_number: s.tracking_number,
            status: s.status.as_str().to_string(),
            created_at: s.created_at,
            updated_at: s.updated_at,
        })
        .collect();
    Ok(Json(ShipmentListResponse { shipments }))
}

pub async fn buyout(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path((kind, id)): Path<(String, Uuid)>,
    Json(payload): Json<BuyoutNew>,
) -> Result<Json<TradeCreated>, ServerError> {
    let source = trade_ref(&kind, id)?;
    let mut cmd = BuyoutCmd::new(source, &user.username, Utc::now());
    cmd.payment_method = payload.payment_method;
    cmd.message = payload.message;

    let id = state.engine.create_buyout(cmd).await?;
    Ok(Json(TradeCreated { id }))
}

pub async fn buyout_quote(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path((kind, id)): Path<(String, Uuid)>,
) -> Result<Json<BuyoutQuote>, ServerError> {
    let source = trade_ref(&kind, id)?;
    let payable = state
        .engine
        .buyout_quote(source, &user.username, Utc::now())
        .await?;
    Ok(Json(BuyoutQuote { payable }))
}
