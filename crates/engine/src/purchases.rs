//! Purchase trades.
//!
//! Status walk: pending → approved → shipped → completed, cancel from
//! pending by either party. A purchase created as a buy-out of an active
//! rental carries the source trade reference and skips shipping entirely.
//! Completed purchases own a small independent return sub-state machine.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, TradeKind};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseStatus {
    Pending,
    Approved,
    Shipped,
    Completed,
    Canceled,
}

impl PurchaseStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Shipped => "shipped",
            Self::Completed => "completed",
            Self::Canceled => "canceled",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Canceled)
    }
}

impl TryFrom<&str> for PurchaseStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "shipped" => Ok(Self::Shipped),
            "completed" => Ok(Self::Completed),
            "canceled" => Ok(Self::Canceled),
            other => Err(EngineError::NotFound(format!(
                "invalid purchase status: {other}"
            ))),
        }
    }
}

/// Return sub-state, gated on the parent purchase being completed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnStatus {
    None,
    Requested,
    Approved,
    Shipped,
    Received,
    Rejected,
}

impl ReturnStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Requested => "requested",
            Self::Approved => "approved",
            Self::Shipped => "shipped",
            Self::Received => "received",
            Self::Rejected => "rejected",
        }
    }
}

impl TryFrom<&str> for ReturnStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "none" => Ok(Self::None),
            "requested" => Ok(Self::Requested),
            "approved" => Ok(Self::Approved),
            "shipped" => Ok(Self::Shipped),
            "received" => Ok(Self::Received),
            "rejected" => Ok(Self::Rejected),
            other => Err(EngineError::NotFound(format!(
                "invalid return status: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Purchase {
    pub id: Uuid,
    pub good_id: Uuid,
    pub seller_id: String,
    pub buyer_id: String,
    pub quantity: i64,
    pub price: i64,
    pub status: PurchaseStatus,
    pub return_status: ReturnStatus,
    /// Set when this purchase is a buy-out of an active rental/application.
    pub source_kind: Option<TradeKind>,
    pub source_id: Option<Uuid>,
    pub message: Option<String>,
    pub payment_method: Option<String>,
    pub postal_code: Option<String>,
    pub address: Option<String>,
    pub approved_at: Option<DateTime<Utc>>,
    pub shipped_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub canceled_at: Option<DateTime<Utc>>,
    pub return_requested_at: Option<DateTime<Utc>>,
    pub return_shipped_at: Option<DateTime<Utc>>,
    pub return_received_at: Option<DateTime<Utc>>,
    pub hidden_for_seller: bool,
    pub hidden_for_buyer: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "purchases")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub good_id: String,
    pub seller_id: String,
    pub buyer_id: String,
    pub quantity: i64,
    pub price: i64,
    pub status: String,
    pub return_status: String,
    pub source_kind: Option<String>,
    pub source_id: Option<String>,
    pub message: Option<String>,
    pub payment_method: Option<String>,
    pub postal_code: Option<String>,
    pub address: Option<String>,
    pub approved_at: Option<DateTimeUtc>,
    pub shipped_at: Option<DateTimeUtc>,
    pub completed_at: Option<DateTimeUtc>,
    pub canceled_at: Option<DateTimeUtc>,
    pub return_requested_at: Option<DateTimeUtc>,
    pub return_shipped_at: Option<DateTimeUtc>,
    pub return_received_at: Option<DateTimeUtc>,
    pub hidden_for_seller: bool,
    pub hidden_for_buyer: bool,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Whether this purchase was generated as a rental buy-out.
    pub fn is_buyout(&self) -> bool {
        self.source_id.is_some()
    }
}

impl From<&Purchase> for ActiveModel {
    fn from(purchase: &Purchase) -> Self {
        Self {
            id: ActiveValue::Set(purchase.id.to_string()),
            good_id: ActiveValue::Set(purchase.good_id.to_string()),
            seller_id: ActiveValue::Set(purchase.seller_id.clone()),
            buyer_id: ActiveValue::Set(purchase.buyer_id.clone()),
            quantity: ActiveValue::Set(purchase.quantity),
            price: ActiveValue::Set(purchase.price),
            status: ActiveValue::Set(purchase.status.as_str().to_string()),
            return_status: ActiveValue::Set(purchase.return_status.as_str().to_string()),
            source_kind: ActiveValue::Set(purchase.source_kind.map(|k| k.as_str().to_string())),
            source_id: ActiveValue::Set(purchase.source_id.map(|id| id.to_string())),
            message: ActiveValue::Set(purchase.message.clone()),
            payment_method: ActiveValue::Set(purchase.payment_method.clone()),
            postal_code: ActiveValue::Set(purchase.postal_code.clone()),
            address: ActiveValue::Set(purchase.address.clone()),
            approved_at: ActiveValue::Set(purchase.approved_at),
            shipped_at: ActiveValue::Set(purchase.shipped_at),
            completed_at: ActiveValue::Set(purchase.completed_at),
            canceled_at: ActiveValue::Set(purchase.canceled_at),
            return_requested_at: ActiveValue::Set(purchase.return_requested_at),
            return_shipped_at: ActiveValue::Set(purchase.return_shipped_at),
            return_received_at: ActiveValue::Set(purchase.return_received_at),
            hidden_for_seller: ActiveValue::Set(purchase.hidden_for_seller),
            hidden_for_buyer: ActiveValue::Set(purchase.hidden_for_buyer),
            created_at: ActiveValue::Set(purchase.created_at),
        }
    }
}

impl TryFrom<Model> for Purchase {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::NotFound("purchase not exists".to_string()))?,
            good_id: Uuid::parse_str(&model.good_id)
                .map_err(|_| EngineError::NotFound("good not exists".to_string()))?,
            seller_id: model.seller_id,
            buyer_id: model.buyer_id,
            quantity: model.quantity,
            price: model.price,
            status: PurchaseStatus::try_from(model.status.as_str())?,
            return_status: ReturnStatus::try_from(model.return_status.as_str())?,
            source_kind: model
                .source_kind
                .as_deref()
                .map(TradeKind::try_from)
                .transpose()?,
            source_id: model.source_id.and_then(|s| Uuid::parse_str(&s).ok()),
            message: model.message,
            payment_method: model.payment_method,
            postal_code: model.postal_code,
            address: model.address,
            approved_at: model.approved_at,
            shipped_at: model.shipped_at,
            completed_at: model.completed_at,
            canceled_at: model.canceled_at,
            return_requested_at: model.return_requested_at,
            return_shipped_at: model.return_shipped_at,
            return_received_at: model.return_received_at,
            hidden_for_seller: model.hidden_for_seller,
            hidden_for_buyer: model.hidden_for_buyer,
            created_at: model.created_at,
        })
    }
}
