//! Shipment records.
//!
//! One row per (trade, direction), upserted rather than inserted, so a
//! re-submitted tracking number updates in place. Sender and recipient are
//! contact snapshots frozen at ship time.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{ContactSnapshot, EngineError, TradeKind, TradeRef};

/// Which physical movement a record tracks.
///
/// `Outbound` is owner → counterparty, `Return` is the rental flow back to
/// the owner, `Inbound` is a purchase return back to the seller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShipmentDirection {
    Outbound,
    Return,
    Inbound,
}

impl ShipmentDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Outbound => "outbound",
            Self::Return => "return",
            Self::Inbound => "inbound",
        }
    }
}

impl TryFrom<&str> for ShipmentDirection {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "outbound" => Ok(Self::Outbound),
            "return" => Ok(Self::Return),
            "inbound" => Ok(Self::Inbound),
            other => Err(EngineError::NotFound(format!(
                "invalid shipment direction: {other}"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShipmentStatus {
    Created,
    InTransit,
    Delivered,
    Canceled,
}

impl ShipmentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::InTransit => "in_transit",
            Self::Delivered => "delivered",
            Self::Canceled => "canceled",
        }
    }
}

impl TryFrom<&str> for ShipmentStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "created" => Ok(Self::Created),
            "in_transit" => Ok(Self::InTransit),
            "delivered" => Ok(Self::Delivered),
            "canceled" => Ok(Self::Canceled),
            other => Err(EngineError::NotFound(format!(
                "invalid shipment status: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Shipment {
    pub id: Uuid,
    pub trade: TradeRef,
    pub direction: ShipmentDirection,
    pub sender: ContactSnapshot,
    pub recipient: ContactSnapshot,
    pub tracking_number: String,
    pub status: ShipmentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "shipments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub trade_kind: String,
    pub trade_id: String,
    pub direction: String,
    pub sender_name: String,
    pub sender_phone: String,
    pub sender_address: String,
    pub recipient_name: String,
    pub recipient_phone: String,
    pub recipient_address: String,
    pub tracking_number: String,
    pub status: String,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Shipment> for ActiveModel {
    fn from(shipment: &Shipment) -> Self {
        Self {
            id: ActiveValue::Set(shipment.id.to_string()),
            trade_kind: ActiveValue::Set(shipment.trade.kind.as_str().to_string()),
            trade_id: ActiveValue::Set(shipment.trade.id.to_string()),
            direction: ActiveValue::Set(shipment.direction.as_str().to_string()),
            sender_name: ActiveValue::Set(shipment.sender.name.clone()),
            sender_phone: ActiveValue::Set(shipment.sender.phone.clone()),
            sender_address: ActiveValue::Set(shipment.sender.address.clone()),
            recipient_name: ActiveValue::Set(shipment.recipient.name.clone()),
            recipient_phone: ActiveValue::Set(shipment.recipient.phone.clone()),
            recipient_address: ActiveValue::Set(shipment.recipient.address.clone()),
            tracking_number: ActiveValue::Set(shipment.tracking_number.clone()),
            status: ActiveValue::Set(shipment.status.as_str().to_string()),
            created_at: ActiveValue::Set(shipment.created_at),
            updated_at: ActiveValue::Set(shipment.updated_at),
        }
    }
}

impl TryFrom<Model> for Shipment {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::NotFound("shipment not exists".to_string()))?,
            trade: TradeRef::new(
                TradeKind::try_from(model.trade_kind.as_str())?,
                Uuid::parse_str(&model.trade_id)
                    .map_err(|_| EngineError::NotFound("trade not exists".to_string()))?,
            ),
            direction: ShipmentDirection::try_from(model.direction.as_str())?,
            sender: ContactSnapshot {
                name: model.sender_name,
                phone: model.sender_phone,
                address: model.sender_address,
            },
            recipient: ContactSnapshot {
                name: model.recipient_name,
                phone: model.recipient_phone,
                address: model.recipient_address,
            },
            tracking_number: model.tracking_number,
            status: ShipmentStatus::try_from(model.status.as_str())?,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
