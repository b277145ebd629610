//! Rental trades.
//!
//! Status walk: requested → approved → shipped → renting → return_shipped →
//! completed, with cancel reachable from requested/approved by either party.
//! Rows are never hard-deleted; terminal rows carry per-party hide flags.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::EngineError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RentalStatus {
    Requested,
    Approved,
    Shipped,
    Renting,
    ReturnShipped,
    Completed,
    Canceled,
}

impl RentalStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Requested => "requested",
            Self::Approved => "approved",
            Self::Shipped => "shipped",
            Self::Renting => "renting",
            Self::ReturnShipped => "return_shipped",
            Self::Completed => "completed",
            Self::Canceled => "canceled",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Canceled)
    }
}

impl TryFrom<&str> for RentalStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "requested" => Ok(Self::Requested),
            "approved" => Ok(Self::Approved),
            "shipped" => Ok(Self::Shipped),
            "renting" => Ok(Self::Renting),
            "return_shipped" => Ok(Self::ReturnShipped),
            "completed" => Ok(Self::Completed),
            "canceled" => Ok(Self::Canceled),
            other => Err(EngineError::NotFound(format!(
                "invalid rental status: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rental {
    pub id: Uuid,
    pub good_id: Uuid,
    pub owner_id: String,
    pub renter_id: String,
    pub quantity: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_price: i64,
    pub status: RentalStatus,
    pub message: Option<String>,
    pub payment_method: Option<String>,
    pub postal_code: Option<String>,
    pub address: Option<String>,
    pub approved_at: Option<DateTime<Utc>>,
    pub shipped_at: Option<DateTime<Utc>>,
    pub received_at: Option<DateTime<Utc>>,
    pub returned_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub canceled_at: Option<DateTime<Utc>>,
    pub hidden_for_owner: bool,
    pub hidden_for_renter: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "rentals")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub good_id: String,
    pub owner_id: String,
    pub renter_id: String,
    pub quantity: i64,
    pub start_date: Date,
    pub end_date: Date,
    pub total_price: i64,
    pub status: String,
    pub message: Option<String>,
    pub payment_method: Option<String>,
    pub postal_code: Option<String>,
    pub address: Option<String>,
    pub approved_at: Option<DateTimeUtc>,
    pub shipped_at: Option<DateTimeUtc>,
    pub received_at: Option<DateTimeUtc>,
    pub returned_at: Option<DateTimeUtc>,
    pub completed_at: Option<DateTimeUtc>,
    pub canceled_at: Option<DateTimeUtc>,
    pub hidden_for_owner: bool,
    pub hidden_for_renter: bool,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Rental> for ActiveModel {
    fn from(rental: &Rental) -> Self {
        Self {
            id: ActiveValue::Set(rental.id.to_string()),
            good_id: ActiveValue::Set(rental.good_id.to_string()),
            owner_id: ActiveValue::Set(rental.owner_id.clone()),
            renter_id: ActiveValue::Set(rental.renter_id.clone()),
            quantity: ActiveValue::Set(rental.quantity),
            start_date: ActiveValue::Set(rental.start_date),
            end_date: ActiveValue::Set(rental.end_date),
            total_price: ActiveValue::Set(rental.total_price),
            status: ActiveValue::Set(rental.status.as_str().to_string()),
            message: ActiveValue::Set(rental.message.clone()),
            payment_method: ActiveValue::Set(rental.payment_method.clone()),
            postal_code: ActiveValue::Set(rental.postal_code.clone()),
            address: ActiveValue::Set(rental.address.clone()),
            approved_at: ActiveValue::Set(rental.approved_at),
            shipped_at: ActiveValue::Set(rental.shipped_at),
            received_at: ActiveValue::Set(rental.received_at),
            returned_at: ActiveValue::Set(rental.returned_at),
            completed_at: ActiveValue::Set(rental.completed_at),
            canceled_at: ActiveValue::Set(rental.canceled_at),
            hidden_for_owner: ActiveValue::Set(rental.hidden_for_owner),
            hidden_for_renter: ActiveValue::Set(rental.hidden_for_renter),
            created_at: ActiveValue::Set(rental.created_at),
        }
    }
}

impl TryFrom<Model> for Rental {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::NotFound("rental not exists".to_string()))?,
            good_id: Uuid::parse_str(&model.good_id)
                .map_err(|_| EngineError::NotFound("good not exists".to_string()))?,
            owner_id: model.owner_id,
            renter_id: model.renter_id,
            quantity: model.quantity,
            start_date: model.start_date,
            end_date: model.end_date,
            total_price: model.total_price,
            status: RentalStatus::try_from(model.status.as_str())?,
            message: model.message,
            payment_method: model.payment_method,
            postal_code: model.postal_code,
            address: model.address,
            approved_at: model.approved_at,
            shipped_at: model.shipped_at,
            received_at: model.received_at,
            returned_at: model.returned_at,
            completed_at: model.completed_at,
            canceled_at: model.canceled_at,
            hidden_for_owner: model.hidden_for_owner,
            hidden_for_renter: model.hidden_for_renter,
            created_at: model.created_at,
        })
    }
}
