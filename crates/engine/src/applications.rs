//! Applications: the unified rental-or-purchase request flow.
//!
//! One status chain serves both sub-kinds: pending → approved → shipped →
//! renting → return_shipped → completed, with reject (owner) and cancelled
//! (applicant) reachable from pending/approved. Completion releases the
//! reservation for rental-kind applications only.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::EngineError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationKind {
    Rental,
    Purchase,
}

impl ApplicationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rental => "rental",
            Self::Purchase => "purchase",
        }
    }
}

impl TryFrom<&str> for ApplicationKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "rental" => Ok(Self::Rental),
            "purchase" => Ok(Self::Purchase),
            other => Err(EngineError::NotFound(format!(
                "invalid application kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    Approved,
    Shipped,
    Renting,
    ReturnShipped,
    Completed,
    Rejected,
    Cancelled,
}

impl ApplicationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Shipped => "shipped",
            Self::Renting => "renting",
            Self::ReturnShipped => "return_shipped",
            Self::Completed => "completed",
            Self::Rejected => "rejected",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Rejected | Self::Cancelled)
    }
}

impl TryFrom<&str> for ApplicationStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "shipped" => Ok(Self::Shipped),
            "renting" => Ok(Self::Renting),
            "return_shipped" => Ok(Self::ReturnShipped),
            "completed" => Ok(Self::Completed),
            "rejected" => Ok(Self::Rejected),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(EngineError::NotFound(format!(
                "invalid application status: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub id: Uuid,
    pub good_id: Uuid,
    pub owner_id: String,
    pub applicant_id: String,
    pub kind: ApplicationKind,
    pub quantity: i64,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub total_price: i64,
    pub status: ApplicationStatus,
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
    pub hidden_for_applicant: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "applications")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub good_id: String,
    pub owner_id: String,
    pub applicant_id: String,
    pub kind: String,
    pub quantity: i64,
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
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
    pub hidden_for_applicant: bool,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Application> for ActiveModel {
    fn from(app: &Application) -> Self {
        Self {
            id: ActiveValue::Set(app.id.to_string()),
            good_id: ActiveValue::Set(app.good_id.to_string()),
            owner_id: ActiveValue::Set(app.owner_id.clone()),
            applicant_id: ActiveValue::Set(app.applicant_id.clone()),
            kind: ActiveValue::Set(app.kind.as_str().to_string()),
            quantity: ActiveValue::Set(app.quantity),
            start_date: ActiveValue::Set(app.start_date),
            end_date: ActiveValue::Set(app.end_date),
            total_price: ActiveValue::Set(app.total_price),
            status: ActiveValue::Set(app.status.as_str().to_string()),
            message: ActiveValue::Set(app.message.clone()),
            payment_method: ActiveValue::Set(app.payment_method.clone()),
            postal_code: ActiveValue::Set(app.postal_code.clone()),
            address: ActiveValue::Set(app.address.clone()),
            approved_at: ActiveValue::Set(app.approved_at),
            shipped_at: ActiveValue::Set(app.shipped_at),
            received_at: ActiveValue::Set(app.received_at),
            returned_at: ActiveValue::Set(app.returned_at),
            completed_at: ActiveValue::Set(app.completed_at),
            canceled_at: ActiveValue::Set(app.canceled_at),
            hidden_for_owner: ActiveValue::Set(app.hidden_for_owner),
            hidden_for_applicant: ActiveValue::Set(app.hidden_for_applicant),
            created_at: ActiveValue::Set(app.created_at),
        }
    }
}

impl TryFrom<Model> for Application {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::NotFound("application not exists".to_string()))?,
            good_id: Uuid::parse_str(&model.good_id)
                .map_err(|_| EngineError::NotFound("good not exists".to_string()))?,
            owner_id: model.owner_id,
            applicant_id: model.applicant_id,
            kind: ApplicationKind::try_from(model.kind.as_str())?,
            quantity: model.quantity,
            start_date: model.start_date,
            end_date: model.end_date,
            total_price: model.total_price,
            status: ApplicationStatus::try_from(model.status.as_str())?,
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
            hidden_for_applicant: model.hidden_for_applicant,
            created_at: model.created_at,
        })
    }
}
