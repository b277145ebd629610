//! Goods: the rentable/sellable items.
//!
//! `available_quantity` is the reservable pool and is only ever touched by
//! the inventory ops inside a database transaction. Listings that opt out of
//! availability tracking store NULL and the inventory ops skip them.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

/// Which trade kinds a listing accepts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingKind {
    RentalOnly,
    SaleOnly,
    Both,
}

impl ListingKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RentalOnly => "rental_only",
            Self::SaleOnly => "sale_only",
            Self::Both => "both",
        }
    }

    pub fn supports_rental(self) -> bool {
        matches!(self, Self::RentalOnly | Self::Both)
    }

    pub fn supports_sale(self) -> bool {
        matches!(self, Self::SaleOnly | Self::Both)
    }
}

impl TryFrom<&str> for ListingKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "rental_only" => Ok(Self::RentalOnly),
            "sale_only" => Ok(Self::SaleOnly),
            "both" => Ok(Self::Both),
            other => Err(EngineError::NotFound(format!(
                "invalid listing kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoodStatus {
    Listed,
    Archived,
}

impl GoodStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Listed => "listed",
            Self::Archived => "archived",
        }
    }
}

impl TryFrom<&str> for GoodStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "listed" => Ok(Self::Listed),
            "archived" => Ok(Self::Archived),
            other => Err(EngineError::NotFound(format!(
                "invalid good status: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Good {
    pub id: Uuid,
    pub owner_id: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub condition: Option<String>,
    pub owner_notes: Option<String>,
    pub listing: ListingKind,
    pub price_per_day: Option<i64>,
    pub price_buy: Option<i64>,
    pub min_rental_days: i64,
    pub max_rental_days: i64,
    pub stock_quantity: i64,
    /// `None` when the listing does not track availability.
    pub available_quantity: Option<i64>,
    pub status: GoodStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "goods")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub owner_id: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub condition: Option<String>,
    pub owner_notes: Option<String>,
    pub listing: String,
    pub price_per_day: Option<i64>,
    pub price_buy: Option<i64>,
    pub min_rental_days: i64,
    pub max_rental_days: i64,
    pub stock_quantity: i64,
    pub available_quantity: Option<i64>,
    pub status: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Good> for ActiveModel {
    fn from(good: &Good) -> Self {
        Self {
            id: ActiveValue::Set(good.id.to_string()),
            owner_id: ActiveValue::Set(good.owner_id.clone()),
            title: ActiveValue::Set(good.title.clone()),
            description: ActiveValue::Set(good.description.clone()),
            category: ActiveValue::Set(good.category.clone()),
            condition: ActiveValue::Set(good.condition.clone()),
            owner_notes: ActiveValue::Set(good.owner_notes.clone()),
            listing: ActiveValue::Set(good.listing.as_str().to_string()),
            price_per_day: ActiveValue::Set(good.price_per_day),
            price_buy: ActiveValue::Set(good.price_buy),
            min_rental_days: ActiveValue::Set(good.min_rental_days),
            max_rental_days: ActiveValue::Set(good.max_rental_days),
            stock_quantity: ActiveValue::Set(good.stock_quantity),
            available_quantity: ActiveValue::Set(good.available_quantity),
            status: ActiveValue::Set(good.status.as_str().to_string()),
            created_at: ActiveValue::Set(good.created_at),
        }
    }
}

impl TryFrom<Model> for Good {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::NotFound("good not exists".to_string()))?,
            owner_id: model.owner_id,
            title: model.title,
            description: model.description,
            category: model.category,
            condition: model.condition,
            owner_notes: model.owner_notes,
            listing: ListingKind::try_from(model.listing.as_str())?,
            price_per_day: model.price_per_day,
            price_buy: model.price_buy,
            min_rental_days: model.min_rental_days,
            max_rental_days: model.max_rental_days,
            stock_quantity: model.stock_quantity,
            available_quantity: model.available_quantity,
            status: GoodStatus::try_from(model.status.as_str())?,
            created_at: model.created_at,
        })
    }
}

impl Model {
    /// Availability check at trade creation time. Untracked listings always
    /// pass.
    pub fn has_available(&self, quantity: i64) -> bool {
        match self.available_quantity {
            Some(available) => available >= quantity,
            None => true,
        }
    }
}

pub(crate) fn validate_listing_prices(
    listing: ListingKind,
    price_per_day: Option<i64>,
    price_buy: Option<i64>,
) -> ResultEngine<()> {
    if listing.supports_rental() && price_per_day.is_none() {
        return Err(EngineError::InvalidTransition(
            "rental listings require price_per_day".to_string(),
        ));
    }
    if listing.supports_sale() && price_buy.is_none() {
        return Err(EngineError::InvalidTransition(
            "sale listings require price_buy".to_string(),
        ));
    }
    if price_per_day.is_some_and(|p| p < 0) || price_buy.is_some_and(|p| p < 0) {
        return Err(EngineError::InvalidTransition(
            "prices must not be negative".to_string(),
        ));
    }
    Ok(())
}
