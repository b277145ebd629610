//! Wire types shared between the server and its clients.
//!
//! These mirror the engine's vocabulary without depending on it, so clients
//! can link this crate alone.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeKind {
    Rental,
    Purchase,
    Application,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeAction {
    Approve,
    Reject,
    Ship,
    Receive,
    ShipBack,
    Confirm,
    Cancel,
    Hide,
    RequestReturn,
    ApproveReturn,
    RejectReturn,
    ShipReturn,
    ReceiveReturn,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeSide {
    Mine,
    Received,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationKind {
    Rental,
    Purchase,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingKind {
    RentalOnly,
    SaleOnly,
    Both,
}

pub mod good {
    use super::*;

    /// Request body for creating a listing.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct GoodNew {
        pub title: String,
        #[serde(default)]
        pub description: String,
        #[serde(default)]
        pub category: String,
        pub condition: Option<String>,
        pub owner_notes: Option<String>,
        pub listing: ListingKind,
        pub price_per_day: Option<i64>,
        pub price_buy: Option<i64>,
        pub min_rental_days: Option<i64>,
        pub max_rental_days: Option<i64>,
        pub stock_quantity: Option<i64>,
        /// `false` opts out of availability tracking.
        pub track_availability: Option<bool>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct GoodCreated {
        pub id: Uuid,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct GoodView {
        pub id: Uuid,
        pub owner_id: String,
        pub title: String,
        pub description: String,
        pub category: String,
        pub condition: Option<String>,
        pub listing: ListingKind,
        pub price_per_day: Option<i64>,
        pub price_buy: Option<i64>,
        pub min_rental_days: i64,
        pub max_rental_days: i64,
        pub stock_quantity: i64,
        pub available_quantity: Option<i64>,
        pub status: String,
        pub created_at: DateTime<Utc>,
    }
}

pub mod trade {
    use super::*;

    /// Request body for creating a trade.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct TradeNew {
        pub kind: TradeKind,
        pub good_id: Uuid,
        pub quantity: Option<i64>,
        pub start_date: Option<NaiveDate>,
        pub end_date: Option<NaiveDate>,
        /// Required when `kind` is `application`.
        pub application_kind: Option<ApplicationKind>,
        pub postal_code: Option<String>,
        pub address: Option<String>,
        pub payment_method: Option<String>,
        pub message: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TradeCreated {
        pub id: Uuid,
    }

    /// Request body for one state machine step.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransitionRequest {
        pub action: TradeAction,
        pub tracking_number: Option<String>,
    }

    /// Query string for trade listings.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct TradeListQuery {
        pub side: TradeSide,
        pub status: Option<String>,
        pub include_hidden: Option<bool>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TradeListResponse {
        pub trades: Vec<TradeView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TradeView {
        pub kind: TradeKind,
        pub id: Uuid,
        pub good_id: Uuid,
        pub owner_id: String,
        pub counterparty_id: String,
        pub quantity: i64,
        pub total_price: i64,
        pub status: String,
        pub return_status: Option<String>,
        pub payment_method: Option<String>,
        pub message: Option<String>,
        pub created_at: DateTime<Utc>,
    }

    /// Request body for converting an active rental into a purchase.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct BuyoutNew {
        pub payment_method: Option<String>,
        pub message: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BuyoutQuote {
        pub payable: i64,
    }
}

pub mod shipment {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ContactView {
        pub name: String,
        pub phone: String,
        pub address: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ShipmentView {
        pub id: Uuid,
        pub direction: String,
        pub sender: ContactView,
        pub recipient: ContactView,
        pub tracking_number: String,
        pub status: String,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ShipmentListResponse {
        pub shipments: Vec<ShipmentView>,
    }
}

pub mod channel {
    use super::*;

    /// Request body for opening a pre-transaction discussion.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct ChannelOpen {
        pub good_id: Uuid,
        pub peer: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ChannelView {
        pub id: Uuid,
        pub good_id: Uuid,
        pub user_a: String,
        pub user_b: String,
        pub created_at: DateTime<Utc>,
    }
}

pub mod notification {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct NotificationListQuery {
        pub unread_only: Option<bool>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct NotificationView {
        pub id: Uuid,
        pub kind: String,
        pub title: String,
        pub body: String,
        pub link: Option<String>,
        pub created_at: DateTime<Utc>,
        pub read_at: Option<DateTime<Utc>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct NotificationListResponse {
        pub notifications: Vec<NotificationView>,
    }
}
