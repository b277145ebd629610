//! Shared trade primitives.
//!
//! A trade is one deal between two parties over a good. Three concrete kinds
//! share the shape: rentals, purchases and applications (the unified
//! rental-or-purchase request). Everything that needs to point at "some
//! trade" regardless of kind goes through [`TradeRef`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::EngineError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeKind {
    Rental,
    Purchase,
    Application,
}

impl TradeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rental => "rental",
            Self::Purchase => "purchase",
            Self::Application => "application",
        }
    }
}

impl TryFrom<&str> for TradeKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "rental" => Ok(Self::Rental),
            "purchase" => Ok(Self::Purchase),
            "application" => Ok(Self::Application),
            other => Err(EngineError::NotFound(format!(
                "invalid trade kind: {other}"
            ))),
        }
    }
}

/// A kind-tagged trade id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeRef {
    pub kind: TradeKind,
    pub id: Uuid,
}

impl TradeRef {
    pub fn new(kind: TradeKind, id: Uuid) -> Self {
        Self { kind, id }
    }
}

/// User actions accepted by [`Engine::transition`].
///
/// Which actions apply, from which status, and for which role, is decided by
/// the per-kind state tables; an action a kind does not know is an invalid
/// transition, not an error in the request shape.
///
/// [`Engine::transition`]: crate::Engine::transition
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

impl TradeAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Reject => "reject",
            Self::Ship => "ship",
            Self::Receive => "receive",
            Self::ShipBack => "ship_back",
            Self::Confirm => "confirm",
            Self::Cancel => "cancel",
            Self::Hide => "hide",
            Self::RequestReturn => "request_return",
            Self::ApproveReturn => "approve_return",
            Self::RejectReturn => "reject_return",
            Self::ShipReturn => "ship_return",
            Self::ReceiveReturn => "receive_return",
        }
    }

    /// Actions that carry a carrier tracking number.
    pub fn needs_tracking(self) -> bool {
        matches!(self, Self::Ship | Self::ShipBack | Self::ShipReturn)
    }
}

impl TryFrom<&str> for TradeAction {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "approve" => Ok(Self::Approve),
            "reject" => Ok(Self::Reject),
            "ship" => Ok(Self::Ship),
            "receive" => Ok(Self::Receive),
            "ship_back" => Ok(Self::ShipBack),
            "confirm" => Ok(Self::Confirm),
            "cancel" => Ok(Self::Cancel),
            "hide" => Ok(Self::Hide),
            "request_return" => Ok(Self::RequestReturn),
            "approve_return" => Ok(Self::ApproveReturn),
            "reject_return" => Ok(Self::RejectReturn),
            "ship_return" => Ok(Self::ShipReturn),
            "receive_return" => Ok(Self::ReceiveReturn),
            other => Err(EngineError::InvalidTransition(format!(
                "unknown action: {other}"
            ))),
        }
    }
}

/// The two fixed roles on every trade.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Party {
    Owner,
    Counterparty,
}

/// Which side of a trade a listing query looks at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeSide {
    /// Trades the user requested (renter / buyer / applicant).
    Mine,
    /// Trades on the user's own listings (owner / seller).
    Received,
}

/// Unified read model for listings and detail views.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TradeView {
    pub kind: TradeKind,
    pub id: Uuid,
    pub good_id: Uuid,
    pub owner_id: String,
    pub counterparty_id: String,
    pub quantity: i64,
    pub total_price: i64,
    pub status: String,
    /// Purchase return sub-state; `None` for other kinds.
    pub return_status: Option<String>,
    pub payment_method: Option<String>,
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
}
