//! Command structs for engine operations.
//!
//! These types group parameters for write operations, keeping call sites
//! readable and avoiding long argument lists. Timestamps are always passed
//! in by the caller so operations stay deterministic under test.

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::{ApplicationKind, ListingKind, TradeAction, TradeKind, TradeRef, TradeSide};

/// Create a good listing.
#[derive(Clone, Debug)]
pub struct GoodNewCmd {
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
    /// `false` opts the listing out of availability tracking.
    pub track_availability: bool,
    pub at: DateTime<Utc>,
}

impl GoodNewCmd {
    #[must_use]
    pub fn new(
        owner_id: impl Into<String>,
        title: impl Into<String>,
        listing: ListingKind,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            owner_id: owner_id.into(),
            title: title.into(),
            description: String::new(),
            category: String::new(),
            condition: None,
            owner_notes: None,
            listing,
            price_per_day: None,
            price_buy: None,
            min_rental_days: 1,
            max_rental_days: 30,
            stock_quantity: 1,
            track_availability: true,
            at,
        }
    }

    #[must_use]
    pub fn price_per_day(mut self, price: i64) -> Self {
        self.price_per_day = Some(price);
        self
    }

    #[must_use]
    pub fn price_buy(mut self, price: i64) -> Self {
        self.price_buy = Some(price);
        self
    }

    #[must_use]
    pub fn stock(mut self, quantity: i64) -> Self {
        self.stock_quantity = quantity;
        self
    }

    #[must_use]
    pub fn untracked(mut self) -> Self {
        self.track_availability = false;
        self
    }

    #[must_use]
    pub fn rental_bounds(mut self, min_days: i64, max_days: i64) -> Self {
        self.min_rental_days = min_days;
        self.max_rental_days = max_days;
        self
    }
}

/// Destination and payment details shared by all trade creations.
#[derive(Clone, Debug, Default)]
pub struct TradeMeta {
    pub postal_code: Option<String>,
    pub address: Option<String>,
    pub payment_method: Option<String>,
    pub message: Option<String>,
}

/// Create a trade (the initial requested/pending record).
#[derive(Clone, Debug)]
pub struct TradeNewCmd {
    pub kind: TradeKind,
    pub good_id: Uuid,
    /// The requesting counterparty (renter / buyer / applicant).
    pub actor: String,
    pub quantity: i64,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// Required when `kind` is `Application`.
    pub application_kind: Option<ApplicationKind>,
    pub meta: TradeMeta,
    pub at: DateTime<Utc>,
}

impl TradeNewCmd {
    #[must_use]
    pub fn new(kind: TradeKind, good_id: Uuid, actor: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            kind,
            good_id,
            actor: actor.into(),
            quantity: 1,
            start_date: None,
            end_date: None,
            application_kind: None,
            meta: TradeMeta::default(),
            at,
        }
    }

    #[must_use]
    pub fn quantity(mut self, quantity: i64) -> Self {
        self.quantity = quantity;
        self
    }

    #[must_use]
    pub fn dates(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.start_date = Some(start);
        self.end_date = Some(end);
        self
    }

    #[must_use]
    pub fn application_kind(mut self, kind: ApplicationKind) -> Self {
        self.application_kind = Some(kind);
        self
    }

    #[must_use]
    pub fn destination(mut self, postal_code: impl Into<String>, address: impl Into<String>) -> Self {
        self.meta.postal_code = Some(postal_code.into());
        self.meta.address = Some(address.into());
        self
    }

    #[must_use]
    pub fn payment_method(mut self, method: impl Into<String>) -> Self {
        self.meta.payment_method = Some(method.into());
        self
    }

    #[must_use]
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.meta.message = Some(message.into());
        self
    }
}

/// Create a buy-out purchase from an active rental or application.
#[derive(Clone, Debug)]
pub struct BuyoutCmd {
    /// The occupied rental/application being bought out.
    pub source: TradeRef,
    /// The renter/applicant turning buyer.
    pub actor: String,
    pub payment_method: Option<String>,
    pub message: Option<String>,
    pub at: DateTime<Utc>,
}

impl BuyoutCmd {
    #[must_use]
    pub fn new(source: TradeRef, actor: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            source,
            actor: actor.into(),
            payment_method: None,
            message: None,
            at,
        }
    }

    #[must_use]
    pub fn payment_method(mut self, method: impl Into<String>) -> Self {
        self.payment_method = Some(method.into());
        self
    }
}

/// Drive one guarded state machine step.
#[derive(Clone, Debug)]
pub struct TransitionCmd {
    pub trade: TradeRef,
    pub action: TradeAction,
    pub actor: String,
    pub tracking_number: Option<String>,
    pub at: DateTime<Utc>,
}

impl TransitionCmd {
    #[must_use]
    pub fn new(
        trade: TradeRef,
        action: TradeAction,
        actor: impl Into<String>,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            trade,
            action,
            actor: actor.into(),
            tracking_number: None,
            at,
        }
    }

    #[must_use]
    pub fn tracking(mut self, number: impl Into<String>) -> Self {
        self.tracking_number = Some(number.into());
        self
    }
}

/// Filters for trade listings.
#[derive(Clone, Debug)]
pub struct TradeListCmd {
    pub actor: String,
    pub side: TradeSide,
    /// Status string filter, matched against the per-kind status.
    pub status: Option<String>,
    pub include_hidden: bool,
}

impl TradeListCmd {
    #[must_use]
    pub fn new(actor: impl Into<String>, side: TradeSide) -> Self {
        Self {
            actor: actor.into(),
            side,
            status: None,
            include_hidden: false,
        }
    }

    #[must_use]
    pub fn status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    #[must_use]
    pub fn include_hidden(mut self) -> Self {
        self.include_hidden = true;
        self
    }
}
