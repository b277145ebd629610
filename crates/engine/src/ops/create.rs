use chrono::NaiveDate;
use sea_orm::{DatabaseTransaction, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    Application, ApplicationKind, ApplicationStatus, BuyoutCmd, EngineError, Purchase,
    PurchaseStatus, Rental, RentalStatus, ResultEngine, ReturnStatus, TradeKind, TradeNewCmd,
    TradeRef, applications, goods,
    goods::{GoodStatus, ListingKind},
    pricing::{BuyoutTerms, rental_days},
    purchases, rentals,
};

use super::{Engine, Notice, access::party_of, with_tx};

/// What a buy-out inherits from the rental it converts.
struct BuyoutSource {
    good_id: Uuid,
    owner_id: String,
    counterparty_id: String,
    quantity: i64,
    /// Day occupancy actually began (receipt, falling back to the contract
    /// start).
    started: NaiveDate,
    contracted_days: Option<i64>,
    agreed_total_price: i64,
    agreed_total_days: i64,
    postal_code: Option<String>,
    address: Option<String>,
}

impl Engine {
    /// Create a trade in its initial status.
    ///
    /// Validates listing status, kind compatibility, rental day bounds and
    /// available quantity, then writes the row and binds its channel in one
    /// database transaction. Purchases reserve their units here; rentals and
    /// applications reserve at approval.
    pub async fn create_trade(&self, cmd: TradeNewCmd) -> ResultEngine<Uuid> {
        if cmd.quantity < 1 {
            return Err(EngineError::InvalidTransition(
                "quantity must be >= 1".to_string(),
            ));
        }

        let (trade, notice) = with_tx!(self, |db_tx| {
            self.require_user(&db_tx, &cmd.actor).await?;
            let good = self.require_good(&db_tx, cmd.good_id).await?;
            if GoodStatus::try_from(good.status.as_str())? != GoodStatus::Listed {
                return Err(EngineError::InvalidTransition(
                    "good is not listed".to_string(),
                ));
            }
            if good.owner_id == cmd.actor {
                return Err(EngineError::Forbidden(
                    "cannot trade your own good".to_string(),
                ));
            }
            if !good.has_available(cmd.quantity) {
                return Err(EngineError::InsufficientInventory(format!(
                    "requested {}, available {}",
                    cmd.quantity,
                    good.available_quantity.unwrap_or_default()
                )));
            }

            let trade = match cmd.kind {
                TradeKind::Rental => self.insert_rental(&db_tx, &cmd, &good).await?,
                TradeKind::Purchase => self.insert_purchase(&db_tx, &cmd, &good).await?,
                TradeKind::Application => self.insert_application(&db_tx, &cmd, &good).await?,
            };

            self.ensure_bound(&db_tx, trade, cmd.good_id, &good.owner_id, &cmd.actor, cmd.at)
                .await?;

            let notice = Notice::for_trade(
                &good.owner_id,
                "trade_requested",
                "New request",
                format!("{} requested \"{}\"", cmd.actor, good.title),
                trade,
            );
            Ok((trade, notice))
        })?;

        self.dispatch_notices(vec![notice], cmd.at).await;
        Ok(trade.id)
    }

    async fn insert_rental(
        &self,
        db: &DatabaseTransaction,
        cmd: &TradeNewCmd,
        good: &goods::Model,
    ) -> ResultEngine<TradeRef> {
        let listing = ListingKind::try_from(good.listing.as_str())?;
        if !listing.supports_rental() {
            return Err(EngineError::InvalidTransition(
                "good is not for rental".to_string(),
            ));
        }
        let (start, end) = rental_period(cmd, good)?;
        let rate = good.price_per_day.ok_or_else(|| {
            EngineError::InvalidTransition("good has no per-day rate".to_string())
        })?;

        let rental = Rental {
            id: Uuid::new_v4(),
            good_id: cmd.good_id,
            owner_id: good.owner_id.clone(),
            renter_id: cmd.actor.clone(),
            quantity: cmd.quantity,
            start_date: start,
            end_date: end,
            total_price: rate * rental_days(start, end) * cmd.quantity,
            status: RentalStatus::Requested,
            message: cmd.meta.message.clone(),
            payment_method: cmd.meta.payment_method.clone(),
            postal_code: cmd.meta.postal_code.clone(),
            address: cmd.meta.address.clone(),
            approved_at: None,
            shipped_at: None,
            received_at: None,
            returned_at: None,
            completed_at: None,
            canceled_at: None,
            hidden_for_owner: false,
            hidden_for_renter: false,
            created_at: cmd.at,
        };
        rentals::ActiveModel::from(&rental).insert(db).await?;
        Ok(TradeRef::new(TradeKind::Rental, rental.id))
    }

    async fn insert_purchase(
        &self,
        db: &DatabaseTransaction,
        cmd: &TradeNewCmd,
        good: &goods::Model,
    ) -> ResultEngine<TradeRef> {
        let listing = ListingKind::try_from(good.listing.as_str())?;
        if !listing.supports_sale() {
            return Err(EngineError::InvalidTransition(
                "good is not for sale".to_string(),
            ));
        }
        let price = good.price_buy.ok_or_else(|| {
            EngineError::InvalidTransition("good has no sale price".to_string())
        })?;

        let purchase = Purchase {
            id: Uuid::new_v4(),
            good_id: cmd.good_id,
            seller_id: good.owner_id.clone(),
            buyer_id: cmd.actor.clone(),
            quantity: cmd.quantity,
            price: price * cmd.quantity,
            status: PurchaseStatus::Pending,
            return_status: ReturnStatus::None,
            source_kind: None,
            source_id: None,
            message: cmd.meta.message.clone(),
            payment_method: cmd.meta.payment_method.clone(),
            postal_code: cmd.meta.postal_code.clone(),
            address: cmd.meta.address.clone(),
            approved_at: None,
            shipped_at: None,
            completed_at: None,
            canceled_at: None,
            return_requested_at: None,
            return_shipped_at: None,
            return_received_at: None,
            hidden_for_seller: false,
            hidden_for_buyer: false,
            created_at: cmd.at,
        };
        purchases::ActiveModel::from(&purchase).insert(db).await?;
        // Sales hold their units from the moment of request.
        self.reserve(db, cmd.good_id, cmd.quantity).await?;
        Ok(TradeRef::new(TradeKind::Purchase, purchase.id))
    }

    async fn insert_application(
        &self,
        db: &DatabaseTransaction,
        cmd: &TradeNewCmd,
        good: &goods::Model,
    ) -> ResultEngine<TradeRef> {
        let kind = cmd.application_kind.ok_or_else(|| {
            EngineError::InvalidTransition("application_kind required".to_string())
        })?;
        let listing = ListingKind::try_from(good.listing.as_str())?;

        let (start_date, end_date, total_price) = match kind {
            ApplicationKind::Rental => {
                if !listing.supports_rental() {
                    return Err(EngineError::InvalidTransition(
                        "good is not for rental".to_string(),
                    ));
                }
                let (start, end) = rental_period(cmd, good)?;
                let rate = good.price_per_day.ok_or_else(|| {
                    EngineError::InvalidTransition("good has no per-day rate".to_string())
                })?;
                (
                    Some(start),
                    Some(end),
                    rate * rental_days(start, end) * cmd.quantity,
                )
            }
            ApplicationKind::Purchase => {
                if !listing.supports_sale() {
                    return Err(EngineError::InvalidTransition(
                        "good is not for sale".to_string(),
                    ));
                }
                let price = good.price_buy.ok_or_else(|| {
                    EngineError::InvalidTransition("good has no sale price".to_string())
                })?;
                (None, None, price * cmd.quantity)
            }
        };

        let app = Application {
            id: Uuid::new_v4(),
            good_id: cmd.good_id,
            owner_id: good.owner_id.clone(),
            applicant_id: cmd.actor.clone(),
            kind,
            quantity: cmd.quantity,
            start_date,
            end_date,
            total_price,
            status: ApplicationStatus::Pending,
            message: cmd.meta.message.clone(),
            payment_method: cmd.meta.payment_method.clone(),
            postal_code: cmd.meta.postal_code.clone(),
            address: cmd.meta.address.clone(),
            approved_at: None,
            shipped_at: None,
            received_at: None,
            returned_at: None,
            completed_at: None,
            canceled_at: None,
            hidden_for_owner: false,
            hidden_for_applicant: false,
            created_at: cmd.at,
        };
        applications::ActiveModel::from(&app).insert(db).await?;
        Ok(TradeRef::new(TradeKind::Application, app.id))
    }

    /// Convert an occupied rental into a pending purchase.
    ///
    /// The purchase charges the buy-out payable (outright price minus the
    /// rental cost already incurred), not the raw outright price, and takes
    /// no new reservation: the source rental keeps holding the unit until
    /// the seller approves.
    pub async fn create_buyout(&self, cmd: BuyoutCmd) -> ResultEngine<Uuid> {
        let (purchase_id, notice) = with_tx!(self, |db_tx| {
            let src = self.buyout_source(&db_tx, cmd.source).await?;
            if cmd.actor != src.counterparty_id {
                return Err(EngineError::Forbidden("counterparty action".to_string()));
            }

            let good = self.require_good(&db_tx, src.good_id).await?;
            let payable = buyout_payable(&src, &good, cmd.at.date_naive())?;

            let purchase = Purchase {
                id: Uuid::new_v4(),
                good_id: src.good_id,
                seller_id: src.owner_id.clone(),
                buyer_id: cmd.actor.clone(),
                quantity: src.quantity,
                price: payable,
                status: PurchaseStatus::Pending,
                return_status: ReturnStatus::None,
                source_kind: Some(cmd.source.kind),
                source_id: Some(cmd.source.id),
                message: cmd.message.clone(),
                payment_method: cmd.payment_method.clone(),
                postal_code: src.postal_code.clone(),
                address: src.address.clone(),
                approved_at: None,
                shipped_at: None,
                completed_at: None,
                canceled_at: None,
                return_requested_at: None,
                return_shipped_at: None,
                return_received_at: None,
                hidden_for_seller: false,
                hidden_for_buyer: false,
                created_at: cmd.at,
            };
            purchases::ActiveModel::from(&purchase).insert(&db_tx).await?;

            let trade = TradeRef::new(TradeKind::Purchase, purchase.id);
            self.ensure_bound(
                &db_tx,
                trade,
                src.good_id,
                &src.owner_id,
                &cmd.actor,
                cmd.at,
            )
            .await?;

            let notice = Notice::for_trade(
                &src.owner_id,
                "buyout_requested",
                "Buy-out requested",
                format!("{} wants to buy out the rental", cmd.actor),
                trade,
            );
            Ok((purchase.id, notice))
        })?;

        self.dispatch_notices(vec![notice], cmd.at).await;
        Ok(purchase_id)
    }

    /// Read-only buy-out quote for either party.
    pub async fn buyout_quote(
        &self,
        source: TradeRef,
        actor: &str,
        at: chrono::DateTime<chrono::Utc>,
    ) -> ResultEngine<i64> {
        with_tx!(self, |db_tx| {
            let src = self.buyout_source(&db_tx, source).await?;
            party_of(actor, &src.owner_id, &src.counterparty_id)?;
            let good = self.require_good(&db_tx, src.good_id).await?;
            buyout_payable(&src, &good, at.date_naive())
        })
    }

    async fn buyout_source(
        &self,
        db: &DatabaseTransaction,
        source: TradeRef,
    ) -> ResultEngine<BuyoutSource> {
        match source.kind {
            TradeKind::Rental => {
                let rental = self.require_rental(db, source.id).await?;
                if RentalStatus::try_from(rental.status.as_str())? != RentalStatus::Renting {
                    return Err(EngineError::InvalidTransition(
                        "buy-out requires an active rental".to_string(),
                    ));
                }
                let days = rental_days(rental.start_date, rental.end_date);
                Ok(BuyoutSource {
                    good_id: Uuid::parse_str(&rental.good_id)
                        .map_err(|_| EngineError::NotFound("good not exists".to_string()))?,
                    owner_id: rental.owner_id,
                    counterparty_id: rental.renter_id,
                    quantity: rental.quantity,
                    started: rental
                        .received_at
                        .map(|t| t.date_naive())
                        .unwrap_or(rental.start_date),
                    contracted_days: Some(days),
                    agreed_total_price: rental.total_price,
                    agreed_total_days: days,
                    postal_code: rental.postal_code,
                    address: rental.address,
                })
            }
            TradeKind::Application => {
                let app = self.require_application(db, source.id).await?;
                if ApplicationStatus::try_from(app.status.as_str())? != ApplicationStatus::Renting {
                    return Err(EngineError::InvalidTransition(
                        "buy-out requires an active rental".to_string(),
                    ));
                }
                if ApplicationKind::try_from(app.kind.as_str())? != ApplicationKind::Rental {
                    return Err(EngineError::InvalidTransition(
                        "only rental applications can be bought out".to_string(),
                    ));
                }
                let contracted = match (app.start_date, app.end_date) {
                    (Some(start), Some(end)) => Some(rental_days(start, end)),
                    _ => None,
                };
                let started = app
                    .received_at
                    .map(|t| t.date_naive())
                    .or(app.start_date)
                    .unwrap_or_else(|| app.created_at.date_naive());
                Ok(BuyoutSource {
                    good_id: Uuid::parse_str(&app.good_id)
                        .map_err(|_| EngineError::NotFound("good not exists".to_string()))?,
                    owner_id: app.owner_id,
                    counterparty_id: app.applicant_id,
                    quantity: app.quantity,
                    started,
                    contracted_days: contracted,
                    agreed_total_price: app.total_price,
                    agreed_total_days: contracted.unwrap_or(0),
                    postal_code: app.postal_code,
                    address: app.address,
                })
            }
            TradeKind::Purchase => Err(EngineError::InvalidTransition(
                "buy-out source must be a rental".to_string(),
            )),
        }
    }
}

fn rental_period(cmd: &TradeNewCmd, good: &goods::Model) -> ResultEngine<(NaiveDate, NaiveDate)> {
    let (Some(start), Some(end)) = (cmd.start_date, cmd.end_date) else {
        return Err(EngineError::InvalidTransition(
            "rental dates required".to_string(),
        ));
    };
    if end < start {
        return Err(EngineError::InvalidTransition(
            "end_date must not precede start_date".to_string(),
        ));
    }
    let days = rental_days(start, end);
    if days < good.min_rental_days || days > good.max_rental_days {
        return Err(EngineError::InvalidTransition(format!(
            "rental period must be {}..={} days",
            good.min_rental_days, good.max_rental_days
        )));
    }
    Ok((start, end))
}

fn buyout_payable(
    src: &BuyoutSource,
    good: &goods::Model,
    today: NaiveDate,
) -> ResultEngine<i64> {
    let listing = ListingKind::try_from(good.listing.as_str())?;
    let Some(price_buy) = good.price_buy.filter(|_| listing.supports_sale()) else {
        return Err(EngineError::InvalidTransition(
            "good is not for sale".to_string(),
        ));
    };

    let terms = BuyoutTerms {
        price_buy,
        price_per_day: good.price_per_day,
        quantity: src.quantity,
        contracted_days: src.contracted_days,
        agreed_total_price: src.agreed_total_price,
        agreed_total_days: src.agreed_total_days,
    };
    Ok(terms.payable((today - src.started).num_days()))
}
