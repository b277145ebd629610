//! Read-only queries for the presentation layer.

use sea_orm::{QueryFilter, QueryOrder, prelude::*};

use crate::{
    ResultEngine, Shipment, TradeKind, TradeListCmd, TradeRef, TradeSide, TradeView, applications,
    purchases, rentals, shipments,
};

use super::{Engine, access::party_of};

impl Engine {
    /// List the trades a user is part of, newest first.
    ///
    /// `Mine` is the requesting side (renter/buyer/applicant), `Received`
    /// the listing side. Hidden trades are skipped unless asked for; the
    /// hide flag of the *other* party never affects the view.
    pub async fn list_trades(&self, cmd: TradeListCmd) -> ResultEngine<Vec<TradeView>> {
        let mut out = Vec::new();

        let mut rentals_query = match cmd.side {
            TradeSide::Mine => rentals::Entity::find()
                .filter(rentals::Column::RenterId.eq(cmd.actor.clone())),
            TradeSide::Received => rentals::Entity::find()
                .filter(rentals::Column::OwnerId.eq(cmd.actor.clone())),
        };
        if let Some(status) = &cmd.status {
            rentals_query = rentals_query.filter(rentals::Column::Status.eq(status.clone()));
        }
        if !cmd.include_hidden {
            rentals_query = rentals_query.filter(match cmd.side {
                TradeSide::Mine => rentals::Column::HiddenForRenter.eq(false),
                TradeSide::Received => rentals::Column::HiddenForOwner.eq(false),
            });
        }
        for model in rentals_query.all(&self.database).await? {
            out.push(rental_view(model)?);
        }

        let mut purchases_query = match cmd.side {
            TradeSide::Mine => purchases::Entity::find()
                .filter(purchases::Column::BuyerId.eq(cmd.actor.clone())),
            TradeSide::Received => purchases::Entity::find()
                .filter(purchases::Column::SellerId.eq(cmd.actor.clone())),
        };
        if let Some(status) = &cmd.status {
            purchases_query = purchases_query.filter(purchases::Column::Status.eq(status.clone()));
        }
        if !cmd.include_hidden {
            purchases_query = purchases_query.filter(match cmd.side {
                TradeSide::Mine => purchases::Column::HiddenForBuyer.eq(false),
                TradeSide::Received => purchases::Column::HiddenForSeller.eq(false),
            });
        }
        for model in purchases_query.all(&self.database).await? {
            out.push(purchase_view(model)?);
        }

        let mut applications_query = match cmd.side {
            TradeSide::Mine => applications::Entity::find()
                .filter(applications::Column::ApplicantId.eq(cmd.actor.clone())),
            TradeSide::Received => applications::Entity::find()
                .filter(applications::Column::OwnerId.eq(cmd.actor.clone())),
        };
        if let Some(status) = &cmd.status {
            applications_query =
                applications_query.filter(applications::Column::Status.eq(status.clone()));
        }
        if !cmd.include_hidden {
            applications_query = applications_query.filter(match cmd.side {
                TradeSide::Mine => applications::Column::HiddenForApplicant.eq(false),
                TradeSide::Received => applications::Column::HiddenForOwner.eq(false),
            });
        }
        for model in applications_query.all(&self.database).await? {
            out.push(application_view(model)?);
        }

        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(out)
    }

    /// Return one trade; parties only.
    pub async fn trade(&self, trade: TradeRef, actor: &str) -> ResultEngine<TradeView> {
        let view = match trade.kind {
            TradeKind::Rental => {
                let model = rentals::Entity::find_by_id(trade.id.to_string())
                    .one(&self.database)
                    .await?
                    .ok_or_else(|| crate::EngineError::NotFound("rental not exists".to_string()))?;
                rental_view(model)?
            }
            TradeKind::Purchase => {
                let model = purchases::Entity::find_by_id(trade.id.to_string())
                    .one(&self.database)
                    .await?
                    .ok_or_else(|| {
                        crate::EngineError::NotFound("purchase not exists".to_string())
                    })?;
                purchase_view(model)?
            }
            TradeKind::Application => {
                let model = applications::Entity::find_by_id(trade.id.to_string())
                    .one(&self.database)
                    .await?
                    .ok_or_else(|| {
                        crate::EngineError::NotFound("application not exists".to_string())
                    })?;
                application_view(model)?
            }
        };

        party_of(actor, &view.owner_id, &view.counterparty_id)?;
        Ok(view)
    }

    /// Shipment records of a trade; parties only.
    pub async fn shipments_for(
        &self,
        trade: TradeRef,
        actor: &str,
    ) -> ResultEngine<Vec<Shipment>> {
        // Party check via the trade lookup.
        self.trade(trade, actor).await?;

        let models = shipments::Entity::find()
            .filter(shipments::Column::TradeKind.eq(trade.kind.as_str()))
            .filter(shipments::Column::TradeId.eq(trade.id.to_string()))
            .order_by_asc(shipments::Column::CreatedAt)
            .all(&self.database)
            .await?;
        models.into_iter().map(Shipment::try_from).collect()
    }
}

fn rental_view(model: rentals::Model) -> ResultEngine<TradeView> {
    let rental = crate::Rental::try_from(model)?;
    Ok(TradeView {
        kind: TradeKind::Rental,
        id: rental.id,
        good_id: rental.good_id,
        owner_id: rental.owner_id,
        counterparty_id: rental.renter_id,
        quantity: rental.quantity,
        total_price: rental.total_price,
        status: rental.status.as_str().to_string(),
        return_status: None,
        payment_method: rental.payment_method,
        message: rental.message,
        created_at: rental.created_at,
    })
}

fn purchase_view(model: purchases::Model) -> ResultEngine<TradeView> {
    let purchase = crate::Purchase::try_from(model)?;
    Ok(TradeView {
        kind: TradeKind::Purchase,
        id: purchase.id,
        good_id: purchase.good_id,
        owner_id: purchase.seller_id,
        counterparty_id: purchase.buyer_id,
        quantity: purchase.quantity,
        total_price: purchase.price,
        status: purchase.status.as_str().to_string(),
        return_status: Some(purchase.return_status.as_str().to_string()),
        payment_method: purchase.payment_method,
        message: purchase.message,
        created_at: purchase.created_at,
    })
}

fn application_view(model: applications::Model) -> ResultEngine<TradeView> {
    let app = crate::Application::try_from(model)?;
    Ok(TradeView {
        kind: TradeKind::Application,
        id: app.id,
        good_id: app.good_id,
        owner_id: app.owner_id,
        counterparty_id: app.applicant_id,
        quantity: app.quantity,
        total_price: app.total_price,
        status: app.status.as_str().to_string(),
        return_status: None,
        payment_method: app.payment_method,
        message: app.message,
        created_at: app.created_at,
    })
}
