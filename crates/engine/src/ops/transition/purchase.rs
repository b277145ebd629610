use chrono::{DateTime, Utc};
use sea_orm::{DatabaseTransaction, QueryFilter, prelude::*, sea_query::Expr};

use crate::{
    ApplicationStatus, EngineError, Party, PurchaseStatus, RentalStatus, ResultEngine, ReturnStatus,
    ShipmentDirection, ShipmentStatus, TradeKind, TransitionCmd, applications, purchases, rentals,
    trade::TradeAction,
};

use super::super::{Engine, Notice, access::{party_of, require_role}};
use super::{good_id_of, tracking_of};

impl Engine {
    pub(super) async fn transition_purchase(
        &self,
        db: &DatabaseTransaction,
        cmd: &TransitionCmd,
    ) -> ResultEngine<Vec<Notice>> {
        let purchase = self.require_purchase(db, cmd.trade.id).await?;
        let status = PurchaseStatus::try_from(purchase.status.as_str())?;
        let return_status = ReturnStatus::try_from(purchase.return_status.as_str())?;
        let good_id = good_id_of(&purchase.good_id)?;
        let seller = purchase.seller_id.clone();
        let buyer = purchase.buyer_id.clone();

        let mut notices = Vec::new();
        match cmd.action {
            TradeAction::Approve => {
                require_role(&cmd.actor, Party::Owner, &seller, &buyer)?;
                require_status(status, PurchaseStatus::Pending)?;
                if purchase.is_buyout() {
                    // The buyer already holds the good, so shipping is
                    // skipped: approval settles the sale and closes the
                    // source rental without giving the unit back.
                    self.set_purchase_status(
                        db,
                        &purchase.id,
                        PurchaseStatus::Pending,
                        PurchaseStatus::Completed,
                        &[purchases::Column::ApprovedAt, purchases::Column::CompletedAt],
                        cmd.at,
                    )
                    .await?;
                    self.close_buyout_source(db, &purchase, cmd.at).await?;
                    notices.push(Notice::for_trade(
                        &buyer,
                        "purchase_completed",
                        "Buy-out approved",
                        format!("{seller} approved the buy-out; the good is yours"),
                        cmd.trade,
                    ));
                } else {
                    self.set_purchase_status(
                        db,
                        &purchase.id,
                        PurchaseStatus::Pending,
                        PurchaseStatus::Approved,
                        &[purchases::Column::ApprovedAt],
                        cmd.at,
                    )
                    .await?;
                    notices.push(Notice::for_trade(
                        &buyer,
                        "purchase_approved",
                        "Purchase approved",
                        format!("{seller} approved your purchase"),
                        cmd.trade,
                    ));
                }
            }
            TradeAction::Ship => {
                require_role(&cmd.actor, Party::Owner, &seller, &buyer)?;
                require_status(status, PurchaseStatus::Approved)?;
                let tracking = tracking_of(cmd)?;
                self.set_purchase_status(
                    db,
                    &purchase.id,
                    PurchaseStatus::Approved,
                    PurchaseStatus::Shipped,
                    &[purchases::Column::ShippedAt],
                    cmd.at,
                )
                .await?;
                let sender = self.snapshot_contact(db, &seller, None).await?;
                let recipient = self
                    .snapshot_contact(db, &buyer, purchase.address.as_deref())
                    .await?;
                self.upsert_shipment(
                    db,
                    cmd.trade,
                    ShipmentDirection::Outbound,
                    tracking,
                    ShipmentStatus::InTransit,
                    sender,
                    recipient,
                    cmd.at,
                )
                .await?;
                notices.push(Notice::for_trade(
                    &buyer,
                    "purchase_shipped",
                    "Good shipped",
                    format!("{seller} shipped your purchase"),
                    cmd.trade,
                ));
            }
            TradeAction::Receive => {
                require_role(&cmd.actor, Party::Counterparty, &seller, &buyer)?;
                require_status(status, PurchaseStatus::Shipped)?;
                self.set_purchase_status(
                    db,
                    &purchase.id,
                    PurchaseStatus::Shipped,
                    PurchaseStatus::Completed,
                    &[purchases::Column::CompletedAt],
                    cmd.at,
                )
                .await?;
                self.mark_shipment_delivered(db, cmd.trade, ShipmentDirection::Outbound, cmd.at)
                    .await?;
                notices.push(Notice::for_trade(
                    &seller,
                    "purchase_completed",
                    "Purchase completed",
                    format!("{buyer} confirmed delivery"),
                    cmd.trade,
                ));
            }
            TradeAction::Cancel => {
                let party = party_of(&cmd.actor, &seller, &buyer)?;
                require_status(status, PurchaseStatus::Pending)?;
                self.set_purchase_status(
                    db,
                    &purchase.id,
                    PurchaseStatus::Pending,
                    PurchaseStatus::Canceled,
                    &[purchases::Column::CanceledAt],
                    cmd.at,
                )
                .await?;
                // A buy-out never reserved its own unit; the source rental
                // still holds it.
                if !purchase.is_buyout() {
                    self.release(db, good_id, purchase.quantity).await?;
                }
                let other = match party {
                    Party::Owner => &buyer,
                    Party::Counterparty => &seller,
                };
                notices.push(Notice::for_trade(
                    other,
                    "purchase_canceled",
                    "Purchase canceled",
                    format!("{} canceled the purchase", cmd.actor),
                    cmd.trade,
                ));
            }
            TradeAction::Hide => {
                let party = party_of(&cmd.actor, &seller, &buyer)?;
                if !status.is_terminal() {
                    return Err(EngineError::InvalidTransition(
                        "only settled trades can be hidden".to_string(),
                    ));
                }
                let column = match party {
                    Party::Owner => purchases::Column::HiddenForSeller,
                    Party::Counterparty => purchases::Column::HiddenForBuyer,
                };
                purchases::Entity::update_many()
                    .col_expr(column, Expr::value(true))
                    .filter(purchases::Column::Id.eq(purchase.id.clone()))
                    .exec(db)
                    .await?;
            }
            TradeAction::RequestReturn => {
                require_role(&cmd.actor, Party::Counterparty, &seller, &buyer)?;
                require_status(status, PurchaseStatus::Completed)?;
                require_return_status(return_status, ReturnStatus::None)?;
                self.set_return_status(
                    db,
                    &purchase.id,
                    ReturnStatus::None,
                    ReturnStatus::Requested,
                    &[purchases::Column::ReturnRequestedAt],
                    cmd.at,
                )
                .await?;
                notices.push(Notice::for_trade(
                    &seller,
                    "return_requested",
                    "Return requested",
                    format!("{buyer} requested a return"),
                    cmd.trade,
                ));
            }
            TradeAction::ApproveReturn => {
                require_role(&cmd.actor, Party::Owner, &seller, &buyer)?;
                require_status(status, PurchaseStatus::Completed)?;
                require_return_status(return_status, ReturnStatus::Requested)?;
                self.set_return_status(
                    db,
                    &purchase.id,
                    ReturnStatus::Requested,
                    ReturnStatus::Approved,
                    &[],
                    cmd.at,
                )
                .await?;
                notices.push(Notice::for_trade(
                    &buyer,
                    "return_approved",
                    "Return approved",
                    format!("{seller} approved your return"),
                    cmd.trade,
                ));
            }
            TradeAction::RejectReturn => {
                require_role(&cmd.actor, Party::Owner, &seller, &buyer)?;
                require_status(status, PurchaseStatus::Completed)?;
                require_return_status(return_status, ReturnStatus::Requested)?;
                self.set_return_status(
                    db,
                    &purchase.id,
                    ReturnStatus::Requested,
                    ReturnStatus::Rejected,
                    &[],
                    cmd.at,
                )
                .await?;
                notices.push(Notice::for_trade(
                    &buyer,
                    "return_rejected",
                    "Return rejected",
                    format!("{seller} rejected your return"),
                    cmd.trade,
                ));
            }
            TradeAction::ShipReturn => {
                require_role(&cmd.actor, Party::Counterparty, &seller, &buyer)?;
                require_status(status, PurchaseStatus::Completed)?;
                require_return_status(return_status, ReturnStatus::Approved)?;
                let tracking = tracking_of(cmd)?;
                self.set_return_status(
                    db,
                    &purchase.id,
                    ReturnStatus::Approved,
                    ReturnStatus::Shipped,
                    &[purchases::Column::ReturnShippedAt],
                    cmd.at,
                )
                .await?;
                let sender = self.snapshot_contact(db, &buyer, None).await?;
                let recipient = self.snapshot_contact(db, &seller, None).await?;
                self.upsert_shipment(
                    db,
                    cmd.trade,
                    ShipmentDirection::Inbound,
                    tracking,
                    ShipmentStatus::InTransit,
                    sender,
                    recipient,
                    cmd.at,
                )
                .await?;
                notices.push(Notice::for_trade(
                    &seller,
                    "return_shipped",
                    "Return shipped",
                    format!("{buyer} shipped the return"),
                    cmd.trade,
                ));
            }
            TradeAction::ReceiveReturn => {
                require_role(&cmd.actor, Party::Owner, &seller, &buyer)?;
                require_status(status, PurchaseStatus::Completed)?;
                require_return_status(return_status, ReturnStatus::Shipped)?;
                self.set_return_status(
                    db,
                    &purchase.id,
                    ReturnStatus::Shipped,
                    ReturnStatus::Received,
                    &[purchases::Column::ReturnReceivedAt],
                    cmd.at,
                )
                .await?;
                self.mark_shipment_delivered(db, cmd.trade, ShipmentDirection::Inbound, cmd.at)
                    .await?;
                notices.push(Notice::for_trade(
                    &buyer,
                    "return_received",
                    "Return received",
                    format!("{seller} received the return"),
                    cmd.trade,
                ));
            }
            other => {
                return Err(EngineError::InvalidTransition(format!(
                    "action {} does not apply to purchases",
                    other.as_str()
                )));
            }
        }

        self.rebind_channel(db, cmd.trade, good_id, &seller, &buyer, cmd.at)
            .await;
        Ok(notices)
    }

    async fn set_purchase_status(
        &self,
        db: &DatabaseTransaction,
        id: &str,
        from: PurchaseStatus,
        to: PurchaseStatus,
        stamps: &[purchases::Column],
        at: DateTime<Utc>,
    ) -> ResultEngine<()> {
        let mut update = purchases::Entity::update_many()
            .col_expr(purchases::Column::Status, Expr::value(to.as_str()))
            .filter(purchases::Column::Id.eq(id))
            .filter(purchases::Column::Status.eq(from.as_str()));
        for stamp in stamps {
            update = update.col_expr(*stamp, Expr::value(at));
        }

        let res = update.exec(db).await?;
        if res.rows_affected == 0 {
            return Err(EngineError::Conflict(
                "purchase was modified concurrently".to_string(),
            ));
        }
        Ok(())
    }

    /// The return sub-state machine only runs under a completed parent, so
    /// the compare-and-set pins both columns.
    async fn set_return_status(
        &self,
        db: &DatabaseTransaction,
        id: &str,
        from: ReturnStatus,
        to: ReturnStatus,
        stamps: &[purchases::Column],
        at: DateTime<Utc>,
    ) -> ResultEngine<()> {
        let mut update = purchases::Entity::update_many()
            .col_expr(purchases::Column::ReturnStatus, Expr::value(to.as_str()))
            .filter(purchases::Column::Id.eq(id))
            .filter(purchases::Column::Status.eq(PurchaseStatus::Completed.as_str()))
            .filter(purchases::Column::ReturnStatus.eq(from.as_str()));
        for stamp in stamps {
            update = update.col_expr(*stamp, Expr::value(at));
        }

        let res = update.exec(db).await?;
        if res.rows_affected == 0 {
            return Err(EngineError::Conflict(
                "purchase was modified concurrently".to_string(),
            ));
        }
        Ok(())
    }

    /// Force-close the rental/application a buy-out came from.
    ///
    /// The unit stays sold: no reservation is released. The source may have
    /// progressed past occupancy in the meantime; closing whatever live
    /// status remains is enough, and an already-settled source is left
    /// alone.
    async fn close_buyout_source(
        &self,
        db: &DatabaseTransaction,
        purchase: &purchases::Model,
        at: DateTime<Utc>,
    ) -> ResultEngine<()> {
        let (Some(kind), Some(source_id)) =
            (purchase.source_kind.as_deref(), purchase.source_id.as_deref())
        else {
            return Ok(());
        };

        let rows = match TradeKind::try_from(kind)? {
            TradeKind::Rental => {
                rentals::Entity::update_many()
                    .col_expr(
                        rentals::Column::Status,
                        Expr::value(RentalStatus::Completed.as_str()),
                    )
                    .col_expr(rentals::Column::CompletedAt, Expr::value(at))
                    .filter(rentals::Column::Id.eq(source_id))
                    .filter(rentals::Column::Status.is_in([
                        RentalStatus::Renting.as_str(),
                        RentalStatus::ReturnShipped.as_str(),
                    ]))
                    .exec(db)
                    .await?
                    .rows_affected
            }
            TradeKind::Application => {
                applications::Entity::update_many()
                    .col_expr(
                        applications::Column::Status,
                        Expr::value(ApplicationStatus::Completed.as_str()),
                    )
                    .col_expr(applications::Column::CompletedAt, Expr::value(at))
                    .filter(applications::Column::Id.eq(source_id))
                    .filter(applications::Column::Status.is_in([
                        ApplicationStatus::Renting.as_str(),
                        ApplicationStatus::ReturnShipped.as_str(),
                    ]))
                    .exec(db)
                    .await?
                    .rows_affected
            }
            TradeKind::Purchase => 0,
        };

        if rows == 0 {
            tracing::warn!(source_id, "buy-out source was not in a closable status");
        }
        Ok(())
    }
}

fn require_status(current: PurchaseStatus, expected: PurchaseStatus) -> ResultEngine<()> {
    if current != expected {
        return Err(EngineError::InvalidTransition(format!(
            "expected status {}, found {}",
            expected.as_str(),
            current.as_str()
        )));
    }
    Ok(())
}

fn require_return_status(current: ReturnStatus, expected: ReturnStatus) -> ResultEngine<()> {
    if current != expected {
        return Err(EngineError::InvalidTransition(format!(
            "expected return status {}, found {}",
            expected.as_str(),
            current.as_str()
        )));
    }
    Ok(())
}
