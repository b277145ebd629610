use chrono::{DateTime, Utc};
use sea_orm::{DatabaseTransaction, QueryFilter, prelude::*, sea_query::Expr};

use crate::{
    EngineError, Party, RentalStatus, ResultEngine, ShipmentDirection, ShipmentStatus,
    TransitionCmd, rentals,
    trade::TradeAction,
};

use super::super::{Engine, Notice, access::{party_of, require_role}};
use super::{good_id_of, tracking_of};

impl Engine {
    pub(super) async fn transition_rental(
        &self,
        db: &DatabaseTransaction,
        cmd: &TransitionCmd,
    ) -> ResultEngine<Vec<Notice>> {
        let rental = self.require_rental(db, cmd.trade.id).await?;
        let status = RentalStatus::try_from(rental.status.as_str())?;
        let good_id = good_id_of(&rental.good_id)?;
        let owner = rental.owner_id.clone();
        let renter = rental.renter_id.clone();

        let mut notices = Vec::new();
        match cmd.action {
            TradeAction::Approve => {
                require_role(&cmd.actor, Party::Owner, &owner, &renter)?;
                require_status(status, RentalStatus::Requested)?;
                self.set_rental_status(
                    db,
                    &rental.id,
                    RentalStatus::Requested,
                    RentalStatus::Approved,
                    &[rentals::Column::ApprovedAt],
                    cmd.at,
                )
                .await?;
                // Reservation is taken at approval, not at request time.
                self.reserve(db, good_id, rental.quantity).await?;
                notices.push(Notice::for_trade(
                    &renter,
                    "rental_approved",
                    "Rental request approved",
                    format!("{owner} approved your rental request"),
                    cmd.trade,
                ));
            }
            TradeAction::Ship => {
                require_role(&cmd.actor, Party::Owner, &owner, &renter)?;
                require_status(status, RentalStatus::Approved)?;
                let tracking = tracking_of(cmd)?;
                self.set_rental_status(
                    db,
                    &rental.id,
                    RentalStatus::Approved,
                    RentalStatus::Shipped,
                    &[rentals::Column::ShippedAt],
                    cmd.at,
                )
                .await?;
                let sender = self.snapshot_contact(db, &owner, None).await?;
                let recipient = self
                    .snapshot_contact(db, &renter, rental.address.as_deref())
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
                    &renter,
                    "rental_shipped",
                    "Good shipped",
                    format!("{owner} shipped your rental"),
                    cmd.trade,
                ));
            }
            TradeAction::Receive => {
                require_role(&cmd.actor, Party::Counterparty, &owner, &renter)?;
                require_status(status, RentalStatus::Shipped)?;
                self.set_rental_status(
                    db,
                    &rental.id,
                    RentalStatus::Shipped,
                    RentalStatus::Renting,
                    &[rentals::Column::ReceivedAt],
                    cmd.at,
                )
                .await?;
                self.mark_shipment_delivered(db, cmd.trade, ShipmentDirection::Outbound, cmd.at)
                    .await?;
                notices.push(Notice::for_trade(
                    &owner,
                    "rental_received",
                    "Good received",
                    format!("{renter} received the rental"),
                    cmd.trade,
                ));
            }
            TradeAction::ShipBack => {
                require_role(&cmd.actor, Party::Counterparty, &owner, &renter)?;
                require_status(status, RentalStatus::Renting)?;
                let tracking = tracking_of(cmd)?;
                self.set_rental_status(
                    db,
                    &rental.id,
                    RentalStatus::Renting,
                    RentalStatus::ReturnShipped,
                    &[rentals::Column::ReturnedAt],
                    cmd.at,
                )
                .await?;
                let sender = self.snapshot_contact(db, &renter, None).await?;
                let recipient = self.snapshot_contact(db, &owner, None).await?;
                self.upsert_shipment(
                    db,
                    cmd.trade,
                    ShipmentDirection::Return,
                    tracking,
                    ShipmentStatus::InTransit,
                    sender,
                    recipient,
                    cmd.at,
                )
                .await?;
                notices.push(Notice::for_trade(
                    &owner,
                    "rental_returned",
                    "Return shipped",
                    format!("{renter} shipped the rental back"),
                    cmd.trade,
                ));
            }
            TradeAction::Confirm => {
                require_role(&cmd.actor, Party::Owner, &owner, &renter)?;
                require_status(status, RentalStatus::ReturnShipped)?;
                self.set_rental_status(
                    db,
                    &rental.id,
                    RentalStatus::ReturnShipped,
                    RentalStatus::Completed,
                    &[rentals::Column::CompletedAt],
                    cmd.at,
                )
                .await?;
                // The good is back on the shelf.
                self.release(db, good_id, rental.quantity).await?;
                self.mark_shipment_delivered(db, cmd.trade, ShipmentDirection::Return, cmd.at)
                    .await?;
                notices.push(Notice::for_trade(
                    &renter,
                    "rental_completed",
                    "Rental completed",
                    format!("{owner} confirmed the return"),
                    cmd.trade,
                ));
            }
            TradeAction::Cancel => {
                let party = party_of(&cmd.actor, &owner, &renter)?;
                if !matches!(status, RentalStatus::Requested | RentalStatus::Approved) {
                    return Err(EngineError::InvalidTransition(format!(
                        "cannot cancel a rental in status {}",
                        status.as_str()
                    )));
                }
                self.set_rental_status(
                    db,
                    &rental.id,
                    status,
                    RentalStatus::Canceled,
                    &[rentals::Column::CanceledAt],
                    cmd.at,
                )
                .await?;
                if status == RentalStatus::Approved {
                    self.release(db, good_id, rental.quantity).await?;
                }
                let other = match party {
                    Party::Owner => &renter,
                    Party::Counterparty => &owner,
                };
                notices.push(Notice::for_trade(
                    other,
                    "rental_canceled",
                    "Rental canceled",
                    format!("{} canceled the rental", cmd.actor),
                    cmd.trade,
                ));
            }
            TradeAction::Hide => {
                let party = party_of(&cmd.actor, &owner, &renter)?;
                if !status.is_terminal() {
                    return Err(EngineError::InvalidTransition(
                        "only settled trades can be hidden".to_string(),
                    ));
                }
                let column = match party {
                    Party::Owner => rentals::Column::HiddenForOwner,
                    Party::Counterparty => rentals::Column::HiddenForRenter,
                };
                rentals::Entity::update_many()
                    .col_expr(column, Expr::value(true))
                    .filter(rentals::Column::Id.eq(rental.id.clone()))
                    .exec(db)
                    .await?;
            }
            other => {
                return Err(EngineError::InvalidTransition(format!(
                    "action {} does not apply to rentals",
                    other.as_str()
                )));
            }
        }

        self.rebind_channel(db, cmd.trade, good_id, &owner, &renter, cmd.at)
            .await;
        Ok(notices)
    }

    /// Compare-and-set the rental status, stamping the given timestamp
    /// columns. Zero affected rows means another caller won the race.
    async fn set_rental_status(
        &self,
        db: &DatabaseTransaction,
        id: &str,
        from: RentalStatus,
        to: RentalStatus,
        stamps: &[rentals::Column],
        at: DateTime<Utc>,
    ) -> ResultEngine<()> {
        let mut update = rentals::Entity::update_many()
            .col_expr(rentals::Column::Status, Expr::value(to.as_str()))
            .filter(rentals::Column::Id.eq(id))
            .filter(rentals::Column::Status.eq(from.as_str()));
        for stamp in stamps {
            update = update.col_expr(*stamp, Expr::value(at));
        }

        let res = update.exec(db).await?;
        if res.rows_affected == 0 {
            return Err(EngineError::Conflict(
                "rental was modified concurrently".to_string(),
            ));
        }
        Ok(())
    }
}

fn require_status(current: RentalStatus, expected: RentalStatus) -> ResultEngine<()> {
    if current != expected {
        return Err(EngineError::InvalidTransition(format!(
            "expected status {}, found {}",
            expected.as_str(),
            current.as_str()
        )));
    }
    Ok(())
}
