use chrono::{DateTime, Utc};
use sea_orm::{DatabaseTransaction, QueryFilter, prelude::*, sea_query::Expr};

use crate::{
    ApplicationKind, ApplicationStatus, EngineError, Party, ResultEngine, ShipmentDirection,
    ShipmentStatus, TransitionCmd, applications,
    trade::TradeAction,
};

use super::super::{Engine, Notice, access::{party_of, require_role}};
use super::{good_id_of, tracking_of};

impl Engine {
    pub(super) async fn transition_application(
        &self,
        db: &DatabaseTransaction,
        cmd: &TransitionCmd,
    ) -> ResultEngine<Vec<Notice>> {
        let app = self.require_application(db, cmd.trade.id).await?;
        let status = ApplicationStatus::try_from(app.status.as_str())?;
        let kind = ApplicationKind::try_from(app.kind.as_str())?;
        let good_id = good_id_of(&app.good_id)?;
        let owner = app.owner_id.clone();
        let applicant = app.applicant_id.clone();

        let mut notices = Vec::new();
        match cmd.action {
            TradeAction::Approve => {
                require_role(&cmd.actor, Party::Owner, &owner, &applicant)?;
                require_status(status, ApplicationStatus::Pending)?;
                self.set_application_status(
                    db,
                    &app.id,
                    ApplicationStatus::Pending,
                    ApplicationStatus::Approved,
                    &[applications::Column::ApprovedAt],
                    cmd.at,
                )
                .await?;
                self.reserve(db, good_id, app.quantity).await?;
                notices.push(Notice::for_trade(
                    &applicant,
                    "application_approved",
                    "Application approved",
                    format!("{owner} approved your application"),
                    cmd.trade,
                ));
            }
            TradeAction::Reject => {
                require_role(&cmd.actor, Party::Owner, &owner, &applicant)?;
                require_open(status)?;
                self.set_application_status(
                    db,
                    &app.id,
                    status,
                    ApplicationStatus::Rejected,
                    &[applications::Column::CanceledAt],
                    cmd.at,
                )
                .await?;
                if status == ApplicationStatus::Approved {
                    self.release(db, good_id, app.quantity).await?;
                }
                notices.push(Notice::for_trade(
                    &applicant,
                    "application_rejected",
                    "Application rejected",
                    format!("{owner} rejected your application"),
                    cmd.trade,
                ));
            }
            TradeAction::Cancel => {
                require_role(&cmd.actor, Party::Counterparty, &owner, &applicant)?;
                require_open(status)?;
                self.set_application_status(
                    db,
                    &app.id,
                    status,
                    ApplicationStatus::Cancelled,
                    &[applications::Column::CanceledAt],
                    cmd.at,
                )
                .await?;
                if status == ApplicationStatus::Approved {
                    self.release(db, good_id, app.quantity).await?;
                }
                notices.push(Notice::for_trade(
                    &owner,
                    "application_cancelled",
                    "Application cancelled",
                    format!("{applicant} cancelled the application"),
                    cmd.trade,
                ));
            }
            TradeAction::Ship => {
                require_role(&cmd.actor, Party::Owner, &owner, &applicant)?;
                require_status(status, ApplicationStatus::Approved)?;
                let tracking = tracking_of(cmd)?;
                self.set_application_status(
                    db,
                    &app.id,
                    ApplicationStatus::Approved,
                    ApplicationStatus::Shipped,
                    &[applications::Column::ShippedAt],
                    cmd.at,
                )
                .await?;
                let sender = self.snapshot_contact(db, &owner, None).await?;
                let recipient = self
                    .snapshot_contact(db, &applicant, app.address.as_deref())
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
                    &applicant,
                    "application_shipped",
                    "Good shipped",
                    format!("{owner} shipped the good"),
                    cmd.trade,
                ));
            }
            TradeAction::Receive => {
                require_role(&cmd.actor, Party::Counterparty, &owner, &applicant)?;
                require_status(status, ApplicationStatus::Shipped)?;
                self.set_application_status(
                    db,
                    &app.id,
                    ApplicationStatus::Shipped,
                    ApplicationStatus::Renting,
                    &[applications::Column::ReceivedAt],
                    cmd.at,
                )
                .await?;
                self.mark_shipment_delivered(db, cmd.trade, ShipmentDirection::Outbound, cmd.at)
                    .await?;
                notices.push(Notice::for_trade(
                    &owner,
                    "application_received",
                    "Good received",
                    format!("{applicant} received the good"),
                    cmd.trade,
                ));
            }
            TradeAction::ShipBack => {
                require_role(&cmd.actor, Party::Counterparty, &owner, &applicant)?;
                require_status(status, ApplicationStatus::Renting)?;
                let tracking = tracking_of(cmd)?;
                self.set_application_status(
                    db,
                    &app.id,
                    ApplicationStatus::Renting,
                    ApplicationStatus::ReturnShipped,
                    &[applications::Column::ReturnedAt],
                    cmd.at,
                )
                .await?;
                let sender = self.snapshot_contact(db, &applicant, None).await?;
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
                    "application_returned",
                    "Return shipped",
                    format!("{applicant} shipped the good back"),
                    cmd.trade,
                ));
            }
            TradeAction::Confirm => {
                require_role(&cmd.actor, Party::Owner, &owner, &applicant)?;
                require_status(status, ApplicationStatus::ReturnShipped)?;
                self.set_application_status(
                    db,
                    &app.id,
                    ApplicationStatus::ReturnShipped,
                    ApplicationStatus::Completed,
                    &[applications::Column::CompletedAt],
                    cmd.at,
                )
                .await?;
                // Only rental-kind applications put the unit back; a
                // purchase-kind application keeps it sold.
                if kind == ApplicationKind::Rental {
                    self.release(db, good_id, app.quantity).await?;
                }
                self.mark_shipment_delivered(db, cmd.trade, ShipmentDirection::Return, cmd.at)
                    .await?;
                notices.push(Notice::for_trade(
                    &applicant,
                    "application_completed",
                    "Application completed",
                    format!("{owner} confirmed completion"),
                    cmd.trade,
                ));
            }
            TradeAction::Hide => {
                let party = party_of(&cmd.actor, &owner, &applicant)?;
                if !status.is_terminal() {
                    return Err(EngineError::InvalidTransition(
                        "only settled trades can be hidden".to_string(),
                    ));
                }
                let column = match party {
                    Party::Owner => applications::Column::HiddenForOwner,
                    Party::Counterparty => applications::Column::HiddenForApplicant,
                };
                applications::Entity::update_many()
                    .col_expr(column, Expr::value(true))
                    .filter(applications::Column::Id.eq(app.id.clone()))
                    .exec(db)
                    .await?;
            }
            other => {
                return Err(EngineError::InvalidTransition(format!(
                    "action {} does not apply to applications",
                    other.as_str()
                )));
            }
        }

        self.rebind_channel(db, cmd.trade, good_id, &owner, &applicant, cmd.at)
            .await;
        Ok(notices)
    }

    async fn set_application_status(
        &self,
        db: &DatabaseTransaction,
        id: &str,
        from: ApplicationStatus,
        to: ApplicationStatus,
        stamps: &[applications::Column],
        at: DateTime<Utc>,
    ) -> ResultEngine<()> {
        let mut update = applications::Entity::update_many()
            .col_expr(applications::Column::Status, Expr::value(to.as_str()))
            .filter(applications::Column::Id.eq(id))
            .filter(applications::Column::Status.eq(from.as_str()));
        for stamp in stamps {
            update = update.col_expr(*stamp, Expr::value(at));
        }

        let res = update.exec(db).await?;
        if res.rows_affected == 0 {
            return Err(EngineError::Conflict(
                "application was modified concurrently".to_string(),
            ));
        }
        Ok(())
    }
}

fn require_status(current: ApplicationStatus, expected: ApplicationStatus) -> ResultEngine<()> {
    if current != expected {
        return Err(EngineError::InvalidTransition(format!(
            "expected status {}, found {}",
            expected.as_str(),
            current.as_str()
        )));
    }
    Ok(())
}

/// Reject/cancel are only reachable while the application is still open.
fn require_open(current: ApplicationStatus) -> ResultEngine<()> {
    if !matches!(
        current,
        ApplicationStatus::Pending | ApplicationStatus::Approved
    ) {
        return Err(EngineError::InvalidTransition(format!(
            "cannot close an application in status {}",
            current.as_str()
        )));
    }
    Ok(())
}
