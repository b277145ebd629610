use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, DatabaseTransaction, QueryFilter, prelude::*, sea_query::Expr};
use uuid::Uuid;

use crate::{
    ContactSnapshot, ResultEngine, Shipment, ShipmentDirection, ShipmentStatus, TradeRef,
    shipments,
};

use super::Engine;

impl Engine {
    /// Freeze a party's contact profile for a shipment label.
    pub(super) async fn snapshot_contact(
        &self,
        db: &DatabaseTransaction,
        username: &str,
        fallback_address: Option<&str>,
    ) -> ResultEngine<ContactSnapshot> {
        let user = self.require_user(db, username).await?;
        Ok(ContactSnapshot::from_profile(&user, fallback_address))
    }

    /// Create or update the record for `(trade, direction)`.
    ///
    /// The pair is the identity; a second call overwrites tracking, status
    /// and snapshots instead of inserting a duplicate.
    pub(super) async fn upsert_shipment(
        &self,
        db: &DatabaseTransaction,
        trade: TradeRef,
        direction: ShipmentDirection,
        tracking_number: &str,
        status: ShipmentStatus,
        sender: ContactSnapshot,
        recipient: ContactSnapshot,
        at: DateTime<Utc>,
    ) -> ResultEngine<Uuid> {
        let existing = shipments::Entity::find()
            .filter(shipments::Column::TradeKind.eq(trade.kind.as_str()))
            .filter(shipments::Column::TradeId.eq(trade.id.to_string()))
            .filter(shipments::Column::Direction.eq(direction.as_str()))
            .one(db)
            .await?;

        if let Some(model) = existing {
            let id = model.id.clone();
            let update = shipments::ActiveModel {
                id: ActiveValue::Set(id.clone()),
                sender_name: ActiveValue::Set(sender.name),
                sender_phone: ActiveValue::Set(sender.phone),
                sender_address: ActiveValue::Set(sender.address),
                recipient_name: ActiveValue::Set(recipient.name),
                recipient_phone: ActiveValue::Set(recipient.phone),
                recipient_address: ActiveValue::Set(recipient.address),
                tracking_number: ActiveValue::Set(tracking_number.to_string()),
                status: ActiveValue::Set(status.as_str().to_string()),
                updated_at: ActiveValue::Set(at),
                ..Default::default()
            };
            update.update(db).await?;
            return Uuid::parse_str(&id)
                .map_err(|_| crate::EngineError::NotFound("shipment not exists".to_string()));
        }

        let shipment = Shipment {
            id: Uuid::new_v4(),
            trade,
            direction,
            sender,
            recipient,
            tracking_number: tracking_number.to_string(),
            status,
            created_at: at,
            updated_at: at,
        };
        shipments::ActiveModel::from(&shipment).insert(db).await?;
        Ok(shipment.id)
    }

    /// Flip the record for `(trade, direction)` to delivered.
    ///
    /// Missing records are ignored; the receive transition is the source of
    /// truth, the shipment row merely mirrors it.
    pub(super) async fn mark_shipment_delivered(
        &self,
        db: &DatabaseTransaction,
        trade: TradeRef,
        direction: ShipmentDirection,
        at: DateTime<Utc>,
    ) -> ResultEngine<()> {
        shipments::Entity::update_many()
            .col_expr(
                shipments::Column::Status,
                Expr::value(ShipmentStatus::Delivered.as_str()),
            )
            .col_expr(shipments::Column::UpdatedAt, Expr::value(at))
            .filter(shipments::Column::TradeKind.eq(trade.kind.as_str()))
            .filter(shipments::Column::TradeId.eq(trade.id.to_string()))
            .filter(shipments::Column::Direction.eq(direction.as_str()))
            .exec(db)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TradeKind;
    use migration::MigratorTrait;
    use sea_orm::{Database, TransactionTrait};

    fn snap(name: &str, address: &str) -> ContactSnapshot {
        ContactSnapshot {
            name: name.to_string(),
            phone: String::new(),
            address: address.to_string(),
        }
    }

    #[tokio::test]
    async fn upsert_is_keyed_on_trade_and_direction() {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        migration::Migrator::up(&db, None).await.unwrap();
        let engine = Engine::builder().database(db.clone()).build();

        let trade = TradeRef::new(TradeKind::Rental, Uuid::new_v4());
        let at = chrono::Utc::now();

        let db_tx = db.begin().await.unwrap();
        let first = engine
            .upsert_shipment(
                &db_tx,
                trade,
                ShipmentDirection::Outbound,
                "T1",
                ShipmentStatus::Created,
                snap("alice", "1 Owner St"),
                snap("bob", "2 Renter Rd"),
                at,
            )
            .await
            .unwrap();
        // Same key again: the row is rewritten, not duplicated.
        let second = engine
            .upsert_shipment(
                &db_tx,
                trade,
                ShipmentDirection::Outbound,
                "T2",
                ShipmentStatus::InTransit,
                snap("alice", "1 Owner St"),
                snap("bob", "9 Office Rd"),
                at,
            )
            .await
            .unwrap();
        assert_eq!(first, second);

        // A different direction is a different record.
        engine
            .upsert_shipment(
                &db_tx,
                trade,
                ShipmentDirection::Return,
                "T3",
                ShipmentStatus::Created,
                snap("bob", "2 Renter Rd"),
                snap("alice", "1 Owner St"),
                at,
            )
            .await
            .unwrap();
        db_tx.commit().await.unwrap();

        let rows = shipments::Entity::find().all(&db).await.unwrap();
        assert_eq!(rows.len(), 2);
        let outbound = rows
            .iter()
            .find(|r| r.direction == "outbound")
            .unwrap();
        assert_eq!(outbound.tracking_number, "T2");
        assert_eq!(outbound.status, "in_transit");
        assert_eq!(outbound.recipient_address, "9 Office Rd");
    }
}
