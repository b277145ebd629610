//! Inventory ledger: the only code allowed to touch `available_quantity`.
//!
//! Adjustments are clamped in SQL so `0 <= available <= stock` holds no
//! matter what quantity a transition hands in, and listings that opted out
//! of tracking (NULL availability) are skipped by the WHERE clause. Callers
//! must already be inside the transition's database transaction.

use sea_orm::{ConnectionTrait, DatabaseTransaction, Statement};
use uuid::Uuid;

use crate::ResultEngine;

use super::Engine;

impl Engine {
    /// Take `quantity` units out of the reservable pool.
    pub(super) async fn reserve(
        &self,
        db: &DatabaseTransaction,
        good_id: Uuid,
        quantity: i64,
    ) -> ResultEngine<()> {
        self.adjust_available(db, good_id, -quantity).await
    }

    /// Give `quantity` units back to the reservable pool.
    pub(super) async fn release(
        &self,
        db: &DatabaseTransaction,
        good_id: Uuid,
        quantity: i64,
    ) -> ResultEngine<()> {
        self.adjust_available(db, good_id, quantity).await
    }

    async fn adjust_available(
        &self,
        db: &DatabaseTransaction,
        good_id: Uuid,
        delta: i64,
    ) -> ResultEngine<()> {
        let stmt = Statement::from_sql_and_values(
            db.get_database_backend(),
            "UPDATE goods \
             SET available_quantity = MAX(0, MIN(stock_quantity, available_quantity + ?)) \
             WHERE id = ? AND available_quantity IS NOT NULL",
            [delta.into(), good_id.to_string().into()],
        );
        db.execute(stmt).await?;
        Ok(())
    }
}
