use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveValue, Condition, DatabaseTransaction, QueryFilter, TransactionTrait, prelude::*,
};
use uuid::Uuid;

use crate::{Channel, EngineError, ResultEngine, TradeRef, channels};

use super::{Engine, with_tx};

fn pair_condition(owner: &str, counterparty: &str) -> Condition {
    Condition::any()
        .add(
            Condition::all()
                .add(channels::Column::UserA.eq(owner))
                .add(channels::Column::UserB.eq(counterparty)),
        )
        .add(
            Condition::all()
                .add(channels::Column::UserA.eq(counterparty))
                .add(channels::Column::UserB.eq(owner)),
        )
}

impl Engine {
    /// Guarantee exactly one channel is bound to `trade`.
    ///
    /// A pre-transaction channel between the same pair over the same good is
    /// promoted rather than duplicated; otherwise a fresh bound channel is
    /// created.
    pub(super) async fn ensure_bound(
        &self,
        db: &DatabaseTransaction,
        trade: TradeRef,
        good_id: Uuid,
        owner: &str,
        counterparty: &str,
        at: DateTime<Utc>,
    ) -> ResultEngine<Uuid> {
        let bound = channels::Entity::find()
            .filter(channels::Column::TradeKind.eq(trade.kind.as_str()))
            .filter(channels::Column::TradeId.eq(trade.id.to_string()))
            .one(db)
            .await?;
        if let Some(model) = bound {
            return Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::NotFound("channel not exists".to_string()));
        }

        let untethered = channels::Entity::find()
            .filter(channels::Column::GoodId.eq(good_id.to_string()))
            .filter(channels::Column::TradeId.is_null())
            .filter(pair_condition(owner, counterparty))
            .one(db)
            .await?;
        if let Some(model) = untethered {
            let id = model.id.clone();
            let update = channels::ActiveModel {
                id: ActiveValue::Set(id.clone()),
                trade_kind: ActiveValue::Set(Some(trade.kind.as_str().to_string())),
                trade_id: ActiveValue::Set(Some(trade.id.to_string())),
                ..Default::default()
            };
            update.update(db).await?;
            return Uuid::parse_str(&id)
                .map_err(|_| EngineError::NotFound("channel not exists".to_string()));
        }

        let channel = Channel {
            id: Uuid::new_v4(),
            good_id,
            user_a: owner.to_string(),
            user_b: counterparty.to_string(),
            trade: Some(trade),
            created_at: at,
        };
        channels::ActiveModel::from(&channel).insert(db).await?;
        Ok(channel.id)
    }

    /// Open (or return) the pre-transaction channel between two users over a
    /// good. This is the discussion that starts before any formal request;
    /// the first trade between the pair consumes it.
    pub async fn open_channel(
        &self,
        good_id: Uuid,
        user_a: &str,
        user_b: &str,
        at: DateTime<Utc>,
    ) -> ResultEngine<Uuid> {
        with_tx!(self, |db_tx| {
            self.require_good(&db_tx, good_id).await?;
            self.require_user(&db_tx, user_a).await?;
            self.require_user(&db_tx, user_b).await?;

            let existing = channels::Entity::find()
                .filter(channels::Column::GoodId.eq(good_id.to_string()))
                .filter(channels::Column::TradeId.is_null())
                .filter(pair_condition(user_a, user_b))
                .one(&db_tx)
                .await?;
            if let Some(model) = existing {
                return Uuid::parse_str(&model.id)
                    .map_err(|_| EngineError::NotFound("channel not exists".to_string()));
            }

            let channel = Channel {
                id: Uuid::new_v4(),
                good_id,
                user_a: user_a.to_string(),
                user_b: user_b.to_string(),
                trade: None,
                created_at: at,
            };
            channels::ActiveModel::from(&channel).insert(&db_tx).await?;
            Ok(channel.id)
        })
    }

    /// Return the channel bound to a trade.
    pub async fn channel_for(&self, trade: TradeRef) -> ResultEngine<Channel> {
        let model = channels::Entity::find()
            .filter(channels::Column::TradeKind.eq(trade.kind.as_str()))
            .filter(channels::Column::TradeId.eq(trade.id.to_string()))
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::NotFound("channel not exists".to_string()))?;
        Channel::try_from(model)
    }
}
