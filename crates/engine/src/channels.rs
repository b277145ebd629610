//! Discussion channels.
//!
//! A channel connects exactly the two trade parties over one good. It may
//! exist before any trade ("pre-transaction" channel); the first trade
//! created between the pair over that good consumes it. A channel is bound
//! to at most one trade, and a trade has at most one channel. The message
//! transport lives elsewhere; only the binding is handled here.

use chrono::{DateTime, Duration, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, TradeKind, TradeRef};

/// Days a purchase discussion stays open past completion.
const CHAT_GRACE_DAYS: i64 = 14;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    pub id: Uuid,
    pub good_id: Uuid,
    pub user_a: String,
    pub user_b: String,
    pub trade: Option<TradeRef>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "channels")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub good_id: String,
    pub user_a: String,
    pub user_b: String,
    pub trade_kind: Option<String>,
    pub trade_id: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Channel> for ActiveModel {
    fn from(channel: &Channel) -> Self {
        Self {
            id: ActiveValue::Set(channel.id.to_string()),
            good_id: ActiveValue::Set(channel.good_id.to_string()),
            user_a: ActiveValue::Set(channel.user_a.clone()),
            user_b: ActiveValue::Set(channel.user_b.clone()),
            trade_kind: ActiveValue::Set(channel.trade.map(|t| t.kind.as_str().to_string())),
            trade_id: ActiveValue::Set(channel.trade.map(|t| t.id.to_string())),
            created_at: ActiveValue::Set(channel.created_at),
        }
    }
}

impl TryFrom<Model> for Channel {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let trade = match (model.trade_kind.as_deref(), model.trade_id.as_deref()) {
            (Some(kind), Some(id)) => Some(TradeRef::new(
                TradeKind::try_from(kind)?,
                Uuid::parse_str(id)
                    .map_err(|_| EngineError::NotFound("trade not exists".to_string()))?,
            )),
            _ => None,
        };
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::NotFound("channel not exists".to_string()))?,
            good_id: Uuid::parse_str(&model.good_id)
                .map_err(|_| EngineError::NotFound("good not exists".to_string()))?,
            user_a: model.user_a,
            user_b: model.user_b,
            trade,
            created_at: model.created_at,
        })
    }
}

/// Deadline after which a completed purchase's discussion closes.
pub fn chat_deadline(completed_at: DateTime<Utc>) -> DateTime<Utc> {
    completed_at + Duration::days(CHAT_GRACE_DAYS)
}

/// Whether the discussion on a purchase is still open.
///
/// Canceled purchases close immediately; open-ended trades (not yet
/// completed) never expire.
pub fn chat_open(completed_at: Option<DateTime<Utc>>, canceled: bool, now: DateTime<Utc>) -> bool {
    if canceled {
        return false;
    }
    match completed_at {
        Some(done) => now <= chat_deadline(done),
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_closes_two_weeks_after_completion() {
        let done = Utc::now();
        assert!(chat_open(Some(done), false, done + Duration::days(13)));
        assert!(!chat_open(Some(done), false, done + Duration::days(15)));
    }

    #[test]
    fn canceled_purchase_has_no_chat() {
        assert!(!chat_open(None, true, Utc::now()));
    }

    #[test]
    fn unfinished_purchase_chat_stays_open() {
        assert!(chat_open(None, false, Utc::now()));
    }
}
