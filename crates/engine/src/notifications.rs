//! Notification events.
//!
//! Immutable once created, except for `read_at`. Only the dispatcher writes
//! them; delivery to the user is someone else's problem.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, TradeKind, TradeRef};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: String,
    pub kind: String,
    pub title: String,
    pub body: String,
    pub link: Option<String>,
    pub trade: Option<TradeRef>,
    pub created_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "notifications")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub kind: String,
    pub title: String,
    pub body: String,
    pub link: Option<String>,
    pub trade_kind: Option<String>,
    pub trade_id: Option<String>,
    pub created_at: DateTimeUtc,
    pub read_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Notification {
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
                .map_err(|_| EngineError::NotFound("notification not exists".to_string()))?,
            user_id: model.user_id,
            kind: model.kind,
            title: model.title,
            body: model.body,
            link: model.link,
            trade,
            created_at: model.created_at,
            read_at: model.read_at,
        })
    }
}

impl From<&Notification> for ActiveModel {
    fn from(n: &Notification) -> Self {
        Self {
            id: ActiveValue::Set(n.id.to_string()),
            user_id: ActiveValue::Set(n.user_id.clone()),
            kind: ActiveValue::Set(n.kind.clone()),
            title: ActiveValue::Set(n.title.clone()),
            body: ActiveValue::Set(n.body.clone()),
            link: ActiveValue::Set(n.link.clone()),
            trade_kind: ActiveValue::Set(n.trade.map(|t| t.kind.as_str().to_string())),
            trade_id: ActiveValue::Set(n.trade.map(|t| t.id.to_string())),
            created_at: ActiveValue::Set(n.created_at),
            read_at: ActiveValue::Set(n.read_at),
        }
    }
}
