use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{EngineError, Notification, ResultEngine, TradeRef, notifications, users};

use super::{Engine, with_tx};

/// A pending notification, collected during a transition and dispatched
/// after its database transaction commits.
#[derive(Clone, Debug)]
pub(crate) struct Notice {
    pub user_id: String,
    pub kind: &'static str,
    pub title: String,
    pub body: String,
    pub link: Option<String>,
    pub trade: Option<TradeRef>,
}

impl Notice {
    pub(crate) fn for_trade(
        user_id: impl Into<String>,
        kind: &'static str,
        title: impl Into<String>,
        body: impl Into<String>,
        trade: TradeRef,
    ) -> Self {
        let user_id = user_id.into();
        Self {
            link: Some(format!("/trades/{}/{}", trade.kind.as_str(), trade.id)),
            user_id,
            kind,
            title: title.into(),
            body: body.into(),
            trade: Some(trade),
        }
    }
}

impl Engine {
    /// Best-effort creation of notification events.
    ///
    /// Runs strictly after the transition committed. Failures are logged and
    /// dropped; the committed transition is the unit of truth and is never
    /// retried or rolled back on their account.
    pub(super) async fn dispatch_notices(&self, notices: Vec<Notice>, at: DateTime<Utc>) {
        for notice in notices {
            if let Err(err) = self.insert_notification(&notice, at).await {
                tracing::warn!(
                    recipient = %notice.user_id,
                    kind = notice.kind,
                    "failed to create notification: {err}"
                );
            }
        }
    }

    async fn insert_notification(&self, notice: &Notice, at: DateTime<Utc>) -> ResultEngine<()> {
        let recipient = users::Entity::find_by_id(notice.user_id.clone())
            .one(&self.database)
            .await?;
        if recipient.is_none() {
            return Err(EngineError::NotFound("user not exists".to_string()));
        }

        let notification = Notification {
            id: Uuid::new_v4(),
            user_id: notice.user_id.clone(),
            kind: notice.kind.to_string(),
            title: notice.title.clone(),
            body: notice.body.clone(),
            link: notice.link.clone(),
            trade: notice.trade,
            created_at: at,
            read_at: None,
        };
        notifications::ActiveModel::from(&notification)
            .insert(&self.database)
            .await?;
        Ok(())
    }

    /// List a user's notifications, newest first.
    pub async fn notifications(
        &self,
        user_id: &str,
        unread_only: bool,
    ) -> ResultEngine<Vec<Notification>> {
        let mut query = notifications::Entity::find()
            .filter(notifications::Column::UserId.eq(user_id))
            .order_by_desc(notifications::Column::CreatedAt);
        if unread_only {
            query = query.filter(notifications::Column::ReadAt.is_null());
        }

        let models = query.all(&self.database).await?;
        models.into_iter().map(Notification::try_from).collect()
    }

    /// Acknowledge a notification. Only its recipient may do so; marking an
    /// already-read notification keeps the original read timestamp.
    pub async fn mark_notification_read(
        &self,
        user_id: &str,
        notification_id: Uuid,
        at: DateTime<Utc>,
    ) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let model = notifications::Entity::find_by_id(notification_id.to_string())
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::NotFound("notification not exists".to_string()))?;
            if model.user_id != user_id {
                return Err(EngineError::NotFound("notification not exists".to_string()));
            }
            if model.read_at.is_some() {
                return Ok(());
            }

            let update = notifications::ActiveModel {
                id: ActiveValue::Set(model.id),
                read_at: ActiveValue::Set(Some(at)),
                ..Default::default()
            };
            update.update(&db_tx).await?;
            Ok(())
        })
    }
}
