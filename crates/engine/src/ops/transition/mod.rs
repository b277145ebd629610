//! The guarded transition path.
//!
//! One call per user action: load the trade, check the actor's role, check
//! the source status, then apply the status change and its side effects
//! inside a single database transaction. The status write is a
//! compare-and-set on the source status, so of two racing callers exactly
//! one commits; the loser gets `Conflict`. Notifications go out after
//! commit and never affect the outcome.

use chrono::{DateTime, Utc};
use sea_orm::{DatabaseTransaction, TransactionTrait};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, TradeKind, TradeRef, TransitionCmd};

use super::{Engine, with_tx};

mod application;
mod purchase;
mod rental;

impl Engine {
    /// Drive one state machine step for any trade kind.
    ///
    /// This is the sole mutation entry point for existing trades. All
    /// failures (`NotFound`, `Forbidden`, `InvalidTransition`, `Conflict`)
    /// are synchronous; a committed step is never rolled back.
    pub async fn transition(&self, cmd: TransitionCmd) -> ResultEngine<()> {
        if cmd.action.needs_tracking() && tracking_of(&cmd).is_err() {
            return Err(EngineError::InvalidTransition(
                "tracking number required".to_string(),
            ));
        }

        let notices = with_tx!(self, |db_tx| {
            match cmd.trade.kind {
                TradeKind::Rental => self.transition_rental(&db_tx, &cmd).await,
                TradeKind::Purchase => self.transition_purchase(&db_tx, &cmd).await,
                TradeKind::Application => self.transition_application(&db_tx, &cmd).await,
            }
        })
        .map_err(map_lock_contention)?;

        self.dispatch_notices(notices, cmd.at).await;
        Ok(())
    }

    /// Re-ensure the channel binding during a transition.
    ///
    /// Binding lookups here are advisory: the trade got its channel at
    /// creation, so a failure is logged and the transition carries on.
    pub(super) async fn rebind_channel(
        &self,
        db: &DatabaseTransaction,
        trade: TradeRef,
        good_id: Uuid,
        owner: &str,
        counterparty: &str,
        at: DateTime<Utc>,
    ) {
        if let Err(err) = self
            .ensure_bound(db, trade, good_id, owner, counterparty, at)
            .await
        {
            tracing::warn!(trade_id = %trade.id, "channel binding lookup failed: {err}");
        }
    }
}

/// Writer-lock timeouts surface as `Conflict`, the same answer a lost
/// compare-and-set gives.
fn map_lock_contention(err: EngineError) -> EngineError {
    match err {
        EngineError::Database(db_err) if db_err.to_string().contains("database is locked") => {
            EngineError::Conflict("trade is locked by another request".to_string())
        }
        other => other,
    }
}

/// The non-empty tracking number of a shipping action.
pub(super) fn tracking_of(cmd: &TransitionCmd) -> ResultEngine<&str> {
    cmd.tracking_number
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| EngineError::InvalidTransition("tracking number required".to_string()))
}

/// Parse the good id stored on a trade row.
pub(super) fn good_id_of(raw: &str) -> ResultEngine<Uuid> {
    Uuid::parse_str(raw).map_err(|_| EngineError::NotFound("good not exists".to_string()))
}
