use sea_orm::{QueryFilter, TransactionTrait, prelude::*, sea_query::Expr};
use uuid::Uuid;

use crate::{
    EngineError, Good, GoodNewCmd, GoodStatus, ResultEngine,
    goods::{self, validate_listing_prices},
};

use super::{Engine, with_tx};

impl Engine {
    /// Create a good listing.
    ///
    /// Rental listings must carry a per-day rate and sale listings an
    /// outright price; a listing accepting both needs both.
    pub async fn new_good(&self, cmd: GoodNewCmd) -> ResultEngine<Uuid> {
        validate_listing_prices(cmd.listing, cmd.price_per_day, cmd.price_buy)?;
        if cmd.stock_quantity < 1 {
            return Err(EngineError::InvalidTransition(
                "stock_quantity must be >= 1".to_string(),
            ));
        }
        if cmd.min_rental_days < 1 || cmd.max_rental_days < cmd.min_rental_days {
            return Err(EngineError::InvalidTransition(
                "invalid rental day bounds".to_string(),
            ));
        }

        let good = Good {
            id: Uuid::new_v4(),
            owner_id: cmd.owner_id.clone(),
            title: cmd.title,
            description: cmd.description,
            category: cmd.category,
            condition: cmd.condition,
            owner_notes: cmd.owner_notes,
            listing: cmd.listing,
            price_per_day: cmd.price_per_day,
            price_buy: cmd.price_buy,
            min_rental_days: cmd.min_rental_days,
            max_rental_days: cmd.max_rental_days,
            stock_quantity: cmd.stock_quantity,
            available_quantity: cmd.track_availability.then_some(cmd.stock_quantity),
            status: GoodStatus::Listed,
            created_at: cmd.at,
        };

        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, &cmd.owner_id).await?;
            goods::ActiveModel::from(&good).insert(&db_tx).await?;
            Ok(good.id)
        })
    }

    /// Take a listing off the market. Existing trades keep running; new
    /// trade creation rejects archived goods.
    pub async fn archive_good(&self, good_id: Uuid, actor: &str) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let good = self.require_good(&db_tx, good_id).await?;
            if good.owner_id != actor {
                return Err(EngineError::Forbidden("owner action".to_string()));
            }

            let res = goods::Entity::update_many()
                .col_expr(
                    goods::Column::Status,
                    Expr::value(GoodStatus::Archived.as_str()),
                )
                .filter(goods::Column::Id.eq(good_id.to_string()))
                .filter(goods::Column::Status.eq(GoodStatus::Listed.as_str()))
                .exec(&db_tx)
                .await?;
            if res.rows_affected == 0 {
                return Err(EngineError::InvalidTransition(
                    "good is not listed".to_string(),
                ));
            }
            Ok(())
        })
    }

    /// Return a [`Good`].
    pub async fn good(&self, good_id: Uuid) -> ResultEngine<Good> {
        let model = goods::Entity::find_by_id(good_id.to_string())
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::NotFound("good not exists".to_string()))?;
        Good::try_from(model)
    }
}
