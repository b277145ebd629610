use sea_orm::{DatabaseTransaction, prelude::*};
use uuid::Uuid;

use crate::{EngineError, Party, ResultEngine, applications, goods, purchases, rentals, users};

use super::Engine;

/// Generates a `require_*` lookup returning the row or `NotFound`.
macro_rules! impl_require_row {
    ($fn_name:ident, $entity:path, $model:ty, $err_msg:literal) => {
        pub(super) async fn $fn_name(
            &self,
            db: &DatabaseTransaction,
            id: Uuid,
        ) -> ResultEngine<$model> {
            <$entity>::find_by_id(id.to_string())
                .one(db)
                .await?
                .ok_or_else(|| EngineError::NotFound($err_msg.to_string()))
        }
    };
}

impl Engine {
    impl_require_row!(require_good, goods::Entity, goods::Model, "good not exists");
    impl_require_row!(
        require_rental,
        rentals::Entity,
        rentals::Model,
        "rental not exists"
    );
    impl_require_row!(
        require_purchase,
        purchases::Entity,
        purchases::Model,
        "purchase not exists"
    );
    impl_require_row!(
        require_application,
        applications::Entity,
        applications::Model,
        "application not exists"
    );

    pub(super) async fn require_user(
        &self,
        db: &DatabaseTransaction,
        username: &str,
    ) -> ResultEngine<users::Model> {
        users::Entity::find_by_id(username.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::NotFound("user not exists".to_string()))
    }
}

/// Which side of the trade the actor is on; `Forbidden` for outsiders.
pub(super) fn party_of(actor: &str, owner: &str, counterparty: &str) -> ResultEngine<Party> {
    if actor == owner {
        Ok(Party::Owner)
    } else if actor == counterparty {
        Ok(Party::Counterparty)
    } else {
        Err(EngineError::Forbidden(
            "not a party to this trade".to_string(),
        ))
    }
}

/// Actor must hold exactly `required`.
pub(super) fn require_role(
    actor: &str,
    required: Party,
    owner: &str,
    counterparty: &str,
) -> ResultEngine<()> {
    let party = party_of(actor, owner, counterparty)?;
    if party != required {
        return Err(EngineError::Forbidden(match required {
            Party::Owner => "owner action".to_string(),
            Party::Counterparty => "counterparty action".to_string(),
        }));
    }
    Ok(())
}
