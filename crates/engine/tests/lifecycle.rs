use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};
use uuid::Uuid;

use engine::{
    BuyoutCmd, Engine, EngineError, GoodNewCmd, ListingKind, ShipmentDirection, ShipmentStatus,
    TradeAction, TradeKind, TradeNewCmd, TradeRef, TransitionCmd,
};
use migration::MigratorTrait;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let backend = db.get_database_backend();
    for (username, display_name, address) in [
        ("alice", "Alice A.", "1 Owner St"),
        ("bob", "Bob B.", "2 Renter Rd"),
        ("carol", "Carol C.", "3 Bystander Ave"),
    ] {
        db.execute(Statement::from_sql_and_values(
            backend,
            "INSERT INTO users (username, password, display_name, phone, address) \
             VALUES (?, ?, ?, ?, ?)",
            vec![
                username.into(),
                "password".into(),
                display_name.into(),
                "090-0000-0000".into(),
                address.into(),
            ],
        ))
        .await
        .unwrap();
    }
    let engine = Engine::builder().database(db.clone()).build();
    (engine, db)
}

fn at(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, day, 12, 0, 0).unwrap()
}

fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, day).unwrap()
}

/// A listed good owned by alice: 500/day, 10000 outright.
async fn camera(engine: &Engine, stock: i64) -> Uuid {
    engine
        .new_good(
            GoodNewCmd::new("alice", "Camera", ListingKind::Both, at(1))
                .price_per_day(500)
                .price_buy(10_000)
                .stock(stock),
        )
        .await
        .unwrap()
}

async fn available(engine: &Engine, good_id: Uuid) -> Option<i64> {
    engine.good(good_id).await.unwrap().available_quantity
}

async fn step(
    engine: &Engine,
    trade: TradeRef,
    action: TradeAction,
    actor: &str,
    day: u32,
) -> Result<(), EngineError> {
    engine
        .transition(TransitionCmd::new(trade, action, actor, at(day)))
        .await
}

#[tokio::test]
async fn rental_walks_full_lifecycle() {
    let (engine, _db) = engine_with_db().await;
    let good_id = camera(&engine, 5).await;

    let rental_id = engine
        .create_trade(
            TradeNewCmd::new(TradeKind::Rental, good_id, "bob", at(2))
                .quantity(2)
                .dates(date(10), date(19))
                .destination("100-0001", "2 Renter Rd")
                .payment_method("card"),
        )
        .await
        .unwrap();
    let trade = TradeRef::new(TradeKind::Rental, rental_id);

    // 500/day x 10 days x 2 units.
    let view = engine.trade(trade, "bob").await.unwrap();
    assert_eq!(view.total_price, 10_000);
    assert_eq!(view.status, "requested");
    // Requesting does not reserve.
    assert_eq!(available(&engine, good_id).await, Some(5));

    step(&engine, trade, TradeAction::Approve, "alice", 3)
        .await
        .unwrap();
    assert_eq!(available(&engine, good_id).await, Some(3));

    engine
        .transition(
            TransitionCmd::new(trade, TradeAction::Ship, "alice", at(4)).tracking("ABC123"),
        )
        .await
        .unwrap();
    let shipments = engine.shipments_for(trade, "alice").await.unwrap();
    assert_eq!(shipments.len(), 1);
    assert_eq!(shipments[0].direction, ShipmentDirection::Outbound);
    assert_eq!(shipments[0].tracking_number, "ABC123");
    assert_eq!(shipments[0].status, ShipmentStatus::InTransit);

    step(&engine, trade, TradeAction::Receive, "bob", 10)
        .await
        .unwrap();
    engine
        .transition(
            TransitionCmd::new(trade, TradeAction::ShipBack, "bob", at(19)).tracking("XYZ789"),
        )
        .await
        .unwrap();
    step(&engine, trade, TradeAction::Confirm, "alice", 21)
        .await
        .unwrap();

    let view = engine.trade(trade, "alice").await.unwrap();
    assert_eq!(view.status, "completed");
    // Units are back on the shelf after the return.
    assert_eq!(available(&engine, good_id).await, Some(5));

    let shipments = engine.shipments_for(trade, "bob").await.unwrap();
    assert_eq!(shipments.len(), 2);
    assert!(
        shipments
            .iter()
            .all(|s| s.status == ShipmentStatus::Delivered)
    );
}

#[tokio::test]
async fn rental_cannot_be_canceled_once_shipped() {
    let (engine, _db) = engine_with_db().await;
    let good_id = camera(&engine, 5).await;

    let rental_id = engine
        .create_trade(
            TradeNewCmd::new(TradeKind::Rental, good_id, "bob", at(2))
                .quantity(2)
                .dates(date(10), date(19)),
        )
        .await
        .unwrap();
    let trade = TradeRef::new(TradeKind::Rental, rental_id);

    step(&engine, trade, TradeAction::Approve, "alice", 3)
        .await
        .unwrap();
    engine
        .transition(
            TransitionCmd::new(trade, TradeAction::Ship, "alice", at(4)).tracking("ABC123"),
        )
        .await
        .unwrap();

    let err = step(&engine, trade, TradeAction::Cancel, "bob", 5)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidTransition(_)));
    // The failed cancel must not touch the reservation.
    assert_eq!(available(&engine, good_id).await, Some(3));
}

#[tokio::test]
async fn cancel_after_approval_restores_reservation() {
    let (engine, _db) = engine_with_db().await;
    let good_id = camera(&engine, 5).await;

    let rental_id = engine
        .create_trade(
            TradeNewCmd::new(TradeKind::Rental, good_id, "bob", at(2))
                .quantity(2)
                .dates(date(10), date(19)),
        )
        .await
        .unwrap();
    let trade = TradeRef::new(TradeKind::Rental, rental_id);

    step(&engine, trade, TradeAction::Approve, "alice", 3)
        .await
        .unwrap();
    assert_eq!(available(&engine, good_id).await, Some(3));

    step(&engine, trade, TradeAction::Cancel, "bob", 4)
        .await
        .unwrap();
    assert_eq!(available(&engine, good_id).await, Some(5));
    let view = engine.trade(trade, "bob").await.unwrap();
    assert_eq!(view.status, "canceled");
}

#[tokio::test]
async fn second_approve_fails_and_reserves_once() {
    let (engine, _db) = engine_with_db().await;
    let good_id = camera(&engine, 5).await;

    let rental_id = engine
        .create_trade(
            TradeNewCmd::new(TradeKind::Rental, good_id, "bob", at(2))
                .quantity(1)
                .dates(date(10), date(19)),
        )
        .await
        .unwrap();
    let trade = TradeRef::new(TradeKind::Rental, rental_id);

    step(&engine, trade, TradeAction::Approve, "alice", 3)
        .await
        .unwrap();
    let err = step(&engine, trade, TradeAction::Approve, "alice", 3)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::InvalidTransition(_) | EngineError::Conflict(_)
    ));
    // Exactly one reservation's worth.
    assert_eq!(available(&engine, good_id).await, Some(4));
}

#[tokio::test]
async fn transitions_enforce_roles() {
    let (engine, _db) = engine_with_db().await;
    let good_id = camera(&engine, 5).await;

    let rental_id = engine
        .create_trade(
            TradeNewCmd::new(TradeKind::Rental, good_id, "bob", at(2))
                .quantity(1)
                .dates(date(10), date(19)),
        )
        .await
        .unwrap();
    let trade = TradeRef::new(TradeKind::Rental, rental_id);

    // The renter cannot approve their own request.
    let err = step(&engine, trade, TradeAction::Approve, "bob", 3)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    // A third party is no party at all.
    let err = step(&engine, trade, TradeAction::Approve, "carol", 3)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    step(&engine, trade, TradeAction::Approve, "alice", 3)
        .await
        .unwrap();
    // Shipping is the owner's move, not the renter's.
    let err = engine
        .transition(TransitionCmd::new(trade, TradeAction::Ship, "bob", at(4)).tracking("T1"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));
}

#[tokio::test]
async fn shipping_requires_tracking_number() {
    let (engine, _db) = engine_with_db().await;
    let good_id = camera(&engine, 5).await;

    let rental_id = engine
        .create_trade(
            TradeNewCmd::new(TradeKind::Rental, good_id, "bob", at(2))
                .quantity(1)
                .dates(date(10), date(19)),
        )
        .await
        .unwrap();
    let trade = TradeRef::new(TradeKind::Rental, rental_id);

    step(&engine, trade, TradeAction::Approve, "alice", 3)
        .await
        .unwrap();
    let err = step(&engine, trade, TradeAction::Ship, "alice", 4)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidTransition(_)));

    let view = engine.trade(trade, "alice").await.unwrap();
    assert_eq!(view.status, "approved");
}

#[tokio::test]
async fn purchase_reserves_at_creation_and_completes() {
    let (engine, _db) = engine_with_db().await;
    let good_id = camera(&engine, 3).await;

    let purchase_id = engine
        .create_trade(
            TradeNewCmd::new(TradeKind::Purchase, good_id, "bob", at(2))
                .quantity(1)
                .destination("100-0001", "2 Renter Rd"),
        )
        .await
        .unwrap();
    let trade = TradeRef::new(TradeKind::Purchase, purchase_id);

    // Sales hold their unit from the request.
    assert_eq!(available(&engine, good_id).await, Some(2));
    let view = engine.trade(trade, "bob").await.unwrap();
    assert_eq!(view.total_price, 10_000);
    assert_eq!(view.status, "pending");

    step(&engine, trade, TradeAction::Approve, "alice", 3)
        .await
        .unwrap();
    engine
        .transition(
            TransitionCmd::new(trade, TradeAction::Ship, "alice", at(4)).tracking("TRK555"),
        )
        .await
        .unwrap();
    step(&engine, trade, TradeAction::Receive, "bob", 6)
        .await
        .unwrap();

    let view = engine.trade(trade, "alice").await.unwrap();
    assert_eq!(view.status, "completed");
    // Sold units never come back.
    assert_eq!(available(&engine, good_id).await, Some(2));
}

#[tokio::test]
async fn purchase_cancel_restores_reservation() {
    let (engine, _db) = engine_with_db().await;
    let good_id = camera(&engine, 3).await;

    let purchase_id = engine
        .create_trade(TradeNewCmd::new(TradeKind::Purchase, good_id, "bob", at(2)).quantity(1))
        .await
        .unwrap();
    let trade = TradeRef::new(TradeKind::Purchase, purchase_id);
    assert_eq!(available(&engine, good_id).await, Some(2));

    step(&engine, trade, TradeAction::Cancel, "alice", 3)
        .await
        .unwrap();
    assert_eq!(available(&engine, good_id).await, Some(3));

    // Canceled is terminal; approving afterwards is rejected.
    let err = step(&engine, trade, TradeAction::Approve, "alice", 4)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidTransition(_)));
}

#[tokio::test]
async fn purchase_return_subflow() {
    let (engine, _db) = engine_with_db().await;
    let good_id = camera(&engine, 3).await;

    let purchase_id = engine
        .create_trade(TradeNewCmd::new(TradeKind::Purchase, good_id, "bob", at(2)).quantity(1))
        .await
        .unwrap();
    let trade = TradeRef::new(TradeKind::Purchase, purchase_id);

    // A return cannot be requested before the purchase settles.
    let err = step(&engine, trade, TradeAction::RequestReturn, "bob", 3)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidTransition(_)));

    step(&engine, trade, TradeAction::Approve, "alice", 3)
        .await
        .unwrap();
    engine
        .transition(TransitionCmd::new(trade, TradeAction::Ship, "alice", at(4)).tracking("T1"))
        .await
        .unwrap();
    step(&engine, trade, TradeAction::Receive, "bob", 6)
        .await
        .unwrap();

    step(&engine, trade, TradeAction::RequestReturn, "bob", 7)
        .await
        .unwrap();
    step(&engine, trade, TradeAction::ApproveReturn, "alice", 8)
        .await
        .unwrap();
    engine
        .transition(
            TransitionCmd::new(trade, TradeAction::ShipReturn, "bob", at(9)).tracking("RTN42"),
        )
        .await
        .unwrap();
    step(&engine, trade, TradeAction::ReceiveReturn, "alice", 11)
        .await
        .unwrap();

    let view = engine.trade(trade, "bob").await.unwrap();
    assert_eq!(view.status, "completed");
    assert_eq!(view.return_status.as_deref(), Some("received"));

    // The return movement got its own record, back to the seller.
    let shipments = engine.shipments_for(trade, "alice").await.unwrap();
    let inbound = shipments
        .iter()
        .find(|s| s.direction == ShipmentDirection::Inbound)
        .unwrap();
    assert_eq!(inbound.tracking_number, "RTN42");
    assert_eq!(inbound.status, ShipmentStatus::Delivered);
    // Returning a sold item has no quantity effect.
    assert_eq!(available(&engine, good_id).await, Some(2));
}

#[tokio::test]
async fn return_can_be_rejected() {
    let (engine, _db) = engine_with_db().await;
    let good_id = camera(&engine, 3).await;

    let purchase_id = engine
        .create_trade(TradeNewCmd::new(TradeKind::Purchase, good_id, "bob", at(2)).quantity(1))
        .await
        .unwrap();
    let trade = TradeRef::new(TradeKind::Purchase, purchase_id);

    step(&engine, trade, TradeAction::Approve, "alice", 3)
        .await
        .unwrap();
    engine
        .transition(TransitionCmd::new(trade, TradeAction::Ship, "alice", at(4)).tracking("T1"))
        .await
        .unwrap();
    step(&engine, trade, TradeAction::Receive, "bob", 6)
        .await
        .unwrap();
    step(&engine, trade, TradeAction::RequestReturn, "bob", 7)
        .await
        .unwrap();
    step(&engine, trade, TradeAction::RejectReturn, "alice", 8)
        .await
        .unwrap();

    let view = engine.trade(trade, "bob").await.unwrap();
    assert_eq!(view.return_status.as_deref(), Some("rejected"));

    // A rejected return is final.
    let err = step(&engine, trade, TradeAction::ShipReturn, "bob", 9)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidTransition(_)));
}

#[tokio::test]
async fn application_rental_lifecycle() {
    let (engine, _db) = engine_with_db().await;
    let good_id = camera(&engine, 4).await;

    let app_id = engine
        .create_trade(
            TradeNewCmd::new(TradeKind::Application, good_id, "bob", at(2))
                .application_kind(engine::ApplicationKind::Rental)
                .quantity(2)
                .dates(date(10), date(19)),
        )
        .await
        .unwrap();
    let trade = TradeRef::new(TradeKind::Application, app_id);
    assert_eq!(available(&engine, good_id).await, Some(4));

    step(&engine, trade, TradeAction::Approve, "alice", 3)
        .await
        .unwrap();
    assert_eq!(available(&engine, good_id).await, Some(2));

    engine
        .transition(TransitionCmd::new(trade, TradeAction::Ship, "alice", at(4)).tracking("AP1"))
        .await
        .unwrap();
    step(&engine, trade, TradeAction::Receive, "bob", 10)
        .await
        .unwrap();
    engine
        .transition(
            TransitionCmd::new(trade, TradeAction::ShipBack, "bob", at(19)).tracking("AP2"),
        )
        .await
        .unwrap();
    step(&engine, trade, TradeAction::Confirm, "alice", 21)
        .await
        .unwrap();

    let view = engine.trade(trade, "bob").await.unwrap();
    assert_eq!(view.status, "completed");
    // Rental-kind applications give the units back on completion.
    assert_eq!(available(&engine, good_id).await, Some(4));
}

#[tokio::test]
async fn application_reject_after_approval_releases() {
    let (engine, _db) = engine_with_db().await;
    let good_id = camera(&engine, 4).await;

    let app_id = engine
        .create_trade(
            TradeNewCmd::new(TradeKind::Application, good_id, "bob", at(2))
                .application_kind(engine::ApplicationKind::Rental)
                .quantity(2)
                .dates(date(10), date(19)),
        )
        .await
        .unwrap();
    let trade = TradeRef::new(TradeKind::Application, app_id);

    step(&engine, trade, TradeAction::Approve, "alice", 3)
        .await
        .unwrap();
    assert_eq!(available(&engine, good_id).await, Some(2));

    step(&engine, trade, TradeAction::Reject, "alice", 4)
        .await
        .unwrap();
    assert_eq!(available(&engine, good_id).await, Some(4));
    let view = engine.trade(trade, "bob").await.unwrap();
    assert_eq!(view.status, "rejected");

    // Only the applicant cancels; the owner rejects.
    let app_id = engine
        .create_trade(
            TradeNewCmd::new(TradeKind::Application, good_id, "bob", at(5))
                .application_kind(engine::ApplicationKind::Rental)
                .quantity(1)
                .dates(date(10), date(19)),
        )
        .await
        .unwrap();
    let trade = TradeRef::new(TradeKind::Application, app_id);
    let err = step(&engine, trade, TradeAction::Cancel, "alice", 6)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));
}

#[tokio::test]
async fn buyout_credits_rental_cost_and_closes_source() {
    let (engine, _db) = engine_with_db().await;
    let good_id = camera(&engine, 5).await;

    let rental_id = engine
        .create_trade(
            TradeNewCmd::new(TradeKind::Rental, good_id, "bob", at(2))
                .quantity(1)
                .dates(date(10), date(19)),
        )
        .await
        .unwrap();
    let rental = TradeRef::new(TradeKind::Rental, rental_id);

    step(&engine, rental, TradeAction::Approve, "alice", 3)
        .await
        .unwrap();
    engine
        .transition(TransitionCmd::new(rental, TradeAction::Ship, "alice", at(9)).tracking("S1"))
        .await
        .unwrap();
    step(&engine, rental, TradeAction::Receive, "bob", 10)
        .await
        .unwrap();
    assert_eq!(available(&engine, good_id).await, Some(4));

    // 4 days into the rental: 10000 - 500 x 4 = 8000.
    let quote = engine.buyout_quote(rental, "bob", at(14)).await.unwrap();
    assert_eq!(quote, 8_000);

    let purchase_id = engine
        .create_buyout(BuyoutCmd::new(rental, "bob", at(14)).payment_method("card"))
        .await
        .unwrap();
    let purchase = TradeRef::new(TradeKind::Purchase, purchase_id);
    let view = engine.trade(purchase, "bob").await.unwrap();
    assert_eq!(view.total_price, 8_000);
    assert_eq!(view.status, "pending");

    // Approval settles the sale immediately; the good never ships again.
    step(&engine, purchase, TradeAction::Approve, "alice", 15)
        .await
        .unwrap();
    let view = engine.trade(purchase, "bob").await.unwrap();
    assert_eq!(view.status, "completed");

    // The source rental is force-closed and the unit stays sold.
    let view = engine.trade(rental, "bob").await.unwrap();
    assert_eq!(view.status, "completed");
    assert_eq!(available(&engine, good_id).await, Some(4));
}

#[tokio::test]
async fn buyout_requires_active_occupancy() {
    let (engine, _db) = engine_with_db().await;
    let good_id = camera(&engine, 5).await;

    let rental_id = engine
        .create_trade(
            TradeNewCmd::new(TradeKind::Rental, good_id, "bob", at(2))
                .quantity(1)
                .dates(date(10), date(19)),
        )
        .await
        .unwrap();
    let rental = TradeRef::new(TradeKind::Rental, rental_id);

    // Still requested: nothing to buy out yet.
    let err = engine
        .create_buyout(BuyoutCmd::new(rental, "bob", at(3)))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidTransition(_)));

    step(&engine, rental, TradeAction::Approve, "alice", 3)
        .await
        .unwrap();
    engine
        .transition(TransitionCmd::new(rental, TradeAction::Ship, "alice", at(9)).tracking("S1"))
        .await
        .unwrap();
    step(&engine, rental, TradeAction::Receive, "bob", 10)
        .await
        .unwrap();

    // Only the renter can buy out.
    let err = engine
        .create_buyout(BuyoutCmd::new(rental, "carol", at(12)))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));
}

#[tokio::test]
async fn untracked_good_skips_inventory() {
    let (engine, _db) = engine_with_db().await;
    let good_id = engine
        .new_good(
            GoodNewCmd::new("alice", "Poster", ListingKind::SaleOnly, at(1))
                .price_buy(2_000)
                .stock(10)
                .untracked(),
        )
        .await
        .unwrap();

    let purchase_id = engine
        .create_trade(TradeNewCmd::new(TradeKind::Purchase, good_id, "bob", at(2)).quantity(3))
        .await
        .unwrap();
    let trade = TradeRef::new(TradeKind::Purchase, purchase_id);
    assert_eq!(available(&engine, good_id).await, None);

    step(&engine, trade, TradeAction::Cancel, "bob", 3)
        .await
        .unwrap();
    assert_eq!(available(&engine, good_id).await, None);
}

#[tokio::test]
async fn creation_validates_kind_and_inventory() {
    let (engine, _db) = engine_with_db().await;

    let sale_only = engine
        .new_good(
            GoodNewCmd::new("alice", "Poster", ListingKind::SaleOnly, at(1))
                .price_buy(2_000)
                .stock(1),
        )
        .await
        .unwrap();

    // Rental request against a sale-only listing.
    let err = engine
        .create_trade(
            TradeNewCmd::new(TradeKind::Rental, sale_only, "bob", at(2))
                .dates(date(10), date(12)),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidTransition(_)));

    // More than the shelf holds.
    let err = engine
        .create_trade(TradeNewCmd::new(TradeKind::Purchase, sale_only, "bob", at(2)).quantity(2))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InsufficientInventory(_)));

    // Owners do not trade with themselves.
    let err = engine
        .create_trade(TradeNewCmd::new(TradeKind::Purchase, sale_only, "alice", at(2)))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    // Unknown goods surface as NotFound.
    let err = engine
        .create_trade(TradeNewCmd::new(
            TradeKind::Purchase,
            Uuid::new_v4(),
            "bob",
            at(2),
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));
}

#[tokio::test]
async fn rental_period_respects_listing_bounds() {
    let (engine, _db) = engine_with_db().await;
    let good_id = engine
        .new_good(
            GoodNewCmd::new("alice", "Tent", ListingKind::RentalOnly, at(1))
                .price_per_day(300)
                .rental_bounds(2, 7)
                .stock(1),
        )
        .await
        .unwrap();

    // One day is under the minimum.
    let err = engine
        .create_trade(
            TradeNewCmd::new(TradeKind::Rental, good_id, "bob", at(2)).dates(date(10), date(10)),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidTransition(_)));

    // Ten days is over the maximum.
    let err = engine
        .create_trade(
            TradeNewCmd::new(TradeKind::Rental, good_id, "bob", at(2)).dates(date(10), date(19)),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidTransition(_)));

    engine
        .create_trade(
            TradeNewCmd::new(TradeKind::Rental, good_id, "bob", at(2)).dates(date(10), date(14)),
        )
        .await
        .unwrap();
}
