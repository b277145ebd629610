use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};
use uuid::Uuid;

use engine::{
    Engine, EngineError, GoodNewCmd, ListingKind, TradeAction, TradeKind, TradeListCmd,
    TradeNewCmd, TradeRef, TradeSide, TransitionCmd,
};
use migration::MigratorTrait;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let backend = db.get_database_backend();
    for (username, display_name, address) in [
        ("alice", "Alice A.", "1 Owner St"),
        ("bob", "Bob B.", "2 Renter Rd"),
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

async fn rental_between(engine: &Engine, good_id: Uuid, day: u32) -> TradeRef {
    let id = engine
        .create_trade(
            TradeNewCmd::new(TradeKind::Rental, good_id, "bob", at(day))
                .quantity(1)
                .dates(date(10), date(19)),
        )
        .await
        .unwrap();
    TradeRef::new(TradeKind::Rental, id)
}

#[tokio::test]
async fn creation_binds_exactly_one_channel() {
    let (engine, _db) = engine_with_db().await;
    let good_id = camera(&engine, 5).await;

    let trade = rental_between(&engine, good_id, 2).await;
    let channel = engine.channel_for(trade).await.unwrap();
    assert_eq!(channel.trade, Some(trade));

    // Later transitions keep the same binding.
    engine
        .transition(TransitionCmd::new(trade, TradeAction::Approve, "alice", at(3)))
        .await
        .unwrap();
    let rebound = engine.channel_for(trade).await.unwrap();
    assert_eq!(rebound.id, channel.id);
}

#[tokio::test]
async fn pre_transaction_channel_is_promoted_not_duplicated() {
    let (engine, _db) = engine_with_db().await;
    let good_id = camera(&engine, 5).await;

    // The pair talked about the good before any request. Opening the
    // discussion twice still yields one channel.
    let pre = engine
        .open_channel(good_id, "bob", "alice", at(1))
        .await
        .unwrap();
    let again = engine
        .open_channel(good_id, "alice", "bob", at(1))
        .await
        .unwrap();
    assert_eq!(pre, again);

    let trade = rental_between(&engine, good_id, 2).await;
    let channel = engine.channel_for(trade).await.unwrap();
    assert_eq!(channel.id, pre);

    // The next trade between the same pair gets a fresh channel; the old
    // one is already consumed.
    let second = rental_between(&engine, good_id, 3).await;
    let second_channel = engine.channel_for(second).await.unwrap();
    assert_ne!(second_channel.id, pre);
}

#[tokio::test]
async fn transitions_notify_the_counterpart() {
    let (engine, _db) = engine_with_db().await;
    let good_id = camera(&engine, 5).await;

    let trade = rental_between(&engine, good_id, 2).await;
    // The owner hears about the request.
    let for_alice = engine.notifications("alice", true).await.unwrap();
    assert_eq!(for_alice.len(), 1);
    assert_eq!(for_alice[0].trade, Some(trade));

    engine
        .transition(TransitionCmd::new(trade, TradeAction::Approve, "alice", at(3)))
        .await
        .unwrap();
    let for_bob = engine.notifications("bob", true).await.unwrap();
    assert_eq!(for_bob.len(), 1);
    assert_eq!(for_bob[0].kind, "rental_approved");

    // Acknowledging clears the unread view but keeps the record.
    engine
        .mark_notification_read("bob", for_bob[0].id, at(4))
        .await
        .unwrap();
    assert!(engine.notifications("bob", true).await.unwrap().is_empty());
    assert_eq!(engine.notifications("bob", false).await.unwrap().len(), 1);

    // Nobody reads someone else's mail.
    let err = engine
        .mark_notification_read("alice", for_bob[0].id, at(4))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));
}

#[tokio::test]
async fn notification_failure_never_fails_the_transition() {
    let (engine, db) = engine_with_db().await;
    let good_id = camera(&engine, 5).await;
    let trade = rental_between(&engine, good_id, 2).await;

    // The renter's account disappears between request and approval; the
    // approval must still commit.
    let backend = db.get_database_backend();
    db.execute(Statement::from_sql_and_values(
        backend,
        "DELETE FROM users WHERE username = ?",
        vec!["bob".into()],
    ))
    .await
    .unwrap();

    engine
        .transition(TransitionCmd::new(trade, TradeAction::Approve, "alice", at(3)))
        .await
        .unwrap();
    let view = engine.trade(trade, "alice").await.unwrap();
    assert_eq!(view.status, "approved");
}

#[tokio::test]
async fn hide_is_per_party_and_terminal_only() {
    let (engine, _db) = engine_with_db().await;
    let good_id = camera(&engine, 5).await;
    let trade = rental_between(&engine, good_id, 2).await;

    // Not settled yet.
    let err = engine
        .transition(TransitionCmd::new(trade, TradeAction::Hide, "bob", at(3)))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidTransition(_)));

    engine
        .transition(TransitionCmd::new(trade, TradeAction::Cancel, "bob", at(3)))
        .await
        .unwrap();
    engine
        .transition(TransitionCmd::new(trade, TradeAction::Hide, "bob", at(4)))
        .await
        .unwrap();

    // Hidden for bob, still visible for alice.
    let mine = engine
        .list_trades(TradeListCmd::new("bob", TradeSide::Mine))
        .await
        .unwrap();
    assert!(mine.iter().all(|t| t.id != trade.id));
    let received = engine
        .list_trades(TradeListCmd::new("alice", TradeSide::Received))
        .await
        .unwrap();
    assert!(received.iter().any(|t| t.id == trade.id));

    // The record survives; it is only filtered.
    let all_mine = engine
        .list_trades(TradeListCmd::new("bob", TradeSide::Mine).include_hidden())
        .await
        .unwrap();
    assert!(all_mine.iter().any(|t| t.id == trade.id));
}

#[tokio::test]
async fn listings_split_by_side_and_status() {
    let (engine, _db) = engine_with_db().await;
    let good_id = camera(&engine, 5).await;

    let first = rental_between(&engine, good_id, 2).await;
    let second = rental_between(&engine, good_id, 3).await;
    engine
        .transition(TransitionCmd::new(first, TradeAction::Approve, "alice", at(4)))
        .await
        .unwrap();

    let mine = engine
        .list_trades(TradeListCmd::new("bob", TradeSide::Mine))
        .await
        .unwrap();
    assert_eq!(mine.len(), 2);
    // Newest first.
    assert_eq!(mine[0].id, second.id);

    let approved = engine
        .list_trades(TradeListCmd::new("alice", TradeSide::Received).status("approved"))
        .await
        .unwrap();
    assert_eq!(approved.len(), 1);
    assert_eq!(approved[0].id, first.id);

    // The owner side of someone else's request is empty.
    let bobs_received = engine
        .list_trades(TradeListCmd::new("bob", TradeSide::Received))
        .await
        .unwrap();
    assert!(bobs_received.is_empty());
}

#[tokio::test]
async fn outsiders_cannot_read_trades() {
    let (engine, db) = engine_with_db().await;
    let backend = db.get_database_backend();
    db.execute(Statement::from_sql_and_values(
        backend,
        "INSERT INTO users (username, password) VALUES (?, ?)",
        vec!["carol".into(), "password".into()],
    ))
    .await
    .unwrap();

    let good_id = camera(&engine, 5).await;
    let trade = rental_between(&engine, good_id, 2).await;

    let err = engine.trade(trade, "carol").await.unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));
    let err = engine.shipments_for(trade, "carol").await.unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));
}
