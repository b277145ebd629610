use axum::{
    Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Basic},
};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

use std::sync::Arc;

use crate::{channels, goods, notifications, trades};
use engine::{Engine, users};

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub db: DatabaseConnection,
}

async fn auth(
    auth_header: TypedHeader<Authorization<Basic>>,
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    if auth_header.username().is_empty() || auth_header.password().is_empty() {
        return Err(StatusCode::UNAUTHORIZED);
    }

    let user: Option<users::Model> = users::Entity::find()
        .filter(users::Column::Username.eq(auth_header.username()))
        .filter(users::Column::Password.eq(auth_header.password()))
        .one(&state.db)
        .await
        .map_err(|_| StatusCode::UNAUTHORIZED)?;

    let Some(user) = user else {
        return Err(StatusCode::UNAUTHORIZED);
    };

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

fn router(state: ServerState) -> Router {
    Router::new()
        .route("/goods", post(goods::create))
        .route("/goods/{id}", get(goods::get))
        .route("/goods/{id}/archive", post(goods::archive))
        .route("/trades", post(trades::create).get(trades::list))
        .route("/trades/{kind}/{id}", get(trades::get))
        .route("/trades/{kind}/{id}/transition", post(trades::transition))
        .route("/trades/{kind}/{id}/shipments", get(trades::shipments))
        .route("/trades/{kind}/{id}/channel", get(channels::get))
        .route("/trades/{kind}/{id}/buyout", post(trades::buyout))
        .route("/trades/{kind}/{id}/buyout_quote", get(trades::buyout_quote))
        .route("/channels", post(channels::open))
        .route("/notifications", get(notifications::list))
        .route(
            "/notifications/{id}/read",
            post(notifications::mark_read),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), auth))
        .with_state(state)
}

pub async fn run(engine: Engine, db: DatabaseConnection) {
    let listener = match tokio::net::TcpListener::bind("127.0.0.1:3000").await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(engine, db, listener).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    engine: Engine,
    db: DatabaseConnection,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    let state = ServerState {
        engine: Arc::new(engine),
        db,
    };

    axum::serve(listener, router(state)).await
}

pub fn spawn_with_listener(
    engine: Engine,
    db: DatabaseConnection,
    listener: tokio::net::TcpListener,
) -> Result<std::net::SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(engine, db, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, header};
    use base64::Engine as _;
    use http_body_util::BodyExt;
    use migration::MigratorTrait;
    use sea_orm::{ConnectionTrait, Statement};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    async fn test_router() -> Router {
        let db = sea_orm::Database::connect("sqlite::memory:").await.unwrap();
        migration::Migrator::up(&db, None).await.unwrap();
        let backend = db.get_database_backend();
        for username in ["alice", "bob"] {
            db.execute(Statement::from_sql_and_values(
                backend,
                "INSERT INTO users (username, password, display_name, phone, address) \
                 VALUES (?, ?, ?, ?, ?)",
                vec![
                    username.into(),
                    "password".into(),
                    username.into(),
                    "090-0000-0000".into(),
                    "somewhere".into(),
                ],
            ))
            .await
            .unwrap();
        }

        let engine = Engine::builder().database(db.clone()).build();
        router(ServerState {
            engine: Arc::new(engine),
            db,
        })
    }

    fn basic(username: &str) -> String {
        format!(
            "Basic {}",
            base64::engine::general_purpose::STANDARD.encode(format!("{username}:password"))
        )
    }

    async fn send(router: &Router, username: &str, method: &str, uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, basic(username))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    #[tokio::test]
    async fn unauthenticated_requests_are_rejected() {
        let router = test_router().await;
        let request = Request::builder()
            .method("GET")
            .uri("/notifications")
            .body(Body::empty())
            .unwrap();
        let response = router.oneshot(request).await.unwrap();
        // Missing Authorization fails the typed-header extraction.
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn rental_roundtrip_over_http() {
        let router = test_router().await;

        let (status, body) = send(
            &router,
            "alice",
            "POST",
            "/goods",
            json!({
                "title": "Camera",
                "listing": "both",
                "price_per_day": 500,
                "price_buy": 10000,
                "stock_quantity": 5
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let good_id = body["id"].as_str().unwrap().to_string();

        let (status, body) = send(
            &router,
            "bob",
            "POST",
            "/trades",
            json!({
                "kind": "rental",
                "good_id": good_id,
                "quantity": 2,
                "start_date": "2026-03-10",
                "end_date": "2026-03-19",
                "payment_method": "card"
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let trade_id = body["id"].as_str().unwrap().to_string();

        // The owner approves; the renter may not.
        let (status, _) = send(
            &router,
            "bob",
            "POST",
            &format!("/trades/rental/{trade_id}/transition"),
            json!({"action": "approve"}),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = send(
            &router,
            "alice",
            "POST",
            &format!("/trades/rental/{trade_id}/transition"),
            json!({"action": "approve"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "approved");

        // Shipping without a tracking number is refused.
        let (status, _) = send(
            &router,
            "alice",
            "POST",
            &format!("/trades/rental/{trade_id}/transition"),
            json!({"action": "ship"}),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, body) = send(
            &router,
            "alice",
            "POST",
            &format!("/trades/rental/{trade_id}/transition"),
            json!({"action": "ship", "tracking_number": "ABC123"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "shipped");

        let (status, body) = send(
            &router,
            "bob",
            "GET",
            &format!("/trades/rental/{trade_id}/shipments"),
            Value::Null,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["shipments"][0]["tracking_number"], "ABC123");

        // The approval left a notification for bob.
        let (status, body) = send(&router, "bob", "GET", "/notifications", Value::Null).await;
        assert_eq!(status, StatusCode::OK);
        assert!(
            body["notifications"]
                .as_array()
                .unwrap()
                .iter()
                .any(|n| n["kind"] == "rental_approved")
        );

        // Reservation is visible on the good.
        let (status, body) = send(
            &router,
            "bob",
            "GET",
            &format!("/goods/{good_id}"),
            Value::Null,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["available_quantity"], 3);
    }

    #[tokio::test]
    async fn unknown_trade_maps_to_404() {
        let router = test_router().await;
        let (status, _) = send(
            &router,
            "alice",
            "GET",
            &format!("/trades/rental/{}", uuid::Uuid::new_v4()),
            Value::Null,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
