use axum_artisan_market::{
    db::{create_orm_conn, create_pool},
    dto::{
        orders::{PlaceOrderRequest, UpdateOrderStatusRequest},
        reviews::SubmitReviewRequest,
    },
    error::AppError,
    middleware::auth::AuthUser,
    services::{
        admin_service, favorite_service, follow_service, notification_service, order_service,
        review_service,
    },
    state::AppState,
};
use uuid::Uuid;

// DB-backed flow tests. They skip themselves when no database is
// configured, and every test creates its own users and products so the
// suite can run in parallel against one database.

async fn setup_state() -> anyhow::Result<Option<AppState>> {
    let database_url =
        match std::env::var("TEST_DATABASE_URL").or_else(|_| std::env::var("DATABASE_URL")) {
            Ok(url) => url,
            Err(_) => {
                eprintln!(
                    "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
                );
                return Ok(None);
            }
        };

    let pool = create_pool(&database_url).await?;
    let orm = create_orm_conn(&database_url).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(Some(AppState { pool, orm }))
}

async fn create_user(state: &AppState, role: &str) -> anyhow::Result<AuthUser> {
    let id = Uuid::new_v4();
    sqlx::query("INSERT INTO users (id, email, password_hash, role) VALUES ($1, $2, 'dummy', $3)")
        .bind(id)
        .bind(format!("{id}@example.com"))
        .bind(role)
        .execute(&state.pool)
        .await?;
    Ok(AuthUser {
        user_id: id,
        role: role.into(),
    })
}

async fn create_store(state: &AppState, owner: &AuthUser) -> anyhow::Result<Uuid> {
    let id = Uuid::new_v4();
    sqlx::query("INSERT INTO stores (id, owner_id, name, location) VALUES ($1, $2, 'Test Atelier', 'Lima')")
        .bind(id)
        .bind(owner.user_id)
        .execute(&state.pool)
        .await?;
    Ok(id)
}

async fn create_product(state: &AppState, store_id: Uuid, stock: i32) -> anyhow::Result<Uuid> {
    let id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO products (id, store_id, name, description, price, stock) VALUES ($1, $2, 'Clay mug', 'Hand-thrown', 45000, $3)",
    )
    .bind(id)
    .bind(store_id)
    .bind(stock)
    .execute(&state.pool)
    .await?;
    Ok(id)
}

async fn stock_of(state: &AppState, product_id: Uuid) -> anyhow::Result<i32> {
    let (stock,): (i32,) = sqlx::query_as("SELECT stock FROM products WHERE id = $1")
        .bind(product_id)
        .fetch_one(&state.pool)
        .await?;
    Ok(stock)
}

async fn notification_count(state: &AppState, user_id: Uuid, kind: &str) -> anyhow::Result<i64> {
    let (count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND kind = $2")
            .bind(user_id)
            .bind(kind)
            .fetch_one(&state.pool)
            .await?;
    Ok(count)
}

// The last unit goes to exactly one buyer; rejecting the order puts the
// unit back on the shelf and tells the buyer.
#[tokio::test]
async fn last_unit_order_and_rejection_flow() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let artisan = create_user(&state, "artisan").await?;
    let store_id = create_store(&state, &artisan).await?;
    let product_id = create_product(&state, store_id, 1).await?;
    let buyer_a = create_user(&state, "buyer").await?;
    let buyer_b = create_user(&state, "buyer").await?;

    let placed = order_service::place_order(&state, &buyer_a, PlaceOrderRequest { product_id })
        .await?
        .data
        .unwrap();
    assert_eq!(placed.status, "pending");
    assert_eq!(stock_of(&state, product_id).await?, 0);
    assert_eq!(notification_count(&state, artisan.user_id, "order").await?, 1);

    let err = order_service::place_order(&state, &buyer_b, PlaceOrderRequest { product_id })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::OutOfStock));
    assert_eq!(stock_of(&state, product_id).await?, 0);

    let (orders_b,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM orders WHERE buyer_id = $1")
            .bind(buyer_b.user_id)
            .fetch_one(&state.pool)
            .await?;
    assert_eq!(orders_b, 0, "failed placement must not insert an order");

    let rejected = order_service::set_order_status(
        &state,
        &artisan,
        placed.id,
        UpdateOrderStatusRequest {
            status: "rejected".into(),
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(rejected.status, "rejected");
    assert_eq!(stock_of(&state, product_id).await?, 1);
    assert_eq!(notification_count(&state, buyer_a.user_id, "order").await?, 1);

    Ok(())
}

#[tokio::test]
async fn cancel_restores_stock_and_terminal_states_refuse() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let artisan = create_user(&state, "artisan").await?;
    let store_id = create_store(&state, &artisan).await?;
    let product_id = create_product(&state, store_id, 2).await?;
    let buyer = create_user(&state, "buyer").await?;

    let placed = order_service::place_order(&state, &buyer, PlaceOrderRequest { product_id })
        .await?
        .data
        .unwrap();
    assert_eq!(stock_of(&state, product_id).await?, 1);

    let cancelled = order_service::cancel_order(&state, &buyer, placed.id)
        .await?
        .data
        .unwrap();
    assert_eq!(cancelled.status, "cancelled");
    assert_eq!(stock_of(&state, product_id).await?, 2);

    // Cancelled is terminal for both buyer and artisan actions.
    let err = order_service::cancel_order(&state, &buyer, placed.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidTransition));

    let err = order_service::set_order_status(
        &state,
        &artisan,
        placed.id,
        UpdateOrderStatusRequest {
            status: "completed".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::InvalidTransition));
    assert_eq!(stock_of(&state, product_id).await?, 2);

    Ok(())
}

#[tokio::test]
async fn completion_keeps_stock_and_checks_authority() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let artisan = create_user(&state, "artisan").await?;
    let store_id = create_store(&state, &artisan).await?;
    let product_id = create_product(&state, store_id, 5).await?;
    let buyer = create_user(&state, "buyer").await?;

    let placed = order_service::place_order(&state, &buyer, PlaceOrderRequest { product_id })
        .await?
        .data
        .unwrap();
    assert_eq!(stock_of(&state, product_id).await?, 4);

    // A different artisan has no authority over this order.
    let other_artisan = create_user(&state, "artisan").await?;
    create_store(&state, &other_artisan).await?;
    let err = order_service::set_order_status(
        &state,
        &other_artisan,
        placed.id,
        UpdateOrderStatusRequest {
            status: "completed".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    // Unknown status strings are refused before anything is touched.
    let err = order_service::set_order_status(
        &state,
        &artisan,
        placed.id,
        UpdateOrderStatusRequest {
            status: "shipped".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::InvalidStatus(_)));

    // Only the buyer may cancel.
    let stranger = create_user(&state, "buyer").await?;
    let err = order_service::cancel_order(&state, &stranger, placed.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    let completed = order_service::set_order_status(
        &state,
        &artisan,
        placed.id,
        UpdateOrderStatusRequest {
            status: "completed".into(),
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(completed.status, "completed");
    assert_eq!(stock_of(&state, product_id).await?, 4);
    assert_eq!(notification_count(&state, buyer.user_id, "order").await?, 1);

    Ok(())
}

#[tokio::test]
async fn self_purchase_and_self_review_are_refused() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let artisan = create_user(&state, "artisan").await?;
    let store_id = create_store(&state, &artisan).await?;
    let product_id = create_product(&state, store_id, 3).await?;

    let err = order_service::place_order(&state, &artisan, PlaceOrderRequest { product_id })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::SelfPurchase));
    assert_eq!(stock_of(&state, product_id).await?, 3);

    let err = review_service::submit_review(
        &state,
        &artisan,
        product_id,
        SubmitReviewRequest {
            rating: 5,
            comment: "great".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::SelfReview));

    Ok(())
}

#[tokio::test]
async fn review_gate_and_average_rating() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let artisan = create_user(&state, "artisan").await?;
    let store_id = create_store(&state, &artisan).await?;
    let product_id = create_product(&state, store_id, 3).await?;
    let buyer_a = create_user(&state, "buyer").await?;
    let buyer_b = create_user(&state, "buyer").await?;
    let admin = create_user(&state, "admin").await?;

    let err = review_service::submit_review(
        &state,
        &buyer_a,
        product_id,
        SubmitReviewRequest {
            rating: 6,
            comment: "".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let first = review_service::submit_review(
        &state,
        &buyer_a,
        product_id,
        SubmitReviewRequest {
            rating: 4,
            comment: "Lovely glaze".into(),
        },
    )
    .await?
    .data
    .unwrap();
    assert!(!first.approved);
    assert_eq!(notification_count(&state, artisan.user_id, "review").await?, 1);

    let err = review_service::submit_review(
        &state,
        &buyer_a,
        product_id,
        SubmitReviewRequest {
            rating: 5,
            comment: "second try".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::DuplicateReview));

    let (rows,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM reviews WHERE product_id = $1 AND author_id = $2",
    )
    .bind(product_id)
    .bind(buyer_a.user_id)
    .fetch_one(&state.pool)
    .await?;
    assert_eq!(rows, 1);

    let second = review_service::submit_review(
        &state,
        &buyer_b,
        product_id,
        SubmitReviewRequest {
            rating: 5,
            comment: "Perfect".into(),
        },
    )
    .await?
    .data
    .unwrap();

    // Unapproved reviews do not count toward the public rating.
    let rating = review_service::product_rating(&state, product_id).await?;
    assert_eq!(rating.average, 0.0);
    assert_eq!(rating.count, 0);

    admin_service::approve_review(&state, &admin, first.id).await?;
    admin_service::approve_review(&state, &admin, second.id).await?;

    let rating = review_service::product_rating(&state, product_id).await?;
    assert_eq!(rating.average, 4.5);
    assert_eq!(rating.count, 2);

    admin_service::hide_review(&state, &admin, second.id).await?;
    let rating = review_service::product_rating(&state, product_id).await?;
    assert_eq!(rating.average, 4.0);
    assert_eq!(rating.count, 1);

    Ok(())
}

#[tokio::test]
async fn follows_favorites_and_notification_read_flow() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let artisan = create_user(&state, "artisan").await?;
    let store_id = create_store(&state, &artisan).await?;
    let product_id = create_product(&state, store_id, 3).await?;
    let buyer = create_user(&state, "buyer").await?;

    let followed = follow_service::toggle_follow(&state.pool, &buyer, store_id)
        .await?
        .data
        .unwrap();
    assert!(followed.following);
    assert_eq!(notification_count(&state, artisan.user_id, "follow").await?, 1);

    // Unfollowing is silent.
    let unfollowed = follow_service::toggle_follow(&state.pool, &buyer, store_id)
        .await?
        .data
        .unwrap();
    assert!(!unfollowed.following);
    assert_eq!(notification_count(&state, artisan.user_id, "follow").await?, 1);

    let added = favorite_service::toggle_favorite(&state.pool, &buyer, product_id)
        .await?
        .data
        .unwrap();
    assert!(added.added);
    let removed = favorite_service::toggle_favorite(&state.pool, &buyer, product_id)
        .await?
        .data
        .unwrap();
    assert!(!removed.added);

    // Viewing the list marks everything read.
    order_service::place_order(&state, &buyer, PlaceOrderRequest { product_id }).await?;
    let listed = notification_service::list_notifications(&state.pool, &artisan)
        .await?
        .data
        .unwrap();
    assert!(!listed.items.is_empty());

    let (unread,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND NOT is_read",
    )
    .bind(artisan.user_id)
    .fetch_one(&state.pool)
    .await?;
    assert_eq!(unread, 0);

    Ok(())
}
