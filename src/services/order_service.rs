use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, JoinType,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    domain::{
        actor::ActorContext,
        lifecycle::Lifecycle,
        order::{self, OrderFacts, OrderStatus, ProductFacts},
    },
    dto::orders::{OrderList, PlaceOrderRequest, UpdateOrderStatusRequest},
    entity::{
        orders::{
            ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel,
        },
        products::{Column as ProdCol, Entity as Products, Model as ProductModel},
        stores::Entity as Stores,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Order,
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    services::{actor_service, notification_service},
    state::AppState,
};

/// Place a single-unit order. The stock decrement and the order insert
/// share one transaction; the decrement is a guarded single-statement
/// update, so of two buyers racing for the last unit exactly one succeeds
/// and the other observes `OutOfStock`.
pub async fn place_order(
    state: &AppState,
    user: &AuthUser,
    payload: PlaceOrderRequest,
) -> AppResult<ApiResponse<Order>> {
    let actor = actor_service::resolve(state, user).await?;
    let quantity = 1;

    let txn = state.orm.begin().await?;

    let product = Products::find_by_id(payload.product_id).one(&txn).await?;
    let product = match product {
        Some(p) => p,
        None => return Err(AppError::NotFound),
    };
    let facts = product_facts(&txn, &product).await?;

    let transition = order::place(&actor, &facts, quantity)?;

    apply_stock_delta(&txn, product.id, transition.stock_delta).await?;

    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        product_id: Set(product.id),
        buyer_id: Set(actor.user_id),
        quantity: Set(quantity),
        status: Set(transition.next.as_str().to_owned()),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    notification_service::emit_all(&state.pool, &transition.notices).await;

    if let Err(err) = log_audit(
        &state.pool,
        Some(actor.user_id),
        "order_place",
        Some("orders"),
        Some(serde_json::json!({ "order_id": order.id, "product_id": product.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Order placed",
        order_from_entity(order),
        Some(Meta::empty()),
    ))
}

/// Buyer-side cancellation of a pending order.
pub async fn cancel_order(state: &AppState, user: &AuthUser, id: Uuid) -> AppResult<ApiResponse<Order>> {
    let actor = actor_service::resolve(state, user).await?;
    apply_transition(state, &actor, id, "order_cancel", order::cancel).await
}

/// Artisan-side resolution of a pending order to `completed` or `rejected`.
pub async fn set_order_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<Order>> {
    let actor = actor_service::resolve(state, user).await?;
    let target = OrderStatus::parse(&payload.status)?;
    apply_transition(
        state,
        &actor,
        id,
        "order_status_update",
        move |actor_ctx, order, product| order::resolve(actor_ctx, order, product, target),
    )
    .await
}

/// The buyer's own order history, newest first.
pub async fn list_my_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination.normalize();
    let mut condition = Condition::all().add(OrderCol::BuyerId.eq(user.user_id));
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(OrderCol::Status.eq(status.clone()));
    }

    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);
    let mut finder = Orders::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;
    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Ok",
        OrderList { items: orders },
        Some(meta),
    ))
}

/// Incoming orders for the artisan's store.
pub async fn list_store_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let actor = actor_service::resolve(state, user).await?;
    let store_id = match actor.store_id {
        Some(id) => id,
        None => return Err(AppError::Forbidden),
    };

    let (page, limit, offset) = query.pagination.normalize();
    let mut condition = Condition::all().add(ProdCol::StoreId.eq(store_id));
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(OrderCol::Status.eq(status.clone()));
    }

    let finder = Orders::find()
        .join(
            JoinType::InnerJoin,
            crate::entity::orders::Relation::Products.def(),
        )
        .filter(condition)
        .order_by_desc(OrderCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;
    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Ok",
        OrderList { items: orders },
        Some(meta),
    ))
}

// Shared application of a cancel/resolve transition: load facts, decide in
// the pure state machine, then flip the status and adjust stock in one
// transaction. The status flip is guarded on the row still being pending,
// so a concurrent transition cannot apply twice.
async fn apply_transition<F>(
    state: &AppState,
    actor: &ActorContext,
    order_id: Uuid,
    audit_action: &str,
    decide: F,
) -> AppResult<ApiResponse<Order>>
where
    F: FnOnce(&ActorContext, &OrderFacts, &ProductFacts) -> Result<order::Transition, AppError>,
{
    let txn = state.orm.begin().await?;

    let order = Orders::find_by_id(order_id).one(&txn).await?;
    let order = match order {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };
    let product = Products::find_by_id(order.product_id).one(&txn).await?;
    let product = match product {
        Some(p) => p,
        None => return Err(AppError::NotFound),
    };

    let facts = product_facts(&txn, &product).await?;
    let order_facts = order_facts(&order)?;

    let transition = decide(actor, &order_facts, &facts)?;

    let result = Orders::update_many()
        .col_expr(OrderCol::Status, Expr::value(transition.next.as_str()))
        .col_expr(OrderCol::UpdatedAt, Expr::value(Utc::now()))
        .filter(OrderCol::Id.eq(order.id))
        .filter(OrderCol::Status.eq(OrderStatus::Pending.as_str()))
        .exec(&txn)
        .await?;
    if result.rows_affected == 0 {
        return Err(AppError::InvalidTransition);
    }

    apply_stock_delta(&txn, product.id, transition.stock_delta).await?;

    let updated = Orders::find_by_id(order.id).one(&txn).await?;
    let updated = match updated {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    txn.commit().await?;

    notification_service::emit_all(&state.pool, &transition.notices).await;

    if let Err(err) = log_audit(
        &state.pool,
        Some(actor.user_id),
        audit_action,
        Some("orders"),
        Some(serde_json::json!({ "order_id": updated.id, "status": updated.status })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Order updated",
        order_from_entity(updated),
        Some(Meta::empty()),
    ))
}

/// Single-statement read-modify-write on the stock counter. For a
/// decrement the predicate requires enough stock, which keeps the counter
/// non-negative and makes the database the arbiter of concurrent orders.
async fn apply_stock_delta<C: ConnectionTrait>(
    conn: &C,
    product_id: Uuid,
    delta: i32,
) -> AppResult<()> {
    if delta == 0 {
        return Ok(());
    }

    let mut update = Products::update_many()
        .col_expr(ProdCol::Stock, Expr::col(ProdCol::Stock).add(delta))
        .filter(ProdCol::Id.eq(product_id));
    if delta < 0 {
        update = update.filter(ProdCol::Stock.gte(-delta));
    }

    let result = update.exec(conn).await?;
    if result.rows_affected == 0 {
        return Err(AppError::OutOfStock);
    }
    Ok(())
}

pub(crate) async fn product_facts<C: ConnectionTrait>(
    conn: &C,
    product: &ProductModel,
) -> AppResult<ProductFacts> {
    let store = Stores::find_by_id(product.store_id).one(conn).await?;
    let store = match store {
        Some(s) => s,
        None => return Err(AppError::NotFound),
    };

    Ok(ProductFacts {
        id: product.id,
        name: product.name.clone(),
        store_id: store.id,
        owner_id: store.owner_id,
        stock: product.stock,
        // An unknown tag behaves like a hidden listing.
        lifecycle: Lifecycle::parse(&product.lifecycle).unwrap_or(Lifecycle::Hidden),
    })
}

fn order_facts(order: &OrderModel) -> AppResult<OrderFacts> {
    Ok(OrderFacts {
        id: order.id,
        buyer_id: order.buyer_id,
        quantity: order.quantity,
        status: OrderStatus::parse(&order.status)?,
    })
}

pub(crate) fn order_from_entity(model: OrderModel) -> Order {
    Order {
        id: model.id,
        product_id: model.product_id,
        buyer_id: model.buyer_id,
        quantity: model.quantity,
        status: model.status,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}
