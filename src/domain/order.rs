use uuid::Uuid;

use crate::{
    domain::{
        actor::ActorContext,
        lifecycle::Lifecycle,
        notice::{NoticeDraft, NoticeKind},
    },
    error::AppError,
};

/// Order lifecycle. `Pending` is the only state with outgoing transitions;
/// the other three are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    Pending,
    Completed,
    Cancelled,
    Rejected,
}

impl OrderStatus {
    pub fn parse(value: &str) -> Result<OrderStatus, AppError> {
        match value {
            "pending" => Ok(OrderStatus::Pending),
            "completed" => Ok(OrderStatus::Completed),
            "cancelled" => Ok(OrderStatus::Cancelled),
            "rejected" => Ok(OrderStatus::Rejected),
            other => Err(AppError::InvalidStatus(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Rejected => "rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, OrderStatus::Pending)
    }
}

/// The product fields a transition decision needs.
#[derive(Debug, Clone)]
pub struct ProductFacts {
    pub id: Uuid,
    pub name: String,
    pub store_id: Uuid,
    pub owner_id: Uuid,
    pub stock: i32,
    pub lifecycle: Lifecycle,
}

/// The order fields a transition decision needs.
#[derive(Debug, Clone)]
pub struct OrderFacts {
    pub id: Uuid,
    pub buyer_id: Uuid,
    pub quantity: i32,
    pub status: OrderStatus,
}

/// Everything the caller must apply for a transition to take effect. The
/// stock delta and the status write belong to one transaction; the notices
/// are persisted best-effort after it commits.
#[derive(Debug, Clone)]
pub struct Transition {
    pub next: OrderStatus,
    pub stock_delta: i32,
    pub notices: Vec<NoticeDraft>,
}

/// A buyer places an order for `quantity` units.
pub fn place(
    actor: &ActorContext,
    product: &ProductFacts,
    quantity: i32,
) -> Result<Transition, AppError> {
    if !product.lifecycle.is_active() {
        return Err(AppError::NotFound);
    }
    if actor.user_id == product.owner_id || actor.owns_store(product.store_id) {
        return Err(AppError::SelfPurchase);
    }
    if product.stock < quantity {
        return Err(AppError::OutOfStock);
    }

    let notice = NoticeDraft::new(
        product.owner_id,
        NoticeKind::Order,
        format!("New order for '{}'", product.name),
    )
    .with_link(format!("/products/{}", product.id));

    Ok(Transition {
        next: OrderStatus::Pending,
        stock_delta: -quantity,
        notices: addressed_to(actor, notice),
    })
}

/// The buyer cancels their own pending order.
pub fn cancel(
    actor: &ActorContext,
    order: &OrderFacts,
    product: &ProductFacts,
) -> Result<Transition, AppError> {
    if order.buyer_id != actor.user_id {
        return Err(AppError::Forbidden);
    }
    if order.status != OrderStatus::Pending {
        return Err(AppError::InvalidTransition);
    }

    let notice = NoticeDraft::new(
        product.owner_id,
        NoticeKind::Order,
        format!("Order for '{}' was cancelled by the buyer", product.name),
    )
    .with_link(format!("/orders/{}", order.id));

    Ok(Transition {
        next: OrderStatus::Cancelled,
        stock_delta: order.quantity,
        notices: addressed_to(actor, notice),
    })
}

/// The owning artisan resolves a pending order to `Completed` or `Rejected`.
pub fn resolve(
    actor: &ActorContext,
    order: &OrderFacts,
    product: &ProductFacts,
    target: OrderStatus,
) -> Result<Transition, AppError> {
    if !actor.owns_store(product.store_id) {
        return Err(AppError::Forbidden);
    }
    if order.status != OrderStatus::Pending {
        return Err(AppError::InvalidTransition);
    }

    let (stock_delta, message) = match target {
        OrderStatus::Rejected => (
            order.quantity,
            format!("Your order for '{}' was rejected", product.name),
        ),
        OrderStatus::Completed => (
            0,
            format!("Your order for '{}' was completed", product.name),
        ),
        _ => return Err(AppError::InvalidTransition),
    };

    let notice = NoticeDraft::new(order.buyer_id, NoticeKind::Order, message)
        .with_link(format!("/orders/{}", order.id));

    Ok(Transition {
        next: target,
        stock_delta,
        notices: addressed_to(actor, notice),
    })
}

// A transition never notifies the actor about their own action. The guards
// above already rule the overlap out for placements; this is the emitter's
// own check.
fn addressed_to(actor: &ActorContext, notice: NoticeDraft) -> Vec<NoticeDraft> {
    if notice.recipient == actor.user_id {
        Vec::new()
    } else {
        vec![notice]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::actor::Role;

    fn buyer() -> ActorContext {
        ActorContext {
            user_id: Uuid::new_v4(),
            role: Role::Buyer,
            store_id: None,
        }
    }

    fn artisan(store_id: Uuid) -> ActorContext {
        ActorContext {
            user_id: Uuid::new_v4(),
            role: Role::Artisan,
            store_id: Some(store_id),
        }
    }

    fn product(owner: &ActorContext, stock: i32) -> ProductFacts {
        ProductFacts {
            id: Uuid::new_v4(),
            name: "Clay mug".into(),
            store_id: owner.store_id.unwrap(),
            owner_id: owner.user_id,
            stock,
            lifecycle: Lifecycle::Active,
        }
    }

    fn pending_order(buyer: &ActorContext) -> OrderFacts {
        OrderFacts {
            id: Uuid::new_v4(),
            buyer_id: buyer.user_id,
            quantity: 1,
            status: OrderStatus::Pending,
        }
    }

    #[test]
    fn place_decrements_stock_and_notifies_owner() {
        let owner = artisan(Uuid::new_v4());
        let actor = buyer();
        let product = product(&owner, 3);

        let t = place(&actor, &product, 1).unwrap();
        assert_eq!(t.next, OrderStatus::Pending);
        assert_eq!(t.stock_delta, -1);
        assert_eq!(t.notices.len(), 1);
        assert_eq!(t.notices[0].recipient, owner.user_id);
        assert_eq!(t.notices[0].kind, NoticeKind::Order);
    }

    #[test]
    fn place_fails_when_out_of_stock() {
        let owner = artisan(Uuid::new_v4());
        let product = product(&owner, 0);
        let result = place(&buyer(), &product, 1);
        assert!(matches!(result, Err(AppError::OutOfStock)));
    }

    #[test]
    fn place_rejects_owner_of_the_store() {
        let owner = artisan(Uuid::new_v4());
        let product = product(&owner, 5);
        let result = place(&owner, &product, 1);
        assert!(matches!(result, Err(AppError::SelfPurchase)));
    }

    #[test]
    fn place_hides_inactive_products() {
        let owner = artisan(Uuid::new_v4());
        let mut product = product(&owner, 5);
        product.lifecycle = Lifecycle::Hidden;
        let result = place(&buyer(), &product, 1);
        assert!(matches!(result, Err(AppError::NotFound)));
    }

    #[test]
    fn cancel_restores_stock_and_notifies_owner() {
        let owner = artisan(Uuid::new_v4());
        let actor = buyer();
        let product = product(&owner, 0);
        let order = pending_order(&actor);

        let t = cancel(&actor, &order, &product).unwrap();
        assert_eq!(t.next, OrderStatus::Cancelled);
        assert_eq!(t.stock_delta, 1);
        assert_eq!(t.notices[0].recipient, owner.user_id);
    }

    #[test]
    fn cancel_is_only_valid_from_pending() {
        let owner = artisan(Uuid::new_v4());
        let actor = buyer();
        let product = product(&owner, 0);

        for status in [
            OrderStatus::Completed,
            OrderStatus::Cancelled,
            OrderStatus::Rejected,
        ] {
            let mut order = pending_order(&actor);
            order.status = status;
            let result = cancel(&actor, &order, &product);
            assert!(matches!(result, Err(AppError::InvalidTransition)));
        }
    }

    #[test]
    fn cancel_requires_the_buyer() {
        let owner = artisan(Uuid::new_v4());
        let actor = buyer();
        let product = product(&owner, 0);
        let order = pending_order(&actor);

        let stranger = buyer();
        let result = cancel(&stranger, &order, &product);
        assert!(matches!(result, Err(AppError::Forbidden)));
    }

    #[test]
    fn reject_restores_stock_and_notifies_buyer() {
        let owner = artisan(Uuid::new_v4());
        let actor = buyer();
        let product = product(&owner, 0);
        let order = pending_order(&actor);

        let t = resolve(&owner, &order, &product, OrderStatus::Rejected).unwrap();
        assert_eq!(t.next, OrderStatus::Rejected);
        assert_eq!(t.stock_delta, 1);
        assert_eq!(t.notices[0].recipient, actor.user_id);
    }

    #[test]
    fn complete_leaves_stock_untouched() {
        let owner = artisan(Uuid::new_v4());
        let actor = buyer();
        let product = product(&owner, 0);
        let order = pending_order(&actor);

        let t = resolve(&owner, &order, &product, OrderStatus::Completed).unwrap();
        assert_eq!(t.next, OrderStatus::Completed);
        assert_eq!(t.stock_delta, 0);
    }

    #[test]
    fn resolve_requires_the_owning_artisan() {
        let owner = artisan(Uuid::new_v4());
        let other = artisan(Uuid::new_v4());
        let actor = buyer();
        let product = product(&owner, 0);
        let order = pending_order(&actor);

        let result = resolve(&other, &order, &product, OrderStatus::Completed);
        assert!(matches!(result, Err(AppError::Forbidden)));
    }

    #[test]
    fn resolve_only_reaches_completed_or_rejected() {
        let owner = artisan(Uuid::new_v4());
        let actor = buyer();
        let product = product(&owner, 0);
        let order = pending_order(&actor);

        let result = resolve(&owner, &order, &product, OrderStatus::Pending);
        assert!(matches!(result, Err(AppError::InvalidTransition)));
    }

    #[test]
    fn notice_to_the_actor_is_suppressed() {
        let owner = artisan(Uuid::new_v4());
        let actor = buyer();
        let product = product(&owner, 0);
        // An order the artisan somehow holds on their own product: the
        // resolution notice would address the actor and must be dropped.
        let mut order = pending_order(&actor);
        order.buyer_id = owner.user_id;

        let t = resolve(&owner, &order, &product, OrderStatus::Completed).unwrap();
        assert!(t.notices.is_empty());
    }

    #[test]
    fn unknown_status_strings_are_rejected() {
        let result = OrderStatus::parse("shipped");
        assert!(matches!(result, Err(AppError::InvalidStatus(_))));
        assert_eq!(OrderStatus::parse("pending").unwrap(), OrderStatus::Pending);
    }

    #[test]
    fn only_pending_is_non_terminal() {
        assert!(!OrderStatus::Pending.is_terminal());
        assert!(OrderStatus::Completed.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(OrderStatus::Rejected.is_terminal());
    }
}
