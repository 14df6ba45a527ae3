use chrono::{DateTime, Duration, Utc};
use sea_orm::ActiveValue::Set;
use sea_orm::sea_query::{Expr, LockType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::orders::{CheckoutRequest, OrderList, OrderWithItems},
    entity::{
        addresses::Entity as Addresses,
        cart_items::{Column as CartItemCol, Entity as CartItems},
        carts::{Column as CartCol, Entity as Carts},
        order_items::{
            ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems,
            Model as OrderItemModel,
        },
        orders::{
            ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel,
        },
        products::{Column as ProdCol, Entity as Products},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{DeliveryAddress, Order, OrderItem, OrderStatus, PaymentStatus},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    state::AppState,
};

/// How long a pending order holds its stock reservation before the
/// expiration job returns it.
pub const PAYMENT_WINDOW_MINUTES: i64 = 30;

/// Convert a cart into a pending order: validate and reserve stock, snapshot
/// the delivery address and line items, and arm the expiration timer. The
/// cart itself is left intact; it drains only on successful payment, so a
/// retried checkout before expiry simply re-validates against the
/// already-decremented stock.
pub async fn checkout(
    state: &AppState,
    user: &AuthUser,
    payload: CheckoutRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let delivery_fee = payload.delivery_fee.unwrap_or(state.config.delivery_fee);
    if delivery_fee < 0 {
        return Err(AppError::BadRequest("delivery fee cannot be negative".into()));
    }

    let txn = state.orm.begin().await?;

    let address = Addresses::find_by_id(payload.address_id).one(&txn).await?;
    let address = match address {
        Some(a) if a.user_id == user.user_id => a,
        _ => return Err(AppError::BadRequest("delivery address not found".into())),
    };

    let cart = Carts::find()
        .filter(CartCol::UserId.eq(user.user_id))
        .one(&txn)
        .await?;
    let cart = match cart {
        Some(c) => c,
        None => return Err(AppError::EmptyCart),
    };

    let lines = CartItems::find()
        .filter(CartItemCol::CartId.eq(cart.id))
        .all(&txn)
        .await?;
    if lines.is_empty() {
        return Err(AppError::EmptyCart);
    }

    let mut subtotal: i64 = 0;
    let mut reserved = Vec::with_capacity(lines.len());
    for line in &lines {
        if line.quantity <= 0 {
            return Err(AppError::BadRequest("Cart has invalid quantity".into()));
        }
        let product = Products::find_by_id(line.product_id)
            .lock(LockType::Update)
            .one(&txn)
            .await?;
        let product = match product {
            Some(p) => p,
            None => return Err(AppError::ProductUnavailable(line.product_id.to_string())),
        };
        if !product.is_active {
            return Err(AppError::ProductUnavailable(product.name));
        }
        if product.stock < line.quantity {
            return Err(AppError::InsufficientStock(product.name));
        }
        subtotal += product.price * (line.quantity as i64);
        reserved.push((product, line.quantity));
    }

    let total_amount = subtotal + delivery_fee;
    let now = Utc::now();
    let expires_at = now + Duration::minutes(PAYMENT_WINDOW_MINUTES);
    let order_id = Uuid::new_v4();

    let order = OrderActive {
        id: Set(order_id),
        user_id: Set(user.user_id),
        recipient_name: Set(address.name.clone()),
        street: Set(address.street.clone()),
        city: Set(address.city.clone()),
        state: Set(address.state.clone()),
        phone: Set(address.phone.clone()),
        status: Set(OrderStatus::Pending),
        payment_status: Set(PaymentStatus::Pending),
        total_amount: Set(total_amount),
        payment_reference: Set(None),
        paid_at: Set(None),
        created_at: Set(now.into()),
        expires_at: Set(expires_at.into()),
        updated_at: Set(now.into()),
    }
    .insert(&txn)
    .await?;

    let mut order_items: Vec<OrderItem> = Vec::new();
    for (product, quantity) in &reserved {
        let item = OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(product.id),
            product_name: Set(product.name.clone()),
            product_price: Set(product.price),
            quantity: Set(*quantity),
            created_at: Set(now.into()),
        }
        .insert(&txn)
        .await?;
        order_items.push(order_item_from_entity(item));

        // reserve stock
        Products::update_many()
            .col_expr(ProdCol::Stock, Expr::col(ProdCol::Stock).sub(*quantity))
            .filter(ProdCol::Id.eq(product.id))
            .exec(&txn)
            .await?;
    }

    txn.commit().await?;

    schedule_expiration(state, order.id, expires_at);

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "checkout",
        Some("orders"),
        Some(serde_json::json!({ "order_id": order.id, "total_amount": total_amount })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Order created",
        OrderWithItems {
            order: order_from_entity(order),
            items: order_items,
        },
        Some(Meta::empty()),
    ))
}

/// Arm a one-shot timer that expires the order at `expires_at`. Paying the
/// order does not cancel the timer; the status guard in [`expire_order`]
/// turns the late firing into a no-op.
pub fn schedule_expiration(state: &AppState, order_id: Uuid, expires_at: DateTime<Utc>) {
    let state = state.clone();
    tokio::spawn(async move {
        if let Ok(delay) = (expires_at - Utc::now()).to_std() {
            tokio::time::sleep(delay).await;
        }
        match expire_order(&state, order_id).await {
            Ok(true) => tracing::info!(%order_id, "order expired, reservation released"),
            Ok(false) => {}
            Err(err) => tracing::error!(%order_id, error = %err, "order expiration failed"),
        }
    });
}

/// Compensating transaction for the checkout reservation. Returns stock for
/// every snapshot line and marks the order expired; a no-op when the order
/// already left `Pending`. Returns whether a transition happened.
pub async fn expire_order(state: &AppState, order_id: Uuid) -> AppResult<bool> {
    let txn = state.orm.begin().await?;

    let order = Orders::find_by_id(order_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?;
    let order = match order {
        Some(o) => o,
        None => {
            tracing::warn!(%order_id, "expiration fired for unknown order");
            return Ok(false);
        }
    };
    if order.status != OrderStatus::Pending {
        // Already paid, cancelled, or expired; duplicate or late firing.
        return Ok(false);
    }

    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .all(&txn)
        .await?;

    let user_id = order.user_id;
    let mut active: OrderActive = order.into();
    active.status = Set(OrderStatus::Expired);
    active.payment_status = Set(PaymentStatus::Failed);
    active.updated_at = Set(Utc::now().into());
    active.update(&txn).await?;

    // Roll back exactly what was reserved, from the immutable snapshots.
    for item in &items {
        Products::update_many()
            .col_expr(ProdCol::Stock, Expr::col(ProdCol::Stock).add(item.quantity))
            .filter(ProdCol::Id.eq(item.product_id))
            .exec(&txn)
            .await?;
    }

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user_id),
        "order_expired",
        Some("orders"),
        Some(serde_json::json!({ "order_id": order_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(true)
}

/// Re-arm expiration timers after a restart. In-process timers die with the
/// process; overdue orders fire immediately through the same guard.
pub async fn rearm_pending_orders(state: &AppState) -> AppResult<usize> {
    let pending = Orders::find()
        .filter(OrderCol::Status.eq(OrderStatus::Pending))
        .all(&state.orm)
        .await?;

    let count = pending.len();
    for order in pending {
        schedule_expiration(state, order.id, order.expires_at.with_timezone(&Utc));
    }
    if count > 0 {
        tracing::info!(count, "re-armed expiration timers for pending orders");
    }
    Ok(count)
}

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination.normalize();
    let mut condition = Condition::all().add(OrderCol::UserId.eq(user.user_id));
    if let Some(status) = query.status {
        condition = condition.add(OrderCol::Status.eq(status));
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

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let order = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::UserId.eq(user.user_id))
                .add(OrderCol::Id.eq(id)),
        )
        .one(&state.orm)
        .await?;
    let order = match order {
        Some(o) => o,
        None => return Err(AppError::OrderNotFound),
    };

    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_item_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "OK",
        OrderWithItems {
            order: order_from_entity(order),
            items,
        },
        Some(Meta::empty()),
    ))
}

pub fn order_from_entity(model: OrderModel) -> Order {
    Order {
        id: model.id,
        user_id: model.user_id,
        delivery_address: DeliveryAddress {
            name: model.recipient_name,
            street: model.street,
            city: model.city,
            state: model.state,
            phone: model.phone,
        },
        status: model.status,
        payment_status: model.payment_status,
        total_amount: model.total_amount,
        payment_reference: model.payment_reference,
        paid_at: model.paid_at.map(|dt| dt.with_timezone(&Utc)),
        created_at: model.created_at.with_timezone(&Utc),
        expires_at: model.expires_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

pub fn order_item_from_entity(model: OrderItemModel) -> OrderItem {
    OrderItem {
        id: model.id,
        order_id: model.order_id,
        product_id: model.product_id,
        product_name: model.product_name,
        product_price: model.product_price,
        quantity: model.quantity,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
