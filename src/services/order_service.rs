use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use sea_orm::sea_query::LockType;
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::orders::{CheckoutRequest, CustomerInfo, OrderList, OrderWithItems},
    entity::{
        cart_items::{Column as CartCol, Entity as CartItems},
        order_items::{
            ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems,
        },
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders},
        products::Entity as Products,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{ChangeKind, Order, OrderItem, OrderStatus},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    services::inventory_service,
    state::AppState,
};

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination.normalize();
    let mut condition = Condition::all().add(OrderCol::UserId.eq(user.user_id));
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
        .map(Order::from)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Ok",
        OrderList { items: orders },
        Some(meta),
    ))
}

/// Create an order from the submitted lines. Stock checks, the stock
/// decrement and the `out` ledger entries run in one transaction with the
/// product rows locked, so two checkouts racing for the last unit cannot
/// both succeed: the second fails with an insufficient-stock error.
pub async fn checkout(
    state: &AppState,
    user: Option<&AuthUser>,
    payload: CheckoutRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    if payload.items.is_empty() {
        return Err(AppError::BadRequest("Order has no items".into()));
    }
    for item in &payload.items {
        if item.quantity <= 0 {
            return Err(AppError::BadRequest(
                "quantity must be greater than 0".into(),
            ));
        }
    }

    let customer = payload.customer.unwrap_or_default();
    if user.is_none() {
        let filled = [&customer.name, &customer.phone, &customer.address]
            .iter()
            .all(|f| f.as_deref().is_some_and(|s| !s.trim().is_empty()));
        if !filled {
            return Err(AppError::BadRequest(
                "Name, phone and address are required for guest checkout".into(),
            ));
        }
    }

    let txn = state.orm.begin().await?;

    // Lock every product up front and snapshot name/price for the lines.
    let mut snapshots = Vec::with_capacity(payload.items.len());
    let mut total_amount: i64 = 0;
    for item in &payload.items {
        let product = Products::find_by_id(item.product_id)
            .lock(LockType::Update)
            .one(&txn)
            .await?;
        let product = match product {
            Some(p) => p,
            None => return Err(AppError::BadRequest("Product not found".into())),
        };

        if product.stock < item.quantity {
            return Err(AppError::BadRequest(format!(
                "Insufficient stock for {}",
                product.name
            )));
        }

        total_amount += product.price * (item.quantity as i64);
        snapshots.push((product, item.quantity));
    }

    let order_id = Uuid::new_v4();
    let order_number = build_order_number(order_id);

    let CustomerInfo {
        name,
        email,
        phone,
        address,
    } = customer;

    let order = OrderActive {
        id: Set(order_id),
        order_number: Set(order_number.clone()),
        user_id: Set(user.map(|u| u.user_id)),
        customer_name: Set(name),
        customer_email: Set(email),
        customer_phone: Set(phone),
        customer_address: Set(address),
        total_amount: Set(total_amount),
        status: Set(OrderStatus::Pending.as_str().to_string()),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let mut order_items: Vec<OrderItem> = Vec::new();
    for (product, quantity) in &snapshots {
        let quantity = *quantity;
        let item = OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(product.id),
            name: Set(product.name.clone()),
            price: Set(product.price),
            quantity: Set(quantity),
            created_at: NotSet,
        }
        .insert(&txn)
        .await?;
        order_items.push(item.into());

        // Deduct stock and append the out-entry for this line.
        inventory_service::apply_change_in_txn(
            &txn,
            product.id,
            -quantity,
            ChangeKind::Out,
            &format!("order {order_number}"),
        )
        .await?;
    }

    if let Some(user) = user {
        CartItems::delete_many()
            .filter(CartCol::UserId.eq(user.user_id))
            .exec(&txn)
            .await?;
    }

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        user.map(|u| u.user_id),
        "checkout",
        Some("orders"),
        Some(serde_json::json!({ "order_id": order.id, "order_number": order_number })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Checkout success",
        OrderWithItems {
            order: order.into(),
            items: order_items,
        },
        Some(Meta::empty()),
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
        None => return Err(AppError::NotFound),
    };

    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(OrderItem::from)
        .collect();

    Ok(ApiResponse::success(
        "OK",
        OrderWithItems {
            order: order.into(),
            items,
        },
        Some(Meta::empty()),
    ))
}

fn build_order_number(order_id: Uuid) -> String {
    let date = Utc::now().format("%Y%m%d");
    let suffix = order_id.to_string();
    let short = &suffix[..8];
    format!("ORD-{}-{}", date, short)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_number_carries_prefix_and_id_fragment() {
        let id = Uuid::new_v4();
        let number = build_order_number(id);
        assert!(number.starts_with("ORD-"));
        assert!(number.ends_with(&id.to_string()[..8]));
        // ORD- + YYYYMMDD + - + 8 hex chars
        assert_eq!(number.len(), 4 + 8 + 1 + 8);
    }
}
