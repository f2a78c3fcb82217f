use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    audit::log_audit,
    db::DbPool,
    dto::cart::{AddToCartRequest, CartLine, CartList, UpdateCartItemRequest},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Product,
    response::{ApiResponse, Meta},
};

#[derive(FromRow)]
struct CartWithProductRow {
    cart_id: Uuid,
    quantity: i32,
    product_id: Uuid,
    name: String,
    name_en: String,
    category: String,
    price: i64,
    stock: i32,
    unit: String,
    description: Option<String>,
    image: Option<String>,
    featured: bool,
    created_at: DateTime<Utc>,
}

/// A cart line never exceeds the stock known when it was written, but stock
/// can shrink remotely afterwards, so quantities are clamped again on read.
fn clamped_quantity(requested: i32, stock: i32) -> i32 {
    requested.min(stock).max(0)
}

pub async fn list_cart(pool: &DbPool, user: &AuthUser) -> AppResult<ApiResponse<CartList>> {
    let rows = sqlx::query_as::<_, CartWithProductRow>(
        r#"
        SELECT ci.id AS cart_id, ci.quantity,
               p.id AS product_id, p.name, p.name_en, p.category, p.price, p.stock,
               p.unit, p.description, p.image, p.featured, p.created_at
        FROM cart_items ci
        JOIN products p ON p.id = ci.product_id
        WHERE ci.user_id = $1
        ORDER BY ci.created_at DESC
        "#,
    )
    .bind(user.user_id)
    .fetch_all(pool)
    .await?;

    let mut cart_count: i64 = 0;
    let mut cart_total: i64 = 0;
    let items: Vec<CartLine> = rows
        .into_iter()
        .map(|row| {
            let quantity = clamped_quantity(row.quantity, row.stock);
            cart_count += quantity as i64;
            cart_total += row.price * (quantity as i64);
            CartLine {
                id: row.cart_id,
                product: Product {
                    id: row.product_id,
                    name: row.name,
                    name_en: row.name_en,
                    category: row.category,
                    price: row.price,
                    stock: row.stock,
                    unit: row.unit,
                    description: row.description,
                    image: row.image,
                    featured: row.featured,
                    created_at: row.created_at,
                },
                quantity,
            }
        })
        .collect();

    Ok(ApiResponse::success(
        "OK",
        CartList {
            items,
            cart_count,
            cart_total,
        },
        Some(Meta::empty()),
    ))
}

pub async fn add_to_cart(
    pool: &DbPool,
    user: &AuthUser,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<CartLine>> {
    if payload.quantity <= 0 {
        return Err(AppError::BadRequest(
            "quantity must be greater than 0".to_string(),
        ));
    }

    let product: Option<Product> = sqlx::query_as("SELECT * FROM products WHERE id = $1")
        .bind(payload.product_id)
        .fetch_optional(pool)
        .await?;
    let product = match product {
        Some(p) => p,
        None => return Err(AppError::BadRequest("product not found".to_string())),
    };
    if product.stock <= 0 {
        return Err(AppError::BadRequest("product is out of stock".to_string()));
    }

    let existing: Option<(Uuid, i32)> =
        sqlx::query_as("SELECT id, quantity FROM cart_items WHERE user_id = $1 AND product_id = $2")
            .bind(user.user_id)
            .bind(payload.product_id)
            .fetch_optional(pool)
            .await?;

    // Merge into the existing line by summing, clamped to current stock.
    let (cart_id, quantity) = if let Some((id, current)) = existing {
        let quantity = clamped_quantity(current + payload.quantity, product.stock);
        sqlx::query("UPDATE cart_items SET quantity = $3 WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user.user_id)
            .bind(quantity)
            .execute(pool)
            .await?;
        (id, quantity)
    } else {
        let quantity = clamped_quantity(payload.quantity, product.stock);
        let (id,): (Uuid,) = sqlx::query_as(
            "INSERT INTO cart_items (user_id, product_id, quantity) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(user.user_id)
        .bind(payload.product_id)
        .bind(quantity)
        .fetch_one(pool)
        .await?;
        (id, quantity)
    };

    if let Err(err) = log_audit(
        pool,
        Some(user.user_id),
        "cart_update",
        Some("cart_items"),
        Some(serde_json::json!({ "product_id": payload.product_id, "quantity": quantity })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "OK",
        CartLine {
            id: cart_id,
            product,
            quantity,
        },
        None,
    ))
}

/// Quantity 0 or below removes the line. A positive quantity is written as
/// given, without re-clamping to stock; the read-time clamp bounds what the
/// storefront ever shows.
pub async fn update_quantity(
    pool: &DbPool,
    user: &AuthUser,
    product_id: Uuid,
    payload: UpdateCartItemRequest,
) -> AppResult<ApiResponse<serde_json::Value>> {
    if payload.quantity <= 0 {
        return remove_from_cart(pool, user, product_id).await;
    }

    let result = sqlx::query(
        "UPDATE cart_items SET quantity = $3 WHERE product_id = $1 AND user_id = $2",
    )
    .bind(product_id)
    .bind(user.user_id)
    .bind(payload.quantity)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }

    if let Err(err) = log_audit(
        pool,
        Some(user.user_id),
        "cart_update",
        Some("cart_items"),
        Some(serde_json::json!({ "product_id": product_id, "quantity": payload.quantity })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "OK",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn remove_from_cart(
    pool: &DbPool,
    user: &AuthUser,
    product_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = sqlx::query("DELETE FROM cart_items WHERE product_id = $1 AND user_id = $2")
        .bind(product_id)
        .bind(user.user_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }

    if let Err(err) = log_audit(
        pool,
        Some(user.user_id),
        "cart_remove",
        Some("cart_items"),
        Some(serde_json::json!({ "product_id": product_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Removed from cart",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn clear_cart(pool: &DbPool, user: &AuthUser) -> AppResult<ApiResponse<serde_json::Value>> {
    sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
        .bind(user.user_id)
        .execute(pool)
        .await?;

    Ok(ApiResponse::success(
        "Cart cleared",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantities_clamp_to_known_stock() {
        assert_eq!(clamped_quantity(3, 10), 3);
        assert_eq!(clamped_quantity(15, 10), 10);
        assert_eq!(clamped_quantity(2, 0), 0);
    }

    #[test]
    fn merged_line_never_exceeds_stock() {
        // Existing line of 8, adding 5 more against stock 10.
        assert_eq!(clamped_quantity(8 + 5, 10), 10);
    }
}
