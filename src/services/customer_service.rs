use uuid::Uuid;

use crate::{
    audit::log_audit,
    db::DbPool,
    dto::customers::{CustomerList, CustomerSummary, UpdateCustomerRequest},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::User,
    response::{ApiResponse, Meta},
};

/// Back-office customer listing with the per-customer aggregates the
/// dashboard renders: order count and lifetime spend across all orders.
pub async fn list_customers(
    pool: &DbPool,
    user: &AuthUser,
) -> AppResult<ApiResponse<CustomerList>> {
    ensure_admin(user)?;

    let items: Vec<CustomerSummary> = sqlx::query_as(
        r#"
        SELECT u.id, u.email, u.name, u.created_at,
               COUNT(o.id) AS order_count,
               COALESCE(SUM(o.total_amount), 0)::BIGINT AS total_spent
        FROM users u
        LEFT JOIN orders o ON o.user_id = u.id
        WHERE u.role = 'customer'
        GROUP BY u.id, u.email, u.name, u.created_at
        ORDER BY u.created_at DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(ApiResponse::success(
        "Customers",
        CustomerList { items },
        Some(Meta::empty()),
    ))
}

pub async fn update_customer(
    pool: &DbPool,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateCustomerRequest,
) -> AppResult<ApiResponse<User>> {
    ensure_admin(user)?;

    let existing: Option<User> = sqlx::query_as(
        "SELECT id, email, name, role, created_at FROM users WHERE id = $1 AND role = 'customer'",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    let existing = match existing {
        Some(u) => u,
        None => return Err(AppError::NotFound),
    };

    let name = payload.name.unwrap_or(existing.name);
    let email = payload.email.unwrap_or(existing.email);

    let taken: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM users WHERE email = $1 AND id <> $2")
            .bind(email.as_str())
            .bind(id)
            .fetch_optional(pool)
            .await?;
    if taken.is_some() {
        return Err(AppError::BadRequest("Email is already taken".to_string()));
    }

    let updated: User = sqlx::query_as(
        r#"
        UPDATE users SET name = $2, email = $3
        WHERE id = $1
        RETURNING id, email, name, role, created_at
        "#,
    )
    .bind(id)
    .bind(name)
    .bind(email)
    .fetch_one(pool)
    .await?;

    if let Err(err) = log_audit(
        pool,
        Some(user.user_id),
        "customer_update",
        Some("users"),
        Some(serde_json::json!({ "customer_id": id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success("Updated", updated, Some(Meta::empty())))
}

/// Removes the account only; historical orders keep a null user reference
/// and their contact snapshots.
pub async fn delete_customer(
    pool: &DbPool,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;

    let result = sqlx::query("DELETE FROM users WHERE id = $1 AND role = 'customer'")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }

    if let Err(err) = log_audit(
        pool,
        Some(user.user_id),
        "customer_delete",
        Some("users"),
        Some(serde_json::json!({ "customer_id": id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}
