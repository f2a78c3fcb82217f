use std::collections::HashMap;

use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseTransaction, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::inventory::{
        InventoryChangeRequest, InventoryChangeResult, InventoryLogLine, InventoryLogList,
    },
    entity::{
        inventory_log::{
            ActiveModel as LogActive, Column as LogCol, Entity as InventoryLog, Model as LogModel,
        },
        products::{
            ActiveModel as ProductActive, Column as ProdCol, Entity as Products,
            Model as ProductModel,
        },
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{ChangeKind, Product},
    response::{ApiResponse, Meta},
    routes::params::{InventoryLogQuery, LowStockQuery},
    state::AppState,
};

/// Resolve a stock-change request into the delta the ledger records and the
/// stock value the product ends up with. `in`/`out` amounts are signed
/// deltas; `adjust` amounts are the target stock after a physical count.
pub(crate) fn compute_change(
    kind: ChangeKind,
    amount: i32,
    current_stock: i32,
) -> AppResult<(i32, i32)> {
    let (delta, new_stock) = match kind {
        ChangeKind::Adjust => {
            if amount < 0 {
                return Err(AppError::BadRequest(
                    "target stock cannot be negative".into(),
                ));
            }
            (amount - current_stock, amount)
        }
        ChangeKind::In | ChangeKind::Out => {
            if amount == 0 {
                return Err(AppError::BadRequest("change amount must not be 0".into()));
            }
            (amount, current_stock + amount)
        }
    };

    if new_stock < 0 {
        return Err(AppError::BadRequest("stock cannot be negative".into()));
    }

    Ok((delta, new_stock))
}

/// Apply one stock change inside an open transaction: lock the product row,
/// overwrite its stock and append the ledger entry. Both rows commit or
/// neither does.
pub(crate) async fn apply_change_in_txn(
    txn: &DatabaseTransaction,
    product_id: Uuid,
    amount: i32,
    kind: ChangeKind,
    note: &str,
) -> AppResult<(ProductModel, LogModel)> {
    let product = Products::find_by_id(product_id)
        .lock(LockType::Update)
        .one(txn)
        .await?;
    let product = match product {
        Some(p) => p,
        None => return Err(AppError::NotFound),
    };

    let (delta, new_stock) = compute_change(kind, amount, product.stock)?;

    let entry = LogActive {
        id: Set(Uuid::new_v4()),
        product_id: Set(product_id),
        change: Set(delta),
        kind: Set(kind.as_str().to_string()),
        note: Set(note.to_string()),
        created_at: NotSet,
    }
    .insert(txn)
    .await?;

    let mut active: ProductActive = product.into();
    active.stock = Set(new_stock);
    let updated = active.update(txn).await?;

    Ok((updated, entry))
}

pub async fn apply_inventory_change(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
    payload: InventoryChangeRequest,
) -> AppResult<ApiResponse<InventoryChangeResult>> {
    ensure_admin(user)?;

    let txn = state.orm.begin().await?;
    let (product, entry) =
        apply_change_in_txn(&txn, product_id, payload.amount, payload.kind, &payload.note).await?;
    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "inventory_change",
        Some("inventory_log"),
        Some(serde_json::json!({
            "product_id": product_id,
            "change": entry.change,
            "type": entry.kind,
        })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Inventory updated",
        InventoryChangeResult {
            product: product.into(),
            entry: entry.into(),
        },
        Some(Meta::empty()),
    ))
}

pub async fn list_log(
    state: &AppState,
    user: &AuthUser,
    query: InventoryLogQuery,
) -> AppResult<ApiResponse<InventoryLogList>> {
    ensure_admin(user)?;
    let limit = query.limit.unwrap_or(50).clamp(1, 500);

    let entries = InventoryLog::find()
        .order_by_desc(LogCol::CreatedAt)
        .limit(limit as u64)
        .all(&state.orm)
        .await?;

    // Entries can reference products deleted since; those resolve to a null
    // name and the client renders its deleted-product placeholder.
    let product_ids: Vec<Uuid> = entries.iter().map(|e| e.product_id).collect();
    let names: HashMap<Uuid, String> = Products::find()
        .filter(ProdCol::Id.is_in(product_ids))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|p| (p.id, p.name))
        .collect();

    let items = entries
        .into_iter()
        .map(|entry| InventoryLogLine {
            id: entry.id,
            product_id: entry.product_id,
            product_name: names.get(&entry.product_id).cloned(),
            change: entry.change,
            kind: entry.kind,
            note: entry.note,
            created_at: entry.created_at.with_timezone(&chrono::Utc),
        })
        .collect();

    Ok(ApiResponse::success(
        "Inventory log",
        InventoryLogList { items },
        Some(Meta::empty()),
    ))
}

pub async fn list_low_stock(
    state: &AppState,
    user: &AuthUser,
    query: LowStockQuery,
) -> AppResult<ApiResponse<Vec<Product>>> {
    ensure_admin(user)?;
    let threshold = query.threshold.unwrap_or(20);
    let (page, limit, offset) = query.pagination.normalize();

    let finder = Products::find()
        .filter(ProdCol::Stock.lte(threshold))
        .order_by_asc(ProdCol::Stock)
        .order_by_desc(ProdCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Product::from)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Low stock", items, Some(meta)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_and_out_apply_signed_deltas() {
        assert_eq!(compute_change(ChangeKind::In, 30, 50).unwrap(), (30, 80));
        assert_eq!(compute_change(ChangeKind::Out, -20, 50).unwrap(), (-20, 30));
        // The contract trusts the caller's sign either way.
        assert_eq!(compute_change(ChangeKind::In, -5, 50).unwrap(), (-5, 45));
    }

    #[test]
    fn adjust_records_the_computed_delta_not_the_target() {
        // Month-end count: stock 50 counted as 1200.
        assert_eq!(
            compute_change(ChangeKind::Adjust, 1200, 50).unwrap(),
            (1150, 1200)
        );
        assert_eq!(
            compute_change(ChangeKind::Adjust, 10, 25).unwrap(),
            (-15, 10)
        );
    }

    #[test]
    fn adjust_to_current_stock_yields_zero_delta() {
        assert_eq!(compute_change(ChangeKind::Adjust, 40, 40).unwrap(), (0, 40));
    }

    #[test]
    fn stock_never_goes_negative() {
        assert!(compute_change(ChangeKind::Out, -51, 50).is_err());
        assert!(compute_change(ChangeKind::Adjust, -1, 50).is_err());
        // Exactly zero is fine.
        assert_eq!(compute_change(ChangeKind::Out, -50, 50).unwrap(), (-50, 0));
    }

    #[test]
    fn zero_delta_in_out_is_rejected() {
        assert!(compute_change(ChangeKind::In, 0, 10).is_err());
        assert!(compute_change(ChangeKind::Out, 0, 10).is_err());
    }
}
