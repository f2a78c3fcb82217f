use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{ChangeKind, InventoryLogEntry, Product};

/// For `in`/`out` the amount is a signed delta; for `adjust` it is the
/// target absolute stock after a physical count.
#[derive(Debug, Deserialize, ToSchema)]
pub struct InventoryChangeRequest {
    pub amount: i32,
    #[serde(rename = "type")]
    pub kind: ChangeKind,
    #[serde(default)]
    pub note: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct InventoryChangeResult {
    pub product: Product,
    pub entry: InventoryLogEntry,
}

/// Ledger entry decorated with the product's current name, or a
/// deleted-product placeholder when the catalog row is gone.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InventoryLogLine {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_name: Option<String>,
    pub change: i32,
    #[serde(rename = "type")]
    pub kind: String,
    pub note: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct InventoryLogList {
    pub items: Vec<InventoryLogLine>,
}
