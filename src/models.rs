use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity;

/// Meat categories carried by the shop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Beef,
    Pork,
    Poultry,
    Lamb,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Beef => "beef",
            Category::Pork => "pork",
            Category::Poultry => "poultry",
            Category::Lamb => "lamb",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "beef" => Some(Category::Beef),
            "pork" => Some(Category::Pork),
            "poultry" => Some(Category::Poultry),
            "lamb" => Some(Category::Lamb),
            _ => None,
        }
    }
}

/// Kind of a stock-changing event. `Adjust` requests carry a target stock
/// value; the ledger itself always records the computed delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    In,
    Out,
    Adjust,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::In => "in",
            ChangeKind::Out => "out",
            ChangeKind::Adjust => "adjust",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "in" => Some(ChangeKind::In),
            "out" => Some(ChangeKind::Out),
            "adjust" => Some(ChangeKind::Adjust),
            _ => None,
        }
    }
}

/// Order lifecycle states. `Completed` and `Cancelled` are terminal:
/// once reached, no further transition is permitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Shipping,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Shipping => "shipping",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(OrderStatus::Pending),
            "confirmed" => Some(OrderStatus::Confirmed),
            "shipping" => Some(OrderStatus::Shipping),
            "completed" => Some(OrderStatus::Completed),
            "cancelled" => Some(OrderStatus::Cancelled),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    pub fn can_transition(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        match (self, next) {
            (Pending, Confirmed) => true,
            (Confirmed, Shipping) => true,
            (Shipping, Completed) => true,
            (Pending | Confirmed | Shipping, Cancelled) => true,
            _ => false,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub name_en: String,
    pub category: String,
    pub price: i64,
    pub stock: i32,
    pub unit: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub featured: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub order_number: String,
    pub user_id: Option<Uuid>,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_address: Option<String>,
    pub total_amount: i64,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A line item snapshots product name and unit price at checkout time so
/// later catalog edits never alter historical orders.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub name: String,
    pub price: i64,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InventoryLogEntry {
    pub id: Uuid,
    pub product_id: Uuid,
    pub change: i32,
    #[serde(rename = "type")]
    pub kind: String,
    pub note: String,
    pub created_at: DateTime<Utc>,
}

// Single entity-to-model translation point. The table schema is snake_case;
// everything the API serves speaks the camelCase model types above.

impl From<entity::products::Model> for Product {
    fn from(model: entity::products::Model) -> Self {
        Product {
            id: model.id,
            name: model.name,
            name_en: model.name_en,
            category: model.category,
            price: model.price,
            stock: model.stock,
            unit: model.unit,
            description: model.description,
            image: model.image,
            featured: model.featured,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<entity::orders::Model> for Order {
    fn from(model: entity::orders::Model) -> Self {
        Order {
            id: model.id,
            order_number: model.order_number,
            user_id: model.user_id,
            customer_name: model.customer_name,
            customer_email: model.customer_email,
            customer_phone: model.customer_phone,
            customer_address: model.customer_address,
            total_amount: model.total_amount,
            status: model.status,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

impl From<entity::order_items::Model> for OrderItem {
    fn from(model: entity::order_items::Model) -> Self {
        OrderItem {
            id: model.id,
            order_id: model.order_id,
            product_id: model.product_id,
            name: model.name,
            price: model.price,
            quantity: model.quantity,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<entity::inventory_log::Model> for InventoryLogEntry {
    fn from(model: entity::inventory_log::Model) -> Self {
        InventoryLogEntry {
            id: model.id,
            product_id: model.product_id,
            change: model.change,
            kind: model.kind,
            note: model.note,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<entity::users::Model> for User {
    fn from(model: entity::users::Model) -> Self {
        User {
            id: model.id,
            email: model.email,
            name: model.name,
            role: model.role,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_status_follows_forward_path() {
        assert!(OrderStatus::Pending.can_transition(OrderStatus::Confirmed));
        assert!(OrderStatus::Confirmed.can_transition(OrderStatus::Shipping));
        assert!(OrderStatus::Shipping.can_transition(OrderStatus::Completed));
    }

    #[test]
    fn order_status_allows_cancel_from_any_open_state() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Confirmed,
            OrderStatus::Shipping,
        ] {
            assert!(status.can_transition(OrderStatus::Cancelled));
        }
    }

    #[test]
    fn terminal_states_reject_every_transition() {
        let targets = [
            OrderStatus::Pending,
            OrderStatus::Confirmed,
            OrderStatus::Shipping,
            OrderStatus::Completed,
            OrderStatus::Cancelled,
        ];
        for terminal in [OrderStatus::Completed, OrderStatus::Cancelled] {
            assert!(terminal.is_terminal());
            for target in targets {
                assert!(!terminal.can_transition(target));
            }
        }
    }

    #[test]
    fn order_status_rejects_skipping_states() {
        assert!(!OrderStatus::Pending.can_transition(OrderStatus::Shipping));
        assert!(!OrderStatus::Pending.can_transition(OrderStatus::Completed));
        assert!(!OrderStatus::Confirmed.can_transition(OrderStatus::Completed));
        assert!(!OrderStatus::Shipping.can_transition(OrderStatus::Confirmed));
    }

    #[test]
    fn status_round_trips_through_strings() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Confirmed,
            OrderStatus::Shipping,
            OrderStatus::Completed,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(OrderStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(OrderStatus::parse("paid"), None);
    }

    #[test]
    fn change_kind_parses_ledger_types() {
        assert_eq!(ChangeKind::parse("in"), Some(ChangeKind::In));
        assert_eq!(ChangeKind::parse("out"), Some(ChangeKind::Out));
        assert_eq!(ChangeKind::parse("adjust"), Some(ChangeKind::Adjust));
        assert_eq!(ChangeKind::parse("transfer"), None);
    }
}
