pub mod admin_service;
pub mod auth_service;
pub mod cart_service;
pub mod customer_service;
pub mod inventory_service;
pub mod order_service;
pub mod product_service;
