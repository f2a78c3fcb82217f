pub mod auth;
pub mod cart;
pub mod customers;
pub mod inventory;
pub mod orders;
pub mod products;
