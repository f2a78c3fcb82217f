use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{Category, Product};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    pub name: String,
    #[serde(default)]
    pub name_en: String,
    pub category: Category,
    pub price: i64,
    pub stock: i32,
    #[serde(default)]
    pub unit: String,
    pub description: Option<String>,
    pub image: Option<String>,
    #[serde(default)]
    pub featured: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub name_en: Option<String>,
    pub category: Option<Category>,
    pub price: Option<i64>,
    pub stock: Option<i32>,
    pub unit: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub featured: Option<bool>,
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct ProductList {
    #[schema(value_type = Vec<Product>)]
    pub items: Vec<Product>,
}
