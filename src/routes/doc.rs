use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth::{LoginRequest, LoginResponse, RegisterRequest},
        cart::{AddToCartRequest, CartLine, CartList, UpdateCartItemRequest},
        customers::{CustomerList, CustomerSummary, UpdateCustomerRequest},
        inventory::{
            InventoryChangeRequest, InventoryChangeResult, InventoryLogLine, InventoryLogList,
        },
        orders::{CheckoutItem, CheckoutRequest, CustomerInfo, OrderList, OrderWithItems},
        products::{CreateProductRequest, ProductList, UpdateProductRequest},
    },
    models::{
        Category, ChangeKind, InventoryLogEntry, Order, OrderItem, OrderStatus, Product, User,
    },
    response::{ApiResponse, Meta},
    routes::{admin, auth, cart, health, orders, params, products},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::login,
        auth::register,
        products::list_products,
        products::get_product,
        products::create_product,
        products::update_product,
        products::delete_product,
        cart::cart_list,
        cart::add_to_cart,
        cart::update_cart_item,
        cart::remove_from_cart,
        cart::clear_cart,
        orders::list_orders,
        orders::checkout,
        orders::get_order,
        admin::list_all_orders,
        admin::get_order_admin,
        admin::update_order_status,
        admin::inventory_log,
        admin::list_low_stock,
        admin::apply_inventory_change,
        admin::list_customers,
        admin::update_customer,
        admin::delete_customer,
    ),
    components(
        schemas(
            User,
            Product,
            Order,
            OrderItem,
            InventoryLogEntry,
            Category,
            ChangeKind,
            OrderStatus,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            CreateProductRequest,
            UpdateProductRequest,
            ProductList,
            AddToCartRequest,
            UpdateCartItemRequest,
            CartLine,
            CartList,
            CheckoutItem,
            CustomerInfo,
            CheckoutRequest,
            OrderList,
            OrderWithItems,
            InventoryChangeRequest,
            InventoryChangeResult,
            InventoryLogLine,
            InventoryLogList,
            CustomerSummary,
            CustomerList,
            UpdateCustomerRequest,
            admin::UpdateOrderStatusRequest,
            params::Pagination,
            params::ProductQuery,
            params::OrderListQuery,
            params::LowStockQuery,
            params::InventoryLogQuery,
            Meta,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<OrderWithItems>,
            ApiResponse<OrderList>,
            ApiResponse<CartList>,
            ApiResponse<CustomerList>,
            ApiResponse<InventoryLogList>,
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Authentication endpoints"),
        (name = "Products", description = "Product catalog endpoints"),
        (name = "Cart", description = "Cart endpoints"),
        (name = "Orders", description = "Checkout and order endpoints"),
        (name = "Admin", description = "Back-office endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
