use meatshop_api::{
    db::{create_orm_conn, create_pool, run_migrations},
    dto::orders::{CheckoutItem, CheckoutRequest, CustomerInfo},
    entity::products::ActiveModel as ProductActive,
    error::AppError,
    services::order_service,
    state::AppState,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ConnectionTrait, Set, Statement};
use uuid::Uuid;

// Guest checkout carries contact fields instead of a user reference, and
// requires them.
#[tokio::test]
async fn guest_checkout_requires_contact_info() -> anyhow::Result<()> {
    let database_url =
        match std::env::var("TEST_DATABASE_URL").or_else(|_| std::env::var("DATABASE_URL")) {
            Ok(url) => url,
            Err(_) => {
                eprintln!(
                    "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
                );
                return Ok(());
            }
        };

    let state = setup_state(&database_url).await?;
    let chicken = create_product(&state, "放山土雞腿", "poultry", 180, 60).await?;

    let err = order_service::checkout(
        &state,
        None,
        CheckoutRequest {
            items: vec![CheckoutItem {
                product_id: chicken,
                quantity: 2,
            }],
            customer: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let order = order_service::checkout(
        &state,
        None,
        CheckoutRequest {
            items: vec![CheckoutItem {
                product_id: chicken,
                quantity: 2,
            }],
            customer: Some(CustomerInfo {
                name: Some("陳大文".into()),
                email: Some("guest@example.com".into()),
                phone: Some("0912-345-678".into()),
                address: Some("台北市中山區民生東路 100 號".into()),
            }),
        },
    )
    .await?
    .data
    .unwrap()
    .order;
    assert_eq!(order.user_id, None);
    assert_eq!(order.customer_name.as_deref(), Some("陳大文"));
    assert_eq!(order.total_amount, 360);

    Ok(())
}

async fn setup_state(database_url: &str) -> anyhow::Result<AppState> {
    let orm = create_orm_conn(database_url).await?;
    run_migrations(&orm).await?;
    let pool = create_pool(database_url).await?;

    // Clean tables between runs
    let backend = orm.get_database_backend();
    orm.execute(Statement::from_string(
        backend,
        "TRUNCATE TABLE order_items, orders, cart_items, inventory_log, audit_logs, products, users RESTART IDENTITY CASCADE",
    ))
    .await?;

    Ok(AppState { pool, orm })
}

async fn create_product(
    state: &AppState,
    name: &str,
    category: &str,
    price: i64,
    stock: i32,
) -> anyhow::Result<Uuid> {
    let product = ProductActive {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        name_en: Set(String::new()),
        category: Set(category.to_string()),
        price: Set(price),
        stock: Set(stock),
        unit: Set("300g".into()),
        description: Set(None),
        image: Set(None),
        featured: Set(false),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(product.id)
}
