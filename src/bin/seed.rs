use argon2::{
    Argon2, PasswordHasher,
    password_hash::{SaltString, rand_core::OsRng},
};
use meatshop_api::{
    config::AppConfig,
    db::{create_orm_conn, create_pool, run_migrations},
};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let orm = create_orm_conn(&config.database_url).await?;
    run_migrations(&orm).await?;

    let pool = create_pool(&config.database_url).await?;

    let admin_id = ensure_user(&pool, "admin@example.com", "admin123", "店長", "admin").await?;
    let user_id = ensure_user(&pool, "user@example.com", "user123", "王小明", "customer").await?;
    seed_products(&pool).await?;

    println!("Seed completed. Admin ID: {admin_id}, Customer ID: {user_id}");
    Ok(())
}

async fn ensure_user(
    pool: &sqlx::PgPool,
    email: &str,
    password: &str,
    name: &str,
    role: &str,
) -> anyhow::Result<Uuid> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .to_string();

    let row: Option<(Uuid,)> = sqlx::query_as(
        r#"
        INSERT INTO users (id, email, password_hash, name, role)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (email) DO UPDATE SET role = EXCLUDED.role
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(password_hash)
    .bind(name)
    .bind(role)
    .fetch_optional(pool)
    .await?;

    let user_id = match row {
        Some((id,)) => id,
        None => {
            let existing: (Uuid,) = sqlx::query_as("SELECT id FROM users WHERE email = $1")
                .bind(email)
                .fetch_one(pool)
                .await?;
            existing.0
        }
    };

    println!("Ensured user {email} (role={role})");
    Ok(user_id)
}

async fn seed_products(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let products = vec![
        ("台灣牛五花", "Beef Short Plate", "beef", 680, 50, "200g", true),
        ("美國翼板牛排", "US Flat Iron Steak", "beef", 520, 30, "250g", true),
        ("黑毛豬梅花肉", "Pork Collar", "pork", 320, 80, "300g", false),
        ("豬五花火鍋片", "Pork Belly Slices", "pork", 220, 120, "300g", false),
        ("放山土雞腿", "Free-range Chicken Leg", "poultry", 180, 60, "1支", true),
        ("去骨雞胸肉", "Boneless Chicken Breast", "poultry", 120, 150, "250g", false),
        ("紐西蘭羊小排", "NZ Lamb Rack", "lamb", 850, 25, "400g", true),
        ("羊肉火鍋片", "Lamb Hotpot Slices", "lamb", 380, 40, "300g", false),
    ];

    for (name, name_en, category, price, stock, unit, featured) in products {
        sqlx::query(
            r#"
            INSERT INTO products (id, name, name_en, category, price, stock, unit, featured)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(name_en)
        .bind(category)
        .bind(price as i64)
        .bind(stock)
        .bind(unit)
        .bind(featured)
        .execute(pool)
        .await?;
    }

    println!("Seeded products");
    Ok(())
}
