//! Seed the database with a small development catalog.
//!
//! Idempotent: rows are keyed by slug/code and skipped when they already
//! exist, so the command can be re-run freely.
//!
//! # Usage
//!
//! ```bash
//! lw-cli seed
//! ```

use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use tracing::info;

use super::migrate::{MigrationError, database_url};

struct SeedProduct {
    category: &'static str,
    name: &'static str,
    slug: &'static str,
    price: &'static str,
    sale_price: Option<&'static str>,
    stock: i32,
    sizes: &'static [&'static str],
    colors: &'static [&'static str],
}

const CATEGORIES: &[(&str, &str)] = &[
    ("Baby", "baby"),
    ("Girls", "girls"),
    ("Boys", "boys"),
    ("Accessories", "accessories"),
];

const TODDLER_SIZES: &[&str] = &["2T", "3T", "4T"];
const KID_SIZES: &[&str] = &["4", "5", "6", "7", "8"];

const PRODUCTS: &[SeedProduct] = &[
    SeedProduct {
        category: "baby",
        name: "Organic Cotton Romper",
        slug: "organic-cotton-romper",
        price: "24.99",
        sale_price: None,
        stock: 40,
        sizes: &["0-3m", "3-6m", "6-12m"],
        colors: &["cloud", "sage"],
    },
    SeedProduct {
        category: "baby",
        name: "Knit Booties",
        slug: "knit-booties",
        price: "12.50",
        sale_price: Some("9.99"),
        stock: 60,
        sizes: &[],
        colors: &["oat", "blush"],
    },
    SeedProduct {
        category: "girls",
        name: "Corduroy Pinafore Dress",
        slug: "corduroy-pinafore-dress",
        price: "38.00",
        sale_price: None,
        stock: 25,
        sizes: TODDLER_SIZES,
        colors: &["rust", "forest"],
    },
    SeedProduct {
        category: "boys",
        name: "Striped Longsleeve Tee",
        slug: "striped-longsleeve-tee",
        price: "18.00",
        sale_price: Some("14.40"),
        stock: 50,
        sizes: KID_SIZES,
        colors: &["navy", "mustard"],
    },
    SeedProduct {
        category: "boys",
        name: "Everyday Joggers",
        slug: "everyday-joggers",
        price: "22.00",
        sale_price: None,
        stock: 35,
        sizes: KID_SIZES,
        colors: &["charcoal", "olive"],
    },
    SeedProduct {
        category: "accessories",
        name: "Sun Hat",
        slug: "sun-hat",
        price: "16.00",
        sale_price: None,
        stock: 80,
        sizes: &[],
        colors: &["straw"],
    },
];

/// Seed categories, products, and a few coupons.
///
/// # Errors
///
/// Returns `MigrationError` if the database is unreachable or an insert fails.
pub async fn run() -> Result<(), MigrationError> {
    dotenvy::dotenv().ok();

    let database_url = database_url()?;
    let pool = PgPool::connect(database_url.expose_secret()).await?;

    let mut inserted = 0_u64;

    for (name, slug) in CATEGORIES {
        let result =
            sqlx::query("INSERT INTO categories (name, slug) VALUES ($1, $2) ON CONFLICT (slug) DO NOTHING")
                .bind(name)
                .bind(slug)
                .execute(&pool)
                .await?;
        inserted += result.rows_affected();
    }

    for product in PRODUCTS {
        let result = sqlx::query(
            "INSERT INTO products \
                 (category_id, name, slug, price, sale_price, stock, sizes, colors) \
             VALUES ((SELECT id FROM categories WHERE slug = $1), \
                     $2, $3, $4, $5, $6, $7, $8) \
             ON CONFLICT (slug) DO NOTHING",
        )
        .bind(product.category)
        .bind(product.name)
        .bind(product.slug)
        .bind(product.price.parse::<Decimal>().unwrap_or_default())
        .bind(
            product
                .sale_price
                .map(|p| p.parse::<Decimal>().unwrap_or_default()),
        )
        .bind(product.stock)
        .bind(product.sizes.iter().map(ToString::to_string).collect::<Vec<_>>())
        .bind(product.colors.iter().map(ToString::to_string).collect::<Vec<_>>())
        .execute(&pool)
        .await?;
        inserted += result.rows_affected();
    }

    inserted += seed_coupons(&pool).await?;

    info!("Seeding complete!");
    info!("  Rows inserted: {inserted}");

    Ok(())
}

async fn seed_coupons(pool: &PgPool) -> Result<u64, MigrationError> {
    // (code, kind, value, minimum_amount, maximum_discount, user_limit)
    let coupons: &[(&str, &str, &str, Option<&str>, Option<&str>, i32)] = &[
        ("WELCOME10", "percentage", "10", None, Some("20"), 1),
        ("SAVE5", "fixed", "5", Some("30"), None, 3),
        ("SHIPFREE", "free_shipping", "0", Some("25"), None, 5),
    ];

    let mut inserted = 0_u64;
    for (code, kind, value, minimum, maximum, user_limit) in coupons {
        let result = sqlx::query(
            "INSERT INTO coupons \
                 (code, kind, value, minimum_amount, maximum_discount, user_limit, \
                  starts_at, ends_at) \
             VALUES ($1, $2, $3, $4, $5, $6, NOW(), NOW() + INTERVAL '1 year') \
             ON CONFLICT (code) DO NOTHING",
        )
        .bind(code)
        .bind(kind)
        .bind(value.parse::<Decimal>().unwrap_or_default())
        .bind(minimum.map(|m| m.parse::<Decimal>().unwrap_or_default()))
        .bind(maximum.map(|m| m.parse::<Decimal>().unwrap_or_default()))
        .bind(user_limit)
        .execute(pool)
        .await?;
        inserted += result.rows_affected();
    }

    Ok(inserted)
}
