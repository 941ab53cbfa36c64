//! Integration tests for Littlewear.
//!
//! # Running Tests
//!
//! ```bash
//! # Start PostgreSQL and run migrations + seed
//! cargo run -p littlewear-cli -- migrate
//! cargo run -p littlewear-cli -- seed
//!
//! # Start the storefront server
//! cargo run -p littlewear-storefront
//!
//! # Run the ignored HTTP tests
//! cargo test -p littlewear-integration-tests -- --ignored
//! ```
//!
//! The HTTP tests talk to a running server (`STOREFRONT_BASE_URL`, default
//! `http://localhost:3000`) and create their own fixture rows directly in
//! the database, so they don't depend on seed data.

use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

/// Base URL for the storefront API (configurable via environment).
#[must_use]
pub fn base_url() -> String {
    std::env::var("STOREFRONT_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// Shared context for HTTP tests: a client, the server URL, and a direct
/// database handle for fixtures and assertions the API doesn't expose.
pub struct TestContext {
    pub client: reqwest::Client,
    pub base_url: String,
    pub pool: PgPool,
}

impl TestContext {
    /// Connect to the database named by `STOREFRONT_DATABASE_URL` (or
    /// `DATABASE_URL`).
    ///
    /// # Panics
    ///
    /// Panics when the URL is missing or the connection fails; these tests
    /// only run against a prepared environment.
    pub async fn new() -> Self {
        let database_url = std::env::var("STOREFRONT_DATABASE_URL")
            .or_else(|_| std::env::var("DATABASE_URL"))
            .expect("STOREFRONT_DATABASE_URL or DATABASE_URL must be set");

        let pool = PgPool::connect(&database_url)
            .await
            .expect("Failed to connect to test database");

        Self {
            client: reqwest::Client::new(),
            base_url: base_url(),
            pool,
        }
    }

    /// A GET builder carrying the given identity headers.
    #[must_use]
    pub fn get(&self, path: &str, identity: &TestIdentity) -> reqwest::RequestBuilder {
        identity.apply(self.client.get(format!("{}{path}", self.base_url)))
    }

    /// A POST builder carrying the given identity headers.
    #[must_use]
    pub fn post(&self, path: &str, identity: &TestIdentity) -> reqwest::RequestBuilder {
        identity.apply(self.client.post(format!("{}{path}", self.base_url)))
    }

    /// A PUT builder carrying the given identity headers.
    #[must_use]
    pub fn put(&self, path: &str, identity: &TestIdentity) -> reqwest::RequestBuilder {
        identity.apply(self.client.put(format!("{}{path}", self.base_url)))
    }

    /// A DELETE builder carrying the given identity headers.
    #[must_use]
    pub fn delete(&self, path: &str, identity: &TestIdentity) -> reqwest::RequestBuilder {
        identity.apply(self.client.delete(format!("{}{path}", self.base_url)))
    }

    /// Insert a fixture product and return `(id, slug)`.
    ///
    /// # Panics
    ///
    /// Panics if the insert fails.
    pub async fn create_product(
        &self,
        price: &str,
        sale_price: Option<&str>,
        stock: i32,
    ) -> (i32, String) {
        let slug = format!("test-product-{}", Uuid::new_v4());
        let id: i32 = sqlx::query_scalar(
            "INSERT INTO products (name, slug, price, sale_price, stock) \
             VALUES ($1, $2, $3, $4, $5) RETURNING id",
        )
        .bind("Test Product")
        .bind(&slug)
        .bind(price.parse::<Decimal>().expect("valid price"))
        .bind(sale_price.map(|p| p.parse::<Decimal>().expect("valid sale price")))
        .bind(stock)
        .fetch_one(&self.pool)
        .await
        .expect("Failed to insert fixture product");

        (id, slug)
    }

    /// Insert a fixture coupon and return its code.
    ///
    /// # Panics
    ///
    /// Panics if the insert fails.
    pub async fn create_coupon(
        &self,
        kind: &str,
        value: &str,
        minimum_amount: Option<&str>,
        usage_limit: Option<i32>,
        user_limit: i32,
    ) -> String {
        let code = format!("TEST-{}", Uuid::new_v4().simple());
        sqlx::query(
            "INSERT INTO coupons \
                 (code, kind, value, minimum_amount, usage_limit, user_limit, starts_at, ends_at) \
             VALUES ($1, $2, $3, $4, $5, $6, NOW() - INTERVAL '1 hour', NOW() + INTERVAL '1 day')",
        )
        .bind(&code)
        .bind(kind)
        .bind(value.parse::<Decimal>().expect("valid value"))
        .bind(minimum_amount.map(|m| m.parse::<Decimal>().expect("valid minimum")))
        .bind(usage_limit)
        .bind(user_limit)
        .execute(&self.pool)
        .await
        .expect("Failed to insert fixture coupon");

        code
    }
}

/// An identity as the upstream gateway would assert it.
pub enum TestIdentity {
    User(String),
    Session(String),
    Admin(String),
}

impl TestIdentity {
    /// A fresh authenticated user id.
    #[must_use]
    pub fn fresh_user() -> Self {
        Self::User(format!("user-{}", Uuid::new_v4()))
    }

    /// A fresh anonymous session token.
    #[must_use]
    pub fn fresh_session() -> Self {
        Self::Session(format!("sess-{}", Uuid::new_v4()))
    }

    /// A fresh admin user.
    #[must_use]
    pub fn fresh_admin() -> Self {
        Self::Admin(format!("admin-{}", Uuid::new_v4()))
    }

    fn apply(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self {
            Self::User(id) => builder.header("x-user-id", id),
            Self::Session(token) => builder.header("x-session-token", token),
            Self::Admin(id) => builder
                .header("x-user-id", id)
                .header("x-admin-role", "admin"),
        }
    }
}

/// Parse a decimal out of a JSON string field.
///
/// Money is serialized as strings (e.g. `"24.99"`); this keeps assertions
/// exact instead of going through floats.
///
/// # Panics
///
/// Panics when the field is absent or not a decimal string.
#[must_use]
pub fn decimal_field(value: &serde_json::Value, field: &str) -> Decimal {
    value
        .get(field)
        .and_then(serde_json::Value::as_str)
        .unwrap_or_else(|| panic!("missing decimal field {field}: {value}"))
        .parse()
        .unwrap_or_else(|_| panic!("field {field} is not a decimal"))
}
