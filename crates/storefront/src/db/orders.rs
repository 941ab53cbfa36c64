//! Order repository.
//!
//! Placement-time writes (snapshot, insert, stock decrement, restock) take
//! an open transaction so the pipeline in `services::checkout` commits or
//! rolls back as one unit. Reads go through the pool.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use littlewear_core::{CategoryId, OrderId, OrderStatus, PaymentStatus, ProductId};

use super::RepositoryError;
use crate::models::{Address, Order, OrderLine, OrderWithItems};

const ORDER_COLUMNS: &str = "id, reference, user_id, status, payment_status, payment_method, \
     subtotal, discount, shipping_cost, total_amount, coupon_code, \
     shipping_address, billing_address, notes, created_at, updated_at";

const ITEM_COLUMNS: &str = "id, order_id, product_id, product_name, quantity, size, color, price";

/// A row from the `orders` table; statuses and addresses are parsed when
/// mapping to the model.
#[derive(Debug, Clone, sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    reference: Uuid,
    user_id: String,
    status: String,
    payment_status: String,
    payment_method: String,
    subtotal: Decimal,
    discount: Decimal,
    shipping_cost: Decimal,
    total_amount: Decimal,
    coupon_code: Option<String>,
    shipping_address: serde_json::Value,
    billing_address: Option<serde_json::Value>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepositoryError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let status = OrderStatus::from_str(&row.status)
            .map_err(|e| RepositoryError::DataCorruption(format!("invalid order status: {e}")))?;
        let payment_status = PaymentStatus::from_str(&row.payment_status).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid payment status: {e}"))
        })?;
        let shipping_address: Address =
            serde_json::from_value(row.shipping_address).map_err(|e| {
                RepositoryError::DataCorruption(format!("invalid shipping address: {e}"))
            })?;
        let billing_address = row
            .billing_address
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| {
                RepositoryError::DataCorruption(format!("invalid billing address: {e}"))
            })?;

        Ok(Self {
            id: row.id,
            reference: row.reference,
            user_id: row.user_id,
            status,
            payment_status,
            payment_method: row.payment_method,
            subtotal: row.subtotal,
            discount: row.discount,
            shipping_cost: row.shipping_cost,
            total_amount: row.total_amount,
            coupon_code: row.coupon_code,
            shipping_address,
            billing_address,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// A cart line joined with its product at placement time.
///
/// `price`/`sale_price`/`stock` are the live values the pipeline snapshots;
/// every check and the line-item price derive from this read, never from a
/// second fetch.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CartSnapshotRow {
    pub product_id: ProductId,
    pub category_id: Option<CategoryId>,
    pub product_name: String,
    pub product_slug: String,
    pub quantity: i32,
    pub size: Option<String>,
    pub color: Option<String>,
    pub price: Decimal,
    pub sale_price: Option<Decimal>,
    pub stock: i32,
}

/// Insert payload for a new order.
#[derive(Debug, Clone)]
pub struct NewOrder<'a> {
    pub reference: Uuid,
    pub user_id: &'a str,
    pub payment_method: &'a str,
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub shipping_cost: Decimal,
    pub total_amount: Decimal,
    pub coupon_code: Option<&'a str>,
    pub shipping_address: &'a Address,
    pub billing_address: Option<&'a Address>,
    pub notes: Option<&'a str>,
}

/// Repository for orders and their line items.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List a user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails, or
    /// `RepositoryError::DataCorruption` if a stored status or address is invalid.
    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY created_at DESC, id DESC"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Order::try_from).collect()
    }

    /// List every order, newest first (admin view).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails, or
    /// `RepositoryError::DataCorruption` if a stored status or address is invalid.
    pub async fn list_all(&self) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Order::try_from).collect()
    }

    /// Get one order with its line items.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails, or
    /// `RepositoryError::DataCorruption` if a stored status or address is invalid.
    pub async fn get_by_id(
        &self,
        order_id: OrderId,
    ) -> Result<Option<OrderWithItems>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"
        ))
        .bind(order_id)
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let order = Order::try_from(row)?;
        let items = self.get_items(order_id).await?;

        Ok(Some(OrderWithItems { order, items }))
    }

    /// Get the line items for an order, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_items(&self, order_id: OrderId) -> Result<Vec<OrderLine>, RepositoryError> {
        let items = sqlx::query_as::<_, OrderLine>(&format!(
            "SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id = $1 ORDER BY id ASC"
        ))
        .bind(order_id)
        .fetch_all(self.pool)
        .await?;

        Ok(items)
    }

    // -----------------------------------------------------------------------
    // Placement transaction helpers
    // -----------------------------------------------------------------------

    /// Read the cart joined with live product price/stock, in insertion
    /// order. This is the single consistent read the pipeline works from.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn snapshot_cart(
        conn: &mut PgConnection,
        identity: &str,
    ) -> Result<Vec<CartSnapshotRow>, RepositoryError> {
        let rows = sqlx::query_as::<_, CartSnapshotRow>(
            "SELECT ci.product_id, p.category_id, \
                    p.name AS product_name, p.slug AS product_slug, \
                    ci.quantity, ci.size, ci.color, p.price, p.sale_price, p.stock \
             FROM cart_items ci \
             JOIN products p ON p.id = ci.product_id \
             WHERE ci.identity = $1 AND p.is_active \
             ORDER BY ci.created_at ASC, ci.id ASC",
        )
        .bind(identity)
        .fetch_all(conn)
        .await?;

        Ok(rows)
    }

    /// Insert the order row.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails, or
    /// `RepositoryError::DataCorruption` if an address fails to serialize.
    pub async fn insert_order(
        conn: &mut PgConnection,
        new_order: &NewOrder<'_>,
    ) -> Result<Order, RepositoryError> {
        let shipping_address = serde_json::to_value(new_order.shipping_address).map_err(|e| {
            RepositoryError::DataCorruption(format!("failed to serialize shipping address: {e}"))
        })?;
        let billing_address = new_order
            .billing_address
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| {
                RepositoryError::DataCorruption(format!(
                    "failed to serialize billing address: {e}"
                ))
            })?;

        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "INSERT INTO orders \
                 (reference, user_id, payment_method, subtotal, discount, shipping_cost, \
                  total_amount, coupon_code, shipping_address, billing_address, notes) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(new_order.reference)
        .bind(new_order.user_id)
        .bind(new_order.payment_method)
        .bind(new_order.subtotal)
        .bind(new_order.discount)
        .bind(new_order.shipping_cost)
        .bind(new_order.total_amount)
        .bind(new_order.coupon_code)
        .bind(shipping_address)
        .bind(billing_address)
        .bind(new_order.notes)
        .fetch_one(conn)
        .await?;

        Order::try_from(row)
    }

    /// Insert one line item with its snapshotted price.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn insert_item(
        conn: &mut PgConnection,
        order_id: OrderId,
        snapshot: &CartSnapshotRow,
        price: Decimal,
    ) -> Result<OrderLine, RepositoryError> {
        let item = sqlx::query_as::<_, OrderLine>(&format!(
            "INSERT INTO order_items \
                 (order_id, product_id, product_name, quantity, size, color, price) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {ITEM_COLUMNS}"
        ))
        .bind(order_id)
        .bind(snapshot.product_id)
        .bind(&snapshot.product_name)
        .bind(snapshot.quantity)
        .bind(snapshot.size.as_deref())
        .bind(snapshot.color.as_deref())
        .bind(price)
        .fetch_one(conn)
        .await?;

        Ok(item)
    }

    /// Conditionally decrement stock. Returns `false` when stock was
    /// insufficient (no row matched), leaving the row untouched.
    ///
    /// The `stock >= $2` guard makes the check-then-decrement atomic;
    /// concurrent orders cannot both pass it for the same units.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn decrement_stock(
        conn: &mut PgConnection,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE products \
             SET stock = stock - $2, updated_at = NOW() \
             WHERE id = $1 AND stock >= $2",
        )
        .bind(product_id)
        .bind(quantity)
        .execute(conn)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Read a product's current stock inside an open transaction.
    ///
    /// Used for accurate error detail after a conditional decrement loses a
    /// race.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_stock(
        conn: &mut PgConnection,
        product_id: ProductId,
    ) -> Result<Option<i32>, RepositoryError> {
        let stock = sqlx::query_scalar::<_, i32>("SELECT stock FROM products WHERE id = $1")
            .bind(product_id)
            .fetch_optional(conn)
            .await?;

        Ok(stock)
    }

    /// Read an order's status with its row locked for the rest of the
    /// transaction. Concurrent status updates serialize here.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails, or
    /// `RepositoryError::DataCorruption` if the stored status is invalid.
    pub async fn get_status_for_update(
        conn: &mut PgConnection,
        order_id: OrderId,
    ) -> Result<Option<OrderStatus>, RepositoryError> {
        let status: Option<String> =
            sqlx::query_scalar::<_, String>("SELECT status FROM orders WHERE id = $1 FOR UPDATE")
                .bind(order_id)
                .fetch_optional(conn)
                .await?;

        status
            .map(|s| {
                OrderStatus::from_str(&s).map_err(|e| {
                    RepositoryError::DataCorruption(format!("invalid order status: {e}"))
                })
            })
            .transpose()
    }

    /// Write an order's status inside an open transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn set_status(
        conn: &mut PgConnection,
        order_id: OrderId,
        status: OrderStatus,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE orders SET status = $2, updated_at = NOW() WHERE id = $1")
            .bind(order_id)
            .bind(status.as_str())
            .execute(conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Slugs of the products on an order, for cache invalidation.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn item_slugs(
        conn: &mut PgConnection,
        order_id: OrderId,
    ) -> Result<Vec<String>, RepositoryError> {
        let slugs = sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT p.slug \
             FROM order_items oi \
             JOIN products p ON p.id = oi.product_id \
             WHERE oi.order_id = $1",
        )
        .bind(order_id)
        .fetch_all(conn)
        .await?;

        Ok(slugs)
    }

    /// Return every line item's quantity to product stock (cancellation).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn restock_items(
        conn: &mut PgConnection,
        order_id: OrderId,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "UPDATE products p \
             SET stock = p.stock + oi.quantity, updated_at = NOW() \
             FROM order_items oi \
             WHERE oi.order_id = $1 AND oi.product_id = p.id",
        )
        .bind(order_id)
        .execute(conn)
        .await?;

        Ok(())
    }
}
