//! Order repository.
//!
//! Reads go through [`OrderRepository`]. Checkout writes are free functions
//! over a connection so the caller can run them inside one transaction.

use std::collections::HashMap;

use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use medsupply_core::{OrderId, OrderStatus, PaymentStatus, ProductId, ProfileId, SupplierId};

use super::RepositoryError;
use crate::models::{
    CheckoutLine, Order, OrderDetails, OrderItemDetail, OrderScope, OrderView, StockedProduct,
};

const ORDER_COLUMNS: &str = "id, order_number, buyer_id, supplier_id, total_amount, \
     shipping_address, payment_method, notes, status, payment_status, created_at, updated_at";

const VIEW_SELECT: &str = r"
    SELECT o.id, o.order_number, o.buyer_id, o.supplier_id, o.total_amount,
           o.shipping_address, o.payment_method, o.notes, o.status, o.payment_status,
           o.created_at, o.updated_at,
           b.full_name AS buyer_name, b.email AS buyer_email,
           s.business_name AS supplier_name
    FROM orders o
    JOIN profiles b ON b.id = o.buyer_id
    JOIN suppliers s ON s.id = o.supplier_id
";

/// Repository for order reads and status changes.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Orders visible in `scope`, newest first, with their lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list(&self, scope: OrderScope) -> Result<Vec<OrderView>, RepositoryError> {
        let (buyer, supplier) = match scope {
            OrderScope::Buyer(id) => (Some(id), None),
            OrderScope::Supplier(id) => (None, Some(id)),
            OrderScope::All => (None, None),
        };

        let sql = format!(
            "{VIEW_SELECT} \
             WHERE ($1::uuid IS NULL OR o.buyer_id = $1) \
               AND ($2::uuid IS NULL OR o.supplier_id = $2) \
             ORDER BY o.created_at DESC, o.id"
        );
        let mut orders = sqlx::query_as::<_, OrderView>(&sql)
            .bind(buyer)
            .bind(supplier)
            .fetch_all(self.pool)
            .await?;

        self.attach_items(&mut orders).await?;
        Ok(orders)
    }

    /// One order with its lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get(&self, id: OrderId) -> Result<Option<OrderView>, RepositoryError> {
        let sql = format!("{VIEW_SELECT} WHERE o.id = $1");
        let Some(order) = sqlx::query_as::<_, OrderView>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?
        else {
            return Ok(None);
        };

        let mut orders = vec![order];
        self.attach_items(&mut orders).await?;
        Ok(orders.pop())
    }

    async fn attach_items(&self, orders: &mut [OrderView]) -> Result<(), RepositoryError> {
        if orders.is_empty() {
            return Ok(());
        }

        let ids: Vec<Uuid> = orders.iter().map(|o| o.order.id.as_uuid()).collect();
        let items = sqlx::query_as::<_, OrderItemDetail>(
            r"
            SELECT oi.id, oi.order_id, oi.product_id, oi.quantity, oi.price,
                   p.name AS product_name, p.image_url
            FROM order_items oi
            JOIN products p ON p.id = oi.product_id
            WHERE oi.order_id = ANY($1)
            ORDER BY oi.created_at, oi.id
            ",
        )
        .bind(ids)
        .fetch_all(self.pool)
        .await?;

        let mut by_order: HashMap<OrderId, Vec<OrderItemDetail>> = HashMap::new();
        for item in items {
            by_order.entry(item.order_id).or_default().push(item);
        }
        for order in orders {
            order.items = by_order.remove(&order.order.id).unwrap_or_default();
        }
        Ok(())
    }

    /// Change status and/or payment status, provided the order is still in
    /// `expected` status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the order changed status
    /// concurrently or no longer exists.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn update_status(
        &self,
        id: OrderId,
        expected: OrderStatus,
        status: Option<OrderStatus>,
        payment_status: Option<PaymentStatus>,
    ) -> Result<Order, RepositoryError> {
        let sql = format!(
            "UPDATE orders SET \
                status = COALESCE($3, status), \
                payment_status = COALESCE($4, payment_status), \
                updated_at = NOW() \
             WHERE id = $1 AND status = $2 \
             RETURNING {ORDER_COLUMNS}"
        );
        let order = sqlx::query_as::<_, Order>(&sql)
            .bind(id)
            .bind(expected)
            .bind(status)
            .bind(payment_status)
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| RepositoryError::Conflict("order status changed".to_owned()))?;
        Ok(order)
    }
}

/// Lock the named products and read their current price and stock.
///
/// Rows are locked in ID order.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn lock_products(
    conn: &mut PgConnection,
    ids: &[ProductId],
) -> Result<Vec<StockedProduct>, RepositoryError> {
    let ids: Vec<Uuid> = ids.iter().map(ProductId::as_uuid).collect();
    let products = sqlx::query_as::<_, StockedProduct>(
        r"
        SELECT id, supplier_id, name, price, stock_count
        FROM products
        WHERE id = ANY($1)
        ORDER BY id
        FOR UPDATE
        ",
    )
    .bind(ids)
    .fetch_all(conn)
    .await?;
    Ok(products)
}

/// Read a buyer's cart as checkout lines, locking the rows.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn cart_lines(
    conn: &mut PgConnection,
    buyer_id: ProfileId,
) -> Result<Vec<CheckoutLine>, RepositoryError> {
    let rows = sqlx::query_as::<_, (ProductId, i32)>(
        "SELECT product_id, quantity FROM cart_items WHERE user_id = $1 ORDER BY created_at FOR UPDATE",
    )
    .bind(buyer_id)
    .fetch_all(conn)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(product_id, quantity)| CheckoutLine {
            product_id,
            quantity,
            client_price: None,
        })
        .collect())
}

/// Take `quantity` units from stock if at least that many remain.
///
/// Returns whether the stock was taken.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn take_stock(
    conn: &mut PgConnection,
    product_id: ProductId,
    quantity: i32,
) -> Result<bool, RepositoryError> {
    let result = sqlx::query(
        "UPDATE products SET stock_count = stock_count - $2, updated_at = NOW() \
         WHERE id = $1 AND stock_count >= $2",
    )
    .bind(product_id)
    .bind(quantity)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() == 1)
}

/// Insert an order header.
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` if the order number is already taken.
/// Returns `RepositoryError::Database` for other database errors.
pub async fn insert_order(
    conn: &mut PgConnection,
    order_number: &str,
    buyer_id: ProfileId,
    supplier_id: SupplierId,
    total_amount: Decimal,
    details: &OrderDetails,
) -> Result<Order, RepositoryError> {
    let sql = format!(
        "INSERT INTO orders (order_number, buyer_id, supplier_id, total_amount, \
            shipping_address, payment_method, notes) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) \
         RETURNING {ORDER_COLUMNS}"
    );
    sqlx::query_as::<_, Order>(&sql)
        .bind(order_number)
        .bind(buyer_id)
        .bind(supplier_id)
        .bind(total_amount)
        .bind(&details.shipping_address)
        .bind(&details.payment_method)
        .bind(&details.notes)
        .fetch_one(conn)
        .await
        .map_err(|e| RepositoryError::on_unique_violation(e, "order number already in use"))
}

/// Insert one order line with its unit price snapshot.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn insert_item(
    conn: &mut PgConnection,
    order_id: OrderId,
    product_id: ProductId,
    quantity: i32,
    price: Decimal,
) -> Result<(), RepositoryError> {
    sqlx::query(
        "INSERT INTO order_items (order_id, product_id, quantity, price) VALUES ($1, $2, $3, $4)",
    )
    .bind(order_id)
    .bind(product_id)
    .bind(quantity)
    .bind(price)
    .execute(conn)
    .await?;
    Ok(())
}

/// Empty a buyer's cart.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn clear_cart(conn: &mut PgConnection, buyer_id: ProfileId) -> Result<(), RepositoryError> {
    sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
        .bind(buyer_id)
        .execute(conn)
        .await?;
    Ok(())
}
