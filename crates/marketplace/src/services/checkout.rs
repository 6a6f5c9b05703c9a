//! Checkout: turning cart lines into orders.
//!
//! Planning is pure: given the requested lines and the locked product rows it
//! merges duplicate lines, prices every line from the catalog, checks stock
//! and groups lines into one order per supplier. Placement runs the plan in a
//! single transaction: lock products, take stock, write orders and their
//! lines, and clear the cart when the cart was checked out.

use std::collections::{BTreeMap, HashMap};

use chrono::Utc;
use rand::seq::IndexedRandom;
use rust_decimal::Decimal;
use sqlx::PgPool;
use thiserror::Error;

use medsupply_core::{Price, ProductId, ProfileId, SupplierId};

use crate::db::RepositoryError;
use crate::db::orders;
use crate::models::{CheckoutLine, CreateOrderRequest, Order, OrderDetails, StockedProduct};

const ORDER_NUMBER_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const ORDER_NUMBER_SUFFIX_LEN: usize = 6;

/// Errors that can occur at checkout.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Nothing to order.
    #[error("No items to order")]
    Empty,

    /// Shipping address absent or blank.
    #[error("Shipping address is required")]
    MissingShippingAddress,

    /// Quantity below one.
    #[error("Invalid quantity for product {0}")]
    InvalidQuantity(ProductId),

    /// Product does not exist.
    #[error("Product {0} not found")]
    UnknownProduct(ProductId),

    /// Client saw a different price than the current one.
    #[error("Price for product {product_id} has changed to {expected}")]
    PriceMismatch {
        product_id: ProductId,
        expected: Decimal,
    },

    /// One supplier's order would not fit the order total column.
    #[error("Order total for supplier {supplier_id} exceeds {}", Price::MAX)]
    TotalTooLarge { supplier_id: SupplierId },

    /// Not enough units left.
    #[error("Insufficient stock for product {product_id} ({available} available)")]
    InsufficientStock {
        product_id: ProductId,
        available: i32,
    },

    /// Database operation failed.
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for CheckoutError {
    fn from(err: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(err))
    }
}

/// One priced line of a planned order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannedLine {
    pub product_id: ProductId,
    pub quantity: i32,
    pub unit_price: Decimal,
}

/// An order to be written for one supplier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedOrder {
    pub supplier_id: SupplierId,
    pub lines: Vec<PlannedLine>,
    pub total: Price,
}

impl PlannedOrder {
    /// Total units across all lines.
    #[must_use]
    pub fn units(&self) -> i64 {
        self.lines.iter().map(|l| i64::from(l.quantity)).sum()
    }
}

/// Price, check and group checkout lines.
///
/// Lines for the same product are merged. Every line is priced from
/// `catalog`; a client price that differs is rejected.
///
/// # Errors
///
/// Returns a `CheckoutError` describing the first line that cannot be ordered.
pub fn plan_orders(
    lines: &[CheckoutLine],
    catalog: &[StockedProduct],
) -> Result<Vec<PlannedOrder>, CheckoutError> {
    if lines.is_empty() {
        return Err(CheckoutError::Empty);
    }

    let mut merged: BTreeMap<ProductId, (i32, Vec<Decimal>)> = BTreeMap::new();
    for line in lines {
        if line.quantity < 1 {
            return Err(CheckoutError::InvalidQuantity(line.product_id));
        }
        let entry = merged.entry(line.product_id).or_insert((0, Vec::new()));
        entry.0 = entry
            .0
            .checked_add(line.quantity)
            .ok_or(CheckoutError::InvalidQuantity(line.product_id))?;
        entry.1.extend(line.client_price);
    }

    let products: HashMap<ProductId, &StockedProduct> =
        catalog.iter().map(|p| (p.id, p)).collect();

    let mut by_supplier: BTreeMap<SupplierId, PlannedOrder> = BTreeMap::new();
    for (product_id, (quantity, client_prices)) in merged {
        let product = products
            .get(&product_id)
            .ok_or(CheckoutError::UnknownProduct(product_id))?;

        if client_prices.iter().any(|p| *p != product.price) {
            return Err(CheckoutError::PriceMismatch {
                product_id,
                expected: product.price,
            });
        }
        if quantity > product.stock_count {
            return Err(CheckoutError::InsufficientStock {
                product_id,
                available: product.stock_count,
            });
        }

        let unit_price = Price::new(product.price).map_err(|e| {
            RepositoryError::DataCorruption(format!("product {product_id} price: {e}"))
        })?;
        let too_large = || CheckoutError::TotalTooLarge {
            supplier_id: product.supplier_id,
        };

        let order = by_supplier
            .entry(product.supplier_id)
            .or_insert_with(|| PlannedOrder {
                supplier_id: product.supplier_id,
                lines: Vec::new(),
                total: Price::ZERO,
            });
        let line_total = unit_price.times(quantity).map_err(|_| too_large())?;
        order.total = order
            .total
            .checked_add(line_total)
            .map_err(|_| too_large())?;
        order.lines.push(PlannedLine {
            product_id,
            quantity,
            unit_price: product.price,
        });
    }

    Ok(by_supplier.into_values().collect())
}

/// Generate an order number: `ORD-{unix millis}-{6 uppercase alphanumerics}`.
#[must_use]
pub fn generate_order_number() -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..ORDER_NUMBER_SUFFIX_LEN)
        .filter_map(|_| ORDER_NUMBER_CHARSET.choose(&mut rng))
        .map(|&b| char::from(b))
        .collect();
    format!("ORD-{}-{suffix}", Utc::now().timestamp_millis())
}

/// Place orders for a buyer, from explicit lines or from their cart.
///
/// Everything happens in one transaction; on any error nothing is written.
///
/// # Errors
///
/// Returns a validation variant for bad input,
/// `CheckoutError::InsufficientStock` when stock ran out, and
/// `CheckoutError::Repository` if the database fails (including an order
/// number collision, as `Conflict`).
pub async fn place_orders(
    pool: &PgPool,
    buyer_id: ProfileId,
    request: CreateOrderRequest,
) -> Result<Vec<Order>, CheckoutError> {
    let shipping_address = request
        .shipping_address
        .map(|s| s.trim().to_owned())
        .filter(|s| !s.is_empty())
        .ok_or(CheckoutError::MissingShippingAddress)?;
    let details = OrderDetails {
        shipping_address,
        payment_method: request.payment_method,
        notes: request.notes,
    };

    let mut tx = pool.begin().await?;

    let from_cart = request.items.is_none();
    let lines: Vec<CheckoutLine> = match &request.items {
        Some(items) => items.iter().map(CheckoutLine::from).collect(),
        None => orders::cart_lines(&mut *tx, buyer_id).await?,
    };
    if lines.is_empty() {
        return Err(CheckoutError::Empty);
    }

    let mut ids: Vec<ProductId> = lines.iter().map(|l| l.product_id).collect();
    ids.sort_unstable();
    ids.dedup();
    let catalog = orders::lock_products(&mut *tx, &ids).await?;

    let plan = plan_orders(&lines, &catalog)?;

    let mut placed = Vec::with_capacity(plan.len());
    for planned in &plan {
        let order = orders::insert_order(
            &mut *tx,
            &generate_order_number(),
            buyer_id,
            planned.supplier_id,
            planned.total.amount(),
            &details,
        )
        .await?;

        for line in &planned.lines {
            if !orders::take_stock(&mut *tx, line.product_id, line.quantity).await? {
                return Err(CheckoutError::InsufficientStock {
                    product_id: line.product_id,
                    available: 0,
                });
            }
            orders::insert_item(
                &mut *tx,
                order.id,
                line.product_id,
                line.quantity,
                line.unit_price,
            )
            .await?;
        }

        placed.push(order);
    }

    if from_cart {
        orders::clear_cart(&mut *tx, buyer_id).await?;
    }

    tx.commit().await?;

    tracing::info!(
        buyer_id = %buyer_id,
        orders = placed.len(),
        from_cart,
        "Orders placed"
    );
    Ok(placed)
}
