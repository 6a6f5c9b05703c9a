//! Cart types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use medsupply_core::{CartItemId, ProductId, SupplierId};

/// Product fields shown alongside a cart line.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CartProduct {
    #[sqlx(rename = "product_id")]
    pub id: ProductId,
    #[sqlx(rename = "product_name")]
    pub name: String,
    pub price: Decimal,
    pub image_url: Option<String>,
    pub stock_count: i32,
    pub in_stock: bool,
    pub supplier_id: SupplierId,
    pub supplier_name: String,
}

/// One row of a user's cart with its product.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CartLine {
    pub id: CartItemId,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
    #[sqlx(flatten)]
    pub product: CartProduct,
}

impl CartLine {
    /// Current price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.product.price * Decimal::from(self.quantity)
    }
}

/// A user's cart.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Cart {
    pub items: Vec<CartLine>,
    /// Total units across all lines.
    pub item_count: i64,
    pub subtotal: Decimal,
}

impl From<Vec<CartLine>> for Cart {
    fn from(items: Vec<CartLine>) -> Self {
        let item_count = items.iter().map(|line| i64::from(line.quantity)).sum();
        let subtotal = items.iter().map(CartLine::line_total).sum();
        Self {
            items,
            item_count,
            subtotal,
        }
    }
}

/// Add-to-cart request.
#[derive(Debug, Clone, Deserialize)]
pub struct AddToCart {
    #[serde(alias = "productId")]
    pub product_id: ProductId,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
}

const fn default_quantity() -> i32 {
    1
}

/// Set-quantity request.
#[derive(Debug, Clone, Deserialize)]
pub struct SetQuantity {
    pub quantity: i32,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn line(price: i64, quantity: i32) -> CartLine {
        CartLine {
            id: CartItemId::generate(),
            quantity,
            created_at: Utc::now(),
            product: CartProduct {
                id: ProductId::generate(),
                name: "Surgical masks".to_string(),
                price: Decimal::new(price, 0),
                image_url: None,
                stock_count: 10,
                in_stock: true,
                supplier_id: SupplierId::generate(),
                supplier_name: "Afya Supplies".to_string(),
            },
        }
    }

    #[test]
    fn test_cart_totals() {
        let cart = Cart::from(vec![line(100, 2), line(50, 1)]);
        assert_eq!(cart.item_count, 3);
        assert_eq!(cart.subtotal, Decimal::new(250, 0));
    }

    #[test]
    fn test_empty_cart() {
        let cart = Cart::default();
        assert!(cart.items.is_empty());
        assert_eq!(cart.subtotal, Decimal::ZERO);
    }

    #[test]
    fn test_add_defaults_to_one() {
        let add: AddToCart =
            serde_json::from_str(r#"{"productId":"6a1f0e4c-2b55-4c1e-9a0e-3d1c8e2f7b90"}"#).unwrap();
        assert_eq!(add.quantity, 1);
    }
}
