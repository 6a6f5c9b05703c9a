//! Order types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use medsupply_core::{
    OrderId, OrderItemId, OrderStatus, PaymentStatus, ProductId, ProfileId, SupplierId,
};

/// An order row.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Order {
    pub id: OrderId,
    pub order_number: String,
    pub buyer_id: ProfileId,
    pub supplier_id: SupplierId,
    pub total_amount: Decimal,
    pub shipping_address: String,
    pub payment_method: Option<String>,
    pub notes: Option<String>,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An order line with its product's display fields.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OrderItemDetail {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: i32,
    /// Unit price at the time the order was placed.
    pub price: Decimal,
    pub product_name: String,
    pub image_url: Option<String>,
}

/// An order with buyer and supplier display fields and its lines.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OrderView {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub order: Order,
    pub buyer_name: Option<String>,
    pub buyer_email: String,
    pub supplier_name: String,
    #[sqlx(skip)]
    pub items: Vec<OrderItemDetail>,
}

/// Which orders a caller may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderScope {
    /// Orders placed by this buyer.
    Buyer(ProfileId),
    /// Orders addressed to this supplier.
    Supplier(SupplierId),
    /// Every order (admins).
    All,
}

/// One requested line at checkout.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderLineRequest {
    #[serde(alias = "productId")]
    pub product_id: ProductId,
    pub quantity: i32,
    /// Price the client saw. Checked against the current product price.
    pub price: Option<Decimal>,
}

/// Checkout request.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrderRequest {
    /// Explicit lines. When absent the caller's cart is checked out.
    pub items: Option<Vec<OrderLineRequest>>,
    #[serde(alias = "shippingAddress")]
    pub shipping_address: Option<String>,
    #[serde(alias = "paymentMethod")]
    pub payment_method: Option<String>,
    pub notes: Option<String>,
}

/// Status change request. At least one field must be set.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: Option<String>,
    #[serde(alias = "paymentStatus")]
    pub payment_status: Option<String>,
}

/// A line to be priced and checked at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckoutLine {
    pub product_id: ProductId,
    pub quantity: i32,
    /// Price the client expects, if it sent one.
    pub client_price: Option<Decimal>,
}

impl From<&OrderLineRequest> for CheckoutLine {
    fn from(line: &OrderLineRequest) -> Self {
        Self {
            product_id: line.product_id,
            quantity: line.quantity,
            client_price: line.price,
        }
    }
}

/// Current price and stock of a product, read under lock at checkout.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct StockedProduct {
    pub id: ProductId,
    pub supplier_id: SupplierId,
    pub name: String,
    pub price: Decimal,
    pub stock_count: i32,
}

/// Shipping and payment details shared by every order of one checkout.
#[derive(Debug, Clone)]
pub struct OrderDetails {
    pub shipping_address: String,
    pub payment_method: Option<String>,
    pub notes: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_checkout_request_accepts_camel_case() {
        let json = r#"{
            "items": [{"productId": "6a1f0e4c-2b55-4c1e-9a0e-3d1c8e2f7b90", "quantity": 2, "price": "100.00"}],
            "shippingAddress": "Kenyatta Avenue, Nairobi"
        }"#;
        let req: CreateOrderRequest = serde_json::from_str(json).unwrap();
        let items = req.items.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].price, Some(Decimal::new(100, 0)));
        assert_eq!(req.shipping_address.as_deref(), Some("Kenyatta Avenue, Nairobi"));
    }

    #[test]
    fn test_cart_checkout_has_no_items() {
        let req: CreateOrderRequest =
            serde_json::from_str(r#"{"shipping_address":"Moi Avenue, Mombasa"}"#).unwrap();
        assert!(req.items.is_none());
    }
}
