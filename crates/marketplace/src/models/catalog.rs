//! Catalog types: categories and products.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use medsupply_core::{CategoryId, Price, ProductId, SupplierId, SupplierVerificationStatus};

/// Default page size for product listings.
pub const DEFAULT_PAGE_SIZE: i64 = 20;
/// Largest page a client may request.
pub const MAX_PAGE_SIZE: i64 = 100;

/// A category with its count of in-stock products.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub description: Option<String>,
    pub product_count: i64,
}

/// A product row.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Product {
    pub id: ProductId,
    pub supplier_id: SupplierId,
    pub category_id: CategoryId,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub original_price: Option<Decimal>,
    pub stock_count: i32,
    pub in_stock: bool,
    pub image_url: Option<String>,
    pub specifications: Value,
    pub features: Vec<String>,
    pub rating: Decimal,
    pub review_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Category fields joined onto a product.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CategoryRef {
    #[sqlx(rename = "category_id")]
    pub id: CategoryId,
    #[sqlx(rename = "category_name")]
    pub name: String,
}

/// Supplier display fields joined onto a product.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct SupplierRef {
    #[sqlx(rename = "supplier_id")]
    pub id: SupplierId,
    #[sqlx(rename = "supplier_business_name")]
    pub business_name: String,
    #[sqlx(rename = "supplier_rating")]
    pub rating: Decimal,
    #[sqlx(rename = "supplier_verification_status")]
    pub verification_status: SupplierVerificationStatus,
}

/// A product with its category and supplier, as shown in listings.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ProductListing {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub product: Product,
    #[sqlx(flatten)]
    pub category: CategoryRef,
    #[sqlx(flatten)]
    pub supplier: SupplierRef,
}

/// Product listing filters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductFilter {
    pub category: Option<CategoryId>,
    pub supplier: Option<SupplierId>,
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl ProductFilter {
    /// Page size clamped to `1..=MAX_PAGE_SIZE`.
    #[must_use]
    pub fn limit(&self) -> i64 {
        self.limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }

    /// Non-negative offset.
    #[must_use]
    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }

    /// Trimmed search term, if any.
    #[must_use]
    pub fn search_term(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// Product creation request from a supplier.
///
/// Every field is optional at the wire level so missing ones can be reported
/// together.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductInput {
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(alias = "categoryId", alias = "category")]
    pub category_id: Option<CategoryId>,
    pub price: Option<Decimal>,
    #[serde(alias = "originalPrice")]
    pub original_price: Option<Decimal>,
    #[serde(alias = "stockCount")]
    pub stock_count: Option<i32>,
    #[serde(alias = "imageUrl")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub specifications: Map<String, Value>,
    pub dimensions: Option<String>,
    pub weight: Option<String>,
    pub material: Option<String>,
    pub warranty: Option<String>,
}

/// A validated product ready to insert.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub category_id: CategoryId,
    pub name: String,
    pub description: String,
    pub price: Price,
    pub original_price: Option<Price>,
    pub stock_count: i32,
    pub image_url: Option<String>,
    pub features: Vec<String>,
    pub specifications: Value,
}

impl ProductInput {
    /// Validate and normalise the request.
    ///
    /// Dimensions, weight, material and warranty are folded into the
    /// `specifications` object.
    ///
    /// # Errors
    ///
    /// Returns a client-facing message naming the missing or invalid fields.
    pub fn validate(self) -> Result<NewProduct, String> {
        let name = self.name.map(|s| s.trim().to_owned()).filter(|s| !s.is_empty());
        let description = self
            .description
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty());

        let (Some(name), Some(description), Some(category_id), Some(price), Some(stock_count)) =
            (name, description, self.category_id, self.price, self.stock_count)
        else {
            return Err(
                "Missing required fields: name, description, category, price and stock_count are required"
                    .to_string(),
            );
        };

        let price = Price::new(price).map_err(|e| format!("Invalid price: {e}"))?;
        let original_price = self
            .original_price
            .map(Price::new)
            .transpose()
            .map_err(|e| format!("Invalid original price: {e}"))?;
        if stock_count < 0 {
            return Err("stock_count cannot be negative".to_string());
        }

        let mut specifications = self.specifications;
        for (key, value) in [
            ("dimensions", self.dimensions),
            ("weight", self.weight),
            ("material", self.material),
            ("warranty", self.warranty),
        ] {
            if let Some(value) = value.map(|v| v.trim().to_owned()).filter(|v| !v.is_empty()) {
                specifications.insert(key.to_owned(), Value::String(value));
            }
        }

        Ok(NewProduct {
            category_id,
            name,
            description,
            price,
            original_price,
            stock_count,
            image_url: self.image_url,
            features: self
                .features
                .into_iter()
                .map(|f| f.trim().to_owned())
                .filter(|f| !f.is_empty())
                .collect(),
            specifications: Value::Object(specifications),
        })
    }
}

/// Partial product edit by its owning supplier.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(alias = "categoryId")]
    pub category_id: Option<CategoryId>,
    pub price: Option<Decimal>,
    #[serde(alias = "originalPrice")]
    pub original_price: Option<Decimal>,
    #[serde(alias = "stockCount")]
    pub stock_count: Option<i32>,
    pub features: Option<Vec<String>>,
    pub specifications: Option<Map<String, Value>>,
}

impl ProductUpdate {
    /// Check values that the database constraints would otherwise reject.
    ///
    /// # Errors
    ///
    /// Returns a client-facing message for the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.is_none()
            && self.description.is_none()
            && self.category_id.is_none()
            && self.price.is_none()
            && self.original_price.is_none()
            && self.stock_count.is_none()
            && self.features.is_none()
            && self.specifications.is_none()
        {
            return Err("No fields to update".to_string());
        }
        if let Some(price) = self.price {
            Price::new(price).map_err(|e| format!("Invalid price: {e}"))?;
        }
        if let Some(price) = self.original_price {
            Price::new(price).map_err(|e| format!("Invalid original price: {e}"))?;
        }
        if self.stock_count.is_some_and(|s| s < 0) {
            return Err("stock_count cannot be negative".to_string());
        }
        if self.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err("name cannot be empty".to_string());
        }
        Ok(())
    }
}

/// A product at or below the low-stock threshold.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct LowStockProduct {
    pub id: ProductId,
    pub name: String,
    pub stock_count: i32,
    pub in_stock: bool,
    pub price: Decimal,
    pub image_url: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn valid_input() -> ProductInput {
        ProductInput {
            name: Some("Nitrile Gloves (100)".to_string()),
            description: Some("Powder-free examination gloves".to_string()),
            category_id: Some(CategoryId::generate()),
            price: Some(Decimal::new(120_000, 2)),
            stock_count: Some(40),
            ..ProductInput::default()
        }
    }

    #[test]
    fn test_missing_required_fields() {
        let input = ProductInput {
            price: None,
            ..valid_input()
        };
        let err = input.validate().unwrap_err();
        assert!(err.starts_with("Missing required fields"));

        let input = ProductInput {
            name: Some("   ".to_string()),
            ..valid_input()
        };
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_spec_fields_fold_into_specifications() {
        let input = ProductInput {
            dimensions: Some("30 x 20 cm".to_string()),
            warranty: Some("2 years".to_string()),
            material: Some(String::new()),
            ..valid_input()
        };
        let product = input.validate().unwrap();
        assert_eq!(product.specifications["dimensions"], "30 x 20 cm");
        assert_eq!(product.specifications["warranty"], "2 years");
        assert!(product.specifications.get("material").is_none());
    }

    #[test]
    fn test_negative_values_rejected() {
        let input = ProductInput {
            price: Some(Decimal::new(-1, 0)),
            ..valid_input()
        };
        assert!(input.validate().unwrap_err().starts_with("Invalid price"));

        let input = ProductInput {
            stock_count: Some(-3),
            ..valid_input()
        };
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_price_must_fit_price_column() {
        let input = ProductInput {
            price: Some(Decimal::new(100_000_000_000, 0)),
            ..valid_input()
        };
        assert!(input.validate().unwrap_err().starts_with("Invalid price"));

        let update = ProductUpdate {
            price: Some(Decimal::new(100_000_000_000, 0)),
            ..ProductUpdate::default()
        };
        assert!(update.validate().unwrap_err().starts_with("Invalid price"));
    }

    #[test]
    fn test_input_accepts_camel_case_aliases() {
        let json = r#"{"name":"Syringe","description":"5ml","categoryId":"6a1f0e4c-2b55-4c1e-9a0e-3d1c8e2f7b90","price":"15.00","stockCount":500}"#;
        let input: ProductInput = serde_json::from_str(json).unwrap();
        assert_eq!(input.stock_count, Some(500));
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_filter_clamps_paging() {
        let filter = ProductFilter {
            limit: Some(10_000),
            offset: Some(-5),
            search: Some("  ".to_string()),
            ..ProductFilter::default()
        };
        assert_eq!(filter.limit(), MAX_PAGE_SIZE);
        assert_eq!(filter.offset(), 0);
        assert_eq!(filter.search_term(), None);
        assert_eq!(ProductFilter::default().limit(), DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn test_empty_update_rejected() {
        assert!(ProductUpdate::default().validate().is_err());
        let update = ProductUpdate {
            stock_count: Some(0),
            ..ProductUpdate::default()
        };
        assert!(update.validate().is_ok());
    }
}
