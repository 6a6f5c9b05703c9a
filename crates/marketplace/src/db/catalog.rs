//! Catalog repository: categories and products.

use serde_json::Value;
use sqlx::PgPool;

use medsupply_core::{CategoryId, ProductId, SupplierId};

use super::{RepositoryError, like_pattern};
use crate::models::{
    Category, LowStockProduct, NewProduct, Product, ProductFilter, ProductListing, ProductUpdate,
};

/// Stock at or below this level counts as low.
pub const LOW_STOCK_THRESHOLD: i32 = 5;

const PRODUCT_COLUMNS: &str = "id, supplier_id, category_id, name, description, price, \
     original_price, stock_count, in_stock, image_url, specifications, features, rating, \
     review_count, created_at, updated_at";

const LISTING_SELECT: &str = r"
    SELECT p.id, p.supplier_id, p.category_id, p.name, p.description, p.price,
           p.original_price, p.stock_count, p.in_stock, p.image_url, p.specifications,
           p.features, p.rating, p.review_count, p.created_at, p.updated_at,
           c.name AS category_name,
           s.business_name AS supplier_business_name,
           s.rating AS supplier_rating,
           s.verification_status AS supplier_verification_status
    FROM products p
    JOIN categories c ON c.id = p.category_id
    JOIN suppliers s ON s.id = p.supplier_id
";

/// Repository for catalog database operations.
pub struct CatalogRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CatalogRepository<'a> {
    /// Create a new catalog repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List categories with the number of in-stock products in each.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let categories = sqlx::query_as::<_, Category>(
            r"
            SELECT c.id, c.name, c.description,
                   COUNT(p.id) FILTER (WHERE p.in_stock) AS product_count
            FROM categories c
            LEFT JOIN products p ON p.category_id = c.id
            GROUP BY c.id
            ORDER BY c.name
            ",
        )
        .fetch_all(self.pool)
        .await?;
        Ok(categories)
    }

    /// Whether a category exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn category_exists(&self, id: CategoryId) -> Result<bool, RepositoryError> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM categories WHERE id = $1)")
                .bind(id)
                .fetch_one(self.pool)
                .await?;
        Ok(exists)
    }

    /// List in-stock products, newest first.
    ///
    /// Search is a case-insensitive substring match on name or description.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_products(
        &self,
        filter: &ProductFilter,
    ) -> Result<Vec<ProductListing>, RepositoryError> {
        let sql = format!(
            "{LISTING_SELECT} \
             WHERE p.in_stock \
               AND ($1::uuid IS NULL OR p.category_id = $1) \
               AND ($2::uuid IS NULL OR p.supplier_id = $2) \
               AND ($3::text IS NULL OR p.name ILIKE $3 OR p.description ILIKE $3) \
             ORDER BY p.created_at DESC, p.id \
             LIMIT $4 OFFSET $5"
        );
        let products = sqlx::query_as::<_, ProductListing>(&sql)
            .bind(filter.category)
            .bind(filter.supplier)
            .bind(filter.search_term().map(like_pattern))
            .bind(filter.limit())
            .bind(filter.offset())
            .fetch_all(self.pool)
            .await?;
        Ok(products)
    }

    /// Get one product with its category and supplier, in stock or not.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_product(
        &self,
        id: ProductId,
    ) -> Result<Option<ProductListing>, RepositoryError> {
        let sql = format!("{LISTING_SELECT} WHERE p.id = $1");
        let product = sqlx::query_as::<_, ProductListing>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(product)
    }

    /// Insert a product for a supplier.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn create_product(
        &self,
        supplier_id: SupplierId,
        product: &NewProduct,
    ) -> Result<Product, RepositoryError> {
        let sql = format!(
            "INSERT INTO products (supplier_id, category_id, name, description, price, \
                original_price, stock_count, image_url, specifications, features) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING {PRODUCT_COLUMNS}"
        );
        let created = sqlx::query_as::<_, Product>(&sql)
            .bind(supplier_id)
            .bind(product.category_id)
            .bind(&product.name)
            .bind(&product.description)
            .bind(product.price.amount())
            .bind(product.original_price.map(|p| p.amount()))
            .bind(product.stock_count)
            .bind(&product.image_url)
            .bind(&product.specifications)
            .bind(&product.features)
            .fetch_one(self.pool)
            .await?;

        tracing::info!(product_id = %created.id, supplier_id = %supplier_id, "Product created");
        Ok(created)
    }

    /// Edit a product owned by `supplier_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist or
    /// belongs to another supplier.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn update_product(
        &self,
        id: ProductId,
        supplier_id: SupplierId,
        update: &ProductUpdate,
    ) -> Result<Product, RepositoryError> {
        let sql = format!(
            "UPDATE products SET \
                name = COALESCE($3, name), \
                description = COALESCE($4, description), \
                category_id = COALESCE($5, category_id), \
                price = COALESCE($6, price), \
                original_price = COALESCE($7, original_price), \
                stock_count = COALESCE($8, stock_count), \
                features = COALESCE($9, features), \
                specifications = COALESCE($10, specifications), \
                updated_at = NOW() \
             WHERE id = $1 AND supplier_id = $2 \
             RETURNING {PRODUCT_COLUMNS}"
        );
        sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .bind(supplier_id)
            .bind(update.name.as_deref().map(str::trim))
            .bind(&update.description)
            .bind(update.category_id)
            .bind(update.price)
            .bind(update.original_price)
            .bind(update.stock_count)
            .bind(&update.features)
            .bind(update.specifications.clone().map(Value::Object))
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Supplier that owns a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn product_owner(
        &self,
        id: ProductId,
    ) -> Result<Option<SupplierId>, RepositoryError> {
        let owner =
            sqlx::query_scalar::<_, SupplierId>("SELECT supplier_id FROM products WHERE id = $1")
                .bind(id)
                .fetch_optional(self.pool)
                .await?;
        Ok(owner)
    }

    /// Store a product's image URL.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist or
    /// belongs to another supplier.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn set_image_url(
        &self,
        id: ProductId,
        supplier_id: SupplierId,
        url: &str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE products SET image_url = $3, updated_at = NOW() \
             WHERE id = $1 AND supplier_id = $2",
        )
        .bind(id)
        .bind(supplier_id)
        .bind(url)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// A supplier's products at or below `LOW_STOCK_THRESHOLD`, lowest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn low_stock(
        &self,
        supplier_id: SupplierId,
    ) -> Result<Vec<LowStockProduct>, RepositoryError> {
        let products = sqlx::query_as::<_, LowStockProduct>(
            r"
            SELECT id, name, stock_count, in_stock, price, image_url
            FROM products
            WHERE supplier_id = $1 AND stock_count <= $2
            ORDER BY stock_count, name
            ",
        )
        .bind(supplier_id)
        .bind(LOW_STOCK_THRESHOLD)
        .fetch_all(self.pool)
        .await?;
        Ok(products)
    }
}
