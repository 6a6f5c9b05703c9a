//! Catalog route handlers: categories, products and product images.

use axum::{extract::State, http::StatusCode};
use serde::Serialize;
use tracing::instrument;

use medsupply_core::{CategoryId, ProductId};

use crate::db::{CatalogRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::extract::{Json, Multipart, Path, Query};
use crate::middleware::{RequireSupplier, RequireVerifiedSupplier};
use crate::models::{Category, Product, ProductFilter, ProductInput, ProductListing, ProductUpdate};
use crate::services::uploads::{self, UploadForm, UploadKind};
use crate::state::AppState;

/// One page of the public product listing.
#[derive(Debug, Serialize)]
pub struct ProductPage {
    pub products: Vec<ProductListing>,
    pub limit: i64,
    pub offset: i64,
}

/// Image upload response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageResponse {
    pub path: String,
    pub public_url: String,
}

async fn ensure_category(catalog: &CatalogRepository<'_>, id: CategoryId) -> Result<()> {
    if catalog.category_exists(id).await? {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!("Unknown category {id}")))
    }
}

/// Categories with their in-stock product counts.
///
/// GET /api/categories
#[instrument(skip(state))]
pub async fn list_categories(State(state): State<AppState>) -> Result<Json<Vec<Category>>> {
    let categories = CatalogRepository::new(state.pool()).list_categories().await?;
    Ok(Json(categories))
}

/// Public, in-stock product listing.
///
/// GET /api/products?category=&supplier=&search=&limit=&offset=
#[instrument(skip(state))]
pub async fn list_products(
    State(state): State<AppState>,
    Query(filter): Query<ProductFilter>,
) -> Result<Json<ProductPage>> {
    let products = CatalogRepository::new(state.pool())
        .list_products(&filter)
        .await?;
    Ok(Json(ProductPage {
        products,
        limit: filter.limit(),
        offset: filter.offset(),
    }))
}

/// Product detail, in stock or not.
///
/// GET /api/products/{id}
#[instrument(skip(state))]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<ProductListing>> {
    CatalogRepository::new(state.pool())
        .get_product(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Product not found".to_owned()))
}

/// Create a product. Only verified suppliers may list products.
///
/// POST /api/products
#[instrument(skip(state, supplier, input), fields(supplier_id = %supplier.id))]
pub async fn create_product(
    State(state): State<AppState>,
    RequireVerifiedSupplier { supplier, .. }: RequireVerifiedSupplier,
    Json(input): Json<ProductInput>,
) -> Result<(StatusCode, Json<Vec<Product>>)> {
    let product = input.validate().map_err(AppError::BadRequest)?;

    let catalog = CatalogRepository::new(state.pool());
    ensure_category(&catalog, product.category_id).await?;

    let created = catalog.create_product(supplier.id, &product).await?;
    Ok((StatusCode::CREATED, Json(vec![created])))
}

/// Edit one of the caller's products.
///
/// PATCH /api/products/{id}
#[instrument(skip(state, supplier, update), fields(supplier_id = %supplier.id))]
pub async fn update_product(
    State(state): State<AppState>,
    RequireSupplier { supplier, .. }: RequireSupplier,
    Path(id): Path<ProductId>,
    Json(update): Json<ProductUpdate>,
) -> Result<Json<Product>> {
    update.validate().map_err(AppError::BadRequest)?;

    let catalog = CatalogRepository::new(state.pool());
    if let Some(category_id) = update.category_id {
        ensure_category(&catalog, category_id).await?;
    }

    match catalog.update_product(id, supplier.id, &update).await {
        Ok(product) => Ok(Json(product)),
        Err(RepositoryError::NotFound) => Err(AppError::NotFound("Product not found".to_owned())),
        Err(e) => Err(e.into()),
    }
}

/// Upload a product image and store its URL on the product.
///
/// POST /api/products/{id}/image (multipart field `image`)
#[instrument(skip(state, supplier, multipart), fields(supplier_id = %supplier.id))]
pub async fn upload_product_image(
    State(state): State<AppState>,
    RequireSupplier { supplier, .. }: RequireSupplier,
    Path(id): Path<ProductId>,
    Multipart(multipart): Multipart,
) -> Result<Json<ImageResponse>> {
    let catalog = CatalogRepository::new(state.pool());
    if catalog.product_owner(id).await? != Some(supplier.id) {
        return Err(AppError::NotFound("Product not found".to_owned()));
    }

    let form = UploadForm::read(multipart, "image").await?;
    let stored = uploads::store(
        state.storage(),
        &format!("products/{id}"),
        form.file,
        UploadKind::ProductImage,
    )
    .await?;

    catalog
        .set_image_url(id, supplier.id, &stored.public_url)
        .await?;

    Ok(Json(ImageResponse {
        path: stored.path,
        public_url: stored.public_url,
    }))
}
