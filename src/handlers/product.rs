// src/handlers/product.rs
use axum::{
    extract::{Path, State},
    Json,
};
use sqlx::{Error as SqlxError, PgPool};
use crate::dtos::product::{CreateProductRequest, ProductResponse};
use crate::models::product::Product;
use crate::state::AppState;
use crate::error::AppError;
use tracing::instrument;

const SELECT_PRODUCT: &str =
    "SELECT p.serial_number, p.product_id, p.name, p.design, p.sku, p.product_type,
            p.price_with_shipping::FLOAT8 AS price_with_shipping,
            p.sizes, p.is_visible,
            c.name AS category_name,
            sc.name AS subcategory_name
     FROM products p
     LEFT JOIN categories c ON p.category_id = c.id
     LEFT JOIN subcategories sc ON p.subcategory_id = sc.id";

fn map_unique_violation(err: SqlxError, message: &str) -> AppError {
    match err {
        SqlxError::Database(db_err) if db_err.code().as_deref() == Some("23505") => {
            AppError::conflict(message)
        }
        other => other.into(),
    }
}

async fn image_urls(db_pool: &PgPool, serial_number: i64) -> Result<Vec<String>, AppError> {
    let urls = sqlx::query_scalar::<_, Option<String>>(
        "SELECT image_url FROM product_images WHERE product_id = $1 ORDER BY id",
    )
    .bind(serial_number)
    .fetch_all(db_pool)
    .await?;

    Ok(urls.into_iter().flatten().collect())
}

async fn with_images(db_pool: &PgPool, products: Vec<Product>) -> Result<Vec<ProductResponse>, AppError> {
    let mut response = Vec::with_capacity(products.len());
    for product in products {
        let images = image_urls(db_pool, product.serial_number).await?;
        response.push(ProductResponse::from_product(product, images));
    }
    Ok(response)
}

// GET /products - List all visible products
#[instrument(skip(state))]
pub async fn list_products(
    State(state): State<AppState>,
) -> Result<Json<Vec<ProductResponse>>, AppError> {
    let products = sqlx::query_as::<_, Product>(&format!(
        "{SELECT_PRODUCT} WHERE p.is_visible = TRUE ORDER BY p.serial_number"
    ))
    .fetch_all(&state.db_pool)
    .await?;

    Ok(Json(with_images(&state.db_pool, products).await?))
}

// GET /products/{id} - Get single product by serial number
#[instrument(skip(state), fields(id))]
pub async fn get_product(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<ProductResponse>, AppError> {
    let product = sqlx::query_as::<_, Product>(&format!(
        "{SELECT_PRODUCT} WHERE p.serial_number = $1"
    ))
    .bind(id)
    .fetch_optional(&state.db_pool)
    .await?
    .ok_or_else(|| AppError::not_found("Product not found"))?;

    let images = image_urls(&state.db_pool, product.serial_number).await?;
    Ok(Json(ProductResponse::from_product(product, images)))
}

// POST /products - Create new product
#[instrument(skip(state, payload))]
pub async fn create_product(
    State(state): State<AppState>,
    Json(payload): Json<CreateProductRequest>,
) -> Result<(axum::http::StatusCode, Json<ProductResponse>), AppError> {
    if payload.name.trim().is_empty() {
        return Err(AppError::validation("Product name required"));
    }
    if payload.sku.trim().is_empty() {
        return Err(AppError::validation("SKU required"));
    }
    if payload.price_with_shipping < 0.0 {
        return Err(AppError::validation("Price cannot be negative"));
    }
    if payload.subcategory.is_some() && payload.category.is_none() {
        return Err(AppError::validation("Subcategory requires a category"));
    }

    let category_id = match &payload.category {
        Some(name) => Some(get_or_create_category(&state.db_pool, name).await?),
        None => None,
    };
    let subcategory_id = match (&payload.subcategory, category_id) {
        (Some(name), Some(category_id)) => {
            Some(get_or_create_subcategory(&state.db_pool, category_id, name).await?)
        }
        _ => None,
    };

    let serial_number = sqlx::query_scalar::<_, i64>(
        "INSERT INTO products
             (product_id, name, design, sku, product_type, price_with_shipping, sizes,
              category_id, subcategory_id, is_visible)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
         RETURNING serial_number",
    )
    .bind(&payload.product_id)
    .bind(payload.name.trim())
    .bind(&payload.design)
    .bind(payload.sku.trim())
    .bind(&payload.product_type)
    .bind(payload.price_with_shipping)
    .bind(&payload.sizes)
    .bind(category_id)
    .bind(subcategory_id)
    .bind(payload.is_visible.unwrap_or(true))
    .fetch_one(&state.db_pool)
    .await
    .map_err(|e| map_unique_violation(e, "SKU or product id already exists"))?;

    // Auto-generate the public product id from the serial when not supplied
    if payload.product_id.is_none() {
        sqlx::query(
            "UPDATE products SET product_id = 'PROD-' || serial_number WHERE serial_number = $1",
        )
        .bind(serial_number)
        .execute(&state.db_pool)
        .await?;
    }

    for url in payload.image_urls.iter().flatten() {
        sqlx::query("INSERT INTO product_images (product_id, image_url) VALUES ($1, $2)")
            .bind(serial_number)
            .bind(url.trim())
            .execute(&state.db_pool)
            .await?;
    }

    let product = sqlx::query_as::<_, Product>(&format!(
        "{SELECT_PRODUCT} WHERE p.serial_number = $1"
    ))
    .bind(serial_number)
    .fetch_one(&state.db_pool)
    .await?;

    let images = image_urls(&state.db_pool, serial_number).await?;
    Ok((
        axum::http::StatusCode::CREATED,
        Json(ProductResponse::from_product(product, images)),
    ))
}

// GET /products/category/{category} - Visible products in a category
#[instrument(skip(state), fields(category))]
pub async fn category_products(
    Path(category): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Vec<ProductResponse>>, AppError> {
    let category_id = find_category(&state.db_pool, &category).await?;

    let products = sqlx::query_as::<_, Product>(&format!(
        "{SELECT_PRODUCT} WHERE p.category_id = $1 AND p.is_visible = TRUE ORDER BY p.serial_number"
    ))
    .bind(category_id)
    .fetch_all(&state.db_pool)
    .await?;

    Ok(Json(with_images(&state.db_pool, products).await?))
}

// GET /products/category/{category}/{subcategory}
#[instrument(skip(state), fields(category, subcategory))]
pub async fn subcategory_products(
    Path((category, subcategory)): Path<(String, String)>,
    State(state): State<AppState>,
) -> Result<Json<Vec<ProductResponse>>, AppError> {
    let category_id = find_category(&state.db_pool, &category).await?;

    let subcategory_id = sqlx::query_scalar::<_, i64>(
        "SELECT id FROM subcategories WHERE category_id = $1 AND LOWER(name) = LOWER($2)",
    )
    .bind(category_id)
    .bind(&subcategory)
    .fetch_optional(&state.db_pool)
    .await?
    .ok_or_else(|| AppError::not_found("Subcategory not found"))?;

    let products = sqlx::query_as::<_, Product>(&format!(
        "{SELECT_PRODUCT} WHERE p.subcategory_id = $1 AND p.is_visible = TRUE ORDER BY p.serial_number"
    ))
    .bind(subcategory_id)
    .fetch_all(&state.db_pool)
    .await?;

    Ok(Json(with_images(&state.db_pool, products).await?))
}

// GET /products/related/{id} - Up to 10 products near the given one
#[instrument(skip(state), fields(id))]
pub async fn related_products(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<Vec<ProductResponse>>, AppError> {
    let product = sqlx::query_as::<_, RelatedSeed>(
        "SELECT category_id, subcategory_id, product_type, design
         FROM products WHERE serial_number = $1",
    )
    .bind(id)
    .fetch_optional(&state.db_pool)
    .await?
    .ok_or_else(|| AppError::not_found("Product not found"))?;

    // Match the first design keyword for relevance, when a design exists
    let design_keyword = product
        .design
        .as_deref()
        .and_then(|d| d.split_whitespace().next())
        .map(str::to_string);

    let products = sqlx::query_as::<_, Product>(&format!(
        "{SELECT_PRODUCT}
         WHERE p.serial_number <> $1
           AND p.category_id IS NOT DISTINCT FROM $2
           AND p.subcategory_id IS NOT DISTINCT FROM $3
           AND ($4::VARCHAR IS NULL OR p.product_type = $4)
           AND ($5::VARCHAR IS NULL OR p.design ILIKE '%' || $5 || '%')
           AND p.is_visible = TRUE
         ORDER BY p.serial_number
         LIMIT 10"
    ))
    .bind(id)
    .bind(product.category_id)
    .bind(product.subcategory_id)
    .bind(&product.product_type)
    .bind(&design_keyword)
    .fetch_all(&state.db_pool)
    .await?;

    Ok(Json(with_images(&state.db_pool, products).await?))
}

async fn find_category(db_pool: &PgPool, name: &str) -> Result<i64, AppError> {
    sqlx::query_scalar::<_, i64>("SELECT id FROM categories WHERE LOWER(name) = LOWER($1)")
        .bind(name)
        .fetch_optional(db_pool)
        .await?
        .ok_or_else(|| AppError::not_found("Category not found"))
}

async fn get_or_create_category(db_pool: &PgPool, name: &str) -> Result<i64, AppError> {
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO categories (name) VALUES ($1)
         ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
         RETURNING id",
    )
    .bind(name.trim())
    .fetch_one(db_pool)
    .await?;
    Ok(id)
}

async fn get_or_create_subcategory(
    db_pool: &PgPool,
    category_id: i64,
    name: &str,
) -> Result<i64, AppError> {
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO subcategories (category_id, name) VALUES ($1, $2)
         ON CONFLICT (name) DO UPDATE SET category_id = EXCLUDED.category_id
         RETURNING id",
    )
    .bind(category_id)
    .bind(name.trim())
    .fetch_one(db_pool)
    .await?;
    Ok(id)
}

#[derive(sqlx::FromRow)]
struct RelatedSeed {
    category_id: Option<i64>,
    subcategory_id: Option<i64>,
    product_type: Option<String>,
    design: Option<String>,
}
