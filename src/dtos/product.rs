// src/dtos/product.rs
use serde::{Deserialize, Serialize};

use crate::models::product::Product;

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub product_id: Option<String>,
    pub name: String,
    pub design: Option<String>,
    pub sku: String,
    pub product_type: Option<String>,
    pub price_with_shipping: f64,
    pub sizes: Option<String>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub image_urls: Option<Vec<String>>,
    pub is_visible: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub serial_number: i64,
    pub product_id: Option<String>,
    pub name: String,
    pub design: Option<String>,
    pub sku: String,
    pub product_type: Option<String>,
    pub price_with_shipping: f64,
    pub sizes: Option<String>,
    pub category_name: Option<String>,
    pub subcategory_name: Option<String>,
    pub images: Vec<String>,
}

impl ProductResponse {
    // Images come from a separate query; the rest maps off the joined row.
    pub fn from_product(product: Product, images: Vec<String>) -> Self {
        Self {
            serial_number: product.serial_number,
            product_id: product.product_id,
            name: product.name,
            design: product.design,
            sku: product.sku,
            product_type: product.product_type,
            price_with_shipping: product.price_with_shipping,
            sizes: product.sizes,
            category_name: product.category_name,
            subcategory_name: product.subcategory_name,
            images,
        }
    }
}
