use sqlx::FromRow;

#[derive(Debug, FromRow)]
pub struct Product {
    pub serial_number: i64,
    pub product_id: Option<String>,
    pub name: String,
    pub design: Option<String>,
    pub sku: String,
    pub product_type: Option<String>,
    pub price_with_shipping: f64,
    pub sizes: Option<String>,
    pub is_visible: bool,
    pub category_name: Option<String>,
    pub subcategory_name: Option<String>,
}
