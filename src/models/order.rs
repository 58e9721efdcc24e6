use sqlx::FromRow;
use chrono::{DateTime, Utc};

#[derive(Debug, FromRow)]
pub struct Order {
    pub id: i64,
    pub user_id: i64,
    pub order_number: String,
    pub total_order_value: f64,
    pub tracking_url: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}
