use sqlx::FromRow;

/// One cart row joined with its product, as consumed by the cart view and the
/// order placement workflow.
#[derive(Debug, Clone, FromRow)]
pub struct CartLine {
    pub serial_number: i64,
    pub name: String,
    pub sku: String,
    pub unit_price: f64,
    pub sizes: Option<String>,
    pub quantity: i32,
}

impl CartLine {
    pub fn line_total(&self) -> f64 {
        f64::from(self.quantity) * self.unit_price
    }
}
