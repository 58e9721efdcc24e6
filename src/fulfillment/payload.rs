//! Wire shapes for the provider's order-creation API. Numeric fields travel
//! as strings because that is what the endpoint accepts.

use serde::Serialize;

use crate::models::cart::CartLine;

/// Exact success message returned by the provider's order endpoint.
pub const ORDER_CREATED_MESSAGE: &str = "Order created successfully";

#[derive(Debug, Serialize)]
pub struct OrderPayload {
    pub order_number: String,
    /// "1" = the provider handles shipping.
    pub qikink_shipping: String,
    /// "COD" or "PREPAID".
    pub gateway: String,
    pub total_order_value: String,
    pub line_items: Vec<LineItem>,
    pub add_ons: Vec<AddOn>,
    pub shipping_address: ShippingAddress,
}

#[derive(Debug, Serialize)]
pub struct LineItem {
    /// 1 = resolve the SKU against products already registered upstream.
    pub search_from_my_products: u8,
    pub sku: String,
    pub quantity: String,
    pub price: String,
    /// Empty when ordering existing SKUs.
    pub designs: Vec<serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub struct AddOn {
    pub box_packing: u8,
    pub gift_wrap: u8,
    pub rush_order: u8,
    pub custom_letter: String,
}

impl Default for AddOn {
    fn default() -> Self {
        Self {
            box_packing: 1,
            gift_wrap: 0,
            rush_order: 0,
            custom_letter: String::new(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ShippingAddress {
    pub first_name: String,
    pub last_name: String,
    pub address1: String,
    pub phone: String,
    pub email: String,
    pub city: String,
    pub zip: String,
    pub province: String,
    pub country_code: String,
}

pub fn format_money(value: f64) -> String {
    format!("{value:.2}")
}

/// Provider line items for a cart, plus the summed order value. Each line's
/// price is quantity × unit price at the moment of placement.
pub fn build_line_items(lines: &[CartLine]) -> (Vec<LineItem>, f64) {
    let mut total = 0.0;
    let items = lines
        .iter()
        .map(|line| {
            let line_total = line.line_total();
            total += line_total;
            LineItem {
                search_from_my_products: 1,
                sku: line.sku.clone(),
                quantity: line.quantity.to_string(),
                price: format_money(line_total),
                designs: Vec::new(),
            }
        })
        .collect();
    (items, total)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(sku: &str, quantity: i32, unit_price: f64) -> CartLine {
        CartLine {
            serial_number: 1,
            name: format!("Product {sku}"),
            sku: sku.to_string(),
            unit_price,
            sizes: None,
            quantity,
        }
    }

    #[test]
    fn totals_sum_quantity_times_unit_price() {
        let (items, total) = build_line_items(&[line("SKU-A", 2, 100.0), line("SKU-B", 1, 50.0)]);
        assert_eq!(items.len(), 2);
        assert_eq!(total, 250.0);
        assert_eq!(format_money(total), "250.00");
    }

    #[test]
    fn line_prices_are_quantity_scaled_strings() {
        let (items, _) = build_line_items(&[line("SKU-A", 3, 19.5)]);
        assert_eq!(items[0].quantity, "3");
        assert_eq!(items[0].price, "58.50");
        assert_eq!(items[0].search_from_my_products, 1);
        assert!(items[0].designs.is_empty());
    }

    #[test]
    fn empty_cart_builds_no_items_and_zero_total() {
        let (items, total) = build_line_items(&[]);
        assert!(items.is_empty());
        assert_eq!(total, 0.0);
    }

    #[test]
    fn payload_serializes_with_provider_field_names() {
        let (line_items, total) = build_line_items(&[line("SKU-A", 1, 10.0)]);
        let payload = OrderPayload {
            order_number: "ord-1".to_string(),
            qikink_shipping: "1".to_string(),
            gateway: "COD".to_string(),
            total_order_value: format_money(total),
            line_items,
            add_ons: vec![AddOn::default()],
            shipping_address: ShippingAddress {
                first_name: "Test".to_string(),
                last_name: String::new(),
                address1: "123 Test Street".to_string(),
                phone: "+919876543210".to_string(),
                email: "test@example.com".to_string(),
                city: "TestCity".to_string(),
                zip: "12345".to_string(),
                province: "TS".to_string(),
                country_code: "IN".to_string(),
            },
        };

        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["qikink_shipping"], "1");
        assert_eq!(value["total_order_value"], "10.00");
        assert_eq!(value["line_items"][0]["sku"], "SKU-A");
        assert_eq!(value["add_ons"][0]["box_packing"], 1);
        assert_eq!(value["shipping_address"]["country_code"], "IN");
    }
}
