pub mod client;
pub mod payload;
pub mod token;

pub use client::{FulfillmentClient, FulfillmentError};
pub use payload::{AddOn, LineItem, OrderPayload, ShippingAddress, ORDER_CREATED_MESSAGE};
pub use token::TokenCache;
