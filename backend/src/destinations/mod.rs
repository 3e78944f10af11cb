//! Built-in destinations
//!
//! The default registration table: a product center and an order center,
//! both served by [`LlmDestinationHandler`].

pub mod catalog;
pub mod llm_handler;

use crate::orchestrator::handler::{Handler, HandlerConfig};
use crate::orchestrator::registry::DestinationRegistry;
use catalog::{ORDER_CENTER_CAPABILITY, PRODUCT_CENTER_CAPABILITY};
pub use llm_handler::LlmDestinationHandler;
use std::sync::Arc;

/// Product center destination identifier
pub const PRODUCT_CENTER: &str = "ProductCenterAgentManager";
/// Order center destination identifier
pub const ORDER_CENTER: &str = "OrderCenterAgentManager";

const PRODUCT_CENTER_PROMPT: &str = r#"You are the product center coordinator of an e-commerce back office, called by an upstream orchestrator.

You manage products: search and filtering, inventory quantities, prices, shelving and unshelving, descriptions and categories.

Rules:
- Execute the instruction you are given. Numbered instructions must be carried out in order.
- Use the result of the previous step when the instruction refers to earlier results (e.g. "the found products").
- Respond with a single JSON object. Always include a "message" field summarizing what was done.
- Put affected products in a "products" array when there are any.
- On failure, include an "error" field describing what went wrong."#;

const ORDER_CENTER_PROMPT: &str = r#"You are the order center coordinator of an e-commerce back office, called by an upstream orchestrator.

You manage orders: order details and search, order/payment/shipping status, cancellations and refunds, and order item modifications.

Order status: pending, confirmed, processing, shipped, delivered, cancelled
Payment status: unpaid, paid, refunded, partial_refund
Shipping status: not_shipped, preparing, shipped, in_transit, delivered

Rules:
- Execute the instruction you are given. Numbered instructions must be carried out in order.
- Use the result of the previous step when the instruction refers to earlier results.
- Respond with a single JSON object. Always include a "message" field summarizing what was done.
- Put affected orders in an "orders" array when there are any.
- On failure, include an "error" field describing what went wrong."#;

/// Registration table with the built-in destinations
///
/// The product center is registered first and is the default destination.
pub fn default_registry(config: HandlerConfig) -> DestinationRegistry {
    DestinationRegistry::builder()
        .register(PRODUCT_CENTER, PRODUCT_CENTER_CAPABILITY.clone(), |config| {
            Ok(Arc::new(LlmDestinationHandler::new(
                PRODUCT_CENTER,
                PRODUCT_CENTER_PROMPT,
                config,
            )) as Arc<dyn Handler>)
        })
        .register(ORDER_CENTER, ORDER_CENTER_CAPABILITY.clone(), |config| {
            Ok(Arc::new(LlmDestinationHandler::new(
                ORDER_CENTER,
                ORDER_CENTER_PROMPT,
                config,
            )) as Arc<dyn Handler>)
        })
        .build(config)
}
