//! Capabilities of the built-in destinations

use crate::orchestrator::capability::DestinationCapability;
use once_cell::sync::Lazy;

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Product center: search, inventory, pricing, shelving, categories
pub static PRODUCT_CENTER_CAPABILITY: Lazy<DestinationCapability> =
    Lazy::new(|| DestinationCapability {
        agent_type: "ProductCenterAgentManager".to_string(),
        description: "Product center manager for the e-commerce back office. Handles product \
                      search, inventory, pricing, shelving and unshelving, descriptions and \
                      categories."
            .to_string(),
        primary_domains: strings(&["Product Management", "Inventory Management", "Price Management"]),
        key_functions: strings(&[
            "Search and filter products",
            "Update inventory quantities (single or bulk)",
            "Set and update product prices (single or bulk)",
            "Publish products to shelf and unpublish them",
            "Edit product descriptions and categories",
            "Bulk product data updates",
        ]),
        example_commands: strings(&[
            "Search for coffee products",
            "Set the stock of JAN123456789 to 50",
            "Set the price of all coffee products to 1500 yen",
            "Unshelve every product that is out of stock",
            "Move product ABC123 to the beverages category",
        ]),
        collaboration_needs: strings(&[
            "OrderCenterAgentManager: when stock changes depend on open orders",
        ]),
    });

/// Order center: lookup, status changes, cancellations, item edits
pub static ORDER_CENTER_CAPABILITY: Lazy<DestinationCapability> =
    Lazy::new(|| DestinationCapability {
        agent_type: "OrderCenterAgentManager".to_string(),
        description: "Order center manager for the e-commerce back office. Handles order \
                      details and search, order/payment/shipping status changes, \
                      cancellations and order item modifications."
            .to_string(),
        primary_domains: strings(&[
            "Order Details",
            "Order Search",
            "Order Status",
            "Cancellations and Returns",
            "Order Items",
        ]),
        key_functions: strings(&[
            "Retrieve detailed order information by order ID",
            "Search orders by customer, status, amount or date",
            "Change order, payment and shipping status",
            "Cancel orders and process refunds",
            "Add, remove or change quantities of order items",
        ]),
        example_commands: strings(&[
            "Get the details of order ORD-12345678",
            "Find all paid orders over 10000 yen",
            "Mark order ORD-12345678 as shipped",
            "Cancel order ORD-87654321 and refund the customer",
            "Change the quantity of item 2 in order ORD-12345678 to 3",
        ]),
        collaboration_needs: strings(&[
            "ProductCenterAgentManager: when an order change affects product stock",
        ]),
    });
