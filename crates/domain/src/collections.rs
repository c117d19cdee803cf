//! Names of the document collections used by the storefront.

/// Product catalog documents, keyed by product id.
pub const PRODUCTS: &str = "products";

/// Cart documents, keyed by the owning user's id.
pub const CARTS: &str = "carts";

/// Order documents, keyed by order id.
pub const ORDERS: &str = "orders";
