//! Product catalog: product documents and stock adjustment.

mod service;

pub use service::CatalogService;

use common::{Money, ProductId};
use serde::{Deserialize, Serialize};

/// A product in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// The product identifier.
    pub id: ProductId,

    /// Display name.
    pub name: String,

    /// URL-friendly name, derived from `name` on creation.
    pub slug: String,

    /// List price.
    pub price: Money,

    /// Discounted price, if the product is on sale.
    #[serde(default)]
    pub sale_price: Option<Money>,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub category: Option<String>,

    #[serde(default)]
    pub brand: Option<String>,

    /// Product images; the first one is snapshotted onto order lines.
    #[serde(default)]
    pub images: Vec<String>,

    /// Units currently in stock. Never goes below zero.
    pub count_in_stock: u32,
}

impl Product {
    /// Creates a product with the given id, name, list price and stock.
    pub fn new(
        id: impl Into<ProductId>,
        name: impl Into<String>,
        price: Money,
        count_in_stock: u32,
    ) -> Self {
        let name = name.into();
        let slug = name.trim().to_lowercase().replace(' ', "-");
        Self {
            id: id.into(),
            name,
            slug,
            price,
            sale_price: None,
            description: String::new(),
            category: None,
            brand: None,
            images: Vec::new(),
            count_in_stock,
        }
    }

    /// Sets a sale price.
    pub fn with_sale_price(mut self, sale_price: Money) -> Self {
        self.sale_price = Some(sale_price);
        self
    }

    /// Sets the image list.
    pub fn with_images(mut self, images: Vec<String>) -> Self {
        self.images = images;
        self
    }

    /// The price a buyer pays right now: sale price if set, else list price.
    pub fn effective_price(&self) -> Money {
        self.sale_price.unwrap_or(self.price)
    }

    /// The first product image, if any.
    pub fn first_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effective_price_prefers_sale_price() {
        let product = Product::new("SKU-001", "Widget", Money::from_cents(1000), 5);
        assert_eq!(product.effective_price(), Money::from_cents(1000));

        let on_sale = product.with_sale_price(Money::from_cents(750));
        assert_eq!(on_sale.effective_price(), Money::from_cents(750));
    }

    #[test]
    fn slug_is_derived_from_name() {
        let product = Product::new("SKU-001", "Blue Ceramic Mug", Money::from_cents(900), 1);
        assert_eq!(product.slug, "blue-ceramic-mug");
    }

    #[test]
    fn first_image_is_optional() {
        let bare = Product::new("SKU-001", "Widget", Money::from_cents(1000), 5);
        assert_eq!(bare.first_image(), None);

        let with_images = Product::new("SKU-002", "Gadget", Money::from_cents(1000), 5)
            .with_images(vec!["a.jpg".to_string(), "b.jpg".to_string()]);
        assert_eq!(with_images.first_image(), Some("a.jpg"));
    }

    #[test]
    fn product_serialization_roundtrip() {
        let product = Product::new("SKU-001", "Widget", Money::from_cents(1000), 5)
            .with_sale_price(Money::from_cents(800));
        let json = serde_json::to_string(&product).unwrap();
        let back: Product = serde_json::from_str(&json).unwrap();
        assert_eq!(back, product);
    }
}
