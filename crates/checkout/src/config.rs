//! Checkout configuration loaded from environment variables.

use common::Money;

/// Pricing configuration for order composition.
///
/// Reads from environment variables:
/// - `TAX_RATE` — tax fraction applied to the subtotal (default: `0.0`)
/// - `SHIPPING_FLAT` — flat shipping fee in currency units, regardless of
///   cart size (default: `0.0`)
/// - `CURRENCY` — ISO currency code passed to the gateway (default: `"usd"`)
#[derive(Debug, Clone)]
pub struct CheckoutConfig {
    pub tax_rate: f64,
    pub shipping_flat: Money,
    pub currency: String,
}

impl CheckoutConfig {
    /// Creates a config from explicit values.
    pub fn new(tax_rate: f64, shipping_flat: Money, currency: impl Into<String>) -> Self {
        Self {
            tax_rate,
            shipping_flat,
            currency: currency.into(),
        }
    }

    /// Loads configuration from environment variables, falling back to
    /// defaults.
    pub fn from_env() -> Self {
        let tax_rate = std::env::var("TAX_RATE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(0.0);

        let shipping_flat = std::env::var("SHIPPING_FLAT")
            .ok()
            .and_then(|v| v.parse::<f64>().ok())
            .map_or_else(Money::zero, |units| {
                #[allow(clippy::cast_possible_truncation)]
                Money::from_cents((units * 100.0).round() as i64)
            });

        let currency = std::env::var("CURRENCY").unwrap_or_else(|_| "usd".to_string());

        Self {
            tax_rate,
            shipping_flat,
            currency,
        }
    }
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            tax_rate: 0.0,
            shipping_flat: Money::zero(),
            currency: "usd".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_charges_nothing_extra() {
        let config = CheckoutConfig::default();
        assert_eq!(config.tax_rate, 0.0);
        assert_eq!(config.shipping_flat, Money::zero());
        assert_eq!(config.currency, "usd");
    }

    #[test]
    fn new_keeps_explicit_values() {
        let config = CheckoutConfig::new(0.05, Money::from_cents(500), "eur");
        assert_eq!(config.tax_rate, 0.05);
        assert_eq!(config.shipping_flat, Money::from_cents(500));
        assert_eq!(config.currency, "eur");
    }
}
