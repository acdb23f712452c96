use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A product line in the cart, as the cart listing reports it
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,

    #[serde(default)]
    pub product_name: String,

    #[serde(default)]
    pub count: u32,

    /// Unit price
    #[serde(default)]
    pub price: Decimal,

    /// Line price (unit price * count, after discounts)
    #[serde(default)]
    pub total_price: Decimal,

    #[serde(default)]
    pub origin_price: Decimal,

    /// Opaque size selections, echoed back verbatim on checkout
    #[serde(default)]
    pub sizes: Vec<serde_json::Value>,
}

/// Selectable cart contents
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    pub products: Vec<Product>,

    /// Signature of the parent order the cart belongs to; echoed in the payment order
    #[serde(default)]
    pub parent_order_sign: String,
}

impl Cart {
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn total_count(&self) -> u32 {
        self.products.iter().map(|p| p.count).sum()
    }
}

/// Which cart lines are settled at checkout
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CartMode {
    /// All valid products, excluding add-on purchases
    Available,
    /// Every checked product, including add-on purchases
    All,
}

impl CartMode {
    pub fn code(&self) -> i32 {
        match self {
            CartMode::Available => 1,
            CartMode::All => 2,
        }
    }
}

impl Default for CartMode {
    fn default() -> Self {
        CartMode::All
    }
}

impl std::str::FromStr for CartMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "available" => Ok(CartMode::Available),
            "all" => Ok(CartMode::All),
            other => Err(format!("unknown cart mode: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_decodes_string_prices() {
        let json = r#"{
            "id": "p-1",
            "product_name": "eggs",
            "count": 2,
            "price": "4.50",
            "total_price": "9.00",
            "origin_price": "5.00",
            "sizes": []
        }"#;

        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.count, 2);
        assert_eq!(product.total_price, Decimal::new(900, 2));
        assert_eq!(product.total_price.to_string(), "9.00");
    }

    #[test]
    fn test_cart_mode_parsing() {
        assert_eq!("all".parse::<CartMode>().unwrap(), CartMode::All);
        assert_eq!("Available".parse::<CartMode>().unwrap(), CartMode::Available);
        assert!("everything".parse::<CartMode>().is_err());
        assert_eq!(CartMode::default().code(), 2);
    }
}
