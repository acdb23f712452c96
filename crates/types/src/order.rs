use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{PayType, Product, ReserveTime, WindowBounds};

/// Below this price the order pays freight
pub const FREE_FREIGHT_THRESHOLD: Decimal = Decimal::from_parts(39, 0, 0, false, 0);

/// Flat freight charged (and discounted) on every order
pub const FREIGHT_MONEY: Decimal = Decimal::from_parts(500, 0, 0, false, 2);

const ZERO_MONEY: Decimal = Decimal::from_parts(0, 0, 0, false, 2);

/// Confirmed checkout contents together with the authoritative total
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub products: Vec<Product>,

    /// Total computed by the platform's order check
    pub price: Decimal,
}

/// Product entry as it appears inside a package
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PackageProduct {
    pub id: String,
    pub total_money: Decimal,
    pub total_origin_money: Decimal,
    pub count: u32,
    pub price: Decimal,
    pub instant_rebate_money: Decimal,
    pub origin_price: Decimal,
    pub sizes: Vec<serde_json::Value>,
}

impl From<&Product> for PackageProduct {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.clone(),
            total_money: product.total_price,
            total_origin_money: product.origin_price,
            count: product.count,
            price: product.price,
            instant_rebate_money: ZERO_MONEY,
            origin_price: product.origin_price,
            sizes: product.sizes.clone(),
        }
    }
}

/// One shipment of the order
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Package {
    pub products: Vec<PackageProduct>,
    pub package_id: u32,
    pub package_type: u32,
    pub first_selected_big_time: String,
    pub eta_trace_id: String,
    pub soon_arrival: u32,
    pub reserved_time_start: i64,
    pub reserved_time_end: i64,
}

impl Package {
    /// The single default package wrapping every product
    pub fn single(products: &[Product]) -> Self {
        Self {
            products: products.iter().map(PackageProduct::from).collect(),
            package_id: 1,
            package_type: 1,
            first_selected_big_time: "0".to_string(),
            eta_trace_id: String::new(),
            soon_arrival: 0,
            reserved_time_start: 0,
            reserved_time_end: 0,
        }
    }
}

/// Payment half of a package order; carries the reservation window and price
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PaymentOrder {
    pub reserved_time_start: i64,
    pub reserved_time_end: i64,
    pub freight_discount_money: Decimal,
    pub freight_money: Decimal,
    pub order_freight: Decimal,
    pub address_id: String,
    pub used_point_num: u32,
    pub parent_order_sign: String,
    pub pay_type: i32,
    pub order_type: u32,
    pub is_use_balance: u32,
    pub receipt_without_sku: String,
    pub price: Decimal,
}

/// Inputs that shape a package order besides the order itself
#[derive(Clone, Debug)]
pub struct PackageOrderContext<'a> {
    pub address_id: &'a str,
    pub parent_order_sign: &'a str,
    pub pay_type: PayType,
}

/// The structure submitted to claim a reservation window
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PackageOrder {
    pub packages: Vec<Package>,
    pub payment_order: PaymentOrder,
}

impl PackageOrder {
    /// Build a package order from a freshly priced order, unbound to any window
    pub fn generate(order: &Order, ctx: &PackageOrderContext<'_>) -> Self {
        let order_freight = if order.price < FREE_FREIGHT_THRESHOLD {
            FREIGHT_MONEY
        } else {
            ZERO_MONEY
        };

        Self {
            packages: vec![Package::single(&order.products)],
            payment_order: PaymentOrder {
                reserved_time_start: 0,
                reserved_time_end: 0,
                freight_discount_money: FREIGHT_MONEY,
                freight_money: FREIGHT_MONEY,
                order_freight,
                address_id: ctx.address_id.to_string(),
                used_point_num: 0,
                parent_order_sign: ctx.parent_order_sign.to_string(),
                pay_type: ctx.pay_type.code(),
                order_type: 1,
                is_use_balance: 0,
                receipt_without_sku: "1".to_string(),
                price: order.price,
            },
        }
    }

    /// Rebuild from a re-priced order, keeping whatever window `self` was bound to
    pub fn regenerate(&self, order: &Order, ctx: &PackageOrderContext<'_>) -> Self {
        let mut next = Self::generate(order, ctx);
        let bounds = self.window();
        if !bounds.is_unbound() {
            next.bind_bounds(bounds);
        }
        next
    }

    pub fn bind_window(&mut self, window: &ReserveTime) {
        self.bind_bounds(window.bounds());
    }

    fn bind_bounds(&mut self, bounds: WindowBounds) {
        self.payment_order.reserved_time_start = bounds.start_timestamp;
        self.payment_order.reserved_time_end = bounds.end_timestamp;
        for package in &mut self.packages {
            package.reserved_time_start = bounds.start_timestamp;
            package.reserved_time_end = bounds.end_timestamp;
        }
    }

    /// Copy bound to `window`; the price stays the one this order was generated with
    pub fn with_window(&self, window: &ReserveTime) -> Self {
        let mut bound = self.clone();
        bound.bind_window(window);
        bound
    }

    pub fn window(&self) -> WindowBounds {
        WindowBounds::new(
            self.payment_order.reserved_time_start,
            self.payment_order.reserved_time_end,
        )
    }

    pub fn price(&self) -> Decimal {
        self.payment_order.price
    }
}

impl Default for PackageOrder {
    fn default() -> Self {
        Self::generate(
            &Order::default(),
            &PackageOrderContext {
                address_id: "",
                parent_order_sign: "",
                pay_type: PayType::default(),
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: &str, total: i64) -> Product {
        Product {
            id: id.to_string(),
            product_name: id.to_string(),
            count: 1,
            price: Decimal::new(total, 2),
            total_price: Decimal::new(total, 2),
            origin_price: Decimal::new(total, 2),
            sizes: vec![],
        }
    }

    fn ctx() -> PackageOrderContext<'static> {
        PackageOrderContext {
            address_id: "addr-1",
            parent_order_sign: "sign-1",
            pay_type: PayType::Wechat,
        }
    }

    fn order(price: i64) -> Order {
        Order {
            products: vec![product("p-1", price)],
            price: Decimal::new(price, 2),
        }
    }

    #[test]
    fn test_freight_charged_below_threshold() {
        let cheap = PackageOrder::generate(&order(3_850), &ctx());
        assert_eq!(cheap.payment_order.order_freight, FREIGHT_MONEY);

        let free = PackageOrder::generate(&order(3_900), &ctx());
        assert_eq!(free.payment_order.order_freight.to_string(), "0.00");
    }

    #[test]
    fn test_generate_fills_payment_order() {
        let package_order = PackageOrder::generate(&order(5_000), &ctx());

        assert_eq!(package_order.packages.len(), 1);
        assert_eq!(package_order.packages[0].products.len(), 1);
        assert_eq!(package_order.payment_order.address_id, "addr-1");
        assert_eq!(package_order.payment_order.parent_order_sign, "sign-1");
        assert_eq!(package_order.payment_order.pay_type, 4);
        assert_eq!(package_order.price(), Decimal::new(5_000, 2));
        assert!(package_order.window().is_unbound());
    }

    #[test]
    fn test_regenerate_preserves_bound_window() {
        let window = ReserveTime::new(1_650_000_000, 1_650_003_600, "06:30-07:00");
        let mut current = PackageOrder::generate(&order(5_000), &ctx());
        current.bind_window(&window);

        let repriced = current.regenerate(&order(4_200), &ctx());

        assert_eq!(repriced.payment_order.reserved_time_start, 1_650_000_000);
        assert_eq!(repriced.payment_order.reserved_time_end, 1_650_003_600);
        assert_eq!(repriced.packages[0].reserved_time_start, 1_650_000_000);
        assert_eq!(repriced.packages[0].reserved_time_end, 1_650_003_600);
        assert_eq!(repriced.price(), Decimal::new(4_200, 2));
    }

    #[test]
    fn test_with_window_binds_every_package() {
        let base = PackageOrder::generate(&order(5_000), &ctx());
        let window = ReserveTime::new(10, 20, "");
        let bound = base.with_window(&window);

        assert_eq!(bound.window(), WindowBounds::new(10, 20));
        assert!(bound
            .packages
            .iter()
            .all(|p| p.reserved_time_start == 10 && p.reserved_time_end == 20));
        assert!(base.window().is_unbound());
    }

    #[test]
    fn test_package_order_serializes_money_as_strings() {
        let package_order = PackageOrder::generate(&order(5_000), &ctx());
        let value = serde_json::to_value(&package_order).unwrap();

        assert_eq!(value["payment_order"]["freight_money"], "5.00");
        assert_eq!(value["payment_order"]["price"], "50.00");
        assert_eq!(value["packages"][0]["products"][0]["instant_rebate_money"], "0.00");
    }
}
