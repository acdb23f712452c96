//! Lazy field readers over response bodies
//!
//! The racer never binds a full response schema. Each reader walks a JSON
//! pointer to the one value it needs and deserializes only that.

use rust_decimal::Decimal;
use serde_json::Value;
use slotrace_types::{Address, Cart, CartMode, Product, ReserveTime};

use crate::ResponseError;

/// Numeric top-level `code`, if the body carries one
pub fn response_code(body: &Value) -> Option<i64> {
    let code = body.get("code")?;
    code.as_i64().or_else(|| code.as_f64().map(|c| c as i64))
}

/// Human-readable message the platform attaches to a response
pub fn response_message(body: &Value) -> Option<&str> {
    body.get("msg")
        .or_else(|| body.get("message"))
        .and_then(Value::as_str)
}

pub fn read_user_id(body: &Value) -> Result<String, ResponseError> {
    match body.pointer("/data/userInfo/uid") {
        Some(Value::String(uid)) if !uid.is_empty() => Ok(uid.clone()),
        Some(Value::Number(uid)) => Ok(uid.to_string()),
        _ => Err(ResponseError::MissingField("data.userInfo.uid")),
    }
}

pub fn read_addresses(body: &Value) -> Result<Vec<Address>, ResponseError> {
    let list = body
        .pointer("/data/valid_address")
        .ok_or(ResponseError::MissingField("data.valid_address"))?;

    serde_json::from_value(list.clone()).map_err(|e| ResponseError::Malformed {
        field: "data.valid_address",
        reason: e.to_string(),
    })
}

/// Products eligible for checkout under `mode`, plus the parent order signature
pub fn read_cart(body: &Value, mode: CartMode) -> Result<Cart, ResponseError> {
    let products = match mode {
        CartMode::All => match body.pointer("/data/new_order_product_list/0/products") {
            Some(list) => decode_products(list, "data.new_order_product_list.0.products")?,
            None => Vec::new(),
        },
        CartMode::Available => {
            let mut products = Vec::new();
            let groups = body
                .pointer("/data/product/effective")
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or_default();
            for group in groups {
                if let Some(list) = group.get("products") {
                    products.extend(decode_products(list, "data.product.effective.products")?);
                }
            }
            products
        }
    };

    let parent_order_sign = body
        .pointer("/data/parent_order_info/parent_order_sign")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    Ok(Cart {
        products,
        parent_order_sign,
    })
}

/// Authoritative order total from an order check
pub fn read_order_price(body: &Value) -> Result<Decimal, ResponseError> {
    const FIELD: &str = "data.order.total_money";
    match body.pointer("/data/order/total_money") {
        Some(Value::String(money)) => money.parse().map_err(|e: rust_decimal::Error| {
            ResponseError::Malformed {
                field: FIELD,
                reason: e.to_string(),
            }
        }),
        Some(money @ Value::Number(_)) => {
            serde_json::from_value(money.clone()).map_err(|e| ResponseError::Malformed {
                field: FIELD,
                reason: e.to_string(),
            })
        }
        _ => Err(ResponseError::MissingField(FIELD)),
    }
}

/// Open delivery windows; entries with a non-zero `disableType` are skipped
pub fn read_reserve_times(body: &Value) -> Vec<ReserveTime> {
    let times = body
        .pointer("/data/0/time/0/times")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    times
        .iter()
        .filter(|slot| slot.get("disableType").and_then(Value::as_f64).unwrap_or(0.0) == 0.0)
        .map(|slot| {
            ReserveTime::new(
                slot.get("start_timestamp").and_then(Value::as_i64).unwrap_or(0),
                slot.get("end_timestamp").and_then(Value::as_i64).unwrap_or(0),
                slot.get("select_msg").and_then(Value::as_str).unwrap_or_default(),
            )
        })
        .collect()
}

fn decode_products(list: &Value, field: &'static str) -> Result<Vec<Product>, ResponseError> {
    serde_json::from_value(list.clone()).map_err(|e| ResponseError::Malformed {
        field,
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_response_code() {
        assert_eq!(response_code(&json!({"code": 0})), Some(0));
        assert_eq!(response_code(&json!({"code": -3000})), Some(-3000));
        assert_eq!(response_code(&json!({"code": 5003.0})), Some(5003));
        assert_eq!(response_code(&json!({"code": "0"})), None);
        assert_eq!(response_code(&json!({"success": true})), None);
    }

    #[test]
    fn test_read_user_id() {
        let body = json!({"code": 0, "data": {"userInfo": {"uid": "u-1"}}});
        assert_eq!(read_user_id(&body).unwrap(), "u-1");
        assert!(read_user_id(&json!({"data": {}})).is_err());
    }

    #[test]
    fn test_read_addresses() {
        let body = json!({"data": {"valid_address": [
            {"id": "a-1", "station_id": "s", "city_number": "0101", "addr_detail": "1F",
             "is_default": false, "location": {"address": "Main St", "location": [121.5, 31.2]}},
            {"id": "a-2", "is_default": true}
        ]}});

        let addresses = read_addresses(&body).unwrap();
        assert_eq!(addresses.len(), 2);
        assert_eq!(addresses[0].coordinates(), Some((121.5, 31.2)));
        assert!(addresses[1].is_default);
    }

    #[test]
    fn test_read_cart_all_mode() {
        let body = json!({"data": {
            "new_order_product_list": [{"products": [
                {"id": "p-1", "product_name": "eggs", "count": 2, "price": "4.50",
                 "total_price": "9.00", "origin_price": "5.00", "sizes": []}
            ]}],
            "parent_order_info": {"parent_order_sign": "sign-1"}
        }});

        let cart = read_cart(&body, CartMode::All).unwrap();
        assert_eq!(cart.products.len(), 1);
        assert_eq!(cart.parent_order_sign, "sign-1");
        assert_eq!(cart.products[0].total_price, Decimal::new(900, 2));
    }

    #[test]
    fn test_read_cart_available_mode_flattens_groups() {
        let body = json!({"data": {"product": {"effective": [
            {"products": [{"id": "p-1"}, {"id": "p-2"}]},
            {"products": [{"id": "p-3"}]}
        ]}}});

        let cart = read_cart(&body, CartMode::Available).unwrap();
        let ids: Vec<_> = cart.products.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["p-1", "p-2", "p-3"]);
    }

    #[test]
    fn test_empty_cart_is_not_an_error() {
        let cart = read_cart(&json!({"code": 0, "data": {}}), CartMode::All).unwrap();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_read_order_price() {
        let body = json!({"data": {"order": {"total_money": "45.50"}}});
        assert_eq!(read_order_price(&body).unwrap(), Decimal::new(4550, 2));

        let numeric = json!({"data": {"order": {"total_money": 38}}});
        assert_eq!(read_order_price(&numeric).unwrap(), Decimal::from(38));

        assert!(matches!(
            read_order_price(&json!({"data": {}})),
            Err(ResponseError::MissingField(_))
        ));
        assert!(matches!(
            read_order_price(&json!({"data": {"order": {"total_money": "lots"}}})),
            Err(ResponseError::Malformed { .. })
        ));
    }

    #[test]
    fn test_read_reserve_times_skips_disabled() {
        let body = json!({"data": [{"time": [{"times": [
            {"start_timestamp": 100, "end_timestamp": 200, "select_msg": "a", "disableType": 1},
            {"start_timestamp": 300, "end_timestamp": 400, "select_msg": "b", "disableType": 0},
            {"start_timestamp": 500, "end_timestamp": 600, "select_msg": "c", "disableType": 2}
        ]}]}]});

        let windows = read_reserve_times(&body);
        assert_eq!(windows, vec![ReserveTime::new(300, 400, "b")]);
        assert!(read_reserve_times(&json!({"data": []})).is_empty());
    }

    #[test]
    fn test_float_encoded_disable_type() {
        let body = json!({"data": [{"time": [{"times": [
            {"start_timestamp": 100, "end_timestamp": 200, "select_msg": "a", "disableType": 1.0},
            {"start_timestamp": 300, "end_timestamp": 400, "select_msg": "b", "disableType": 0.0},
            {"start_timestamp": 500, "end_timestamp": 600, "select_msg": "c"}
        ]}]}]});

        let windows = read_reserve_times(&body);
        assert_eq!(
            windows,
            vec![ReserveTime::new(300, 400, "b"), ReserveTime::new(500, 600, "c")]
        );
    }
}
