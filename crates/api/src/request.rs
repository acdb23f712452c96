use rust_decimal::Decimal;
use serde::Serialize;
use slotrace_types::{Address, CartMode, Order, PackageOrder, PackageProduct, Product};
use url::form_urlencoded::Serializer;

use crate::{Endpoint, RequestError};

/// Client build the platform expects to be talking to
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientProfile {
    pub api_version: String,
    pub app_version: String,
    pub channel: String,
    pub app_client_id: String,
}

impl Default for ClientProfile {
    fn default() -> Self {
        Self {
            api_version: "9.50.0".to_string(),
            app_version: "2.83.0".to_string(),
            channel: "applet".to_string(),
            app_client_id: "4".to_string(),
        }
    }
}

/// Who the requests are made for
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SessionIdentity {
    pub profile: ClientProfile,
    pub uid: String,
    pub address: Option<Address>,
}

/// Window and price an order submission is made for; logged before the call
#[derive(Clone, Debug, PartialEq)]
pub struct SubmissionTag {
    pub window: String,
    pub price: Decimal,
}

/// A fully built request: endpoint, per-request headers and encoded form parameters
///
/// Parameters travel in the query string for GET endpoints and as the
/// `application/x-www-form-urlencoded` body for POST endpoints.
#[derive(Clone, Debug, PartialEq)]
pub struct ApiRequest {
    pub endpoint: Endpoint,
    pub headers: Vec<(&'static str, String)>,
    pub params: String,
    pub tag: Option<SubmissionTag>,
}

impl ApiRequest {
    /// Decoded value of a form parameter
    pub fn param(&self, name: &str) -> Option<String> {
        url::form_urlencoded::parse(self.params.as_bytes())
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Serialize)]
struct CheckOrderPackage<'a> {
    package_type: u32,
    package_id: u32,
    products: &'a [PackageProduct],
}

/// Builds [`ApiRequest`]s for one identity
pub struct RequestBuilder<'a> {
    identity: &'a SessionIdentity,
}

impl<'a> RequestBuilder<'a> {
    pub fn new(identity: &'a SessionIdentity) -> Self {
        Self { identity }
    }

    pub fn user_detail(&self) -> Result<ApiRequest, RequestError> {
        let params = self.common_params(false)?;
        self.finish(Endpoint::UserDetail, params)
    }

    pub fn address_list(&self) -> Result<ApiRequest, RequestError> {
        let mut params = self.common_params(false)?;
        params.append_pair("source_type", "5");
        self.finish(Endpoint::AddressList, params)
    }

    pub fn cart(&self, mode: CartMode) -> Result<ApiRequest, RequestError> {
        let mut params = self.common_params(true)?;
        params.append_pair("is_load", "1");
        params.append_pair("cart_mode", &mode.code().to_string());
        params.append_pair("ab_config", r#"{"key_onion":"D","key_cart_discount_price":"C"}"#);
        self.finish(Endpoint::Cart, params)
    }

    pub fn cart_all_check(&self) -> Result<ApiRequest, RequestError> {
        let mut params = self.common_params(true)?;
        params.append_pair("is_check", "1");
        params.append_pair("is_load", "1");
        params.append_pair("ab_config", r#"{"key_onion":"D","key_cart_discount_price":"C"}"#);
        self.finish(Endpoint::CartAllCheck, params)
    }

    pub fn flash_sale_check(&self) -> Result<ApiRequest, RequestError> {
        let params = self.common_params(true)?;
        self.finish(Endpoint::FlashSaleCheck, params)
    }

    pub fn check_order(&self, order: &Order) -> Result<ApiRequest, RequestError> {
        let products: Vec<PackageProduct> = order.products.iter().map(PackageProduct::from).collect();
        let packages = [CheckOrderPackage {
            package_type: 1,
            package_id: 1,
            products: &products,
        }];
        let packages = serde_json::to_string(&packages)
            .map_err(|source| RequestError::Encode { field: "packages", source })?;

        let mut params = self.common_params(true)?;
        params.append_pair("user_ticket_id", "default");
        params.append_pair("freight_ticket_id", "default");
        params.append_pair("is_use_point", "0");
        params.append_pair("is_use_balance", "0");
        params.append_pair("is_buy_vip", "0");
        params.append_pair("coupons_id", "");
        params.append_pair("is_buy_coupons", "0");
        params.append_pair("packages", &packages);
        params.append_pair("check_order_type", "0");
        params.append_pair("is_support_merge_payment", "0");
        params.append_pair("showData", "true");
        params.append_pair("showMsg", "false");
        self.finish(Endpoint::CheckOrder, params)
    }

    pub fn reserve_times(&self, products: &[Product]) -> Result<ApiRequest, RequestError> {
        let products = serde_json::to_string(&[products])
            .map_err(|source| RequestError::Encode { field: "products", source })?;

        let mut params = self.common_params(true)?;
        params.append_pair("group_config_id", "");
        params.append_pair("isBridge", "false");
        params.append_pair("products", &products);
        self.finish(Endpoint::ReserveTimes, params)
    }

    pub fn submit_order(&self, package_order: &PackageOrder) -> Result<ApiRequest, RequestError> {
        let encoded = serde_json::to_string(package_order)
            .map_err(|source| RequestError::Encode { field: "package_order", source })?;

        let mut params = self.common_params(true)?;
        params.append_pair("package_order", &encoded);
        params.append_pair("showData", "true");
        params.append_pair("showMsg", "false");
        params.append_pair("ab_config", r#"{"key_onion":"C"}"#);

        let mut request = self.finish(Endpoint::SubmitOrder, params)?;
        request.tag = Some(SubmissionTag {
            window: package_order.window().label(),
            price: package_order.price(),
        });
        Ok(request)
    }

    /// `ddmc-*` headers identifying the client, user and delivery station
    pub fn headers(&self) -> Vec<(&'static str, String)> {
        let identity = self.identity;
        let profile = &identity.profile;
        let (city_number, station_id) = identity
            .address
            .as_ref()
            .map(|a| (a.city_number.clone(), a.station_id.clone()))
            .unwrap_or_default();

        let mut headers = vec![
            ("ddmc-city-number", city_number),
            ("ddmc-os-version", "undefined".to_string()),
            ("ddmc-channel", profile.channel.clone()),
            ("ddmc-api-version", profile.api_version.clone()),
            ("ddmc-build-version", profile.app_version.clone()),
            ("ddmc-app-client-id", profile.app_client_id.clone()),
            ("ddmc-ip", String::new()),
            ("ddmc-station-id", station_id),
            ("ddmc-uid", identity.uid.clone()),
        ];

        if let Some((longitude, latitude)) =
            identity.address.as_ref().and_then(Address::coordinates)
        {
            headers.push(("ddmc-longitude", longitude.to_string()));
            headers.push(("ddmc-latitude", latitude.to_string()));
        }
        headers
    }

    fn common_params(&self, needs_address: bool) -> Result<Serializer<'static, String>, RequestError> {
        let identity = self.identity;
        let profile = &identity.profile;
        let mut params = Serializer::new(String::new());
        params.append_pair("channel", &profile.channel);
        params.append_pair("api_version", &profile.api_version);
        params.append_pair("app_version", &profile.app_version);
        params.append_pair("app_client_id", &profile.app_client_id);
        params.append_pair("applet_source", "");
        params.append_pair("h5_source", "");
        params.append_pair("sharer_uid", "");
        params.append_pair("s_id", "");
        params.append_pair("openid", "");
        params.append_pair("uid", &identity.uid);

        if needs_address {
            let address = identity.address.as_ref().ok_or(RequestError::MissingAddress)?;
            params.append_pair("address_id", &address.id);
            params.append_pair("station_id", &address.station_id);
            params.append_pair("city_number", &address.city_number);
            if let Some((longitude, latitude)) = address.coordinates() {
                params.append_pair("longitude", &longitude.to_string());
                params.append_pair("latitude", &latitude.to_string());
            }
        }

        params.append_pair("device_token", "");
        params.append_pair("nars", "");
        params.append_pair("sesi", "");
        Ok(params)
    }

    fn finish(
        &self,
        endpoint: Endpoint,
        mut params: Serializer<'static, String>,
    ) -> Result<ApiRequest, RequestError> {
        Ok(ApiRequest {
            endpoint,
            headers: self.headers(),
            params: params.finish(),
            tag: None,
        })
    }
}
