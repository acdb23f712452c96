use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use tracing::debug;

use crate::{normalize_cookie, ApiRequest, Host, HttpMethod, ResponseError, TransportError};

/// Status and body of a completed HTTP exchange, before classification
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// HTTP 200 with the given body
    pub fn ok(body: impl Into<String>) -> Self {
        Self::new(200, body)
    }

    pub fn json(&self) -> Result<serde_json::Value, ResponseError> {
        serde_json::from_str(&self.body).map_err(|e| ResponseError::NotJson(e.to_string()))
    }
}

/// Sends built requests to the platform
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &ApiRequest) -> Result<RawResponse, TransportError>;
}

/// reqwest-backed [`Transport`] carrying the session cookie and browser headers
pub struct HttpTransport {
    client: reqwest::Client,
    api_base_url: String,
    user_base_url: String,
}

impl HttpTransport {
    pub fn new(
        cookie: &str,
        api_base_url: impl Into<String>,
        user_base_url: impl Into<String>,
    ) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .default_headers(default_headers(cookie)?)
            .build()
            .map_err(|e| TransportError::ClientBuild(e.to_string()))?;

        Ok(Self {
            client,
            api_base_url: api_base_url.into(),
            user_base_url: user_base_url.into(),
        })
    }

    /// Absolute URL of the request, without query parameters
    pub fn url_for(&self, request: &ApiRequest) -> String {
        let base = match request.endpoint.host() {
            Host::Api => &self.api_base_url,
            Host::User => &self.user_base_url,
        };
        format!("{}{}", base.trim_end_matches('/'), request.endpoint.path())
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &ApiRequest) -> Result<RawResponse, TransportError> {
        let url = self.url_for(request);
        let endpoint = request.endpoint.name();

        let mut builder = match request.endpoint.method() {
            HttpMethod::Get => self
                .client
                .get(format!("{url}?{}", request.params)),
            HttpMethod::Post => self.client.post(&url).body(request.params.clone()),
        };
        for (name, value) in &request.headers {
            builder = builder.header(*name, value.as_str());
        }

        debug!(endpoint, url = %url, "Sending request");

        let response = builder
            .send()
            .await
            .map_err(|e| TransportError::RequestFailed {
                endpoint: endpoint.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::BodyRead {
                endpoint: endpoint.to_string(),
                reason: e.to_string(),
            })?;

        Ok(RawResponse { status, body })
    }
}

const BROWSER_HEADERS: [(&str, &str); 10] = [
    (
        "user-agent",
        "Mozilla/5.0 (Linux; Android 9; LIO-AN00 Build/LIO-AN00; wv) AppleWebKit/537.36 \
         (KHTML, like Gecko) Version/4.0 Chrome/92.0.4515.131 Mobile Safari/537.36 \
         xzone/9.47.0 station_id/null",
    ),
    ("accept", "application/json, text/plain, */*"),
    ("content-type", "application/x-www-form-urlencoded"),
    ("origin", "https://wx.m.ddxq.mobi"),
    ("x-requested-with", "com.yaya.zone"),
    ("sec-fetch-site", "same-site"),
    ("sec-fetch-mode", "cors"),
    ("sec-fetch-dest", "empty"),
    ("referer", "https://wx.m.ddxq.mobi/"),
    ("accept-language", "zh-CN,zh;q=0.9,en-US;q=0.8,en;q=0.7"),
];

fn default_headers(cookie: &str) -> Result<HeaderMap, TransportError> {
    let mut headers = HeaderMap::new();
    for (name, value) in BROWSER_HEADERS {
        headers.insert(HeaderName::from_static(name), HeaderValue::from_static(value));
    }

    let cookie = HeaderValue::from_str(&normalize_cookie(cookie)).map_err(|e| {
        TransportError::InvalidHeader {
            name: "cookie".to_string(),
            reason: e.to_string(),
        }
    })?;
    headers.insert(reqwest::header::COOKIE, cookie);
    Ok(headers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Endpoint, RequestBuilder, SessionIdentity};

    #[test]
    fn test_default_headers_normalize_cookie() {
        let headers = default_headers("abc").unwrap();
        assert_eq!(headers.get("cookie").unwrap(), "DDXQSESSID=abc");
        assert_eq!(
            headers.get("content-type").unwrap(),
            "application/x-www-form-urlencoded"
        );
    }

    #[test]
    fn test_cookie_with_newline_is_rejected() {
        let result = default_headers("abc\r\nx-injected: 1");
        assert!(matches!(result, Err(TransportError::InvalidHeader { .. })));
    }

    #[test]
    fn test_url_for_routes_by_host() {
        let transport = HttpTransport::new(
            "abc",
            "https://maicai.api.ddxq.mobi/",
            "https://sunquan.api.ddxq.mobi",
        )
        .unwrap();
        let identity = SessionIdentity::default();
        let builder = RequestBuilder::new(&identity);

        let user = builder.user_detail().unwrap();
        assert_eq!(
            transport.url_for(&user),
            "https://sunquan.api.ddxq.mobi/api/v1/user/detail/"
        );

        let mut submit = user.clone();
        submit.endpoint = Endpoint::SubmitOrder;
        assert_eq!(
            transport.url_for(&submit),
            "https://maicai.api.ddxq.mobi/order/addNewOrder"
        );
    }

    #[test]
    fn test_raw_response_json() {
        assert!(RawResponse::ok(r#"{"code":0}"#).json().is_ok());
        assert!(matches!(
            RawResponse::ok("<html>").json(),
            Err(ResponseError::NotJson(_))
        ));
    }
}
