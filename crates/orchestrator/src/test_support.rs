//! Hand-written fakes shared by the unit tests

use async_trait::async_trait;
use slotrace_api::{
    ApiRequest, ClientProfile, Endpoint, Notifier, NotifyError, RawResponse, SessionIdentity,
    Transport, TransportError,
};
use slotrace_ratelimit::{JitterBackoff, SubmissionThrottle};
use slotrace_types::{Address, AddressLocation, CartMode, PayType};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::{ExecutionGateway, Session};

pub const SUCCESS_BODY: &str = r#"{"code":0,"data":{}}"#;

/// Replays queued responses per endpoint and records every request
///
/// When an endpoint's queue is down to its last response, that response
/// repeats. Endpoints without a script answer with a bare success.
#[derive(Default)]
pub struct ScriptedTransport {
    scripts: Mutex<HashMap<Endpoint, VecDeque<RawResponse>>>,
    calls: Mutex<Vec<ApiRequest>>,
    latency: Duration,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency,
            ..Self::default()
        }
    }

    pub fn script(&self, endpoint: Endpoint, responses: impl IntoIterator<Item = RawResponse>) {
        self.scripts
            .lock()
            .unwrap()
            .insert(endpoint, responses.into_iter().collect());
    }

    pub fn calls_to(&self, endpoint: Endpoint) -> usize {
        self.requests_to(endpoint).len()
    }

    pub fn requests_to(&self, endpoint: Endpoint) -> Vec<ApiRequest> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.endpoint == endpoint)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: &ApiRequest) -> Result<RawResponse, TransportError> {
        self.calls.lock().unwrap().push(request.clone());
        let response = {
            let mut scripts = self.scripts.lock().unwrap();
            match scripts.get_mut(&request.endpoint) {
                Some(queue) if queue.len() > 1 => queue.pop_front(),
                Some(queue) => queue.front().cloned(),
                None => None,
            }
        };
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        Ok(response.unwrap_or_else(|| RawResponse::ok(SUCCESS_BODY)))
    }
}

/// Counts notifications instead of sending them
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<(String, String)>>,
    pub unconfigured: bool,
}

impl RecordingNotifier {
    pub fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    fn is_configured(&self) -> bool {
        !self.unconfigured
    }

    async fn notify(&self, title: &str, body: &str) -> Result<(), NotifyError> {
        self.sent
            .lock()
            .unwrap()
            .push((title.to_string(), body.to_string()));
        Ok(())
    }
}

pub fn cart_body(product_ids: &[&str]) -> String {
    let products: Vec<_> = product_ids
        .iter()
        .map(|id| {
            serde_json::json!({
                "id": id,
                "product_name": format!("product {id}"),
                "count": 1,
                "price": "12.50",
                "total_price": "12.50",
                "origin_price": "12.50",
                "sizes": []
            })
        })
        .collect();

    serde_json::json!({
        "code": 0,
        "data": {
            "new_order_product_list": [{ "products": products }],
            "parent_order_info": { "parent_order_sign": "sign-1" }
        }
    })
    .to_string()
}

pub fn check_order_body(total: &str) -> String {
    serde_json::json!({
        "code": 0,
        "data": { "order": { "total_money": total } }
    })
    .to_string()
}

/// Reserve-time body; `(start, end, disable_type)` per slot
pub fn reserve_body(slots: &[(i64, i64, i64)]) -> String {
    let times: Vec<_> = slots
        .iter()
        .map(|(start, end, disable)| {
            serde_json::json!({
                "start_timestamp": start,
                "end_timestamp": end,
                "select_msg": format!("{start}-{end}"),
                "disableType": disable
            })
        })
        .collect();

    serde_json::json!({
        "code": 0,
        "data": [{ "time": [{ "times": times }] }]
    })
    .to_string()
}

pub fn fixture_identity() -> SessionIdentity {
    SessionIdentity {
        profile: ClientProfile::default(),
        uid: "u-1".to_string(),
        address: Some(Address {
            id: "addr-1".to_string(),
            station_id: "station-1".to_string(),
            city_number: "0101".to_string(),
            addr_detail: "Room 1".to_string(),
            is_default: true,
            location: AddressLocation {
                address: "1 Main Street".to_string(),
                location: vec![121.5, 31.2],
            },
        }),
    }
}

pub fn fixture_gateway(transport: Arc<ScriptedTransport>) -> Arc<ExecutionGateway> {
    Arc::new(ExecutionGateway::new(
        transport,
        JitterBackoff::from_millis(2),
        SubmissionThrottle::new(16),
    ))
}

pub fn fixture_session(transport: Arc<ScriptedTransport>) -> Arc<Session> {
    Arc::new(Session::new(
        fixture_gateway(transport),
        fixture_identity(),
        PayType::Wechat,
        CartMode::All,
    ))
}
