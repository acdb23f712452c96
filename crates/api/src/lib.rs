//! Wire-level client for the grocery platform
//!
//! Everything the race engine needs to talk to the platform lives here: the
//! endpoint table, request construction (`ddmc-*` headers and form
//! parameters), the [`Transport`] seam with its reqwest implementation,
//! lazy readers that pull single fields out of response bodies, and the
//! push [`Notifier`].

pub mod endpoint;
pub mod error;
pub mod notify;
pub mod request;
pub mod response;
pub mod transport;

pub use endpoint::{Endpoint, HttpMethod, Host};
pub use error::{NotifyError, RequestError, ResponseError, TransportError};
pub use notify::{BarkNotifier, Notifier};
pub use request::{ApiRequest, ClientProfile, RequestBuilder, SessionIdentity, SubmissionTag};
pub use response::*;
pub use transport::{HttpTransport, RawResponse, Transport};

/// Cookie name carrying the platform session
pub const SESSION_COOKIE_PREFIX: &str = "DDXQSESSID=";

/// Prepend the session cookie name when the raw value lacks it
pub fn normalize_cookie(cookie: &str) -> String {
    let cookie = cookie.trim();
    if cookie.starts_with(SESSION_COOKIE_PREFIX) {
        cookie.to_string()
    } else {
        format!("{SESSION_COOKIE_PREFIX}{cookie}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_cookie() {
        assert_eq!(normalize_cookie("abc"), "DDXQSESSID=abc");
        assert_eq!(normalize_cookie("DDXQSESSID=abc"), "DDXQSESSID=abc");
        assert_eq!(normalize_cookie(" abc\n"), "DDXQSESSID=abc");
    }
}
