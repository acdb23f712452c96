use async_trait::async_trait;
use tracing::debug;

use crate::NotifyError;

/// Push channel used to tell the operator a slot was won
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Whether a destination is configured at all
    fn is_configured(&self) -> bool {
        true
    }

    async fn notify(&self, title: &str, body: &str) -> Result<(), NotifyError>;
}

/// Bark push notifications (`GET {base}/{key}/{title}/{body}`)
pub struct BarkNotifier {
    client: reqwest::Client,
    base_url: String,
    key: Option<String>,
}

impl BarkNotifier {
    pub fn new(base_url: impl Into<String>, key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            key: key.filter(|k| !k.trim().is_empty()),
        }
    }

    /// Push URL with every path segment percent-encoded
    pub fn push_url(&self, title: &str, body: &str) -> Result<url::Url, NotifyError> {
        let key = self.key.as_deref().ok_or(NotifyError::MissingKey)?;
        let mut url =
            url::Url::parse(&self.base_url).map_err(|e| NotifyError::InvalidUrl(e.to_string()))?;

        url.path_segments_mut()
            .map_err(|_| NotifyError::InvalidUrl(format!("{} cannot be a base", self.base_url)))?
            .pop_if_empty()
            .push(key)
            .push(title)
            .push(body);
        Ok(url)
    }
}

#[async_trait]
impl Notifier for BarkNotifier {
    fn is_configured(&self) -> bool {
        self.key.is_some()
    }

    async fn notify(&self, title: &str, body: &str) -> Result<(), NotifyError> {
        let url = self.push_url(title, body)?;
        debug!(title, "Sending push notification");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| NotifyError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(NotifyError::Rejected {
                status: response.status().as_u16(),
            });
        }
        Ok(())
    }
}
