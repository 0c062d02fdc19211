/// Client configuration and credentials for the InvoiceXpress API.
use std::time::Duration;

use crate::errors::InvoiceXpressError;

/// Default host template. `{account_name}` is filled from [`Auth`] on every request.
pub const DEFAULT_HOST: &str = "https://{account_name}.app.invoicexpress.com";

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Account credentials injected into every authenticated request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Auth {
    account_name: String,
    api_key: String,
}

impl Auth {
    /// Create credentials, rejecting empty account names or API keys.
    pub fn new(
        account_name: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, InvoiceXpressError> {
        let account_name = account_name.into();
        let api_key = api_key.into();
        if account_name.trim().is_empty() || api_key.trim().is_empty() {
            return Err(InvoiceXpressError::InvalidCredentials);
        }
        Ok(Self {
            account_name,
            api_key,
        })
    }

    pub fn account_name(&self) -> &str {
        &self.account_name
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }
}

/// Transport configuration: host template and timeout.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub host: String,
    pub timeout: Duration,
}

impl ClientConfig {
    /// Configuration against a custom host, e.g. a local mock server.
    pub fn with_host(host: impl Into<String>) -> Self {
        Self {
            host: host.into().trim_end_matches('/').to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::with_host(DEFAULT_HOST)
    }
}
