//! Stripe checkout session lookup.
//!
//! Implements `CheckoutSessionLookup` with a single REST call:
//!
//! ```text
//! GET {base}/v1/checkout/sessions?payment_intent=<id>
//! ```
//!
//! # Configuration
//!
//! ```ignore
//! let config = StripeConfig::new(api_key).with_timeout(Duration::from_secs(10));
//! let client = StripeCheckoutClient::new(config)?;
//! ```

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::ports::{CheckoutSession, CheckoutSessionLookup, PaymentError, PaymentErrorCode};

const DEFAULT_API_BASE_URL: &str = "https://api.stripe.com";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Stripe API configuration.
#[derive(Clone)]
pub struct StripeConfig {
    /// Stripe secret API key (sk_live_... or sk_test_...).
    api_key: SecretString,

    /// Base URL for Stripe API (default: https://api.stripe.com).
    api_base_url: String,

    timeout: Duration,
}

impl StripeConfig {
    pub fn new(api_key: SecretString) -> Self {
        Self {
            api_key,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set a custom API base URL (for testing against a stub server).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn sessions_url(&self) -> String {
        format!("{}/v1/checkout/sessions", self.api_base_url)
    }
}

/// List envelope returned by Stripe collection endpoints.
#[derive(Debug, Deserialize)]
struct StripeList<T> {
    data: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetail {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

pub struct StripeCheckoutClient {
    config: StripeConfig,
    http_client: reqwest::Client,
}

impl StripeCheckoutClient {
    pub fn new(config: StripeConfig) -> Result<Self, PaymentError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| PaymentError::network(e.to_string()))?;

        Ok(Self {
            config,
            http_client,
        })
    }
}

#[async_trait]
impl CheckoutSessionLookup for StripeCheckoutClient {
    async fn find_by_payment_intent(
        &self,
        payment_intent_id: &str,
    ) -> Result<Vec<CheckoutSession>, PaymentError> {
        let response = self
            .http_client
            .get(self.config.sessions_url())
            .query(&[("payment_intent", payment_intent_id)])
            .basic_auth(self.config.api_key.expose_secret(), Option::<&str>::None)
            .send()
            .await
            .map_err(|e| PaymentError::network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!(
                status = %status,
                payment_intent_id,
                "Stripe checkout session lookup failed"
            );
            return Err(error_from_response(status, &error_text));
        }

        let list: StripeList<CheckoutSession> = response.json().await.map_err(|e| {
            PaymentError::new(
                PaymentErrorCode::ProviderError,
                format!("Failed to parse Stripe response: {}", e),
            )
        })?;

        tracing::debug!(
            payment_intent_id,
            sessions = list.data.len(),
            "Fetched checkout sessions"
        );
        Ok(list.data)
    }
}

fn error_from_response(status: reqwest::StatusCode, body: &str) -> PaymentError {
    let code = match status {
        reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => {
            PaymentErrorCode::AuthenticationError
        }
        reqwest::StatusCode::TOO_MANY_REQUESTS => PaymentErrorCode::RateLimitExceeded,
        s if s.is_client_error() => PaymentErrorCode::InvalidRequest,
        _ => PaymentErrorCode::ProviderError,
    };

    match serde_json::from_str::<StripeErrorBody>(body) {
        Ok(parsed) => {
            let message = parsed
                .error
                .message
                .unwrap_or_else(|| format!("Stripe API error ({})", status));
            let err = PaymentError::new(code, message);
            match parsed.error.code {
                Some(provider_code) => err.with_provider_code(provider_code),
                None => err,
            }
        }
        Err(_) => PaymentError::new(code, format!("Stripe API error: {}", body)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let config = StripeConfig::new(SecretString::new("sk_test".to_string()))
            .with_base_url("http://localhost:12111/");

        assert_eq!(config.sessions_url(), "http://localhost:12111/v1/checkout/sessions");
    }

    #[test]
    fn list_envelope_parses_sessions() {
        let body = r#"{
            "object": "list",
            "data": [{"id": "cs_1", "object": "checkout.session", "metadata": {"purchaseId": "p1"}}],
            "has_more": false
        }"#;

        let list: StripeList<CheckoutSession> = serde_json::from_str(body).unwrap();

        assert_eq!(list.data.len(), 1);
        assert_eq!(list.data[0].purchase_id(), Some("p1"));
    }

    #[test]
    fn unauthorized_maps_to_authentication_error() {
        let body = r#"{"error":{"type":"invalid_request_error","message":"Invalid API Key provided"}}"#;

        let err = error_from_response(reqwest::StatusCode::UNAUTHORIZED, body);

        assert_eq!(err.code, PaymentErrorCode::AuthenticationError);
        assert_eq!(err.message, "Invalid API Key provided");
    }

    #[test]
    fn rate_limit_keeps_provider_code() {
        let body = r#"{"error":{"code":"rate_limit","message":"Too many requests"}}"#;

        let err = error_from_response(reqwest::StatusCode::TOO_MANY_REQUESTS, body);

        assert!(err.is_retryable());
        assert_eq!(err.provider_code.as_deref(), Some("rate_limit"));
    }

    #[test]
    fn unparseable_error_body_is_kept_verbatim() {
        let err = error_from_response(reqwest::StatusCode::BAD_GATEWAY, "upstream down");

        assert_eq!(err.code, PaymentErrorCode::ProviderError);
        assert!(err.message.contains("upstream down"));
    }
}
