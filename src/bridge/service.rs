//! Mini App bridge service
//!
//! Stable async operations over the host capability surface and the remote
//! auth/payment endpoints. Every call is attempted exactly once; there is no
//! retry, backoff or deadline.

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::sync::Arc;

use crate::bridge::errors::BridgeError;
use crate::bridge::host::{host_call, Capability, HostAdapter, HostRuntime};
use crate::bridge::notifier::{LogNotifier, Notifier};
use crate::settings::{MessageSettings, TravelSettings};
use crate::utils::logging::LoggingHelper;

/// Invoice carried by a payment QR code
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub invoice_id: String,
    pub amount: f64,
}

/// Body returned by the auth endpoint: a token plus arbitrary profile fields
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AuthExchangeResponse {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(flatten)]
    pub profile: Map<String, Value>,
}

/// Outcome of the complete host sign-in exchange
#[derive(Debug, Clone)]
pub struct HostAuthentication {
    pub auth_code: String,
    pub token: Option<String>,
    pub profile: Map<String, Value>,
}

#[derive(Deserialize)]
struct PaymentUrlResponse {
    url: String,
}

pub struct MiniAppBridge {
    adapter: HostAdapter,
    client: reqwest::Client,
    auth_url: String,
    payment_url: String,
    auth_scopes: Vec<String>,
    messages: MessageSettings,
    notifier: Arc<dyn Notifier>,
}

impl std::fmt::Debug for MiniAppBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MiniAppBridge")
            .field("adapter", &self.adapter)
            .field("auth_url", &self.auth_url)
            .field("payment_url", &self.payment_url)
            .finish_non_exhaustive()
    }
}

impl MiniAppBridge {
    /// Create a bridge over an already selected host adapter
    #[must_use]
    pub fn new(adapter: HostAdapter, settings: &TravelSettings) -> Self {
        LoggingHelper::log_host_detection(adapter.is_host());
        Self {
            adapter,
            client: reqwest::Client::new(),
            auth_url: settings.api.auth_url(),
            payment_url: settings.api.payment_url(),
            auth_scopes: settings.host.auth_scopes.clone(),
            messages: settings.messages.clone(),
            notifier: Arc::new(LogNotifier),
        }
    }

    /// Replace the notifier used when the host has no native alert
    #[must_use]
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    #[must_use]
    pub fn adapter(&self) -> &HostAdapter {
        &self.adapter
    }

    /// Whether a host runtime was selected at startup
    #[must_use]
    pub fn detect_host_runtime(&self) -> bool {
        self.adapter.is_host()
    }

    #[must_use]
    pub fn messages(&self) -> &MessageSettings {
        &self.messages
    }

    fn host(&self) -> Result<&Arc<dyn HostRuntime>, BridgeError> {
        self.adapter.runtime().ok_or(BridgeError::NotHostRuntime)
    }

    /// Ask the host for an auth code scoped to `scopes`
    ///
    /// # Errors
    ///
    /// - `NotHostRuntime` outside a host
    /// - `AuthFailed` with the host's error object when the host rejects the request
    pub async fn request_auth_code(&self, scopes: &[String]) -> Result<String, BridgeError> {
        let host = self.host()?;
        let response = host_call(|success, fail| host.get_auth_code(scopes, success, fail))
            .await
            .map_err(|details| BridgeError::AuthFailed(details.to_string()))?;
        Ok(response.auth_code)
    }

    /// Exchange a host auth code for a session token at the auth endpoint
    ///
    /// # Errors
    ///
    /// - `Transport` if the request cannot be sent
    /// - `HttpError` on a non-2xx status
    /// - `InvalidPayload` if the body is not a JSON object
    pub async fn exchange_auth_code(&self, code: &str) -> Result<AuthExchangeResponse, BridgeError> {
        LoggingHelper::log_auth_exchange_start(&self.auth_url);

        let response = self
            .client
            .post(&self.auth_url)
            .json(&json!({ "token": code }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            log::error!("Authentication error: endpoint answered {status}");
            return Err(BridgeError::HttpError(status.as_u16()));
        }

        response
            .json::<AuthExchangeResponse>()
            .await
            .map_err(|e| BridgeError::InvalidPayload(format!("auth response: {e}")))
    }

    /// Run the complete sign-in: host auth code, then token exchange
    ///
    /// # Errors
    ///
    /// Returns the first failing step's error
    pub async fn authenticate(&self) -> Result<HostAuthentication, BridgeError> {
        let auth_code = self.request_auth_code(&self.auth_scopes).await?;
        let response = self.exchange_auth_code(&auth_code).await?;
        LoggingHelper::log_auth_exchange_success(response.token.is_some());

        Ok(HostAuthentication {
            auth_code,
            token: response.token,
            profile: response.profile,
        })
    }

    /// Obtain a payment URL and hand it to the host pay UI
    ///
    /// `invoice` overrides the charged invoice for QR-initiated payments. A
    /// notification is shown for every outcome, whether or not the caller
    /// also reports the error.
    ///
    /// # Errors
    ///
    /// - `NotHostRuntime` / `CapabilityUnavailable` without a usable host
    /// - `PaymentFailed` when the payment endpoint cannot produce a URL or
    ///   the host pay UI reports a failure
    pub async fn initiate_payment(
        &self,
        token: &str,
        invoice: Option<&Invoice>,
    ) -> Result<Value, BridgeError> {
        LoggingHelper::log_payment_start(invoice);

        let (host, payment_url) = match self.prepare_payment(token, invoice).await {
            Ok(prepared) => prepared,
            Err(e) => {
                log::error!("Payment error: {e}");
                self.show_notification(&self.messages.payment_error);
                return Err(match e {
                    BridgeError::NotHostRuntime | BridgeError::CapabilityUnavailable(_) => e,
                    other => BridgeError::PaymentFailed(other.to_string()),
                });
            }
        };

        match host_call(|success, fail| host.trade_pay(&payment_url, success, fail)).await {
            Ok(result) => {
                LoggingHelper::log_payment_result(true);
                self.show_notification(&self.messages.payment_success);
                Ok(result)
            }
            Err(details) => {
                LoggingHelper::log_payment_result(false);
                self.show_notification(&self.messages.payment_failed);
                Err(BridgeError::PaymentFailed(details.to_string()))
            }
        }
    }

    async fn prepare_payment(
        &self,
        token: &str,
        invoice: Option<&Invoice>,
    ) -> Result<(&Arc<dyn HostRuntime>, String), BridgeError> {
        let host = self.host()?;
        if !host.has_capability(Capability::TradePay) {
            return Err(BridgeError::CapabilityUnavailable(
                Capability::TradePay.name().to_string(),
            ));
        }

        let request = self
            .client
            .post(&self.payment_url)
            .header(AUTHORIZATION, token);
        let request = match invoice {
            Some(invoice) => request.json(invoice),
            None => request.header(CONTENT_TYPE, "application/json"),
        };

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(BridgeError::HttpError(status.as_u16()));
        }

        let body: PaymentUrlResponse = response
            .json()
            .await
            .map_err(|e| BridgeError::InvalidPayload(format!("payment response: {e}")))?;
        Ok((host, body.url))
    }

    /// Scan a payment QR code and decode its invoice
    ///
    /// # Errors
    ///
    /// - `NotHostRuntime` outside a host
    /// - `CapabilityUnavailable` if the host has no scanner
    /// - `ScanFailed` when the scanner reports a failure
    /// - `InvalidPayload` if the content is not an invoice
    pub async fn scan_qr_code(&self) -> Result<Invoice, BridgeError> {
        let host = self.host()?;
        if !host.has_capability(Capability::Scan) {
            return Err(BridgeError::CapabilityUnavailable(
                Capability::Scan.name().to_string(),
            ));
        }

        let scanned = host_call(|success, fail| host.scan(success, fail))
            .await
            .map_err(|details| BridgeError::ScanFailed(details.to_string()))?;
        log::debug!("Scanned QR payload of {} bytes", scanned.code.len());

        Self::parse_invoice_payload(&scanned.code)
    }

    /// Decode `{"invoiceId": ..., "amount": ...}` from scanned QR content
    ///
    /// Numeric invoice ids and numeric-string amounts are accepted.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPayload` if the content is not a JSON object or a
    /// required field is missing or malformed
    pub fn parse_invoice_payload(raw: &str) -> Result<Invoice, BridgeError> {
        let value: Value = serde_json::from_str(raw)
            .map_err(|e| BridgeError::InvalidPayload(format!("QR content is not JSON: {e}")))?;

        let invoice_id = match value.get("invoiceId") {
            Some(Value::String(id)) if !id.trim().is_empty() => id.clone(),
            Some(Value::Number(id)) => id.to_string(),
            _ => {
                return Err(BridgeError::InvalidPayload(
                    "missing invoiceId".to_string(),
                ))
            }
        };

        let amount = match value.get("amount") {
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
        .filter(|amount| amount.is_finite())
        .ok_or_else(|| BridgeError::InvalidPayload("missing or invalid amount".to_string()))?;

        Ok(Invoice { invoice_id, amount })
    }

    /// Show a message through the host alert, or the fallback notifier
    pub fn show_notification(&self, message: &str) {
        match self.adapter.runtime() {
            Some(host) if host.has_capability(Capability::Alert) => host.alert(message),
            _ => self.notifier.notify(message),
        }
    }
}
