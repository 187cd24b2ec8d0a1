//! Mock host runtime and notifier
//!
//! `MockHostRuntime` answers every capability synchronously with a scripted
//! outcome and records what it was asked to do.

use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::Mutex;

use crate::bridge::{
    AuthCodeResponse, Capability, FailureCallback, HostRuntime, Notifier, ScanResponse,
    SuccessCallback,
};

use super::constants::{TEST_AUTH_CODE, TEST_QR_PAYLOAD};

/// Scriptable stand-in for the Mini App container
pub struct MockHostRuntime {
    capabilities: HashSet<Capability>,
    auth: Result<String, Value>,
    payment: Result<Value, Value>,
    scan: Result<String, Value>,
    calls: Mutex<Vec<String>>,
    alerts: Mutex<Vec<String>>,
    payment_urls: Mutex<Vec<String>>,
}

impl Default for MockHostRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl MockHostRuntime {
    /// Host with every capability, succeeding at everything
    #[must_use]
    pub fn new() -> Self {
        Self {
            capabilities: [
                Capability::AuthCode,
                Capability::TradePay,
                Capability::Scan,
                Capability::Alert,
            ]
            .into_iter()
            .collect(),
            auth: Ok(TEST_AUTH_CODE.to_string()),
            payment: Ok(json!({ "resultCode": "9000" })),
            scan: Ok(TEST_QR_PAYLOAD.to_string()),
            calls: Mutex::new(Vec::new()),
            alerts: Mutex::new(Vec::new()),
            payment_urls: Mutex::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn with_auth_code(mut self, code: &str) -> Self {
        self.auth = Ok(code.to_string());
        self
    }

    #[must_use]
    pub fn failing_auth(mut self, details: &str) -> Self {
        self.auth = Err(json!({ "error": details }));
        self
    }

    #[must_use]
    pub fn with_payment_result(mut self, result: Value) -> Self {
        self.payment = Ok(result);
        self
    }

    #[must_use]
    pub fn failing_payment(mut self, details: &str) -> Self {
        self.payment = Err(json!({ "error": details }));
        self
    }

    #[must_use]
    pub fn with_scan_payload(mut self, payload: &str) -> Self {
        self.scan = Ok(payload.to_string());
        self
    }

    #[must_use]
    pub fn failing_scan(mut self, details: &str) -> Self {
        self.scan = Err(json!({ "error": details }));
        self
    }

    #[must_use]
    pub fn without_capability(mut self, capability: Capability) -> Self {
        self.capabilities.remove(&capability);
        self
    }

    /// Capability invocations in order, e.g. `getAuthCode:auth_base,USER_ID`
    ///
    /// # Panics
    ///
    /// Panics if the recording lock is poisoned
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// # Panics
    ///
    /// Panics if the recording lock is poisoned
    #[must_use]
    pub fn alerts(&self) -> Vec<String> {
        self.alerts.lock().unwrap().clone()
    }

    /// URLs handed to the native pay UI
    ///
    /// # Panics
    ///
    /// Panics if the recording lock is poisoned
    #[must_use]
    pub fn payment_urls(&self) -> Vec<String> {
        self.payment_urls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

impl HostRuntime for MockHostRuntime {
    fn has_capability(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }

    fn get_auth_code(
        &self,
        scopes: &[String],
        success: SuccessCallback<AuthCodeResponse>,
        fail: FailureCallback,
    ) {
        self.record(format!("getAuthCode:{}", scopes.join(",")));
        match &self.auth {
            Ok(code) => success(AuthCodeResponse {
                auth_code: code.clone(),
            }),
            Err(details) => fail(details.clone()),
        }
    }

    fn trade_pay(&self, payment_url: &str, success: SuccessCallback<Value>, fail: FailureCallback) {
        self.record(format!("tradePay:{payment_url}"));
        self.payment_urls.lock().unwrap().push(payment_url.to_string());
        match &self.payment {
            Ok(result) => success(result.clone()),
            Err(details) => fail(details.clone()),
        }
    }

    fn scan(&self, success: SuccessCallback<ScanResponse>, fail: FailureCallback) {
        self.record("scan".to_string());
        match &self.scan {
            Ok(code) => success(ScanResponse { code: code.clone() }),
            Err(details) => fail(details.clone()),
        }
    }

    fn alert(&self, content: &str) {
        self.alerts.lock().unwrap().push(content.to_string());
    }
}

/// Notifier that keeps every message it is given
#[derive(Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    /// # Panics
    ///
    /// Panics if the recording lock is poisoned
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }
}
