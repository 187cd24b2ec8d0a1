//! Host runtime capability surface
//!
//! The embedding Mini App container exposes callback-style capabilities. They
//! are modelled by the `HostRuntime` trait and selected once at startup through
//! `HostAdapter`. `host_call` turns one callback pair into a single-shot future.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

/// Success continuation handed to a host capability
pub type SuccessCallback<T> = Box<dyn FnOnce(T) + Send + 'static>;

/// Failure continuation handed to a host capability, carrying the host's error object
pub type FailureCallback = Box<dyn FnOnce(Value) + Send + 'static>;

/// Native capabilities a host runtime may expose
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    AuthCode,
    TradePay,
    Scan,
    Alert,
}

impl Capability {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Capability::AuthCode => "getAuthCode",
            Capability::TradePay => "tradePay",
            Capability::Scan => "scan",
            Capability::Alert => "alert",
        }
    }
}

/// Successful auth code request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AuthCodeResponse {
    pub auth_code: String,
}

/// Successful scan: the raw decoded QR content
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScanResponse {
    pub code: String,
}

/// Native capability surface of the embedding container
///
/// Implementations must invoke at most one of the two callbacks per call.
pub trait HostRuntime: Send + Sync {
    /// Whether the host exposes `capability`
    fn has_capability(&self, capability: Capability) -> bool;

    /// Request an auth code for the given scopes
    fn get_auth_code(
        &self,
        scopes: &[String],
        success: SuccessCallback<AuthCodeResponse>,
        fail: FailureCallback,
    );

    /// Open the native pay UI for a payment-provider URL
    fn trade_pay(&self, payment_url: &str, success: SuccessCallback<Value>, fail: FailureCallback);

    /// Open the native QR scanner
    fn scan(&self, success: SuccessCallback<ScanResponse>, fail: FailureCallback);

    /// Show a native alert
    fn alert(&self, content: &str);
}

/// Host integration selected once at startup
#[derive(Clone, Default)]
pub enum HostAdapter {
    /// Running inside a Mini App host
    Host(Arc<dyn HostRuntime>),
    /// Plain environment without host capabilities
    #[default]
    Fallback,
}

impl fmt::Debug for HostAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostAdapter::Host(_) => f.write_str("HostAdapter::Host"),
            HostAdapter::Fallback => f.write_str("HostAdapter::Fallback"),
        }
    }
}

impl HostAdapter {
    /// Select the adapter for an optional runtime
    ///
    /// A runtime only counts as a host when it exposes the auth code capability.
    #[must_use]
    pub fn detect(runtime: Option<Arc<dyn HostRuntime>>) -> Self {
        match runtime {
            Some(runtime) if runtime.has_capability(Capability::AuthCode) => {
                HostAdapter::Host(runtime)
            }
            _ => HostAdapter::Fallback,
        }
    }

    #[must_use]
    pub fn is_host(&self) -> bool {
        matches!(self, HostAdapter::Host(_))
    }

    #[must_use]
    pub fn runtime(&self) -> Option<&Arc<dyn HostRuntime>> {
        match self {
            HostAdapter::Host(runtime) => Some(runtime),
            HostAdapter::Fallback => None,
        }
    }
}

/// Await a callback-style host call
///
/// The first callback to fire settles the future; later invocations are
/// ignored. If the host drops both callbacks the call fails with a
/// descriptive error object.
pub(crate) async fn host_call<T, F>(invoke: F) -> Result<T, Value>
where
    T: Send + 'static,
    F: FnOnce(SuccessCallback<T>, FailureCallback),
{
    let (tx, rx) = oneshot::channel::<Result<T, Value>>();
    let sender = Arc::new(Mutex::new(Some(tx)));
    let fail_sender = Arc::clone(&sender);

    invoke(
        Box::new(move |value| settle(&sender, Ok(value))),
        Box::new(move |error| settle(&fail_sender, Err(error))),
    );

    match rx.await {
        Ok(outcome) => outcome,
        Err(_) => Err(json!({ "error": "host released the callbacks without responding" })),
    }
}

type SharedSender<T> = Arc<Mutex<Option<oneshot::Sender<Result<T, Value>>>>>;

fn settle<T>(sender: &SharedSender<T>, outcome: Result<T, Value>) {
    let taken = sender.lock().ok().and_then(|mut guard| guard.take());
    if let Some(tx) = taken {
        // Receiver gone means the caller stopped waiting
        let _ = tx.send(outcome);
    }
}
