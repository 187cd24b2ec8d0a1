//! Mini App host bridge
//!
//! This module adapts the embedding host's native capabilities (auth code,
//! pay UI, QR scanner, alerts) and the remote auth/payment endpoints into
//! async operations with typed errors.

mod errors;
mod host;
mod notifier;
mod service;

pub use errors::BridgeError;
pub use host::{
    AuthCodeResponse, Capability, FailureCallback, HostAdapter, HostRuntime, ScanResponse,
    SuccessCallback,
};
pub use notifier::{LogNotifier, Notifier};
pub use service::{AuthExchangeResponse, HostAuthentication, Invoice, MiniAppBridge};
