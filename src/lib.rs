#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

/// Version of the travelsure application
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod app;
pub mod bridge;
pub mod documents;
pub mod errors;
pub mod models;
pub mod pricing;
pub mod session;
pub mod settings;
pub mod storage;
pub mod utils;

// Testing utilities for unit and integration tests
#[cfg(any(test, feature = "testing"))]
pub mod testing;

/// Re-export commonly used items
pub use app::TravelInsuranceApp;
pub use bridge::{HostAdapter, HostRuntime, Invoice, MiniAppBridge};
pub use documents::DocumentManager;
pub use errors::InsuranceError;
pub use models::{DocumentDraft, DocumentStatus, InsuranceDocument, TravelerDetails, TripDetails, User};
pub use pricing::{calculate_price, destinations_by_zone, PricingResult, Zone};
pub use session::{Session, SessionManager, SessionState};
pub use settings::TravelSettings;
pub use storage::{KeyValueStore, PersistenceMirror};
