//! Test fixtures providing pre-built test objects

use chrono::{Duration, TimeZone, Utc};
use std::sync::Arc;

use crate::app::TravelInsuranceApp;
use crate::bridge::{HostAdapter, HostRuntime, MiniAppBridge};
use crate::models::{DocumentDraft, DocumentStatus, InsuranceDocument, TravelerDetails, TripDetails, User};
use crate::pricing::price_for_range;
use crate::settings::{StorageBackend, TravelSettings};
use crate::storage::MemoryStore;

use super::constants::{TEST_EMAIL, TEST_USER_NAME};
use super::mock::{MockHostRuntime, RecordingNotifier};

/// Central fixture provider for all test data
pub struct TestFixtures;

/// Everything a test needs to drive an app and inspect its surroundings
pub struct TestHarness {
    pub app: TravelInsuranceApp,
    pub host: Option<Arc<MockHostRuntime>>,
    pub notifier: Arc<RecordingNotifier>,
    pub store: Arc<MemoryStore>,
}

impl TestFixtures {
    /// Settings pointing both endpoints at `base_url`, with in-memory storage
    #[must_use]
    pub fn settings_for(base_url: &str) -> TravelSettings {
        let mut settings = TravelSettings::default();
        settings.api.base_url = base_url.to_string();
        settings.storage.backend = StorageBackend::Memory;
        settings
    }

    #[must_use]
    pub fn user(id: &str) -> User {
        let mut user = User::local(TEST_EMAIL, TEST_USER_NAME);
        user.id = id.to_string();
        user
    }

    #[must_use]
    pub fn traveler() -> TravelerDetails {
        TravelerDetails {
            name: "علي حسن".to_string(),
            birth_date: "1990-04-12".to_string(),
            gender: "ذكر".to_string(),
            passport_number: "A12345678".to_string(),
        }
    }

    /// Ten-day regional trip
    #[must_use]
    pub fn trip() -> TripDetails {
        TripDetails {
            destination: "تركيا".to_string(),
            start_date: "2025-07-01".to_string(),
            end_date: "2025-07-10".to_string(),
        }
    }

    /// Draft for `trip()`, priced at a fixed range
    #[must_use]
    pub fn draft() -> DocumentDraft {
        let trip = Self::trip();
        let start = Utc.with_ymd_and_hms(2025, 7, 1, 0, 0, 0).unwrap();
        let end = start + Duration::days(9);
        let pricing = price_for_range(&trip.destination, start, end);
        DocumentDraft::new(Self::traveler(), trip, &pricing)
    }

    #[must_use]
    pub fn issued_document(user_id: &str) -> InsuranceDocument {
        let now = Utc::now();
        InsuranceDocument {
            id: format!("DOC-{}-fixture01", now.timestamp_millis()),
            user_id: user_id.to_string(),
            details: Self::draft(),
            status: DocumentStatus::Active,
            created_at: now,
            document_number: format!("INS-{}", now.timestamp_millis()),
        }
    }

    /// App without a host runtime
    #[must_use]
    pub fn local_app(base_url: &str) -> TestHarness {
        Self::harness(base_url, None)
    }

    /// App running inside the given mock host
    #[must_use]
    pub fn host_app(base_url: &str, host: MockHostRuntime) -> TestHarness {
        Self::harness(base_url, Some(Arc::new(host)))
    }

    fn harness(base_url: &str, host: Option<Arc<MockHostRuntime>>) -> TestHarness {
        let settings = Self::settings_for(base_url);
        let notifier = Arc::new(RecordingNotifier::default());
        let store = Arc::new(MemoryStore::new());

        let runtime = host.clone().map(|h| -> Arc<dyn HostRuntime> { h });
        let bridge = MiniAppBridge::new(HostAdapter::detect(runtime), &settings)
            .with_notifier(notifier.clone());
        let app = TravelInsuranceApp::new(settings, bridge, store.clone());

        TestHarness {
            app,
            host,
            notifier,
            store,
        }
    }
}
