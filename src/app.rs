//! Application state
//!
//! `TravelInsuranceApp` wires the bridge, session manager and document manager
//! together and exposes the user-facing flows: quoting, issuance, rendering,
//! account actions and payment.

use serde_json::{Map, Value};
use std::sync::Arc;

use crate::bridge::{BridgeError, Invoice, MiniAppBridge};
use crate::documents::{DocumentManager, DocumentRenderer, RenderedDocument};
use crate::errors::InsuranceError;
use crate::models::{DocumentDraft, InsuranceDocument, TravelerDetails, TripDetails, User};
use crate::pricing::{calculate_price, PricingResult};
use crate::session::{Session, SessionManager};
use crate::settings::TravelSettings;
use crate::storage::{KeyValueStore, PersistenceMirror};

pub struct TravelInsuranceApp {
    settings: TravelSettings,
    bridge: Arc<MiniAppBridge>,
    session: SessionManager,
    documents: DocumentManager,
}

impl std::fmt::Debug for TravelInsuranceApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TravelInsuranceApp")
            .field("bridge", &self.bridge)
            .field("session", self.session.session())
            .field("documents", &self.documents)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Lifecycle
// =============================================================================

impl TravelInsuranceApp {
    #[must_use]
    pub fn new(settings: TravelSettings, bridge: MiniAppBridge, store: Arc<dyn KeyValueStore>) -> Self {
        let bridge = Arc::new(bridge);
        let mirror = PersistenceMirror::new(store);
        Self {
            session: SessionManager::new(Arc::clone(&bridge), mirror.clone()),
            documents: DocumentManager::new(mirror),
            settings,
            bridge,
        }
    }

    /// Install a rich document renderer
    #[must_use]
    pub fn with_renderer(mut self, renderer: Arc<dyn DocumentRenderer>) -> Self {
        self.documents = self.documents.with_renderer(renderer);
        self
    }

    /// Establish the startup session and load its documents
    pub async fn initialize(&mut self) {
        log::info!("🚀 Initializing travelsure v{}", crate::VERSION);
        self.session.initialize().await;
        self.refresh_documents();
    }

    /// Drop in-memory session and document state; persisted data is kept
    pub fn shutdown(&mut self) {
        self.session.reset();
        self.documents.set_user(None);
        log::info!("🛑 Application state released");
    }

    fn refresh_documents(&mut self) {
        self.documents.set_user(self.session.current_user());
    }
}

// =============================================================================
// Accessors
// =============================================================================

impl TravelInsuranceApp {
    #[must_use]
    pub fn settings(&self) -> &TravelSettings {
        &self.settings
    }

    #[must_use]
    pub fn bridge(&self) -> &MiniAppBridge {
        &self.bridge
    }

    #[must_use]
    pub fn session(&self) -> &Session {
        self.session.session()
    }

    #[must_use]
    pub fn current_user(&self) -> Option<&User> {
        self.session.current_user()
    }

    /// The current user's documents
    #[must_use]
    pub fn documents(&self) -> &[InsuranceDocument] {
        self.documents.documents()
    }

    #[must_use]
    pub fn document_manager(&self) -> &DocumentManager {
        &self.documents
    }

    #[must_use]
    pub fn get_document_by_id(&self, id: &str) -> Option<&InsuranceDocument> {
        self.documents.get_document_by_id(id)
    }
}

// =============================================================================
// Issuance
// =============================================================================

impl TravelInsuranceApp {
    /// Price the trip step of the form; `None` until all trip fields parse
    #[must_use]
    pub fn quote(&self, trip: &TripDetails) -> Option<PricingResult> {
        calculate_price(&trip.destination, &trip.start_date, &trip.end_date)
    }

    /// Issue a document from a prepared draft for the current user
    ///
    /// # Errors
    ///
    /// - `Unauthenticated` without a current user
    /// - `Persistence` if the collection cannot be written
    pub fn create_document(&mut self, draft: DocumentDraft) -> Result<InsuranceDocument, InsuranceError> {
        self.documents
            .create_document(self.session.current_user(), draft)
    }

    /// Validate both form steps, price the trip and issue the document
    ///
    /// # Errors
    ///
    /// - `InvalidRequest` naming the incomplete step, or when the dates cannot be priced
    /// - anything `create_document` returns
    pub fn issue_document(
        &mut self,
        traveler: TravelerDetails,
        trip: TripDetails,
    ) -> Result<InsuranceDocument, InsuranceError> {
        let missing = traveler.missing_fields();
        if !missing.is_empty() {
            return Err(InsuranceError::InvalidRequest(format!(
                "traveler details incomplete: {}",
                missing.join(", ")
            )));
        }
        let missing = trip.missing_fields();
        if !missing.is_empty() {
            return Err(InsuranceError::InvalidRequest(format!(
                "trip details incomplete: {}",
                missing.join(", ")
            )));
        }

        let pricing = self.quote(&trip).ok_or_else(|| {
            InsuranceError::InvalidRequest(format!(
                "trip dates cannot be priced: {} to {}",
                trip.start_date, trip.end_date
            ))
        })?;

        self.create_document(DocumentDraft::new(traveler, trip, &pricing))
    }

    /// Render a document for download
    ///
    /// # Errors
    ///
    /// `NotFound` for unknown ids, `Render` if no rendering could be produced
    pub async fn render_document(&self, id: &str) -> Result<RenderedDocument, InsuranceError> {
        self.documents.render_document(id).await
    }
}

// =============================================================================
// Account actions
// =============================================================================

impl TravelInsuranceApp {
    pub async fn login(&mut self, email: &str, password: &str) -> User {
        let user = self.session.login(email, password).await;
        self.refresh_documents();
        user
    }

    pub async fn register(&mut self, email: &str, password: &str, name: &str) -> User {
        let user = self.session.register(email, password, name).await;
        self.refresh_documents();
        user
    }

    pub async fn reauthenticate(&mut self) -> bool {
        let refreshed = self.session.reauthenticate().await;
        self.refresh_documents();
        refreshed
    }

    /// Sign out and wipe persisted session data and documents
    ///
    /// # Errors
    ///
    /// Returns `Persistence` if the wipe fails; the in-memory state is cleared regardless
    pub fn logout(&mut self) -> Result<(), InsuranceError> {
        let cleared = self.session.logout();
        self.refresh_documents();
        cleared.map_err(InsuranceError::from)
    }

    /// Merge profile fields into the current user
    ///
    /// # Errors
    ///
    /// See [`SessionManager::update_profile`]
    pub fn update_profile(&mut self, fields: Map<String, Value>) -> Result<&User, InsuranceError> {
        let user = self.session.update_profile(fields)?;
        self.documents.set_user(Some(user));
        Ok(user)
    }
}

// =============================================================================
// Payment
// =============================================================================

impl TravelInsuranceApp {
    /// Pay inside the host, optionally for a specific invoice
    ///
    /// A missing token triggers one re-authentication attempt first.
    ///
    /// # Errors
    ///
    /// - `Bridge(NotHostRuntime)` outside a host runtime
    /// - `Unauthenticated` if no token can be obtained
    /// - any `Bridge` error from the payment itself
    pub async fn pay(&mut self, invoice: Option<&Invoice>) -> Result<Value, InsuranceError> {
        if !self.session.session().is_host_runtime() {
            self.bridge
                .show_notification(&self.bridge.messages().payment_host_only);
            return Err(BridgeError::NotHostRuntime.into());
        }

        if self.session.token().is_none() {
            log::info!("No session token, re-authenticating before payment");
            self.reauthenticate().await;
        }

        let Some(token) = self.session.token().map(str::to_owned) else {
            self.bridge
                .show_notification(&self.bridge.messages().login_required);
            return Err(InsuranceError::Unauthenticated);
        };

        Ok(self.bridge.initiate_payment(&token, invoice).await?)
    }

    /// Scan a payment QR code and pay the invoice it carries
    ///
    /// # Errors
    ///
    /// - `Bridge(NotHostRuntime)` outside a host runtime
    /// - the scan error when the code cannot be read
    /// - anything `pay` returns
    pub async fn pay_with_qr(&mut self) -> Result<Value, InsuranceError> {
        if !self.session.session().is_host_runtime() {
            self.bridge
                .show_notification(&self.bridge.messages().payment_host_only);
            return Err(BridgeError::NotHostRuntime.into());
        }

        let invoice = match self.bridge.scan_qr_code().await {
            Ok(invoice) => invoice,
            Err(e) => {
                log::warn!("QR payment aborted: {e}");
                self.bridge
                    .show_notification(&self.bridge.messages().scan_failed);
                return Err(e.into());
            }
        };

        self.pay(Some(&invoice)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{KeyValueStore, DOCUMENTS_KEY};
    use crate::testing::fixtures::TestFixtures;
    use crate::testing::mock::MockHostRuntime;

    const UNUSED_BASE_URL: &str = "http://127.0.0.1:9";

    #[tokio::test]
    async fn test_local_issuance_flow() {
        let mut harness = TestFixtures::local_app(UNUSED_BASE_URL);
        harness.app.initialize().await;
        harness.app.login("noor@example.com", "pw").await;

        let document = harness
            .app
            .issue_document(TestFixtures::traveler(), TestFixtures::trip())
            .unwrap();

        assert_eq!(document.details.duration, 10);
        assert_eq!(document.details.price, 100);
        assert_eq!(harness.app.documents(), std::slice::from_ref(&document));
        assert!(harness.store.get(DOCUMENTS_KEY).unwrap().is_some());
    }

    #[tokio::test]
    async fn test_issue_document_validates_steps() {
        let mut harness = TestFixtures::local_app(UNUSED_BASE_URL);
        harness.app.login("noor@example.com", "pw").await;

        let mut traveler = TestFixtures::traveler();
        traveler.passport_number.clear();
        match harness.app.issue_document(traveler, TestFixtures::trip()) {
            Err(InsuranceError::InvalidRequest(message)) => {
                assert!(message.contains("traveler"));
                assert!(message.contains("passportNumber"));
            }
            other => panic!("expected InvalidRequest, got {other:?}"),
        }

        let mut trip = TestFixtures::trip();
        trip.end_date = "someday".to_string();
        assert!(matches!(
            harness.app.issue_document(TestFixtures::traveler(), trip),
            Err(InsuranceError::InvalidRequest(_))
        ));
        assert!(harness.app.documents().is_empty());
    }

    #[tokio::test]
    async fn test_issue_without_user_is_unauthenticated() {
        let mut harness = TestFixtures::local_app(UNUSED_BASE_URL);
        harness.app.initialize().await;
        assert!(matches!(
            harness
                .app
                .issue_document(TestFixtures::traveler(), TestFixtures::trip()),
            Err(InsuranceError::Unauthenticated)
        ));
    }

    #[tokio::test]
    async fn test_pay_outside_host_is_rejected_with_notice() {
        let mut harness = TestFixtures::local_app(UNUSED_BASE_URL);
        harness.app.initialize().await;

        let result = harness.app.pay(None).await;
        assert!(matches!(
            result,
            Err(InsuranceError::Bridge(BridgeError::NotHostRuntime))
        ));
        assert_eq!(
            harness.notifier.messages(),
            vec!["الدفع متاح فقط في تطبيق الميني آب".to_string()]
        );
    }

    #[tokio::test]
    async fn test_pay_without_token_asks_for_login() {
        let mut harness = TestFixtures::host_app(
            UNUSED_BASE_URL,
            MockHostRuntime::new().failing_auth("user cancelled"),
        );
        harness.app.initialize().await;

        let result = harness.app.pay(None).await;
        assert!(matches!(result, Err(InsuranceError::Unauthenticated)));

        let host = harness.host.unwrap();
        assert_eq!(host.alerts(), vec!["يجب تسجيل الدخول أولاً".to_string()]);
        assert!(host.payment_urls().is_empty());
    }

    #[tokio::test]
    async fn test_logout_clears_view_and_storage() {
        let mut harness = TestFixtures::local_app(UNUSED_BASE_URL);
        harness.app.login("noor@example.com", "pw").await;
        harness
            .app
            .issue_document(TestFixtures::traveler(), TestFixtures::trip())
            .unwrap();

        harness.app.logout().unwrap();

        assert!(harness.app.current_user().is_none());
        assert!(harness.app.documents().is_empty());
        assert!(harness.app.document_manager().all_documents().is_empty());
    }

    #[tokio::test]
    async fn test_shutdown_keeps_persisted_documents() {
        let mut harness = TestFixtures::local_app(UNUSED_BASE_URL);
        let user = harness.app.login("noor@example.com", "pw").await;
        harness
            .app
            .issue_document(TestFixtures::traveler(), TestFixtures::trip())
            .unwrap();

        harness.app.shutdown();
        assert!(harness.app.current_user().is_none());

        harness.app.initialize().await;
        assert_eq!(harness.app.current_user().map(|u| u.id.clone()), Some(user.id));
        assert_eq!(harness.app.documents().len(), 1);
    }
}
