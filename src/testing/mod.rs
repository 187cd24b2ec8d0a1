//! Shared testing utilities
//!
//! Available to unit tests and, through the `testing` feature, to the
//! integration tests under `tests/`.
//!
//! - [`fixtures`] - Pre-built users, form data, documents and settings
//! - [`mock`] - A scriptable host runtime and a recording notifier
//!
//! ```rust,ignore
//! use travelsure::testing::{fixtures::TestFixtures, mock::MockHostRuntime};
//!
//! let host = MockHostRuntime::new().with_auth_code("code-1");
//! let settings = TestFixtures::settings_for("http://127.0.0.1:9000");
//! ```

pub mod fixtures;
pub mod mock;

pub use fixtures::TestFixtures;
pub use mock::{MockHostRuntime, RecordingNotifier};

/// Common test constants
pub mod constants {
    pub const TEST_EMAIL: &str = "traveler@example.com";

    pub const TEST_USER_NAME: &str = "Test Traveler";

    pub const TEST_AUTH_CODE: &str = "mock-auth-code";

    pub const TEST_TOKEN: &str = "mock-session-token";

    pub const TEST_PAYMENT_URL: &str = "https://pay.example.com/checkout/abc";

    /// Default content returned by the mock scanner
    pub const TEST_QR_PAYLOAD: &str = r#"{"invoiceId":"INV-1001","amount":25000}"#;
}
