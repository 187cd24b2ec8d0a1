// Integration tests for sign-in, issuance and document views
//
// The auth endpoint is served by wiremock; the host container is the
// scriptable mock from `travelsure::testing`.

use serde_json::json;
use travelsure::session::AuthMode;
use travelsure::storage::{DOCUMENTS_KEY, TOKEN_KEY, USER_KEY};
use travelsure::testing::fixtures::TestFixtures;
use travelsure::testing::mock::MockHostRuntime;
use travelsure::{InsuranceError, KeyValueStore, SessionState, TripDetails, Zone};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const AUTH_PATH: &str = "/api/auth-with-superQi";

async fn mount_auth(server: &MockServer, code: &str, body: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path(AUTH_PATH))
        .and(body_json(json!({ "token": code })))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_host_sign_in_establishes_token_and_user() {
    let server = MockServer::start().await;
    mount_auth(
        &server,
        "code-7",
        json!({
            "token": "tok-7",
            "id": "u-7",
            "phone": "07700000000",
            "nickname": "Ali",
            "city": "Baghdad"
        }),
    )
    .await;

    let mut harness =
        TestFixtures::host_app(&server.uri(), MockHostRuntime::new().with_auth_code("code-7"));
    harness.app.initialize().await;

    let session = harness.app.session();
    assert_eq!(session.state(), SessionState::Authenticated(AuthMode::Host));
    assert_eq!(session.token(), Some("tok-7"));
    assert!(session.can_pay());

    let user = harness.app.current_user().unwrap();
    assert_eq!(user.id, "u-7");
    assert_eq!(user.email, "07700000000");
    assert_eq!(user.name, "Ali");
    assert_eq!(user.auth_code.as_deref(), Some("code-7"));
    assert_eq!(user.profile.get("city"), Some(&json!("Baghdad")));

    assert_eq!(
        harness.store.get(TOKEN_KEY).unwrap().as_deref(),
        Some("tok-7")
    );
    assert!(harness.store.get(USER_KEY).unwrap().is_some());

    let host = harness.host.unwrap();
    assert_eq!(host.alerts(), vec!["تم تسجيل الدخول بنجاح".to_string()]);
}

#[tokio::test]
async fn test_host_profile_without_fields_uses_defaults() {
    let server = MockServer::start().await;
    mount_auth(&server, "code-8", json!({ "token": "tok-8" })).await;

    let mut harness =
        TestFixtures::host_app(&server.uri(), MockHostRuntime::new().with_auth_code("code-8"));
    let user = harness.app.login("fallback@example.com", "ignored").await;

    assert_eq!(user.email, "fallback@example.com");
    assert_eq!(user.name, "المستخدم");
    assert!(!user.id.is_empty());
}

#[tokio::test]
async fn test_rejected_exchange_degrades_to_local_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(AUTH_PATH))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let mut harness = TestFixtures::host_app(&server.uri(), MockHostRuntime::new());
    harness.app.initialize().await;

    assert!(harness.app.current_user().is_none());
    assert!(harness.app.session().token().is_none());
    assert_eq!(harness.app.session().state(), SessionState::Anonymous);

    let user = harness.app.login("sara@example.com", "pw").await;
    assert_eq!(user.name, "sara");
    assert!(harness.app.session().token().is_none());
    assert_eq!(
        harness.app.session().state(),
        SessionState::Authenticated(AuthMode::Local)
    );
}

#[tokio::test]
async fn test_full_issuance_flow() {
    let server = MockServer::start().await;
    mount_auth(
        &server,
        "code-9",
        json!({ "token": "tok-9", "id": "u-9", "email": "noor@example.com", "name": "Noor" }),
    )
    .await;

    let mut harness =
        TestFixtures::host_app(&server.uri(), MockHostRuntime::new().with_auth_code("code-9"));
    harness.app.initialize().await;

    let trip = TripDetails {
        destination: "فرنسا".to_string(),
        start_date: "2025-01-01".to_string(),
        end_date: "2025-01-05".to_string(),
    };
    let quote = harness.app.quote(&trip).unwrap();
    assert_eq!(quote.zone, Zone::International);
    assert_eq!(quote.duration, 5);
    assert_eq!(quote.price, 200);

    let document = harness
        .app
        .issue_document(TestFixtures::traveler(), trip)
        .unwrap();
    assert_eq!(document.user_id, "u-9");
    assert_eq!(document.details.price, 200);
    assert_eq!(document.details.zone, Zone::International);

    let stored = harness.store.get(DOCUMENTS_KEY).unwrap().unwrap();
    assert!(stored.contains(&document.document_number));

    let rendered = harness.app.render_document(&document.id).await.unwrap();
    assert!(rendered.file_name.contains(&document.document_number));

    assert_eq!(harness.app.get_document_by_id(&document.id), Some(&document));
}

#[tokio::test]
async fn test_documents_are_scoped_per_user() {
    let mut harness = TestFixtures::local_app("http://127.0.0.1:9");

    let first = harness.app.register("a@example.com", "pw", "A").await;
    let first_doc = harness
        .app
        .issue_document(TestFixtures::traveler(), TestFixtures::trip())
        .unwrap();

    // Local ids are millisecond timestamps
    std::thread::sleep(std::time::Duration::from_millis(2));
    let second = harness.app.register("b@example.com", "pw", "B").await;
    assert_ne!(first.id, second.id);
    assert!(harness.app.documents().is_empty());
    assert_eq!(
        harness.app.get_document_by_id(&first_doc.id),
        Some(&first_doc)
    );

    assert!(matches!(
        harness.app.render_document("DOC-missing").await,
        Err(InsuranceError::NotFound(_))
    ));
}
