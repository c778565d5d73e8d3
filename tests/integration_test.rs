// Integration tests for the club recruitment client
//
// These tests run the API client against a mock server and verify token
// attachment, renewal on 401, session teardown and the multi-step flows.

use mockito::{Matcher, Server, ServerGuard};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use club_recruit_client::api::{AnswerDraft, ApplicantOrdering, ApplicationDraft, IdentityLookup};
use club_recruit_client::auth::{
    CredentialPair, CredentialStore, IdentitySummary, MemoryStore, SessionManager,
    ACCESS_TOKEN_KEY, AUTH_USER_KEY, REFRESH_TOKEN_KEY,
};
use club_recruit_client::error::{ApiError, ErrorKind, RefreshError};
use club_recruit_client::http_client::{ApiClient, ClientOptions};
use club_recruit_client::models::NewApplicant;
use club_recruit_client::navigation::Navigator;

// ==================================================================================================
// Test Helpers
// ==================================================================================================

/// Records every forced redirect
#[derive(Default)]
struct RecordingNavigator {
    count: AtomicUsize,
    targets: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    fn targets(&self) -> Vec<String> {
        self.targets.lock().unwrap().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn redirect(&self, target: &str) {
        self.count.fetch_add(1, Ordering::SeqCst);
        self.targets.lock().unwrap().push(target.to_string());
    }
}

struct Harness {
    server: ServerGuard,
    store: Arc<MemoryStore>,
    navigator: Arc<RecordingNavigator>,
    client: ApiClient,
}

impl Harness {
    async fn new() -> Self {
        Self::with_endpoints(None, None).await
    }

    /// Harness whose API or refresh endpoint may live somewhere other than the mock server
    async fn with_endpoints(base_url: Option<String>, refresh_url: Option<String>) -> Self {
        let server = Server::new_async().await;
        let store = Arc::new(MemoryStore::new());
        let navigator = Arc::new(RecordingNavigator::default());
        let session = Arc::new(SessionManager::new(store.clone()));

        let options = ClientOptions {
            base_url: base_url.unwrap_or_else(|| format!("{}/api", server.url())),
            refresh_url: refresh_url
                .unwrap_or_else(|| format!("{}/api/login/refresh/", server.url())),
            login_path: "/login".to_string(),
            connect_timeout: 5,
            request_timeout: 10,
        };
        let client = ApiClient::new(options, session, navigator.clone()).unwrap();

        Self {
            server,
            store,
            navigator,
            client,
        }
    }

    /// Harness with an established A1/R1 session
    async fn logged_in() -> Self {
        let harness = Self::new().await;
        harness.store_session("A1", "R1");
        harness
    }

    fn store_session(&self, access: &str, refresh: &str) {
        self.client
            .session()
            .store_credentials(&CredentialPair {
                access_token: access.to_string(),
                refresh_token: refresh.to_string(),
            })
            .unwrap();
    }

    fn stored(&self, key: &str) -> Option<String> {
        self.store.get(key).unwrap()
    }
}

fn clubs_body() -> String {
    json!([{"id": 1, "name": "Chess"}]).to_string()
}

/// URL on a local port nothing listens on
fn unreachable_url(path: &str) -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}{}", port, path)
}

// ==================================================================================================
// Token attachment
// ==================================================================================================

#[tokio::test]
async fn test_login_stores_tokens_and_attaches_bearer() {
    let mut h = Harness::new().await;

    let login = h
        .server
        .mock("POST", "/api/login/")
        .match_header("authorization", Matcher::Missing)
        .match_body(Matcher::Json(json!({"username": "alice", "password": "p1"})))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"access": "A1", "refresh": "R1"}).to_string())
        .expect(1)
        .create_async()
        .await;

    let users = h
        .server
        .mock("GET", "/api/users/")
        .match_header("authorization", "Bearer A1")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!([{"username": "bob", "club": 1}, {"username": "alice", "club": 3}]).to_string())
        .expect(1)
        .create_async()
        .await;

    let clubs = h
        .server
        .mock("GET", "/api/club")
        .match_header("authorization", "Bearer A1")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(clubs_body())
        .expect(1)
        .create_async()
        .await;

    let outcome = h.client.login("alice", "p1").await.unwrap();
    assert_eq!(
        outcome.identity,
        IdentityLookup::Resolved(IdentitySummary {
            username: "alice".to_string(),
            club: Some(3),
        })
    );

    assert_eq!(h.stored(ACCESS_TOKEN_KEY).as_deref(), Some("A1"));
    assert_eq!(h.stored(REFRESH_TOKEN_KEY).as_deref(), Some("R1"));
    assert_eq!(
        h.client.session().identity().unwrap().and_then(|u| u.club),
        Some(3)
    );

    let listed = h.client.list_clubs().await.unwrap();
    assert_eq!(listed[0].name, "Chess");

    login.assert_async().await;
    users.assert_async().await;
    clubs.assert_async().await;
}

#[tokio::test]
async fn test_request_without_session_has_no_authorization_header() {
    let mut h = Harness::new().await;

    let clubs = h
        .server
        .mock("GET", "/api/club")
        .match_header("authorization", Matcher::Missing)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body("[]")
        .expect(1)
        .create_async()
        .await;

    assert!(h.client.list_clubs().await.unwrap().is_empty());
    clubs.assert_async().await;
}

#[tokio::test]
async fn test_login_sends_stored_bearer_token() {
    let mut h = Harness::new().await;
    h.store_session("A0", "R0");

    let login = h
        .server
        .mock("POST", "/api/login/")
        .match_header("authorization", "Bearer A0")
        .match_body(Matcher::Json(json!({"username": "alice", "password": "p1"})))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"access": "A1", "refresh": "R1"}).to_string())
        .expect(1)
        .create_async()
        .await;
    let users = h
        .server
        .mock("GET", "/api/users/")
        .match_header("authorization", "Bearer A1")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!([{"username": "alice", "club": 3}]).to_string())
        .expect(1)
        .create_async()
        .await;

    h.client.login("alice", "p1").await.unwrap();

    assert_eq!(h.stored(ACCESS_TOKEN_KEY).as_deref(), Some("A1"));
    assert_eq!(h.stored(REFRESH_TOKEN_KEY).as_deref(), Some("R1"));

    login.assert_async().await;
    users.assert_async().await;
}

#[tokio::test]
async fn test_wrong_password_without_session_expires_session() {
    let mut h = Harness::new().await;

    let login = h
        .server
        .mock("POST", "/api/login/")
        .match_header("authorization", Matcher::Missing)
        .with_status(401)
        .with_body(json!({"detail": "No active account found"}).to_string())
        .expect(1)
        .create_async()
        .await;
    let refresh = h
        .server
        .mock("POST", "/api/login/refresh/")
        .expect(0)
        .create_async()
        .await;

    // The 401 goes through renewal like any other request; with no refresh
    // token stored that fails without a network call
    let err = h.client.login("alice", "wrong").await.unwrap_err();
    assert!(matches!(
        err,
        ApiError::SessionExpired(RefreshError::MissingRefreshToken)
    ));
    assert_eq!(h.navigator.count(), 1);
    assert!(h.store.is_empty());

    login.assert_async().await;
    refresh.assert_async().await;
}

// ==================================================================================================
// Renewal on 401
// ==================================================================================================

#[tokio::test]
async fn test_unauthorized_refreshes_and_retries_once() {
    let mut h = Harness::logged_in().await;

    let rejected = h
        .server
        .mock("GET", "/api/club")
        .match_header("authorization", "Bearer A1")
        .with_status(401)
        .expect(1)
        .create_async()
        .await;
    let refresh = h
        .server
        .mock("POST", "/api/login/refresh/")
        .match_header("authorization", Matcher::Missing)
        .match_body(Matcher::Json(json!({"refresh": "R1"})))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"access": "A2"}).to_string())
        .expect(1)
        .create_async()
        .await;
    let retried = h
        .server
        .mock("GET", "/api/club")
        .match_header("authorization", "Bearer A2")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(clubs_body())
        .expect(1)
        .create_async()
        .await;

    let clubs = h.client.list_clubs().await.unwrap();
    assert_eq!(clubs.len(), 1);

    assert_eq!(h.stored(ACCESS_TOKEN_KEY).as_deref(), Some("A2"));
    assert_eq!(h.stored(REFRESH_TOKEN_KEY).as_deref(), Some("R1"));
    assert_eq!(h.navigator.count(), 0);

    rejected.assert_async().await;
    refresh.assert_async().await;
    retried.assert_async().await;
}

#[tokio::test]
async fn test_retry_that_fails_again_is_returned_without_second_refresh() {
    let mut h = Harness::logged_in().await;

    let first = h
        .server
        .mock("GET", "/api/club")
        .match_header("authorization", "Bearer A1")
        .with_status(401)
        .expect(1)
        .create_async()
        .await;
    let refresh = h
        .server
        .mock("POST", "/api/login/refresh/")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"access": "A2"}).to_string())
        .expect(1)
        .create_async()
        .await;
    let second = h
        .server
        .mock("GET", "/api/club")
        .match_header("authorization", "Bearer A2")
        .with_status(401)
        .with_body("still no")
        .expect(1)
        .create_async()
        .await;

    let err = h.client.list_clubs().await.unwrap_err();
    match err {
        ApiError::Status { status, ref body } => {
            assert_eq!(status, 401);
            assert_eq!(body, "still no");
        }
        other => panic!("unexpected error: {:?}", other),
    }

    // The renewed token stays; nothing is torn down
    assert_eq!(h.stored(ACCESS_TOKEN_KEY).as_deref(), Some("A2"));
    assert_eq!(h.navigator.count(), 0);

    first.assert_async().await;
    refresh.assert_async().await;
    second.assert_async().await;
}

#[tokio::test]
async fn test_other_errors_do_not_refresh() {
    let mut h = Harness::logged_in().await;

    let failing = h
        .server
        .mock("GET", "/api/club")
        .with_status(500)
        .with_body("boom")
        .expect(1)
        .create_async()
        .await;
    let refresh = h
        .server
        .mock("POST", "/api/login/refresh/")
        .expect(0)
        .create_async()
        .await;

    let err = h.client.list_clubs().await.unwrap_err();
    assert_eq!(err.status(), Some(500));
    assert_eq!(h.stored(ACCESS_TOKEN_KEY).as_deref(), Some("A1"));

    failing.assert_async().await;
    refresh.assert_async().await;
}

#[tokio::test]
async fn test_rejected_refresh_clears_tokens_and_redirects_once() {
    let mut h = Harness::logged_in().await;
    h.client
        .session()
        .store_identity(&IdentitySummary::username_only("alice"))
        .unwrap();

    let rejected = h
        .server
        .mock("GET", "/api/club")
        .match_header("authorization", "Bearer A1")
        .with_status(401)
        .expect(1)
        .create_async()
        .await;
    let refresh = h
        .server
        .mock("POST", "/api/login/refresh/")
        .with_status(401)
        .with_body(json!({"detail": "Token is invalid or expired"}).to_string())
        .expect(1)
        .create_async()
        .await;

    let err = h.client.list_clubs().await.unwrap_err();
    assert!(matches!(
        err,
        ApiError::SessionExpired(RefreshError::Rejected { status: 401, .. })
    ));

    assert_eq!(h.stored(ACCESS_TOKEN_KEY), None);
    assert_eq!(h.stored(REFRESH_TOKEN_KEY), None);
    // The cached identity survives a failed refresh
    assert!(h.stored(AUTH_USER_KEY).is_some());

    assert_eq!(h.navigator.count(), 1);
    assert_eq!(h.navigator.targets(), vec!["/login".to_string()]);

    rejected.assert_async().await;
    refresh.assert_async().await;
}

#[tokio::test]
async fn test_missing_refresh_token_fails_without_network_call() {
    let mut h = Harness::new().await;
    h.store.set(ACCESS_TOKEN_KEY, "A1").unwrap();

    let rejected = h
        .server
        .mock("GET", "/api/club")
        .with_status(401)
        .expect(1)
        .create_async()
        .await;
    let refresh = h
        .server
        .mock("POST", "/api/login/refresh/")
        .expect(0)
        .create_async()
        .await;

    let err = h.client.list_clubs().await.unwrap_err();
    assert!(matches!(
        err,
        ApiError::SessionExpired(RefreshError::MissingRefreshToken)
    ));
    assert_eq!(h.stored(ACCESS_TOKEN_KEY), None);
    assert_eq!(h.navigator.count(), 1);

    rejected.assert_async().await;
    refresh.assert_async().await;
}

#[tokio::test]
async fn test_unreachable_refresh_endpoint_expires_session() {
    let mut h =
        Harness::with_endpoints(None, Some(unreachable_url("/api/login/refresh/"))).await;
    h.store_session("A1", "R1");

    let rejected = h
        .server
        .mock("GET", "/api/club")
        .match_header("authorization", "Bearer A1")
        .with_status(401)
        .expect(1)
        .create_async()
        .await;

    let err = h.client.list_clubs().await.unwrap_err();
    assert!(matches!(
        err,
        ApiError::SessionExpired(RefreshError::Transport(_))
    ));
    assert_eq!(err.kind(), ErrorKind::SessionExpired);

    assert_eq!(h.stored(ACCESS_TOKEN_KEY), None);
    assert_eq!(h.stored(REFRESH_TOKEN_KEY), None);
    assert_eq!(h.navigator.count(), 1);
    assert_eq!(h.navigator.targets(), vec!["/login".to_string()]);

    rejected.assert_async().await;
}

#[tokio::test]
async fn test_unreachable_api_is_transport_error() {
    let h = Harness::with_endpoints(Some(unreachable_url("/api/")), None).await;
    h.store_session("A1", "R1");

    let err = h.client.list_clubs().await.unwrap_err();
    match err {
        ApiError::Transport { kind, .. } => assert_eq!(kind, "connection_failed"),
        ref other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(err.kind(), ErrorKind::Transport);
    assert_eq!(err.status(), None);

    // No response means no renewal and no teardown
    assert_eq!(h.stored(ACCESS_TOKEN_KEY).as_deref(), Some("A1"));
    assert_eq!(h.navigator.count(), 0);
}

#[tokio::test]
async fn test_concurrent_unauthorized_requests_share_one_refresh() {
    let mut h = Harness::logged_in().await;

    let rejected = h
        .server
        .mock("GET", "/api/club")
        .match_header("authorization", "Bearer A1")
        .with_status(401)
        .expect(2)
        .create_async()
        .await;
    let refresh = h
        .server
        .mock("POST", "/api/login/refresh/")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"access": "A2"}).to_string())
        .expect(1)
        .create_async()
        .await;
    let retried = h
        .server
        .mock("GET", "/api/club")
        .match_header("authorization", "Bearer A2")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(clubs_body())
        .expect(2)
        .create_async()
        .await;

    let (a, b) = tokio::join!(h.client.list_clubs(), h.client.list_clubs());
    assert_eq!(a.unwrap().len(), 1);
    assert_eq!(b.unwrap().len(), 1);
    assert_eq!(h.stored(ACCESS_TOKEN_KEY).as_deref(), Some("A2"));

    rejected.assert_async().await;
    refresh.assert_async().await;
    retried.assert_async().await;
}

// ==================================================================================================
// Session
// ==================================================================================================

#[tokio::test]
async fn test_identity_falls_back_to_username() {
    let mut h = Harness::new().await;

    let _login = h
        .server
        .mock("POST", "/api/login/")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"access": "A1", "refresh": "R1"}).to_string())
        .expect(2)
        .create_async()
        .await;

    let listing = h
        .server
        .mock("GET", "/api/users/")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!([{"username": "bob", "club": 1}]).to_string())
        .expect(1)
        .create_async()
        .await;

    let outcome = h.client.login("alice", "p1").await.unwrap();
    assert_eq!(
        outcome.identity,
        IdentityLookup::NotListed(IdentitySummary::username_only("alice"))
    );
    // Only a resolved identity is cached
    assert_eq!(h.stored(AUTH_USER_KEY), None);
    listing.assert_async().await;
    listing.remove_async().await;

    let _failing = h
        .server
        .mock("GET", "/api/users/")
        .with_status(500)
        .expect(1)
        .create_async()
        .await;

    let outcome = h.client.login("alice", "p1").await.unwrap();
    assert!(matches!(
        outcome.identity,
        IdentityLookup::Unavailable { ref identity, .. } if identity.username == "alice"
    ));
    assert_eq!(h.stored(ACCESS_TOKEN_KEY).as_deref(), Some("A1"));
}

#[tokio::test]
async fn test_logout_clears_everything_and_tolerates_no_session() {
    let h = Harness::new().await;

    // Nothing stored yet
    h.client.logout().unwrap();

    h.client
        .session()
        .store_credentials(&CredentialPair {
            access_token: "A1".to_string(),
            refresh_token: "R1".to_string(),
        })
        .unwrap();
    h.client
        .session()
        .store_identity(&IdentitySummary::username_only("alice"))
        .unwrap();

    h.client.logout().unwrap();
    assert!(h.store.is_empty());
    assert!(!h.client.session().init().unwrap().is_authenticated());
    assert_eq!(h.navigator.count(), 0);
}

// ==================================================================================================
// Resource flows
// ==================================================================================================

#[tokio::test]
async fn test_apply_reuses_existing_submission() {
    let mut h = Harness::new().await;

    let applicant = h
        .server
        .mock("POST", "/api/applicants/")
        .match_body(Matcher::PartialJson(json!({"first_name": "Amy", "application": 9})))
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "id": 12, "first_name": "Amy", "last_name": "Ng", "year": "2",
                "club_association": 3, "application_id": 9
            })
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;
    let duplicate = h
        .server
        .mock("POST", "/api/submission")
        .match_body(Matcher::Json(json!({"form": 9, "applicant": 12})))
        .with_status(400)
        .with_body(json!({"non_field_errors": ["already submitted"]}).to_string())
        .expect(1)
        .create_async()
        .await;
    let listing = h
        .server
        .mock("GET", "/api/submission")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!([
                {"id": 39, "form": 8, "applicant": 12, "answers": []},
                {"id": 40, "form": 9, "applicant": 12, "answers": []}
            ])
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;
    let answer = h
        .server
        .mock("POST", "/api/submission/40/answers")
        .match_body(Matcher::Json(
            json!({"submission": 40, "question": 5, "answer_text": "Robots"}),
        ))
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(
            json!({"id": 400, "submission": 40, "question": 5, "answer_text": "Robots"})
                .to_string(),
        )
        .expect(1)
        .create_async()
        .await;

    let draft = ApplicationDraft {
        applicant: NewApplicant {
            first_name: "Amy".to_string(),
            last_name: "Ng".to_string(),
            year: "2".to_string(),
            club_association: 3,
            application: 9,
        },
        answers: vec![AnswerDraft::Text {
            question: 5,
            text: "Robots".to_string(),
        }],
    };

    let receipt = h.client.submit_application(&draft).await.unwrap();
    assert_eq!(receipt.applicant.id, 12);
    assert_eq!(receipt.submission.id, 40);
    assert!(receipt.reused_submission);
    assert_eq!(receipt.answers.len(), 1);
    assert_eq!(receipt.answers[0].answer_text.as_deref(), Some("Robots"));

    applicant.assert_async().await;
    duplicate.assert_async().await;
    listing.assert_async().await;
    answer.assert_async().await;
}

#[tokio::test]
async fn test_file_answer_is_sent_as_multipart() {
    let mut h = Harness::logged_in().await;

    let upload = h
        .server
        .mock("POST", "/api/submission/40/answers")
        .match_header("authorization", "Bearer A1")
        .match_header(
            "content-type",
            Matcher::Regex("^multipart/form-data; boundary=".to_string()),
        )
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex(r#"name="question"\r\n\r\n6"#.to_string()),
            Matcher::Regex(r#"name="answer_file"; filename="cv.txt""#.to_string()),
            Matcher::Regex("hello recruiters".to_string()),
        ]))
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "id": 401, "submission": 40, "question": 6,
                "answer_file": "https://files.example.com/cv.txt"
            })
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;

    let answer = h
        .client
        .post_file_answer(40, 6, "cv.txt", bytes::Bytes::from_static(b"hello recruiters"))
        .await
        .unwrap();
    assert_eq!(
        answer.answer_file.as_deref(),
        Some("https://files.example.com/cv.txt")
    );

    upload.assert_async().await;
}

#[tokio::test]
async fn test_applicant_overview_passes_ordering() {
    let mut h = Harness::logged_in().await;

    let submissions = h
        .server
        .mock("GET", "/api/submission")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!([
                {"id": 40, "form": 9, "applicant": 1, "answers": [
                    {"id": 400, "submission": 40, "question": 5, "answer_text": "Robots"}
                ]},
                {"id": 41, "form": 9, "applicant": 2, "answers": []},
                {"id": 42, "form": 8, "applicant": 2, "answers": []}
            ])
            .to_string(),
        )
        .create_async()
        .await;
    let applicants = h
        .server
        .mock("GET", "/api/applicant")
        .match_query(Matcher::UrlEncoded("ordering".to_string(), "-year".to_string()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!([
                {"id": 2, "first_name": "Zed", "last_name": "Q", "year": "4", "club_association": 3},
                {"id": 1, "first_name": "Amy", "last_name": "Ng", "year": "2", "club_association": 3}
            ])
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;
    let questions = h
        .server
        .mock("GET", "/api/club/3/application/9/question")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!([
                {"id": 5, "form": 9, "prompt": "Favourite hobby?", "question_type": "Short", "required": true}
            ])
            .to_string(),
        )
        .create_async()
        .await;

    let rows = h
        .client
        .applicant_overview(3, 9, Some(&ApplicantOrdering::descending("year")))
        .await
        .unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].applicant.as_ref().unwrap().full_name(), "Zed Q");
    assert_eq!(rows[1].submission.id, 40);
    assert_eq!(
        rows[1].answers[0].question.as_ref().unwrap().prompt,
        "Favourite hobby?"
    );

    submissions.assert_async().await;
    applicants.assert_async().await;
    questions.assert_async().await;
}

#[tokio::test]
async fn test_paths_cannot_escape_base_url() {
    let h = Harness::new().await;
    let err = h
        .client
        .get("http://evil.example.com/steal")
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidPath(_)));
}
