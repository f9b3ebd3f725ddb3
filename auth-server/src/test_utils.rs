use crate::authorizer::verifier::{CognitoJwtVerifier, TokenClaims, TokenVerifier};
use crate::authorizer::VerifyError;
use crate::config::AuthConfig;
use crate::create_app;
use crate::identity::credential::{Credential, CredentialPolicy};
use crate::identity::{AccountAttribute, IdentityAccount, IdentityError, IdentityProvider};
use crate::models::{Customer, SessionTokens};
use crate::state::AppState;
use crate::store::{CustomerStore, StoreError};
use async_trait::async_trait;
use axum::body::Body;
use axum::Router;
use http::{HeaderMap, Method, Request, StatusCode};
use http_body_util::BodyExt;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use log::LevelFilter;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};
use tower::ServiceExt;
use wiremock::matchers;
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Key id of the signing key published in the test key set
pub const TEST_KID: &str = "test-key-1";

const SIGNING_KEY: &[u8] = include_bytes!("../tests/fixtures/jwt_signing_key.pem");
const ROGUE_KEY: &[u8] = include_bytes!("../tests/fixtures/jwt_rogue_key.pem");
const JWKS: &str = include_str!("../tests/fixtures/jwks.json");

/// Key set containing the public half of the test signing key
pub fn jwks_body() -> Value {
    serde_json::from_str(JWKS).expect("Invalid test key set")
}

/// The customer every fake store knows about
pub fn test_customer() -> Customer {
    Customer {
        id: 42,
        cpf: "12345678900".to_string(),
        email: "maria@example.com".to_string(),
        first_name: Some("Maria".to_string()),
        last_name: Some("Silva".to_string()),
        created_at: None,
        updated_at: None,
    }
}

/// Claims of a token as the user pool would mint it
#[derive(Debug, Clone, Serialize)]
pub struct TestClaims {
    pub sub: String,
    pub iss: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
    pub exp: u64,
    pub iat: u64,
    pub token_use: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(rename = "custom:customer_id", skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    #[serde(rename = "custom:cpf", skip_serializing_if = "Option::is_none")]
    pub cpf: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
}

impl TestClaims {
    fn now() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("Clock before epoch")
            .as_secs()
    }

    /// ID token for the test customer, valid for an hour
    pub fn id_token(issuer: &str) -> Self {
        let now = Self::now();
        Self {
            sub: "user-sub-123".to_string(),
            iss: issuer.to_string(),
            aud: Some("test-client-id".to_string()),
            exp: now + 3600,
            iat: now,
            token_use: "id".to_string(),
            email: Some("maria@example.com".to_string()),
            customer_id: Some("42".to_string()),
            cpf: Some("12345678900".to_string()),
            client_id: None,
        }
    }

    /// Access token for the test client, without custom attributes
    pub fn access_token(issuer: &str) -> Self {
        Self {
            aud: None,
            token_use: "access".to_string(),
            email: None,
            customer_id: None,
            cpf: None,
            client_id: Some("test-client-id".to_string()),
            ..Self::id_token(issuer)
        }
    }
}

fn sign_with(claims: &TestClaims, pem: &[u8]) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(TEST_KID.to_string());
    let key = EncodingKey::from_rsa_pem(pem).expect("Invalid test signing key");
    encode(&header, claims, &key).expect("Failed to sign test token")
}

/// Token signed with the key published in the test key set
pub fn sign_token(claims: &TestClaims) -> String {
    sign_with(claims, SIGNING_KEY)
}

/// Token that names the published key id but is signed with a shared secret
pub fn sign_token_with_secret(claims: &TestClaims, secret: &[u8]) -> String {
    let mut header = Header::new(Algorithm::HS256);
    header.kid = Some(TEST_KID.to_string());
    encode(&header, claims, &EncodingKey::from_secret(secret)).expect("Failed to sign test token")
}

/// Token that names the published key id but is signed with another key
pub fn sign_token_with_rogue_key(claims: &TestClaims) -> String {
    sign_with(claims, ROGUE_KEY)
}

/// Verifier returning a fixed answer, for tests that do not need real tokens
pub struct StaticVerifier {
    claims: Option<TokenClaims>,
}

impl StaticVerifier {
    pub fn accepting() -> Self {
        Self::accepting_claims(TokenClaims {
            sub: "user-sub-123".to_string(),
            email: Some("maria@example.com".to_string()),
            customer_id: Some("42".to_string()),
            cpf: Some("12345678900".to_string()),
            token_use: Some("id".to_string()),
            client_id: None,
        })
    }

    pub fn accepting_claims(claims: TokenClaims) -> Self {
        Self {
            claims: Some(claims),
        }
    }

    pub fn rejecting() -> Self {
        Self { claims: None }
    }
}

#[async_trait]
impl TokenVerifier for StaticVerifier {
    async fn verify(&self, _token: &str) -> Result<TokenClaims, VerifyError> {
        self.claims
            .clone()
            .ok_or_else(|| VerifyError::InvalidClaims("rejected by test verifier".to_string()))
    }
}

/// In-memory customer store recording every lookup
pub struct FakeCustomerStore {
    customers: Vec<Customer>,
    failing: bool,
    lookups: Mutex<Vec<String>>,
}

impl Default for FakeCustomerStore {
    fn default() -> Self {
        Self {
            customers: vec![test_customer()],
            failing: false,
            lookups: Mutex::new(Vec::new()),
        }
    }
}

impl FakeCustomerStore {
    /// Store whose every operation fails as if the pool were exhausted
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn lookups(&self) -> Vec<String> {
        self.lookups.lock().unwrap().clone()
    }
}

#[async_trait]
impl CustomerStore for FakeCustomerStore {
    async fn find_by_cpf(&self, cpf: &str) -> Result<Option<Customer>, StoreError> {
        self.lookups.lock().unwrap().push(cpf.to_string());
        if self.failing {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(self.customers.iter().find(|c| c.cpf == cpf).cloned())
    }

    async fn health_check(&self) -> Result<(), String> {
        if self.failing {
            Err("MySQL ping failed: pool timed out".to_string())
        } else {
            Ok(())
        }
    }

    async fn close(&self) {}
}

/// A single request made to the fake identity provider
#[derive(Debug, Clone, PartialEq)]
pub enum FakeCall {
    Get(String),
    Create {
        username: String,
        attributes: Vec<AccountAttribute>,
        credential: String,
    },
    Update {
        username: String,
        attributes: Vec<AccountAttribute>,
    },
    SetCredential {
        username: String,
        credential: String,
        permanent: bool,
    },
    Authenticate {
        username: String,
        credential: String,
    },
}

/// Identity provider keeping accounts in memory and recording every call
#[derive(Default)]
pub struct FakeIdentityProvider {
    accounts: Mutex<HashMap<String, IdentityAccount>>,
    lookup_error: Option<String>,
    auth_error: Option<String>,
    calls: Mutex<Vec<FakeCall>>,
}

impl FakeIdentityProvider {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_account(account: IdentityAccount) -> Self {
        let provider = Self::default();
        provider
            .accounts
            .lock()
            .unwrap()
            .insert(account.username.clone(), account);
        provider
    }

    /// Every lookup fails with this provider message
    pub fn failing_lookup(message: &str) -> Self {
        Self {
            lookup_error: Some(message.to_string()),
            ..Self::default()
        }
    }

    /// Authentication fails with this provider message
    pub fn failing_auth(mut self, message: &str) -> Self {
        self.auth_error = Some(message.to_string());
        self
    }

    pub fn calls(&self) -> Vec<FakeCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn update_calls(&self) -> Vec<Vec<AccountAttribute>> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                FakeCall::Update { attributes, .. } => Some(attributes),
                _ => None,
            })
            .collect()
    }

    pub fn set_credential_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, FakeCall::SetCredential { .. }))
            .count()
    }

    fn record(&self, call: FakeCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentityProvider {
    async fn get_account(&self, username: &str) -> Result<IdentityAccount, IdentityError> {
        self.record(FakeCall::Get(username.to_string()));
        if let Some(message) = &self.lookup_error {
            return Err(IdentityError::provider(
                "AdminGetUser",
                Some("TooManyRequestsException".to_string()),
                message,
            ));
        }
        self.accounts
            .lock()
            .unwrap()
            .get(username)
            .cloned()
            .ok_or_else(|| IdentityError::AccountNotFound(username.to_string()))
    }

    async fn create_account(
        &self,
        username: &str,
        attributes: &[AccountAttribute],
        temporary_credential: &Credential,
    ) -> Result<(), IdentityError> {
        self.record(FakeCall::Create {
            username: username.to_string(),
            attributes: attributes.to_vec(),
            credential: temporary_credential.expose().to_string(),
        });
        let account = IdentityAccount {
            username: username.to_string(),
            attributes: attributes
                .iter()
                .map(|a| (a.name.clone(), a.value.clone()))
                .collect(),
        };
        self.accounts
            .lock()
            .unwrap()
            .insert(username.to_string(), account);
        Ok(())
    }

    async fn update_attributes(
        &self,
        username: &str,
        attributes: &[AccountAttribute],
    ) -> Result<(), IdentityError> {
        self.record(FakeCall::Update {
            username: username.to_string(),
            attributes: attributes.to_vec(),
        });
        Ok(())
    }

    async fn set_credential(
        &self,
        username: &str,
        credential: &Credential,
        permanent: bool,
    ) -> Result<(), IdentityError> {
        self.record(FakeCall::SetCredential {
            username: username.to_string(),
            credential: credential.expose().to_string(),
            permanent,
        });
        Ok(())
    }

    async fn authenticate(
        &self,
        username: &str,
        credential: &Credential,
    ) -> Result<SessionTokens, IdentityError> {
        self.record(FakeCall::Authenticate {
            username: username.to_string(),
            credential: credential.expose().to_string(),
        });
        if let Some(message) = &self.auth_error {
            return Err(IdentityError::provider(
                "AdminInitiateAuth",
                Some("NotAuthorizedException".to_string()),
                message,
            ));
        }
        Ok(SessionTokens {
            id_token: format!("id-token-{username}"),
            access_token: format!("access-token-{username}"),
            refresh_token: Some("refresh-token".to_string()),
            expires_in: 3600,
        })
    }
}

/// Test fixture for setting up a complete test environment with fake
/// collaborators.
///
/// The customer store and identity provider are in-memory fakes. Tokens are
/// verified for real against a key set served by a wiremock server, which
/// also acts as the token issuer.
///
/// # Examples
///
/// ```rust
/// #[tokio::test]
/// async fn test_endpoint() {
///     let fixture = TestFixture::new().await;
///
///     let response = fixture.post("/auth", &json!({"cpf": "12345678900"})).await;
///
///     response.assert_ok();
///     assert_eq!(response.json["user"]["id"], 42);
/// }
/// ```
pub struct TestFixture {
    /// The application router
    pub app: Router,
    /// State shared by the router
    pub state: AppState,
    /// Mock server publishing the signing keys
    pub jwks_mock: MockServer,
    pub store: Arc<FakeCustomerStore>,
    pub identity: Arc<FakeIdentityProvider>,
}

impl TestFixture {
    /// Creates a fixture whose store knows the test customer and whose
    /// identity provider starts without accounts.
    pub async fn new() -> Self {
        Self::build(FakeCustomerStore::default(), FakeIdentityProvider::empty()).await
    }

    pub async fn with_failing_store() -> Self {
        Self::build(FakeCustomerStore::failing(), FakeIdentityProvider::empty()).await
    }

    pub async fn with_identity(identity: FakeIdentityProvider) -> Self {
        Self::build(FakeCustomerStore::default(), identity).await
    }

    async fn build(store: FakeCustomerStore, identity: FakeIdentityProvider) -> Self {
        Self::setup_logger(LevelFilter::Debug);

        let jwks_mock = MockServer::start().await;
        Mock::given(matchers::method("GET"))
            .and(matchers::path("/.well-known/jwks.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(jwks_body()))
            .mount(&jwks_mock)
            .await;

        let config = AuthConfig::for_test_with_mocks(&jwks_mock);
        let store = Arc::new(store);
        let identity = Arc::new(identity);
        let verifier =
            CognitoJwtVerifier::new(&config.cognito).expect("Invalid test verifier config");
        let state = AppState {
            config: Arc::new(config),
            store: store.clone(),
            identity: identity.clone(),
            verifier: Arc::new(verifier),
            credentials: Arc::new(CredentialPolicy::default()),
        };
        let app = create_app(state.clone()).await;

        Self {
            app,
            state,
            jwks_mock,
            store,
            identity,
        }
    }

    /// Initializes the test logger with customized settings.
    pub fn setup_logger(level: LevelFilter) {
        let _ = env_logger::builder()
            .filter_level(level)
            .is_test(true)
            .try_init();
    }

    /// Creates a request builder with a JSON content type
    pub fn request_builder(&self, method: Method, uri: impl AsRef<str>) -> http::request::Builder {
        Request::builder()
            .method(method)
            .uri(uri.as_ref())
            .header("Content-Type", "application/json")
    }

    /// Sends a GET request to the specified URI.
    pub async fn get(&self, uri: impl AsRef<str>) -> TestResponse {
        let request = self
            .request_builder(Method::GET, uri)
            .body(Body::empty())
            .expect("Failed to build request");

        self.send(request).await
    }

    /// Sends a POST request with a JSON body to the specified URI.
    pub async fn post<T: Serialize>(&self, uri: impl AsRef<str>, body: &T) -> TestResponse {
        let json_body = serde_json::to_vec(body).expect("Failed to serialize body to JSON");
        self.post_raw(uri, json_body).await
    }

    /// Sends a POST request with the body bytes exactly as given
    pub async fn post_raw(&self, uri: impl AsRef<str>, body: impl Into<Body>) -> TestResponse {
        let request = self
            .request_builder(Method::POST, uri)
            .body(body.into())
            .expect("Failed to build request");

        self.send(request).await
    }

    /// Sends a POST request with a JSON body and custom headers.
    pub async fn post_with_headers<T: Serialize>(
        &self,
        uri: impl AsRef<str>,
        body: &T,
        headers: &[(&str, &str)],
    ) -> TestResponse {
        let json_body = serde_json::to_vec(body).expect("Failed to serialize body to JSON");
        let mut builder = self.request_builder(Method::POST, uri);

        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }

        let request = builder
            .body(Body::from(json_body))
            .expect("Failed to build request");

        self.send(request).await
    }

    /// Sends a request and returns a TestResponse.
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read response body")
            .to_bytes();

        // Try to parse as JSON, defaulting to empty object if parsing fails or empty body
        let json = if !body.is_empty() {
            serde_json::from_slice(&body).unwrap_or_else(|_| serde_json::json!({}))
        } else {
            serde_json::json!({})
        };

        TestResponse {
            status,
            headers,
            json,
        }
    }
}

/// Response from a test request that provides convenient access to status and JSON body.
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// Response body as JSON (if present and valid JSON)
    pub json: Value,
}

impl TestResponse {
    /// Asserts that the response has the expected status code.
    pub fn assert_status(&self, expected: StatusCode) -> &Self {
        assert_eq!(
            self.status,
            expected,
            "Expected status {} but got {} with body: {}",
            expected,
            self.status,
            serde_json::to_string_pretty(&self.json).unwrap_or_default()
        );
        self
    }

    /// Asserts that the response status is OK (200).
    pub fn assert_ok(&self) -> &Self {
        self.assert_status(StatusCode::OK)
    }

    /// Value of a response header, if present and printable
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Converts the response body to the specified type.
    pub fn json_as<T: DeserializeOwned>(&self) -> T {
        serde_json::from_value(self.json.clone()).expect("Failed to deserialize response JSON")
    }
}
