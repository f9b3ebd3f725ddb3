use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Customer record as stored in the customers table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    /// Numeric primary key
    pub id: i64,
    /// Customer CPF, the external identifier used to sign in
    pub cpf: String,
    /// Email address, also the identity account username
    pub email: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Customer {
    /// Full name as shown to API clients
    pub fn display_name(&self) -> String {
        format!(
            "{} {}",
            self.first_name.as_deref().unwrap_or_default(),
            self.last_name.as_deref().unwrap_or_default()
        )
    }
}

/// Tokens minted by the identity provider, passed through untouched
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SessionTokens {
    pub id_token: String,
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Token lifetime in seconds
    pub expires_in: i32,
}

/// Public view of the authenticated customer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UserSummary {
    pub id: i64,
    pub cpf: String,
    pub email: String,
    pub name: String,
}

impl From<&Customer> for UserSummary {
    fn from(customer: &Customer) -> Self {
        Self {
            id: customer.id,
            cpf: customer.cpf.clone(),
            email: customer.email.clone(),
            name: customer.display_name(),
        }
    }
}

/// Successful response of the authentication endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationResult {
    /// ID token, the one expected by the authorizer
    pub token: String,
    pub access_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub expires_in: i32,
    pub user: UserSummary,
}

impl AuthenticationResult {
    pub fn new(tokens: SessionTokens, customer: &Customer) -> Self {
        Self {
            token: tokens.id_token,
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            expires_in: tokens.expires_in,
            user: UserSummary::from(customer),
        }
    }
}

/// Request body of the authentication endpoint
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthenticationRequest {
    /// Customer CPF
    pub cpf: String,
}

/// Error body shared by all authentication responses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

/// Identity extracted from a verified token and forwarded to backends
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationContext {
    pub customer_id: String,
    pub cpf: String,
    pub email: String,
}
