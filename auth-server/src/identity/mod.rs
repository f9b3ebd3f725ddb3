//! Identity provider accounts mirrored from customer records
//!
//! The gateway keeps one user pool account per customer, keyed by email. It
//! never owns the account data: it reconciles it against the customer table
//! and uses a derived credential to mint sessions on the customer's behalf.
//!
//! ## Account attributes
//! - `email` / `custom:customer_id`: mirrored on every sign-in
//! - `custom:cpf`: written once when the account is created, never updated
//! - `email_verified`: set to `true` at creation so no confirmation is sent

pub mod cognito;
pub mod credential;
pub mod reconcile;

use crate::models::SessionTokens;
use credential::Credential;
use std::collections::HashMap;
use thiserror::Error;

pub const ATTR_EMAIL: &str = "email";
pub const ATTR_EMAIL_VERIFIED: &str = "email_verified";
pub const ATTR_CUSTOMER_ID: &str = "custom:customer_id";
pub const ATTR_CPF: &str = "custom:cpf";

/// Errors that can occur while talking to the identity provider
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Account not found: {0}")]
    AccountNotFound(String),
    #[error("{message}")]
    Provider {
        operation: &'static str,
        code: Option<String>,
        message: String,
    },
    #[error("Authentication requires an unsupported challenge: {0}")]
    ChallengeRequired(String),
    #[error("Invalid account attribute: {0}")]
    InvalidAttribute(String),
}

impl IdentityError {
    pub fn provider<S: ToString>(operation: &'static str, code: Option<String>, message: S) -> Self {
        Self::Provider {
            operation,
            code,
            message: message.to_string(),
        }
    }
}

/// Single name/value attribute of an identity account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountAttribute {
    pub name: String,
    pub value: String,
}

impl AccountAttribute {
    pub fn new<N: Into<String>, V: Into<String>>(name: N, value: V) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Identity account as returned by an admin lookup
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IdentityAccount {
    pub username: String,
    pub attributes: HashMap<String, String>,
}

impl IdentityAccount {
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }
}

/// Administrative operations on identity accounts.
///
/// Every method is a single request to the provider; none of them retry.
#[async_trait::async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Fetch an account by username. A missing account is
    /// `IdentityError::AccountNotFound`.
    async fn get_account(&self, username: &str) -> Result<IdentityAccount, IdentityError>;

    /// Create an account without sending any invitation message
    async fn create_account(
        &self,
        username: &str,
        attributes: &[AccountAttribute],
        temporary_credential: &Credential,
    ) -> Result<(), IdentityError>;

    /// Overwrite the given attributes, leaving the others untouched
    async fn update_attributes(
        &self,
        username: &str,
        attributes: &[AccountAttribute],
    ) -> Result<(), IdentityError>;

    /// Set the account password, optionally as permanent
    async fn set_credential(
        &self,
        username: &str,
        credential: &Credential,
        permanent: bool,
    ) -> Result<(), IdentityError>;

    /// Non-interactive admin authentication returning a fresh session
    async fn authenticate(
        &self,
        username: &str,
        credential: &Credential,
    ) -> Result<SessionTokens, IdentityError>;
}
