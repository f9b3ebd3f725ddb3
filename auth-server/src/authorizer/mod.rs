//! Bearer token authorization
//!
//! Turns the token of an authorizer event into an IAM-style policy. A token
//! that fails verification yields a Deny policy; only a request without any
//! token is rejected outright.

pub mod jwks;
pub mod verifier;

use crate::models::AuthorizationContext;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use verifier::TokenVerifier;

const POLICY_VERSION: &str = "2012-10-17";
const INVOKE_ACTION: &str = "execute-api:Invoke";
/// Principal of every Deny policy, since a rejected token names nobody
const ANONYMOUS_PRINCIPAL: &str = "user";

/// Reasons a token cannot be trusted
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("Invalid token: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
    #[error("Token header has no key id")]
    MissingKeyId,
    #[error("Unsupported signing algorithm: {0}")]
    UnsupportedAlgorithm(String),
    #[error("Unknown signing key: {0}")]
    UnknownKey(String),
    #[error("Failed to fetch signing keys: {0}")]
    KeyFetch(String),
    #[error("Invalid token claims: {0}")]
    InvalidClaims(String),
}

/// The request carried no token at all
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unauthorized")]
pub struct Unauthorized;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum Effect {
    Allow,
    Deny,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyStatement {
    pub action: String,
    pub effect: Effect,
    pub resource: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyDocument {
    pub version: String,
    pub statement: Vec<PolicyStatement>,
}

/// Authorizer event as delivered by the API gateway
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizerEvent {
    #[serde(default, rename = "type")]
    pub event_type: Option<String>,
    #[serde(default)]
    pub authorization_token: Option<String>,
    #[serde(default)]
    pub method_arn: Option<String>,
}

/// Policy returned for an authorizer event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizerResponse {
    pub principal_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy_document: Option<PolicyDocument>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<AuthorizationContext>,
}

impl AuthorizerResponse {
    pub fn new(principal_id: &str, effect: Effect, resource: Option<&str>) -> Self {
        let policy_document = resource.filter(|r| !r.is_empty()).map(|resource| PolicyDocument {
            version: POLICY_VERSION.to_string(),
            statement: vec![PolicyStatement {
                action: INVOKE_ACTION.to_string(),
                effect,
                resource: resource.to_string(),
            }],
        });

        Self {
            principal_id: principal_id.to_string(),
            policy_document,
            context: None,
        }
    }

    pub fn with_context(mut self, context: AuthorizationContext) -> Self {
        self.context = Some(context);
        self
    }

    pub fn effect(&self) -> Option<Effect> {
        self.policy_document
            .as_ref()
            .and_then(|doc| doc.statement.first())
            .map(|statement| statement.effect)
    }
}

/// Removes the optional `Bearer ` scheme. Returns None when nothing is left.
pub fn extract_token(authorization: Option<&str>) -> Option<&str> {
    let raw = authorization?;
    let token = raw.strip_prefix("Bearer ").unwrap_or(raw);
    (!token.is_empty()).then_some(token)
}

/// Decide the policy for an authorizer event
pub async fn authorize(
    verifier: &dyn TokenVerifier,
    event: &AuthorizerEvent,
) -> Result<AuthorizerResponse, Unauthorized> {
    let Some(token) = extract_token(event.authorization_token.as_deref()) else {
        warn!("Authorizer event without token");
        return Err(Unauthorized);
    };
    let method_arn = event.method_arn.as_deref();

    match verifier.verify(token).await {
        Ok(claims) => {
            info!("Allowing {} for {:?}", claims.sub, method_arn);
            let context = AuthorizationContext {
                customer_id: claims.customer_id.unwrap_or_default(),
                cpf: claims.cpf.unwrap_or_default(),
                email: claims.email.unwrap_or_default(),
            };
            Ok(AuthorizerResponse::new(&claims.sub, Effect::Allow, method_arn).with_context(context))
        }
        Err(e) => {
            warn!("Token validation failed: {}", e);
            debug!("Denying {:?}", method_arn);
            Ok(AuthorizerResponse::new(
                ANONYMOUS_PRINCIPAL,
                Effect::Deny,
                method_arn,
            ))
        }
    }
}
