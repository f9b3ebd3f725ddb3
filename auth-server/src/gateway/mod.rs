//! Inbound event handling
//!
//! One function serves two kinds of events. Authorizer events carry a bearer
//! token and get a policy back; anything else is treated as a sign-in request
//! whose body holds the customer's CPF.

pub mod response;

use crate::authorizer::{self, AuthorizerEvent, AuthorizerResponse, Unauthorized};
use crate::identity::reconcile::SessionIssuer;
use crate::models::AuthenticationResult;
use crate::state::AppState;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use log::{debug, error, info, warn};
use response::GatewayResponse;
use serde_json::{json, Value};

/// Body of a sign-in request in whatever form the transport delivered it
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Absent,
    /// Raw bytes, expected to be JSON text
    Raw(Vec<u8>),
    /// Base64 encoded JSON text
    Base64(String),
    /// Already decoded by the transport
    Json(Value),
}

impl RequestBody {
    /// Decode to a JSON value. An absent or empty body is an empty object.
    pub fn parse(&self) -> Result<Value, String> {
        match self {
            RequestBody::Absent => Ok(json!({})),
            RequestBody::Raw(bytes) => parse_json(bytes),
            RequestBody::Base64(encoded) => {
                let bytes = STANDARD
                    .decode(encoded.trim())
                    .map_err(|e| format!("invalid base64 body: {e}"))?;
                parse_json(&bytes)
            }
            RequestBody::Json(value) => Ok(value.clone()),
        }
    }
}

fn parse_json(bytes: &[u8]) -> Result<Value, String> {
    if bytes.is_empty() {
        return Ok(json!({}));
    }
    serde_json::from_slice(bytes).map_err(|e| e.to_string())
}

/// An inbound event, classified once by its shape
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    Authorize(AuthorizerEvent),
    Authenticate(RequestBody),
}

impl InboundEvent {
    /// Authorizer events are marked `"type": "TOKEN"` or carry a non-empty
    /// `authorizationToken`. Everything else is a sign-in request.
    pub fn classify(event: &Value) -> Self {
        let event_type = event.get("type").and_then(Value::as_str);
        let token = event.get("authorizationToken").and_then(Value::as_str);

        if event_type == Some("TOKEN") || token.is_some_and(|t| !t.is_empty()) {
            return InboundEvent::Authorize(AuthorizerEvent {
                event_type: event_type.map(str::to_string),
                authorization_token: token.map(str::to_string),
                method_arn: event
                    .get("methodArn")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            });
        }

        let base64_encoded = event
            .get("isBase64Encoded")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let body = match event.get("body") {
            None | Some(Value::Null) => RequestBody::Absent,
            Some(Value::String(text)) if base64_encoded => RequestBody::Base64(text.clone()),
            Some(Value::String(text)) => RequestBody::Raw(text.clone().into_bytes()),
            Some(other) => RequestBody::Json(other.clone()),
        };
        InboundEvent::Authenticate(body)
    }
}

/// Result of handling any inbound event
#[derive(Debug)]
pub enum Invocation {
    Authenticated(GatewayResponse),
    Authorized(AuthorizerResponse),
    Rejected(Unauthorized),
}

/// Handle a raw event of either kind
pub async fn handle_event(state: &AppState, event: InboundEvent) -> Invocation {
    match event {
        InboundEvent::Authorize(event) => {
            debug!(
                "Authorizer event (type {:?}) for {:?}",
                event.event_type, event.method_arn
            );
            match authorizer::authorize(state.verifier.as_ref(), &event).await {
                Ok(policy) => Invocation::Authorized(policy),
                Err(e) => Invocation::Rejected(e),
            }
        }
        InboundEvent::Authenticate(body) => {
            Invocation::Authenticated(handle_authentication(state, &body).await)
        }
    }
}

/// CPF from the decoded body. Numbers are accepted and read as digits.
fn extract_cpf(body: &Value) -> Option<String> {
    match body.get("cpf")? {
        Value::String(cpf) if !cpf.is_empty() => Some(cpf.clone()),
        Value::Number(cpf) if cpf.as_f64() != Some(0.0) => Some(cpf.to_string()),
        _ => None,
    }
}

/// Sign-in: resolve the customer, reconcile the identity account and return
/// a fresh session.
pub async fn handle_authentication(state: &AppState, body: &RequestBody) -> GatewayResponse {
    let body = match body.parse() {
        Ok(body) => body,
        Err(e) => {
            warn!("Rejecting request body: {}", e);
            return GatewayResponse::invalid_json();
        }
    };

    let Some(cpf) = extract_cpf(&body) else {
        return GatewayResponse::cpf_required();
    };

    let customer = match state.store.find_by_cpf(&cpf).await {
        Ok(Some(customer)) => customer,
        Ok(None) => {
            info!("No customer registered for the given CPF");
            return GatewayResponse::customer_not_found();
        }
        Err(e) => {
            error!("Customer lookup failed: {}", e);
            return GatewayResponse::internal(e.to_string());
        }
    };

    let issuer = SessionIssuer::new(state.identity.as_ref(), state.credentials.as_ref());
    match issuer.issue_session(&customer).await {
        Ok(tokens) => {
            info!("Issued session for customer {}", customer.id);
            GatewayResponse::authenticated(&AuthenticationResult::new(tokens, &customer))
        }
        Err(e) => {
            error!("Session issuance failed for customer {}: {}", customer.id, e);
            GatewayResponse::internal(e.to_string())
        }
    }
}
