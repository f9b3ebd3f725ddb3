use crate::headers::{presets, ResponseHeaders};
use crate::models::{AuthenticationResult, ErrorBody};
use axum::response::{IntoResponse, Response};
use axum::Json;
use http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use utoipa::ToSchema;

const INVALID_JSON: &str = "Invalid JSON in request body";
const CPF_REQUIRED: &str = "CPF is required";
const CUSTOMER_NOT_FOUND: &str = "Customer not found";
const CUSTOMER_NOT_FOUND_MESSAGE: &str =
    "Cliente não encontrado. Por favor, cadastre-se primeiro.";

/// Outcome of the issuance flow: a status and a JSON body
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayResponse {
    pub status: StatusCode,
    pub body: Value,
    headers: ResponseHeaders,
}

/// Proxy-integration envelope for event invocations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProxyResponse {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    /// JSON document serialized as a string
    pub body: String,
}

impl GatewayResponse {
    fn new(status: StatusCode, body: Value) -> Self {
        Self {
            status,
            body,
            headers: presets::public_json(),
        }
    }

    fn error(status: StatusCode, error: &str, message: impl Into<String>) -> Self {
        let body = ErrorBody {
            error: error.to_string(),
            message: message.into(),
        };
        Self::new(status, serde_json::to_value(body).unwrap_or_default())
    }

    pub fn authenticated(result: &AuthenticationResult) -> Self {
        let mut response = Self::new(
            StatusCode::OK,
            serde_json::to_value(result).unwrap_or_default(),
        );
        response.headers = presets::public_json().no_store();
        response
    }

    pub fn invalid_json() -> Self {
        Self::error(StatusCode::BAD_REQUEST, "Bad Request", INVALID_JSON)
    }

    pub fn cpf_required() -> Self {
        Self::error(StatusCode::BAD_REQUEST, "Bad Request", CPF_REQUIRED)
    }

    pub fn customer_not_found() -> Self {
        Self::error(
            StatusCode::NOT_FOUND,
            CUSTOMER_NOT_FOUND,
            CUSTOMER_NOT_FOUND_MESSAGE,
        )
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal Server Error",
            message,
        )
    }

    pub fn to_proxy(&self) -> ProxyResponse {
        ProxyResponse {
            status_code: self.status.as_u16(),
            headers: self.headers.to_map(),
            body: self.body.to_string(),
        }
    }
}

impl IntoResponse for GatewayResponse {
    fn into_response(self) -> Response {
        let mut response = (self.status, Json(self.body)).into_response();
        self.headers.apply(&mut response);
        response
    }
}
