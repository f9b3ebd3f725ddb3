use crate::gateway::response::GatewayResponse;
use crate::gateway::{handle_authentication, RequestBody};
use crate::models::{AuthenticationRequest, AuthenticationResult, ErrorBody};
use crate::openapi::AUTHENTICATION_TAG;
use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::State,
    response::{IntoResponse, Response},
};
use log::debug;

/// Sign in with a CPF and receive a session for the matching customer.
///
/// The body is read as-is so malformed JSON gets the same answer the event
/// invocation gives.
#[utoipa::path(
    post,
    path = "/auth",
    tag = AUTHENTICATION_TAG,
    request_body = AuthenticationRequest,
    responses(
        (status = 200, description = "Session issued", body = AuthenticationResult),
        (status = 400, description = "Invalid JSON or missing CPF", body = ErrorBody),
        (status = 404, description = "No customer with this CPF", body = ErrorBody),
        (status = 500, description = "Store or identity provider failure", body = ErrorBody)
    )
)]
pub(crate) async fn auth_handler(State(state): State<AppState>, body: Bytes) -> Response {
    debug!("Authentication request ({} bytes)", body.len());
    let response: GatewayResponse =
        handle_authentication(&state, &RequestBody::Raw(body.to_vec())).await;
    response.into_response()
}
