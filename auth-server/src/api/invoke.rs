use crate::errors::ApiError;
use crate::gateway::response::ProxyResponse;
use crate::gateway::{handle_event, InboundEvent, Invocation};
use crate::openapi::INVOCATION_TAG;
use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::{Json, State},
    response::{IntoResponse, Response},
};
use http::StatusCode;
use serde_json::Value;

impl IntoResponse for Invocation {
    fn into_response(self) -> Response {
        match self {
            // The envelope is the invocation result, its own status lives inside
            Invocation::Authenticated(response) => {
                (StatusCode::OK, Json(response.to_proxy())).into_response()
            }
            Invocation::Authorized(policy) => (StatusCode::OK, Json(policy)).into_response(),
            Invocation::Rejected(unauthorized) => unauthorized.into_response(),
        }
    }
}

/// Invoke the gateway with a raw event, as a function runtime would.
///
/// Authorizer events return a policy. Any other event is a sign-in request
/// and returns a proxy-integration envelope.
#[utoipa::path(
    post,
    path = "/invoke",
    tag = INVOCATION_TAG,
    request_body(content = Object, description = "Authorizer or proxy-integration event"),
    responses(
        (status = 200, description = "Proxy envelope for sign-in events, or the policy for authorizer events", body = ProxyResponse),
        (status = 400, description = "Event is not JSON"),
        (status = 401, description = "Authorizer event without token")
    )
)]
pub(crate) async fn invoke_handler(State(state): State<AppState>, body: Bytes) -> Response {
    let event: Value = match serde_json::from_slice(&body) {
        Ok(event) => event,
        Err(e) => return ApiError::bad_request(format!("Invalid event: {e}")).into_response(),
    };

    handle_event(&state, InboundEvent::classify(&event))
        .await
        .into_response()
}
