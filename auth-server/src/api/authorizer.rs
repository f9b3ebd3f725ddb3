use crate::authorizer::{self, AuthorizerEvent, AuthorizerResponse, Unauthorized};
use crate::errors::ApiError;
use crate::openapi::AUTHORIZATION_TAG;
use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::{Json, State},
    response::{IntoResponse, Response},
};
use http::header::AUTHORIZATION;
use http::{HeaderMap, StatusCode};
use serde_json::json;

impl IntoResponse for Unauthorized {
    fn into_response(self) -> Response {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": self.to_string() })),
        )
            .into_response()
    }
}

/// Decide the policy for an authorizer event.
///
/// When the event has no `authorizationToken`, the request's own
/// Authorization header is used instead.
#[utoipa::path(
    post,
    path = "/authorize",
    tag = AUTHORIZATION_TAG,
    request_body = AuthorizerEvent,
    responses(
        (status = 200, description = "Allow or Deny policy", body = AuthorizerResponse),
        (status = 400, description = "Malformed authorizer event"),
        (status = 401, description = "No token supplied")
    )
)]
pub(crate) async fn authorize_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let mut event = if body.is_empty() {
        AuthorizerEvent::default()
    } else {
        match serde_json::from_slice::<AuthorizerEvent>(&body) {
            Ok(event) => event,
            Err(e) => {
                return ApiError::bad_request(format!("Invalid authorizer event: {e}"))
                    .into_response()
            }
        }
    };

    if event.authorization_token.is_none() {
        event.authorization_token = headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
    }

    match authorizer::authorize(state.verifier.as_ref(), &event).await {
        Ok(policy) => (StatusCode::OK, Json(policy)).into_response(),
        Err(e) => e.into_response(),
    }
}
