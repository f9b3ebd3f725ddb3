use utoipa::OpenApi;

pub(crate) const HEALTH_TAG: &str = "Health API";
pub(crate) const AUTHENTICATION_TAG: &str = "Authentication API";
pub(crate) const AUTHORIZATION_TAG: &str = "Authorization API";
pub(crate) const INVOCATION_TAG: &str = "Invocation API";

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::api::health::health_check,
        crate::api::health::ready_check,
        crate::api::auth::auth_handler,
        crate::api::authorizer::authorize_handler,
        crate::api::invoke::invoke_handler,
    ),
    tags(
        (name = HEALTH_TAG, description = "Health check endpoints"),
        (name = AUTHENTICATION_TAG, description = "CPF sign-in and session issuance"),
        (name = AUTHORIZATION_TAG, description = "Bearer token authorizer"),
        (name = INVOCATION_TAG, description = "Raw event invocation"),
    ),
    info(
        title = "Customer Auth Gateway API",
        description = "CPF based authentication and request authorization",
        version = "0.1.0"
    )
)]
pub(crate) struct ApiDoc;
