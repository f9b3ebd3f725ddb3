//! Cognito user pool client for account administration and admin auth

use super::credential::Credential;
use super::{AccountAttribute, IdentityAccount, IdentityError, IdentityProvider};
use crate::config::cognito::CognitoConfig;
use crate::models::SessionTokens;
use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_cognitoidentityprovider::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_cognitoidentityprovider::types::{AttributeType, AuthFlowType, MessageActionType};
use aws_sdk_cognitoidentityprovider::Client;
use log::{debug, error};

/// Identity provider backed by a Cognito user pool
#[derive(Clone)]
pub struct CognitoIdentityProvider {
    client: Client,
    user_pool_id: String,
    client_id: String,
}

impl CognitoIdentityProvider {
    /// Create a new Cognito client using the default AWS credential chain
    pub async fn new(config: &CognitoConfig) -> Self {
        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.resolved_region()))
            .load()
            .await;

        Self::with_client(Client::new(&sdk_config), config)
    }

    /// Use an already configured SDK client
    pub fn with_client(client: Client, config: &CognitoConfig) -> Self {
        Self {
            client,
            user_pool_id: config.user_pool_id.clone(),
            client_id: config.client_id.clone(),
        }
    }

    fn to_sdk_attributes(
        attributes: &[AccountAttribute],
    ) -> Result<Vec<AttributeType>, IdentityError> {
        attributes
            .iter()
            .map(|attribute| {
                AttributeType::builder()
                    .name(&attribute.name)
                    .value(&attribute.value)
                    .build()
                    .map_err(|e| IdentityError::InvalidAttribute(e.to_string()))
            })
            .collect()
    }
}

/// Maps an SDK error, keeping the most specific message for callers.
/// Transport, timeout and credential failures carry no service message, so
/// their source chain is used instead.
fn provider_error<E, R>(operation: &'static str, err: SdkError<E, R>) -> IdentityError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
    R: std::fmt::Debug,
{
    let (code, message) = match &err {
        SdkError::ServiceError(context) => (
            context.err().code().map(str::to_string),
            context.err().message().map(str::to_string),
        ),
        _ => (None, None),
    };
    let message = message.unwrap_or_else(|| DisplayErrorContext(&err).to_string());
    error!("Cognito {} failed: {}", operation, message);
    IdentityError::provider(operation, code, message)
}

#[async_trait]
impl IdentityProvider for CognitoIdentityProvider {
    async fn get_account(&self, username: &str) -> Result<IdentityAccount, IdentityError> {
        let output = self
            .client
            .admin_get_user()
            .user_pool_id(&self.user_pool_id)
            .username(username)
            .send()
            .await
            .map_err(|e| match e {
                SdkError::ServiceError(ref context)
                    if context.err().is_user_not_found_exception() =>
                {
                    IdentityError::AccountNotFound(username.to_string())
                }
                other => provider_error("AdminGetUser", other),
            })?;

        let attributes = output
            .user_attributes()
            .iter()
            .filter_map(|a| a.value().map(|v| (a.name().to_string(), v.to_string())))
            .collect();

        Ok(IdentityAccount {
            username: output.username().to_string(),
            attributes,
        })
    }

    async fn create_account(
        &self,
        username: &str,
        attributes: &[AccountAttribute],
        temporary_credential: &Credential,
    ) -> Result<(), IdentityError> {
        self.client
            .admin_create_user()
            .user_pool_id(&self.user_pool_id)
            .username(username)
            .set_user_attributes(Some(Self::to_sdk_attributes(attributes)?))
            .message_action(MessageActionType::Suppress)
            .temporary_password(temporary_credential.expose())
            .send()
            .await
            .map_err(|e| provider_error("AdminCreateUser", e))?;

        debug!("Cognito account {} created", username);
        Ok(())
    }

    async fn update_attributes(
        &self,
        username: &str,
        attributes: &[AccountAttribute],
    ) -> Result<(), IdentityError> {
        self.client
            .admin_update_user_attributes()
            .user_pool_id(&self.user_pool_id)
            .username(username)
            .set_user_attributes(Some(Self::to_sdk_attributes(attributes)?))
            .send()
            .await
            .map_err(|e| provider_error("AdminUpdateUserAttributes", e))?;
        Ok(())
    }

    async fn set_credential(
        &self,
        username: &str,
        credential: &Credential,
        permanent: bool,
    ) -> Result<(), IdentityError> {
        self.client
            .admin_set_user_password()
            .user_pool_id(&self.user_pool_id)
            .username(username)
            .password(credential.expose())
            .permanent(permanent)
            .send()
            .await
            .map_err(|e| provider_error("AdminSetUserPassword", e))?;
        Ok(())
    }

    async fn authenticate(
        &self,
        username: &str,
        credential: &Credential,
    ) -> Result<SessionTokens, IdentityError> {
        let output = self
            .client
            .admin_initiate_auth()
            .user_pool_id(&self.user_pool_id)
            .client_id(&self.client_id)
            .auth_flow(AuthFlowType::AdminNoSrpAuth)
            .auth_parameters("USERNAME", username)
            .auth_parameters("PASSWORD", credential.expose())
            .send()
            .await
            .map_err(|e| provider_error("AdminInitiateAuth", e))?;

        let Some(result) = output.authentication_result() else {
            let challenge = output
                .challenge_name()
                .map(|c| c.as_str().to_string())
                .unwrap_or_else(|| "unknown".to_string());
            error!("Cognito returned challenge {} for {}", challenge, username);
            return Err(IdentityError::ChallengeRequired(challenge));
        };

        let id_token = result.id_token().ok_or_else(|| {
            IdentityError::provider("AdminInitiateAuth", None, "Missing IdToken in response")
        })?;
        let access_token = result.access_token().ok_or_else(|| {
            IdentityError::provider("AdminInitiateAuth", None, "Missing AccessToken in response")
        })?;

        Ok(SessionTokens {
            id_token: id_token.to_string(),
            access_token: access_token.to_string(),
            refresh_token: result.refresh_token().map(str::to_string),
            expires_in: result.expires_in(),
        })
    }
}
